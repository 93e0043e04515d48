use bcrypt::{DEFAULT_COST, hash, verify};

use crate::jwt::TokenService;
use crate::types::{AuthError, TokenClaims, TokenResponse, User};

/// Hashes a plain-text password with bcrypt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(hash(password, DEFAULT_COST)?)
}

/// Checks a plain-text password against a bcrypt hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    Ok(verify(password, password_hash)?)
}

/// A service for handling user authentication: checks credentials of an
/// already-loaded user and mints an access token.
#[derive(Clone)]
pub struct AuthService {
    tokens: TokenService,
}

impl AuthService {
    /// Creates a new instance of `AuthService` around the given token service.
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }

    /// Token service used for issuing and verifying tokens.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Verifies the password for `user` and issues an access token.
    pub fn login(&self, user: &User, password: &str) -> Result<TokenResponse, AuthError> {
        if user.is_locked {
            log::warn!("Login attempt for locked account {}", user.email);
            return Err(AuthError::AccountLocked);
        }

        if !verify_password(password, &user.password_hash)? {
            log::info!("Invalid credentials for {}", user.email);
            return Err(AuthError::InvalidCredentials);
        }

        let claims = TokenClaims::new()
            .with("sub", user.email.as_str())
            .with("role", user.role.as_str())
            .with("user_id", user.id.to_string());

        let access_token = self.tokens.issue(&claims, None)?;
        log::info!("User {} logged in", user.id);

        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
        })
    }
}
