use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Claim holding the expiration timestamp (seconds since the Unix epoch).
pub const EXP_CLAIM: &str = "exp";
/// Claim holding the user's role, normalized to uppercase when signed.
pub const ROLE_CLAIM: &str = "role";

/// JWT claims structure.
///
/// Tokens carry an open set of claims; `exp` is always present once issued.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenClaims(pub Map<String, Value>);

impl TokenClaims {
    /// Creates an empty claim set.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Adds a claim, returning the updated set.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Inserts or replaces a claim.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns the raw claim value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns the claim value if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Subject of the token, typically the user's email.
    pub fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    /// Raw role claim.
    pub fn role_name(&self) -> Option<&str> {
        self.get_str(ROLE_CLAIM)
    }

    /// Parsed role claim; unknown or missing roles yield `None`.
    pub fn role(&self) -> Option<Role> {
        self.role_name().and_then(|role| role.parse().ok())
    }

    /// Expiration timestamp.
    pub fn expires_at(&self) -> Option<i64> {
        self.0.get(EXP_CLAIM).and_then(Value::as_i64)
    }
}

/// Access levels known to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Not yet verified.
    Anonymous,
    /// Regular verified user.
    Authenticated,
    /// Can manage other users.
    Manager,
    /// Full access.
    Admin,
}

impl Role {
    /// Uppercase name as it appears in token claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Anonymous => "ANONYMOUS",
            Role::Authenticated => "AUTHENTICATED",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ANONYMOUS" => Ok(Role::Anonymous),
            "AUTHENTICATED" => Ok(Role::Authenticated),
            "MANAGER" => Ok(Role::Manager),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(AuthError::InvalidClaim(ROLE_CLAIM)),
        }
    }
}

/// User entity as loaded by the persistence layer.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,
    /// First name of the user
    pub first_name: String,
    /// Email address of the user
    pub email: String,
    /// Token embedded in the email verification link
    pub verification_token: Option<String>,
    /// Role of the user
    pub role: Role,
    /// Hashed password of the user
    pub password_hash: String,
    /// Whether the user's email is verified
    pub email_verified: bool,
    /// Whether the account is locked
    pub is_locked: bool,
}

/// Response structure for a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed access token
    pub access_token: String,
    /// Always `bearer`
    pub token_type: String,
}

/// Custom error type for authentication-related errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The provided credentials are invalid
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account is locked
    #[error("Account locked")]
    AccountLocked,

    /// No bearer token was supplied
    #[error("Missing authorization token")]
    MissingToken,

    /// The token could not be verified
    #[error("Invalid token")]
    InvalidToken,

    /// The token is past its expiration
    #[error("Token expired")]
    TokenExpired,

    /// The authenticated user lacks the required role
    #[error("Insufficient permissions")]
    Forbidden,

    /// A claim has a value that cannot be signed or interpreted
    #[error("Invalid claim: {0}")]
    InvalidClaim(&'static str),

    /// An error occurred while hashing the password
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// An error occurred while encoding a token
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// An error occurred while validating input data
    #[error("Validation error: {0}")]
    Validation(String),
}

impl actix_web::ResponseError for AuthError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::AccountLocked | AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::InvalidClaim(_) | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        let (error, message) = match self {
            AuthError::InvalidCredentials => {
                ("invalid_credentials", "Invalid email or password".to_string())
            }
            AuthError::AccountLocked => (
                "account_locked",
                "Account locked due to too many failed login attempts".to_string(),
            ),
            AuthError::MissingToken => (
                "missing_token",
                "Authorization token is required".to_string(),
            ),
            AuthError::InvalidToken => ("invalid_token", "Invalid or expired token".to_string()),
            AuthError::TokenExpired => ("token_expired", "Token has expired".to_string()),
            AuthError::Forbidden => ("forbidden", "Operation not permitted".to_string()),
            AuthError::InvalidClaim(_) | AuthError::Validation(_) => {
                ("validation_error", self.to_string())
            }
            _ => ("internal_error", "An internal error occurred".to_string()),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": error,
            "message": message
        }))
    }
}
