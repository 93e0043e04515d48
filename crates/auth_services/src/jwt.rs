use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde_json::Value;

use crate::config::AuthConfig;
use crate::types::{AuthError, EXP_CLAIM, ROLE_CLAIM, TokenClaims};

/// Outcome of verifying a token, keeping the reason for a rejection.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenVerification {
    /// Signature and expiry checks passed.
    Valid(TokenClaims),
    /// The token was signed correctly but `exp` is in the past.
    Expired,
    /// The token could not be parsed or lacks required claims.
    Malformed,
    /// The signature does not match the configured key or algorithm.
    BadSignature,
}

impl TokenVerification {
    /// Collapses the outcome to the claims of a valid token.
    pub fn into_claims(self) -> Option<TokenClaims> {
        match self {
            TokenVerification::Valid(claims) => Some(claims),
            _ => None,
        }
    }
}

/// Issues and verifies signed, time-limited access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    default_validity: Duration,
}

impl TokenService {
    /// Builds the signing keys from the given configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret_key.as_bytes();

        let mut validation = Validation::new(config.jwt_algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&[EXP_CLAIM]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            header: Header::new(config.jwt_algorithm),
            validation,
            default_validity: config.access_token_lifetime,
        }
    }

    /// Signs `claims` with an expiration of now plus `validity`, or the configured
    /// default lifetime. A `role` claim is uppercased; an incoming `exp` is replaced.
    pub fn issue(
        &self,
        claims: &TokenClaims,
        validity: Option<Duration>,
    ) -> Result<String, AuthError> {
        self.issue_at(claims, validity, Utc::now())
    }

    /// Same as [`TokenService::issue`] with an explicit issuing time.
    pub fn issue_at(
        &self,
        claims: &TokenClaims,
        validity: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let mut to_encode = claims.clone();

        if let Some(role) = claims.get(ROLE_CLAIM) {
            let role = role.as_str().ok_or(AuthError::InvalidClaim(ROLE_CLAIM))?;
            to_encode.insert(ROLE_CLAIM, role.to_uppercase());
        }

        let expiration = now
            .checked_add_signed(validity.unwrap_or(self.default_validity))
            .ok_or(AuthError::InvalidClaim(EXP_CLAIM))?;
        to_encode.insert(EXP_CLAIM, Value::from(expiration.timestamp()));

        let token = encode(&self.header, &to_encode, &self.encoding_key)?;
        Ok(token)
    }

    /// Decodes a token, returning its claims only if it is valid.
    ///
    /// Bad signatures, malformed input and expired tokens all yield `None`;
    /// use [`TokenService::verify_detailed`] when the cause matters.
    pub fn verify(&self, token: &str) -> Option<TokenClaims> {
        self.verify_detailed(token).into_claims()
    }

    /// Decodes a token and reports why it was rejected.
    pub fn verify_detailed(&self, token: &str) -> TokenVerification {
        match decode::<TokenClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => TokenVerification::Valid(data.claims),
            Err(e) => {
                log::debug!("Token rejected: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenVerification::Expired,
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        TokenVerification::BadSignature
                    }
                    _ => TokenVerification::Malformed,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&AuthConfig::new(secret))
    }

    #[test]
    fn test_role_is_uppercased() {
        let tokens = service("test_secret_key_for_testing_purposes_only");
        let claims = TokenClaims::new()
            .with("sub", "john@example.com")
            .with("role", "admin");

        let token = tokens.issue(&claims, None).unwrap();
        let decoded = tokens.verify(&token).unwrap();

        assert_eq!(decoded.role_name(), Some("ADMIN"));
        assert_eq!(decoded.subject(), Some("john@example.com"));
    }

    #[test]
    fn test_input_claims_are_not_modified() {
        let tokens = service("secret");
        let claims = TokenClaims::new().with("role", "manager");

        tokens.issue(&claims, None).unwrap();

        assert_eq!(claims.role_name(), Some("manager"));
        assert!(claims.expires_at().is_none());
    }

    #[test]
    fn test_expiration_uses_default_or_explicit_validity() {
        let tokens = service("secret");
        let now = Utc::now();
        let claims = TokenClaims::new().with("sub", "a@example.com");

        let token = tokens.issue_at(&claims, None, now).unwrap();
        let decoded = tokens.verify(&token).unwrap();
        assert_eq!(decoded.expires_at(), Some(now.timestamp() + 30 * 60));

        let token = tokens
            .issue_at(&claims, Some(Duration::hours(2)), now)
            .unwrap();
        let decoded = tokens.verify(&token).unwrap();
        assert_eq!(decoded.expires_at(), Some(now.timestamp() + 2 * 60 * 60));
    }

    #[test]
    fn test_incoming_exp_is_replaced() {
        let tokens = service("secret");
        let now = Utc::now();
        let claims = TokenClaims::new().with("exp", 1_i64);

        let token = tokens.issue_at(&claims, None, now).unwrap();

        assert!(tokens.verify(&token).is_some());
    }

    #[test]
    fn test_non_string_role_is_rejected() {
        let tokens = service("secret");
        let claims = TokenClaims::new().with("role", 7);

        assert!(matches!(
            tokens.issue(&claims, None),
            Err(AuthError::InvalidClaim("role"))
        ));
    }

    #[test]
    fn test_oversized_validity_is_an_error() {
        let mut config = AuthConfig::new("secret");
        config.access_token_lifetime = Duration::MAX;
        let tokens = TokenService::new(&config);

        assert!(matches!(
            tokens.issue(&TokenClaims::new(), None),
            Err(AuthError::InvalidClaim("exp"))
        ));
    }

    #[test]
    fn test_bad_signature() {
        let token = service("secret-A")
            .issue(&TokenClaims::new().with("sub", "x"), None)
            .unwrap();
        let other = service("secret-B");

        assert!(other.verify(&token).is_none());
        assert_eq!(other.verify_detailed(&token), TokenVerification::BadSignature);
    }

    #[test]
    fn test_expired_token() {
        let tokens = service("secret");
        let token = tokens
            .issue(
                &TokenClaims::new().with("sub", "x"),
                Some(Duration::minutes(-5)),
            )
            .unwrap();

        assert!(tokens.verify(&token).is_none());
        assert_eq!(tokens.verify_detailed(&token), TokenVerification::Expired);
    }

    #[test]
    fn test_malformed_token() {
        let tokens = service("secret");

        assert!(tokens.verify("not-a-token").is_none());
        assert_eq!(
            tokens.verify_detailed("not-a-token"),
            TokenVerification::Malformed
        );
        assert_eq!(tokens.verify_detailed(""), TokenVerification::Malformed);
    }

    #[test]
    fn test_algorithm_mismatch_is_rejected() {
        let mut config = AuthConfig::new("secret");
        config.jwt_algorithm = Algorithm::HS512;
        let token = TokenService::new(&config)
            .issue(&TokenClaims::new(), None)
            .unwrap();

        assert_eq!(
            service("secret").verify_detailed(&token),
            TokenVerification::BadSignature
        );
    }
}
