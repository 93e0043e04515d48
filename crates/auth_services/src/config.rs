use std::{env, str::FromStr};

use chrono::Duration;
use jsonwebtoken::Algorithm;

/// Default lifetime of an access token, in minutes.
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value for {key}: {value}")]
    Invalid {
        /// Name of the environment variable
        key: &'static str,
        /// The rejected value
        value: String,
    },
}

/// Settings for signing and validating access tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret used for HMAC signing.
    pub jwt_secret_key: String,
    /// Signing algorithm. Only HMAC algorithms are accepted.
    pub jwt_algorithm: Algorithm,
    /// Lifetime applied when `issue` is called without an explicit validity.
    pub access_token_lifetime: Duration,
}

impl AuthConfig {
    /// Creates a configuration with HS256 and the default token lifetime.
    pub fn new(jwt_secret_key: impl Into<String>) -> Self {
        Self {
            jwt_secret_key: jwt_secret_key.into(),
            jwt_algorithm: Algorithm::HS256,
            access_token_lifetime: Duration::minutes(DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES),
        }
    }

    /// Reads `JWT_SECRET_KEY`, `JWT_ALGORITHM` and `ACCESS_TOKEN_EXPIRE_MINUTES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret_key = lookup("JWT_SECRET_KEY")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        let jwt_algorithm = match lookup("JWT_ALGORITHM") {
            Some(value) => parse_hmac_algorithm(&value)?,
            None => Algorithm::HS256,
        };

        let access_token_lifetime = match lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(value) => parse_lifetime_minutes(&value)?,
            None => Duration::minutes(DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES),
        };

        Ok(Self {
            jwt_secret_key,
            jwt_algorithm,
            access_token_lifetime,
        })
    }
}

/// Parses a positive number of minutes that fits in a [`Duration`].
pub fn parse_lifetime_minutes(value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|minutes| *minutes > 0)
        .and_then(Duration::try_minutes)
        .ok_or_else(|| ConfigError::Invalid {
            key: "ACCESS_TOKEN_EXPIRE_MINUTES",
            value: value.to_string(),
        })
}

/// Parses an algorithm name, rejecting anything that is not keyed by a shared secret.
pub fn parse_hmac_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    let invalid = || ConfigError::Invalid {
        key: "JWT_ALGORITHM",
        value: value.to_string(),
    };

    match Algorithm::from_str(value.trim()).map_err(|_| invalid())? {
        algorithm @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => Ok(algorithm),
        _ => Err(invalid()),
    }
}
