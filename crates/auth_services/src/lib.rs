//! # Auth Services
//!
//! This crate provides authentication services for the application.
//! It includes JWT token handling, middleware for request authentication,
//! request/response schemas and service definitions.

/// Configuration consumed by the token service.
pub mod config;
/// JWT token issuing and verification.
pub mod jwt;
/// Middleware for request authentication and role checks.
pub mod middleware;
/// Request and response schemas with validation rules.
pub mod schemas;
/// Password hashing and login.
pub mod service;
/// Types and structures used in authentication services.
pub mod types;

pub use config::{AuthConfig, ConfigError};
pub use jwt::{TokenService, TokenVerification};
pub use types::{AuthError, Role, TokenClaims, User};
