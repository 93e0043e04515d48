//! # Notification Services
//!
//! This crate provides transactional email for the application.
//! It maps a notification kind to a subject and template, renders the body
//! and hands it to a mail transport.

/// Mail and link configuration.
pub mod config;
/// Service definitions for dispatching notifications.
pub mod service;
/// Email template rendering.
pub mod templates;
/// Mail transports (SMTP and logging).
pub mod transport;
/// Types and structures used in notification services.
pub mod types;

pub use config::MailConfig;
pub use service::{NotificationService, generate_verification_token};
pub use templates::{TemplateRenderer, TeraTemplateRenderer};
pub use transport::{EmailTransport, LogEmailTransport, SmtpEmailTransport};
pub use types::{NotificationError, NotificationKind, NotificationRequest};
