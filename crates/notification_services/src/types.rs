use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Types for notifications.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The requested notification kind is not one of the known kinds.
    #[error("Invalid email type: {0}")]
    InvalidKind(String),

    /// A field required to build the notification is missing.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The template could not be loaded or rendered.
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Invalid email format.
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// The mail transport failed to deliver the message.
    #[error("Email transport error: {0}")]
    Transport(String),
}

/// Kinds of transactional email the service can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Link to confirm a new account's email address.
    EmailVerification,
    /// Instructions for resetting a password.
    PasswordReset,
    /// Notice that the account was locked.
    AccountLocked,
}

impl NotificationKind {
    /// All known kinds.
    pub const ALL: [NotificationKind; 3] = [
        NotificationKind::EmailVerification,
        NotificationKind::PasswordReset,
        NotificationKind::AccountLocked,
    ];

    /// Symbolic name; also the template identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::EmailVerification => "email_verification",
            NotificationKind::PasswordReset => "password_reset",
            NotificationKind::AccountLocked => "account_locked",
        }
    }

    /// Fixed subject line for this kind.
    pub fn subject(&self) -> &'static str {
        match self {
            NotificationKind::EmailVerification => "Verify Your Account",
            NotificationKind::PasswordReset => "Password Reset Instructions",
            NotificationKind::AccountLocked => "Account Locked Notification",
        }
    }

    /// Name of the template rendered for this kind.
    pub fn template_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| NotificationError::InvalidKind(s.to_string()))
    }
}

const RECIPIENT_FIELD: &str = "email";

/// Recipient address plus the kind-specific template variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Address the email is delivered to
    pub email: String,
    /// Template variables such as `name` or `verification_url`
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl NotificationRequest {
    /// Creates a request for `email` with no extra fields.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            fields: Map::new(),
        }
    }

    /// Adds a template variable, returning the updated request.
    ///
    /// `email` is reserved for the recipient set in [`NotificationRequest::new`];
    /// a field with that name is dropped.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if name == RECIPIENT_FIELD {
            log::warn!("Ignoring template field '{}' on request for {}", name, self.email);
            return self;
        }
        self.fields.insert(name, value.into());
        self
    }

    /// Returns a template variable.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in NotificationKind::ALL {
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(matches!(
            "newsletter".parse::<NotificationKind>(),
            Err(NotificationError::InvalidKind(kind)) if kind == "newsletter"
        ));
        assert!("EMAIL_VERIFICATION".parse::<NotificationKind>().is_err());
    }

    #[test]
    fn test_request_serializes_flat() {
        let request = NotificationRequest::new("jane@example.com").with("name", "Jane");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "email": "jane@example.com", "name": "Jane" })
        );
    }

    #[test]
    fn test_email_field_cannot_shadow_recipient() {
        let request = NotificationRequest::new("jane@example.com")
            .with("email", "attacker@example.com")
            .with("name", "Jane");

        assert!(request.field("email").is_none());
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json.matches("\"email\"").count(), 1);
        assert!(!json.contains("attacker@example.com"));
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["email"], "jane@example.com");
    }
}
