use std::env;

use auth_services::ConfigError;

/// Outbound mail and link settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SMTP relay host; when empty, mail is logged instead of delivered
    pub smtp_server: String,
    /// SMTP relay port
    pub smtp_port: u16,
    /// SMTP username
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: String,
    /// Sender address
    pub from_email: String,
    /// Public base URL used to build links in emails
    pub server_base_url: String,
    /// Directory with override templates
    pub template_dir: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_server: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "no-reply@example.com".to_string(),
            server_base_url: "http://localhost:8080/".to_string(),
            template_dir: None,
        }
    }
}

impl MailConfig {
    /// Reads `SMTP_*`, `SERVER_BASE_URL` and `TEMPLATE_DIR`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`MailConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let smtp_port = match lookup("SMTP_PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "SMTP_PORT",
                value,
            })?,
            None => defaults.smtp_port,
        };

        Ok(Self {
            smtp_server: lookup("SMTP_SERVER").unwrap_or(defaults.smtp_server),
            smtp_port,
            smtp_username: lookup("SMTP_USERNAME").unwrap_or(defaults.smtp_username),
            smtp_password: lookup("SMTP_PASSWORD").unwrap_or(defaults.smtp_password),
            from_email: lookup("SMTP_FROM").unwrap_or(defaults.from_email),
            server_base_url: lookup("SERVER_BASE_URL").unwrap_or(defaults.server_base_url),
            template_dir: lookup("TEMPLATE_DIR").filter(|dir| !dir.is_empty()),
        })
    }

    /// Whether an SMTP relay is configured.
    pub fn has_smtp(&self) -> bool {
        !self.smtp_server.is_empty()
    }
}
