use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::types::Role;

static NICKNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+$").expect("valid nickname regex"));

static HTTP_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex")
});

/// Rejects anything that is not an absolute http(s) URL.
fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    if HTTP_URL_REGEX.is_match(url) {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message("Invalid URL format".into()))
    }
}

/// Fields shared by user creation and responses
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserBase {
    /// Email address of the user
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Public nickname; letters, digits, underscores and hyphens
    #[validate(
        length(min = 3, max = 50, message = "Nickname must be between 3-50 characters"),
        regex(path = *NICKNAME_REGEX, message = "Nickname contains invalid characters")
    )]
    pub nickname: Option<String>,

    /// First name of the user
    #[validate(length(max = 100))]
    pub first_name: Option<String>,

    /// Last name of the user
    #[validate(length(max = 100))]
    pub last_name: Option<String>,

    /// Short biography
    #[validate(length(max = 500))]
    pub bio: Option<String>,

    /// Profile picture location
    #[validate(custom(function = "validate_http_url"))]
    pub profile_picture_url: Option<String>,
}

/// Request structure for user creation
#[derive(Debug, Deserialize, Validate)]
pub struct UserCreate {
    /// Profile fields
    #[serde(flatten)]
    #[validate(nested)]
    pub user: UserBase,

    /// Password for the user account
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Request structure for updating a user; at least one field must be set
#[derive(Debug, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_not_empty"))]
pub struct UserUpdate {
    /// New email address
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,

    /// New nickname
    #[validate(
        length(min = 3, max = 50, message = "Nickname must be between 3-50 characters"),
        regex(path = *NICKNAME_REGEX, message = "Nickname contains invalid characters")
    )]
    pub nickname: Option<String>,

    /// New first name
    #[validate(length(max = 100))]
    pub first_name: Option<String>,

    /// New last name
    #[validate(length(max = 100))]
    pub last_name: Option<String>,

    /// New biography
    #[validate(length(max = 500))]
    pub bio: Option<String>,

    /// New profile picture location
    #[validate(custom(function = "validate_http_url"))]
    pub profile_picture_url: Option<String>,
}

fn validate_update_not_empty(update: &UserUpdate) -> Result<(), ValidationError> {
    let any_set = update.email.is_some()
        || update.nickname.is_some()
        || update.first_name.is_some()
        || update.last_name.is_some()
        || update.bio.is_some()
        || update.profile_picture_url.is_some();

    if any_set {
        Ok(())
    } else {
        Err(ValidationError::new("empty_update")
            .with_message("At least one field must be provided for update".into()))
    }
}

/// Response structure describing a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// Unique identifier for the user
    pub id: Uuid,
    /// Email address of the user
    pub email: String,
    /// Public nickname
    pub nickname: Option<String>,
    /// First name of the user
    pub first_name: Option<String>,
    /// Last name of the user
    pub last_name: Option<String>,
    /// Short biography
    pub bio: Option<String>,
    /// Profile picture location
    pub profile_picture_url: Option<String>,
    /// Role of the user
    #[serde(default = "default_role")]
    pub role: Role,
    /// Whether the user is flagged as a professional
    #[serde(default)]
    pub is_professional: bool,
    /// Time of the last successful login
    pub last_login_at: Option<DateTime<Utc>>,
    /// Time at which the user was created
    pub created_at: Option<DateTime<Utc>>,
    /// Time at which the user was last updated
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_role() -> Role {
    Role::Authenticated
}

/// Request structure for user login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address of the user
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Password for the user account
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}
