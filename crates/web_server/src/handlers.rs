use actix_web::{HttpResponse, Result, error, web};
use serde::Deserialize;
use uuid::Uuid;

use auth_services::{AuthError, Role, User, middleware::AuthenticatedUser};
use notification_services::{
    NotificationError, NotificationRequest, NotificationService, generate_verification_token,
};

/// Liveness check.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Returns the claims of the caller's token.
pub async fn session(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "subject": user.0.subject(),
        "role": user.0.role_name(),
        "expires_at": user.0.expires_at(),
    }))
}

/// Sends a notification of the kind given in the path. Restricted to staff.
pub async fn send_notification(
    notification_service: web::Data<NotificationService>,
    user: AuthenticatedUser,
    kind: web::Path<String>,
    request: web::Json<NotificationRequest>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin, Role::Manager])?;

    notification_service
        .dispatch(&request, &kind)
        .await
        .map_err(notification_error)?;

    Ok(HttpResponse::Accepted().json(serde_json::json!({
        "message": "Notification sent",
        "kind": kind.into_inner(),
    })))
}

/// Account that should receive a verification link.
#[derive(Debug, Deserialize)]
pub struct VerificationEmailRequest {
    /// Identifier embedded in the link
    pub user_id: Uuid,
    /// Recipient address
    pub email: String,
    /// Name used in the greeting
    pub first_name: String,
}

/// Issues a fresh verification token and emails the link to the user.
/// Restricted to staff; the token is returned so the caller can store it.
pub async fn send_verification_email(
    notification_service: web::Data<NotificationService>,
    user: AuthenticatedUser,
    request: web::Json<VerificationEmailRequest>,
) -> Result<HttpResponse> {
    user.require_role(&[Role::Admin, Role::Manager])?;

    let request = request.into_inner();
    let verification_token = generate_verification_token();
    let recipient = User {
        id: request.user_id,
        first_name: request.first_name,
        email: request.email,
        verification_token: Some(verification_token.clone()),
        role: Role::Anonymous,
        password_hash: String::new(),
        email_verified: false,
        is_locked: false,
    };

    notification_service
        .dispatch_verification(&recipient)
        .await
        .map_err(notification_error)?;

    Ok(HttpResponse::Accepted().json(serde_json::json!({
        "message": "Verification email sent",
        "user_id": recipient.id,
        "verification_token": verification_token,
    })))
}

/// Caller mistakes are 400s, rendering faults 500, delivery failures 502.
fn notification_error(e: NotificationError) -> error::Error {
    match e {
        NotificationError::InvalidKind(_)
        | NotificationError::InvalidEmail(_)
        | NotificationError::MissingField(_) => AuthError::Validation(e.to_string()).into(),
        NotificationError::Template(_) => error::ErrorInternalServerError(e.to_string()),
        NotificationError::Transport(_) => error::ErrorBadGateway(e.to_string()),
    }
}
