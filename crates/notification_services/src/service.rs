use std::sync::Arc;

use auth_services::User;
use rand::{Rng, distr::Alphanumeric};

use crate::config::MailConfig;
use crate::templates::TemplateRenderer;
use crate::transport::EmailTransport;
use crate::types::*;

/// Notification service for sending templated transactional emails.
#[derive(Clone)]
pub struct NotificationService {
    transport: Arc<dyn EmailTransport>,
    renderer: Arc<dyn TemplateRenderer>,
    server_base_url: String,
}

impl NotificationService {
    /// Creates a new instance of the NotificationService with its collaborators.
    pub fn new(
        transport: Arc<dyn EmailTransport>,
        renderer: Arc<dyn TemplateRenderer>,
        config: &MailConfig,
    ) -> Self {
        Self {
            transport,
            renderer,
            server_base_url: config.server_base_url.clone(),
        }
    }

    /// Sends an email of the kind named by `kind`.
    ///
    /// Unknown kinds are rejected before anything is rendered or sent.
    pub async fn dispatch(
        &self,
        request: &NotificationRequest,
        kind: &str,
    ) -> Result<(), NotificationError> {
        let kind = kind.parse::<NotificationKind>().map_err(|e| {
            log::error!("❌ Invalid email type: {}", kind);
            e
        })?;

        self.send(request, kind).await
    }

    /// Renders the template for `kind` and hands the result to the transport.
    /// Transport errors are logged and returned as-is; there is no retry.
    pub async fn send(
        &self,
        request: &NotificationRequest,
        kind: NotificationKind,
    ) -> Result<(), NotificationError> {
        let body = self.renderer.render(kind.template_name(), request)?;

        match self
            .transport
            .send_email(kind.subject(), &body, &request.email)
            .await
        {
            Ok(()) => {
                log::info!("✅ Email sent successfully: {} to {}", kind, request.email);
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "❌ Failed to send email: {} to {}. Error: {}",
                    kind,
                    request.email,
                    e
                );
                Err(e)
            }
        }
    }

    /// Sends the account verification email to `user`.
    pub async fn dispatch_verification(&self, user: &User) -> Result<(), NotificationError> {
        let token = user
            .verification_token
            .as_deref()
            .ok_or(NotificationError::MissingField("verification_token"))?;

        let verification_url = self.verification_url(&user.id.to_string(), token);
        log::info!("📧 Preparing verification email for user: {}", user.email);

        let request = NotificationRequest::new(user.email.as_str())
            .with("name", user.first_name.as_str())
            .with("verification_url", verification_url);

        self.send(&request, NotificationKind::EmailVerification)
            .await
    }

    /// Link of the form `{base}/verify-email/{user_id}/{token}`.
    pub fn verification_url(&self, user_id: &str, token: &str) -> String {
        format!(
            "{}/verify-email/{}/{}",
            self.server_base_url.trim_end_matches('/'),
            user_id,
            token
        )
    }
}

/// Length of the tokens produced by [`generate_verification_token`].
pub const VERIFICATION_TOKEN_LEN: usize = 32;

/// Random alphanumeric token to embed in a verification link.
pub fn generate_verification_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(VERIFICATION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TeraTemplateRenderer;
    use async_trait::async_trait;
    use auth_services::Role;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct SpyTransport {
        sent: Mutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailTransport for SpyTransport {
        async fn send_email(
            &self,
            subject: &str,
            body: &str,
            recipient: &str,
        ) -> Result<(), NotificationError> {
            self.sent.lock().unwrap().push((
                subject.to_string(),
                body.to_string(),
                recipient.to_string(),
            ));
            if self.fail {
                Err(NotificationError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct SpyRenderer {
        rendered: Mutex<Vec<(String, NotificationRequest)>>,
    }

    impl TemplateRenderer for SpyRenderer {
        fn render(
            &self,
            template_name: &str,
            request: &NotificationRequest,
        ) -> Result<String, NotificationError> {
            self.rendered
                .lock()
                .unwrap()
                .push((template_name.to_string(), request.clone()));
            Ok(format!("rendered {}", template_name))
        }
    }

    fn config() -> MailConfig {
        MailConfig {
            server_base_url: "http://localhost:8080/".to_string(),
            ..MailConfig::default()
        }
    }

    fn service(
        transport: &Arc<SpyTransport>,
        renderer: &Arc<SpyRenderer>,
    ) -> NotificationService {
        NotificationService::new(transport.clone(), renderer.clone(), &config())
    }

    fn user() -> User {
        User {
            id: Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap(),
            first_name: "John".to_string(),
            email: "john.doe@example.com".to_string(),
            verification_token: Some("abc123token".to_string()),
            role: Role::Anonymous,
            password_hash: String::new(),
            email_verified: false,
            is_locked: false,
        }
    }

    #[tokio::test]
    async fn test_invalid_kind_makes_no_calls() {
        let transport = Arc::new(SpyTransport::default());
        let renderer = Arc::new(SpyRenderer::default());
        let service = service(&transport, &renderer);
        let request = NotificationRequest::new("test@example.com").with("name", "Test");

        for kind in ["invalid_type", "", "EMAIL_VERIFICATION", "newsletter"] {
            let result = service.dispatch(&request, kind).await;
            assert!(matches!(result, Err(NotificationError::InvalidKind(_))));
        }

        assert!(transport.sent.lock().unwrap().is_empty());
        assert!(renderer.rendered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_known_kinds_use_fixed_subjects() {
        let transport = Arc::new(SpyTransport::default());
        let renderer = Arc::new(SpyRenderer::default());
        let service = service(&transport, &renderer);
        let request = NotificationRequest::new("test@example.com").with("name", "Test");

        service.dispatch(&request, "email_verification").await.unwrap();
        service.dispatch(&request, "password_reset").await.unwrap();
        service.dispatch(&request, "account_locked").await.unwrap();

        let sent = transport.sent.lock().unwrap();
        let subjects: Vec<&str> = sent.iter().map(|(s, _, _)| s.as_str()).collect();
        assert_eq!(
            subjects,
            [
                "Verify Your Account",
                "Password Reset Instructions",
                "Account Locked Notification"
            ]
        );
        assert!(sent.iter().all(|(_, _, to)| to == "test@example.com"));
        assert_eq!(sent[1].1, "rendered password_reset");

        let rendered = renderer.rendered.lock().unwrap();
        assert_eq!(rendered[0].0, "email_verification");
        assert_eq!(rendered[0].1, request);
    }

    #[tokio::test]
    async fn test_transport_error_is_returned_unchanged() {
        let transport = Arc::new(SpyTransport {
            fail: true,
            ..SpyTransport::default()
        });
        let renderer = Arc::new(SpyRenderer::default());
        let service = service(&transport, &renderer);

        let result = service
            .dispatch(&NotificationRequest::new("test@example.com"), "password_reset")
            .await;

        match result {
            Err(NotificationError::Transport(msg)) => assert_eq!(msg, "connection refused"),
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_verification_url_contains_id_and_token() {
        let transport = Arc::new(SpyTransport::default());
        let renderer = Arc::new(SpyRenderer::default());
        let service = service(&transport, &renderer);

        service.dispatch_verification(&user()).await.unwrap();

        let rendered = renderer.rendered.lock().unwrap();
        let (template, request) = &rendered[0];
        assert_eq!(template, "email_verification");
        assert_eq!(request.email, "john.doe@example.com");
        assert_eq!(request.field("name").unwrap(), "John");
        assert_eq!(
            request.field("verification_url").unwrap(),
            "http://localhost:8080/verify-email/123e4567-e89b-12d3-a456-426614174000/abc123token"
        );

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].0, "Verify Your Account");
        assert_eq!(sent[0].2, "john.doe@example.com");
    }

    #[tokio::test]
    async fn test_verification_requires_token() {
        let transport = Arc::new(SpyTransport::default());
        let renderer = Arc::new(SpyRenderer::default());
        let service = service(&transport, &renderer);
        let mut user = user();
        user.verification_token = None;

        let result = service.dispatch_verification(&user).await;

        assert!(matches!(
            result,
            Err(NotificationError::MissingField("verification_token"))
        ));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verification_with_tera_templates() {
        let transport = Arc::new(SpyTransport::default());
        let renderer = Arc::new(TeraTemplateRenderer::with_builtin_templates().unwrap());
        let service = NotificationService::new(transport.clone(), renderer, &config());

        service.dispatch_verification(&user()).await.unwrap();

        let sent = transport.sent.lock().unwrap();
        assert!(sent[0].1.contains("Hi John!"));
        let link = "http://localhost:8080/verify-email/123e4567-e89b-12d3-a456-426614174000/abc123token";
        assert!(sent[0].1.contains(&format!("href=\"{}\"", tera::escape_html(link))));
    }

    #[test]
    fn test_verification_url_normalizes_trailing_slash() {
        let transport = Arc::new(SpyTransport::default());
        let renderer = Arc::new(SpyRenderer::default());
        let mut config = config();
        config.server_base_url = "https://app.example.com".to_string();
        let service = NotificationService::new(transport, renderer, &config);

        assert_eq!(
            service.verification_url("42", "tok"),
            "https://app.example.com/verify-email/42/tok"
        );
    }

    #[test]
    fn test_generate_verification_token() {
        let token = generate_verification_token();

        assert_eq!(token.len(), VERIFICATION_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_verification_token());
    }
}
