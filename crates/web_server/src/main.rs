//! Main entry point for the backend server.
//! Wires configuration, the token service and the notification service
//! into an actix-web application.

mod handlers;

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use auth_services::{AuthConfig, TokenService, middleware::AuthMiddleware};
use notification_services::{
    EmailTransport, LogEmailTransport, MailConfig, NotificationService, SmtpEmailTransport,
    TemplateRenderer, TeraTemplateRenderer,
};

use handlers::*;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting server...");

    let auth_config = AuthConfig::from_env().unwrap_or_else(|e| {
        log::error!("❌ Invalid auth configuration: {}", e);
        std::process::exit(1);
    });
    let mail_config = MailConfig::from_env().unwrap_or_else(|e| {
        log::error!("❌ Invalid mail configuration: {}", e);
        std::process::exit(1);
    });

    let tokens = TokenService::new(&auth_config);

    let transport: Arc<dyn EmailTransport> = if mail_config.has_smtp() {
        match SmtpEmailTransport::new(&mail_config) {
            Ok(transport) => {
                log::info!(
                    "📧 SMTP transport ready: {}:{}",
                    mail_config.smtp_server,
                    mail_config.smtp_port
                );
                Arc::new(transport)
            }
            Err(e) => {
                log::error!("❌ Failed to initialize SMTP transport: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        log::warn!("🔧 SMTP_SERVER not set, emails will only be logged");
        Arc::new(LogEmailTransport)
    };

    let renderer = match &mail_config.template_dir {
        Some(dir) => TeraTemplateRenderer::from_directory(dir),
        None => TeraTemplateRenderer::with_builtin_templates(),
    };
    let renderer: Arc<dyn TemplateRenderer> = match renderer {
        Ok(renderer) => Arc::new(renderer),
        Err(e) => {
            log::error!("❌ Failed to load email templates: {}", e);
            std::process::exit(1);
        }
    };

    let notification_service = NotificationService::new(transport, renderer, &mail_config);

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    log::info!("🌐 Server will be available at: http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(notification_service.clone()))
            .wrap(Logger::default())
            .route("/health", web::get().to(health))
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(tokens.clone()))
                    .route("/session", web::get().to(session))
                    .route("/notifications/{kind}", web::post().to(send_notification))
                    .route(
                        "/verification-email",
                        web::post().to(send_verification_email),
                    ),
            )
    })
    .bind(bind_address)?
    .run()
    .await
}
