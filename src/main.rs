//! Account Service Server
//!
//! Runs the full account API: PostgreSQL storage, SMTP or log-only email
//! delivery, and every endpoint group enabled.

use std::sync::Arc;

use dotenv::dotenv;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use account_service::{
    api::{routes::create_cors_layer, AppState, RouterBuilder},
    config::{env, AppConfig},
    database::PgAccountRepository,
    service::{
        load_templates, EmailRenderer, EmailService, LinkBuilder, LogNotificationSink,
        NotificationDispatcher, NotificationSink, TokenCodec,
    },
    API_PREFIX,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv().ok();
    env_logger::init();

    log::info!("Starting Account Service v{}", account_service::VERSION);

    let config = AppConfig::from_env()?;
    config.validate()?;
    log::info!("Configuration loaded and validated");

    let pool = config.database.create_migrated_pool().await?;
    let repository = Arc::new(PgAccountRepository::new(pool));

    let sink: Arc<dyn NotificationSink> = match &config.email {
        Some(email_config) => {
            let renderer = EmailRenderer::new(
                load_templates()?,
                env::get_string("APP_NAME", "Account Service"),
                config.tokens.activation_lifetime.num_minutes(),
                config.tokens.reset_password_lifetime.num_minutes(),
            );
            log::info!("Email delivery via SMTP relay {}", email_config.smtp_host);
            Arc::new(EmailService::new(email_config.clone(), renderer)?)
        }
        None => {
            log::warn!("SMTP not configured; notifications will only be logged");
            Arc::new(LogNotificationSink)
        }
    };
    let notifier = Arc::new(NotificationDispatcher::spawn(sink));

    let state = AppState::new(
        repository,
        TokenCodec::new(config.tokens.clone()),
        notifier,
        LinkBuilder::new(config.public_base_url.clone()),
        config.bcrypt_cost,
    );

    let app = RouterBuilder::with_all_routes().build(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(&config.server.cors_origins))
            .into_inner(),
    );

    let bind_addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("Listening on {} (API under {})", bind_addr, API_PREFIX);
    axum::serve(listener, app).await?;

    Ok(())
}
