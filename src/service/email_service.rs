//! Email Service
//!
//! SMTP [`NotificationSink`] rendering activation and password reset emails
//! with Tera templates.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use chrono::Datelike;
use lettre::{
    message::{header, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use log::{debug, info};
use tera::{Context, Tera};

use crate::config::EmailConfig;
use crate::service::notification::{Notification, NotificationSink, NotificationTemplate};

const ACTIVATION_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Activate your account</title></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h2>Welcome to {{ app_name }}</h2>
    <p>Please confirm your email address to activate your account.</p>
    <p><a href="{{ activation_link }}" style="background: #2563eb; color: #fff; padding: 10px 20px; text-decoration: none; border-radius: 4px;">Activate account</a></p>
    <p>If the button does not work, copy this link into your browser:<br>{{ activation_link }}</p>
    <p>This link expires in {{ expires_in_minutes }} minutes.</p>
    <p style="font-size: 12px; color: #888;">&copy; {{ current_year }} {{ app_name }}</p>
</body>
</html>"#;

const ACTIVATION_TEXT: &str = r#"Welcome to {{ app_name }}

Please confirm your email address to activate your account:

{{ activation_link }}

This link expires in {{ expires_in_minutes }} minutes.

(c) {{ current_year }} {{ app_name }}"#;

const RESET_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Reset your password</title></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h2>Password reset</h2>
    <p>We received a request to reset the password of your {{ app_name }} account.</p>
    <p><a href="{{ reset_link }}" style="background: #2563eb; color: #fff; padding: 10px 20px; text-decoration: none; border-radius: 4px;">Choose a new password</a></p>
    <p>If the button does not work, copy this link into your browser:<br>{{ reset_link }}</p>
    <p>This link expires in {{ expires_in_minutes }} minutes. If you did not ask for a reset, ignore this email.</p>
    <p style="font-size: 12px; color: #888;">&copy; {{ current_year }} {{ app_name }}</p>
</body>
</html>"#;

const RESET_TEXT: &str = r#"Password reset

We received a request to reset the password of your {{ app_name }} account:

{{ reset_link }}

This link expires in {{ expires_in_minutes }} minutes. If you did not ask for a reset, ignore this email.

(c) {{ current_year }} {{ app_name }}"#;

/// Build the template engine with the embedded templates, letting files under
/// `templates/email/` override them
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::new("templates/email/**/*").unwrap_or_else(|_| {
        debug!("No template directory found, using embedded templates");
        Tera::default()
    });

    let embedded = [
        ("activation_email.html", ACTIVATION_HTML),
        ("activation_email.txt", ACTIVATION_TEXT),
        ("reset_password_email.html", RESET_HTML),
        ("reset_password_email.txt", RESET_TEXT),
    ];
    for (name, body) in embedded {
        if !tera.get_template_names().any(|existing| existing == name) {
            tera.add_raw_template(name, body)
                .with_context(|| format!("Failed to add template {}", name))?;
        }
    }

    Ok(tera)
}

/// Rendered subject and bodies of one email
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Renders notifications into email bodies
pub struct EmailRenderer {
    templates: Tera,
    app_name: String,
    activation_minutes: i64,
    reset_minutes: i64,
}

impl EmailRenderer {
    pub fn new(
        templates: Tera,
        app_name: impl Into<String>,
        activation_minutes: i64,
        reset_minutes: i64,
    ) -> Self {
        Self {
            templates,
            app_name: app_name.into(),
            activation_minutes,
            reset_minutes,
        }
    }

    pub fn render(&self, notification: &Notification) -> Result<RenderedEmail> {
        let mut context = Context::new();
        for (key, value) in &notification.context {
            context.insert(key.as_str(), value);
        }
        let expires_in_minutes = match notification.template {
            NotificationTemplate::Activation => self.activation_minutes,
            NotificationTemplate::PasswordReset => self.reset_minutes,
        };
        context.insert("expires_in_minutes", &expires_in_minutes);
        context.insert("app_name", &self.app_name);
        context.insert("current_year", &chrono::Utc::now().year());

        let id = notification.template.id();
        let html_body = self
            .templates
            .render(&format!("{}.html", id), &context)
            .with_context(|| format!("Failed to render HTML template {}", id))?;
        let text_body = self
            .templates
            .render(&format!("{}.txt", id), &context)
            .with_context(|| format!("Failed to render text template {}", id))?;

        Ok(RenderedEmail {
            subject: notification.template.subject().to_string(),
            text_body,
            html_body,
        })
    }
}

/// SMTP notification sink
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    renderer: EmailRenderer,
    config: EmailConfig,
}

impl EmailService {
    /// Create a new email service
    pub fn new(config: EmailConfig, renderer: EmailRenderer) -> Result<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .context("Failed to configure SMTP relay")?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            renderer,
            config,
        })
    }

    fn build_message(&self, to: &str, email: RenderedEmail) -> Result<Message> {
        let message = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_email)
                    .parse()
                    .context("Invalid from address")?,
            )
            .to(to.parse().context("Invalid recipient email")?)
            .subject(email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(email.text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(email.html_body),
                    ),
            )
            .context("Failed to build email message")?;

        Ok(message)
    }
}

#[async_trait]
impl NotificationSink for EmailService {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        let email = self.renderer.render(notification)?;
        let message = self.build_message(&notification.to, email)?;

        self.transport
            .send(message)
            .await
            .context("SMTP send failed")?;

        info!("Sent {} email to {}", notification.template, notification.to);
        Ok(())
    }
}
