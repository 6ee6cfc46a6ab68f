//! Notification Port
//!
//! Fire-and-forget delivery of activation and password reset links. Services
//! hand a [`Notification`] to a [`NotificationPort`] and return immediately;
//! [`NotificationDispatcher`] queues it for a background worker that delivers
//! through a [`NotificationSink`] and retries failures.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

/// Message templates the account services send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationTemplate {
    Activation,
    PasswordReset,
}

impl NotificationTemplate {
    /// Template identifier, also the base name of the email templates
    pub fn id(&self) -> &'static str {
        match self {
            NotificationTemplate::Activation => "activation_email",
            NotificationTemplate::PasswordReset => "reset_password_email",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            NotificationTemplate::Activation => "Activate your account",
            NotificationTemplate::PasswordReset => "Reset your password",
        }
    }
}

impl fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A templated message addressed to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub template: NotificationTemplate,
    pub to: String,
    pub context: HashMap<String, String>,
}

impl Notification {
    pub fn new(template: NotificationTemplate, to: impl Into<String>) -> Self {
        Self {
            template,
            to: to.into(),
            context: HashMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    /// Activation email carrying `activation_link`
    pub fn activation(to: impl Into<String>, link: impl Into<String>) -> Self {
        Self::new(NotificationTemplate::Activation, to).with("activation_link", link)
    }

    /// Password reset email carrying `reset_link`
    pub fn password_reset(to: impl Into<String>, link: impl Into<String>) -> Self {
        Self::new(NotificationTemplate::PasswordReset, to).with("reset_link", link)
    }

    /// The link placed in the message, if any
    pub fn link(&self) -> Option<&str> {
        self.context
            .get("activation_link")
            .or_else(|| self.context.get("reset_link"))
            .map(String::as_str)
    }
}

/// Builds the absolute links placed in notifications
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn activation(&self, token: &str) -> String {
        format!("{}{}/activation/confirm/{}", self.base_url, crate::API_PREFIX, token)
    }

    pub fn password_reset(&self, token: &str) -> String {
        format!(
            "{}{}/reset-password/confirm/{}",
            self.base_url,
            crate::API_PREFIX,
            token
        )
    }
}

/// Fire-and-forget notification sink used by the account services
pub trait NotificationPort: Send + Sync {
    /// Enqueue `notification`; never blocks on delivery
    fn send(&self, notification: Notification);
}

/// Transport that actually delivers a notification
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Sink that only logs, used when SMTP is not configured
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()> {
        // Links embed live tokens and stay out of the log
        log::info!(
            "Notification {} for {} (SMTP not configured, not sent)",
            notification.template,
            notification.to
        );
        Ok(())
    }
}

/// Retry behaviour of the dispatcher worker
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total delivery attempts per notification
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles on each further attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(2))
    }
}

/// Queue-backed [`NotificationPort`] drained by a background task
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::UnboundedSender<Notification>,
}

impl NotificationDispatcher {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(sink: Arc<dyn NotificationSink>) -> Self {
        Self::spawn_with_policy(sink, RetryPolicy::default())
    }

    pub fn spawn_with_policy(sink: Arc<dyn NotificationSink>, policy: RetryPolicy) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(receiver, sink, policy));
        Self { sender }
    }
}

impl NotificationPort for NotificationDispatcher {
    fn send(&self, notification: Notification) {
        let template = notification.template;
        if self.sender.send(notification).is_err() {
            log::error!("Notification worker has stopped; dropped {} message", template);
        }
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<Notification>,
    sink: Arc<dyn NotificationSink>,
    policy: RetryPolicy,
) {
    while let Some(notification) = receiver.recv().await {
        // One delivery task per message
        let sink = sink.clone();
        tokio::spawn(async move { deliver_with_retry(sink.as_ref(), &notification, policy).await });
    }
    log::debug!("Notification queue closed");
}

async fn deliver_with_retry(
    sink: &dyn NotificationSink,
    notification: &Notification,
    policy: RetryPolicy,
) -> bool {
    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.delay_before(attempt)).await;
        }
        match sink.deliver(notification).await {
            Ok(()) => return true,
            Err(e) => log::warn!(
                "Delivery of {} to {} failed (attempt {}/{}): {}",
                notification.template,
                notification.to,
                attempt,
                policy.max_attempts,
                e
            ),
        }
    }

    log::error!(
        "Giving up on {} to {} after {} attempts",
        notification.template,
        notification.to,
        policy.max_attempts
    );
    false
}

/// Port that keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn last(&self) -> Option<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl NotificationPort for RecordingNotifier {
    fn send(&self, notification: Notification) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
