use crate::config::SmtpConfig;
use crate::plugins::traits::{NotificationEvent, NotificationResult, NotifierPlugin};
use crate::utils::error::NotificationError;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;

pub const USER_VAR: &str = "EMAIL_USER";
pub const PASSWORD_VAR: &str = "EMAIL_PASSWORD";
pub const RECIPIENT_VAR: &str = "EMAIL_RECIPIENT";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct EmailCredentials {
    pub username: String,
    pub password: String,
    pub recipient: String,
}

impl EmailCredentials {
    /// Empty values count as missing. The recipient falls back to the sender.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NotificationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let username = present(USER_VAR).ok_or(NotificationError::MissingCredentials)?;
        let password = present(PASSWORD_VAR).ok_or(NotificationError::MissingCredentials)?;
        let recipient = present(RECIPIENT_VAR).unwrap_or_else(|| username.clone());

        Ok(EmailCredentials {
            username,
            password,
            recipient,
        })
    }

    pub fn from_env() -> Result<Self, NotificationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Plain-text SMTP notifier. Credentials are looked up on every send.
pub struct EmailNotifier {
    smtp: SmtpConfig,
    lookup: EnvLookup,
}

impl EmailNotifier {
    pub fn new(smtp: SmtpConfig) -> Self {
        EmailNotifier {
            smtp,
            lookup: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    /// Replace the environment as the credential source.
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Arc::new(lookup);
        self
    }

    fn credentials(&self) -> Result<EmailCredentials, NotificationError> {
        EmailCredentials::from_lookup(|key| (self.lookup)(key))
    }

    fn build_message(
        &self,
        credentials: &EmailCredentials,
        event: &NotificationEvent,
    ) -> Result<Message, NotificationError> {
        let from = parse_mailbox(&credentials.username)?;
        let to = parse_mailbox(&credentials.recipient)?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(event.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(event.body.clone())
            .map_err(|e| NotificationError::Build(e.to_string()))
    }

    fn transport(
        &self,
        credentials: &EmailCredentials,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
        let smtp_credentials =
            Credentials::new(credentials.username.clone(), credentials.password.clone());

        let builder = if self.smtp.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.host)
                .map_err(|e| NotificationError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(self.smtp.host.as_str())
        };

        Ok(builder
            .port(self.smtp.port)
            .credentials(smtp_credentials)
            .timeout(Some(Duration::from_secs(self.smtp.timeout_secs)))
            .build())
    }

    async fn deliver(&self, event: &NotificationEvent) -> Result<String, NotificationError> {
        let credentials = self.credentials()?;
        let message = self.build_message(&credentials, event)?;
        let mailer = self.transport(&credentials)?;

        mailer
            .send(message)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        tracing::debug!(
            "Delivered '{}' to {} via {}:{}",
            event.subject,
            credentials.recipient,
            self.smtp.host,
            self.smtp.port
        );
        Ok(format!("email-{}", chrono::Utc::now().timestamp()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotificationError::InvalidAddress {
            address: address.to_string(),
            message: e.to_string(),
        })
}

#[async_trait]
impl NotifierPlugin for EmailNotifier {
    async fn notify(&self, event: &NotificationEvent) -> NotificationResult {
        match self.deliver(event).await {
            Ok(message_id) => {
                tracing::info!("[+] Email sent successfully.");
                NotificationResult::sent(message_id)
            }
            Err(e) => {
                tracing::error!("[!] Failed to send email: {}", e);
                NotificationResult::failed(&e)
            }
        }
    }
}
