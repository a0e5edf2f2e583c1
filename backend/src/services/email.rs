//! Outgoing e-mail: transport seam, SMTP and no-op transports, and message rendering

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use url::Url;

use crate::config::{Config, MailConfig};
use crate::error::{AppError, AppResult};

/// A rendered HTML message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Error, Debug)]
pub enum MailError {
    /// Worth another attempt (connection problems, 4xx replies)
    #[error("transient mail failure: {0}")]
    Transient(String),

    #[error("mail rejected: {0}")]
    Rejected(String),
}

impl From<MailError> for AppError {
    fn from(e: MailError) -> Self {
        AppError::Mail(e.to_string())
    }
}

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// SMTP relay over STARTTLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> AppResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Mail(format!("Invalid SMTP relay '{}': {}", config.host, e)))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.username.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| MailError::Rejected(format!("sender: {}", e)))?,
            )
            .to(mail
                .to
                .parse()
                .map_err(|e| MailError::Rejected(format!("recipient: {}", e)))?)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(mail.html.clone())
            .map_err(|e| MailError::Rejected(e.to_string()))?;

        match self.transport.send(message).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_permanent() => Err(MailError::Rejected(e.to_string())),
            Err(e) => Err(MailError::Transient(e.to_string())),
        }
    }
}

/// Logs messages instead of sending them
pub struct NoOpMailer;

#[async_trait]
impl Mailer for NoOpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to,
            subject = %mail.subject,
            "Mail delivery disabled, message dropped"
        );
        Ok(())
    }
}

/// Pick the transport for the configured environment
pub fn mailer_from_config(config: &MailConfig) -> AppResult<Arc<dyn Mailer>> {
    if config.enabled {
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        Ok(Arc::new(NoOpMailer))
    }
}

/// Renders and delivers the portal's e-mails
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<dyn Mailer>,
    base_url: String,
    support_mailbox: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl EmailService {
    pub fn new(mailer: Arc<dyn Mailer>, config: &Config) -> Self {
        Self {
            mailer,
            base_url: config.base_url.clone(),
            support_mailbox: config.mail.username.clone(),
            max_retries: config.mail.max_retries.max(1),
            retry_delay: Duration::from_millis(500),
        }
    }

    #[cfg(test)]
    fn without_delay(mut self) -> Self {
        self.retry_delay = Duration::ZERO;
        self
    }

    pub async fn send_verification(&self, email: &str, name: &str, code: &str) -> AppResult<()> {
        let link = verification_url(&self.base_url, email, code)?;
        let mail = OutgoingMail {
            to: email.to_string(),
            subject: "Medfast: Complete Your Registration".to_string(),
            html: render_verification(name, link.as_str(), &self.support_mailbox),
        };

        self.deliver(&mail).await
    }

    pub async fn send_reset_password(&self, email: &str, code: &str) -> AppResult<()> {
        let mail = OutgoingMail {
            to: email.to_string(),
            subject: "Medfast: Reset Your Password".to_string(),
            html: render_reset_password(code, &self.support_mailbox),
        };

        self.deliver(&mail).await
    }

    /// Send, retrying transient failures up to `max_retries` attempts in total
    async fn deliver(&self, mail: &OutgoingMail) -> AppResult<()> {
        let mut attempt = 1;
        loop {
            match self.mailer.send(mail).await {
                Ok(()) => {
                    tracing::debug!(to = %mail.to, attempt, "Mail sent");
                    return Ok(());
                }
                Err(MailError::Transient(reason)) if attempt < self.max_retries => {
                    tracing::warn!(
                        to = %mail.to,
                        attempt,
                        %reason,
                        "Mail delivery failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(to = %mail.to, attempt, error = %e, "Mail delivery failed");
                    return Err(e.into());
                }
            }
        }
    }
}

/// `<base_url>/verify?email=<email>&code=<code>` with the query encoded
pub fn verification_url(base_url: &str, email: &str, code: &str) -> AppResult<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| AppError::Internal(format!("Invalid base URL '{}': {}", base_url, e)))?;

    url.path_segments_mut()
        .map_err(|_| AppError::Internal(format!("Base URL '{}' cannot carry a path", base_url)))?
        .pop_if_empty()
        .push("verify");
    url.query_pairs_mut()
        .append_pair("email", email)
        .append_pair("code", code);

    Ok(url)
}

fn render_verification(name: &str, link: &str, support: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #1d1d1f;">
  <h2>Welcome to Medfast, {name}!</h2>
  <p>Thank you for registering. Please confirm your e-mail address to activate your account.</p>
  <p><a href="{link}" style="background: #2f6fed; color: #ffffff; padding: 10px 18px; text-decoration: none; border-radius: 4px;">Verify e-mail</a></p>
  <p>If the button does not work, copy this link into your browser:<br>{link}</p>
  <p>If you did not create an account, you can ignore this message.</p>
  <p>Need help? Contact us at <a href="mailto:{support}">{support}</a>.</p>
  <p>The Medfast Team</p>
</body>
</html>"#
    )
}

fn render_reset_password(code: &str, support: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #1d1d1f;">
  <h2>Reset your password</h2>
  <p>We received a request to reset the password of your Medfast account.</p>
  <p>Your verification code is:</p>
  <p style="font-size: 28px; letter-spacing: 8px; font-weight: bold;">{code}</p>
  <p>The code expires shortly. If you did not request a reset, you can ignore this message.</p>
  <p>Need help? Contact us at <a href="mailto:{support}">{support}</a>.</p>
  <p>The Medfast Team</p>
</body>
</html>"#
    )
}
