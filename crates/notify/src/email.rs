//! Contact message delivery via SMTP.
//!
//! [`SmtpNotifier`] wraps the `lettre` async SMTP transport and sends a
//! plain-text copy of each contact message to the configured owner address,
//! with `Reply-To` set to the visitor. Configuration is loaded from the
//! environment; when `SMTP_HOST` or `CONTACT_EMAIL` is missing,
//! [`EmailConfig::from_env`] returns `None` and email is disabled.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::{ContactNotification, Notifier};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// A sender or recipient address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@folio.local";

/// Subject used when the visitor left the subject blank.
const DEFAULT_SUBJECT: &str = "New message";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    /// Where contact messages are delivered.
    pub contact_address: String,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable        | Required | Default               |
    /// |-----------------|----------|-----------------------|
    /// | `SMTP_HOST`     | yes      | --                    |
    /// | `CONTACT_EMAIL` | yes      | --                    |
    /// | `SMTP_PORT`     | no       | `587`                 |
    /// | `SMTP_FROM`     | no       | `noreply@folio.local` |
    /// | `SMTP_USER`     | no       | --                    |
    /// | `SMTP_PASSWORD` | no       | --                    |
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let smtp_host = get("SMTP_HOST")?;
        let contact_address = get("CONTACT_EMAIL")?;
        Some(Self {
            smtp_host,
            smtp_port: get("SMTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: get("SMTP_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: get("SMTP_USER"),
            smtp_password: get("SMTP_PASSWORD"),
            contact_address,
        })
    }
}

// ---------------------------------------------------------------------------
// Message rendering
// ---------------------------------------------------------------------------

/// Subject line and plain-text body for a contact message.
pub fn render_contact_email(message: &ContactNotification) -> (String, String) {
    let subject = message
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUBJECT);
    let subject = format!("[Contact] {subject}");

    let body = format!(
        "From: {name} <{email}>\n\n{body}\n\n--\nReply to this email to answer {name} directly.\n",
        name = message.name,
        email = message.email,
        body = message.body,
    );
    (subject, body)
}

// ---------------------------------------------------------------------------
// SmtpNotifier
// ---------------------------------------------------------------------------

pub struct SmtpNotifier {
    from: Mailbox,
    to: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    /// Parse the configured addresses and build the SMTP transport.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            from: config.from_address.parse()?,
            to: config.contact_address.parse()?,
            mailer: builder.build(),
        })
    }

    fn build_message(&self, message: &ContactNotification) -> Result<Message, EmailError> {
        let (subject, body) = render_contact_email(message);
        let reply_to: Mailbox = message.email.parse()?;

        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .reply_to(reply_to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn contact_received(&self, message: &ContactNotification) -> Result<(), EmailError> {
        let email = self.build_message(message)?;
        self.mailer.send(email).await?;
        tracing::info!(to = %self.to, from = %message.email, "Contact notification sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
