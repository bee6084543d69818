//! Outbound notifications for folio.
//!
//! - [`email`] -- SMTP delivery of contact form messages to the site owner.
//!
//! Handlers depend on the [`Notifier`] trait so the HTTP layer can run
//! without an SMTP server (tests, local development).

pub mod email;

pub use email::{EmailConfig, EmailError, SmtpNotifier};

use async_trait::async_trait;

/// A contact form message to forward to the site owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactNotification {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub body: String,
}

/// Sink for owner-facing notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn contact_received(&self, message: &ContactNotification) -> Result<(), EmailError>;
}
