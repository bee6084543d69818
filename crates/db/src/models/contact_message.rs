//! Contact message model and DTOs.

use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `contact_messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContactMessage {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub body: String,
    pub is_read: bool,
    pub spam_score: f64,
    pub is_spam: bool,
    pub received_at: Timestamp,
}

/// Contact form submission.
///
/// `website` is a honeypot: it is hidden from people, so any value means
/// the submission came from a bot.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(length(min = 2, max = 100, message = "must be 2-100 characters"))]
    pub name: String,
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 120, message = "must be at most 120 characters")
    )]
    pub email: String,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub subject: Option<String>,
    #[validate(length(min = 10, max = 2000, message = "must be 10-2000 characters"))]
    pub body: String,
    #[serde(default)]
    pub website: Option<String>,
}

/// Values written for a new message.
#[derive(Debug, Clone)]
pub struct CreateContactMessage {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub body: String,
    pub spam_score: f64,
    pub is_spam: bool,
}
