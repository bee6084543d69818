//! Handler for the public contact form.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use folio_core::contact::{
    honeypot_triggered, is_spam, rate_limit_key, spam_score, MessageText, RATE_LIMITS,
};
use folio_db::models::contact_message::{ContactForm, CreateContactMessage};
use folio_db::repositories::{ContactMessageRepo, ContactSubmissionRepo};
use folio_notify::ContactNotification;
use serde::Serialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::client_ip::ClientIp;
use crate::response::DataResponse;
use crate::state::AppState;

/// Acknowledgement returned for every accepted submission.
#[derive(Debug, Serialize)]
pub struct ContactReceipt {
    pub received: bool,
}

fn accepted() -> (StatusCode, Json<DataResponse<ContactReceipt>>) {
    (
        StatusCode::ACCEPTED,
        Json(DataResponse::new(ContactReceipt { received: true })),
    )
}

/// Refuse the submission when the client IP or the email address has used
/// up any window of [`RATE_LIMITS`].
async fn check_rate_limits(state: &AppState, ip: &str, email: &str) -> AppResult<()> {
    for limit in RATE_LIMITS {
        let recent =
            ContactSubmissionRepo::count_recent(&state.pool, ip, email, limit.window_secs).await?;
        if limit.is_exceeded_by(recent) {
            tracing::warn!(ip, limit = limit.name, recent, "Contact rate limit exceeded");
            return Err(AppError::TooManyRequests {
                retry_after_secs: limit.window_secs,
            });
        }
    }
    Ok(())
}

/// POST /api/v1/contact
///
/// Stores the message and emails the site owner unless it scores as spam.
/// Honeypot submissions get the same response but are not stored. Every
/// attempt under the rate limits counts toward them, valid or not.
pub async fn submit(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(form): Json<ContactForm>,
) -> AppResult<(StatusCode, Json<DataResponse<ContactReceipt>>)> {
    let email_key = rate_limit_key(&form.email);
    check_rate_limits(&state, &ip, &email_key).await?;
    ContactSubmissionRepo::record(&state.pool, &ip, &email_key).await?;

    if honeypot_triggered(form.website.as_deref()) {
        tracing::info!("Contact submission dropped by honeypot");
        return Ok(accepted());
    }

    form.validate()?;

    let subject = form
        .subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let text = MessageText {
        name: form.name.trim(),
        email: form.email.trim(),
        subject: subject.as_deref().unwrap_or(""),
        body: form.body.trim(),
    };
    let score = spam_score(&text);

    let message = ContactMessageRepo::create(
        &state.pool,
        &CreateContactMessage {
            name: text.name.to_string(),
            email: text.email.to_string(),
            subject: subject.clone(),
            body: text.body.to_string(),
            spam_score: score,
            is_spam: is_spam(score),
        },
    )
    .await?;

    tracing::info!(
        message_id = message.id,
        spam_score = message.spam_score,
        is_spam = message.is_spam,
        "Contact message received"
    );

    if message.is_spam {
        return Ok(accepted());
    }

    if let Some(notifier) = &state.notifier {
        let notification = ContactNotification {
            name: message.name.clone(),
            email: message.email.clone(),
            subject: message.subject.clone(),
            body: message.body.clone(),
        };
        match notifier.contact_received(&notification).await {
            Ok(()) => tracing::info!(message_id = message.id, "Contact notification sent"),
            Err(e) => tracing::warn!(
                message_id = message.id,
                error = %e,
                "Contact notification failed; message is stored"
            ),
        }
    }

    Ok(accepted())
}
