//! Repository for the `contact_messages` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::contact_message::{ContactMessage, CreateContactMessage};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, name, email, subject, body, is_read, spam_score, is_spam, received_at";

/// Filter clause shared by `list` and `count`: `$1` include spam, `$2` unread only.
const FILTER: &str = "($1 OR NOT is_spam) AND (NOT $2 OR NOT is_read)";

/// Provides access to contact form messages. Messages are append-only apart
/// from the read flag.
pub struct ContactMessageRepo;

impl ContactMessageRepo {
    /// Insert a new message, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateContactMessage,
    ) -> Result<ContactMessage, sqlx::Error> {
        let query = format!(
            "INSERT INTO contact_messages (name, email, subject, body, spam_score, is_spam)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContactMessage>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.subject)
            .bind(&input.body)
            .bind(input.spam_score)
            .bind(input.is_spam)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ContactMessage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contact_messages WHERE id = $1");
        sqlx::query_as::<_, ContactMessage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Newest messages first.
    pub async fn list(
        pool: &PgPool,
        include_spam: bool,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContactMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM contact_messages
             WHERE {FILTER}
             ORDER BY received_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, ContactMessage>(&query)
            .bind(include_spam)
            .bind(unread_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(
        pool: &PgPool,
        include_spam: bool,
        unread_only: bool,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM contact_messages WHERE {FILTER}");
        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(include_spam)
            .bind(unread_only)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Set the read flag. Returns `None` if no message has this ID.
    pub async fn set_read(
        pool: &PgPool,
        id: DbId,
        is_read: bool,
    ) -> Result<Option<ContactMessage>, sqlx::Error> {
        let query = format!(
            "UPDATE contact_messages SET is_read = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContactMessage>(&query)
            .bind(id)
            .bind(is_read)
            .fetch_optional(pool)
            .await
    }
}
