//! Aggregate queries for the admin dashboard.

use folio_core::content::ContentKind;
use folio_core::workflow::ContentStatus;
use sqlx::PgPool;

use crate::models::dashboard::DashboardStats;

pub struct DashboardRepo;

impl DashboardRepo {
    /// Content and inbox counters in a single round trip. Soft-deleted
    /// entities and spam are not counted.
    pub async fn stats(pool: &PgPool) -> Result<DashboardStats, sqlx::Error> {
        sqlx::query_as::<_, DashboardStats>(
            "SELECT
                COUNT(*) FILTER (WHERE kind = $1) AS total_posts,
                COUNT(*) FILTER (WHERE kind = $1 AND status_id = $3) AS published_posts,
                COUNT(*) FILTER (WHERE kind = $1 AND status_id = $4) AS draft_posts,
                COUNT(*) FILTER (WHERE kind = $1 AND status_id = $5) AS archived_posts,
                COUNT(*) FILTER (WHERE kind = $2) AS portfolio_items,
                (SELECT COUNT(*) FROM contact_messages WHERE NOT is_read AND NOT is_spam)
                    AS unread_messages
             FROM content_entities
             WHERE deleted_at IS NULL",
        )
        .bind(ContentKind::Post.as_str())
        .bind(ContentKind::PortfolioItem.as_str())
        .bind(ContentStatus::Published.id())
        .bind(ContentStatus::Draft.id())
        .bind(ContentStatus::Archived.id())
        .fetch_one(pool)
        .await
    }
}
