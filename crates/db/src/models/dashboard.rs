//! Admin dashboard counters.

use serde::Serialize;
use sqlx::FromRow;

/// Aggregate counts shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct DashboardStats {
    pub total_posts: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub archived_posts: i64,
    pub portfolio_items: i64,
    pub unread_messages: i64,
}
