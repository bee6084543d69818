//! Repository for the `contact_submissions` table.

use sqlx::PgPool;

/// Log of contact form attempts, queried for rate limiting.
pub struct ContactSubmissionRepo;

impl ContactSubmissionRepo {
    /// Record one attempt. `email` should already be in canonical form.
    pub async fn record(pool: &PgPool, ip_address: &str, email: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO contact_submissions (ip_address, email) VALUES ($1, $2)")
            .bind(ip_address)
            .bind(email)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Attempts from `ip_address` or by `email` within the last
    /// `window_secs` seconds. A row matching both is counted once.
    pub async fn count_recent(
        pool: &PgPool,
        ip_address: &str,
        email: &str,
        window_secs: i64,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM contact_submissions
             WHERE (ip_address = $1 OR email = $2)
               AND submitted_at >= NOW() - make_interval(secs => $3)",
        )
        .bind(ip_address)
        .bind(email)
        .bind(window_secs as f64)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
