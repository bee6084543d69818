//! Repository for the `admin_accounts` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::account::{AdminAccount, LoginFailure, NewAccount};

const COLUMNS: &str = "id, username, email, password_hash, role, is_active, \
                       failed_login_count, locked_until, last_login_at, created_at, updated_at";

/// Provides access to admin accounts and their login bookkeeping.
pub struct AccountRepo;

impl AccountRepo {
    pub async fn create(pool: &PgPool, input: &NewAccount) -> Result<AdminAccount, sqlx::Error> {
        let query = format!(
            "INSERT INTO admin_accounts (username, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AdminAccount>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AdminAccount>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM admin_accounts WHERE id = $1");
        sqlx::query_as::<_, AdminAccount>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up the account a login names. Case-insensitive.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<AdminAccount>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM admin_accounts WHERE LOWER(username) = LOWER($1)");
        sqlx::query_as::<_, AdminAccount>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin_accounts")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Disable an account. Returns `false` if it was already inactive.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE admin_accounts SET is_active = FALSE, updated_at = NOW()
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count a rejected password in one statement.
    ///
    /// The failure that reaches `max_failures` locks the account for
    /// `lock_minutes` and restarts the count, so the next lockout again
    /// needs `max_failures` fresh failures.
    pub async fn record_failed_login(
        pool: &PgPool,
        id: DbId,
        max_failures: i32,
        lock_minutes: i32,
    ) -> Result<LoginFailure, sqlx::Error> {
        sqlx::query_as::<_, LoginFailure>(
            "UPDATE admin_accounts SET
                failed_login_count = CASE WHEN failed_login_count + 1 >= $2
                                          THEN 0 ELSE failed_login_count + 1 END,
                locked_until = CASE WHEN failed_login_count + 1 >= $2
                                    THEN NOW() + make_interval(mins => $3)
                                    ELSE NULL END
             WHERE id = $1
             RETURNING failed_login_count, locked_until",
        )
        .bind(id)
        .bind(max_failures)
        .bind(lock_minutes)
        .fetch_one(pool)
        .await
    }

    /// Clear failure bookkeeping and stamp `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE admin_accounts SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
