//! First admin account.

use folio_core::roles::ROLE_ADMIN;
use folio_db::models::account::NewAccount;
use folio_db::repositories::AccountRepo;
use sqlx::PgPool;

use crate::auth::password::{check_password_policy, hash_password};
use crate::config::AdminBootstrap;
use crate::error::{AppError, AppResult};

/// Create the configured admin when no account exists yet.
///
/// Returns `true` if an account was created. Existing accounts are never
/// modified, so changing `ADMIN_PASSWORD` after the first start has no effect.
pub async fn ensure_admin(pool: &PgPool, admin: &AdminBootstrap) -> AppResult<bool> {
    if AccountRepo::count(pool).await? > 0 {
        tracing::debug!("Accounts already exist, skipping admin bootstrap");
        return Ok(false);
    }

    check_password_policy(&admin.password, &admin.username)
        .map_err(|msg| AppError::BadRequest(format!("ADMIN_PASSWORD {msg}")))?;
    let password_hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Failed to hash admin password: {e}")))?;

    let account = AccountRepo::create(
        pool,
        &NewAccount {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password_hash,
            role: ROLE_ADMIN.to_string(),
        },
    )
    .await?;

    tracing::info!(account_id = account.id, username = %account.username, "Admin account created");
    Ok(true)
}
