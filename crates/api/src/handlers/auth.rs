//! Handlers for the `/auth` resource.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use folio_core::error::CoreError;
use folio_db::models::account::{AccountView, AdminAccount};
use folio_db::repositories::AccountRepo;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::issue_access_token;
use crate::auth::password::{burn_verification, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Consecutive wrong passwords that lock an account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Length of a lockout.
const LOCK_DURATION_MINS: i32 = 15;

/// Same text for unknown usernames and wrong passwords.
const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub user: AccountView,
}

/// POST /api/v1/auth/login
///
/// Exchange username and password for a bearer token. Inactive and locked
/// accounts get 403 even with the right password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let Some(account) = AccountRepo::find_by_username(&state.pool, input.username.trim()).await?
    else {
        burn_verification(&input.password);
        return Err(invalid_credentials());
    };

    ensure_can_log_in(&account)?;

    let matches = verify_password(&input.password, &account.password_hash)
        .map_err(|e| AppError::InternalError(format!("Stored hash for account {}: {e}", account.id)))?;
    if !matches {
        let failure = AccountRepo::record_failed_login(
            &state.pool,
            account.id,
            MAX_FAILED_ATTEMPTS,
            LOCK_DURATION_MINS,
        )
        .await?;
        match failure.locked_until {
            Some(until) => tracing::warn!(account_id = account.id, %until, "Account locked after repeated failures"),
            None => tracing::info!(
                account_id = account.id,
                failures = failure.failed_login_count,
                "Rejected password"
            ),
        }
        return Err(invalid_credentials());
    }

    AccountRepo::record_successful_login(&state.pool, account.id).await?;
    let issued = issue_access_token(account.id, &account.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token signing failed: {e}")))?;

    tracing::info!(account_id = account.id, "Logged in");

    Ok(Json(LoginResponse {
        access_token: issued.token,
        token_type: "Bearer",
        expires_in: issued.expires_in,
        user: AccountView::from(&account),
    }))
}

/// GET /api/v1/auth/me
///
/// The account behind the presented token.
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<AccountView>>> {
    let account = AccountRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .filter(|a| a.is_active)
        .ok_or_else(|| CoreError::Unauthorized("Account no longer active".into()))?;

    Ok(Json(DataResponse::new(AccountView::from(&account))))
}

fn ensure_can_log_in(account: &AdminAccount) -> Result<(), CoreError> {
    if !account.is_active {
        return Err(CoreError::Forbidden("Account is deactivated".into()));
    }
    if account.is_locked_at(Utc::now()) {
        return Err(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        ));
    }
    Ok(())
}

fn invalid_credentials() -> AppError {
    CoreError::Unauthorized(INVALID_CREDENTIALS.into()).into()
}
