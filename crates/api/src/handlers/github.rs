//! Handlers for the public GitHub profile statistics and activity feed.

use axum::extract::State;
use axum::Json;
use folio_core::error::CoreError;
use folio_github::service::{ActivitySnapshot, StatsSnapshot};
use folio_github::StatsService;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/github/stats
///
/// Cached profile statistics. `stale: true` means the last refresh failed
/// and an older value is being served.
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<DataResponse<StatsSnapshot>>> {
    let snapshot = service(&state)?
        .get()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    Ok(Json(DataResponse::new(snapshot)))
}

/// GET /api/v1/github/activity
///
/// Up to 20 of the user's commits from the last 30 days, newest first.
pub async fn activity(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ActivitySnapshot>>> {
    let snapshot = service(&state)?
        .activity()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    Ok(Json(DataResponse::new(snapshot)))
}

fn service(state: &AppState) -> Result<&StatsService, CoreError> {
    state
        .github
        .as_deref()
        .ok_or_else(|| CoreError::not_found("GitHub profile", "configured"))
}
