//! Handler for the admin dashboard counters.

use axum::extract::State;
use axum::Json;
use folio_db::models::dashboard::DashboardStats;
use folio_db::repositories::DashboardRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/dashboard
pub async fn stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DashboardStats>>> {
    let stats = DashboardRepo::stats(&state.pool).await?;
    Ok(Json(DataResponse::new(stats)))
}
