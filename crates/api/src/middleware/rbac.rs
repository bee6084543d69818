//! Admin-only extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use folio_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Guards every authoring route: 401 without a valid token, 403 when the
/// token's role is not `admin`.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = user.user_id, role = %user.role, "Non-admin token on admin route");
            return Err(CoreError::Forbidden("Admin role required".into()).into());
        }
        Ok(RequireAdmin(user))
    }
}
