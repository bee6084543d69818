//! Handlers for the admin contact-message inbox.

use axum::extract::{Path, Query, State};
use axum::Json;
use folio_core::error::CoreError;
use folio_core::pagination::Page;
use folio_core::types::DbId;
use folio_db::models::contact_message::ContactMessage;
use folio_db::repositories::ContactMessageRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::query::MessageParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/messages
///
/// Newest first. Spam is hidden unless `include_spam=true`.
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<MessageParams>,
) -> AppResult<Json<DataResponse<Page<ContactMessage>>>> {
    let page = params.page_request(state.config.page_size);
    let items = ContactMessageRepo::list(
        &state.pool,
        params.include_spam,
        params.unread,
        page.limit(),
        page.offset(),
    )
    .await?;
    let total = ContactMessageRepo::count(&state.pool, params.include_spam, params.unread).await?;

    Ok(Json(DataResponse::new(Page::new(items, page, total))))
}

/// POST /api/v1/admin/messages/{id}/read
pub async fn mark_read(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ContactMessage>>> {
    let message = ContactMessageRepo::set_read(&state.pool, id, true)
        .await?
        .ok_or_else(|| CoreError::not_found("Message", id))?;
    Ok(Json(DataResponse::new(message)))
}
