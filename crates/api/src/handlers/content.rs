//! Handlers for the admin `/admin/{kind}` resources (posts and portfolio items).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use folio_core::content::ContentKind;
use folio_core::error::CoreError;
use folio_core::pagination::Page;
use folio_core::types::{DbId, Timestamp};
use folio_core::workflow::ContentStatus;
use folio_db::models::content::{ContentEntity, ContentFilter, ContentOrder, CreateContent, UpdateContent};
use folio_db::repositories::ImageAssetRepo;
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::publishing::content;
use crate::publishing::views::{images_by_entity, AdminContent};
use crate::query::AdminContentParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/{kind}/{id}/transition`.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub target: ContentStatus,
    pub expected_updated_at: Timestamp,
}

/// Resolve the `{kind}` path segment. Unknown kinds are a 404.
pub fn parse_kind(segment: &str) -> AppResult<ContentKind> {
    ContentKind::from_route_segment(segment)
        .ok_or_else(|| CoreError::not_found("Collection", segment).into())
}

async fn with_image(pool: &PgPool, entity: ContentEntity) -> AppResult<AdminContent> {
    let image = ImageAssetRepo::find_by_entity(pool, entity.id).await?;
    Ok(AdminContent::new(entity, image.as_ref()))
}

/// GET /api/v1/admin/{kind}
///
/// Every non-deleted entity regardless of status, newest first.
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<AdminContentParams>,
) -> AppResult<Json<DataResponse<Page<AdminContent>>>> {
    let kind = parse_kind(&kind)?;
    let page = params.page_request(state.config.page_size);
    let filter = ContentFilter {
        status: params.status,
        tag: params.tag,
    };

    let page = content::list(&state.pool, kind, filter, ContentOrder::Chronological, page).await?;
    let mut images = images_by_entity(&state.pool, &page.items).await?;
    let page = page.map(|entity| {
        let image = images.remove(&entity.id);
        AdminContent::new(entity, image.as_ref())
    });

    Ok(Json(DataResponse::new(page)))
}

/// POST /api/v1/admin/{kind}
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(input): Json<CreateContent>,
) -> AppResult<(StatusCode, Json<DataResponse<AdminContent>>)> {
    let kind = parse_kind(&kind)?;
    let entity = content::create(&state.pool, kind, input).await?;
    tracing::debug!(entity_id = entity.id, user_id = admin.user_id, "Created by admin");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(AdminContent::new(entity, None))),
    ))
}

/// GET /api/v1/admin/{kind}/{id}
pub async fn get(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<AdminContent>>> {
    let kind = parse_kind(&kind)?;
    let entity = content::find(&state.pool, kind, id).await?;
    Ok(Json(DataResponse::new(with_image(&state.pool, entity).await?)))
}

/// PUT /api/v1/admin/{kind}/{id}
///
/// Partial update; the body must echo the entity's current `updated_at`
/// as `expected_updated_at`.
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, DbId)>,
    Json(input): Json<UpdateContent>,
) -> AppResult<Json<DataResponse<AdminContent>>> {
    let kind = parse_kind(&kind)?;
    let entity = content::update(&state.pool, kind, id, input).await?;
    Ok(Json(DataResponse::new(with_image(&state.pool, entity).await?)))
}

/// POST /api/v1/admin/{kind}/{id}/transition
pub async fn transition(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, DbId)>,
    Json(input): Json<TransitionRequest>,
) -> AppResult<Json<DataResponse<AdminContent>>> {
    let kind = parse_kind(&kind)?;
    let entity = content::transition(
        &state.pool,
        kind,
        id,
        input.target,
        input.expected_updated_at,
    )
    .await?;
    Ok(Json(DataResponse::new(with_image(&state.pool, entity).await?)))
}

/// DELETE /api/v1/admin/{kind}/{id}
///
/// Soft delete. Returns 204 No Content.
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, DbId)>,
) -> AppResult<StatusCode> {
    let kind = parse_kind(&kind)?;
    content::delete(&state.pool, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
