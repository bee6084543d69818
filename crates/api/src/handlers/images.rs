//! Handlers for an entity's image (`/admin/{kind}/{id}/image`).

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use folio_core::error::CoreError;
use folio_core::types::DbId;
use folio_db::repositories::ImageAssetRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::content::parse_kind;
use crate::middleware::rbac::RequireAdmin;
use crate::publishing::content;
use crate::publishing::ingest::{attach_image, Upload};
use crate::publishing::views::ImageView;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/{kind}/{id}/image
///
/// Multipart upload with a single `file` part. Replaces the entity's
/// current image; a rejected upload leaves it unchanged.
pub async fn upload(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, DbId)>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<ImageView>>> {
    let kind = parse_kind(&kind)?;
    let max_bytes = state.config.media.image.max_bytes;

    let mut upload: Option<Upload> = None;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue; // ignore unknown fields
        }
        let declared_mime = field.content_type().map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                too_large(max_bytes)
            } else {
                AppError::BadRequest(e.to_string())
            }
        })? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(too_large(max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }

        upload = Some(Upload {
            bytes,
            declared_mime,
        });
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("Missing 'file' part".into()))?;
    let asset = attach_image(
        &state.pool,
        &state.assets,
        state.config.media.image,
        kind,
        id,
        upload,
    )
    .await?;

    Ok(Json(DataResponse::new(ImageView::from(&asset))))
}

/// GET /api/v1/admin/{kind}/{id}/image
pub async fn get(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<ImageView>>> {
    let kind = parse_kind(&kind)?;
    content::find(&state.pool, kind, id).await?;

    let asset = ImageAssetRepo::find_by_entity(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Image", id))?;
    Ok(Json(DataResponse::new(ImageView::from(&asset))))
}

fn too_large(max_bytes: usize) -> AppError {
    CoreError::InvalidAsset(format!("upload exceeds the limit of {max_bytes} bytes")).into()
}
