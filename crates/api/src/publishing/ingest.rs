//! Attach an uploaded image to a content entity.
//!
//! The upload is validated and normalized on a blocking thread, written
//! under its content hash, then recorded. The previous image of the entity
//! is only touched after the new row is committed, so a rejected or failed
//! upload leaves the entity's current image unchanged.

use folio_core::content::ContentKind;
use folio_core::error::CoreError;
use folio_core::imaging::store::PARTIAL_MAX_AGE;
use folio_core::imaging::{process_image, ImageConfig, LocalAssetStore};
use folio_core::types::DbId;
use folio_db::models::image_asset::{ImageAsset, UpsertImageAsset};
use folio_db::repositories::ImageAssetRepo;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::publishing::content;

/// An upload as received from the client.
#[derive(Debug)]
pub struct Upload {
    pub bytes: Vec<u8>,
    /// `Content-Type` of the multipart field, if the client sent one.
    pub declared_mime: Option<String>,
}

/// Validate, normalize, store and record `upload` as the image of entity `id`.
pub async fn attach_image(
    pool: &PgPool,
    store: &LocalAssetStore,
    config: ImageConfig,
    kind: ContentKind,
    id: DbId,
    upload: Upload,
) -> AppResult<ImageAsset> {
    // Unknown entities are rejected before any work is done.
    content::find(pool, kind, id).await?;

    let received = upload.bytes.len();
    let blocking_store = store.clone();
    let (processed, stored) = tokio::task::spawn_blocking(move || {
        blocking_store.sweep_partials(kind, PARTIAL_MAX_AGE);
        let processed =
            process_image(&upload.bytes, upload.declared_mime.as_deref(), &config)?;
        let stored = blocking_store.put(kind, &processed)?;
        Ok::<_, CoreError>((processed, stored))
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Image task panicked: {e}")))??;

    let input = UpsertImageAsset {
        entity_id: id,
        stored_path: stored.relative_path.clone(),
        width: dimension(processed.width)?,
        height: dimension(processed.height)?,
        content_hash: processed.content_hash.clone(),
        byte_size: processed.byte_size(),
        mime_type: processed.mime_type.to_string(),
    };

    let (current, previous) = match ImageAssetRepo::replace(pool, &input).await {
        Ok(pair) => pair,
        Err(e) => {
            if stored.created {
                discard(store, &stored.relative_path);
            }
            return Err(CoreError::IngestFailed(format!("record image for entity {id}: {e}")).into());
        }
    };

    if let Some(previous) = previous {
        release_previous(pool, store, &previous, &current).await;
    }

    tracing::info!(
        entity_id = id,
        kind = kind.as_str(),
        received_bytes = received,
        stored_bytes = current.byte_size,
        width = current.width,
        height = current.height,
        path = %current.stored_path,
        reused = !stored.created,
        "Image attached"
    );
    Ok(current)
}

/// Remove the file the entity pointed at before, unless it is the same
/// file or another entity still uses it. Failures only leave an orphan.
async fn release_previous(
    pool: &PgPool,
    store: &LocalAssetStore,
    previous: &ImageAsset,
    current: &ImageAsset,
) {
    if previous.stored_path == current.stored_path {
        return;
    }
    match ImageAssetRepo::is_path_shared(pool, &previous.stored_path, current.entity_id).await {
        Ok(false) => discard(store, &previous.stored_path),
        Ok(true) => {}
        Err(e) => tracing::warn!(
            path = %previous.stored_path,
            error = %e,
            "Could not check whether the replaced image is shared; leaving it on disk"
        ),
    }
}

fn discard(store: &LocalAssetStore, relative: &str) {
    if let Err(e) = store.remove(relative) {
        tracing::warn!(path = relative, error = %e, "Failed to remove image file");
    }
}

fn dimension(value: u32) -> Result<i32, CoreError> {
    i32::try_from(value).map_err(|_| CoreError::IngestFailed(format!("dimension {value} out of range")))
}
