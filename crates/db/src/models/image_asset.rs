//! Image asset model: the current processed image of a content entity.

use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `image_assets` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ImageAsset {
    pub id: DbId,
    pub entity_id: DbId,
    /// Path relative to the media root, e.g. `posts/<sha256>.jpg`.
    pub stored_path: String,
    pub width: i32,
    pub height: i32,
    pub content_hash: String,
    pub byte_size: i64,
    pub mime_type: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Values written when an entity's image is set or replaced.
#[derive(Debug, Clone)]
pub struct UpsertImageAsset {
    pub entity_id: DbId,
    pub stored_path: String,
    pub width: i32,
    pub height: i32,
    pub content_hash: String,
    pub byte_size: i64,
    pub mime_type: String,
}
