//! Repository for the `image_assets` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::image_asset::{ImageAsset, UpsertImageAsset};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, entity_id, stored_path, width, height, content_hash, byte_size, \
                       mime_type, created_at, updated_at";

/// Provides access to each entity's current image.
pub struct ImageAssetRepo;

impl ImageAssetRepo {
    /// The current image of an entity, if any.
    pub async fn find_by_entity(
        pool: &PgPool,
        entity_id: DbId,
    ) -> Result<Option<ImageAsset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM image_assets WHERE entity_id = $1");
        sqlx::query_as::<_, ImageAsset>(&query)
            .bind(entity_id)
            .fetch_optional(pool)
            .await
    }

    /// Point an entity at a new image, returning the new row and the row it
    /// replaced (if any).
    ///
    /// The previous row is read under `FOR UPDATE` in the same transaction so
    /// concurrent replacements each see the asset they actually displaced.
    pub async fn replace(
        pool: &PgPool,
        input: &UpsertImageAsset,
    ) -> Result<(ImageAsset, Option<ImageAsset>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select = format!("SELECT {COLUMNS} FROM image_assets WHERE entity_id = $1 FOR UPDATE");
        let previous = sqlx::query_as::<_, ImageAsset>(&select)
            .bind(input.entity_id)
            .fetch_optional(&mut *tx)
            .await?;

        let upsert = format!(
            "INSERT INTO image_assets
                (entity_id, stored_path, width, height, content_hash, byte_size, mime_type)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT ON CONSTRAINT uq_image_assets_entity_id DO UPDATE SET
                stored_path = EXCLUDED.stored_path,
                width = EXCLUDED.width,
                height = EXCLUDED.height,
                content_hash = EXCLUDED.content_hash,
                byte_size = EXCLUDED.byte_size,
                mime_type = EXCLUDED.mime_type,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        let current = sqlx::query_as::<_, ImageAsset>(&upsert)
            .bind(input.entity_id)
            .bind(&input.stored_path)
            .bind(input.width)
            .bind(input.height)
            .bind(&input.content_hash)
            .bind(input.byte_size)
            .bind(&input.mime_type)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((current, previous))
    }

    /// Whether any entity other than `entity_id` still points at `stored_path`.
    ///
    /// Identical uploads share one file, so a replaced file is only removed
    /// when nothing else references it.
    pub async fn is_path_shared(
        pool: &PgPool,
        stored_path: &str,
        entity_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (shared,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM image_assets WHERE stored_path = $1 AND entity_id <> $2)",
        )
        .bind(stored_path)
        .bind(entity_id)
        .fetch_one(pool)
        .await?;
        Ok(shared)
    }

    /// Current images of the given entities, for decorating listings.
    pub async fn list_for_entities(
        pool: &PgPool,
        entity_ids: &[DbId],
    ) -> Result<Vec<ImageAsset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM image_assets WHERE entity_id = ANY($1)");
        sqlx::query_as::<_, ImageAsset>(&query)
            .bind(entity_ids)
            .fetch_all(pool)
            .await
    }
}
