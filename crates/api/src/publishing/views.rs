//! Response shapes for content, decorated with image metadata and
//! rendered HTML.

use std::collections::HashMap;

use folio_core::content::{reading_time_minutes, ContentKind};
use folio_core::markdown::render_html;
use folio_core::types::{DbId, Timestamp};
use folio_core::workflow::ContentStatus;
use folio_db::models::content::ContentEntity;
use folio_db::models::image_asset::ImageAsset;
use folio_db::repositories::ImageAssetRepo;
use serde::Serialize;
use sqlx::PgPool;

/// URL prefix the media root is served under.
pub const MEDIA_PREFIX: &str = "/media";

/// Public description of a stored image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageView {
    pub url: String,
    pub width: i32,
    pub height: i32,
    pub content_hash: String,
    pub byte_size: i64,
    pub mime_type: String,
}

impl From<&ImageAsset> for ImageView {
    fn from(asset: &ImageAsset) -> Self {
        Self {
            url: format!("{MEDIA_PREFIX}/{}", asset.stored_path),
            width: asset.width,
            height: asset.height,
            content_hash: asset.content_hash.clone(),
            byte_size: asset.byte_size,
            mime_type: asset.mime_type.clone(),
        }
    }
}

/// Current images of `entities`, keyed by entity ID.
pub async fn images_by_entity(
    pool: &PgPool,
    entities: &[ContentEntity],
) -> Result<HashMap<DbId, ImageAsset>, sqlx::Error> {
    if entities.is_empty() {
        return Ok(HashMap::new());
    }
    let ids: Vec<DbId> = entities.iter().map(|e| e.id).collect();
    let assets = ImageAssetRepo::list_for_entities(pool, &ids).await?;
    Ok(assets.into_iter().map(|a| (a.entity_id, a)).collect())
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// Full entity row plus its image, for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct AdminContent {
    #[serde(flatten)]
    pub entity: ContentEntity,
    pub image: Option<ImageView>,
}

impl AdminContent {
    pub fn new(entity: ContentEntity, image: Option<&ImageAsset>) -> Self {
        Self {
            entity,
            image: image.map(ImageView::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Public
// ---------------------------------------------------------------------------

/// Listing card for a published entity. Carries no body.
#[derive(Debug, Clone, Serialize)]
pub struct ContentSummary {
    pub kind: ContentKind,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub reading_time_minutes: u32,
    pub published_at: Option<Timestamp>,
    pub image: Option<ImageView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,
    pub is_featured: bool,
}

impl ContentSummary {
    pub fn new(entity: &ContentEntity, image: Option<&ImageAsset>) -> Self {
        Self {
            kind: entity.kind,
            title: entity.title.clone(),
            slug: entity.slug.clone(),
            excerpt: entity.excerpt.clone(),
            tags: entity.tags.clone(),
            reading_time_minutes: reading_time_minutes(&entity.body),
            published_at: entity.published_at,
            image: image.map(ImageView::from),
            project_url: entity.project_url.clone(),
            repo_url: entity.repo_url.clone(),
            technologies: entity.technologies.clone(),
            is_featured: entity.is_featured,
        }
    }
}

/// Detail page of a published entity.
#[derive(Debug, Clone, Serialize)]
pub struct ContentDetail {
    #[serde(flatten)]
    pub summary: ContentSummary,
    /// Markdown source.
    pub body: String,
    /// Sanitized HTML rendering of `body`.
    pub html: String,
    pub meta_description: String,
    pub meta_keywords: Option<String>,
    pub view_count: i64,
    pub updated_at: Timestamp,
    pub related: Vec<ContentSummary>,
}

impl ContentDetail {
    pub fn new(
        entity: &ContentEntity,
        image: Option<&ImageAsset>,
        related: Vec<ContentSummary>,
    ) -> Self {
        debug_assert_eq!(entity.status, ContentStatus::Published);
        Self {
            summary: ContentSummary::new(entity, image),
            body: entity.body.clone(),
            html: render_html(&entity.body),
            meta_description: entity.meta_description.clone(),
            meta_keywords: entity.meta_keywords.clone(),
            view_count: entity.view_count,
            updated_at: entity.updated_at,
            related,
        }
    }
}
