//! Content entity model (posts and portfolio items) and DTOs.

use folio_core::content::ContentKind;
use folio_core::slug::is_valid_slug;
use folio_core::types::{DbId, Timestamp};
use folio_core::workflow::{ContentStatus, PublishState};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidateUrl, ValidationError};

/// A row from the `content_entities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentEntity {
    pub id: DbId,
    #[sqlx(try_from = "String")]
    pub kind: ContentKind,
    pub title: String,
    pub body: String,
    pub slug: String,
    #[sqlx(rename = "status_id", try_from = "i16")]
    pub status: ContentStatus,
    pub tags: Vec<String>,
    pub excerpt: String,
    pub meta_description: String,
    pub meta_keywords: Option<String>,
    pub view_count: i64,
    pub project_url: Option<String>,
    pub repo_url: Option<String>,
    pub technologies: Vec<String>,
    pub is_featured: bool,
    pub sort_order: i32,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ContentEntity {
    pub fn publish_state(&self) -> PublishState {
        PublishState {
            status: self.status,
            published_at: self.published_at,
        }
    }

    /// Slugs freeze once an entity has been published.
    pub fn slug_is_frozen(&self) -> bool {
        self.published_at.is_some()
    }
}

/// Slug and freshness of a published entity, for sitemaps.
#[derive(Debug, Clone, FromRow)]
pub struct ContentLink {
    #[sqlx(try_from = "String")]
    pub kind: ContentKind,
    pub slug: String,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// DTO for creating a post or portfolio item. Entities start as drafts.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateContent {
    #[validate(
        length(min = 1, max = 200, message = "must be 1-200 characters"),
        custom(function = "non_blank")
    )]
    pub title: String,
    #[validate(
        length(min = 1, max = 100_000, message = "must be 1-100000 characters"),
        custom(function = "non_blank")
    )]
    pub body: String,
    /// Explicit slug; derived from the title when absent.
    #[validate(custom(function = "canonical_slug"))]
    pub slug: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub excerpt: Option<String>,
    #[validate(length(max = 160, message = "must be at most 160 characters"))]
    pub meta_description: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub meta_keywords: Option<String>,
    pub tags: Option<Vec<String>>,
    #[validate(custom(function = "blank_or_url"), length(max = 500))]
    pub project_url: Option<String>,
    #[validate(custom(function = "blank_or_url"), length(max = 500))]
    pub repo_url: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

/// DTO for updating an entity. Absent fields keep their current value.
///
/// `expected_updated_at` must echo the `updated_at` the client last read;
/// a mismatch means someone else saved in between.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateContent {
    pub expected_updated_at: Timestamp,
    #[validate(
        length(min = 1, max = 200, message = "must be 1-200 characters"),
        custom(function = "non_blank")
    )]
    pub title: Option<String>,
    #[validate(
        length(min = 1, max = 100_000, message = "must be 1-100000 characters"),
        custom(function = "non_blank")
    )]
    pub body: Option<String>,
    #[validate(custom(function = "canonical_slug"))]
    pub slug: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub excerpt: Option<String>,
    #[validate(length(max = 160, message = "must be at most 160 characters"))]
    pub meta_description: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub meta_keywords: Option<String>,
    pub tags: Option<Vec<String>>,
    #[validate(custom(function = "blank_or_url"), length(max = 500))]
    pub project_url: Option<String>,
    #[validate(custom(function = "blank_or_url"), length(max = 500))]
    pub repo_url: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Blank clears the link on update; anything else must be a URL.
fn blank_or_url(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.validate_url() {
        return Ok(());
    }
    let mut err = ValidationError::new("url");
    err.message = Some("must be a valid URL".into());
    Err(err)
}

fn canonical_slug(value: &str) -> Result<(), ValidationError> {
    if !is_valid_slug(value) {
        let mut err = ValidationError::new("slug");
        err.message =
            Some("must be lowercase letters, digits and single hyphens (max 180)".into());
        return Err(err);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Persistence inputs
// ---------------------------------------------------------------------------

/// Fully resolved column values written on insert and update.
///
/// Built by the publishing layer after slug and metadata derivation; the
/// repository writes it verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFields {
    pub title: String,
    pub body: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub excerpt: String,
    pub meta_description: String,
    pub meta_keywords: Option<String>,
    pub project_url: Option<String>,
    pub repo_url: Option<String>,
    pub technologies: Vec<String>,
    pub is_featured: bool,
    pub sort_order: i32,
}

/// Listing filter. `None` fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub status: Option<ContentStatus>,
    pub tag: Option<String>,
}

impl ContentFilter {
    pub fn published() -> Self {
        Self {
            status: Some(ContentStatus::Published),
            tag: None,
        }
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentOrder {
    /// `COALESCE(published_at, created_at) DESC, id DESC`.
    #[default]
    Chronological,
    /// Featured first, then `sort_order`, then `id`.
    Showcase,
}

impl ContentOrder {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            ContentOrder::Chronological => "COALESCE(published_at, created_at) DESC, id DESC",
            ContentOrder::Showcase => "is_featured DESC, sort_order ASC, id ASC",
        }
    }
}
