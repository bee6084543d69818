//! Save, transition and delete rules for posts and portfolio items.

use chrono::Utc;
use folio_core::content::{
    derive_excerpt, derive_meta_description, normalize_tags, supplied_or_derived, validate_tags,
    ContentKind,
};
use folio_core::error::{CoreError, FieldErrors};
use folio_core::pagination::{Page, PageRequest};
use folio_core::slug::{candidate_prefix, first_free, slugify};
use folio_core::types::{DbId, Timestamp};
use folio_core::workflow::{self, ContentStatus};
use folio_db::models::content::{
    ContentEntity, ContentFields, ContentFilter, ContentOrder, CreateContent, UpdateContent,
};
use folio_db::repositories::ContentRepo;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{unique_violation, AppError, AppResult};

/// Attempts at writing a derived slug before a concurrent-save race is
/// reported as a conflict.
const SLUG_ATTEMPTS: u32 = 3;

const SLUG_CONSTRAINT: &str = "uq_content_entities_kind_slug";

/// Upper bound on the technologies list of a portfolio item.
const MAX_TECHNOLOGIES: usize = 30;

// ---------------------------------------------------------------------------
// Slug assignment
// ---------------------------------------------------------------------------

/// How the slug of a save is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SlugPlan {
    /// Use exactly this slug; a collision is a conflict.
    Fixed(String),
    /// Derive from this base, trying `base-2`, `base-3`, ... for a free one.
    Derived(String),
}

impl SlugPlan {
    async fn resolve(
        &self,
        pool: &PgPool,
        kind: ContentKind,
        exclude_id: Option<DbId>,
    ) -> Result<String, sqlx::Error> {
        match self {
            SlugPlan::Fixed(slug) => Ok(slug.clone()),
            SlugPlan::Derived(base) => {
                let prefix = candidate_prefix(base);
                let taken = ContentRepo::slugs_with_prefix(pool, kind, prefix, exclude_id).await?;
                Ok(first_free(base, &taken))
            }
        }
    }

    /// Called when the write lost on the slug constraint. `Ok` means retry.
    fn on_collision(&self, slug: &str, attempt: u32) -> AppResult<()> {
        match self {
            SlugPlan::Fixed(_) => Err(CoreError::Conflict(format!(
                "slug '{slug}' is already in use"
            ))
            .into()),
            SlugPlan::Derived(_) if attempt >= SLUG_ATTEMPTS => Err(slug_attempts_exhausted()),
            SlugPlan::Derived(_) => {
                tracing::warn!(slug, attempt, "Slug taken by a concurrent save, re-deriving");
                Ok(())
            }
        }
    }
}

/// Slug rules on update: frozen once published; otherwise an explicit slug
/// wins, and a changed title re-derives.
fn slug_plan_for_update(
    current: &ContentEntity,
    requested: Option<&str>,
    title: &str,
) -> Result<SlugPlan, CoreError> {
    if current.slug_is_frozen() {
        return match requested {
            Some(slug) if slug != current.slug => Err(CoreError::invalid_field(
                "slug",
                "cannot change after the entity has been published",
            )),
            _ => Ok(SlugPlan::Fixed(current.slug.clone())),
        };
    }
    Ok(match requested {
        Some(slug) => SlugPlan::Fixed(slug.to_string()),
        None if title == current.title => SlugPlan::Fixed(current.slug.clone()),
        None => SlugPlan::Derived(slugify(title)),
    })
}

fn slug_attempts_exhausted() -> AppError {
    CoreError::Conflict(format!(
        "could not assign a unique slug after {SLUG_ATTEMPTS} attempts"
    ))
    .into()
}

fn is_slug_collision(err: &sqlx::Error) -> bool {
    unique_violation(err) == Some(SLUG_CONSTRAINT)
}

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

/// Trim entries, drop empties and duplicates, keep first-seen order.
fn clean_list<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in raw {
        let item = item.as_ref().trim();
        if !item.is_empty() && !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Run the DTO's validator schema plus the list checks it cannot express.
fn check(input: &impl Validate, tags: &[String], technologies: &[String]) -> Result<(), CoreError> {
    let mut errors = match input.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => e.into(),
    };
    if let Err(msg) = validate_tags(tags) {
        errors.add("tags", msg);
    }
    if technologies.len() > MAX_TECHNOLOGIES {
        errors.add(
            "technologies",
            format!("at most {MAX_TECHNOLOGIES} technologies are allowed"),
        );
    }
    errors.into_result()
}

/// A derived field on update: a supplied value wins; otherwise a value
/// that was derived from the old body follows the new body, and a
/// hand-written one is kept.
fn carry_derived(
    supplied: Option<&str>,
    current: &str,
    old_body: &str,
    new_body: &str,
    derive: fn(&str) -> String,
) -> String {
    match supplied {
        Some(value) => supplied_or_derived(Some(value), || derive(new_body)),
        None if old_body != new_body && current == derive(old_body) => derive(new_body),
        None => current.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Load an entity for the admin surface (any status).
pub async fn find(pool: &PgPool, kind: ContentKind, id: DbId) -> AppResult<ContentEntity> {
    ContentRepo::find_by_id(pool, kind, id)
        .await?
        .ok_or_else(|| CoreError::not_found(kind.entity_name(), id).into())
}

/// One page of entities plus the total count.
pub async fn list(
    pool: &PgPool,
    kind: ContentKind,
    mut filter: ContentFilter,
    order: ContentOrder,
    page: PageRequest,
) -> AppResult<Page<ContentEntity>> {
    filter.tag = filter
        .tag
        .and_then(|tag| normalize_tags([tag]).into_iter().next());

    let items = ContentRepo::list(pool, kind, &filter, order, page.limit(), page.offset()).await?;
    let total = ContentRepo::count(pool, kind, &filter).await?;
    Ok(Page::new(items, page, total))
}

/// Public read of a published entity. Counts the view.
pub async fn published_by_slug(
    pool: &PgPool,
    kind: ContentKind,
    slug: &str,
) -> AppResult<ContentEntity> {
    let mut entity = ContentRepo::find_by_slug(pool, kind, slug, Some(ContentStatus::Published))
        .await?
        .ok_or_else(|| CoreError::not_found(kind.entity_name(), slug))?;

    ContentRepo::increment_views(pool, entity.id).await?;
    entity.view_count += 1;
    Ok(entity)
}

/// Distinguish a stale optimistic token from a vanished row after a
/// guarded write matched nothing.
async fn stale_or_missing(pool: &PgPool, kind: ContentKind, id: DbId) -> AppError {
    match ContentRepo::find_by_id(pool, kind, id).await {
        Ok(Some(_)) => stale(kind, id),
        Ok(None) => CoreError::not_found(kind.entity_name(), id).into(),
        Err(e) => e.into(),
    }
}

fn stale(kind: ContentKind, id: DbId) -> AppError {
    CoreError::Conflict(format!(
        "{} {id} was modified by someone else; reload and retry",
        kind.entity_name()
    ))
    .into()
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Create a draft. The slug is derived from the title unless given, and
/// the excerpt and meta description from the body unless given.
pub async fn create(
    pool: &PgPool,
    kind: ContentKind,
    input: CreateContent,
) -> AppResult<ContentEntity> {
    let tags = normalize_tags(input.tags.iter().flatten());
    let technologies = clean_list(input.technologies.iter().flatten());
    check(&input, &tags, &technologies)?;

    let plan = match &input.slug {
        Some(slug) => SlugPlan::Fixed(slug.clone()),
        None => SlugPlan::Derived(slugify(&input.title)),
    };

    let excerpt = supplied_or_derived(input.excerpt.as_deref(), || derive_excerpt(&input.body));
    let meta_description = supplied_or_derived(input.meta_description.as_deref(), || {
        derive_meta_description(&input.body)
    });
    let mut fields = ContentFields {
        title: input.title.trim().to_string(),
        body: input.body,
        slug: String::new(),
        tags,
        excerpt,
        meta_description,
        meta_keywords: non_blank(input.meta_keywords),
        project_url: non_blank(input.project_url),
        repo_url: non_blank(input.repo_url),
        technologies,
        is_featured: input.is_featured.unwrap_or(false),
        sort_order: input.sort_order.unwrap_or(0),
    };

    for attempt in 1..=SLUG_ATTEMPTS {
        fields.slug = plan.resolve(pool, kind, None).await?;
        match ContentRepo::create(pool, kind, &fields).await {
            Ok(entity) => {
                tracing::info!(
                    entity_id = entity.id,
                    kind = kind.as_str(),
                    slug = %entity.slug,
                    "Content created"
                );
                return Ok(entity);
            }
            Err(err) if is_slug_collision(&err) => plan.on_collision(&fields.slug, attempt)?,
            Err(err) => return Err(err.into()),
        }
    }
    Err(slug_attempts_exhausted())
}

/// Apply a partial update guarded by `input.expected_updated_at`.
pub async fn update(
    pool: &PgPool,
    kind: ContentKind,
    id: DbId,
    input: UpdateContent,
) -> AppResult<ContentEntity> {
    let tags = input.tags.as_deref().map(normalize_tags);
    let technologies = input.technologies.as_deref().map(clean_list);
    check(
        &input,
        tags.as_deref().unwrap_or_default(),
        technologies.as_deref().unwrap_or_default(),
    )?;

    let current = find(pool, kind, id).await?;
    let expected = input.expected_updated_at;
    if current.updated_at != expected {
        return Err(stale(kind, id));
    }

    let title = input
        .title
        .as_deref()
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| current.title.clone());
    let body = input.body.clone().unwrap_or_else(|| current.body.clone());
    let plan = slug_plan_for_update(&current, input.slug.as_deref(), &title)?;

    let mut fields = ContentFields {
        excerpt: carry_derived(
            input.excerpt.as_deref(),
            &current.excerpt,
            &current.body,
            &body,
            derive_excerpt,
        ),
        meta_description: carry_derived(
            input.meta_description.as_deref(),
            &current.meta_description,
            &current.body,
            &body,
            derive_meta_description,
        ),
        title,
        body,
        slug: current.slug.clone(),
        tags: tags.unwrap_or_else(|| current.tags.clone()),
        meta_keywords: match input.meta_keywords {
            Some(keywords) => non_blank(Some(keywords)),
            None => current.meta_keywords.clone(),
        },
        project_url: match input.project_url {
            Some(url) => non_blank(Some(url)),
            None => current.project_url.clone(),
        },
        repo_url: match input.repo_url {
            Some(url) => non_blank(Some(url)),
            None => current.repo_url.clone(),
        },
        technologies: technologies.unwrap_or_else(|| current.technologies.clone()),
        is_featured: input.is_featured.unwrap_or(current.is_featured),
        sort_order: input.sort_order.unwrap_or(current.sort_order),
    };

    for attempt in 1..=SLUG_ATTEMPTS {
        fields.slug = plan.resolve(pool, kind, Some(id)).await?;
        match ContentRepo::update(pool, kind, id, expected, &fields).await {
            Ok(Some(entity)) => {
                tracing::info!(entity_id = id, kind = kind.as_str(), slug = %entity.slug, "Content updated");
                return Ok(entity);
            }
            Ok(None) => return Err(stale_or_missing(pool, kind, id).await),
            Err(err) if is_slug_collision(&err) => plan.on_collision(&fields.slug, attempt)?,
            Err(err) => return Err(err.into()),
        }
    }
    Err(slug_attempts_exhausted())
}

/// Move an entity to `target` in the publish workflow.
pub async fn transition(
    pool: &PgPool,
    kind: ContentKind,
    id: DbId,
    target: ContentStatus,
    expected_updated_at: Timestamp,
) -> AppResult<ContentEntity> {
    let current = find(pool, kind, id).await?;
    if current.updated_at != expected_updated_at {
        return Err(stale(kind, id));
    }

    let next = workflow::transition(current.publish_state(), target, Utc::now())?;
    let updated = ContentRepo::set_status(
        pool,
        kind,
        id,
        expected_updated_at,
        next.status,
        next.published_at,
    )
    .await?;

    match updated {
        Some(entity) => {
            tracing::info!(
                entity_id = id,
                kind = kind.as_str(),
                from = %current.status,
                to = %entity.status,
                "Content transitioned"
            );
            Ok(entity)
        }
        None => Err(stale_or_missing(pool, kind, id).await),
    }
}

/// Soft-delete an entity that was never published or is archived.
pub async fn delete(pool: &PgPool, kind: ContentKind, id: DbId) -> AppResult<()> {
    let current = find(pool, kind, id).await?;
    workflow::ensure_deletable(&current.publish_state())?;

    if !ContentRepo::soft_delete(pool, kind, id).await? {
        // Published or deleted since it was read.
        return Err(stale_or_missing(pool, kind, id).await);
    }
    tracing::info!(entity_id = id, kind = kind.as_str(), slug = %current.slug, "Content deleted");
    Ok(())
}
