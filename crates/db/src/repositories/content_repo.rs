//! Repository for the `content_entities` table.

use folio_core::content::ContentKind;
use folio_core::types::{DbId, Timestamp};
use folio_core::workflow::ContentStatus;
use sqlx::PgPool;

use crate::models::content::{ContentEntity, ContentFields, ContentFilter, ContentLink, ContentOrder};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, kind, title, body, slug, status_id, tags, excerpt, \
                       meta_description, meta_keywords, view_count, project_url, repo_url, \
                       technologies, is_featured, sort_order, published_at, created_at, updated_at";

/// Filter clause shared by `list` and `count`: `$1` kind, `$2` status, `$3` tag.
const FILTER: &str = "kind = $1 AND deleted_at IS NULL \
                      AND ($2::SMALLINT IS NULL OR status_id = $2) \
                      AND ($3::TEXT IS NULL OR $3 = ANY(tags))";

/// Next `updated_at` value. Strictly increases so every write invalidates
/// the previous optimistic token, even within one transaction.
const BUMP_UPDATED_AT: &str = "GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')";

/// Provides persistence for posts and portfolio items.
pub struct ContentRepo;

impl ContentRepo {
    /// Insert a new draft, returning the created row.
    pub async fn create(
        pool: &PgPool,
        kind: ContentKind,
        fields: &ContentFields,
    ) -> Result<ContentEntity, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_entities
                (kind, title, body, slug, tags, excerpt, meta_description, meta_keywords,
                 project_url, repo_url, technologies, is_featured, sort_order)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentEntity>(&query)
            .bind(kind.as_str())
            .bind(&fields.title)
            .bind(&fields.body)
            .bind(&fields.slug)
            .bind(&fields.tags)
            .bind(&fields.excerpt)
            .bind(&fields.meta_description)
            .bind(&fields.meta_keywords)
            .bind(&fields.project_url)
            .bind(&fields.repo_url)
            .bind(&fields.technologies)
            .bind(fields.is_featured)
            .bind(fields.sort_order)
            .fetch_one(pool)
            .await
    }

    /// Find an entity of `kind` by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        kind: ContentKind,
        id: DbId,
    ) -> Result<Option<ContentEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_entities
             WHERE id = $1 AND kind = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, ContentEntity>(&query)
            .bind(id)
            .bind(kind.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Find an entity by slug, optionally restricted to one status.
    /// Excludes soft-deleted rows.
    pub async fn find_by_slug(
        pool: &PgPool,
        kind: ContentKind,
        slug: &str,
        status: Option<ContentStatus>,
    ) -> Result<Option<ContentEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_entities
             WHERE kind = $1 AND slug = $2 AND deleted_at IS NULL
               AND ($3::SMALLINT IS NULL OR status_id = $3)"
        );
        sqlx::query_as::<_, ContentEntity>(&query)
            .bind(kind.as_str())
            .bind(slug)
            .bind(status.map(ContentStatus::id))
            .fetch_optional(pool)
            .await
    }

    /// Slugs of `kind` starting with `prefix`, including soft-deleted rows
    /// (their slugs stay reserved).
    ///
    /// `exclude_id` leaves out an entity's own row so an update can keep
    /// its current slug.
    pub async fn slugs_with_prefix(
        pool: &PgPool,
        kind: ContentKind,
        prefix: &str,
        exclude_id: Option<DbId>,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT slug FROM content_entities
             WHERE kind = $1
               AND slug LIKE $2
               AND ($3::BIGINT IS NULL OR id <> $3)",
        )
        .bind(kind.as_str())
        .bind(format!("{}%", like_escape(prefix)))
        .bind(exclude_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(slug,)| slug).collect())
    }

    /// One page of entities matching `filter`.
    pub async fn list(
        pool: &PgPool,
        kind: ContentKind,
        filter: &ContentFilter,
        order: ContentOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContentEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_entities
             WHERE {FILTER}
             ORDER BY {}
             LIMIT $4 OFFSET $5",
            order.sql()
        );
        sqlx::query_as::<_, ContentEntity>(&query)
            .bind(kind.as_str())
            .bind(filter.status.map(ContentStatus::id))
            .bind(&filter.tag)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Number of entities matching `filter`.
    pub async fn count(
        pool: &PgPool,
        kind: ContentKind,
        filter: &ContentFilter,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM content_entities WHERE {FILTER}");
        let (count,): (i64,) = sqlx::query_as(&query)
            .bind(kind.as_str())
            .bind(filter.status.map(ContentStatus::id))
            .bind(&filter.tag)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Overwrite the editable columns if `updated_at` still equals
    /// `expected_updated_at`.
    ///
    /// Returns `None` when the row is missing, deleted or stale.
    pub async fn update(
        pool: &PgPool,
        kind: ContentKind,
        id: DbId,
        expected_updated_at: Timestamp,
        fields: &ContentFields,
    ) -> Result<Option<ContentEntity>, sqlx::Error> {
        let query = format!(
            "UPDATE content_entities SET
                title = $4,
                body = $5,
                slug = $6,
                tags = $7,
                excerpt = $8,
                meta_description = $9,
                meta_keywords = $10,
                project_url = $11,
                repo_url = $12,
                technologies = $13,
                is_featured = $14,
                sort_order = $15,
                updated_at = {BUMP_UPDATED_AT}
             WHERE id = $1 AND kind = $2 AND updated_at = $3 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentEntity>(&query)
            .bind(id)
            .bind(kind.as_str())
            .bind(expected_updated_at)
            .bind(&fields.title)
            .bind(&fields.body)
            .bind(&fields.slug)
            .bind(&fields.tags)
            .bind(&fields.excerpt)
            .bind(&fields.meta_description)
            .bind(&fields.meta_keywords)
            .bind(&fields.project_url)
            .bind(&fields.repo_url)
            .bind(&fields.technologies)
            .bind(fields.is_featured)
            .bind(fields.sort_order)
            .fetch_optional(pool)
            .await
    }

    /// Write a workflow transition if `updated_at` still equals
    /// `expected_updated_at`.
    ///
    /// Returns `None` when the row is missing, deleted or stale.
    pub async fn set_status(
        pool: &PgPool,
        kind: ContentKind,
        id: DbId,
        expected_updated_at: Timestamp,
        status: ContentStatus,
        published_at: Option<Timestamp>,
    ) -> Result<Option<ContentEntity>, sqlx::Error> {
        let query = format!(
            "UPDATE content_entities SET
                status_id = $4,
                published_at = $5,
                updated_at = {BUMP_UPDATED_AT}
             WHERE id = $1 AND kind = $2 AND updated_at = $3 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentEntity>(&query)
            .bind(id)
            .bind(kind.as_str())
            .bind(expected_updated_at)
            .bind(status.id())
            .bind(published_at)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete an entity. Returns `true` if a row was marked deleted.
    ///
    /// Entities that have been published are only deleted once archived.
    pub async fn soft_delete(pool: &PgPool, kind: ContentKind, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE content_entities SET deleted_at = NOW()
             WHERE id = $1 AND kind = $2 AND deleted_at IS NULL
               AND (published_at IS NULL OR status_id = $3)",
        )
        .bind(id)
        .bind(kind.as_str())
        .bind(ContentStatus::Archived.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count a public read. Leaves `updated_at` untouched so it does not
    /// invalidate an editor's optimistic token.
    pub async fn increment_views(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE content_entities SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Published entities of `kind` sharing at least one tag with `tags`,
    /// most shared tags first.
    pub async fn list_related(
        pool: &PgPool,
        kind: ContentKind,
        exclude_id: DbId,
        tags: &[String],
        limit: i64,
    ) -> Result<Vec<ContentEntity>, sqlx::Error> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM content_entities
             WHERE kind = $1 AND id <> $2 AND status_id = $3 AND deleted_at IS NULL
               AND tags && $4
             ORDER BY cardinality(ARRAY(SELECT unnest(tags) INTERSECT SELECT unnest($4::TEXT[]))) DESC,
                      COALESCE(published_at, created_at) DESC, id DESC
             LIMIT $5"
        );
        sqlx::query_as::<_, ContentEntity>(&query)
            .bind(kind.as_str())
            .bind(exclude_id)
            .bind(ContentStatus::Published.id())
            .bind(tags)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Every published entity's slug and `updated_at`, for the sitemap.
    pub async fn list_published_links(pool: &PgPool) -> Result<Vec<ContentLink>, sqlx::Error> {
        sqlx::query_as::<_, ContentLink>(
            "SELECT kind, slug, updated_at FROM content_entities
             WHERE status_id = $1 AND deleted_at IS NULL
             ORDER BY kind, COALESCE(published_at, created_at) DESC, id DESC",
        )
        .bind(ContentStatus::Published.id())
        .fetch_all(pool)
        .await
    }
}

/// Escape `LIKE` metacharacters.
fn like_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
