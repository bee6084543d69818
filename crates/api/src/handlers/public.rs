//! Public read handlers for published posts and portfolio items.

use axum::extract::{Path, Query, State};
use axum::Json;
use folio_core::content::ContentKind;
use folio_core::pagination::Page;
use folio_db::models::content::{ContentFilter, ContentOrder};
use folio_db::repositories::{ContentRepo, ImageAssetRepo};

use crate::error::AppResult;
use crate::publishing::content;
use crate::publishing::views::{images_by_entity, ContentDetail, ContentSummary};
use crate::query::PublicContentParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Number of related entries shown under a detail page.
const RELATED_LIMIT: i64 = 3;

/// GET /api/v1/posts
///
/// Published posts, newest first. `?tag=` narrows to one tag.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PublicContentParams>,
) -> AppResult<Json<DataResponse<Page<ContentSummary>>>> {
    list_published(&state, ContentKind::Post, ContentOrder::Chronological, params).await
}

/// GET /api/v1/posts/{slug}
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<ContentDetail>>> {
    get_published(&state, ContentKind::Post, &slug).await
}

/// GET /api/v1/portfolio
///
/// Published portfolio items, featured first, then by sort order.
pub async fn list_portfolio(
    State(state): State<AppState>,
    Query(params): Query<PublicContentParams>,
) -> AppResult<Json<DataResponse<Page<ContentSummary>>>> {
    list_published(&state, ContentKind::PortfolioItem, ContentOrder::Showcase, params).await
}

/// GET /api/v1/portfolio/{slug}
pub async fn get_portfolio_item(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<DataResponse<ContentDetail>>> {
    get_published(&state, ContentKind::PortfolioItem, &slug).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn list_published(
    state: &AppState,
    kind: ContentKind,
    order: ContentOrder,
    params: PublicContentParams,
) -> AppResult<Json<DataResponse<Page<ContentSummary>>>> {
    let page = params.page_request(state.config.page_size);
    let filter = ContentFilter {
        tag: params.tag,
        ..ContentFilter::published()
    };

    let page = content::list(&state.pool, kind, filter, order, page).await?;
    let images = images_by_entity(&state.pool, &page.items).await?;
    let page = page.map(|entity| ContentSummary::new(&entity, images.get(&entity.id)));

    Ok(Json(DataResponse::new(page)))
}

async fn get_published(
    state: &AppState,
    kind: ContentKind,
    slug: &str,
) -> AppResult<Json<DataResponse<ContentDetail>>> {
    let entity = content::published_by_slug(&state.pool, kind, slug).await?;
    let image = ImageAssetRepo::find_by_entity(&state.pool, entity.id).await?;

    let related =
        ContentRepo::list_related(&state.pool, kind, entity.id, &entity.tags, RELATED_LIMIT)
            .await?;
    let related_images = images_by_entity(&state.pool, &related).await?;
    let related = related
        .iter()
        .map(|r| ContentSummary::new(r, related_images.get(&r.id)))
        .collect();

    Ok(Json(DataResponse::new(ContentDetail::new(
        &entity,
        image.as_ref(),
        related,
    ))))
}
