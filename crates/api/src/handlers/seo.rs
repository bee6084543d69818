//! Handlers for robots.txt, sitemap.xml, the RSS feed and the web app
//! manifest (served at the root).

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use folio_core::content::ContentKind;
use folio_core::seo::{
    robots_txt, rss_feed, sitemap_xml, static_pages, web_manifest, FeedItem, SitemapEntry,
    WebManifest, FEED_ITEM_LIMIT,
};
use folio_db::models::content::{ContentFilter, ContentOrder};
use folio_db::repositories::ContentRepo;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /robots.txt
pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_txt(&state.config.site),
    )
}

/// GET /manifest.json
pub async fn manifest(State(state): State<AppState>) -> Json<WebManifest> {
    Json(web_manifest(&state.config.site))
}

/// GET /sitemap.xml
///
/// Static pages plus every published post and portfolio item.
pub async fn sitemap(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let mut entries = static_pages(Utc::now());
    entries.extend(
        ContentRepo::list_published_links(&state.pool)
            .await?
            .into_iter()
            .map(|link| SitemapEntry::for_entity(link.kind, &link.slug, link.updated_at)),
    );

    Ok((
        [(CONTENT_TYPE, "application/xml; charset=utf-8")],
        sitemap_xml(&state.config.site, &entries),
    ))
}

/// GET /feed.xml
///
/// RSS 2.0 feed of the latest published posts.
pub async fn feed(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let posts = ContentRepo::list(
        &state.pool,
        ContentKind::Post,
        &ContentFilter::published(),
        ContentOrder::Chronological,
        FEED_ITEM_LIMIT,
        0,
    )
    .await?;

    let items: Vec<FeedItem> = posts
        .into_iter()
        .filter_map(|post| {
            Some(FeedItem {
                published_at: post.published_at?,
                title: post.title,
                slug: post.slug,
                description: post.excerpt,
                categories: post.tags,
            })
        })
        .collect();

    Ok((
        [(CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
        rss_feed(&state.config.site, &items, Utc::now()),
    ))
}
