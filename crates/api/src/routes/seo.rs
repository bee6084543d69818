//! Route definitions for crawler-facing artifacts.

use axum::routing::get;
use axum::Router;

use crate::handlers::seo;
use crate::state::AppState;

/// Mount SEO routes (root-level, NOT under `/api/v1`).
///
/// ```text
/// GET /robots.txt    -> robots
/// GET /sitemap.xml   -> sitemap
/// GET /feed.xml      -> feed
/// GET /manifest.json -> manifest
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/robots.txt", get(seo::robots))
        .route("/sitemap.xml", get(seo::sitemap))
        .route("/feed.xml", get(seo::feed))
        .route("/manifest.json", get(seo::manifest))
}
