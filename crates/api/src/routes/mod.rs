pub mod admin;
pub mod auth;
pub mod health;
pub mod public;
pub mod seo;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                 login (public)
/// /auth/me                                    current account (requires auth)
///
/// /admin/dashboard                            post, portfolio and inbox counts
/// /admin/messages                             list (?include_spam, unread, page, per_page)
/// /admin/messages/{id}/read                   mark read (POST)
/// /admin/{kind}                               list (?status, tag, page, per_page), create
/// /admin/{kind}/{id}                          get, update, delete
/// /admin/{kind}/{id}/transition               publish / unpublish / archive / restore (POST)
/// /admin/{kind}/{id}/image                    get, upload (multipart `file`)
///
/// /posts                                      published posts (?tag, page, per_page)
/// /posts/{slug}                               published post detail
/// /portfolio                                  published portfolio items
/// /portfolio/{slug}                           published portfolio item detail
/// /github/stats                               cached GitHub profile statistics
/// /contact                                    contact form submission (POST)
/// ```
///
/// `{kind}` is `posts` or `portfolio`; every `/admin` route requires the
/// admin role.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .merge(public::router())
}
