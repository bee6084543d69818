//! Route definitions for the authoring surface (admin role required).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{content, dashboard, images, messages};
use crate::state::AppState;

/// Routes mounted at `/admin`. `{kind}` is `posts` or `portfolio`.
///
/// ```text
/// GET    /dashboard                 -> dashboard::stats
/// GET    /messages                  -> messages::list
/// POST   /messages/{id}/read        -> messages::mark_read
/// GET    /{kind}                    -> content::list
/// POST   /{kind}                    -> content::create
/// GET    /{kind}/{id}               -> content::get
/// PUT    /{kind}/{id}               -> content::update
/// DELETE /{kind}/{id}               -> content::delete
/// POST   /{kind}/{id}/transition    -> content::transition
/// GET    /{kind}/{id}/image         -> images::get
/// POST   /{kind}/{id}/image         -> images::upload
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::stats))
        .route("/messages", get(messages::list))
        .route("/messages/{id}/read", post(messages::mark_read))
        .route("/{kind}", get(content::list).post(content::create))
        .route(
            "/{kind}/{id}",
            get(content::get)
                .put(content::update)
                .delete(content::delete),
        )
        .route("/{kind}/{id}/transition", post(content::transition))
        .route("/{kind}/{id}/image", get(images::get).post(images::upload))
}
