//! Route definitions for the public site API.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{contact, github, public};
use crate::state::AppState;

/// Public routes mounted at the `/api/v1` root.
///
/// ```text
/// GET  /posts              -> list_posts
/// GET  /posts/{slug}       -> get_post
/// GET  /portfolio          -> list_portfolio
/// GET  /portfolio/{slug}   -> get_portfolio_item
/// GET  /github/stats       -> github::stats
/// GET  /github/activity    -> github::activity
/// POST /contact            -> contact::submit
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(public::list_posts))
        .route("/posts/{slug}", get(public::get_post))
        .route("/portfolio", get(public::list_portfolio))
        .route("/portfolio/{slug}", get(public::get_portfolio_item))
        .route("/github/stats", get(github::stats))
        .route("/github/activity", get(github::activity))
        .route("/contact", post(contact::submit))
}
