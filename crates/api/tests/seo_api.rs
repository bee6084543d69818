//! HTTP-level integration tests for the root-level documents (robots,
//! sitemap, feed, manifest, health) and the GitHub endpoints.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use chrono::{DateTime, TimeZone, Utc};
use common::{admin_token, body_json, body_text, create_entity, create_post, get, publish};
use folio_core::cache::SystemClock;
use folio_github::{
    CommitActivity, CommitSummary, GithubStats, StatsError, StatsService, StatsSource,
};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// robots / sitemap / feed
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn robots_points_at_the_sitemap(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.app(), "/robots.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = body_text(response).await;
    assert!(text.contains("Disallow: /api/v1/admin/"));
    assert!(text.contains("Sitemap: https://example.com/sitemap.xml"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn manifest_describes_the_site(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.app(), "/manifest.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let json = body_json(response).await;
    assert_eq!(json["short_name"], "Example Folio");
    assert_eq!(json["display"], "standalone");
    assert_eq!(json["icons"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sitemap_lists_only_published_entities(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = admin_token(&pool, &app).await;
    create_post(app.app(), &token, "Secret Draft", "body").await;
    let post = create_post(app.app(), &token, "Public Post", "body").await;
    publish(app.app(), &token, "posts", &post).await;
    let item = create_entity(
        app.app(),
        &token,
        "portfolio",
        json!({ "title": "Side Project", "body": "body" }),
    )
    .await;
    publish(app.app(), &token, "portfolio", &item).await;

    let response = get(app.app(), "/sitemap.xml").await;
    assert_eq!(response.status(), StatusCode::OK);
    let xml = body_text(response).await;

    assert!(xml.contains("<loc>https://example.com/</loc>"));
    assert!(xml.contains("<loc>https://example.com/blog/public-post</loc>"));
    assert!(xml.contains("<loc>https://example.com/portfolio/side-project</loc>"));
    assert!(!xml.contains("secret-draft"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn feed_carries_published_posts(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = admin_token(&pool, &app).await;
    create_post(app.app(), &token, "Unreleased", "body").await;
    let post = create_entity(
        app.app(),
        &token,
        "posts",
        json!({ "title": "Fish & Chips", "body": "A post about food.", "tags": ["food"] }),
    )
    .await;
    publish(app.app(), &token, "posts", &post).await;

    let response = get(app.app(), "/feed.xml").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/rss+xml"));

    let xml = body_text(response).await;
    assert!(xml.contains("<title>Example Folio</title>"));
    assert!(xml.contains("<title>Fish &amp; Chips</title>"));
    assert!(xml.contains("https://example.com/blog/fish-chips"));
    assert!(xml.contains("<category>food</category>"));
    assert!(!xml.contains("Unreleased"));
}

// ---------------------------------------------------------------------------
// Health and middleware
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn health_reports_database_and_services(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["email_enabled"], false);
    assert_eq!(json["github_enabled"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_route_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.app(), "/api/v1/nothing-here").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// GitHub statistics
// ---------------------------------------------------------------------------

/// Source that answers with fixed numbers and counts its calls.
struct CannedSource {
    calls: AtomicUsize,
}

#[async_trait]
impl StatsSource for CannedSource {
    async fn fetch(&self) -> Result<GithubStats, StatsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GithubStats {
            username: "octo".into(),
            name: Some("Octo Cat".into()),
            bio: None,
            avatar_url: None,
            html_url: Some("https://github.com/octo".into()),
            public_repos: 12,
            total_repos: 15,
            followers: 34,
            following: 5,
            commits: CommitSummary {
                count: 42,
                period: "May 2024".into(),
                repos_checked: 15,
            },
            fetched_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        })
    }

    async fn recent_activity(&self, _since: DateTime<Utc>) -> Result<Vec<CommitActivity>, StatsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![CommitActivity {
            repo: "folio".into(),
            message: "Add activity feed".into(),
            date: Utc.with_ymd_and_hms(2024, 4, 30, 9, 0, 0).unwrap(),
            url: "https://github.com/octo/folio/commit/abc".into(),
        }])
    }
}

/// Source that always fails.
struct DownSource;

#[async_trait]
impl StatsSource for DownSource {
    async fn fetch(&self) -> Result<GithubStats, StatsError> {
        Err(StatsError::HttpStatus(503))
    }

    async fn recent_activity(&self, _since: DateTime<Utc>) -> Result<Vec<CommitActivity>, StatsError> {
        Err(StatsError::HttpStatus(503))
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn github_stats_are_cached(pool: PgPool) {
    let source = Arc::new(CannedSource {
        calls: AtomicUsize::new(0),
    });
    let service = StatsService::new(
        source.clone(),
        Duration::from_secs(600),
        Arc::new(SystemClock),
    );
    let app = common::build_test_app_with(pool, |state| state.with_github(Arc::new(service)));

    let response = get(app.app(), "/api/v1/github/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "octo");
    assert_eq!(json["data"]["public_repos"], 12);
    assert_eq!(json["data"]["total_repos"], 15);
    assert_eq!(json["data"]["commits"]["count"], 42);
    assert_eq!(json["data"]["commits"]["period"], "May 2024");
    assert_eq!(json["data"]["stale"], false);

    let response = get(app.app(), "/api/v1/github/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    let health = body_json(get(app.app(), "/health").await).await;
    assert_eq!(health["github_enabled"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn github_unreachable_without_cache_is_502(pool: PgPool) {
    let service = StatsService::new(
        Arc::new(DownSource),
        Duration::from_secs(600),
        Arc::new(SystemClock),
    );
    let app = common::build_test_app_with(pool, |state| state.with_github(Arc::new(service)));

    let response = get(app.app(), "/api/v1/github/stats").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "UPSTREAM_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn github_activity_lists_recent_commits(pool: PgPool) {
    let source = Arc::new(CannedSource {
        calls: AtomicUsize::new(0),
    });
    let service = StatsService::new(
        source.clone(),
        Duration::from_secs(600),
        Arc::new(SystemClock),
    );
    let app = common::build_test_app_with(pool, |state| state.with_github(Arc::new(service)));

    let response = get(app.app(), "/api/v1/github/activity").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["stale"], false);
    assert_eq!(json["data"]["activity"][0]["repo"], "folio");
    assert_eq!(json["data"]["activity"][0]["message"], "Add activity feed");

    get(app.app(), "/api/v1/github/activity").await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn github_activity_unreachable_is_502(pool: PgPool) {
    let service = StatsService::new(
        Arc::new(DownSource),
        Duration::from_secs(600),
        Arc::new(SystemClock),
    );
    let app = common::build_test_app_with(pool, |state| state.with_github(Arc::new(service)));

    let response = get(app.app(), "/api/v1/github/activity").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn github_unconfigured_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.app(), "/api/v1/github/stats").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = get(app.app(), "/api/v1/github/activity").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
