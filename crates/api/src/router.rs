//! Shared application router builder.
//!
//! Provides [`build_app_router`] so both the production binary (`main.rs`)
//! and integration tests (`tests/common/mod.rs`) use the exact same middleware
//! stack.

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::{ConfigError, ServerConfig};
use crate::publishing::views::MEDIA_PREFIX;
use crate::routes;
use crate::state::AppState;

/// Build the full application [`Router`] with all middleware layers.
///
/// The middleware stack is applied bottom-up:
///
/// 1. CORS
/// 2. Set request ID on incoming requests
/// 3. Structured request/response tracing
/// 4. Propagate request ID to response
/// 5. Request timeout
/// 6. Panic recovery (catch panics, return 500)
/// 7. Response compression
/// 8. Request body limit (upload limit plus multipart overhead)
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Result<Router, ConfigError> {
    let cors = build_cors_layer(config)?;
    let request_id_header = HeaderName::from_static("x-request-id");

    Ok(Router::new()
        // Health check and SEO artifacts at root level (not under /api/v1).
        .merge(routes::health::router())
        .merge(routes::seo::router())
        // API v1 routes.
        .nest("/api/v1", routes::api_routes())
        // Stored images, addressed by content hash.
        .nest_service(MEDIA_PREFIX, ServeDir::new(&config.media.root))
        // -- Middleware stack (applied bottom-up) --
        .layer(DefaultBodyLimit::max(config.body_limit_bytes()))
        .layer(CompressionLayer::new())
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid,
        ))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state))
}

/// Build the CORS middleware layer from server configuration.
///
/// An unparsable origin is a configuration error so the server refuses to
/// start.
pub fn build_cors_layer(config: &ServerConfig) -> Result<CorsLayer, ConfigError> {
    let origins = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>().map_err(|e| ConfigError::Invalid {
                key: "CORS_ORIGINS",
                value: o.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    fn config_with_origins(origins: &[&str]) -> ServerConfig {
        let mut config = ServerConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("test-secret".into()),
            _ => None,
        })
        .unwrap();
        config.cors_origins = origins.iter().map(|o| o.to_string()).collect();
        config
    }

    #[test]
    fn valid_origins_build() {
        assert!(build_cors_layer(&config_with_origins(&["http://localhost:5173"])).is_ok());
    }

    #[test]
    fn invalid_origin_is_config_error() {
        let err = build_cors_layer(&config_with_origins(&["bad\norigin"])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CORS_ORIGINS", .. }));
    }
}
