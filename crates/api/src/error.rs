use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use folio_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Renders as `{"error": message, "code": CODE}` plus a `details` object of
/// field messages for validation failures.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `folio_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A malformed request (bad multipart body, missing part, ...).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The client exceeded a submission rate limit.
    #[error("Too many requests; retry after {retry_after_secs}s")]
    TooManyRequests { retry_after_secs: i64 },

    /// An upstream service (GitHub) failed and nothing cached can stand in.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(errors.into())
    }
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = None;

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, key } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} '{key}' not found"),
                ),
                CoreError::Validation(fields) => {
                    details = Some(json!(fields));
                    (
                        StatusCode::BAD_REQUEST,
                        "VALIDATION_ERROR",
                        "Validation failed".to_string(),
                    )
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::InvalidTransition { .. } => (
                    StatusCode::CONFLICT,
                    "INVALID_TRANSITION",
                    core.to_string(),
                ),
                CoreError::InvalidAsset(msg) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INVALID_ASSET",
                    msg.clone(),
                ),
                CoreError::IngestFailed(msg) => {
                    tracing::error!(error = %msg, "Image ingestion failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INGEST_FAILED",
                        "The image could not be stored".to_string(),
                    )
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::TooManyRequests { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many submissions. Please try again later.".to_string(),
            ),
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "An upstream service is unavailable".to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        let mut response = (status, axum::Json(body)).into_response();
        if let AppError::TooManyRequests { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs.max(0)));
        }
        response
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            if let Some(constraint) = unique_violation(err) {
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

/// The constraint name of a PostgreSQL unique violation (SQLSTATE 23505).
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            Some(db_err.constraint().unwrap_or("unknown"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use folio_core::error::FieldErrors;
    use folio_core::workflow::ContentStatus;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_includes_details() {
        let mut fields = FieldErrors::new();
        fields.add("title", "must not be blank");
        let (status, json) = render(AppError::Core(CoreError::Validation(fields))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"]["title"][0], "must not be blank");
    }

    #[tokio::test]
    async fn invalid_transition_is_conflict() {
        let err = CoreError::InvalidTransition {
            from: ContentStatus::Draft,
            to: ContentStatus::Archived,
        };
        let (status, json) = render(err.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "INVALID_TRANSITION");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn invalid_asset_is_unprocessable() {
        let (status, json) =
            render(CoreError::InvalidAsset("too large".into()).into()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "too large");
    }

    #[tokio::test]
    async fn internal_messages_are_sanitized() {
        let (status, json) =
            render(CoreError::IngestFailed("disk full at /srv/media".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "INGEST_FAILED");
        assert!(!json["error"].as_str().unwrap().contains("/srv/media"));
    }

    #[tokio::test]
    async fn upstream_is_bad_gateway() {
        let (status, json) = render(AppError::Upstream("github returned 500".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["code"], "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn rate_limited_sets_retry_after() {
        let response = AppError::TooManyRequests { retry_after_secs: 60 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "60");

        let (_, json) = render(AppError::TooManyRequests { retry_after_secs: 60 }).await;
        assert_eq!(json["code"], "RATE_LIMITED");
    }

    #[tokio::test]
    async fn row_not_found_is_404() {
        let (status, _) = render(AppError::Database(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
