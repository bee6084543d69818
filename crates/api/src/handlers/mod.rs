//! Request handlers.
//!
//! Handlers stay thin: they extract and authorize, call into
//! [`crate::publishing`] or a repository in `folio_db`, and wrap the result
//! in [`DataResponse`](crate::response::DataResponse). Errors map through
//! [`AppError`](crate::error::AppError).

pub mod auth;
pub mod contact;
pub mod content;
pub mod dashboard;
pub mod github;
pub mod images;
pub mod messages;
pub mod public;
pub mod seo;
