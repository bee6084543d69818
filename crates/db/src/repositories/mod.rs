//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod account_repo;
pub mod contact_message_repo;
pub mod contact_submission_repo;
pub mod content_repo;
pub mod dashboard_repo;
pub mod image_asset_repo;

pub use account_repo::AccountRepo;
pub use contact_message_repo::ContactMessageRepo;
pub use contact_submission_repo::ContactSubmissionRepo;
pub use content_repo::ContentRepo;
pub use dashboard_repo::DashboardRepo;
pub use image_asset_repo::ImageAssetRepo;
