//! Content publishing workflow on top of the repositories.
//!
//! Handlers stay thin; the rules that span several repository calls live
//! here:
//!
//! - [`content`] -- create / update with slug and metadata derivation,
//!   optimistic concurrency, workflow transitions, soft delete.
//! - [`ingest`] -- image upload pipeline and asset pointer replacement.
//! - [`views`] -- JSON shapes returned by the admin and public surfaces.
//! - [`bootstrap`] -- first admin account from the environment.

pub mod bootstrap;
pub mod content;
pub mod ingest;
pub mod views;
