//! Domain logic for the folio content backend.
//!
//! Pure functions and small types with no database or HTTP dependencies:
//! slug and metadata derivation, the publish workflow, image ingestion,
//! contact spam heuristics, SEO artifact builders and a TTL cache.

pub mod cache;
pub mod contact;
pub mod content;
pub mod error;
pub mod imaging;
pub mod markdown;
pub mod pagination;
pub mod roles;
pub mod seo;
pub mod slug;
pub mod types;
pub mod workflow;
