//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` + `Validate` request DTOs where clients write the table
//! - Plain input structs for the values a repository writes

pub mod account;
pub mod contact_message;
pub mod content;
pub mod dashboard;
pub mod image_asset;
