//! Image ingestion: validation, normalization and content-addressed storage.
//!
//! | Step | Module |
//! |---|---|
//! | Size / format / declared MIME checks | [`format`] |
//! | Fit-within dimension math | [`calculations`] |
//! | Decode, orient, flatten, resize, JPEG encode | [`process`] |
//! | Atomic write under `<root>/<kind>/<sha256>.jpg` | [`store`] |
//!
//! Everything here is synchronous; callers run it on a blocking thread.

pub mod calculations;
pub mod format;
pub mod process;
pub mod store;

pub use format::{check_payload, ImageKind};
pub use process::{process_image, ProcessedImage};
pub use store::{LocalAssetStore, StoredAsset};

/// Default upload limit (5 MiB).
pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_MAX_WIDTH: u32 = 1200;
pub const DEFAULT_MAX_HEIGHT: u32 = 800;
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// MIME type of every stored asset.
pub const OUTPUT_MIME: &str = "image/jpeg";

/// File extension of every stored asset.
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Limits and output parameters for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageConfig {
    pub max_bytes: usize,
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}
