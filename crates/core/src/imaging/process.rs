//! Decode, normalize and re-encode an accepted upload.
//!
//! | Operation | `image` API |
//! |---|---|
//! | Decode with allocation limits | `ImageReader::with_format` + `Limits` |
//! | EXIF orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Alpha flattening | per-pixel blend onto white |
//! | Resize | `imageops::resize` with `Lanczos3` |
//! | Encode | `codecs::jpeg::JpegEncoder` |

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader, Limits, RgbImage};

use super::calculations::{fit_within, needs_resize};
use super::format::{check_payload, ImageKind};
use super::{ImageConfig, OUTPUT_MIME};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Largest source dimension the decoder will accept.
const MAX_SOURCE_DIMENSION: u32 = 12_000;

/// Upper bound on decoder allocations (512 MiB).
const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

/// A normalized JPEG ready to be stored.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// SHA-256 hex of `bytes`; also the stored file name.
    pub content_hash: String,
    pub mime_type: &'static str,
    pub source_kind: ImageKind,
}

impl ProcessedImage {
    pub fn byte_size(&self) -> i64 {
        i64::try_from(self.bytes.len()).unwrap_or(i64::MAX)
    }
}

/// Validate and normalize an upload.
///
/// Validation failures and undecodable payloads are [`CoreError::InvalidAsset`];
/// failures producing the output are [`CoreError::IngestFailed`].
pub fn process_image(
    bytes: &[u8],
    declared_mime: Option<&str>,
    config: &ImageConfig,
) -> Result<ProcessedImage, CoreError> {
    let kind = check_payload(bytes, declared_mime, config.max_bytes)?;

    let img = decode_oriented(bytes, kind)?;
    let rgb = flatten_onto_white(img);

    let source = rgb.dimensions();
    let bounds = (config.max_width, config.max_height);
    let rgb = if needs_resize(source, bounds) {
        let (width, height) = fit_within(source, bounds);
        image::imageops::resize(&rgb, width, height, FilterType::Lanczos3)
    } else {
        rgb
    };
    let (width, height) = rgb.dimensions();

    let encoded = encode_jpeg(rgb, config.jpeg_quality)?;
    let content_hash = content_hash(&encoded);

    tracing::debug!(
        source_width = source.0,
        source_height = source.1,
        width,
        height,
        bytes = encoded.len(),
        %content_hash,
        "Image normalized",
    );

    Ok(ProcessedImage {
        bytes: encoded,
        width,
        height,
        content_hash,
        mime_type: OUTPUT_MIME,
        source_kind: kind,
    })
}

/// Decode `bytes` as `kind` and apply any EXIF orientation.
fn decode_oriented(bytes: &[u8], kind: ImageKind) -> Result<DynamicImage, CoreError> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SOURCE_DIMENSION);
    limits.max_image_height = Some(MAX_SOURCE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);

    let mut reader = ImageReader::with_format(Cursor::new(bytes), kind.format());
    reader.limits(limits);

    let undecodable = |e: image::ImageError| {
        CoreError::InvalidAsset(format!("image could not be decoded: {e}"))
    };

    let mut decoder = reader.into_decoder().map_err(undecodable)?;
    let orientation = decoder.orientation().map_err(undecodable)?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(undecodable)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Composite any alpha channel onto a white background.
fn flatten_onto_white(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }
    let rgba = img.into_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

fn encode_jpeg(rgb: RgbImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|e| CoreError::IngestFailed(format!("JPEG encoding failed: {e}")))?;
    Ok(out)
}

/// Lowercase hex SHA-256 of the encoded output; names the stored file.
fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::test_images;
    use assert_matches::assert_matches;

    fn decode(bytes: &[u8]) -> DynamicImage {
        image::load_from_memory(bytes).unwrap()
    }

    #[test]
    fn large_png_is_downscaled_to_jpeg() {
        let bytes = test_images::png(2400, 1200);
        let out = process_image(&bytes, Some("image/png"), &ImageConfig::default()).unwrap();
        assert_eq!((out.width, out.height), (1200, 600));
        assert_eq!(out.mime_type, "image/jpeg");
        assert_eq!(out.source_kind, ImageKind::Png);
        assert_eq!(image::guess_format(&out.bytes).unwrap(), image::ImageFormat::Jpeg);
        let decoded = decode(&out.bytes);
        assert_eq!((decoded.width(), decoded.height()), (1200, 600));
    }

    #[test]
    fn small_image_is_not_upscaled() {
        let bytes = test_images::jpeg(64, 32);
        let out = process_image(&bytes, None, &ImageConfig::default()).unwrap();
        assert_eq!((out.width, out.height), (64, 32));
    }

    #[test]
    fn content_hash_is_hex_sha256() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn content_hash_matches_output() {
        let bytes = test_images::png(16, 16);
        let out = process_image(&bytes, None, &ImageConfig::default()).unwrap();
        assert_eq!(out.content_hash, content_hash(&out.bytes));
        assert_eq!(out.content_hash.len(), 64);
    }

    #[test]
    fn same_input_same_hash() {
        let bytes = test_images::png(32, 32);
        let a = process_image(&bytes, None, &ImageConfig::default()).unwrap();
        let b = process_image(&bytes, None, &ImageConfig::default()).unwrap();
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn transparency_becomes_white() {
        let bytes = test_images::transparent_png(8, 8);
        let out = process_image(&bytes, None, &ImageConfig::default()).unwrap();
        let rgb = decode(&out.bytes).into_rgb8();
        let [r, g, b] = rgb.get_pixel(4, 4).0;
        assert!(r > 240 && g > 240 && b > 240, "got {r},{g},{b}");
    }

    #[test]
    fn truncated_payload_is_invalid_asset() {
        let mut bytes = test_images::png(64, 64);
        bytes.truncate(40);
        assert_matches!(
            process_image(&bytes, None, &ImageConfig::default()),
            Err(CoreError::InvalidAsset(_))
        );
    }

    #[test]
    fn custom_bounds_are_respected() {
        let config = ImageConfig {
            max_width: 100,
            max_height: 100,
            ..ImageConfig::default()
        };
        let bytes = test_images::png(400, 200);
        let out = process_image(&bytes, None, &config).unwrap();
        assert_eq!((out.width, out.height), (100, 50));
    }
}
