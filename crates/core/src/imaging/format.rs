//! Upload validation: size limit, sniffed format and declared MIME type.
//!
//! The format is decided by the payload's magic bytes, never by the file name
//! or the client's `Content-Type`. A declared type is only used to reject
//! payloads that claim to be something else.

use image::ImageFormat;

use crate::error::CoreError;

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
}

impl ImageKind {
    pub fn from_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::WebP => Some(ImageKind::WebP),
            _ => None,
        }
    }

    pub fn format(self) -> ImageFormat {
        match self {
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
            ImageKind::WebP => ImageFormat::WebP,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::WebP => "image/webp",
        }
    }

    /// Whether a declared MIME type names this format. `image/jpg` is
    /// accepted as an alias for JPEG.
    fn matches_mime(self, mime: &str) -> bool {
        match self {
            ImageKind::Jpeg => matches!(mime, "image/jpeg" | "image/jpg" | "image/pjpeg"),
            ImageKind::Png => mime == "image/png",
            ImageKind::WebP => mime == "image/webp",
        }
    }
}

/// Sniff the payload's format from its magic bytes.
pub fn sniff(bytes: &[u8]) -> Result<ImageKind, CoreError> {
    let format = image::guess_format(bytes)
        .map_err(|_| CoreError::InvalidAsset("unrecognized image format".into()))?;
    ImageKind::from_format(format).ok_or_else(|| {
        CoreError::InvalidAsset(format!(
            "unsupported image format {format:?}; expected JPEG, PNG or WebP"
        ))
    })
}

/// Normalize a declared MIME type. Missing, blank and generic binary types
/// count as "not declared".
fn declared(mime: Option<&str>) -> Option<String> {
    let essence = mime?.split(';').next()?.trim().to_ascii_lowercase();
    match essence.as_str() {
        "" | "application/octet-stream" => None,
        _ => Some(essence),
    }
}

/// Run every pre-decode check on an upload.
///
/// Rejects empty payloads, payloads over `max_bytes`, formats outside
/// {JPEG, PNG, WebP} and declared types that disagree with the sniffed one.
pub fn check_payload(
    bytes: &[u8],
    declared_mime: Option<&str>,
    max_bytes: usize,
) -> Result<ImageKind, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::InvalidAsset("empty upload".into()));
    }
    if bytes.len() > max_bytes {
        return Err(CoreError::InvalidAsset(format!(
            "upload is {} bytes; the limit is {max_bytes} bytes",
            bytes.len()
        )));
    }

    let kind = sniff(bytes)?;

    if let Some(mime) = declared(declared_mime) {
        if !kind.matches_mime(&mime) {
            return Err(CoreError::InvalidAsset(format!(
                "declared type {mime} does not match detected {}",
                kind.mime_type()
            )));
        }
    }

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::test_images;
    use assert_matches::assert_matches;

    const LIMIT: usize = 5 * 1024 * 1024;

    #[test]
    fn accepts_png_with_matching_mime() {
        let bytes = test_images::png(4, 4);
        assert_eq!(check_payload(&bytes, Some("image/png"), LIMIT).unwrap(), ImageKind::Png);
    }

    #[test]
    fn accepts_missing_or_generic_mime() {
        let bytes = test_images::jpeg(4, 4);
        assert_eq!(check_payload(&bytes, None, LIMIT).unwrap(), ImageKind::Jpeg);
        assert_eq!(
            check_payload(&bytes, Some("application/octet-stream"), LIMIT).unwrap(),
            ImageKind::Jpeg
        );
    }

    #[test]
    fn jpg_alias_and_parameters_accepted() {
        let bytes = test_images::jpeg(4, 4);
        assert!(check_payload(&bytes, Some("image/jpg"), LIMIT).is_ok());
        assert!(check_payload(&bytes, Some("Image/JPEG; charset=binary"), LIMIT).is_ok());
    }

    #[test]
    fn rejects_mime_mismatch() {
        let bytes = test_images::png(4, 4);
        assert_matches!(
            check_payload(&bytes, Some("image/jpeg"), LIMIT),
            Err(CoreError::InvalidAsset(msg)) if msg.contains("does not match")
        );
    }

    #[test]
    fn rejects_empty() {
        assert_matches!(check_payload(&[], None, LIMIT), Err(CoreError::InvalidAsset(_)));
    }

    #[test]
    fn rejects_oversized_before_sniffing() {
        // 50 MB with a PNG signature against a 5 MB limit.
        let mut bytes = vec![0u8; 50 * 1024 * 1024];
        bytes[..8].copy_from_slice(b"\x89PNG\r\n\x1a\n");
        assert_matches!(
            check_payload(&bytes, Some("image/png"), LIMIT),
            Err(CoreError::InvalidAsset(msg)) if msg.contains("limit")
        );
    }

    #[test]
    fn rejects_non_image() {
        assert_matches!(
            check_payload(b"%PDF-1.7 not an image", None, LIMIT),
            Err(CoreError::InvalidAsset(_))
        );
    }

    #[test]
    fn rejects_unsupported_image_format() {
        // GIF signature: recognized by the sniffer but not accepted.
        assert_matches!(
            check_payload(b"GIF89a\x01\x00\x01\x00", Some("image/gif"), LIMIT),
            Err(CoreError::InvalidAsset(msg)) if msg.contains("unsupported")
        );
    }
}
