//! Pure dimension math for resizing. No I/O, no images.

/// Fit `source` inside `bounds` preserving aspect ratio, never upscaling.
///
/// Returns the source dimensions unchanged when they already fit. Each output
/// side is at least 1 pixel.
///
/// ```
/// # use folio_core::imaging::calculations::fit_within;
/// assert_eq!(fit_within((2400, 1600), (1200, 800)), (1200, 800));
/// assert_eq!(fit_within((1000, 2000), (1200, 800)), (400, 800));
/// assert_eq!(fit_within((300, 200), (1200, 800)), (300, 200));
/// ```
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w == 0 || src_h == 0 || (src_w <= max_w && src_h <= max_h) {
        return source;
    }

    let scale = f64::min(max_w as f64 / src_w as f64, max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Whether resizing is needed at all.
pub fn needs_resize(source: (u32, u32), bounds: (u32, u32)) -> bool {
    fit_within(source, bounds) != source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_limited_by_width() {
        assert_eq!(fit_within((3000, 1000), (1200, 800)), (1200, 400));
    }

    #[test]
    fn portrait_limited_by_height() {
        assert_eq!(fit_within((600, 1600), (1200, 800)), (300, 800));
    }

    #[test]
    fn exact_bounds_unchanged() {
        assert_eq!(fit_within((1200, 800), (1200, 800)), (1200, 800));
        assert!(!needs_resize((1200, 800), (1200, 800)));
    }

    #[test]
    fn never_upscales() {
        assert_eq!(fit_within((10, 10), (1200, 800)), (10, 10));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_within((100_000, 10), (1200, 800)), (1200, 1));
    }
}
