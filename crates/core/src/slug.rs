//! URL slug derivation and collision handling.
//!
//! Slugs are lowercase ASCII, hyphen separated, and unique per content kind.
//! Collisions are resolved deterministically by trying `-2`, `-3`, ... in
//! increasing order.

/// Maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 180;

/// Slug used when a title contains nothing sluggable.
pub const FALLBACK_SLUG: &str = "untitled";

/// Derive a URL-safe slug from a title.
///
/// Non-ASCII characters are transliterated with `deunicode` (`"Straße"`
/// becomes `strasse`, `"Привет"` becomes `privet`), apostrophes are dropped
/// (`"Don't"` becomes `dont`), and every other run of non-alphanumeric
/// characters collapses into a single hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.chars() {
        if ch.is_ascii() {
            push_ascii(&mut slug, &mut pending_hyphen, ch);
            continue;
        }
        match deunicode::deunicode_char(ch) {
            Some(ascii) => {
                for folded in ascii.chars() {
                    push_ascii(&mut slug, &mut pending_hyphen, folded);
                }
            }
            None => pending_hyphen = true,
        }
    }

    let slug = cap_length(slug, MAX_SLUG_LEN);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Longest candidate suffix: `-` plus the digits of `u32::MAX`.
const MAX_SUFFIX_LEN: usize = 11;

/// A prefix shared by every [`candidate`] of `base`.
///
/// Long bases get truncated before their suffix is appended, so the
/// collision lookup must match on this prefix rather than on `base` itself.
pub fn candidate_prefix(base: &str) -> &str {
    let room = MAX_SLUG_LEN - MAX_SUFFIX_LEN;
    if base.len() > room {
        base[..room].trim_end_matches('-')
    } else {
        base
    }
}

/// The `n`-th candidate for `base`: `base` itself for `n <= 1`, otherwise
/// `base-n`. The suffix always fits inside [`MAX_SLUG_LEN`].
pub fn candidate(base: &str, n: u32) -> String {
    if n <= 1 {
        return base.to_string();
    }
    let suffix = format!("-{n}");
    let room = MAX_SLUG_LEN.saturating_sub(suffix.len());
    let stem = if base.len() > room {
        base[..room].trim_end_matches('-')
    } else {
        base
    };
    format!("{stem}{suffix}")
}

/// Return the first candidate of `base` for which `is_taken` is false.
///
/// The caller decides what "taken" means; on update it must exclude the
/// entity's own current slug so an unchanged title keeps its slug.
pub fn disambiguate<F>(base: &str, mut is_taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let mut n = 1;
    loop {
        let slug = candidate(base, n);
        if !is_taken(&slug) {
            return slug;
        }
        n += 1;
    }
}

/// Pick the first free candidate of `base` given the already-taken slugs
/// that share its prefix.
pub fn first_free(base: &str, taken: &[String]) -> String {
    disambiguate(base, |slug| taken.iter().any(|t| t == slug))
}

/// Validate a caller-supplied slug: non-empty, within the length cap, and
/// already in canonical form.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Cut `slug` to at most `max` bytes, preferring the last hyphen boundary.
fn cap_length(slug: String, max: usize) -> String {
    if slug.len() <= max {
        return slug;
    }
    // All characters are ASCII at this point, so byte slicing is safe.
    let head = &slug[..max];
    let cut = if slug.as_bytes()[max] == b'-' {
        head
    } else {
        match head.rfind('-') {
            Some(pos) if pos > 0 => &head[..pos],
            _ => head,
        }
    };
    cut.trim_end_matches('-').to_string()
}

/// Append one ASCII character to a slug under construction.
fn push_ascii(slug: &mut String, pending_hyphen: &mut bool, ch: char) {
    if matches!(ch, '\'' | '\u{2019}') {
        return;
    }
    if ch.is_ascii_alphanumeric() {
        if *pending_hyphen && !slug.is_empty() {
            slug.push('-');
        }
        *pending_hyphen = false;
        slug.push(ch.to_ascii_lowercase());
    } else {
        *pending_hyphen = true;
    }
}
