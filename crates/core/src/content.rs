//! Content kinds and the metadata derived from an entity's body at save time.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::markdown;

/// Meta description budget in characters, ellipsis included.
pub const META_DESCRIPTION_MAX: usize = 160;

/// Excerpt budget in characters, ellipsis included.
pub const EXCERPT_MAX: usize = 200;

/// Average reading speed used for reading-time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LEN: usize = 50;

const ELLIPSIS: &str = "...";

// ---------------------------------------------------------------------------
// ContentKind
// ---------------------------------------------------------------------------

/// The two kinds of publishable entity. Slugs are unique per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Post,
    PortfolioItem,
}

impl ContentKind {
    /// Value stored in the `kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::PortfolioItem => "portfolio_item",
        }
    }

    /// Resolve the `{kind}` segment of admin routes (`posts`, `portfolio`).
    pub fn from_route_segment(segment: &str) -> Option<Self> {
        match segment {
            "posts" => Some(ContentKind::Post),
            "portfolio" => Some(ContentKind::PortfolioItem),
            _ => None,
        }
    }

    pub fn route_segment(self) -> &'static str {
        match self {
            ContentKind::Post => "posts",
            ContentKind::PortfolioItem => "portfolio",
        }
    }

    /// Human readable name used in error messages.
    pub fn entity_name(self) -> &'static str {
        match self {
            ContentKind::Post => "Post",
            ContentKind::PortfolioItem => "Portfolio item",
        }
    }

    /// Sub-directory of the media root holding this kind's images.
    pub fn media_dir(self) -> &'static str {
        match self {
            ContentKind::Post => "posts",
            ContentKind::PortfolioItem => "portfolio",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown content kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for ContentKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ContentKind::Post),
            "portfolio_item" => Ok(ContentKind::PortfolioItem),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Decodes the `kind` column.
impl TryFrom<String> for ContentKind {
    type Error = UnknownKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Derived metadata
// ---------------------------------------------------------------------------

/// Truncate `text` to at most `max` characters, cutting at the last word
/// boundary and appending `...` when anything was removed. The ellipsis
/// counts against `max`.
pub fn truncate_at_word(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let budget = max.saturating_sub(ELLIPSIS.len());
    let byte_end = text
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..byte_end];

    // If the cut lands exactly before a space the last word is whole.
    let next_is_space = text[byte_end..].starts_with(char::is_whitespace);
    let cut = if next_is_space {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(pos) => &head[..pos],
            None => head,
        }
    };

    let cut = cut.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':'));
    format!("{cut}{ELLIPSIS}")
}

/// Meta description derived from a Markdown body: plain text, whitespace
/// collapsed, at most [`META_DESCRIPTION_MAX`] characters.
pub fn derive_meta_description(body: &str) -> String {
    truncate_at_word(&markdown::plain_text(body), META_DESCRIPTION_MAX)
}

/// Listing excerpt derived from a Markdown body, at most [`EXCERPT_MAX`]
/// characters.
pub fn derive_excerpt(body: &str) -> String {
    truncate_at_word(&markdown::plain_text(body), EXCERPT_MAX)
}

/// Estimated reading time in whole minutes, never less than one.
pub fn reading_time_minutes(body: &str) -> u32 {
    let words = markdown::word_count(body);
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Use the caller's value when it has content, otherwise derive one.
pub fn supplied_or_derived(supplied: Option<&str>, derive: impl FnOnce() -> String) -> String {
    match supplied.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => derive(),
    }
}

/// Normalize a tag list: trimmed, lowercased, internal whitespace collapsed,
/// empties dropped, deduplicated and sorted.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|t| markdown::collapse_whitespace(&t.as_ref().to_lowercase()))
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Check a normalized tag list against the count and length limits.
pub fn validate_tags(tags: &[String]) -> Result<(), String> {
    if tags.len() > MAX_TAGS {
        return Err(format!("at most {MAX_TAGS} tags are allowed"));
    }
    if let Some(tag) = tags.iter().find(|t| t.chars().count() > MAX_TAG_LEN) {
        return Err(format!("tag '{tag}' exceeds {MAX_TAG_LEN} characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_route_segments() {
        assert_eq!(ContentKind::from_route_segment("posts"), Some(ContentKind::Post));
        assert_eq!(
            ContentKind::from_route_segment("portfolio"),
            Some(ContentKind::PortfolioItem)
        );
        assert_eq!(ContentKind::from_route_segment("pages"), None);
        for kind in [ContentKind::Post, ContentKind::PortfolioItem] {
            assert_eq!(ContentKind::from_route_segment(kind.route_segment()), Some(kind));
            assert_eq!(kind.as_str().parse::<ContentKind>().unwrap(), kind);
        }
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_at_word("short text", 160), "short text");
    }

    #[test]
    fn truncation_counts_ellipsis_in_budget() {
        let text = "alpha beta gamma delta";
        let out = truncate_at_word(text, 15);
        assert_eq!(out, "alpha beta...");
        assert!(out.chars().count() <= 15);
    }

    #[test]
    fn truncation_keeps_whole_word_ending_at_budget() {
        // Budget of 13 leaves 10 characters: "alpha beta" followed by a space.
        assert_eq!(truncate_at_word("alpha beta gamma", 13), "alpha beta...");
    }

    #[test]
    fn truncation_of_single_long_word_hard_cuts() {
        let out = truncate_at_word(&"x".repeat(300), 160);
        assert_eq!(out.chars().count(), 160);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn truncation_handles_multibyte_text() {
        let text = "héllo wörld ".repeat(30);
        let out = truncate_at_word(text.trim(), 40);
        assert!(out.chars().count() <= 40);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn meta_description_uses_plain_text() {
        let body = format!("# Heading\n\n{}", "lorem ipsum ".repeat(40));
        let meta = derive_meta_description(&body);
        assert!(meta.starts_with("Heading lorem ipsum"));
        assert!(meta.chars().count() <= META_DESCRIPTION_MAX);
        assert!(meta.ends_with("..."));
        assert!(!meta.contains('#'));
    }

    #[test]
    fn excerpt_budget_is_larger() {
        let body = "word ".repeat(100);
        assert!(derive_excerpt(&body).chars().count() > META_DESCRIPTION_MAX);
        assert!(derive_excerpt(&body).chars().count() <= EXCERPT_MAX);
    }

    #[test]
    fn reading_time_rounds_up_with_minimum() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"w ".repeat(200)), 1);
        assert_eq!(reading_time_minutes(&"w ".repeat(201)), 2);
        assert_eq!(reading_time_minutes(&"w ".repeat(1000)), 5);
    }

    #[test]
    fn supplied_value_wins_when_non_blank() {
        assert_eq!(supplied_or_derived(Some(" mine "), || "derived".into()), "mine");
        assert_eq!(supplied_or_derived(Some("   "), || "derived".into()), "derived");
        assert_eq!(supplied_or_derived(None, || "derived".into()), "derived");
    }

    #[test]
    fn tags_are_normalized() {
        let tags = normalize_tags(["Rust", " rust ", "", "Web  Dev", "axum"]);
        assert_eq!(tags, vec!["axum", "rust", "web dev"]);
    }

    #[test]
    fn tag_limits() {
        let many: Vec<String> = (0..21).map(|i| format!("t{i}")).collect();
        assert!(validate_tags(&many).is_err());
        assert!(validate_tags(&["x".repeat(51)]).is_err());
        assert!(validate_tags(&["ok".to_string()]).is_ok());
    }
}
