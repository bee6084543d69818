//! Contact form heuristics: submission rate limits, honeypot detection and
//! spam scoring.
//!
//! The score is a sum of independent signals capped at 1.0. Messages at or
//! above [`SPAM_THRESHOLD`] are stored with `is_spam = true` and do not
//! trigger an email notification.

use std::sync::LazyLock;

use regex::Regex;

/// Score at or above which a message is treated as spam.
pub const SPAM_THRESHOLD: f64 = 0.7;

/// Name of the hidden form field humans leave empty.
pub const HONEYPOT_FIELD: &str = "website";

const SPAM_KEYWORDS: &[&str] = &[
    "bitcoin", "cryptocurrency", "investment", "trading", "forex", "casino",
    "viagra", "cialis", "pharmacy", "pills", "weight loss", "diet pills",
    "make money", "earn money", "work from home", "business opportunity",
    "guaranteed", "no risk", "limited time", "act now", "urgent",
    "click here", "visit our website", "check out our", "amazing deal",
    "seo services", "backlinks", "increase traffic", "ranking",
    "loan", "credit", "debt", "mortgage", "insurance",
    "replica", "fake", "counterfeit", "cheap", "discount",
];

static SPAM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"https?://\S+",
        r"\b[A-Z]{3,}\b",
        r"!{2,}",
        r"\$\d+",
        r"\b\d{10,}\b",
        r"[^\w\s]{3,}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static NUMERIC_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{5,}").expect("valid regex"));

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).expect("valid regex"));

/// A cap on submissions from one client IP or one email address within a
/// trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub name: &'static str,
    pub max: i64,
    pub window_secs: i64,
}

impl RateLimit {
    /// True when `recent` earlier submissions leave no room for another.
    pub fn is_exceeded_by(&self, recent: i64) -> bool {
        recent >= self.max
    }
}

/// Checked shortest window first.
pub const RATE_LIMITS: [RateLimit; 3] = [
    RateLimit { name: "per_minute", max: 2, window_secs: 60 },
    RateLimit { name: "per_hour", max: 10, window_secs: 60 * 60 },
    RateLimit { name: "per_day", max: 50, window_secs: 24 * 60 * 60 },
];

/// Canonical form of a submitter email for rate limiting.
pub fn rate_limit_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// The fields the spam heuristic looks at.
#[derive(Debug, Clone, Copy)]
pub struct MessageText<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
}

/// True when the honeypot field carries anything but whitespace.
pub fn honeypot_triggered(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Heuristic spam score in `[0.0, 1.0]`.
pub fn spam_score(msg: &MessageText<'_>) -> f64 {
    let combined = format!("{} {} {} {}", msg.name, msg.email, msg.subject, msg.body);
    let lowered = combined.to_lowercase();
    let mut score = 0.0;

    let keyword_hits = SPAM_KEYWORDS
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .count();
    if keyword_hits > 0 {
        score += f64::min(keyword_hits as f64 * 0.1, 0.4);
    }

    let pattern_hits: usize = SPAM_PATTERNS
        .iter()
        .map(|re| re.find_iter(&combined).count())
        .sum();
    if pattern_hits > 0 {
        score += f64::min(pattern_hits as f64 * 0.05, 0.3);
    }

    let body = msg.body.trim();
    let body_len = body.chars().count();
    if body_len < 10 {
        score += 0.2;
    } else if body_len > 2000 {
        score += 0.15;
    }

    if NUMERIC_EMAIL.is_match(msg.email) {
        score += 0.1;
    }

    if has_char_run(&lowered, 5) {
        score += 0.1;
    }

    if !body.contains(' ') {
        score += 0.2;
    }

    let total_chars = msg.body.chars().count().max(1);
    let punct_ratio = PUNCTUATION.find_iter(msg.body).count() as f64 / total_chars as f64;
    if punct_ratio > 0.1 {
        score += f64::min(punct_ratio * 0.5, 0.2);
    }

    let score = score.min(1.0);
    if score > 0.1 {
        tracing::debug!(score, keyword_hits, pattern_hits, "Spam heuristics");
    }
    score
}

/// Whether `score` crosses the spam threshold.
pub fn is_spam(score: f64) -> bool {
    score >= SPAM_THRESHOLD
}

/// True when some character repeats at least `run` times in a row.
fn has_char_run(text: &str, run: usize) -> bool {
    let mut prev = None;
    let mut count = 0;
    for ch in text.chars() {
        if Some(ch) == prev {
            count += 1;
        } else {
            prev = Some(ch);
            count = 1;
        }
        if count >= run {
            return true;
        }
    }
    false
}
