//! Commit windows and ordering of the recent activity feed.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::CommitActivity;

/// Most recently updated repositories scanned for the commit count.
pub const COUNTED_REPOS: usize = 20;

/// Most recently updated repositories scanned for the activity feed.
pub const ACTIVITY_REPOS: usize = 10;

/// Commits requested per repository for the activity feed.
pub const COMMITS_PER_REPO: u32 = 10;

/// Longest activity feed served.
pub const ACTIVITY_LIMIT: usize = 20;

/// Trailing window of the activity feed and of the commit count fallback.
pub const ACTIVITY_WINDOW_DAYS: i64 = 30;

pub const FALLBACK_PERIOD: &str = "Last 30 Days";

/// Midnight UTC on the first day of `now`'s month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// `"May 2024"`.
pub fn month_label(now: DateTime<Utc>) -> String {
    now.format("%B %Y").to_string()
}

pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(ACTIVITY_WINDOW_DAYS)
}

/// Newest first, capped at [`ACTIVITY_LIMIT`].
pub fn latest_activity(mut items: Vec<CommitActivity>) -> Vec<CommitActivity> {
    items.sort_by(|a, b| b.date.cmp(&a.date));
    items.truncate(ACTIVITY_LIMIT);
    items
}
