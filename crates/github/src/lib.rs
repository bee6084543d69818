//! GitHub profile statistics for the public site.
//!
//! - [`activity`] -- Commit windows and ordering of recent activity.
//! - [`client`] -- REST API read source ([`GithubClient`]).
//! - [`service`] -- TTL-memoized access shared by request handlers.

pub mod activity;
pub mod client;
pub mod service;

pub use client::{GithubClient, GithubConfig};
pub use service::StatsService;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public profile counters shown on the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubStats {
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub public_repos: u32,
    /// Owned repositories, including private ones when a token is set.
    pub total_repos: u32,
    pub followers: u32,
    pub following: u32,
    pub commits: CommitSummary,
    /// When the values were fetched from GitHub.
    pub fetched_at: DateTime<Utc>,
}

/// Commits authored by the user across their most recently updated
/// repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub count: u32,
    /// `"May 2024"` for the current month, or `"Last 30 Days"` when the
    /// month has no commits yet.
    pub period: String,
    pub repos_checked: u32,
}

/// One commit in the recent activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitActivity {
    /// Repository name without the owner.
    pub repo: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// The underlying HTTP request failed (network, DNS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// GitHub answered with a non-2xx status.
    #[error("GitHub returned HTTP {0}")]
    HttpStatus(u16),
}

/// Where statistics come from. Implemented by [`GithubClient`]; tests
/// substitute a canned source.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch(&self) -> Result<GithubStats, StatsError>;

    /// Commits authored since `since`, newest first.
    async fn recent_activity(&self, since: DateTime<Utc>) -> Result<Vec<CommitActivity>, StatsError>;
}
