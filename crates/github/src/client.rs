//! GitHub REST API client for user profile statistics and commits.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::activity::{
    latest_activity, month_label, month_start, window_start, ACTIVITY_REPOS, COMMITS_PER_REPO,
    COUNTED_REPOS, FALLBACK_PERIOD,
};
use crate::{CommitActivity, CommitSummary, GithubStats, StatsError, StatsSource};

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// HTTP timeout for a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cache lifetime in seconds.
const DEFAULT_CACHE_TTL_SECS: u64 = 900;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub username: String,
    /// Personal access token; raises the rate limit when present.
    pub token: Option<String>,
    pub api_base: String,
    pub cache_ttl: Duration,
}

impl GithubConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` when `GITHUB_USERNAME` is unset, which disables stats.
    ///
    /// | Variable                | Required | Default |
    /// |-------------------------|----------|---------|
    /// | `GITHUB_USERNAME`       | yes      | --      |
    /// | `GITHUB_TOKEN`          | no       | --      |
    /// | `GITHUB_CACHE_TTL_SECS` | no       | `900`   |
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let username = get("GITHUB_USERNAME")?.trim().to_string();
        let ttl_secs = get("GITHUB_CACHE_TTL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);
        Some(Self {
            username,
            token: get("GITHUB_TOKEN"),
            api_base: DEFAULT_API_BASE.to_string(),
            cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Subset of `GET /users/{username}` that the site displays.
#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
    name: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    html_url: Option<String>,
    public_repos: u32,
    followers: u32,
    following: u32,
}

impl UserPayload {
    fn into_stats(self, owned_repos: usize, commits: CommitSummary) -> GithubStats {
        // The repo listing is empty when it failed or the user has none.
        let total_repos = match owned_repos {
            0 => self.public_repos,
            n => u32::try_from(n).unwrap_or(u32::MAX),
        };
        GithubStats {
            username: self.login,
            name: self.name,
            bio: self.bio,
            avatar_url: self.avatar_url,
            html_url: self.html_url,
            public_repos: self.public_repos,
            total_repos,
            followers: self.followers,
            following: self.following,
            commits,
            fetched_at: Utc::now(),
        }
    }
}

/// Subset of a repository listing entry.
#[derive(Debug, Deserialize)]
struct RepoPayload {
    name: String,
    full_name: String,
}

/// Subset of `GET /repos/{owner}/{repo}/commits` entries.
#[derive(Debug, Deserialize)]
struct CommitPayload {
    html_url: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    date: DateTime<Utc>,
}

impl CommitPayload {
    /// `None` when GitHub has no author date for the commit.
    fn into_activity(self, repo: &str) -> Option<CommitActivity> {
        let date = self.commit.author?.date;
        Some(CommitActivity {
            repo: repo.to_string(),
            message: self.commit.message,
            date,
            url: self.html_url,
        })
    }
}

pub struct GithubClient {
    client: reqwest::Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Result<Self, StatsError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base.trim_end_matches('/'))
    }

    fn user_url(&self) -> String {
        self.api_url(&format!("/users/{}", self.config.username))
    }

    /// Owned repositories, most recently updated first. With a token this
    /// is the authenticated listing, which includes private repositories.
    fn repos_url(&self) -> String {
        match self.config.token {
            Some(_) => self.api_url("/user/repos"),
            None => self.api_url(&format!("/users/{}/repos", self.config.username)),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, StatsError> {
        let mut request = self
            .client
            .get(url)
            .query(query)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StatsError::HttpStatus(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    async fn repos(&self) -> Result<Vec<RepoPayload>, StatsError> {
        let query = [
            ("type", "owner".to_string()),
            ("sort", "updated".to_string()),
            ("per_page", "100".to_string()),
        ];
        self.get_json(&self.repos_url(), &query).await
    }

    /// Commits by the configured user in `repo` since `since`. Repositories
    /// GitHub refuses to list (empty, blocked) yield nothing.
    async fn commits(
        &self,
        repo: &RepoPayload,
        since: DateTime<Utc>,
        per_page: u32,
    ) -> Result<Vec<CommitPayload>, StatsError> {
        let url = self.api_url(&format!("/repos/{}/commits", repo.full_name));
        let query = [
            ("author", self.config.username.clone()),
            ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("per_page", per_page.to_string()),
        ];
        match self.get_json(&url, &query).await {
            Err(StatsError::HttpStatus(status)) => {
                tracing::debug!(repo = %repo.full_name, status, "Skipping repository commits");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn count_commits(
        &self,
        repos: &[RepoPayload],
        since: DateTime<Utc>,
    ) -> Result<u32, StatsError> {
        let mut total = 0u32;
        for repo in repos {
            let commits = self.commits(repo, since, 100).await?;
            total = total.saturating_add(u32::try_from(commits.len()).unwrap_or(u32::MAX));
        }
        Ok(total)
    }
}

#[async_trait]
impl StatsSource for GithubClient {
    async fn fetch(&self) -> Result<GithubStats, StatsError> {
        let user: UserPayload = self.get_json(&self.user_url(), &[]).await?;
        let repos = self.repos().await?;
        let counted = &repos[..repos.len().min(COUNTED_REPOS)];

        let now = Utc::now();
        let mut count = self.count_commits(counted, month_start(now)).await?;
        let mut period = month_label(now);
        if count == 0 {
            count = self.count_commits(counted, window_start(now)).await?;
            period = FALLBACK_PERIOD.to_string();
        }

        let commits = CommitSummary {
            count,
            period,
            repos_checked: u32::try_from(counted.len()).unwrap_or(u32::MAX),
        };
        Ok(user.into_stats(repos.len(), commits))
    }

    async fn recent_activity(&self, since: DateTime<Utc>) -> Result<Vec<CommitActivity>, StatsError> {
        let repos = self.repos().await?;
        let mut items = Vec::new();
        for repo in repos.iter().take(ACTIVITY_REPOS) {
            let commits = self.commits(repo, since, COMMITS_PER_REPO).await?;
            items.extend(commits.into_iter().filter_map(|c| c.into_activity(&repo.name)));
        }
        Ok(latest_activity(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GithubConfig {
        GithubConfig::from_lookup(|key| (key == "GITHUB_USERNAME").then(|| "octocat".to_string()))
            .unwrap()
    }

    #[test]
    fn disabled_without_username() {
        assert!(GithubConfig::from_lookup(|_| None).is_none());
    }

    #[test]
    fn defaults_apply() {
        let config = config();
        assert_eq!(config.username, "octocat");
        assert_eq!(config.cache_ttl, Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
        assert!(config.token.is_none());
    }

    #[test]
    fn user_url_trims_trailing_slash() {
        let client = GithubClient::new(GithubConfig {
            api_base: "http://localhost:9999/".into(),
            ..config()
        })
        .unwrap();
        assert_eq!(client.user_url(), "http://localhost:9999/users/octocat");
    }

    #[test]
    fn payload_ignores_unknown_fields() {
        let json = serde_json::json!({
            "login": "octocat",
            "name": "The Octocat",
            "bio": null,
            "avatar_url": "https://avatars.githubusercontent.com/u/583231",
            "html_url": "https://github.com/octocat",
            "public_repos": 8,
            "followers": 1000,
            "following": 9,
            "company": "@github"
        });
        let commits = CommitSummary {
            count: 4,
            period: FALLBACK_PERIOD.into(),
            repos_checked: 3,
        };
        let stats = serde_json::from_value::<UserPayload>(json)
            .unwrap()
            .into_stats(3, commits.clone());
        assert_eq!(stats.username, "octocat");
        assert_eq!(stats.public_repos, 8);
        assert_eq!(stats.total_repos, 3);
        assert_eq!(stats.commits, commits);
        assert!(stats.bio.is_none());
    }

    #[test]
    fn total_repos_falls_back_to_public_count() {
        let user = UserPayload {
            login: "octocat".into(),
            name: None,
            bio: None,
            avatar_url: None,
            html_url: None,
            public_repos: 8,
            followers: 0,
            following: 0,
        };
        let commits = CommitSummary {
            count: 0,
            period: FALLBACK_PERIOD.into(),
            repos_checked: 0,
        };
        assert_eq!(user.into_stats(0, commits).total_repos, 8);
    }

    #[test]
    fn repo_listing_switches_with_token() {
        let public = GithubClient::new(config()).unwrap();
        assert_eq!(public.repos_url(), "https://api.github.com/users/octocat/repos");

        let private = GithubClient::new(GithubConfig {
            token: Some("ghp_example".into()),
            ..config()
        })
        .unwrap();
        assert_eq!(private.repos_url(), "https://api.github.com/user/repos");
    }

    #[test]
    fn commit_payload_maps_to_activity() {
        let json = serde_json::json!([
            {
                "sha": "abc",
                "html_url": "https://github.com/octocat/folio/commit/abc",
                "commit": {
                    "message": "Fix slug collisions",
                    "author": { "name": "Octo", "date": "2024-05-02T10:00:00Z" }
                }
            },
            {
                "sha": "def",
                "html_url": "https://github.com/octocat/folio/commit/def",
                "commit": { "message": "Orphan", "author": null }
            }
        ]);
        let commits: Vec<CommitPayload> = serde_json::from_value(json).unwrap();
        let activity: Vec<_> = commits
            .into_iter()
            .filter_map(|c| c.into_activity("folio"))
            .collect();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].repo, "folio");
        assert_eq!(activity[0].message, "Fix slug collisions");
        assert_eq!(activity[0].url, "https://github.com/octocat/folio/commit/abc");
    }
}
