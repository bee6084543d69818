//! Memoized statistics access.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use folio_core::cache::{Clock, TtlCache};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::activity::window_start;
use crate::{CommitActivity, GithubStats, StatsError, StatsSource};

/// Statistics as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub stats: GithubStats,
    /// The refresh failed and an expired value is being served.
    pub stale: bool,
}

/// Recent commits as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivitySnapshot {
    pub activity: Vec<CommitActivity>,
    pub stale: bool,
}

/// Fetches statistics and activity at most once per TTL each.
///
/// A cache's lock is held across its refresh so concurrent requests after
/// expiry trigger a single upstream call.
pub struct StatsService {
    source: Arc<dyn StatsSource>,
    clock: Arc<dyn Clock>,
    stats: Mutex<TtlCache<GithubStats>>,
    activity: Mutex<TtlCache<Vec<CommitActivity>>>,
}

impl StatsService {
    pub fn new(source: Arc<dyn StatsSource>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            stats: Mutex::new(TtlCache::new(ttl, clock.clone())),
            activity: Mutex::new(TtlCache::new(ttl, clock.clone())),
            clock,
        }
    }

    /// Current statistics. Serves the last good value when GitHub is
    /// unreachable; errors only if nothing was ever fetched.
    pub async fn get(&self) -> Result<StatsSnapshot, StatsError> {
        let (stats, stale) = memoized(&self.stats, "stats", || self.source.fetch()).await?;
        Ok(StatsSnapshot { stats, stale })
    }

    /// Commits of the last 30 days, newest first. Same staleness rules as
    /// [`StatsService::get`].
    pub async fn activity(&self) -> Result<ActivitySnapshot, StatsError> {
        let since = window_start(self.clock.now());
        let (activity, stale) =
            memoized(&self.activity, "activity", || self.source.recent_activity(since)).await?;
        Ok(ActivitySnapshot { activity, stale })
    }

    /// Drop the cached values so the next calls refetch.
    pub async fn invalidate(&self) {
        self.stats.lock().await.invalidate();
        self.activity.lock().await.invalidate();
    }
}

/// Fresh cached value, else a refetch, else the expired value flagged
/// stale.
async fn memoized<V, F, Fut>(
    cache: &Mutex<TtlCache<V>>,
    what: &'static str,
    load: F,
) -> Result<(V, bool), StatsError>
where
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, StatsError>>,
{
    let mut cache = cache.lock().await;
    if let Some(value) = cache.get() {
        return Ok((value, false));
    }

    match load().await {
        Ok(value) => {
            tracing::info!(what, ttl_secs = cache.ttl().as_secs(), "GitHub cache refreshed");
            cache.put(value.clone());
            Ok((value, false))
        }
        Err(err) => match cache.get_stale() {
            Some((value, stored_at)) => {
                tracing::warn!(what, error = %err, %stored_at, "GitHub refresh failed, serving stale value");
                Ok((value, true))
            }
            None => {
                tracing::warn!(what, error = %err, "GitHub data unavailable");
                Err(err)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use folio_core::cache::ManualClock;

    use super::*;
    use crate::CommitSummary;

    /// Counts calls and fails on demand.
    struct FakeSource {
        calls: AtomicU32,
        activity_calls: AtomicU32,
        failing: AtomicBool,
        since: std::sync::Mutex<Option<DateTime<Utc>>>,
    }

    impl FakeSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                activity_calls: AtomicU32::new(0),
                failing: AtomicBool::new(false),
                since: std::sync::Mutex::new(None),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatsSource for FakeSource {
        async fn fetch(&self) -> Result<GithubStats, StatsError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.failing.load(Ordering::SeqCst) {
                return Err(StatsError::HttpStatus(503));
            }
            Ok(GithubStats {
                username: "octocat".into(),
                name: None,
                bio: None,
                avatar_url: None,
                html_url: None,
                public_repos: n,
                total_repos: n,
                followers: 0,
                following: 0,
                commits: CommitSummary {
                    count: 3,
                    period: "January 2024".into(),
                    repos_checked: n,
                },
                fetched_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            })
        }

        async fn recent_activity(
            &self,
            since: DateTime<Utc>,
        ) -> Result<Vec<CommitActivity>, StatsError> {
            self.activity_calls.fetch_add(1, Ordering::SeqCst);
            *self.since.lock().unwrap() = Some(since);
            if self.failing.load(Ordering::SeqCst) {
                return Err(StatsError::HttpStatus(503));
            }
            Ok(vec![CommitActivity {
                repo: "folio".into(),
                message: "Initial commit".into(),
                date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                url: "https://github.com/octocat/folio/commit/1".into(),
            }])
        }
    }

    fn setup() -> (Arc<FakeSource>, ManualClock, StatsService) {
        let source = FakeSource::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let service = StatsService::new(
            source.clone(),
            Duration::from_secs(900),
            Arc::new(clock.clone()),
        );
        (source, clock, service)
    }

    #[tokio::test]
    async fn second_call_within_ttl_is_cached() {
        let (source, clock, service) = setup();

        let first = service.get().await.unwrap();
        clock.advance(Duration::from_secs(899));
        let second = service.get().await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(first, second);
        assert!(!second.stale);
    }

    #[tokio::test]
    async fn refetches_after_expiry() {
        let (source, clock, service) = setup();

        service.get().await.unwrap();
        clock.advance(Duration::from_secs(900));
        let refreshed = service.get().await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(refreshed.stats.public_repos, 2);
    }

    #[tokio::test]
    async fn serves_stale_when_refresh_fails() {
        let (source, clock, service) = setup();

        service.get().await.unwrap();
        source.failing.store(true, Ordering::SeqCst);
        clock.advance(Duration::from_secs(1000));

        let snapshot = service.get().await.unwrap();
        assert!(snapshot.stale);
        assert_eq!(snapshot.stats.public_repos, 1);
    }

    #[tokio::test]
    async fn errors_without_any_value() {
        let (source, _clock, service) = setup();
        source.failing.store(true, Ordering::SeqCst);

        let err = service.get().await.unwrap_err();
        assert!(matches!(err, StatsError::HttpStatus(503)));
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let (source, _clock, service) = setup();

        service.get().await.unwrap();
        service.activity().await.unwrap();
        service.invalidate().await;
        service.get().await.unwrap();
        service.activity().await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(source.activity_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn activity_covers_thirty_days_and_is_cached() {
        let (source, clock, service) = setup();

        let first = service.activity().await.unwrap();
        assert_eq!(first.activity.len(), 1);
        assert!(!first.stale);
        assert_eq!(
            *source.since.lock().unwrap(),
            Some(Utc.with_ymd_and_hms(2023, 12, 2, 0, 0, 0).unwrap())
        );

        clock.advance(Duration::from_secs(60));
        service.activity().await.unwrap();
        assert_eq!(source.activity_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.calls(), 0, "activity does not touch the stats cache");
    }

    #[tokio::test]
    async fn activity_serves_stale_when_refresh_fails() {
        let (source, clock, service) = setup();

        service.activity().await.unwrap();
        source.failing.store(true, Ordering::SeqCst);
        clock.advance(Duration::from_secs(1000));

        let snapshot = service.activity().await.unwrap();
        assert!(snapshot.stale);
        assert_eq!(snapshot.activity[0].repo, "folio");
    }
}
