use std::sync::Arc;

use folio_core::imaging::LocalAssetStore;
use folio_github::StatsService;
use folio_notify::Notifier;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: folio_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Content-addressed image files under `config.media.root`.
    pub assets: LocalAssetStore,
    /// Contact message email sink; `None` when SMTP is not configured.
    pub notifier: Option<Arc<dyn Notifier>>,
    /// GitHub statistics; `None` when no GitHub username is configured.
    pub github: Option<Arc<StatsService>>,
}

impl AppState {
    pub fn new(pool: folio_db::DbPool, config: ServerConfig) -> Self {
        let assets = LocalAssetStore::new(config.media.root.clone());
        Self {
            pool,
            config: Arc::new(config),
            assets,
            notifier: None,
            github: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_github(mut self, github: Arc<StatsService>) -> Self {
        self.github = Some(github);
        self
    }
}
