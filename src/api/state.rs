use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{
    db::{SqliteWatchlistRepository, UserRepository},
    services::{AuthService, CatalogClient, WatchlistStore},
};

/// Shared application state
///
/// Every field is a cheap clonable handle; no request-scoped data lives here.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogClient>,
    pub watchlist: WatchlistStore,
    pub auth: AuthService,
    pub secure_cookies: bool,
}

impl AppState {
    /// Wires the SQLite-backed stores to the given catalog
    pub fn new(pool: SqlitePool, catalog: Arc<dyn CatalogClient>, secure_cookies: bool) -> Self {
        let repository = Arc::new(SqliteWatchlistRepository::new(pool.clone()));

        Self {
            watchlist: WatchlistStore::new(repository, catalog.clone()),
            auth: AuthService::new(UserRepository::new(pool)),
            catalog,
            secure_cookies,
        }
    }
}
