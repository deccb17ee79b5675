use std::sync::Arc;

use crate::{
    db::WatchlistRepository,
    error::{AppError, AppResult},
    models::{Movie, StatusChange, StatusUpdate, WatchStatus, WatchlistEntry},
    services::catalog::CatalogClient,
};

/// Watchlist operations for one authenticated user at a time
///
/// Wraps the repository with the rules that are not storage concerns:
/// runtime enrichment on add, the one-entry-per-movie policy, and the
/// timestamp side effects of status transitions.
#[derive(Clone)]
pub struct WatchlistStore {
    repository: Arc<dyn WatchlistRepository>,
    catalog: Arc<dyn CatalogClient>,
}

impl WatchlistStore {
    pub fn new(repository: Arc<dyn WatchlistRepository>, catalog: Arc<dyn CatalogClient>) -> Self {
        Self {
            repository,
            catalog,
        }
    }

    /// Adds a movie to the user's watchlist.
    ///
    /// A movie without runtime triggers one catalog details lookup. A failed
    /// lookup is logged and the entry is stored without runtime.
    pub async fn add(&self, movie: Movie, user_id: &str, status: WatchStatus) -> AppResult<()> {
        if self.repository.exists(movie.id, user_id).await? {
            return Err(AppError::Conflict(format!(
                "Movie {} is already in the watchlist",
                movie.id
            )));
        }

        let movie = if movie.runtime.is_none() {
            self.enrich(movie).await
        } else {
            movie
        };

        self.repository.add(&movie, user_id, status).await?;

        tracing::info!(
            user_id = %user_id,
            movie_id = movie.id,
            status = %status,
            runtime = ?movie.runtime,
            "Added movie to watchlist"
        );

        Ok(())
    }

    async fn enrich(&self, movie: Movie) -> Movie {
        match self.catalog.details(movie.id).await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    movie_id = movie.id,
                    provider = self.catalog.name(),
                    "Failed to fetch movie details, storing without runtime"
                );
                movie
            }
        }
    }

    /// Removes a movie; removing an absent movie is not an error
    pub async fn remove(&self, movie_id: i64, user_id: &str) -> AppResult<()> {
        let removed = self.repository.remove(movie_id, user_id).await?;
        tracing::info!(user_id = %user_id, movie_id, removed, "Removed movie from watchlist");
        Ok(())
    }

    /// Moves an entry to `status`, deriving timestamp changes from `update`
    pub async fn update_status(
        &self,
        movie_id: i64,
        user_id: &str,
        status: WatchStatus,
        update: StatusUpdate,
    ) -> AppResult<()> {
        let change = StatusChange::derive(status, &update);
        let matched = self
            .repository
            .update_status(movie_id, user_id, &change)
            .await?;

        if matched {
            tracing::info!(user_id = %user_id, movie_id, status = %status, "Updated watchlist status");
        } else {
            tracing::debug!(user_id = %user_id, movie_id, "Status update matched no watchlist entry");
        }

        Ok(())
    }

    pub async fn list(&self, user_id: &str) -> AppResult<Vec<WatchlistEntry>> {
        self.repository.list(user_id).await
    }

    /// Entries with the given status; the status string must name one of the five states
    pub async fn list_by_status(&self, user_id: &str, status: &str) -> AppResult<Vec<WatchlistEntry>> {
        let status = status.parse::<WatchStatus>()?;
        self.repository.list_by_status(user_id, status).await
    }

    pub async fn exists(&self, movie_id: i64, user_id: &str) -> AppResult<bool> {
        self.repository.exists(movie_id, user_id).await
    }
}
