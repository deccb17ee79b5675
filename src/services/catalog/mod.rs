//! Movie catalog abstraction
//!
//! The catalog is the read-only source of movie metadata. Handlers and the
//! watchlist store only talk to it through `CatalogClient`, so tests can swap
//! in a mock and production uses `TmdbClient`.

use crate::{
    error::AppResult,
    models::{Movie, MoviePage, Review},
};

pub mod tmdb;

pub use tmdb::TmdbClient;

/// Trait for movie catalog providers
///
/// Every call is a single attempt with no retry; callers decide what a failure means.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    /// Popular movies, one page at a time (pages start at 1)
    async fn popular(&self, page: u32) -> AppResult<MoviePage>;

    /// Search movies by title, excluding adult content
    async fn search(&self, query: &str, page: u32) -> AppResult<MoviePage>;

    /// Full movie details, including runtime and genres
    async fn details(&self, movie_id: i64) -> AppResult<Movie>;

    /// First page of English-language reviews
    async fn reviews(&self, movie_id: i64) -> AppResult<Vec<Review>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
