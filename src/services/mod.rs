pub mod auth;
pub mod catalog;
pub mod stats;
pub mod watchlist;

pub use auth::{AuthService, IssuedSession};
pub use catalog::{CatalogClient, TmdbClient};
pub use watchlist::WatchlistStore;
