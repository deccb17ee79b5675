pub mod sqlite;
pub mod users;
pub mod watchlist;

pub use sqlite::{create_in_memory_pool, create_pool, run_migrations};
pub use users::{SessionRecord, UserCredentials, UserRepository};
pub use watchlist::{SqliteWatchlistRepository, WatchlistRepository};
