use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::{
        watchlist::{scale_vote_average, unscale_vote_average},
        Movie, StatusChange, WatchStatus, WatchlistEntry,
    },
};

/// Storage for per-user watchlist entries, keyed by (user, movie)
///
/// Every method is scoped to the given user id; implementations never read or
/// touch another user's rows.
#[async_trait::async_trait]
pub trait WatchlistRepository: Send + Sync {
    /// Inserts a new entry. A duplicate (user, movie) pair fails with `Conflict`.
    async fn add(&self, movie: &Movie, user_id: &str, status: WatchStatus) -> AppResult<()>;

    /// Deletes the entry, returning whether one existed
    async fn remove(&self, movie_id: i64, user_id: &str) -> AppResult<bool>;

    /// Applies a resolved status change, returning whether an entry matched
    async fn update_status(
        &self,
        movie_id: i64,
        user_id: &str,
        change: &StatusChange,
    ) -> AppResult<bool>;

    /// All entries, oldest first
    async fn list(&self, user_id: &str) -> AppResult<Vec<WatchlistEntry>>;

    /// Entries with exactly `status`, oldest first
    async fn list_by_status(
        &self,
        user_id: &str,
        status: WatchStatus,
    ) -> AppResult<Vec<WatchlistEntry>>;

    async fn exists(&self, movie_id: i64, user_id: &str) -> AppResult<bool>;
}

const SELECT_COLUMNS: &str = r#"
    SELECT movie_id, title, poster_path, backdrop_path, release_date, overview,
           vote_average, runtime, added_at, status, started_at, completed_at
    FROM watchlist
"#;

#[derive(Debug, sqlx::FromRow)]
struct WatchlistRow {
    movie_id: i64,
    title: String,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    vote_average: Option<i64>,
    runtime: Option<i64>,
    added_at: DateTime<Utc>,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<WatchlistRow> for WatchlistEntry {
    type Error = AppError;

    fn try_from(row: WatchlistRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<WatchStatus>().map_err(|_| {
            AppError::Internal(format!(
                "Unknown status '{}' stored for movie {}",
                row.status, row.movie_id
            ))
        })?;

        Ok(WatchlistEntry {
            movie_id: row.movie_id,
            title: row.title,
            poster_path: row.poster_path,
            backdrop_path: row.backdrop_path,
            release_date: row.release_date.unwrap_or_default(),
            overview: row.overview.unwrap_or_default(),
            vote_average: unscale_vote_average(row.vote_average),
            runtime: row
                .runtime
                .and_then(|minutes| u32::try_from(minutes).ok())
                .filter(|minutes| *minutes > 0),
            added_at: row.added_at,
            status,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}

fn into_entries(rows: Vec<WatchlistRow>) -> AppResult<Vec<WatchlistEntry>> {
    rows.into_iter().map(WatchlistEntry::try_from).collect()
}

/// SQLite-backed watchlist repository
#[derive(Clone)]
pub struct SqliteWatchlistRepository {
    pool: SqlitePool,
}

impl SqliteWatchlistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WatchlistRepository for SqliteWatchlistRepository {
    async fn add(&self, movie: &Movie, user_id: &str, status: WatchStatus) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO watchlist (
                movie_id, title, poster_path, vote_average, backdrop_path,
                release_date, overview, runtime, added_at, status, user_id
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(movie.id)
        .bind(&movie.title)
        .bind(&movie.poster_path)
        .bind(scale_vote_average(movie.vote_average))
        .bind(&movie.backdrop_path)
        .bind(&movie.release_date)
        .bind(&movie.overview)
        .bind(movie.runtime.map(i64::from))
        .bind(Utc::now())
        .bind(status.as_str())
        .bind(user_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                format!("Movie {} is already in the watchlist", movie.id),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, movie_id: i64, user_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM watchlist WHERE movie_id = ? AND user_id = ?")
            .bind(movie_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_status(
        &self,
        movie_id: i64,
        user_id: &str,
        change: &StatusChange,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE watchlist
            SET status = ?,
                started_at = CASE WHEN ? THEN ? ELSE started_at END,
                completed_at = CASE WHEN ? THEN ? ELSE completed_at END
            WHERE movie_id = ? AND user_id = ?
            "#,
        )
        .bind(change.status.as_str())
        .bind(change.started_at.overwrites())
        .bind(change.started_at.value())
        .bind(change.completed_at.overwrites())
        .bind(change.completed_at.value())
        .bind(movie_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, user_id: &str) -> AppResult<Vec<WatchlistEntry>> {
        let rows = sqlx::query_as::<_, WatchlistRow>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? ORDER BY added_at ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_entries(rows)
    }

    async fn list_by_status(
        &self,
        user_id: &str,
        status: WatchStatus,
    ) -> AppResult<Vec<WatchlistEntry>> {
        let rows = sqlx::query_as::<_, WatchlistRow>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND status = ? ORDER BY added_at ASC, id ASC"
        ))
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_entries(rows)
    }

    async fn exists(&self, movie_id: i64, user_id: &str) -> AppResult<bool> {
        let found: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM watchlist WHERE movie_id = ? AND user_id = ? LIMIT 1")
                .bind(movie_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_in_memory_pool;
    use crate::models::{FieldUpdate, StatusUpdate};
    use chrono::TimeZone;

    async fn repository() -> SqliteWatchlistRepository {
        SqliteWatchlistRepository::new(create_in_memory_pool().await.unwrap())
    }

    fn movie(id: i64, title: &str, runtime: Option<u32>) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            poster_path: Some(format!("/{id}.jpg")),
            backdrop_path: None,
            release_date: "2010-07-16".to_string(),
            overview: "Overview".to_string(),
            vote_average: Some(7.83),
            runtime,
            genres: None,
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let repo = repository().await;
        repo.add(&movie(27205, "Inception", Some(148)), "alice", WatchStatus::Planning)
            .await
            .unwrap();

        let entries = repo.list("alice").await.unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.movie_id, 27205);
        assert_eq!(entry.title, "Inception");
        assert_eq!(entry.status, WatchStatus::Planning);
        assert_eq!(entry.runtime, Some(148));
        assert_eq!(entry.vote_average, 7.8);
        assert_eq!(entry.poster_path.as_deref(), Some("/27205.jpg"));
        assert_eq!(entry.started_at, None);
        assert_eq!(entry.completed_at, None);
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let repo = repository().await;
        for (id, title) in [(3, "Third"), (1, "First"), (2, "Second")] {
            repo.add(&movie(id, title, None), "alice", WatchStatus::Planning)
                .await
                .unwrap();
        }

        let ids: Vec<i64> = repo
            .list("alice")
            .await
            .unwrap()
            .iter()
            .map(|e| e.movie_id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_duplicate_add_is_conflict() {
        let repo = repository().await;
        repo.add(&movie(1, "Heat", None), "alice", WatchStatus::Planning)
            .await
            .unwrap();

        let result = repo
            .add(&movie(1, "Heat", None), "alice", WatchStatus::Watching)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        // Other users are unaffected by the uniqueness constraint
        repo.add(&movie(1, "Heat", None), "bob", WatchStatus::Planning)
            .await
            .unwrap();
        assert_eq!(repo.list("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_entries_are_scoped_to_owner() {
        let repo = repository().await;
        repo.add(&movie(1, "Heat", None), "alice", WatchStatus::Planning)
            .await
            .unwrap();

        assert!(repo.list("bob").await.unwrap().is_empty());
        assert!(!repo.exists(1, "bob").await.unwrap());
        assert!(!repo.remove(1, "bob").await.unwrap());

        let change = StatusChange::derive(WatchStatus::Dropped, &StatusUpdate::default());
        assert!(!repo.update_status(1, "bob", &change).await.unwrap());

        let entries = repo.list("alice").await.unwrap();
        assert_eq!(entries[0].status, WatchStatus::Planning);
    }

    #[tokio::test]
    async fn test_remove_and_exists() {
        let repo = repository().await;
        assert!(!repo.exists(7, "alice").await.unwrap());

        repo.add(&movie(7, "Se7en", None), "alice", WatchStatus::Planning)
            .await
            .unwrap();
        assert!(repo.exists(7, "alice").await.unwrap());

        assert!(repo.remove(7, "alice").await.unwrap());
        assert!(!repo.exists(7, "alice").await.unwrap());
        assert!(!repo.remove(7, "alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_status_writes_and_clears_timestamps() {
        let repo = repository().await;
        repo.add(&movie(1, "Heat", Some(170)), "alice", WatchStatus::Planning)
            .await
            .unwrap();

        let started = Utc.with_ymd_and_hms(2024, 1, 5, 19, 30, 0).unwrap();
        let completed = Utc.with_ymd_and_hms(2024, 1, 5, 22, 20, 0).unwrap();
        let change = StatusChange {
            status: WatchStatus::Completed,
            started_at: FieldUpdate::Set(started),
            completed_at: FieldUpdate::Set(completed),
        };
        assert!(repo.update_status(1, "alice", &change).await.unwrap());

        let entry = repo.list("alice").await.unwrap().remove(0);
        assert_eq!(entry.status, WatchStatus::Completed);
        assert_eq!(entry.started_at, Some(started));
        assert_eq!(entry.completed_at, Some(completed));

        // Keep leaves started_at alone while completed_at is cleared
        let change = StatusChange {
            status: WatchStatus::Watching,
            started_at: FieldUpdate::Keep,
            completed_at: FieldUpdate::Clear,
        };
        repo.update_status(1, "alice", &change).await.unwrap();

        let entry = repo.list("alice").await.unwrap().remove(0);
        assert_eq!(entry.status, WatchStatus::Watching);
        assert_eq!(entry.started_at, Some(started));
        assert_eq!(entry.completed_at, None);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let repo = repository().await;
        repo.add(&movie(1, "Heat", None), "alice", WatchStatus::Planning)
            .await
            .unwrap();
        repo.add(&movie(2, "Ronin", None), "alice", WatchStatus::Watching)
            .await
            .unwrap();
        repo.add(&movie(3, "Thief", None), "alice", WatchStatus::Watching)
            .await
            .unwrap();

        let watching = repo
            .list_by_status("alice", WatchStatus::Watching)
            .await
            .unwrap();
        let ids: Vec<i64> = watching.iter().map(|e| e.movie_id).collect();
        assert_eq!(ids, vec![2, 3]);

        assert!(repo
            .list_by_status("alice", WatchStatus::Dropped)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_absent_vote_average_reads_back_as_zero() {
        let repo = repository().await;
        let mut unrated = movie(9, "Unrated", None);
        unrated.vote_average = None;
        repo.add(&unrated, "alice", WatchStatus::Planning)
            .await
            .unwrap();

        let entry = repo.list("alice").await.unwrap().remove(0);
        assert_eq!(entry.vote_average, 0.0);
        assert_eq!(entry.runtime, None);
    }
}
