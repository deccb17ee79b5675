use crate::{
    error::AppResult,
    models::{WatchStats, WatchlistEntry},
    services::watchlist::WatchlistStore,
};

/// Number of entries shown as recent activity on the profile
pub const RECENT_ENTRIES: usize = 5;

/// Summary statistics over the user's current watchlist, recomputed on every call
pub async fn compute_stats(store: &WatchlistStore, user_id: &str) -> AppResult<WatchStats> {
    let entries = store.list(user_id).await?;
    Ok(WatchStats::from_entries(&entries))
}

/// Stats plus the most recently added entries, newest first
pub async fn profile_overview(
    store: &WatchlistStore,
    user_id: &str,
) -> AppResult<(WatchStats, Vec<WatchlistEntry>)> {
    let entries = store.list(user_id).await?;
    let stats = WatchStats::from_entries(&entries);
    let recent = entries.into_iter().rev().take(RECENT_ENTRIES).collect();
    Ok((stats, recent))
}
