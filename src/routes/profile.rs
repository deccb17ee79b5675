use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    api::AppState,
    error::AppResult,
    middleware::AuthUser,
    models::{User, WatchStats, WatchlistEntry},
    services::stats,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: User,
    pub stats: WatchStats,
    pub recent_movies: Vec<WatchlistEntry>,
}

/// Handler for the caller's profile: account, stats and recent additions
pub async fn profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<ProfileResponse>> {
    let (stats, recent_movies) = stats::profile_overview(&state.watchlist, auth.id()).await?;

    Ok(Json(ProfileResponse {
        user: auth.user,
        stats,
        recent_movies,
    }))
}
