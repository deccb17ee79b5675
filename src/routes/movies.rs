use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Movie, MoviePage, Review},
};

use super::parse_movie_id;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: Option<String>,
    page: Option<String>,
}

/// Missing page means the first page
fn parse_page(raw: Option<&str>) -> AppResult<u32> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(1),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|page| *page >= 1)
            .ok_or_else(|| AppError::InvalidInput("Page must be a positive integer".to_string())),
    }
}

/// Handler for the popular movies list
pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<MoviePage>> {
    let page = parse_page(params.page.as_deref())?;
    let movies = state.catalog.popular(page).await?;
    Ok(Json(movies))
}

/// Handler for movie search; responds with the result list only
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let query = params
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Query parameter is required".to_string()))?;
    let page = parse_page(params.page.as_deref())?;

    tracing::info!(request_id = %request_id, query = %query, page, "Searching movies");

    let movies = state.catalog.search(&query, page).await?;
    Ok(Json(movies.results))
}

/// Handler for movie details
pub async fn details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Movie>> {
    let movie_id = parse_movie_id(&id)?;
    let movie = state.catalog.details(movie_id).await?;
    Ok(Json(movie))
}

/// Handler for movie reviews
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Review>>> {
    let movie_id = parse_movie_id(&id)?;
    let reviews = state.catalog.reviews(movie_id).await?;
    Ok(Json(reviews))
}
