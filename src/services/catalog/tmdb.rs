//! TMDB (The Movie Database) catalog client
//!
//! Endpoints used:
//! - `/movie/popular` for the popular list
//! - `/search/movie` for title search
//! - `/movie/{id}` for details (runtime and genres are only present here)
//! - `/movie/{id}/reviews` for reviews

use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MoviePage, Review},
    services::catalog::CatalogClient,
};

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct ReviewsResponse {
    results: Vec<Review>,
}

impl TmdbClient {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Issues a GET against the TMDB API and decodes the JSON body
    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {} for {}: {}",
                status, path, body
            )));
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                "Failed to deserialize TMDB response"
            );
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl CatalogClient for TmdbClient {
    async fn popular(&self, page: u32) -> AppResult<MoviePage> {
        let page = page.to_string();
        let movies: MoviePage = self
            .get("/movie/popular", &[("page", page.as_str())])
            .await?;

        tracing::debug!(
            page = movies.page,
            results = movies.results.len(),
            provider = "tmdb",
            "Popular movies fetched"
        );

        Ok(movies)
    }

    async fn search(&self, query: &str, page: u32) -> AppResult<MoviePage> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Query parameter is required".to_string(),
            ));
        }

        let page = page.to_string();
        let movies: MoviePage = self
            .get(
                "/search/movie",
                &[
                    ("query", query),
                    ("page", page.as_str()),
                    ("include_adult", "false"),
                ],
            )
            .await?;

        tracing::debug!(
            query = %query,
            results = movies.results.len(),
            provider = "tmdb",
            "Movie search completed"
        );

        Ok(movies)
    }

    async fn details(&self, movie_id: i64) -> AppResult<Movie> {
        let movie: Movie = self
            .get(
                &format!("/movie/{}", movie_id),
                &[("append_to_response", "credits,videos")],
            )
            .await?;

        tracing::debug!(
            movie_id = movie_id,
            runtime = ?movie.runtime,
            provider = "tmdb",
            "Movie details fetched"
        );

        Ok(movie)
    }

    async fn reviews(&self, movie_id: i64) -> AppResult<Vec<Review>> {
        let response: ReviewsResponse = self
            .get(
                &format!("/movie/{}/reviews", movie_id),
                &[("language", "en-US"), ("page", "1")],
            )
            .await?;

        tracing::debug!(
            movie_id = movie_id,
            reviews = response.results.len(),
            provider = "tmdb",
            "Movie reviews fetched"
        );

        Ok(response.results)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
