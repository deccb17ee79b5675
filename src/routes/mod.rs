use axum::{
    body::Bytes,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    middleware::{make_span_with_request_id, request_id_middleware},
};

pub mod auth;
pub mod movies;
pub mod profile;
pub mod watchlist;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// CORS for browser clients on other origins; credentials are allowed so the
/// session cookie is sent
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/movies/popular", get(movies::popular))
        .route("/movies/search", get(movies::search))
        .route("/movies/:id", get(movies::details))
        .route("/movies/:id/reviews", get(movies::reviews))
        // Watchlist
        .route("/watchlist", get(watchlist::list))
        .route("/watchlist/stats", get(watchlist::stats))
        .route(
            "/watchlist/:id",
            post(watchlist::add)
                .patch(watchlist::update_status)
                .delete(watchlist::remove),
        )
        .route("/watchlist/check/:id", get(watchlist::check))
        .route("/watchlist/status/:status", get(watchlist::list_by_status))
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/profile", get(profile::profile))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Body of every successful mutation
fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// Decodes an optional JSON body; an empty body yields the default.
///
/// Bodies are read as raw bytes so that every decoding failure goes through
/// `AppError` instead of axum's plain-text rejection.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::MalformedBody(e.to_string()))
}

/// Parses the `:id` path segment as a catalog movie id
fn parse_movie_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::InvalidInput("Movie ID is required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[test]
    fn test_parse_movie_id() {
        assert_eq!(parse_movie_id("27205").unwrap(), 27205);
        assert!(matches!(parse_movie_id(""), Err(AppError::InvalidInput(_))));
        assert!(matches!(parse_movie_id("abc"), Err(AppError::InvalidInput(_))));
        assert!(matches!(parse_movie_id("-4"), Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app: Router = Router::new()
            .route("/health", get(health_check))
            .layer(cors_layer(&["http://localhost:5173".to_string()]));

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );

        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://elsewhere.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
