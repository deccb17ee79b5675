use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{StatusUpdate, WatchStats, WatchStatus, WatchlistEntry},
    services::stats::compute_stats,
};

use super::{parse_body, parse_movie_id, success};

#[derive(Debug, Default, Deserialize)]
struct AddRequest {
    #[serde(default)]
    status: Option<Value>,
}

// Fields stay untyped so a wrong JSON type is a 400, not a decode failure
#[derive(Debug, Default, Deserialize)]
struct UpdateStatusRequest {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    started_at: Option<Value>,
    #[serde(default)]
    completed_at: Option<Value>,
    // Accepted for client compatibility; not persisted
    #[serde(default)]
    rating: Option<Value>,
    #[serde(default)]
    notes: Option<Value>,
}

/// Reads an optional string field; `null` counts as absent
fn string_field<'a>(field: &str, value: Option<&'a Value>) -> AppResult<Option<&'a str>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(AppError::InvalidInput(format!("{} must be a string", field))),
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC)
fn parse_timestamp(field: &str, raw: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| Some(date.and_time(NaiveTime::MIN).and_utc()))
        .map_err(|_| {
            AppError::InvalidInput(format!(
                "{} must be an RFC 3339 timestamp or a YYYY-MM-DD date",
                field
            ))
        })
}

/// Handler for the caller's full watchlist
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<WatchlistEntry>>> {
    let entries = state.watchlist.list(auth.id()).await?;
    Ok(Json(entries))
}

/// Handler for the caller's aggregate watch statistics
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<WatchStats>> {
    let stats = compute_stats(&state.watchlist, auth.id()).await?;
    Ok(Json(stats))
}

/// Handler adding a catalog movie to the caller's watchlist
pub async fn add(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let movie_id = parse_movie_id(&id)?;
    let request: AddRequest = parse_body(&body)?;

    // Non-string statuses are ignored
    let status = match request.status {
        Some(Value::String(status)) if !status.is_empty() => status.parse::<WatchStatus>()?,
        _ => WatchStatus::default(),
    };

    if state.watchlist.exists(movie_id, auth.id()).await? {
        return Err(AppError::Conflict(format!(
            "Movie {} is already in the watchlist",
            movie_id
        )));
    }

    let movie = state.catalog.details(movie_id).await?;
    state.watchlist.add(movie, auth.id(), status).await?;

    Ok(success())
}

/// Handler for status transitions
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let movie_id = parse_movie_id(&id)?;
    let request: UpdateStatusRequest = parse_body(&body)?;

    let status = string_field("status", request.status.as_ref())?
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Status is required".to_string()))?
        .parse::<WatchStatus>()?;

    let update = StatusUpdate {
        started_at: parse_timestamp(
            "started_at",
            string_field("started_at", request.started_at.as_ref())?,
        )?,
        completed_at: parse_timestamp(
            "completed_at",
            string_field("completed_at", request.completed_at.as_ref())?,
        )?,
    };

    if request.rating.is_some() || request.notes.is_some() {
        tracing::debug!(movie_id, "Ignoring rating/notes on status update");
    }

    state
        .watchlist
        .update_status(movie_id, auth.id(), status, update)
        .await?;

    Ok(success())
}

/// Handler removing a movie from the caller's watchlist
pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let movie_id = parse_movie_id(&id)?;
    state.watchlist.remove(movie_id, auth.id()).await?;
    Ok(success())
}

/// Handler for membership checks
pub async fn check(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let movie_id = parse_movie_id(&id)?;
    let in_watchlist = state.watchlist.exists(movie_id, auth.id()).await?;
    Ok(Json(json!({ "isInWatchlist": in_watchlist })))
}

/// Handler for the caller's entries with one status
pub async fn list_by_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(status): Path<String>,
) -> AppResult<Json<Vec<WatchlistEntry>>> {
    let entries = state.watchlist.list_by_status(auth.id(), &status).await?;
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_body_empty_is_default() {
        let request: AddRequest = parse_body(&Bytes::new()).unwrap();
        assert!(request.status.is_none());

        let request: AddRequest = parse_body(&Bytes::from_static(b"  \n")).unwrap();
        assert!(request.status.is_none());
    }

    #[test]
    fn test_parse_body_malformed() {
        let result: AppResult<AddRequest> = parse_body(&Bytes::from_static(b"{status:"));
        assert!(matches!(result, Err(AppError::MalformedBody(_))));
    }

    #[test]
    fn test_update_request_accepts_any_field_types() {
        let request: UpdateStatusRequest =
            parse_body(&Bytes::from_static(br#"{"status": 5, "started_at": 1709251200}"#))
                .unwrap();

        assert!(matches!(
            string_field("status", request.status.as_ref()),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            string_field("started_at", request.started_at.as_ref()),
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(string_field("completed_at", request.completed_at.as_ref()).unwrap(), None);
        assert_eq!(string_field("status", Some(&Value::Null)).unwrap(), None);
        assert_eq!(
            string_field("status", Some(&json!("watching"))).unwrap(),
            Some("watching")
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(
            parse_timestamp("started_at", Some("2024-03-01T20:15:00Z")).unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 20, 15, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("started_at", Some("2024-03-01T21:15:00+01:00")).unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 20, 15, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("started_at", Some("2024-03-01")).unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("started_at", Some("")).unwrap(), None);
        assert_eq!(parse_timestamp("started_at", None).unwrap(), None);
        assert!(matches!(
            parse_timestamp("completed_at", Some("yesterday")),
            Err(AppError::InvalidInput(_))
        ));
    }
}
