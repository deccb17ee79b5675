use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// Personal watch state of a watchlist entry
///
/// Any status may transition directly to any other; entries start in `Planning`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    #[default]
    Planning,
    Watching,
    Completed,
    OnHold,
    Dropped,
}

impl WatchStatus {
    pub const ALL: [WatchStatus; 5] = [
        WatchStatus::Planning,
        WatchStatus::Watching,
        WatchStatus::Completed,
        WatchStatus::OnHold,
        WatchStatus::Dropped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::Planning => "planning",
            WatchStatus::Watching => "watching",
            WatchStatus::Completed => "completed",
            WatchStatus::OnHold => "on_hold",
            WatchStatus::Dropped => "dropped",
        }
    }
}

impl Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WatchStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput("Valid status is required".to_string()))
    }
}

/// A movie on a user's watchlist, with the catalog fields copied at add time
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WatchlistEntry {
    #[serde(rename = "id")]
    pub movie_id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: String,
    pub overview: String,
    pub vote_average: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    pub added_at: DateTime<Utc>,
    pub status: WatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Vote averages are persisted as integer tenths
pub fn scale_vote_average(vote_average: Option<f64>) -> i64 {
    vote_average
        .map(|value| (value * 10.0).round() as i64)
        .unwrap_or(0)
}

pub fn unscale_vote_average(stored: Option<i64>) -> f64 {
    stored.map(|value| value as f64 / 10.0).unwrap_or(0.0)
}

/// Explicit timestamps supplied alongside a status change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// What a status change does to one optional column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T: Copy> FieldUpdate<T> {
    /// Whether the stored column gets overwritten
    pub fn overwrites(&self) -> bool {
        !matches!(self, FieldUpdate::Keep)
    }

    /// Value written when the column is overwritten
    pub fn value(&self) -> Option<T> {
        match self {
            FieldUpdate::Set(value) => Some(*value),
            FieldUpdate::Keep | FieldUpdate::Clear => None,
        }
    }
}

/// A fully resolved status transition, ready to persist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: WatchStatus,
    pub started_at: FieldUpdate<DateTime<Utc>>,
    pub completed_at: FieldUpdate<DateTime<Utc>>,
}

impl StatusChange {
    /// Resolves the timestamp side effects of moving to `status`.
    ///
    /// Explicit timestamps always win. Otherwise `completed_at` is cleared for
    /// every status but `Completed`, and `started_at` is cleared on `Planning`.
    pub fn derive(status: WatchStatus, update: &StatusUpdate) -> Self {
        let completed_at = match update.completed_at {
            Some(at) => FieldUpdate::Set(at),
            None if status != WatchStatus::Completed => FieldUpdate::Clear,
            None => FieldUpdate::Keep,
        };

        let started_at = match update.started_at {
            Some(at) => FieldUpdate::Set(at),
            None if status == WatchStatus::Planning => FieldUpdate::Clear,
            None => FieldUpdate::Keep,
        };

        Self {
            status,
            started_at,
            completed_at,
        }
    }
}

/// Summary statistics over one user's watchlist
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WatchStats {
    pub total_movies: u64,
    pub completed_count: u64,
    pub total_watched_minutes: u64,
    pub total_hours: u64,
}

impl WatchStats {
    pub fn from_entries(entries: &[WatchlistEntry]) -> Self {
        let (completed_count, total_watched_minutes) =
            entries
                .iter()
                .fold((0u64, 0u64), |(completed, minutes), entry| {
                    let completed = completed + u64::from(entry.completed_at.is_some());
                    let minutes = match (entry.status, entry.runtime) {
                        (WatchStatus::Completed, Some(runtime)) => minutes + u64::from(runtime),
                        _ => minutes,
                    };
                    (completed, minutes)
                });

        Self {
            total_movies: entries.len() as u64,
            completed_count,
            total_watched_minutes,
            total_hours: (total_watched_minutes as f64 / 60.0).round() as u64,
        }
    }
}
