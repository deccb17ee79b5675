//! Personal movie watchlist service: catalog browsing backed by TMDB and
//! per-user watch tracking backed by SQLite.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
