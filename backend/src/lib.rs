//! # Store Monitor
//!
//! Uptime and downtime reporting for a fleet of stores.
//!
//! Stores are polled irregularly for an `active` / `inactive` status. This
//! crate turns those sparse polls into per-store uptime and downtime figures
//! for the last hour, day and week, counted only while each store is
//! scheduled to be open in its own local timezone.
//!
//! ## Architecture
//!
//! - [`models`]: Domain types (stores, observations, periods, report rows)
//! - [`db`]: Reference-data repository trait and in-memory implementation
//! - [`io`]: CSV ingestion and report persistence
//! - [`services`]: Timeline building, business windows, reconciliation,
//!   aggregation and background report jobs
//! - [`config`]: TOML and environment configuration
//! - [`http`]: Axum-based REST API (feature `http-server`)
//!
//! ## Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use store_monitor::models::{StatusObservation, StoreReference, StoreStatus};
//! use store_monitor::services::{compute_store_metrics, InterpolationPolicy};
//!
//! let now = Utc.with_ymd_and_hms(2023, 1, 25, 18, 0, 0).unwrap();
//! let mut store = StoreReference::new("42");
//! store.observations.push(StatusObservation::new("42", now - Duration::minutes(90), StoreStatus::Active));
//!
//! let metrics = compute_store_metrics(&store, now, InterpolationPolicy::ForwardFill, "America/Chicago").unwrap();
//! assert_eq!(metrics.last_hour.uptime, Duration::minutes(60));
//! ```

// RepositoryError carries rich context for debugging.
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod io;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
