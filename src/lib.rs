//! Run Tracking API
//!
//! A GraphQL read surface over the log of pipeline runs, translating stored
//! run blobs into the typed shape the experiment-tracking front-end queries.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server mounting a single GraphQL endpoint
//! - **Persistence**: `RunStore` providers over SQLite or Postgres (sqlx)
//! - **Runs**: safe blob decoding, run formatting and the query service
//!
//! # Modules
//!
//! - [`api`]: GraphQL schema, endpoint and health probe
//! - [`config`]: Layered configuration (defaults, file, env, CLI)
//! - [`persistence`]: Run store trait and providers
//! - [`runs`]: Blob decoding, formatting and the query service
//! - [`telemetry`]: Logging setup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod api;
pub mod config;
pub mod persistence;
pub mod runs;
pub mod server;
pub mod telemetry;

use crate::config::AppConfig;
use runs::RunQueryService;
use std::sync::Arc;

/// Application state shared by the router.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Query service over the injected run store.
    pub runs: RunQueryService,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
