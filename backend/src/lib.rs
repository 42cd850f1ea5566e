//! # Listload - upload CSV columns as remote keyword lists
//!
//! Each CSV column becomes a list on a remote list-management API: the
//! header is the list label, the non-empty cells are its entities. Lists
//! already on the service are extended up to their capacity of 50 entities;
//! columns with no matching list create one.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Reconcile  │────▶│  List API   │
//! │  (ISO/UTF8) │     │ (≤ 50 rows) │     │ (per column)│     │ (POST/PUT)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                ▲
//!                                   GET ?details=true (once)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use listload::{sync_csv, Delimiter, SyncConfig, SyncMode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SyncConfig::load("config.json").unwrap();
//!     let report = sync_csv(&config, "lists.csv".as_ref(), Delimiter::default(), SyncMode::Live).await.unwrap();
//!     println!("Created {} lists", report.created.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per phase
//! - [`models`] - Dataset, Collection, Entity
//! - [`config`] - Config file and environment overrides
//! - [`parser`] - CSV loading with auto-detection
//! - [`remote`] - List API client
//! - [`sync`] - Reconciliation and pipeline
//! - [`api`] - HTTP API server and logs

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;

// Parsing
pub mod parser;

// Remote API
pub mod remote;

// Reconciliation
pub mod sync;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, ParseError, RemoteError, SyncError, WriteOp};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Collection,
    Column,
    Dataset,
    Entity,
    CAPACITY,
    COLLECTION_KIND,
    ENTITY_KIND,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{SyncConfig, DEFAULT_CONFIG_PATH};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    parse_csv,
    parse_str,
    parse_str_with,
    parse_bytes_auto,
    parse_csv_file_auto,
    detect_encoding,
    detect_delimiter,
    decode_content,
    Delimiter,
    LoadResult,
    MAX_ROWS,
};

// =============================================================================
// Re-exports - Remote API
// =============================================================================

pub use remote::{DryRunApi, HttpListApi, ListApi};

// =============================================================================
// Re-exports - Sync
// =============================================================================

pub use sync::{
    sync_csv,
    sync_csv_content,
    sync_dataset,
    build_entities,
    fill_from_front,
    matching_collections,
    Reconciler,
    SyncMode,
    SyncReport,
    WriteSummary,
    Pause,
    TokioPause,
    NoPause,
    WRITE_COOLDOWN,
};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
