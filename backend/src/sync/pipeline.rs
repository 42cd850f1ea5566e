//! High-level entry points: load a CSV, then sync it.
//!
//! # Example
//!
//! ```rust,ignore
//! use listload::{sync_csv, Delimiter, SyncConfig, SyncMode};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SyncConfig::load("config.json")?;
//!     let report = sync_csv(&config, Path::new("lists.csv"), Delimiter::default(), SyncMode::Live).await?;
//!
//!     println!("{} lists written", report.write_count());
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::pause::{NoPause, TokioPause};
use super::reconcile::Reconciler;
use super::report::SyncReport;
use crate::api::logs::{log_info, log_success};
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::models::Dataset;
use crate::parser::{parse_csv_file_auto, parse_str_with, Delimiter, LoadResult};
use crate::remote::{DryRunApi, HttpListApi};

/// Whether writes reach the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncMode {
    /// Send every write and pause between them.
    #[default]
    Live,
    /// Fetch for real, log write payloads, send nothing, never pause.
    DryRun,
}

/// Sync an already loaded dataset.
pub async fn sync_dataset(
    config: &SyncConfig,
    dataset: &Dataset,
    mode: SyncMode,
) -> SyncResult<SyncReport> {
    let api = HttpListApi::from_config(config);
    let report = match mode {
        SyncMode::Live => Reconciler::new(api, TokioPause).run(dataset).await?,
        SyncMode::DryRun => {
            Reconciler::new(DryRunApi::new(api), NoPause)
                .run(dataset)
                .await?
        }
    };

    log_success(format!(
        "Sync completed: {} lists created, {} updated, {} full",
        report.created.len(),
        report.updated.len(),
        report.skipped_full.len()
    ));
    Ok(report)
}

/// Load a CSV file and sync it (file-driven variant).
pub async fn sync_csv(
    config: &SyncConfig,
    path: &Path,
    delimiter: Delimiter,
    mode: SyncMode,
) -> SyncResult<SyncReport> {
    log_info(format!("📖 Reading CSV file {}...", path.display()));
    let loaded = parse_csv_file_auto(path, delimiter)?;
    describe(&loaded);
    sync_dataset(config, &loaded.dataset, mode).await
}

/// Sync CSV content received directly (interactive variant).
pub async fn sync_csv_content(
    config: &SyncConfig,
    content: &str,
    delimiter: Delimiter,
    mode: SyncMode,
) -> SyncResult<SyncReport> {
    log_info("📖 Reading CSV content...");
    let loaded = parse_str_with(content, delimiter)?;
    describe(&loaded);
    sync_dataset(config, &loaded.dataset, mode).await
}

fn describe(loaded: &LoadResult) {
    log_success(format!(
        "Read {} rows, {} lists ({} items)",
        loaded.row_count,
        loaded.dataset.len(),
        loaded.dataset.item_count()
    ));
    log_info(format!("Lists: {}", loaded.headers.join(", ")));
}
