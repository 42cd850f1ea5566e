//! Sync module.
//!
//! Uploads dataset columns as remote lists:
//! - Reconcile: matching, entity construction, create and update paths
//! - Pause: cool-down between writes
//! - Report: what a run did
//! - Pipeline: CSV in, report out

pub mod pause;
pub mod pipeline;
pub mod reconcile;
pub mod report;

pub use pause::{NoPause, Pause, TokioPause, WRITE_COOLDOWN};
pub use pipeline::{sync_csv, sync_csv_content, sync_dataset, SyncMode};
pub use reconcile::{build_entities, fill_from_front, matching_collections, Reconciler};
pub use report::{SyncReport, WriteSummary};
