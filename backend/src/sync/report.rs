//! Outcome of a completed sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Collection;

/// One write that the service accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteSummary {
    pub label: String,
    pub id: Option<String>,
    /// Entities carried by the request body
    pub entity_count: usize,
}

impl WriteSummary {
    pub fn of(collection: &Collection) -> Self {
        Self {
            label: collection.label.clone(),
            id: collection.id.clone(),
            entity_count: collection.entities.len(),
        }
    }
}

/// What a run did, column by column.
///
/// Only returned when every write succeeded; a failed run yields its error
/// instead, whatever it had already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Non-empty columns handled
    pub columns_processed: usize,
    /// Columns with no items, left alone
    pub empty_columns: Vec<String>,
    pub created: Vec<WriteSummary>,
    pub updated: Vec<WriteSummary>,
    /// Matched lists already at capacity
    pub skipped_full: Vec<String>,
}

impl SyncReport {
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            started_at: at,
            finished_at: None,
            columns_processed: 0,
            empty_columns: Vec::new(),
            created: Vec::new(),
            updated: Vec::new(),
            skipped_full: Vec::new(),
        }
    }

    /// Requests sent to the service.
    pub fn write_count(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    /// Entities carried by all requests.
    pub fn entity_count(&self) -> usize {
        self.created
            .iter()
            .chain(&self.updated)
            .map(|w| w.entity_count)
            .sum()
    }
}
