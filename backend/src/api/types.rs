//! REST API types for the interactive client.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::parser::Delimiter;
use crate::sync::{SyncMode, SyncReport};

/// Query string of `POST /api/sync`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQuery {
    #[serde(default)]
    pub dry_run: bool,

    /// `auto`, `tab` or one character; comma when absent
    #[serde(default)]
    pub delimiter: Delimiter,
}

impl SyncQuery {
    pub fn mode(&self) -> SyncMode {
        if self.dry_run {
            SyncMode::DryRun
        } else {
            SyncMode::Live
        }
    }
}

/// Response sent after a sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ok" or "error"
    pub status: String,

    /// Human-readable outcome
    pub message: String,

    pub mode: SyncMode,

    /// What was written
    pub report: SyncReport,
}

impl SyncResponse {
    pub fn completed(report: SyncReport, mode: SyncMode) -> Self {
        let message = match mode {
            SyncMode::Live => "Sync completed successfully",
            SyncMode::DryRun => "Dry run completed, nothing was sent",
        };
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: "ok".to_string(),
            message: message.to_string(),
            mode,
            report,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_query_mode() {
        let query: SyncQuery = serde_json::from_value(json!({ "dryRun": true })).unwrap();
        assert_eq!(query.mode(), SyncMode::DryRun);
        assert_eq!(SyncQuery::default().mode(), SyncMode::Live);
    }

    #[test]
    fn test_query_delimiter() {
        assert_eq!(SyncQuery::default().delimiter, Delimiter::Fixed(','));

        let query: SyncQuery = serde_json::from_value(json!({ "delimiter": "auto" })).unwrap();
        assert_eq!(query.delimiter, Delimiter::Detect);

        let query: SyncQuery = serde_json::from_value(json!({ "delimiter": ";" })).unwrap();
        assert_eq!(query.delimiter, Delimiter::Fixed(';'));

        assert!(serde_json::from_value::<SyncQuery>(json!({ "delimiter": "::" })).is_err());
    }

    #[test]
    fn test_completed_response_shape() {
        let response = SyncResponse::completed(SyncReport::started(Utc::now()), SyncMode::DryRun);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["status"], "ok");
        assert_eq!(value["mode"], "dryRun");
        assert!(Uuid::parse_str(value["jobId"].as_str().unwrap()).is_ok());
        assert!(value["report"].get("created").is_some());
    }

    #[test]
    fn test_error_response() {
        let value = error_response("CSV content is empty");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "CSV content is empty");
    }
}
