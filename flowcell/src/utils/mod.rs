//! UUID and timestamp helpers for run identity and event payloads.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity stamped onto a single pipeline run, carried in event payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStamp {
    /// The unique ID for this run.
    pub run_id: Uuid,
    /// When the run entered its scope, ISO 8601.
    pub started_at: String,
}

impl RunStamp {
    /// Creates a stamp with a fresh run ID and the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: generate_uuid(),
            started_at: iso_timestamp(),
        }
    }
}

impl Default for RunStamp {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates a new UUID v4, used as a per-run identity.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Generates a new UUID v7 (time-ordered), for callers that want runs to
/// sort by creation time.
#[must_use]
pub fn generate_uuid_v7() -> Uuid {
    Uuid::now_v7()
}

/// Returns the current UTC time as an ISO 8601 formatted string:
/// `YYYY-MM-DDTHH:MM:SS.ffffff+00:00`.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}
