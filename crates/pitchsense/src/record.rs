//! The analysis record entity and its status state machine.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an analysis record.
///
/// `pending` is the initial state. `done` and `error` are terminal: once
/// reached, no further transition is permitted. Moving through
/// `processing` is optional for a worker that treats the whole job as
/// atomic, but leaves visible evidence if the worker crashes mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Done,
    Error,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Done => "done",
            AnalysisStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AnalysisStatus::Pending),
            "processing" => Some(AnalysisStatus::Processing),
            "done" => Some(AnalysisStatus::Done),
            "error" => Some(AnalysisStatus::Error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Done | AnalysisStatus::Error)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    /// Transitions are monotonic; terminal states admit nothing.
    pub fn can_transition_to(&self, next: AnalysisStatus) -> bool {
        use AnalysisStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Done) | (Pending, Error) | (Processing, Done) | (Processing, Error)
        )
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The durable entity tracking one uploaded pitch deck's processing
/// lifecycle and outcome.
///
/// `result` is present iff `status == done`; `error_detail` is present
/// iff `status == error`. The repository enforces this by writing status
/// and payload in a single statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub analysis_id: String,
    pub owner_id: String,
    /// Opaque locator of the stored source file (bucket path).
    pub file_id: String,
    /// Retrievable URL for the stored source file.
    pub file_path: String,
    pub content_type: String,
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Creates a fresh `pending` record for a newly stored upload.
    pub fn new(owner_id: &str, file_id: &str, file_path: &str, content_type: &str) -> Self {
        let now = Utc::now();
        Self {
            analysis_id: format!("analysis_{}", uuid::Uuid::new_v4()),
            owner_id: owner_id.to_string(),
            file_id: file_id.to_string(),
            file_path: file_path.to_string(),
            content_type: content_type.to_string(),
            status: AnalysisStatus::Pending,
            result: None,
            error_detail: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Canonical timestamp encoding used throughout the record store.
/// Millisecond precision keeps encoded strings lexicographically
/// comparable, which the stale-pending sweep relies on.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
