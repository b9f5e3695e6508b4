//! The queue-resident work item describing one analysis to process.

use serde::{Deserialize, Serialize};

use crate::record::AnalysisRecord;

/// Processing job message. Transient: it lives only in the queue, and
/// every field it carries is also stored on the analysis record, so a
/// lost message can be rebuilt from record state alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJob {
    pub analysis_id: String,
    /// Locator of the stored source file in the object store.
    pub bucket_path: String,
    /// Retrievable URL for the stored source file.
    pub public_url: String,
    pub content_type: String,
    pub user_id: String,
}

impl AnalysisJob {
    /// Rebuilds the job for a record. Used both at upload time and by the
    /// stale-pending re-enqueue sweep.
    pub fn from_record(record: &AnalysisRecord) -> Self {
        Self {
            analysis_id: record.analysis_id.clone(),
            bucket_path: record.file_id.clone(),
            public_url: record.file_path.clone(),
            content_type: record.content_type.clone(),
            user_id: record.owner_id.clone(),
        }
    }
}
