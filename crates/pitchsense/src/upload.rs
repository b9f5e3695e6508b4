//! Upload orchestration: validate, store bytes, create the pending
//! record, enqueue the processing job.

use std::sync::Arc;

use serde::Serialize;

use crate::db::{analysis_repo, Database};
use crate::error::{Result, UploadError};
use crate::identity::Identity;
use crate::job::AnalysisJob;
use crate::queue::JobQueue;
use crate::record::{now_rfc3339, AnalysisRecord, AnalysisStatus};
use crate::storage::ObjectStore;

/// Content types accepted for upload: PDF, PowerPoint, PNG, JPEG.
pub const SUPPORTED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "image/png",
    "image/jpeg",
];

/// Acknowledgement returned to the uploader. "Accepted for processing",
/// not "processing has started": the caller polls the record for the
/// outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub analysis_id: String,
    pub status: AnalysisStatus,
    pub file_path: String,
}

pub struct UploadOrchestrator {
    store: Arc<dyn ObjectStore>,
    db: Database,
    queue: Arc<dyn JobQueue>,
}

impl UploadOrchestrator {
    pub fn new(store: Arc<dyn ObjectStore>, db: Database, queue: Arc<dyn JobQueue>) -> Self {
        Self { store, db, queue }
    }

    /// Accepts an upload and kicks off its analysis.
    ///
    /// Side effects run strictly in order: store bytes, create the
    /// pending record, enqueue the job. Validation failures have no side
    /// effects at all. A storage failure records nothing. A record
    /// failure after storage orphans the stored bytes, which carry no
    /// further effects. A queue failure leaves the record `pending`,
    /// where [`UploadOrchestrator::requeue_stale_pending`] can pick it
    /// up later.
    pub fn submit(
        &self,
        owner: &Identity,
        filename: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> std::result::Result<UploadReceipt, UploadError> {
        let content_type = match content_type {
            Some(ct) => ct.to_string(),
            // Fall back to extension-based detection when the client
            // sent no content type.
            None => mime_guess::from_path(filename)
                .first()
                .map(|m| m.to_string())
                .ok_or_else(|| UploadError::UnsupportedMediaType("unknown".to_string()))?,
        };

        if !SUPPORTED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(UploadError::UnsupportedMediaType(content_type));
        }

        if bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        let stored = self
            .store
            .put(&owner.uid, filename, bytes, &content_type)
            .map_err(UploadError::StorageFailure)?;

        let record = AnalysisRecord::new(&owner.uid, &stored.locator, &stored.public_url, &content_type);
        analysis_repo::insert(&self.db, &record).map_err(UploadError::RecordCreationFailure)?;

        self.queue
            .enqueue(AnalysisJob::from_record(&record))
            .map_err(UploadError::QueueFailure)?;

        log::info!(
            "Accepted upload '{}' from {} as {}",
            filename,
            owner.uid,
            record.analysis_id
        );

        Ok(UploadReceipt {
            analysis_id: record.analysis_id,
            status: AnalysisStatus::Pending,
            file_path: stored.public_url,
        })
    }

    /// Re-enqueues jobs for records stuck in `pending` longer than
    /// `max_age_secs`. Jobs are rebuilt from record state, so this
    /// recovers from enqueue failures and lost queue messages alike.
    /// Returns the number of records re-enqueued.
    pub fn requeue_stale_pending(&self, max_age_secs: u64) -> Result<usize> {
        let age = chrono::Duration::seconds(max_age_secs.min(i64::MAX as u64) as i64);
        let cutoff = (chrono::Utc::now() - age)
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let stuck = analysis_repo::stale_pending(&self.db, &cutoff)?;
        let mut requeued = 0;
        for record in &stuck {
            self.queue
                .enqueue(AnalysisJob::from_record(record))
                .map_err(crate::error::PitchsenseError::Queue)?;
            // Touch updated_at so the next sweep does not immediately
            // re-enqueue the same record.
            analysis_repo::touch_pending(&self.db, &record.analysis_id, &now_rfc3339())?;
            requeued += 1;
        }

        if requeued > 0 {
            log::warn!("Re-enqueued {} stale pending analyses", requeued);
        }

        Ok(requeued)
    }
}
