//! The processing step: drives one analysis record from `pending` to a
//! terminal state.

use std::sync::Arc;
use std::time::Duration;

use tracing::info_span;

use crate::db::{analysis_repo, Database};
use crate::error::ProcessError;
use crate::extract::{StructuredExtractor, TextExtractor};
use crate::job::AnalysisJob;
use crate::record::now_rfc3339;

/// Runs a capability call on its own thread so a hung backend cannot
/// wedge the worker. `None` means the deadline expired; the abandoned
/// thread finishes (or not) on its own, its result discarded.
fn call_with_timeout<T, F>(timeout: Duration, f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(timeout).ok()
}

pub struct Processor {
    db: Database,
    text: Arc<dyn TextExtractor>,
    structured: Arc<dyn StructuredExtractor>,
    timeout: Duration,
}

impl Processor {
    pub fn new(
        db: Database,
        text: Arc<dyn TextExtractor>,
        structured: Arc<dyn StructuredExtractor>,
        timeout: Duration,
    ) -> Self {
        Self {
            db,
            text,
            structured,
            timeout,
        }
    }

    /// Handles one delivered job. Tolerates duplicate delivery: a record
    /// that already reached a terminal state is left untouched and the
    /// job counts as handled.
    ///
    /// Extraction and inference failures are recorded on the record as
    /// its terminal `error` state before the error is returned, so the
    /// record is always consistent no matter how the worker loop treats
    /// the return value. Only `RecordNotFound` and record-store errors
    /// come back without a terminal write.
    pub fn handle(&self, job: &AnalysisJob) -> Result<(), ProcessError> {
        let _span = info_span!("process_analysis", analysis_id = %job.analysis_id).entered();

        let record = analysis_repo::find_by_id(&self.db, &job.analysis_id)?
            .ok_or_else(|| ProcessError::RecordNotFound(job.analysis_id.clone()))?;

        if record.status.is_terminal() {
            log::info!(
                "Analysis {} already {}; treating duplicate delivery as handled",
                job.analysis_id,
                record.status
            );
            return Ok(());
        }

        // Claim the record so a crash mid-flight is visible as
        // `processing` rather than a silent eternal `pending`. Losing
        // the claim is fine; the guarded terminal write below is what
        // actually protects the outcome.
        if !analysis_repo::mark_processing(&self.db, &job.analysis_id, &now_rfc3339())? {
            log::debug!("Analysis {} was claimed elsewhere", job.analysis_id);
        }

        let text = {
            let _step = info_span!("extract_text").entered();
            let extractor = Arc::clone(&self.text);
            let locator = job.bucket_path.clone();
            let content_type = job.content_type.clone();
            match call_with_timeout(self.timeout, move || {
                extractor.extract(&locator, &content_type)
            }) {
                Some(Ok(text)) => text,
                Some(Err(e)) => {
                    return self.finish_error(job, ProcessError::ExtractionFailed(e.to_string()))
                }
                None => {
                    return self.finish_error(
                        job,
                        ProcessError::Timeout {
                            stage: "text extraction",
                            seconds: self.timeout.as_secs(),
                        },
                    )
                }
            }
        };

        let payload = {
            let _step = info_span!("extract_structured").entered();
            let extractor = Arc::clone(&self.structured);
            match call_with_timeout(self.timeout, move || extractor.extract(&text)) {
                Some(Ok(payload)) => payload,
                Some(Err(e)) => {
                    return self.finish_error(job, ProcessError::InferenceFailed(e.to_string()))
                }
                None => {
                    return self.finish_error(
                        job,
                        ProcessError::Timeout {
                            stage: "structured extraction",
                            seconds: self.timeout.as_secs(),
                        },
                    )
                }
            }
        };

        // Status and result land in one guarded write; a duplicate that
        // raced us to a terminal state wins and this write is a no-op.
        let written = analysis_repo::complete(&self.db, &job.analysis_id, &payload, &now_rfc3339())?;
        if written {
            log::info!("Analysis {} done", job.analysis_id);
        } else {
            log::info!(
                "Analysis {} reached a terminal state concurrently; result discarded",
                job.analysis_id
            );
        }
        Ok(())
    }

    /// Records the failure as the record's terminal state, then returns
    /// it. A record already terminal keeps its existing outcome.
    fn finish_error(&self, job: &AnalysisJob, error: ProcessError) -> Result<(), ProcessError> {
        let detail = error.to_string();
        let written = analysis_repo::fail(&self.db, &job.analysis_id, &detail, &now_rfc3339())?;
        if written {
            log::warn!("Analysis {} failed: {}", job.analysis_id, detail);
        }
        Err(error)
    }
}
