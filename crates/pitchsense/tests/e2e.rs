//! End-to-end pipeline scenarios: upload through worker to query.

use std::sync::Arc;
use std::time::Duration;

use pitchsense::db::{analysis_repo, Database};
use pitchsense::{
    AnalysisJob, AnalysisStatus, ExtractError, FileStore, Identity, InMemoryQueue, Processor,
    QueryError, QueryService, StructuredExtractor, TextExtractor, UploadError, UploadOrchestrator,
    WorkerPool,
};

struct FixedText(&'static str);

impl TextExtractor for FixedText {
    fn extract(&self, _locator: &str, _content_type: &str) -> Result<String, ExtractError> {
        Ok(self.0.to_string())
    }
}

struct CorruptFileText;

impl TextExtractor for CorruptFileText {
    fn extract(&self, _locator: &str, _content_type: &str) -> Result<String, ExtractError> {
        Err(ExtractError::PdfProcessing("unreadable stream".to_string()))
    }
}

struct FixedStructured(serde_json::Value);

impl StructuredExtractor for FixedStructured {
    fn extract(&self, _text: &str) -> Result<serde_json::Value, ExtractError> {
        Ok(self.0.clone())
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    db: Database,
    orchestrator: UploadOrchestrator,
    receiver: crossbeam_channel::Receiver<AnalysisJob>,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_in_memory().unwrap();
    let (queue, receiver) = InMemoryQueue::bounded(16);
    let orchestrator = UploadOrchestrator::new(
        Arc::new(FileStore::new(dir.path())),
        db.clone(),
        Arc::new(queue),
    );
    Harness {
        _dir: dir,
        db,
        orchestrator,
        receiver,
    }
}

fn processor(
    db: &Database,
    text: Arc<dyn TextExtractor>,
    structured: Arc<dyn StructuredExtractor>,
) -> Processor {
    Processor::new(db.clone(), text, structured, Duration::from_secs(5))
}

#[test]
fn upload_then_process_to_done() {
    let h = harness();
    let owner = Identity::new("u1");

    let receipt = h
        .orchestrator
        .submit(&owner, "deck.pdf", b"%PDF fake deck", Some("application/pdf"))
        .unwrap();
    assert_eq!(receipt.status, AnalysisStatus::Pending);

    // Immediately visible to the owner as pending.
    let queries = QueryService::new(h.db.clone(), false);
    let pending = queries.get_one(&receipt.analysis_id, &owner).unwrap();
    assert_eq!(pending.status, AnalysisStatus::Pending);
    assert!(pending.result.is_none());

    // Worker consumes the job.
    let job = h.receiver.try_recv().unwrap();
    let worker = processor(
        &h.db,
        Arc::new(FixedText("Q3 revenue $10k")),
        Arc::new(FixedStructured(serde_json::json!({"summary": "early stage"}))),
    );
    worker.handle(&job).unwrap();

    let done = queries.get_one(&receipt.analysis_id, &owner).unwrap();
    assert_eq!(done.status, AnalysisStatus::Done);
    assert_eq!(done.result, Some(serde_json::json!({"summary": "early stage"})));
    assert!(done.error_detail.is_none());
    assert!(done.updated_at >= done.created_at);
}

#[test]
fn corrupt_file_ends_in_error_state() {
    let h = harness();
    let owner = Identity::new("u1");

    let receipt = h
        .orchestrator
        .submit(&owner, "broken.pdf", b"garbage", Some("application/pdf"))
        .unwrap();

    let job = h.receiver.try_recv().unwrap();
    let worker = processor(
        &h.db,
        Arc::new(CorruptFileText),
        Arc::new(FixedStructured(serde_json::json!({}))),
    );
    let _ = worker.handle(&job);

    let queries = QueryService::new(h.db.clone(), false);
    let failed = queries.get_one(&receipt.analysis_id, &owner).unwrap();
    assert_eq!(failed.status, AnalysisStatus::Error);
    assert!(!failed.error_detail.as_deref().unwrap().is_empty());
    assert!(failed.result.is_none());
}

#[test]
fn duplicate_delivery_leaves_terminal_record_unchanged() {
    let h = harness();
    let owner = Identity::new("u1");

    let receipt = h
        .orchestrator
        .submit(&owner, "deck.pdf", b"%PDF", Some("application/pdf"))
        .unwrap();
    let job = h.receiver.try_recv().unwrap();

    let worker = processor(
        &h.db,
        Arc::new(FixedText("Q3 revenue $10k")),
        Arc::new(FixedStructured(serde_json::json!({"summary": "early stage"}))),
    );
    worker.handle(&job).unwrap();
    let first = analysis_repo::find_by_id(&h.db, &receipt.analysis_id)
        .unwrap()
        .unwrap();

    // Simulated at-least-once redelivery of the same job, now with a
    // worker that would produce a different payload.
    let replay = processor(
        &h.db,
        Arc::new(FixedText("different text")),
        Arc::new(FixedStructured(serde_json::json!({"summary": "other"}))),
    );
    replay.handle(&job).unwrap();

    let second = analysis_repo::find_by_id(&h.db, &receipt.analysis_id)
        .unwrap()
        .unwrap();
    assert_eq!(second.status, first.status);
    assert_eq!(second.result, first.result);
    assert_eq!(second.updated_at, first.updated_at);
}

#[test]
fn unsupported_upload_has_no_side_effects() {
    let h = harness();

    let result = h.orchestrator.submit(
        &Identity::new("u1"),
        "deck.docx",
        b"word doc",
        Some("application/msword"),
    );
    assert!(matches!(result, Err(UploadError::UnsupportedMediaType(_))));
    assert!(analysis_repo::list_all(&h.db).unwrap().is_empty());
    assert!(h.receiver.try_recv().is_err());
}

#[test]
fn authorization_enforced_and_disabled() {
    let h = harness();
    let alice = Identity::new("alice");
    let bob = Identity::new("bob");

    let receipt = h
        .orchestrator
        .submit(&alice, "deck.pdf", b"%PDF", Some("application/pdf"))
        .unwrap();

    let enforced = QueryService::new(h.db.clone(), false);
    assert!(enforced.get_one(&receipt.analysis_id, &alice).is_ok());
    assert!(matches!(
        enforced.get_one(&receipt.analysis_id, &bob),
        Err(QueryError::Forbidden(_))
    ));
    assert!(enforced.list_for(&bob).unwrap().is_empty());

    let disabled = QueryService::new(h.db.clone(), true);
    assert!(disabled.get_one(&receipt.analysis_id, &bob).is_ok());
    assert_eq!(disabled.list_for(&bob).unwrap().len(), 1);
}

#[test]
fn terminal_invariant_holds_across_outcomes() {
    let h = harness();
    let owner = Identity::new("u1");

    h.orchestrator
        .submit(&owner, "good.pdf", b"%PDF", Some("application/pdf"))
        .unwrap();
    h.orchestrator
        .submit(&owner, "bad.pdf", b"%PDF", Some("application/pdf"))
        .unwrap();

    let ok_job = h.receiver.try_recv().unwrap();
    let bad_job = h.receiver.try_recv().unwrap();

    processor(
        &h.db,
        Arc::new(FixedText("text")),
        Arc::new(FixedStructured(serde_json::json!({"summary": "x"}))),
    )
    .handle(&ok_job)
    .unwrap();
    let _ = processor(
        &h.db,
        Arc::new(CorruptFileText),
        Arc::new(FixedStructured(serde_json::json!({}))),
    )
    .handle(&bad_job);

    for record in analysis_repo::list_all(&h.db).unwrap() {
        match record.status {
            AnalysisStatus::Done => {
                assert!(record.result.is_some());
                assert!(record.error_detail.is_none());
            }
            AnalysisStatus::Error => {
                assert!(record.error_detail.is_some());
                assert!(record.result.is_none());
            }
            _ => panic!("record {} not terminal", record.analysis_id),
        }
    }
}

#[test]
fn pool_drives_uploads_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_in_memory().unwrap();
    let (queue, receiver) = InMemoryQueue::bounded(16);
    let orchestrator = UploadOrchestrator::new(
        Arc::new(FileStore::new(dir.path())),
        db.clone(),
        Arc::new(queue),
    );

    let worker = Arc::new(Processor::new(
        db.clone(),
        Arc::new(FixedText("Q3 revenue $10k")),
        Arc::new(FixedStructured(serde_json::json!({"summary": "early stage"}))),
        Duration::from_secs(5),
    ));
    let pool = WorkerPool::start(worker, receiver, 2);

    let owner = Identity::new("u1");
    let mut ids = Vec::new();
    for i in 0..5 {
        let receipt = orchestrator
            .submit(
                &owner,
                &format!("deck-{}.pdf", i),
                b"%PDF",
                Some("application/pdf"),
            )
            .unwrap();
        ids.push(receipt.analysis_id);
    }

    let queries = QueryService::new(db.clone(), false);
    for id in &ids {
        let mut terminal = None;
        for _ in 0..100 {
            let record = queries.get_one(id, &owner).unwrap();
            if record.status.is_terminal() {
                terminal = Some(record);
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        let record = terminal.expect("analysis never finished");
        assert_eq!(record.status, AnalysisStatus::Done);
        assert_eq!(record.result, Some(serde_json::json!({"summary": "early stage"})));
    }

    pool.shutdown();
    pool.wait();
}
