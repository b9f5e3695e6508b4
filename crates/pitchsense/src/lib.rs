//! Pitch-deck analysis pipeline.
//!
//! Uploads flow through a durable state machine: bytes land in the
//! object store, an analysis record is created `pending`, and a job is
//! queued for the worker pool, which runs text extraction and structured
//! extraction and writes the terminal outcome back onto the record.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod identity;
pub mod job;
pub mod logging;
pub mod query;
pub mod queue;
pub mod record;
pub mod storage;
pub mod upload;
pub mod worker;

pub use config::Config;
pub use error::{
    AuthError, ExtractError, PitchsenseError, ProcessError, QueryError, QueueError, Result,
    StorageError, UploadError,
};
pub use extract::{PdfTextExtractor, StructuredExtractor, TextExtractor};
pub use identity::{DevVerifier, Identity, IdentityVerifier};
pub use job::AnalysisJob;
pub use logging::init_logging;
pub use query::QueryService;
pub use queue::{InMemoryQueue, JobQueue};
pub use record::{AnalysisRecord, AnalysisStatus};
pub use storage::{FileStore, ObjectStore, StoredObject};
pub use upload::{UploadOrchestrator, UploadReceipt, SUPPORTED_CONTENT_TYPES};
pub use worker::{Processor, WorkerPool};
