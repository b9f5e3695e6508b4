use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PitchsenseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
}

/// Synchronous upload failures. All variants except `UnsupportedMediaType`
/// and `EmptyFile` indicate an unavailable collaborator and are retryable
/// by the caller.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("Object store rejected the upload: {0}")]
    StorageFailure(#[source] StorageError),

    #[error("Failed to create analysis record: {0}")]
    RecordCreationFailure(#[source] crate::db::DatabaseError),

    #[error("Failed to enqueue processing job: {0}")]
    QueueFailure(#[source] QueueError),
}

/// Asynchronous processing failures. These never reach the uploading
/// caller; they are recorded on the analysis record as its terminal state.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Analysis record '{0}' not found")]
    RecordNotFound(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Structured extraction failed: {0}")]
    InferenceFailed(String),

    #[error("{stage} timed out after {seconds}s")]
    Timeout { stage: &'static str, seconds: u64 },

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Analysis '{0}' not found")]
    NotFound(String),

    #[error("Requester does not own analysis '{0}'")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read stored object '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("Invalid object locator: {0}")]
    InvalidLocator(String),
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Job queue is full")]
    Full,

    #[error("Job queue is closed")]
    Closed,
}

/// Failures from the text/structured extraction capabilities.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read source object: {0}")]
    Read(#[source] StorageError),

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Extraction backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid or missing credential")]
    InvalidCredential,
}

pub type Result<T> = std::result::Result<T, PitchsenseError>;
