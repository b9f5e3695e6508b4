//! Object store capability: raw bytes in, stable locator out.

pub mod filesystem;

pub use filesystem::FileStore;

use crate::error::StorageError;

/// Outcome of storing an upload: an opaque locator resolvable back to
/// the bytes, and a retrievable URL handed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub locator: String,
    pub public_url: String,
}

/// Binary object store capability. The pipeline only ever writes once
/// per upload path and never mutates a stored object.
pub trait ObjectStore: Send + Sync {
    fn put(
        &self,
        owner_id: &str,
        filename: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;
}
