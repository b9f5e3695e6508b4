//! Local-filesystem object store.
//!
//! Stores uploads under `{root}/uploads/{owner}/{timestamp}-{filename}`
//! and hands back the relative path as the locator. Writes use exclusive
//! file creation so concurrent uploads of the same name never clobber
//! each other; conflicts get a numbered suffix.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;

use crate::error::StorageError;

use super::{ObjectStore, StoredObject};

pub struct FileStore {
    root: PathBuf,
    base_url: String,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let base_url = format!("file://{}", root.display());
        Self { root, base_url }
    }

    /// Overrides the URL prefix used for `public_url` (e.g. a CDN or
    /// reverse-proxy origin serving the upload directory).
    pub fn with_base_url<P: AsRef<Path>>(root: P, base_url: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a locator back to the path of the stored bytes. Rejects
    /// locators that would escape the store root.
    pub fn resolve(&self, locator: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(locator);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(StorageError::InvalidLocator(locator.to_string())),
            }
        }
        Ok(self.root.join(relative))
    }

    /// Reads a stored object's bytes.
    pub fn read(&self, locator: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(locator)?;
        std::fs::read(&path).map_err(|e| StorageError::ReadFile { path, source: e })
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Writes content with exclusive creation (O_CREAT | O_EXCL). On a
    /// name collision, retries with numbered variants. Returns the
    /// filename actually used.
    fn write_exclusive(
        &self,
        dir_path: &Path,
        filename: &str,
        content: &[u8],
    ) -> Result<String, StorageError> {
        let (base, ext) = match filename.rfind('.') {
            Some(dot_pos) => (&filename[..dot_pos], Some(&filename[dot_pos..])),
            None => (filename, None),
        };

        for counter in 1..=1000 {
            let try_filename = if counter == 1 {
                filename.to_string()
            } else {
                match ext {
                    Some(ext) => format!("{}_{}{}", base, counter, ext),
                    None => format!("{}_{}", base, counter),
                }
            };

            let try_path = dir_path.join(&try_filename);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
            {
                Ok(mut file) => {
                    file.write_all(content)
                        .map_err(|e| StorageError::WriteFile {
                            path: try_path.clone(),
                            source: e,
                        })?;
                    return Ok(try_filename);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    continue;
                }
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(dir_path.join(filename)))
    }
}

impl ObjectStore for FileStore {
    fn put(
        &self,
        owner_id: &str,
        filename: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        // Keep only the final path segment of whatever name the client sent.
        let safe_name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");

        let dir_path = self.root.join("uploads").join(owner_id);
        self.ensure_directory(&dir_path)?;

        let stamped = format!("{}-{}", Utc::now().timestamp(), safe_name);
        let stored_name = self.write_exclusive(&dir_path, &stamped, bytes)?;

        let locator = format!("uploads/{}/{}", owner_id, stored_name);
        let public_url = format!("{}/{}", self.base_url, locator);

        log::debug!(
            "Stored {} bytes at {} ({})",
            bytes.len(),
            locator,
            content_type
        );

        Ok(StoredObject {
            locator,
            public_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let stored = store
            .put("u1", "deck.pdf", b"%PDF-1.4 fake", "application/pdf")
            .unwrap();

        assert!(stored.locator.starts_with("uploads/u1/"));
        assert!(stored.locator.ends_with("deck.pdf"));
        assert!(stored.public_url.ends_with(&stored.locator));
        assert_eq!(store.read(&stored.locator).unwrap(), b"%PDF-1.4 fake");
    }

    #[test]
    fn test_put_same_name_twice_gets_distinct_locators() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let first = store.put("u1", "deck.pdf", b"one", "application/pdf").unwrap();
        let second = store.put("u1", "deck.pdf", b"two", "application/pdf").unwrap();

        assert_ne!(first.locator, second.locator);
        assert_eq!(store.read(&first.locator).unwrap(), b"one");
        assert_eq!(store.read(&second.locator).unwrap(), b"two");
    }

    #[test]
    fn test_put_strips_path_components_from_filename() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let stored = store
            .put("u1", "../../etc/passwd", b"x", "application/pdf")
            .unwrap();
        assert!(stored.locator.ends_with("passwd"));
        assert!(!stored.locator.contains(".."));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(
            store.resolve("../outside"),
            Err(StorageError::InvalidLocator(_))
        ));
        assert!(matches!(
            store.resolve("/absolute/path"),
            Err(StorageError::InvalidLocator(_))
        ));
        assert!(store.resolve("uploads/u1/file.pdf").is_ok());
    }

    #[test]
    fn test_read_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(
            store.read("uploads/u1/missing.pdf"),
            Err(StorageError::ReadFile { .. })
        ));
    }

    #[test]
    fn test_with_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_base_url(dir.path(), "https://cdn.example.com/");

        let stored = store.put("u1", "deck.png", b"png", "image/png").unwrap();
        assert!(stored.public_url.starts_with("https://cdn.example.com/uploads/u1/"));
    }
}
