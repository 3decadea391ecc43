use crate::error::StoreError;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// Raw key-value persistence underneath the audit store.
///
/// A backend only moves whole documents; sequencing and locking live in
/// [`AuditStore`](super::AuditStore).
pub trait StoreBackend: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the document does not exist yet.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn write(&self, key: &str, content: &str) -> Result<(), StoreError>;
}

/// One `<key>` file per log under a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl StoreBackend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.dir.join(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                log: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, content: &str) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            log: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;

        let path = self.dir.join(key);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content).map_err(io_err)?;

        if let Err(rename_error) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(io_err(rename_error));
        }

        Ok(())
    }
}

/// Process-local backend for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    docs: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .docs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn write(&self, key: &str, content: &str) -> Result<(), StoreError> {
        self.docs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), content.to_string());
        Ok(())
    }
}
