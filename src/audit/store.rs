use super::backend::{FileBackend, MemoryBackend, StoreBackend};
use super::names::LogName;
use crate::error::StoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Read-modify-write access to the named governance logs.
///
/// Writers to the same log are serialized through a per-log guard; the guard
/// table itself is only held long enough to fetch a guard, never while a log
/// is being rewritten.
pub struct AuditStore {
    backend: Box<dyn StoreBackend>,
    guards: Mutex<HashMap<LogName, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for AuditStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditStore")
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

impl AuditStore {
    pub fn new(backend: Box<dyn StoreBackend>) -> Self {
        Self {
            backend,
            guards: Mutex::new(HashMap::new()),
        }
    }

    pub fn open(dir: &Path) -> Self {
        Self::new(Box::new(FileBackend::new(dir)))
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// Every entry of `log` that parses as `T`, in write order.
    pub fn read_log<T: DeserializeOwned>(&self, log: LogName) -> Vec<T> {
        self.read_values(log)
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    tracing::debug!(%log, %error, "skipping unreadable log entry");
                    None
                }
            })
            .collect()
    }

    /// Append one record. Existing entries are carried over untouched, even
    /// ones this build no longer understands.
    pub fn append<T: Serialize>(&self, log: LogName, entry: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(entry).map_err(|source| StoreError::Serialize {
            log: log.to_string(),
            source,
        })?;

        let guard = self.guard(log);
        let _held = guard.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = self.read_values(log);
        entries.push(value);
        self.write_values(log, &entries)
    }

    /// Replace the whole log.
    pub fn write_log<T: Serialize>(&self, log: LogName, entries: &[T]) -> Result<(), StoreError> {
        let guard = self.guard(log);
        let _held = guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_serialized(log, entries)
    }

    /// A single JSON document (not an array), defaulting when absent or corrupt.
    pub fn read_document<T: DeserializeOwned + Default>(&self, log: LogName) -> T {
        let Some(raw) = self.read_raw(log) else {
            return T::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|error| {
            tracing::warn!(%log, %error, "failed to parse document; using defaults");
            T::default()
        })
    }

    pub fn write_document<T: Serialize>(&self, log: LogName, document: &T) -> Result<(), StoreError> {
        let guard = self.guard(log);
        let _held = guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_serialized(log, document)
    }

    pub fn entry_count(&self, log: LogName) -> usize {
        self.read_values(log).len()
    }

    fn guard(&self, log: LogName) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(guards.entry(log).or_default())
    }

    fn read_raw(&self, log: LogName) -> Option<String> {
        match self.backend.read(&log.file_name()) {
            Ok(Some(raw)) if !raw.trim().is_empty() => Some(raw),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(%log, %error, "failed to read log; treating as empty");
                None
            }
        }
    }

    fn read_values(&self, log: LogName) -> Vec<Value> {
        let Some(raw) = self.read_raw(log) else {
            return Vec::new();
        };
        serde_json::from_str::<Vec<Value>>(&raw).unwrap_or_else(|error| {
            tracing::warn!(%log, %error, "malformed log; treating as empty");
            Vec::new()
        })
    }

    fn write_values(&self, log: LogName, entries: &[Value]) -> Result<(), StoreError> {
        self.write_serialized(log, entries)
    }

    fn write_serialized<T: Serialize + ?Sized>(
        &self,
        log: LogName,
        data: &T,
    ) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(data).map_err(|source| {
            StoreError::Serialize {
                log: log.to_string(),
                source,
            }
        })?;
        self.backend.write(&log.file_name(), &content)
    }
}
