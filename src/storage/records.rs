//! Audit record store
//!
//! Durable, indexed persistence for audit records over a line-delimited
//! JSON log. An in-memory index keyed by record id backs point lookups;
//! query scans snapshot the index. Appends go straight to the log and are
//! flushed; deletions rewrite the log atomically.
//!
//! No update operation is exposed. The single sanctioned mutation is
//! [`RecordStore::detach_actor`], which nulls actor references after the
//! referenced principal is deleted upstream.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::error::{AuditError, AuditResult};
use crate::models::{ActorId, AuditRecord, RecordId};

use super::file_io::{append_jsonl_line, read_jsonl, write_jsonl_atomic};

/// Durable store for audit records
pub struct RecordStore {
    path: PathBuf,
    data: RwLock<HashMap<RecordId, AuditRecord>>,
    append_timeout: Duration,
}

impl RecordStore {
    /// Create a new record store backed by the given JSONL file
    pub fn new(path: PathBuf) -> Self {
        Self::with_append_timeout(path, Duration::from_millis(2000))
    }

    /// Create a record store with a custom append-lock deadline
    pub fn with_append_timeout(path: PathBuf, append_timeout: Duration) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            append_timeout,
        }
    }

    /// Load records from disk, rebuilding the in-memory index
    pub fn load(&self) -> AuditResult<()> {
        let records: Vec<AuditRecord> = read_jsonl(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for record in records {
            data.insert(record.id, record);
        }

        Ok(())
    }

    /// Append a record
    ///
    /// Acquires the write lock under a bounded deadline; a miss surfaces as
    /// a persistence error so callers on the capture/facade paths can
    /// swallow it without stalling the triggering operation.
    pub fn append(&self, record: AuditRecord) -> AuditResult<RecordId> {
        let id = record.id;
        let mut data = self.write_lock_with_deadline()?;

        if data.contains_key(&id) {
            return Err(AuditError::Persistence(format!(
                "record id already exists: {}",
                id
            )));
        }

        append_jsonl_line(&self.path, &record)
            .map_err(|e| AuditError::Persistence(e.to_string()))?;
        data.insert(id, record);

        Ok(id)
    }

    /// Get a record by id
    pub fn get(&self, id: RecordId) -> AuditResult<Option<AuditRecord>> {
        let data = self
            .data
            .read()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(&id).cloned())
    }

    /// Delete a batch of records, returning the number actually removed
    ///
    /// Idempotent: ids that are absent (already deleted) are skipped, not
    /// errors, so overlapping cleanup runs are safe.
    pub fn delete_batch(&self, ids: &[RecordId]) -> AuditResult<usize> {
        let mut data = self
            .data
            .write()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let mut removed = 0;
        for id in ids {
            if data.remove(id).is_some() {
                removed += 1;
            }
        }

        if removed > 0 {
            self.persist_locked(&data)?;
        }

        Ok(removed)
    }

    /// Null the actor reference on every record owned by a deleted
    /// principal; the records themselves are retained
    pub fn detach_actor(&self, actor_id: ActorId) -> AuditResult<usize> {
        let mut data = self
            .data
            .write()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let mut detached = 0;
        for record in data.values_mut() {
            if record.actor.as_ref().map(|a| a.id) == Some(actor_id) {
                record.actor = None;
                detached += 1;
            }
        }

        if detached > 0 {
            self.persist_locked(&data)?;
        }

        Ok(detached)
    }

    /// Snapshot of every record, unordered
    pub fn all(&self) -> AuditResult<Vec<AuditRecord>> {
        let data = self
            .data
            .read()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.values().cloned().collect())
    }

    /// Count records
    pub fn count(&self) -> AuditResult<usize> {
        let data = self
            .data
            .read()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.len())
    }

    /// Rewrite the log from the index, ordered by timestamp then id for a
    /// stable layout
    fn persist_locked(&self, data: &HashMap<RecordId, AuditRecord>) -> AuditResult<()> {
        let mut records: Vec<&AuditRecord> = data.values().collect();
        records.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });

        let owned: Vec<AuditRecord> = records.into_iter().cloned().collect();
        write_jsonl_atomic(&self.path, &owned).map_err(|e| AuditError::Persistence(e.to_string()))
    }

    /// Acquire the write lock, retrying until the append deadline passes
    fn write_lock_with_deadline(
        &self,
    ) -> AuditResult<std::sync::RwLockWriteGuard<'_, HashMap<RecordId, AuditRecord>>> {
        let deadline = Instant::now() + self.append_timeout;
        loop {
            match self.data.try_write() {
                Ok(guard) => return Ok(guard),
                Err(std::sync::TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(AuditError::Persistence(
                            "timed out waiting for store write lock".into(),
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
                Err(std::sync::TryLockError::Poisoned(e)) => {
                    return Err(AuditError::Storage(format!("store lock poisoned: {}", e)));
                }
            }
        }
    }
}
