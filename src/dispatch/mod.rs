//! Dispatch and failure isolation
//!
//! The boundary between audit emission and the record store. Two write
//! paths exist: the capture layer writes synchronously within the caller's
//! unit of work, and the facade hands drafts to a background worker thread
//! so metadata-heavy emissions never add to request latency. Each path
//! preserves its own FIFO order; no ordering holds across the two.
//!
//! [`guard`] is the failure-isolation wrapper composed around every public
//! capture/facade entry point: audit failures are logged and swallowed so
//! they can never fail the triggering business operation. The single
//! exception is [`AuditError::InvalidActor`], which signals caller misuse
//! and is always re-raised.

pub mod sanitize;

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::context::Scope;
#[cfg(test)]
use crate::error::AuditError;
use crate::error::AuditResult;
use crate::models::{ActionType, ActorRef, AuditRecord, EntityRef, RecordId};
use crate::storage::RecordStore;

use sanitize::truncate_metadata;

/// Run an audit operation behind the failure-isolation boundary
///
/// Every error except `InvalidActor` is logged at error severity with the
/// originating operation's name and swallowed; the caller sees `Ok(None)`.
pub fn guard<T, F>(operation: &'static str, f: F) -> AuditResult<Option<T>>
where
    F: FnOnce() -> AuditResult<T>,
{
    match f() {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_invalid_actor() => Err(err),
        Err(err) => {
            error!(operation, error = %err, "audit logging failed");
            Ok(None)
        }
    }
}

/// An emission that has not yet been shaped into a record
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub action_type: ActionType,
    pub actor: Option<ActorRef>,
    pub target: Option<EntityRef>,
    pub scope: Scope,
    pub metadata: Map<String, Value>,
}

impl RecordDraft {
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            actor: None,
            target: None,
            scope: Scope::default(),
            metadata: Map::new(),
        }
    }

    pub fn actor(mut self, actor: Option<ActorRef>) -> Self {
        self.actor = actor;
        self
    }

    pub fn target(mut self, target: Option<EntityRef>) -> Self {
        self.target = target;
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

enum Job {
    Write(Box<RecordDraft>),
    Flush(mpsc::Sender<()>),
}

/// Sync-or-async write boundary in front of the record store
pub struct Dispatcher {
    store: Arc<RecordStore>,
    max_metadata_size: usize,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Dispatcher {
    /// Create a dispatcher and start its background worker
    pub fn new(store: Arc<RecordStore>, max_metadata_size: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();

        let worker_store = Arc::clone(&store);
        let worker = thread::spawn(move || {
            while let Ok(job) = receiver.recv() {
                match job {
                    Job::Write(draft) => {
                        let record = shape(*draft, max_metadata_size);
                        if let Err(err) = worker_store.append(record) {
                            error!(error = %err, "async audit write failed");
                        }
                    }
                    Job::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });

        Self {
            store,
            max_metadata_size,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Synchronous write path (capture layer)
    ///
    /// Blocks briefly on store I/O within the caller's unit of work; the
    /// store's append deadline bounds the wait.
    pub fn write_sync(&self, draft: RecordDraft) -> AuditResult<RecordId> {
        let record = shape(draft, self.max_metadata_size);
        self.store.append(record)
    }

    /// Asynchronous write path (facade)
    ///
    /// Non-blocking; a transiently unavailable queue is logged and
    /// swallowed, never surfaced to the caller.
    pub fn enqueue(&self, draft: RecordDraft) {
        let sender = match self.sender.lock() {
            Ok(guard) => guard.as_ref().cloned(),
            Err(_) => None,
        };

        match sender {
            Some(sender) => {
                if sender.send(Job::Write(Box::new(draft))).is_err() {
                    warn!("audit dispatch queue unavailable, record dropped");
                }
            }
            None => warn!("audit dispatcher already shut down, record dropped"),
        }
    }

    /// Wait until every enqueued draft has been written
    ///
    /// Returns `false` if the worker did not drain within the timeout.
    pub fn flush(&self, timeout: Duration) -> bool {
        let sender = match self.sender.lock() {
            Ok(guard) => guard.as_ref().cloned(),
            Err(_) => None,
        };

        let Some(sender) = sender else {
            return true;
        };

        let (ack_sender, ack_receiver) = mpsc::channel();
        if sender.send(Job::Flush(ack_sender)).is_err() {
            return false;
        }
        ack_receiver.recv_timeout(timeout).is_ok()
    }

    /// Stop the worker after draining pending jobs
    pub fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        if let Ok(mut worker) = self.worker.lock() {
            if let Some(handle) = worker.take() {
                if handle.join().is_err() {
                    warn!("audit dispatch worker panicked during shutdown");
                } else {
                    debug!("audit dispatch worker stopped");
                }
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Shape a draft into a persistable record: bound the metadata, stamp id
/// and timestamp
fn shape(draft: RecordDraft, max_metadata_size: usize) -> AuditRecord {
    let metadata = truncate_metadata(draft.metadata, max_metadata_size);
    AuditRecord::new(
        draft.action_type,
        draft.actor,
        draft.target,
        draft.scope.organization,
        draft.scope.workspace,
        metadata,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_dispatcher() -> (TempDir, Arc<RecordStore>, Dispatcher) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(RecordStore::new(temp_dir.path().join("records.jsonl")));
        let dispatcher = Dispatcher::new(Arc::clone(&store), 10_000);
        (temp_dir, store, dispatcher)
    }

    #[test]
    fn test_guard_passes_success() {
        let result: AuditResult<Option<u32>> = guard("test_op", || Ok(7));
        assert_eq!(result.unwrap(), Some(7));
    }

    #[test]
    fn test_guard_swallows_persistence_errors() {
        let result: AuditResult<Option<u32>> =
            guard("test_op", || Err(AuditError::Persistence("down".into())));
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_guard_reraises_invalid_actor() {
        let result: AuditResult<Option<u32>> = guard("test_op", || Err(AuditError::missing_actor()));
        assert!(matches!(result, Err(AuditError::InvalidActor(_))));
    }

    #[test]
    fn test_write_sync() {
        let (_temp, store, dispatcher) = create_dispatcher();

        let id = dispatcher
            .write_sync(RecordDraft::new(ActionType::EntryCreated))
            .unwrap();

        assert!(store.get(id).unwrap().is_some());
    }

    #[test]
    fn test_enqueue_writes_in_background() {
        let (_temp, store, dispatcher) = create_dispatcher();

        for _ in 0..5 {
            dispatcher.enqueue(RecordDraft::new(ActionType::EntryApproved));
        }

        assert!(dispatcher.flush(Duration::from_secs(5)));
        assert_eq!(store.count().unwrap(), 5);
    }

    #[test]
    fn test_async_path_preserves_fifo_order() {
        let (_temp, store, dispatcher) = create_dispatcher();

        for i in 0..10 {
            let mut metadata = Map::new();
            metadata.insert("seq".into(), json!(i));
            dispatcher.enqueue(RecordDraft::new(ActionType::EntrySubmitted).metadata(metadata));
        }

        assert!(dispatcher.flush(Duration::from_secs(5)));

        let mut records = store.all().unwrap();
        records.sort_by_key(|r| r.timestamp);
        let sequence: Vec<i64> = records
            .iter()
            .map(|r| r.metadata["seq"].as_i64().unwrap())
            .collect();
        assert_eq!(sequence, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_oversized_metadata_truncated_not_dropped() {
        let (_temp, store, dispatcher) = create_dispatcher();
        let dispatcher_small = Dispatcher::new(Arc::clone(&store), 200);

        let mut metadata = Map::new();
        metadata.insert("user_agent".into(), json!("x".repeat(2000)));
        metadata.insert("note".into(), json!("still here"));

        let id = dispatcher_small
            .write_sync(RecordDraft::new(ActionType::FileUploaded).metadata(metadata))
            .unwrap();

        let record = store.get(id).unwrap().unwrap();
        assert_eq!(record.metadata["note"], json!("still here"));
        assert!(record.metadata["user_agent"]
            .as_str()
            .unwrap()
            .starts_with("[TRUNCATED"));

        drop(dispatcher);
    }

    #[test]
    fn test_enqueue_after_shutdown_is_swallowed() {
        let (_temp, store, dispatcher) = create_dispatcher();
        dispatcher.shutdown();

        // Must not panic or block
        dispatcher.enqueue(RecordDraft::new(ActionType::EntryCreated));
        assert_eq!(store.count().unwrap(), 0);
    }
}
