//! Engine wiring
//!
//! Builds the full audit pipeline out of its parts: store, dispatcher,
//! context resolver, capture layer, logging facade, selector, and cleanup
//! engine. Embedders construct one [`AuditTrail`] at startup and hand out
//! references to the pieces their collaborators need.

use std::sync::Arc;
use std::time::Duration;

use crate::capture::{CaptureConfig, CaptureLayer, ModelRegistry};
use crate::config::{AuditSettings, TrailPaths};
use crate::context::{ContextResolver, TenantDirectory};
use crate::dispatch::Dispatcher;
use crate::error::AuditResult;
use crate::loggers::LoggerFactory;
use crate::models::EntityKind;
use crate::query::Selector;
use crate::retention::{CleanupEngine, RetentionPolicy};
use crate::storage::RecordStore;

/// The assembled audit-trail engine
pub struct AuditTrail {
    store: Arc<RecordStore>,
    dispatcher: Arc<Dispatcher>,
    capture: CaptureLayer,
    loggers: LoggerFactory,
    selector: Selector,
    cleanup: CleanupEngine,
    settings: Arc<AuditSettings>,
}

impl AuditTrail {
    /// Open (or create) the record store and wire up every component
    pub fn open(
        paths: &TrailPaths,
        settings: AuditSettings,
        directory: Arc<dyn TenantDirectory + Send + Sync>,
    ) -> AuditResult<Self> {
        paths.ensure_directories()?;

        let store = Arc::new(RecordStore::with_append_timeout(
            paths.records_file(),
            Duration::from_millis(settings.append_timeout_ms),
        ));
        store.load()?;

        Self::with_store(store, settings, directory)
    }

    /// Wire up components over an already-loaded store
    pub fn with_store(
        store: Arc<RecordStore>,
        settings: AuditSettings,
        directory: Arc<dyn TenantDirectory + Send + Sync>,
    ) -> AuditResult<Self> {
        let settings = Arc::new(settings);
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            settings.max_metadata_size,
        ));
        let resolver = Arc::new(ContextResolver::new(directory));

        let capture = CaptureLayer::new(
            ModelRegistry::with_defaults(),
            Arc::clone(&resolver),
            Arc::clone(&dispatcher),
            Arc::clone(&settings),
        );
        let loggers = LoggerFactory::new(
            Arc::clone(&resolver),
            Arc::clone(&dispatcher),
            Arc::clone(&settings),
        );
        let selector = Selector::new(Arc::clone(&store));
        let cleanup = CleanupEngine::new(
            Arc::clone(&store),
            RetentionPolicy::new(settings.retention.clone()),
        );

        Ok(Self {
            store,
            dispatcher,
            capture,
            loggers,
            selector,
            cleanup,
            settings,
        })
    }

    /// Lifecycle-driven capture layer
    pub fn capture(&self) -> &CaptureLayer {
        &self.capture
    }

    /// Administrative API: declare an entity kind auditable at runtime
    pub fn register_entity(&mut self, kind: EntityKind, config: CaptureConfig) {
        self.capture.register(kind, config);
    }

    /// Structured logging facade
    pub fn loggers(&self) -> &LoggerFactory {
        &self.loggers
    }

    /// Query/selector layer
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Retention and cleanup engine
    pub fn cleanup(&self) -> &CleanupEngine {
        &self.cleanup
    }

    /// The underlying record store
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Drain the asynchronous write path (facade emissions)
    pub fn flush(&self, timeout: Duration) -> bool {
        self.dispatcher.flush(timeout)
    }
}
