//! Automatic capture layer
//!
//! Derives audit records from entity lifecycle transitions without
//! requiring business code to call anything explicitly. Callers take a
//! pre-change snapshot before persisting an update, then report the
//! lifecycle event after the fact; diffing decides whether anything is
//! worth recording.
//!
//! Every emission resolves tenant context and goes through the dispatch
//! wrapper's synchronous path; capture never writes to the store directly.

pub mod diff;
pub mod registry;

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::AuditSettings;
use crate::context::ContextResolver;
use crate::dispatch::sanitize::iso_timestamp;
use crate::dispatch::{guard, Dispatcher, RecordDraft};
use crate::error::AuditResult;
use crate::loggers::metadata::{entity_metadata, user_action_metadata};
use crate::models::{ActionType, Actor, AuditedEntity, RecordId};

pub use diff::{FieldChange, Snapshot};
pub use registry::{CaptureConfig, LifecycleActions, ModelRegistry};

/// Lifecycle-driven audit capture
pub struct CaptureLayer {
    registry: ModelRegistry,
    resolver: Arc<ContextResolver>,
    dispatcher: Arc<Dispatcher>,
    settings: Arc<AuditSettings>,
}

impl CaptureLayer {
    pub fn new(
        registry: ModelRegistry,
        resolver: Arc<ContextResolver>,
        dispatcher: Arc<Dispatcher>,
        settings: Arc<AuditSettings>,
    ) -> Self {
        Self {
            registry,
            resolver,
            dispatcher,
            settings,
        }
    }

    /// The capture configuration registry
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Administrative API: register or replace a capture configuration at
    /// runtime
    pub fn register(&mut self, kind: crate::models::EntityKind, config: CaptureConfig) {
        self.registry.register(kind, config);
    }

    /// Capture the entity's current tracked-field state before an update
    ///
    /// Returns an empty snapshot for unregistered kinds. When the entity
    /// raced with a concurrent delete and cannot be loaded, callers pass an
    /// empty snapshot instead and diffing later finds no changes.
    pub fn snapshot_before_update(&self, entity: &dyn AuditedEntity) -> Snapshot {
        match self.registry.config(entity.entity_kind()) {
            Some(config) => diff::snapshot(entity, &config.tracked_fields, &self.settings),
            None => Snapshot::new(),
        }
    }

    /// Emit a `created` record for a newly persisted entity
    pub fn record_created(
        &self,
        actor: Option<&Actor>,
        entity: &dyn AuditedEntity,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<RecordId>> {
        guard("capture.record_created", || {
            self.emit_created(actor, entity, extra)
        })
        .map(Option::flatten)
    }

    /// Emit an `updated` record if any tracked field changed
    ///
    /// A diff containing a `status` transition uses the configured
    /// status-changed action instead; a tracked `deleted_at` going from
    /// unset to set is a soft delete and uses the deleted action.
    pub fn record_updated(
        &self,
        actor: Option<&Actor>,
        entity: &dyn AuditedEntity,
        before: &Snapshot,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<RecordId>> {
        guard("capture.record_updated", || {
            self.emit_updated(actor, entity, before, extra)
        })
        .map(Option::flatten)
    }

    /// Emit a `deleted` record carrying the final tracked-field values
    pub fn record_deleted(
        &self,
        actor: Option<&Actor>,
        entity: &dyn AuditedEntity,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<RecordId>> {
        guard("capture.record_deleted", || {
            self.emit_deleted(actor, entity, extra)
        })
        .map(Option::flatten)
    }

    fn emit_created(
        &self,
        actor: Option<&Actor>,
        entity: &dyn AuditedEntity,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<RecordId>> {
        let kind = entity.entity_kind();
        let Some(config) = self.registry.config(kind) else {
            debug!(entity_kind = %kind, "entity kind not registered for capture");
            return Ok(None);
        };

        let metadata = self.build_metadata(actor, entity, config, "create", None, extra);
        self.write(actor, entity, config.actions.created, metadata)
            .map(Some)
    }

    fn emit_updated(
        &self,
        actor: Option<&Actor>,
        entity: &dyn AuditedEntity,
        before: &Snapshot,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<RecordId>> {
        let kind = entity.entity_kind();
        let Some(config) = self.registry.config(kind) else {
            debug!(entity_kind = %kind, "entity kind not registered for capture");
            return Ok(None);
        };

        let changed = diff::changes(before, entity, &self.settings);
        if changed.is_empty() {
            return Ok(None);
        }

        let soft_delete = changed
            .iter()
            .find(|c| c.field == "deleted_at" && c.old_value.is_none() && c.new_value.is_some());
        let status_change = changed.iter().find(|c| c.field == "status");

        let mut specific = Map::new();
        let (action, operation) = if let (Some(change), Some(action)) =
            (soft_delete, config.actions.deleted)
        {
            specific.insert("soft_delete".into(), json!(true));
            specific.insert("deletion_timestamp".into(), json!(change.new_value));
            (action, "delete")
        } else if let (Some(change), Some(action)) = (status_change, config.actions.status_changed)
        {
            specific.insert("old_status".into(), json!(change.old_value));
            specific.insert("new_status".into(), json!(change.new_value));
            (action, "status_change")
        } else if let Some(action) = config.actions.updated {
            (action, "update")
        } else {
            debug!(entity_kind = %kind, "no update action configured, skipping");
            return Ok(None);
        };

        let mut metadata =
            self.build_metadata(actor, entity, config, operation, Some(&changed), extra);
        metadata.extend(specific);

        self.write(actor, entity, action, metadata).map(Some)
    }

    fn emit_deleted(
        &self,
        actor: Option<&Actor>,
        entity: &dyn AuditedEntity,
        extra: Map<String, Value>,
    ) -> AuditResult<Option<RecordId>> {
        let kind = entity.entity_kind();
        let Some(config) = self.registry.config(kind) else {
            debug!(entity_kind = %kind, "entity kind not registered for capture");
            return Ok(None);
        };
        let Some(action) = config.actions.deleted else {
            debug!(entity_kind = %kind, "no delete action configured, skipping");
            return Ok(None);
        };

        let mut metadata = self.build_metadata(actor, entity, config, "delete", None, extra);
        metadata.insert("deletion_timestamp".into(), iso_timestamp(Utc::now()));

        self.write(actor, entity, action, metadata).map(Some)
    }

    /// Shared metadata assembly for all three lifecycle paths
    fn build_metadata(
        &self,
        actor: Option<&Actor>,
        entity: &dyn AuditedEntity,
        config: &CaptureConfig,
        operation: &str,
        changed: Option<&[FieldChange]>,
        extra: Map<String, Value>,
    ) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("automatic_logging".into(), json!(true));
        metadata.extend(extra);
        metadata.insert("operation_type".into(), json!(operation));

        if let Some(changed) = changed {
            metadata.insert("changed_fields".into(), json!(changed));
        }

        if let Some(actor) = actor {
            metadata.extend(user_action_metadata(actor, operation, None));
        }

        metadata.extend(entity_metadata(entity));
        metadata.extend(diff::current_values(
            entity,
            &config.tracked_fields,
            &self.settings,
        ));

        metadata
    }

    fn write(
        &self,
        actor: Option<&Actor>,
        entity: &dyn AuditedEntity,
        action: ActionType,
        metadata: Map<String, Value>,
    ) -> AuditResult<RecordId> {
        let scope = self.resolver.resolve(actor, Some(entity), None);
        let draft = RecordDraft::new(action)
            .actor(actor.map(Actor::reference))
            .target(Some(entity.entity_ref()))
            .scope(scope)
            .metadata(metadata);
        self.dispatcher.write_sync(draft)
    }
}
