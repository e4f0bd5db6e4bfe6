//! Retention policy and cleanup engine
//!
//! Enforces storage growth bounds and compliance-driven expiry. A run
//! scans for records older than their category's window, then either
//! reports the would-be-deleted counts (dry run) or deletes in fixed-size
//! batches so no single delete operation has to swallow a large backlog.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::config::RetentionSettings;
use crate::error::AuditResult;
use crate::models::{ActionType, RecordId, RetentionCategory};
use crate::storage::RecordStore;

/// Per-category retention windows, in days
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    settings: RetentionSettings,
}

impl RetentionPolicy {
    pub fn new(settings: RetentionSettings) -> Self {
        Self { settings }
    }

    /// The window applied to records in a category
    pub fn window_for_category(&self, category: RetentionCategory) -> u32 {
        match category {
            RetentionCategory::Authentication => self.settings.authentication_days,
            RetentionCategory::Critical => self.settings.critical_days,
            RetentionCategory::Default => self.settings.default_days,
        }
    }

    /// The window applied to records with this action type
    pub fn window_for(&self, action_type: ActionType) -> u32 {
        self.window_for_category(action_type.retention_category())
    }

    pub fn settings(&self) -> &RetentionSettings {
        &self.settings
    }
}

/// Options for one cleanup run
#[derive(Debug, Clone)]
pub struct CleanupOptions {
    /// Report what would be deleted without mutating anything
    pub dry_run: bool,
    /// Number of records deleted per batch
    pub batch_size: usize,
    /// Narrow the run to one action type
    pub action_type: Option<ActionType>,
    /// Ad-hoc window override, in days, applied to every category
    pub override_days: Option<u32>,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            batch_size: 1000,
            action_type: None,
            override_days: None,
        }
    }
}

/// Outcome of one cleanup run
#[derive(Debug, Clone, Serialize)]
pub struct CleanupSummary {
    /// Expired-record counts per retention category
    pub deleted_by_category: BTreeMap<RetentionCategory, usize>,
    /// Records actually deleted (or that would be, on a dry run)
    pub total: usize,
    pub dry_run: bool,
}

/// Batched, resumable record expiry
pub struct CleanupEngine {
    store: Arc<RecordStore>,
    policy: RetentionPolicy,
}

impl CleanupEngine {
    pub fn new(store: Arc<RecordStore>, policy: RetentionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Execute one cleanup run
    ///
    /// Persistence errors propagate: operator tooling needs to know the
    /// store failed. Concurrent writers adding new (non-expired) records
    /// are unaffected; concurrent overlapping runs are safe because batch
    /// deletion is idempotent.
    pub fn run(&self, options: &CleanupOptions) -> AuditResult<CleanupSummary> {
        let now = Utc::now();
        let batch_size = options.batch_size.max(1);

        // Scan for expired records
        let mut expired: Vec<(RecordId, RetentionCategory)> = Vec::new();
        let mut records = self.store.all()?;
        records.sort_by_key(|record| record.timestamp);

        for record in records {
            if let Some(only) = options.action_type {
                if record.action_type != only {
                    continue;
                }
            }

            let category = record.action_type.retention_category();
            let window = options
                .override_days
                .unwrap_or_else(|| self.policy.window_for_category(category));

            if record.is_expired(window, now) {
                expired.push((record.id, category));
            }
        }

        let mut deleted_by_category: BTreeMap<RetentionCategory, usize> = BTreeMap::new();
        for (_, category) in &expired {
            *deleted_by_category.entry(*category).or_insert(0) += 1;
        }

        if options.dry_run {
            let total = expired.len();
            info!(total, "cleanup dry run complete, nothing deleted");
            return Ok(CleanupSummary {
                deleted_by_category,
                total,
                dry_run: true,
            });
        }

        // Delete in fixed-size batches, accumulating a running total
        let mut total = 0;
        let ids: Vec<RecordId> = expired.iter().map(|(id, _)| *id).collect();
        for batch in ids.chunks(batch_size) {
            total += self.store.delete_batch(batch)?;
        }

        info!(total, batches = ids.chunks(batch_size).len(), "cleanup run complete");

        Ok(CleanupSummary {
            deleted_by_category,
            total,
            dry_run: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditRecord;
    use chrono::Duration;
    use serde_json::Map;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        store: Arc<RecordStore>,
        engine: CleanupEngine,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(RecordStore::new(temp.path().join("records.jsonl")));
        let engine = CleanupEngine::new(
            Arc::clone(&store),
            RetentionPolicy::new(RetentionSettings::default()),
        );
        Fixture {
            _temp: temp,
            store,
            engine,
        }
    }

    fn aged_record(action_type: ActionType, age_days: i64) -> AuditRecord {
        let mut record = AuditRecord::new(action_type, None, None, None, None, Map::new());
        record.timestamp = Utc::now() - Duration::days(age_days);
        record
    }

    #[test]
    fn test_windows_per_category() {
        let policy = RetentionPolicy::new(RetentionSettings::default());
        assert_eq!(policy.window_for(ActionType::LoginFailed), 90);
        assert_eq!(policy.window_for(ActionType::UserDeleted), 1095);
        assert_eq!(policy.window_for(ActionType::EntryCreated), 365);
    }

    #[test]
    fn test_authentication_window_shorter_than_default() {
        let fx = fixture();
        // 120 days old: expired for authentication (90), live for default (365)
        fx.store
            .append(aged_record(ActionType::LoginFailed, 120))
            .unwrap();
        fx.store
            .append(aged_record(ActionType::EntryCreated, 120))
            .unwrap();

        let summary = fx.engine.run(&CleanupOptions::default()).unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(
            summary.deleted_by_category.get(&RetentionCategory::Authentication),
            Some(&1)
        );
        assert_eq!(fx.store.count().unwrap(), 1);
    }

    #[test]
    fn test_critical_records_outlive_default_window() {
        let fx = fixture();
        // 400 days old: expired for default (365), live for critical (1095)
        fx.store
            .append(aged_record(ActionType::EntryCreated, 400))
            .unwrap();
        fx.store
            .append(aged_record(ActionType::DataExported, 400))
            .unwrap();

        let summary = fx.engine.run(&CleanupOptions::default()).unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(fx.store.count().unwrap(), 1);
        let remaining = fx.store.all().unwrap();
        assert_eq!(remaining[0].action_type, ActionType::DataExported);
    }

    #[test]
    fn test_dry_run_reports_without_deleting() {
        let fx = fixture();
        fx.store
            .append(aged_record(ActionType::EntryCreated, 400))
            .unwrap();
        fx.store
            .append(aged_record(ActionType::EntryUpdated, 500))
            .unwrap();
        for _ in 0..3 {
            fx.store
                .append(aged_record(ActionType::EntryCreated, 1))
                .unwrap();
        }

        let summary = fx
            .engine
            .run(&CleanupOptions {
                dry_run: true,
                ..Default::default()
            })
            .unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.total, 2);
        assert_eq!(fx.store.count().unwrap(), 5);
    }

    #[test]
    fn test_batched_deletion_exhausts_backlog() {
        let fx = fixture();
        for _ in 0..7 {
            fx.store
                .append(aged_record(ActionType::EntryCreated, 400))
                .unwrap();
        }

        let summary = fx
            .engine
            .run(&CleanupOptions {
                batch_size: 3,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(summary.total, 7);
        assert_eq!(fx.store.count().unwrap(), 0);
    }

    #[test]
    fn test_action_type_narrowing() {
        let fx = fixture();
        fx.store
            .append(aged_record(ActionType::EntryCreated, 400))
            .unwrap();
        fx.store
            .append(aged_record(ActionType::WorkspaceCreated, 400))
            .unwrap();

        let summary = fx
            .engine
            .run(&CleanupOptions {
                action_type: Some(ActionType::EntryCreated),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(fx.store.count().unwrap(), 1);
    }

    #[test]
    fn test_override_window() {
        let fx = fixture();
        fx.store
            .append(aged_record(ActionType::EntryCreated, 10))
            .unwrap();

        // Default window keeps it; an aggressive override expires it
        let untouched = fx.engine.run(&CleanupOptions::default()).unwrap();
        assert_eq!(untouched.total, 0);

        let summary = fx
            .engine
            .run(&CleanupOptions {
                override_days: Some(5),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(fx.store.count().unwrap(), 0);
    }

    #[test]
    fn test_fresh_records_untouched() {
        let fx = fixture();
        fx.store
            .append(aged_record(ActionType::LoginFailed, 1))
            .unwrap();

        let summary = fx.engine.run(&CleanupOptions::default()).unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(fx.store.count().unwrap(), 1);
    }
}
