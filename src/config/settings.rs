//! Audit subsystem settings
//!
//! Manages the tunable limits of the engine: metadata size bounds, bulk
//! operation sampling, the sensitive-field list, and retention windows.

use serde::{Deserialize, Serialize};

use super::paths::TrailPaths;
use crate::error::{AuditError, AuditResult};

/// Per-category retention windows, in days
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSettings {
    /// Window for authentication events (shortest)
    pub authentication_days: u32,
    /// Window for policy-designated critical actions (longest)
    pub critical_days: u32,
    /// Window for everything else
    pub default_days: u32,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            authentication_days: 90,
            critical_days: 1095,
            default_days: 365,
        }
    }
}

/// Settings for the audit engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Maximum size of serialized metadata, in characters
    #[serde(default = "default_max_metadata_size")]
    pub max_metadata_size: usize,

    /// Maximum stored length of a user-agent string
    #[serde(default = "default_max_user_agent_length")]
    pub max_user_agent_length: usize,

    /// Bulk operations at or below this count record every affected id
    #[serde(default = "default_bulk_operation_threshold")]
    pub bulk_operation_threshold: usize,

    /// Number of sample ids recorded for large bulk operations
    #[serde(default = "default_bulk_sample_size")]
    pub bulk_sample_size: usize,

    /// Substrings identifying sensitive field names, matched
    /// case-insensitively
    #[serde(default = "default_sensitive_fields")]
    pub sensitive_fields: Vec<String>,

    /// Retention windows per action category
    #[serde(default)]
    pub retention: RetentionSettings,

    /// Number of records deleted per batch during cleanup
    #[serde(default = "default_cleanup_batch_size")]
    pub cleanup_batch_size: usize,

    /// Deadline for acquiring the store's write lock on append, in
    /// milliseconds
    #[serde(default = "default_append_timeout_ms")]
    pub append_timeout_ms: u64,
}

fn default_schema_version() -> u32 {
    1
}

fn default_max_metadata_size() -> usize {
    10_000
}

fn default_max_user_agent_length() -> usize {
    200
}

fn default_bulk_operation_threshold() -> usize {
    50
}

fn default_bulk_sample_size() -> usize {
    10
}

fn default_sensitive_fields() -> Vec<String> {
    [
        "password",
        "token",
        "secret",
        "key",
        "hash",
        "salt",
        "credit_card",
        "ssn",
        "social_security",
        "bank_account",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_cleanup_batch_size() -> usize {
    1000
}

fn default_append_timeout_ms() -> u64 {
    2000
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            max_metadata_size: default_max_metadata_size(),
            max_user_agent_length: default_max_user_agent_length(),
            bulk_operation_threshold: default_bulk_operation_threshold(),
            bulk_sample_size: default_bulk_sample_size(),
            sensitive_fields: default_sensitive_fields(),
            retention: RetentionSettings::default(),
            cleanup_batch_size: default_cleanup_batch_size(),
            append_timeout_ms: default_append_timeout_ms(),
        }
    }
}

impl AuditSettings {
    /// Load settings from disk, creating the file with defaults if missing
    pub fn load_or_create(paths: &TrailPaths) -> AuditResult<Self> {
        let path = paths.settings_file();

        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| AuditError::Config(format!("Failed to read settings: {}", e)))?;
            serde_json::from_str(&contents)
                .map_err(|e| AuditError::Config(format!("Failed to parse settings: {}", e)))
        } else {
            let settings = Self::default();
            settings.save(paths)?;
            Ok(settings)
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TrailPaths) -> AuditResult<()> {
        paths.ensure_directories()?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AuditError::Config(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(paths.settings_file(), json)
            .map_err(|e| AuditError::Config(format!("Failed to write settings: {}", e)))?;
        Ok(())
    }

    /// Check if a field name contains sensitive data
    ///
    /// Matches by substring so `password_hash` and `api_token` are caught
    /// by the `password` and `token` entries.
    pub fn is_sensitive_field(&self, field_name: &str) -> bool {
        let field_lower = field_name.to_lowercase();
        self.sensitive_fields
            .iter()
            .any(|sensitive| field_lower.contains(sensitive.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = AuditSettings::default();
        assert_eq!(settings.max_metadata_size, 10_000);
        assert_eq!(settings.bulk_operation_threshold, 50);
        assert_eq!(settings.bulk_sample_size, 10);
        assert_eq!(settings.retention.authentication_days, 90);
        assert_eq!(settings.retention.default_days, 365);
        assert_eq!(settings.retention.critical_days, 1095);
    }

    #[test]
    fn test_retention_window_ordering() {
        let retention = RetentionSettings::default();
        assert!(retention.authentication_days < retention.default_days);
        assert!(retention.default_days < retention.critical_days);
    }

    #[test]
    fn test_sensitive_field_matching() {
        let settings = AuditSettings::default();
        assert!(settings.is_sensitive_field("password"));
        assert!(settings.is_sensitive_field("password_hash"));
        assert!(settings.is_sensitive_field("API_TOKEN"));
        assert!(settings.is_sensitive_field("session_key"));
        assert!(!settings.is_sensitive_field("title"));
        assert!(!settings.is_sensitive_field("status"));
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TrailPaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = AuditSettings::load_or_create(&paths).unwrap();
        assert!(paths.settings_file().exists());
        assert_eq!(settings.cleanup_batch_size, 1000);

        // Second load reads the file back
        let reloaded = AuditSettings::load_or_create(&paths).unwrap();
        assert_eq!(reloaded.max_metadata_size, settings.max_metadata_size);
    }

    #[test]
    fn test_partial_settings_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TrailPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        std::fs::write(paths.settings_file(), r#"{"bulk_sample_size": 5}"#).unwrap();

        let settings = AuditSettings::load_or_create(&paths).unwrap();
        assert_eq!(settings.bulk_sample_size, 5);
        assert_eq!(settings.max_metadata_size, 10_000);
    }
}
