//! Metadata builders
//!
//! Small composable builders for constructing record metadata in a
//! consistent way. All builders are pure functions over their inputs and
//! never touch the store.

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::dispatch::sanitize::iso_timestamp;
use crate::models::{Actor, AuditedEntity};

/// Request context supplied by web callers; absent for service calls
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip_address: String,
    pub user_agent: String,
    pub http_method: String,
    pub request_path: String,
    pub session_key: Option<String>,
}

/// Describes a file involved in a file operation
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64, content_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            content_type: content_type.into(),
        }
    }
}

/// Extract request metadata, with service-call defaults when no request is
/// present
pub fn request_metadata(
    request: Option<&RequestContext>,
    max_user_agent_length: usize,
) -> Map<String, Value> {
    let mut metadata = Map::new();
    match request {
        Some(request) => {
            let mut user_agent = request.user_agent.clone();
            if user_agent.chars().count() > max_user_agent_length {
                user_agent = user_agent.chars().take(max_user_agent_length).collect();
            }
            metadata.insert("ip_address".into(), json!(request.ip_address));
            metadata.insert("user_agent".into(), json!(user_agent));
            metadata.insert("http_method".into(), json!(request.http_method));
            metadata.insert("request_path".into(), json!(request.request_path));
            metadata.insert("session_key".into(), json!(request.session_key));
            metadata.insert("source".into(), json!("web_request"));
        }
        None => {
            metadata.insert("ip_address".into(), json!("unknown"));
            metadata.insert("user_agent".into(), json!("unknown"));
            metadata.insert("http_method".into(), json!("unknown"));
            metadata.insert("request_path".into(), json!("unknown"));
            metadata.insert("session_key".into(), Value::Null);
            metadata.insert("source".into(), json!("service_call"));
        }
    }
    metadata
}

/// Base metadata common to all manual logging operations
pub fn base_metadata(
    action: &str,
    request: Option<&RequestContext>,
    max_user_agent_length: usize,
    extra: Map<String, Value>,
) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("action".into(), json!(action));
    metadata.insert("manual_logging".into(), json!(true));
    metadata.extend(request_metadata(request, max_user_agent_length));
    metadata.extend(extra);
    metadata
}

/// Identity metadata for the acting principal
///
/// Lifecycle verbs (`create`/`update`/`delete`) get `<verb>_by_*` keys;
/// role nouns (`creator`, `approver`, `submitter`, ...) get `<noun>_*`
/// keys. An optional timestamp key stamps the current time.
pub fn user_action_metadata(
    actor: &Actor,
    verb: &str,
    timestamp_key: Option<&str>,
) -> Map<String, Value> {
    let (id_key, email_key) = if matches!(verb, "create" | "update" | "delete") {
        (format!("{}_by_id", verb), format!("{}_by_email", verb))
    } else {
        (format!("{}_id", verb), format!("{}_email", verb))
    };

    let mut metadata = Map::new();
    metadata.insert(id_key, json!(actor.id.as_uuid().to_string()));
    metadata.insert(email_key, json!(actor.email));

    if let Some(key) = timestamp_key {
        metadata.insert(key.to_string(), iso_timestamp(Utc::now()));
    }

    metadata
}

/// Identity + timestamp metadata for CRUD operations
pub fn crud_action_metadata(
    actor: &Actor,
    action: &str,
    updated_fields: &[String],
    soft_delete: bool,
) -> Map<String, Value> {
    let mut metadata = Map::new();

    match action {
        "create" => {
            metadata.extend(user_action_metadata(
                actor,
                "creator",
                Some("creation_timestamp"),
            ));
        }
        "update" => {
            metadata.extend(user_action_metadata(
                actor,
                "updater",
                Some("update_timestamp"),
            ));
            metadata.insert("updated_fields".into(), json!(updated_fields));
        }
        "delete" => {
            metadata.extend(user_action_metadata(
                actor,
                "deleter",
                Some("deletion_timestamp"),
            ));
            metadata.insert("soft_delete".into(), json!(soft_delete));
        }
        _ => {}
    }

    metadata
}

/// Identity + descriptive metadata for the target entity
///
/// Produces `<kind>_id` and, when the entity has a display name,
/// `<kind>_title`.
pub fn entity_metadata(entity: &dyn AuditedEntity) -> Map<String, Value> {
    let kind = entity.entity_kind();
    let mut metadata = Map::new();
    metadata.insert(
        format!("{}_id", kind),
        json!(entity.entity_uuid().to_string()),
    );
    if let Some(name) = entity.display_name() {
        metadata.insert(format!("{}_title", kind), json!(name));
    }
    metadata
}

/// Workflow-stage metadata for submit/review/withdraw families
pub fn workflow_metadata(
    actor: &Actor,
    action: &str,
    workflow_stage: Option<&str>,
    notes: &str,
    reason: &str,
) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("workflow_action".into(), json!(true));

    if let Some(stage) = workflow_stage {
        metadata.insert("workflow_stage".into(), json!(stage));
        metadata.insert("stage_timestamp".into(), iso_timestamp(Utc::now()));
    }

    match action {
        "submit" | "resubmit" => {
            metadata.extend(user_action_metadata(
                actor,
                "submitter",
                Some("submission_timestamp"),
            ));
            metadata.insert("submission_notes".into(), json!(notes));
        }
        "approve" | "reject" | "return" => {
            metadata.extend(user_action_metadata(
                actor,
                "reviewer",
                Some("review_timestamp"),
            ));
            metadata.insert("review_notes".into(), json!(notes));
            metadata.insert("review_decision".into(), json!(action));
        }
        "withdraw" => {
            metadata.extend(user_action_metadata(
                actor,
                "withdrawer",
                Some("withdrawal_timestamp"),
            ));
            metadata.insert("withdrawal_reason".into(), json!(reason));
        }
        _ => {}
    }

    metadata
}

/// File operation metadata with operation-specific extras
pub fn file_metadata(
    file: &FileInfo,
    operation: &str,
    file_category: &str,
    source: &str,
    purpose: &str,
    reason: &str,
) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("file_name".into(), json!(file.name));
    metadata.insert("file_size".into(), json!(file.size));
    metadata.insert("file_type".into(), json!(file.content_type));
    metadata.insert("operation".into(), json!(operation));
    metadata.insert("file_category".into(), json!(file_category));

    match operation {
        "upload" => {
            metadata.insert("upload_source".into(), json!(source));
            metadata.insert("upload_purpose".into(), json!(purpose));
        }
        "download" => {
            metadata.insert("download_reason".into(), json!(reason));
        }
        _ => {}
    }

    metadata
}

/// Convenience: read a string field from an extras map, with a default
pub fn extra_str<'a>(extra: &'a Map<String, Value>, key: &str, default: &'a str) -> &'a str {
    extra.get(key).and_then(Value::as_str).unwrap_or(default)
}
