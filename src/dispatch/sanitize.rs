//! Metadata sanitization and size bounding
//!
//! Everything persisted in a record's metadata must be a plain JSON
//! document: timestamps render as ISO-8601 text, decimal business values as
//! floating point, anything else as its display string. Oversized documents
//! lose individual fields to truncation rather than dropping the record.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Fields dropped first when a document exceeds the size bound
const LARGE_FIELDS: [&str; 3] = ["user_agent", "request_headers", "response_data"];

/// Maximum length a string value keeps once the document is oversized
const STRING_CAP: usize = 100;

/// Render a timestamp as ISO-8601 text
pub fn iso_timestamp(timestamp: DateTime<Utc>) -> Value {
    Value::String(timestamp.to_rfc3339())
}

/// Render a decimal/numeric business value as floating point, falling back
/// to the raw text when it does not parse
pub fn numeric_value(raw: &str) -> Value {
    match raw.parse::<f64>() {
        Ok(number) => serde_json::Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Render any displayable value as its string form
pub fn display_string<T: std::fmt::Display>(value: T) -> Value {
    Value::String(value.to_string())
}

/// Serialized size of a metadata document, in characters
pub fn serialized_size(metadata: &Map<String, Value>) -> usize {
    serde_json::to_string(metadata).map(|s| s.len()).unwrap_or(0)
}

/// Bound a metadata document to `max_size` serialized characters
///
/// Under the limit the document passes through untouched. Over it, the
/// known-large fields are replaced with a truncation marker first; if that
/// is not enough, every long string value is capped. The record always
/// survives.
pub fn truncate_metadata(metadata: Map<String, Value>, max_size: usize) -> Map<String, Value> {
    if serialized_size(&metadata) <= max_size {
        return metadata;
    }

    let mut truncated = metadata;

    // Remove large fields first
    for field in LARGE_FIELDS {
        if serialized_size(&truncated) <= max_size {
            break;
        }
        if let Some(value) = truncated.get(field) {
            let original_len = match value {
                Value::String(s) => s.len(),
                other => other.to_string().len(),
            };
            truncated.insert(
                field.to_string(),
                Value::String(format!("[TRUNCATED - was {} chars]", original_len)),
            );
        }
    }

    // If still too large, cap long string values
    if serialized_size(&truncated) > max_size {
        let keys: Vec<String> = truncated.keys().cloned().collect();
        for key in keys {
            if let Some(Value::String(s)) = truncated.get(&key) {
                if s.chars().count() > STRING_CAP {
                    let capped: String = s.chars().take(STRING_CAP).collect();
                    truncated.insert(key, Value::String(format!("{}...", capped)));
                }
            }
        }
    }

    truncated
}
