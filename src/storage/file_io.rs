//! File I/O utilities for the record log
//!
//! Provides line-delimited JSON (JSONL) helpers with atomic rewrites so the
//! record log is either completely written or not modified at all.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::AuditError;

/// Append a single value as one JSON line, flushed immediately
pub fn append_jsonl_line<T, P>(path: P, value: &T) -> Result<(), AuditError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AuditError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AuditError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let json = serde_json::to_string(value)
        .map_err(|e| AuditError::Storage(format!("Failed to serialize record: {}", e)))?;

    writeln!(file, "{}", json)
        .map_err(|e| AuditError::Storage(format!("Failed to write record: {}", e)))?;

    file.flush()
        .map_err(|e| AuditError::Storage(format!("Failed to flush record log: {}", e)))?;

    Ok(())
}

/// Read every JSON line from a file, skipping blanks
///
/// Returns an empty vector if the file does not exist.
pub fn read_jsonl<T, P>(path: P) -> Result<Vec<T>, AuditError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .map_err(|e| AuditError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    let mut values = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            AuditError::Storage(format!("Failed to read line {}: {}", line_num + 1, e))
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let value: T = serde_json::from_str(&line).map_err(|e| {
            AuditError::Storage(format!("Failed to parse line {}: {}", line_num + 1, e))
        })?;

        values.push(value);
    }

    Ok(values)
}

/// Rewrite a JSONL file atomically (write to temp, then rename)
pub fn write_jsonl_atomic<T, P>(path: P, values: &[T]) -> Result<(), AuditError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AuditError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Create temp file in same directory (important for atomic rename)
    let temp_path = path.with_extension("jsonl.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| AuditError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    for value in values {
        let json = serde_json::to_string(value)
            .map_err(|e| AuditError::Storage(format!("Failed to serialize record: {}", e)))?;
        writeln!(writer, "{}", json)
            .map_err(|e| AuditError::Storage(format!("Failed to write record: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| AuditError::Storage(format!("Failed to flush data: {}", e)))?;

    // Sync to disk before rename
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| AuditError::Storage(format!("Failed to sync data: {}", e)))?;

    // Atomic rename
    fs::rename(&temp_path, path).map_err(|e| {
        // Try to clean up temp file if rename fails
        let _ = fs::remove_file(&temp_path);
        AuditError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_read_nonexistent_returns_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.jsonl");

        let data: Vec<TestData> = read_jsonl(&path).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_append_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.jsonl");

        for i in 0..3 {
            let data = TestData {
                name: format!("item-{}", i),
                value: i,
            };
            append_jsonl_line(&path, &data).unwrap();
        }

        let loaded: Vec<TestData> = read_jsonl(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[2].name, "item-2");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.jsonl");

        fs::write(&path, "{\"name\":\"a\",\"value\":1}\n\n{\"name\":\"b\",\"value\":2}\n").unwrap();

        let loaded: Vec<TestData> = read_jsonl(&path).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_atomic_rewrite_no_temp_file_left() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log.jsonl");
        let temp_path = temp_dir.path().join("log.jsonl.tmp");

        let values = vec![
            TestData {
                name: "one".into(),
                value: 1,
            },
            TestData {
                name: "two".into(),
                value: 2,
            },
        ];

        write_jsonl_atomic(&path, &values).unwrap();

        assert!(path.exists());
        assert!(!temp_path.exists());

        let loaded: Vec<TestData> = read_jsonl(&path).unwrap();
        assert_eq!(loaded, values);
    }

    #[test]
    fn test_rewrite_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("log.jsonl");

        write_jsonl_atomic(
            &path,
            &[TestData {
                name: "x".into(),
                value: 0,
            }],
        )
        .unwrap();
        assert!(path.exists());
    }
}
