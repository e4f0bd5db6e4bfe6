//! Storage layer for the audit trail
//!
//! Line-delimited JSON persistence with an in-memory index, atomic
//! rewrites, and automatic directory creation.

pub mod file_io;
pub mod records;

pub use file_io::{append_jsonl_line, read_jsonl, write_jsonl_atomic};
pub use records::RecordStore;
