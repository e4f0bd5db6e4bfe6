//! CLI command handlers
//!
//! This module contains the implementation of operator commands,
//! bridging the clap argument parsing with the audit engine.

pub mod cleanup;
pub mod query;

pub use cleanup::{handle_cleanup_command, CleanupArgs};
pub use query::{handle_query_command, ListArgs, QueryCommands};
