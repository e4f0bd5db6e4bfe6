//! trailkeeper - Audit-trail engine for multi-tenant business applications
//!
//! This library durably records who did what, to which entity, when, and
//! with what contextual detail, for compliance, security review, and
//! operational debugging. Audit records flow in from two directions:
//! automatic capture of entity lifecycle transitions, and a structured
//! logging facade called explicitly from business workflows. Both paths
//! resolve tenant scoping, shape their metadata, and hand off to a
//! failure-isolated dispatcher so audit problems can never fail the
//! triggering business operation.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (records, actions, entity boundary traits)
//! - `storage`: JSONL record store
//! - `capture`: Automatic lifecycle capture (registry + diffing)
//! - `context`: Tenant context resolution
//! - `dispatch`: Failure isolation and the sync/async write paths
//! - `loggers`: Structured logging facade, one logger per domain
//! - `query`: Filtered, ordered views over the store
//! - `retention`: Retention policy and batched cleanup
//! - `trail`: Engine wiring for embedders and the operator CLI
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trailkeeper::config::{AuditSettings, TrailPaths};
//! use trailkeeper::context::InMemoryDirectory;
//! use trailkeeper::trail::AuditTrail;
//!
//! let paths = TrailPaths::new()?;
//! let settings = AuditSettings::load_or_create(&paths)?;
//! let trail = AuditTrail::open(&paths, settings, Arc::new(InMemoryDirectory::new()))?;
//! ```

pub mod capture;
pub mod cli;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod loggers;
pub mod models;
pub mod query;
pub mod retention;
pub mod storage;
pub mod trail;

pub use error::{AuditError, AuditResult};
pub use trail::AuditTrail;
