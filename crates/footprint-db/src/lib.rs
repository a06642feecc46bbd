//! Data layer for the Footprint tracking core.
//!
//! Two kinds of storage back the core, with different contracts:
//!
//! ```text
//! Navigation / log call
//!     |
//!     +-- identity + session keys --> IdentityStore (sync, local, durable)
//!     |                                 |-- MemoryStore
//!     |                                 +-- FileStore
//!     |
//!     +-- assembled record ---------> RecordSink (async, best-effort)
//!                                       |-- Postgres: VisitStore -> visitor_tracking
//!                                       |             LogStore   -> system_logs
//!                                       +-- Memory
//! ```
//!
//! # Modules
//!
//! - [`kv`] -- Synchronous identity key/value storage
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`visit_store`] -- Tracking event insertion and querying
//! - [`log_store`] -- Structured log insertion and querying
//! - [`sink`] -- The record sink the core writes through
//! - [`error`] -- Shared error types

pub mod error;
pub mod kv;
pub mod log_store;
pub mod postgres;
pub mod sink;
pub mod visit_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use kv::{FileStore, IdentityStore, MemoryStore, SharedStore};
pub use log_store::{LogRow, LogStore};
pub use postgres::{PostgresConfig, PostgresPool};
pub use sink::{MemorySink, RecordSink};
pub use visit_store::{VisitRow, VisitStore};
