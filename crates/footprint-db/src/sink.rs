//! The record sink the tracking core writes through.
//!
//! Uses enum dispatch instead of trait objects because async methods are
//! not dyn-compatible. [`RecordSink::Postgres`] is the production backend;
//! [`RecordSink::Memory`] keeps records in process for tests and for hosts
//! running without a database.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use footprint_types::{LogRecord, TrackingEvent};
use uuid::Uuid;

use crate::error::DbError;
use crate::log_store::LogStore;
use crate::postgres::PostgresPool;
use crate::visit_store::VisitStore;

/// Destination for tracking events and log records.
#[derive(Clone, Debug)]
pub enum RecordSink {
    /// Writes to the `visitor_tracking` and `system_logs` tables.
    Postgres(PostgresPool),
    /// Keeps records in memory.
    Memory(MemorySink),
}

impl RecordSink {
    /// Insert one tracking event.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails or rejects the write.
    pub async fn insert_visit(&self, event: &TrackingEvent) -> Result<(), DbError> {
        match self {
            Self::Postgres(pool) => VisitStore::new(pool.pool()).insert(event).await.map(drop),
            Self::Memory(sink) => sink.insert_visit(event),
        }
    }

    /// Insert one structured log record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails or rejects the write.
    pub async fn insert_log(&self, record: &LogRecord) -> Result<(), DbError> {
        match self {
            Self::Postgres(pool) => LogStore::new(pool.pool()).insert(record).await,
            Self::Memory(sink) => sink.insert_log(record),
        }
    }

    /// Human-readable backend name for diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }
}

impl From<PostgresPool> for RecordSink {
    fn from(pool: PostgresPool) -> Self {
        Self::Postgres(pool)
    }
}

impl From<MemorySink> for RecordSink {
    fn from(sink: MemorySink) -> Self {
        Self::Memory(sink)
    }
}

// =============================================================================
// MemorySink
// =============================================================================

/// How a [`MemorySink`] answers writes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    /// Every write fails as if the backend were unreachable.
    Unavailable(String),
    /// Every write is refused as if permissions were missing.
    Rejected(String),
}

#[derive(Debug, Default)]
struct MemoryRecords {
    visits: VecDeque<TrackingEvent>,
    seen_events: BTreeSet<Uuid>,
    logs: VecDeque<LogRecord>,
}

/// In-memory sink. Clones share the same record buffers.
///
/// Mirrors the table contract: a second visit with an `event_id` already
/// seen is accepted but not stored again. A bounded sink keeps only the
/// newest `capacity` visits and logs; older ones are evicted.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<MemoryRecords>>,
    failure: Option<Failure>,
    capacity: Option<usize>,
}

impl MemorySink {
    /// Create an empty, unbounded sink that accepts every write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink retaining at most `capacity` visits and `capacity`
    /// log records. Zero keeps nothing.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// The retention cap, if any.
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Create a sink whose writes always fail with [`DbError::Unavailable`].
    pub fn unavailable(reason: &str) -> Self {
        Self {
            failure: Some(Failure::Unavailable(reason.to_owned())),
            ..Self::default()
        }
    }

    /// Create a sink whose writes always fail with [`DbError::Rejected`].
    pub fn rejecting(reason: &str) -> Self {
        Self {
            failure: Some(Failure::Rejected(reason.to_owned())),
            ..Self::default()
        }
    }

    /// Snapshot of the stored tracking events, in arrival order.
    pub fn visits(&self) -> Vec<TrackingEvent> {
        self.records
            .lock()
            .map(|r| r.visits.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the stored log records, in arrival order.
    pub fn logs(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|r| r.logs.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn check(&self) -> Result<(), DbError> {
        match &self.failure {
            None => Ok(()),
            Some(Failure::Unavailable(reason)) => Err(DbError::Unavailable(reason.clone())),
            Some(Failure::Rejected(reason)) => Err(DbError::Rejected(reason.clone())),
        }
    }

    fn insert_visit(&self, event: &TrackingEvent) -> Result<(), DbError> {
        self.check()?;
        let mut records = self
            .records
            .lock()
            .map_err(|e| DbError::Poisoned(e.to_string()))?;
        if !records.seen_events.insert(event.event_id) {
            return Ok(());
        }
        records.visits.push_back(event.clone());
        while self.over_capacity(records.visits.len()) {
            if let Some(evicted) = records.visits.pop_front() {
                records.seen_events.remove(&evicted.event_id);
                tracing::trace!(event_id = %evicted.event_id, "Evicted visit from memory sink");
            }
        }
        Ok(())
    }

    fn insert_log(&self, record: &LogRecord) -> Result<(), DbError> {
        self.check()?;
        let mut records = self
            .records
            .lock()
            .map_err(|e| DbError::Poisoned(e.to_string()))?;
        records.logs.push_back(record.clone());
        while self.over_capacity(records.logs.len()) {
            records.logs.pop_front();
        }
        Ok(())
    }

    fn over_capacity(&self, len: usize) -> bool {
        self.capacity.is_some_and(|cap| len > cap)
    }
}
