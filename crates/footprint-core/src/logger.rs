//! Structured, categorized log records persisted through the record sink.
//!
//! A [`Logger`] is built once at startup and cloned into call sites. Every
//! write is enriched with a capture `timestamp` and the client `user_agent`,
//! then handed to a background task. Failures never reach the caller; they
//! are reported on the [`DIAGNOSTICS`] tracing target instead.
//!
//! The enable flag gates persistence only. It is independent of the
//! `tracing` subscriber level, which filters diagnostics.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use footprint_db::RecordSink;
use footprint_types::{LogCategory, LogLevel, LogRecord, Metadata};
use serde_json::Value;

use crate::DIAGNOSTICS;
use crate::background::{WriteHandle, spawn_write};
use crate::environment::SharedEnvironment;

/// Metadata key holding the RFC 3339 capture time.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Metadata key holding the client user agent.
pub const USER_AGENT_KEY: &str = "user_agent";

struct Inner {
    sink: RecordSink,
    environment: SharedEnvironment,
    enabled: AtomicBool,
}

/// Handle to the structured logger. Clones share the enable flag.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl Logger {
    /// Create a logger writing to `sink`, reading the user agent from
    /// `environment`.
    pub fn new(sink: RecordSink, environment: SharedEnvironment, enabled: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink,
                environment,
                enabled: AtomicBool::new(enabled),
            }),
        }
    }

    /// Turn persistence on or off for every clone of this logger.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether writes are currently persisted.
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Relaxed)
    }

    /// Persist one record. Returns a no-op handle when disabled.
    ///
    /// `metadata` accepts a map or `None`; the capture time and user agent
    /// are always added.
    pub fn write(
        &self,
        level: LogLevel,
        category: LogCategory,
        source: &str,
        message: &str,
        user_id: Option<&str>,
        metadata: impl Into<Option<Metadata>>,
    ) -> WriteHandle {
        if !self.is_enabled() {
            return WriteHandle::noop();
        }

        let record = self.enrich(LogRecord {
            level,
            category,
            source: source.to_owned(),
            message: message.to_owned(),
            user_id: user_id.map(str::to_owned),
            metadata: metadata.into().unwrap_or_default(),
            created_at: Utc::now(),
        });

        let sink = self.inner.sink.clone();
        spawn_write("log record", async move {
            if let Err(e) = sink.insert_log(&record).await {
                tracing::warn!(
                    target: DIAGNOSTICS,
                    sink = sink.name(),
                    category = %record.category,
                    source = %record.source,
                    error = %e,
                    "Failed to persist log record"
                );
            }
        })
    }

    fn enrich(&self, mut record: LogRecord) -> LogRecord {
        record.metadata.insert(
            TIMESTAMP_KEY.to_owned(),
            Value::String(record.created_at.to_rfc3339()),
        );
        record.metadata.insert(
            USER_AGENT_KEY.to_owned(),
            Value::String(self.inner.environment.user_agent()),
        );
        record
    }

    // -- system --------------------------------------------------------------

    /// Debug record in the `system` category.
    pub fn debug(
        &self,
        source: &str,
        message: &str,
        metadata: impl Into<Option<Metadata>>,
    ) -> WriteHandle {
        self.write(LogLevel::Debug, LogCategory::System, source, message, None, metadata)
    }

    /// Info record in the `system` category.
    pub fn info(
        &self,
        source: &str,
        message: &str,
        metadata: impl Into<Option<Metadata>>,
    ) -> WriteHandle {
        self.write(LogLevel::Info, LogCategory::System, source, message, None, metadata)
    }

    /// Warn record in the `system` category.
    pub fn warn(
        &self,
        source: &str,
        message: &str,
        metadata: impl Into<Option<Metadata>>,
    ) -> WriteHandle {
        self.write(LogLevel::Warn, LogCategory::System, source, message, None, metadata)
    }

    /// Error record in the `system` category.
    pub fn error(
        &self,
        source: &str,
        message: &str,
        metadata: impl Into<Option<Metadata>>,
    ) -> WriteHandle {
        self.write(LogLevel::Error, LogCategory::System, source, message, None, metadata)
    }

    // -- correlated categories -----------------------------------------------

    /// Authentication record attributed to `user_id`.
    pub fn auth(
        &self,
        level: LogLevel,
        source: &str,
        message: &str,
        user_id: Option<&str>,
        metadata: impl Into<Option<Metadata>>,
    ) -> WriteHandle {
        let mut metadata = metadata.into().unwrap_or_default();
        if let Some(id) = user_id {
            metadata.insert("user_id".to_owned(), Value::String(id.to_owned()));
        }
        self.write(level, LogCategory::Auth, source, message, user_id, metadata)
    }

    /// Order record; `order_id` is folded into the metadata.
    pub fn order(
        &self,
        level: LogLevel,
        source: &str,
        message: &str,
        order_id: &str,
        metadata: impl Into<Option<Metadata>>,
    ) -> WriteHandle {
        let metadata = fold(metadata.into(), "order_id", order_id);
        self.write(level, LogCategory::Order, source, message, None, metadata)
    }

    /// Payment record; `payment_id` is folded into the metadata.
    pub fn payment(
        &self,
        level: LogLevel,
        source: &str,
        message: &str,
        payment_id: &str,
        metadata: impl Into<Option<Metadata>>,
    ) -> WriteHandle {
        let metadata = fold(metadata.into(), "payment_id", payment_id);
        self.write(level, LogCategory::Payment, source, message, None, metadata)
    }

    /// Edge-function record. The function name is both source and metadata.
    pub fn edge(
        &self,
        level: LogLevel,
        function: &str,
        message: &str,
        metadata: impl Into<Option<Metadata>>,
    ) -> WriteHandle {
        let metadata = fold(metadata.into(), "function", function);
        self.write(level, LogCategory::Edge, function, message, None, metadata)
    }

    /// A logger bound to `source` and `category` (default `system`).
    pub fn scoped(&self, source: &str, category: Option<LogCategory>) -> ScopedLogger {
        ScopedLogger {
            logger: self.clone(),
            source: source.to_owned(),
            category: category.unwrap_or(LogCategory::System),
        }
    }
}

impl core::fmt::Debug for Logger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Logger")
            .field("sink", &self.inner.sink.name())
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

fn fold(metadata: Option<Metadata>, key: &str, id: &str) -> Metadata {
    let mut metadata = metadata.unwrap_or_default();
    metadata.insert(key.to_owned(), Value::String(id.to_owned()));
    metadata
}

/// A [`Logger`] with a fixed source and category.
#[derive(Debug, Clone)]
pub struct ScopedLogger {
    logger: Logger,
    source: String,
    category: LogCategory,
}

impl ScopedLogger {
    /// The bound source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The bound category.
    pub const fn category(&self) -> LogCategory {
        self.category
    }

    fn write(
        &self,
        level: LogLevel,
        message: &str,
        metadata: impl Into<Option<Metadata>>,
    ) -> WriteHandle {
        self.logger
            .write(level, self.category, &self.source, message, None, metadata)
    }

    /// Debug record.
    pub fn debug(&self, message: &str, metadata: impl Into<Option<Metadata>>) -> WriteHandle {
        self.write(LogLevel::Debug, message, metadata)
    }

    /// Info record.
    pub fn info(&self, message: &str, metadata: impl Into<Option<Metadata>>) -> WriteHandle {
        self.write(LogLevel::Info, message, metadata)
    }

    /// Warn record.
    pub fn warn(&self, message: &str, metadata: impl Into<Option<Metadata>>) -> WriteHandle {
        self.write(LogLevel::Warn, message, metadata)
    }

    /// Error record.
    pub fn error(&self, message: &str, metadata: impl Into<Option<Metadata>>) -> WriteHandle {
        self.write(LogLevel::Error, message, metadata)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use footprint_db::MemorySink;
    use serde_json::json;

    use super::*;
    use crate::environment::HostPage;

    fn logger(sink: &MemorySink) -> Logger {
        let page = HostPage::new("https://shop.example", "TestAgent/2.0");
        Logger::new(RecordSink::from(sink.clone()), Arc::new(page), true)
    }

    #[tokio::test]
    async fn write_enriches_metadata() {
        let sink = MemorySink::new();
        let mut metadata = Metadata::new();
        metadata.insert("cart_size".to_owned(), json!(3));

        logger(&sink)
            .write(
                LogLevel::Info,
                LogCategory::Ui,
                "CartDrawer",
                "opened",
                Some("user-7"),
                metadata,
            )
            .settled()
            .await;

        let logs = sink.logs();
        assert_eq!(logs.len(), 1);
        let record = &logs[0];
        assert_eq!(record.category, LogCategory::Ui);
        assert_eq!(record.user_id.as_deref(), Some("user-7"));
        assert_eq!(record.metadata["cart_size"], json!(3));
        assert_eq!(record.metadata[USER_AGENT_KEY], json!("TestAgent/2.0"));
        assert_eq!(
            record.metadata[TIMESTAMP_KEY],
            json!(record.created_at.to_rfc3339())
        );
    }

    #[tokio::test]
    async fn disabled_logger_writes_nothing() {
        let sink = MemorySink::new();
        let logger = logger(&sink);
        let clone = logger.clone();
        clone.set_enabled(false);

        let handle = logger.info("App", "ignored", Metadata::new());
        assert!(handle.is_noop());
        assert!(!logger.is_enabled());

        logger.set_enabled(true);
        logger.info("App", "kept", Metadata::new()).settled().await;
        assert_eq!(sink.logs().len(), 1);
    }

    #[tokio::test]
    async fn rejected_writes_settle_quietly() {
        let sink = MemorySink::rejecting("permission denied for table system_logs");
        logger(&sink)
            .error("Checkout", "boom", Metadata::new())
            .settled()
            .await;
        assert!(sink.logs().is_empty());
    }

    #[tokio::test]
    async fn correlated_entry_points_fold_identifiers() {
        let sink = MemorySink::new();
        let logger = logger(&sink);

        logger
            .order(LogLevel::Info, "Checkout", "placed", "ord-1", Metadata::new())
            .settled()
            .await;
        logger
            .payment(LogLevel::Warn, "Stripe", "declined", "pay-9", Metadata::new())
            .settled()
            .await;
        logger
            .edge(LogLevel::Error, "send-email", "timeout", Metadata::new())
            .settled()
            .await;
        logger
            .auth(LogLevel::Info, "Login", "signed in", Some("user-3"), Metadata::new())
            .settled()
            .await;

        let logs = sink.logs();
        assert_eq!(logs.len(), 4);
        assert_eq!(logs[0].category, LogCategory::Order);
        assert_eq!(logs[0].metadata["order_id"], json!("ord-1"));
        assert_eq!(logs[1].category, LogCategory::Payment);
        assert_eq!(logs[1].metadata["payment_id"], json!("pay-9"));
        assert_eq!(logs[2].category, LogCategory::Edge);
        assert_eq!(logs[2].source, "send-email");
        assert_eq!(logs[2].metadata["function"], json!("send-email"));
        assert_eq!(logs[3].category, LogCategory::Auth);
        assert_eq!(logs[3].user_id.as_deref(), Some("user-3"));
    }

    #[tokio::test]
    async fn scoped_logger_binds_source_and_category() {
        let sink = MemorySink::new();
        let logger = logger(&sink);

        let nav = logger.scoped("Router", Some(LogCategory::Navigation));
        let system = logger.scoped("Boot", None);
        assert_eq!(system.category(), LogCategory::System);

        nav.warn("slow transition", Metadata::new()).settled().await;
        system.debug("ready", Metadata::new()).settled().await;

        let logs = sink.logs();
        assert_eq!(logs[0].source, "Router");
        assert_eq!(logs[0].category, LogCategory::Navigation);
        assert_eq!(logs[0].level, LogLevel::Warn);
        assert_eq!(logs[1].source, "Boot");
        assert_eq!(logs[1].category, LogCategory::System);
    }

    #[test]
    fn write_outside_runtime_is_dropped() {
        let sink = MemorySink::new();
        let handle = logger(&sink).info("App", "no runtime", Metadata::new());
        assert!(handle.is_noop());
        assert!(sink.logs().is_empty());
    }

    #[tokio::test]
    async fn metadata_may_be_omitted() {
        let sink = MemorySink::new();
        let logger = logger(&sink);

        logger.info("App", "started", None).settled().await;
        logger
            .order(LogLevel::Info, "Checkout", "placed", "ord-2", None)
            .settled()
            .await;
        logger.scoped("Router", None).debug("idle", None).settled().await;

        let logs = sink.logs();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].metadata.len(), 2);
        assert!(logs[0].metadata.contains_key(TIMESTAMP_KEY));
        assert!(logs[0].metadata.contains_key(USER_AGENT_KEY));
        assert_eq!(logs[1].metadata["order_id"], json!("ord-2"));
        assert_eq!(logs[2].source, "Router");
    }
}
