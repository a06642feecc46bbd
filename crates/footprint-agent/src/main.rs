//! Footprint agent: a host process for the tracking core.
//!
//! Reads navigation events from stdin (see [`input`] for the line format)
//! and feeds them to a [`Tracker`], logging each route change through a
//! scoped structured logger.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `footprint.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Open the identity store (falls back to memory)
//! 4. Connect the record sink (falls back to memory)
//! 5. Build the tracker and logger
//! 6. Process stdin until EOF, then wait for pending writes

mod error;
mod input;

use std::path::Path;
use std::sync::Arc;

use footprint_core::config::{InfrastructureConfig, TrackerConfig};
use footprint_core::{
    Activation, HostPage, Logger, ScopedLogger, SignedInUser, SystemClock, Tracker, WriteHandle,
};
use footprint_db::{
    FileStore, MemorySink, MemoryStore, PostgresConfig, PostgresPool, RecordSink, SharedStore,
};
use footprint_types::{LogCategory, Metadata};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AgentError;
use crate::input::Command;

/// Origin used for page URLs when `FOOTPRINT_ORIGIN` is unset.
const DEFAULT_ORIGIN: &str = "http://localhost";

/// Application entry point for the agent.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or stdin
/// cannot be read.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        excluded_prefixes = ?config.tracking.excluded_prefixes,
        settle_delay_ms = config.tracking.title_settle_delay_ms,
        session_inactivity_minutes = config.tracking.session_inactivity_minutes,
        "footprint-agent starting"
    );

    // 3. Identity store.
    let store = open_store(&config.storage.identity_path);

    // 4. Record sink.
    let sink = connect_sink(&config.infrastructure).await;
    info!(sink = sink.name(), "Record sink ready");

    // 5. Tracker and logger.
    let origin = std::env::var("FOOTPRINT_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_owned());
    let user_agent = std::env::var("FOOTPRINT_USER_AGENT")
        .unwrap_or_else(|_| format!("footprint-agent/{}", env!("CARGO_PKG_VERSION")));
    let page = HostPage::new(&origin, &user_agent);
    let users = SignedInUser::new();

    let mut tracker = Tracker::from_config(
        &config.tracking,
        store,
        Arc::new(SystemClock),
        Arc::new(page.clone()),
        Arc::new(users.clone()),
        sink.clone(),
    );
    let logger = Logger::new(sink.clone(), Arc::new(page.clone()), config.logging.enabled);
    let nav_log = logger.scoped("footprint-agent", Some(LogCategory::Navigation));

    // 6. Process input.
    let pending = run(&mut tracker, &page, &users, &nav_log).await?;
    let outstanding = pending.len();
    for handle in pending {
        handle.settled().await;
    }
    info!(outstanding, "Input closed, pending writes settled");

    if let RecordSink::Postgres(pool) = &sink {
        pool.close().await;
    }
    Ok(())
}

/// Feed stdin to the tracker until EOF. Returns writes still in flight.
async fn run(
    tracker: &mut Tracker,
    page: &HostPage,
    users: &SignedInUser,
    nav_log: &ScopedLogger,
) -> Result<Vec<WriteHandle>, AgentError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Vec<WriteHandle> = Vec::new();

    while let Some(line) = lines.next_line().await? {
        pending.retain(|handle| !handle.is_finished());

        match input::parse(&line) {
            Some(Command::Navigate { pathname, title }) => {
                page.navigate(&pathname);
                let activation = tracker.activate(&pathname);
                if let Some(title) = title {
                    page.set_title(&title);
                }

                let outcome = match &activation {
                    Activation::Excluded => "excluded",
                    Activation::Duplicate => "duplicate",
                    Activation::Dispatched(_) => "dispatched",
                };
                info!(path = %pathname, outcome, "Navigation");

                if let Activation::Dispatched(handle) = activation {
                    pending.push(handle);
                }
                let mut metadata = Metadata::new();
                metadata.insert("path".to_owned(), Value::String(pathname));
                metadata.insert("outcome".to_owned(), Value::String(outcome.to_owned()));
                pending.push(nav_log.info("route change", metadata));
            }
            Some(Command::SignIn(user_id)) => {
                info!(user_id = %user_id, "User signed in");
                users.set(Some(&user_id));
            }
            Some(Command::SignOut) => {
                info!("User signed out");
                users.set(None);
            }
            None => {}
        }
    }

    Ok(pending)
}

/// Load configuration from `footprint.yaml`, or defaults if it is absent.
///
/// The flag reports whether the file was found. Logging is not initialized
/// yet, so the caller reports it.
fn load_config() -> Result<(TrackerConfig, bool), AgentError> {
    let config_path = Path::new("footprint.yaml");
    if config_path.exists() {
        Ok((TrackerConfig::from_file(config_path)?, true))
    } else {
        Ok((TrackerConfig::default(), false))
    }
}

/// Open the durable identity store, falling back to memory.
fn open_store(path: &Path) -> SharedStore {
    match FileStore::open(path) {
        Ok(store) => {
            info!(path = %path.display(), "Identity store opened");
            Arc::new(store)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Identity store unavailable, identities will not persist");
            MemoryStore::shared()
        }
    }
}

/// Bounded so a long-running agent without a database stays within memory.
fn memory_fallback(infra: &InfrastructureConfig) -> RecordSink {
    debug!(capacity = infra.memory_capacity, "Using bounded in-memory record sink");
    MemorySink::bounded(infra.memory_capacity).into()
}

/// Connect to `PostgreSQL` and migrate, falling back to an in-memory sink.
async fn connect_sink(infra: &InfrastructureConfig) -> RecordSink {
    if infra.postgres_url.is_empty() {
        info!("No database configured, records stay in memory");
        return memory_fallback(infra);
    }

    let config =
        PostgresConfig::new(&infra.postgres_url).with_max_connections(infra.max_connections);
    let pool = match PostgresPool::connect(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            warn!(error = %e, "PostgreSQL unreachable, records stay in memory");
            return memory_fallback(infra);
        }
    };
    if let Err(e) = pool.run_migrations().await {
        warn!(error = %e, "Migrations failed, records stay in memory");
        pool.close().await;
        return memory_fallback(infra);
    }
    pool.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fallback_sink_is_bounded() {
        let infra = InfrastructureConfig {
            memory_capacity: 16,
            ..InfrastructureConfig::default()
        };
        match connect_sink(&infra).await {
            RecordSink::Memory(memory) => assert_eq!(memory.capacity(), Some(16)),
            RecordSink::Postgres(_) => panic!("empty URL must not connect"),
        }
    }
}
