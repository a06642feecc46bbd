//! Visitor identity, session rotation, and fail-silent telemetry for the
//! Footprint tracking core.
//!
//! A navigation flows through the crate like this:
//!
//! ```text
//! Tracker::activate(pathname)
//!     |-- ExclusionPolicy         excluded prefix? stop
//!     |-- NavigationDeduplicator  same as last? stop
//!     +-- Dispatcher::dispatch    (cancels the pending dispatch)
//!             settle delay
//!             user, visitor id, session id, client context
//!             TrackingEvent --> RecordSink (background task)
//! ```
//!
//! The [`Logger`] follows the same enrich-then-write-in-background path for
//! structured log records. No public operation here returns an error or
//! blocks on persistence.
//!
//! # Modules
//!
//! - [`background`] -- Detached writes and their handles.
//! - [`classify`] -- Device, browser, and OS classification.
//! - [`clock`] -- Wall clock abstraction with a manual test clock.
//! - [`config`] -- Loading `footprint.yaml` into typed structs.
//! - [`dedup`] -- Navigation deduplication and excluded routes.
//! - [`dispatch`] -- Tracking event assembly and delayed dispatch.
//! - [`environment`] -- Page metadata and user resolution seams.
//! - [`identity`] -- Durable visitor identifier.
//! - [`logger`] -- Structured, categorized log records.
//! - [`session`] -- Sliding-window session identifier.
//! - [`tracker`] -- The per-navigation activation call.
//!
//! [`Logger`]: logger::Logger

pub mod background;
pub mod classify;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod dispatch;
pub mod environment;
pub mod identity;
pub mod logger;
pub mod session;
pub mod tracker;

/// Tracing target for failures swallowed by the fail-silent boundary.
///
/// Subscribers can route or silence it separately, e.g.
/// `RUST_LOG=info,footprint::diagnostics=debug`.
pub const DIAGNOSTICS: &str = "footprint::diagnostics";

pub use background::WriteHandle;
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{ConfigError, TrackerConfig};
pub use dispatch::Dispatcher;
pub use environment::{Anonymous, HostPage, PageEnvironment, SignedInUser, UserResolver};
pub use identity::VisitorIdentityManager;
pub use logger::{Logger, ScopedLogger};
pub use session::SessionManager;
pub use tracker::{Activation, Tracker};
