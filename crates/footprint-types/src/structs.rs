//! Record shapes exchanged between the host, the tracking core, and the
//! persistence backend.
//!
//! [`TrackingEvent`] and [`LogRecord`] are ephemeral: they are assembled per
//! call, handed to the sink, and dropped. Their field names are the external
//! contract with the `visitor_tracking` and `system_logs` tables.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{Browser, DeviceType, LogCategory, LogLevel, Os};
use crate::ids::{SessionId, VisitorId};

/// Open key/value payload attached to a [`LogRecord`].
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Device, browser, and operating system derived from a user-agent string.
///
/// Never persisted on its own; it is a pure function of the user agent and
/// is flattened into every [`TrackingEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    /// Device class.
    pub device_type: DeviceType,
    /// Browser family.
    pub browser: Browser,
    /// Operating system.
    pub os: Os,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self {
            device_type: DeviceType::Desktop,
            browser: Browser::Other,
            os: Os::Other,
        }
    }
}

/// A route change reported by the host's navigation source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NavigationTarget {
    /// Path component of the new location (e.g. `/shop`).
    pub pathname: String,
}

impl NavigationTarget {
    /// Create a navigation target for `pathname`.
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
        }
    }
}

/// One page-view record written to the `visitor_tracking` sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    /// Idempotency key (UUID v7). The sink ignores a second insert with the
    /// same key.
    pub event_id: Uuid,
    /// Durable visitor identity.
    pub visitor_id: VisitorId,
    /// Current session identity.
    pub session_id: SessionId,
    /// Full URL of the page at capture time.
    pub page_url: String,
    /// Document title at capture time.
    pub page_title: String,
    /// Referring URL, if the host reported one.
    pub referrer: Option<String>,
    /// Raw user-agent string.
    pub user_agent: String,
    /// Device class.
    pub device_type: DeviceType,
    /// Browser family.
    pub browser: Browser,
    /// Operating system.
    pub os: Os,
    /// Authenticated user, when one was resolved.
    pub user_id: Option<String>,
    /// Capture timestamp.
    pub created_at: DateTime<Utc>,
}

impl TrackingEvent {
    /// The client context flattened into this event.
    pub const fn context(&self) -> ClientContext {
        ClientContext {
            device_type: self.device_type,
            browser: self.browser,
            os: self.os,
        }
    }
}

/// One structured diagnostic record written to the `system_logs` sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Functional area.
    pub category: LogCategory,
    /// Call site identity (component or function name).
    pub source: String,
    /// Human-readable message.
    pub message: String,
    /// Authenticated user the record relates to, if any.
    pub user_id: Option<String>,
    /// Open payload, enriched with `timestamp` and `user_agent` before write.
    pub metadata: Metadata,
    /// Capture timestamp.
    pub created_at: DateTime<Utc>,
}
