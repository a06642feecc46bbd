//! Enumeration types for client context and structured logging.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Client context
// ---------------------------------------------------------------------------

/// Coarse device class derived from the user-agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Phone-class device.
    Mobile,
    /// Tablet-class device.
    Tablet,
    /// Anything else.
    Desktop,
}

impl DeviceType {
    /// Value stored in the `device_type` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
            Self::Desktop => "desktop",
        }
    }
}

/// Browser family derived from the user-agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Browser {
    /// Google Chrome and Chromium builds without a more specific token.
    Chrome,
    /// Apple Safari.
    Safari,
    /// Mozilla Firefox.
    Firefox,
    /// Microsoft Edge (Chromium).
    Edge,
    /// Opera (Presto or `OPR`).
    Opera,
    /// Unrecognized browser.
    Other,
}

impl Browser {
    /// Value stored in the `browser` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chrome => "Chrome",
            Self::Safari => "Safari",
            Self::Firefox => "Firefox",
            Self::Edge => "Edge",
            Self::Opera => "Opera",
            Self::Other => "Other",
        }
    }
}

/// Operating system derived from the user-agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Os {
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    #[serde(rename = "macOS")]
    MacOs,
    /// Desktop Linux.
    Linux,
    /// Google Android.
    Android,
    /// Apple iOS / iPadOS.
    #[serde(rename = "iOS")]
    Ios,
    /// Unrecognized operating system.
    Other,
}

impl Os {
    /// Value stored in the `os` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::MacOs => "macOS",
            Self::Linux => "Linux",
            Self::Android => "Android",
            Self::Ios => "iOS",
            Self::Other => "Other",
        }
    }
}

// ---------------------------------------------------------------------------
// Structured logging
// ---------------------------------------------------------------------------

/// Severity of a structured log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose developer detail.
    Debug,
    /// Normal operational record.
    Info,
    /// Something unexpected that did not fail.
    Warn,
    /// A failed operation.
    Error,
}

impl LogLevel {
    /// Value stored in the `level` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Functional area a structured log record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    /// General application records (default category).
    System,
    /// Sign-in, sign-out, and account events.
    Auth,
    /// Order lifecycle events.
    Order,
    /// Payment processing events.
    Payment,
    /// Server-side edge function invocations.
    Edge,
    /// Route changes and page views.
    Navigation,
    /// User-interface interactions.
    Ui,
}

impl LogCategory {
    /// Value stored in the `category` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Auth => "auth",
            Self::Order => "order",
            Self::Payment => "payment",
            Self::Edge => "edge",
            Self::Navigation => "navigation",
            Self::Ui => "ui",
        }
    }
}

macro_rules! display_as_str {
    ($($name:ident),* $(,)?) => {
        $(
            impl core::fmt::Display for $name {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(DeviceType, Browser, Os, LogLevel, LogCategory);
