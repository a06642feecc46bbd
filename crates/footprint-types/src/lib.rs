//! Shared type definitions for the Footprint tracking core.
//!
//! This crate is the single source of truth for the record shapes that flow
//! between the host application, the tracking core, and the persistence
//! backend. Types flow downstream to `TypeScript` via `ts-rs` so the web
//! host reads the same field names the core writes.
//!
//! # Modules
//!
//! - [`ids`] -- Prefixed visitor and session identifiers
//! - [`enums`] -- Device, browser, OS, log level, and log category
//! - [`structs`] -- Client context, navigation target, tracking and log records

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Browser, DeviceType, LogCategory, LogLevel, Os};
pub use ids::{RANDOM_SUFFIX_LEN, SessionId, VisitorId};
pub use structs::{ClientContext, LogRecord, Metadata, NavigationTarget, TrackingEvent};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to the `bindings/` directory relative to the
        // crate root.
        use ts_rs::TS;

        let _ = crate::ids::VisitorId::export_all();
        let _ = crate::ids::SessionId::export_all();
        let _ = crate::enums::DeviceType::export_all();
        let _ = crate::enums::Browser::export_all();
        let _ = crate::enums::Os::export_all();
        let _ = crate::enums::LogLevel::export_all();
        let _ = crate::enums::LogCategory::export_all();
        let _ = crate::structs::ClientContext::export_all();
        let _ = crate::structs::NavigationTarget::export_all();
        let _ = crate::structs::TrackingEvent::export_all();
        let _ = crate::structs::LogRecord::export_all();
    }
}
