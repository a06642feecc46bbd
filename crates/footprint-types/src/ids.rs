//! Prefixed, time-stamped identifiers for visitors and sessions.
//!
//! Identity values are opaque strings of the form
//! `<prefix>_<epoch-ms>_<random-base36>`. They are minted client-side, kept
//! in the identity store, and written verbatim into every tracking record,
//! so they are modeled as string newtypes rather than parsed structures.
//! Anything read back from storage is accepted as-is.

use rand::Rng;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Number of random base36 characters appended to every minted identifier.
pub const RANDOM_SUFFIX_LEN: usize = 9;

/// Generates a prefixed string identifier newtype with standard derives.
macro_rules! define_token_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(String);

        impl $name {
            /// Leading tag of every identifier minted by this type.
            pub const PREFIX: &'static str = $prefix;

            /// Mint a new identifier stamped with `now_ms` (Unix epoch millis).
            pub fn mint(now_ms: i64) -> Self {
                Self(format!("{}_{now_ms}_{}", Self::PREFIX, random_suffix()))
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`] value.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_token_id! {
    /// Durable per-client visitor identifier (`v_<epoch-ms>_<random>`).
    ///
    /// Created once, persisted indefinitely, never mutated.
    VisitorId, "v"
}

define_token_id! {
    /// Rotating session identifier (`s_<epoch-ms>_<random>`).
    ///
    /// Valid while the sliding inactivity window has not elapsed.
    SessionId, "s"
}

/// Produce [`RANDOM_SUFFIX_LEN`] lowercase base36 characters.
fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..RANDOM_SUFFIX_LEN)
        .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(id: &str) -> Vec<&str> {
        id.split('_').collect()
    }

    #[test]
    fn visitor_id_has_prefix_timestamp_and_suffix() {
        let id = VisitorId::mint(1_700_000_000_123);
        let parts = split(id.as_str());
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.first().copied(), Some("v"));
        assert_eq!(parts.get(1).copied(), Some("1700000000123"));
        let suffix = parts.get(2).copied().unwrap_or_default();
        assert_eq!(suffix.len(), RANDOM_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn session_id_uses_session_prefix() {
        let id = SessionId::mint(42);
        assert!(id.as_str().starts_with("s_42_"));
    }

    #[test]
    fn mints_at_same_instant_differ() {
        let a = SessionId::mint(1);
        let b = SessionId::mint(1);
        assert_ne!(a, b);
    }

    #[test]
    fn stored_values_round_trip_verbatim() {
        let id = VisitorId::from(String::from("legacy-visitor"));
        assert_eq!(id.to_string(), "legacy-visitor");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"legacy-visitor\"");
    }
}
