//! Error types for the agent binary.
//!
//! Only startup can fail. Once the tracker is running, every failure is
//! absorbed by the fail-silent boundary in `footprint-core`.

/// Top-level error for the agent binary.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: footprint_core::ConfigError,
    },

    /// Reading navigation input failed.
    #[error("input error: {source}")]
    Input {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
