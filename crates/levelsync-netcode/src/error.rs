//! Error types for levelsync-netcode

use levelsync_core::EditorId;
use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// A message from `origin` could not be decoded; the message is dropped
    #[error("Failed to decode message from {origin}: {source}")]
    Decode {
        origin: EditorId,
        #[source]
        source: levelsync_actions::Error,
    },

    /// The action registry failed its self-test
    #[error("Registry error: {0}")]
    Registry(#[from] levelsync_actions::RegistryError),

    /// Configuration could not be parsed or applied
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport could not deliver a frame
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
