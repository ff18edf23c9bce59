//! Error types for levelsync-hub

use levelsync_core::EditorId;
use thiserror::Error;

/// Hub error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} is already connected")]
    AlreadyConnected(EditorId),

    #[error("{0} is not connected")]
    NotConnected(EditorId),

    /// The server identity cannot be used by a connection
    #[error("{0} is reserved")]
    ReservedId(EditorId),

    #[error(transparent)]
    Netcode(#[from] levelsync_netcode::Error),
}

/// Result type for hub operations
pub type Result<T> = std::result::Result<T, Error>;
