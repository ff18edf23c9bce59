//! Error types for levelsync-actions

use crate::{ActionKind, Capability};
use thiserror::Error;

/// Codec and registry error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Truncated or malformed bytes
    #[error("Wire error: {0}")]
    Wire(#[from] levelsync_core::Error),

    /// Action tag with no registered kind; the rest of the message is unreadable
    #[error("Unknown action tag {0}")]
    UnknownActionTag(u8),

    #[error("Data version mismatch: expected {expected}, got {got}")]
    DataVersionMismatch { expected: u16, got: u16 },

    #[error("Message declares {0} actions, more than allowed")]
    TooManyActions(usize),

    /// A collection points past the last action of its message
    #[error("Collection start index {start_index} out of range for {action_count} actions")]
    CollectionOutOfRange { start_index: u8, action_count: u8 },

    /// A capability value was neither sent nor cached
    #[error("{kind:?} needs {capability} but nothing is cached for it")]
    MissingSetting {
        kind: ActionKind,
        capability: Capability,
    },

    #[error("Invalid {kind:?} action: {reason}")]
    InvalidAction {
        kind: ActionKind,
        reason: &'static str,
    },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Failure of a generated procedure during the registry self-test
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Action tag {tag} is used by both {first:?} and {second:?}")]
    DuplicateTag {
        tag: u8,
        first: ActionKind,
        second: ActionKind,
    },

    #[error("Capability {0} is out of canonical bit order")]
    CapabilityOrder(Capability),

    #[error("Factory for {expected:?} produced {got:?}")]
    FactoryMismatch { expected: ActionKind, got: ActionKind },

    #[error("{kind:?} declares {declared:#x} but generated code handles {generated:#x}")]
    CapabilityMismatch {
        kind: ActionKind,
        declared: u32,
        generated: u32,
    },

    #[error("{kind:?} payload does not survive a write/read cycle")]
    PayloadAsymmetry { kind: ActionKind },

    #[error("{kind:?} stage/load disagree on {capability}")]
    StageLoadMismatch {
        kind: ActionKind,
        capability: Capability,
    },

    #[error("Collection codec failed for {capability}")]
    CollectionCodec { capability: Capability },
}

/// Error returned by an `EditorWorld` when an action cannot take effect
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error("Target {0} not found")]
    TargetNotFound(String),

    #[error("World rejected action: {0}")]
    Rejected(String),
}

/// Result type for codec and registry operations
pub type Result<T> = std::result::Result<T, Error>;
