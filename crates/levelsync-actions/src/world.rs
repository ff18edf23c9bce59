//! World boundary
//!
//! What an action does to the level is owned by the host. The replication
//! layer hands each action over exactly once, in submission order.

use crate::action::Action;
use crate::error::WorldError;

/// Host-side level state that actions mutate
pub trait EditorWorld {
    fn apply_action(&mut self, action: &Action) -> Result<(), WorldError>;
}

/// World that records every applied action, for tools and tests
#[derive(Debug, Default, Clone)]
pub struct RecordingWorld {
    applied: Vec<Action>,
}

impl RecordingWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions applied so far, oldest first
    pub fn applied(&self) -> &[Action] {
        &self.applied
    }

    /// Take the recorded actions
    pub fn drain(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.applied)
    }
}

impl EditorWorld for RecordingWorld {
    fn apply_action(&mut self, action: &Action) -> Result<(), WorldError> {
        self.applied.push(action.clone());
        Ok(())
    }
}
