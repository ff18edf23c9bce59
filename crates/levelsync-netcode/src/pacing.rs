//! Action pacing
//!
//! Remote actions are replayed with the same spacing they were produced with.
//! The producer stamps each action with the time since the previous enqueue;
//! the consumer accumulates frame time and releases an action once the clock
//! has caught up with its delta.

use levelsync_core::{FrameTime, Tick};

/// Stamps outgoing actions with their delay after the previous one
///
/// The first action enqueued during a tick carries the elapsed time since the
/// last enqueue; any further actions in the same tick carry zero.
#[derive(Debug, Clone, Default)]
pub struct EnqueueStamp {
    last_enqueue: Option<(Tick, f64)>,
}

impl EnqueueStamp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta time for an action enqueued at `frame`
    pub fn stamp(&mut self, frame: FrameTime) -> f32 {
        let delta = match self.last_enqueue {
            Some((tick, _)) if tick == frame.tick => 0.0,
            Some((_, time)) => (frame.time - time).max(0.0) as f32,
            None => 0.0,
        };
        self.last_enqueue = Some((frame.tick, frame.time));
        delta
    }
}

/// Accumulates frame time on the applying side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PacingClock {
    elapsed: f32,
}

impl PacingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add frame time
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    /// Consume `delta` if the clock has reached it
    pub fn try_consume(&mut self, delta: f32) -> bool {
        if delta <= self.elapsed {
            self.elapsed -= delta.max(0.0);
            true
        } else {
            false
        }
    }

    /// Drop accumulated time; called when the queue runs dry
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
