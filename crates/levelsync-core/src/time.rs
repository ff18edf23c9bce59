//! Frame-based time for the host simulation loop
//!
//! Provides discrete time for a tick-driven host:
//! - `Tick` - Frame counter
//! - `FrameTime` - Snapshot of the clock handed to every per-frame call
//! - `Clock` - Advances tick and wall time together

use serde::{Deserialize, Serialize};

/// A discrete frame identifier
pub type Tick = u64;

/// The host clock as seen by one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameTime {
    /// Frame counter
    pub tick: Tick,
    /// Seconds since the clock started
    pub time: f64,
    /// Seconds since the previous frame
    pub delta: f32,
}

impl FrameTime {
    /// Create a frame snapshot
    pub fn new(tick: Tick, time: f64, delta: f32) -> Self {
        Self { tick, time, delta }
    }
}

/// Simulation clock
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clock {
    /// Current tick number
    pub tick: Tick,
    /// Elapsed seconds
    pub time: f64,
    /// Duration of the last advance
    pub delta: f32,
}

impl Clock {
    /// Create a clock at tick zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next tick by `delta` seconds
    pub fn advance(&mut self, delta: f32) -> FrameTime {
        let delta = delta.max(0.0);
        self.tick += 1;
        self.time += delta as f64;
        self.delta = delta;
        self.frame()
    }

    /// The current frame snapshot
    pub fn frame(&self) -> FrameTime {
        FrameTime::new(self.tick, self.time, self.delta)
    }
}
