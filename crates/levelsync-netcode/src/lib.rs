//! Levelsync Netcode - Action queues, flush pacing and apply loops
//!
//! This crate runs the replication protocol on top of `levelsync-actions`:
//!
//! - **EditorActions**: per-editor actor that queues local actions, flushes
//!   them in capped batches, decodes incoming batches and applies them paced
//!   by their original spacing
//! - **Relay**: server-side decode, permission filter and downstream re-encode
//! - **EditorSession**: the client's local actor plus one remote actor per
//!   originating editor
//! - **Transport boundary**: inbox for frames arriving from other threads and
//!   a sink for outgoing frames
//!
//! # Architecture
//!
//! ```text
//! producer ─▶ queue_action ─▶ pending ─▶ flush ─▶ bytes ─▶ transport
//!                                 │
//!                      diff against outgoing cache
//!
//! transport ─▶ receive / relay ─▶ decode against incoming cache
//!                   │                     │
//!          permission filter        apply queue ─▶ apply_pending ─▶ world
//! ```
//!
//! # Example
//!
//! ```
//! use levelsync_actions::{Action, ActionRegistry, HeightmapAdjust, RecordingWorld};
//! use levelsync_core::{Clock, EditorId};
//! use levelsync_netcode::{ApplyEvents, EditorActions, ReplicationConfig};
//!
//! let registry = ActionRegistry::shared().unwrap();
//! let config = ReplicationConfig::default();
//! let mut local = EditorActions::new(EditorId::new(1), registry.clone(), config.clone());
//! let mut remote = EditorActions::new(EditorId::new(1), registry, config);
//!
//! let mut clock = Clock::new();
//! local.queue_action(Action::new(HeightmapAdjust::default()), clock.advance(0.016));
//! let bytes = local.flush().unwrap();
//!
//! remote.receive(&bytes).unwrap();
//! let mut world = RecordingWorld::new();
//! remote.apply_pending(0.016, &mut world, &mut ApplyEvents::new());
//! assert_eq!(world.applied().len(), 1);
//! ```

mod config;
mod editor_actions;
mod error;
mod events;
pub mod logging;
mod pacing;
mod session;
mod transport;

pub use config::ReplicationConfig;
pub use editor_actions::{ActorStats, EditorActions};
pub use error::{Error, Result};
pub use events::ApplyEvents;
pub use pacing::{EnqueueStamp, PacingClock};
pub use session::EditorSession;
pub use transport::{inbox, FrameSink, InboundFrame, Inbox, InboxSender, OutboundFrame};
