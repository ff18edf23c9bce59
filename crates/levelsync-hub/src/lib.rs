//! Levelsync Hub - Server-side relay for collaborative editing
//!
//! The hub sits between all connected editors. It decodes each editor's
//! messages, drops actions the permission policy refuses, applies the rest to
//! the server's world and forwards them to every other editor.
//!
//! # Example
//!
//! ```
//! use levelsync_actions::{Action, ActionRegistry, HolePaint, RecordingWorld};
//! use levelsync_core::{EditorId, FrameTime};
//! use levelsync_hub::RelayHub;
//! use levelsync_netcode::{ApplyEvents, EditorActions, ReplicationConfig};
//!
//! let registry = ActionRegistry::shared().unwrap();
//! let config = ReplicationConfig::default();
//! let mut hub = RelayHub::new(registry.clone(), config.clone());
//! hub.connect(EditorId::new(1)).unwrap();
//! hub.connect(EditorId::new(2)).unwrap();
//!
//! let mut alice = EditorActions::new(EditorId::new(1), registry, config);
//! alice.queue_action(Action::new(HolePaint::default()), FrameTime::default());
//! hub.receive(EditorId::new(1), alice.flush().unwrap()).unwrap();
//!
//! let frames = hub.drain_outbound();
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].target, EditorId::new(2));
//!
//! let mut world = RecordingWorld::new();
//! hub.tick(FrameTime::default(), &mut world, &mut ApplyEvents::new());
//! assert_eq!(world.applied().len(), 1);
//! ```

mod error;
mod relay;

pub use error::{Error, Result};
pub use relay::RelayHub;
