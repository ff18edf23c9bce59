//! Client-side session
//!
//! One editor process talks to the server through a single connection. Its
//! own actions go out through the local actor; actions other editors made
//! arrive relayed by the server and are decoded by a remote actor per
//! originating editor, since each origin has its own settings stream.

use crate::config::ReplicationConfig;
use crate::editor_actions::EditorActions;
use crate::error::Result;
use crate::events::ApplyEvents;
use crate::transport::{InboundFrame, Inbox, OutboundFrame};
use bytes::Bytes;
use indexmap::IndexMap;
use levelsync_actions::{Action, ActionRegistry, EditorWorld};
use levelsync_core::{EditorId, FrameTime};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Local and remote action actors of one connected editor
#[derive(Debug)]
pub struct EditorSession {
    registry: Arc<ActionRegistry>,
    config: ReplicationConfig,
    local: EditorActions,
    remotes: IndexMap<EditorId, EditorActions>,
}

impl EditorSession {
    /// Create a session for the editor `local_id`
    pub fn new(local_id: EditorId, registry: Arc<ActionRegistry>, config: ReplicationConfig) -> Self {
        let local = EditorActions::new(local_id, registry.clone(), config.clone());
        Self {
            registry,
            config,
            local,
            remotes: IndexMap::new(),
        }
    }

    pub fn local_id(&self) -> EditorId {
        self.local.owner()
    }

    pub fn local(&self) -> &EditorActions {
        &self.local
    }

    /// Actor decoding the actions of `origin`, if it has sent any
    pub fn remote(&self, origin: EditorId) -> Option<&EditorActions> {
        self.remotes.get(&origin)
    }

    /// Editors heard from, in first-contact order
    pub fn remote_ids(&self) -> impl Iterator<Item = EditorId> + '_ {
        self.remotes.keys().copied()
    }

    /// Queue a locally produced action
    pub fn queue_action(&mut self, action: Action, frame: FrameTime) {
        self.local.queue_action(action, frame);
    }

    /// Advance the flush timer; at most one outgoing message per call
    pub fn update(&mut self, frame: FrameTime) -> Option<OutboundFrame> {
        self.local.update(frame).map(|payload| self.to_server(payload))
    }

    /// Flush immediately regardless of the timer
    pub fn flush(&mut self) -> Option<OutboundFrame> {
        self.local.flush().map(|payload| self.to_server(payload))
    }

    fn to_server(&self, payload: Bytes) -> OutboundFrame {
        OutboundFrame {
            target: EditorId::SERVER,
            origin: self.local.owner(),
            payload,
        }
    }

    /// Route a relayed message to the actor of its origin
    pub fn receive(&mut self, origin: EditorId, bytes: &[u8]) -> Result<usize> {
        if origin == self.local.owner() {
            warn!(origin = %origin, "ignoring echo of own actions");
            return Ok(0);
        }
        let registry = &self.registry;
        let config = &self.config;
        let remote = self.remotes.entry(origin).or_insert_with(|| {
            info!(origin = %origin, "first contact with remote editor");
            EditorActions::new(origin, registry.clone(), config.clone())
        });
        remote.receive(bytes)
    }

    /// Drain an inbox, routing every frame; decode failures are logged and skipped
    pub fn receive_all(&mut self, inbox: &Inbox) -> usize {
        let frames: Vec<InboundFrame> = inbox.drain().collect();
        let mut received = 0;
        for frame in frames {
            match self.receive(frame.origin, &frame.payload) {
                Ok(count) => received += count,
                Err(e) => debug!(error = %e, "skipped inbound frame"),
            }
        }
        received
    }

    /// Forget a remote editor and its settings stream
    pub fn remove_remote(&mut self, origin: EditorId) -> bool {
        self.remotes.shift_remove(&origin).is_some()
    }

    /// Start over after the connection to the server was re-established
    ///
    /// The server's actor for this editor is new, so nothing cached on
    /// either side still holds. Unflushed and unapplied actions are dropped.
    pub fn reset(&mut self) {
        self.local.reset();
        let dropped = self.remotes.len();
        self.remotes.clear();
        info!(editor = %self.local.owner(), remotes = dropped, "session reset");
    }

    /// Run every remote apply loop
    pub fn apply_pending(
        &mut self,
        dt: f32,
        world: &mut dyn EditorWorld,
        events: &mut ApplyEvents,
    ) -> usize {
        self.remotes
            .values_mut()
            .map(|remote| remote.apply_pending(dt, world, events))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelsync_actions::{HolePaint, RecordingWorld};
    use levelsync_core::Clock;

    fn session(id: u64) -> EditorSession {
        let registry = ActionRegistry::shared().unwrap();
        EditorSession::new(EditorId::new(id), registry, ReplicationConfig::default())
    }

    #[test]
    fn test_update_flushes_to_server() {
        let mut alice = session(1);
        let mut clock = Clock::new();
        alice.queue_action(Action::new(HolePaint::default()), clock.advance(0.1));

        assert!(alice.update(clock.advance(0.5)).is_none());
        let frame = alice.update(clock.advance(0.6)).unwrap();
        assert_eq!(frame.target, EditorId::SERVER);
        assert_eq!(frame.origin, EditorId::new(1));
        assert_eq!(alice.local().pending_len(), 0);
    }

    #[test]
    fn test_remote_created_on_first_contact() {
        let mut alice = session(1);
        let mut bob = session(2);
        let mut clock = Clock::new();

        bob.queue_action(Action::new(HolePaint::default()), clock.advance(0.1));
        let frame = bob.flush().unwrap();

        assert!(alice.remote(EditorId::new(2)).is_none());
        assert_eq!(alice.receive(frame.origin, &frame.payload).unwrap(), 1);
        assert_eq!(alice.remote_ids().collect::<Vec<_>>(), vec![EditorId::new(2)]);

        let mut world = RecordingWorld::new();
        let mut events = ApplyEvents::new();
        assert_eq!(alice.apply_pending(0.0, &mut world, &mut events), 1);
        assert_eq!(world.applied()[0].instigator(), EditorId::new(2));

        assert!(alice.remove_remote(EditorId::new(2)));
        assert!(!alice.remove_remote(EditorId::new(2)));
    }

    fn hole(radius: f32) -> Action {
        Action::new(HolePaint {
            brush_radius: radius,
            ..Default::default()
        })
    }

    #[test]
    fn test_reset_resends_settings() {
        let mut alice = session(1);
        let mut bob = session(2);
        let mut clock = Clock::new();

        alice.queue_action(hole(3.0), clock.advance(0.1));
        let frame = alice.flush().unwrap();
        assert_eq!(frame.payload[3], 1);
        bob.receive(frame.origin, &frame.payload).unwrap();

        alice.queue_action(hole(3.0), clock.advance(0.1));
        assert_eq!(alice.flush().unwrap().payload[3], 0);

        alice.reset();
        bob.reset();
        assert_eq!(alice.local().pending_len(), 0);
        assert_eq!(bob.remote_ids().count(), 0);

        // Both sides start from empty caches, so the radius travels again
        alice.queue_action(hole(3.0), clock.advance(0.1));
        let frame = alice.flush().unwrap();
        assert_eq!(frame.payload[3], 1);
        assert_eq!(bob.receive(frame.origin, &frame.payload).unwrap(), 1);
    }

    #[test]
    fn test_own_echo_ignored() {
        let mut alice = session(1);
        assert_eq!(alice.receive(EditorId::new(1), &[0xff]).unwrap(), 0);
        assert_eq!(alice.remote_ids().count(), 0);
    }
}
