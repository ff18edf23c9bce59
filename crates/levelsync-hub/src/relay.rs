//! RelayHub - Server-side fan-out of editor actions
//!
//! The hub owns one `EditorActions` per connected editor. Every message an
//! editor sends is decoded by that editor's actor, filtered through the
//! permission policy, applied to the server's own world and queued for every
//! other connection. Rejections never reach the sender.

use crate::error::{Error, Result};
use bytes::Bytes;
use indexmap::IndexMap;
use levelsync_actions::{ActionRegistry, AllowAll, EditorWorld, PermissionPolicy};
use levelsync_core::{EditorId, FrameTime};
use levelsync_netcode::{ApplyEvents, EditorActions, FrameSink, Inbox, OutboundFrame, ReplicationConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Central relay for all connected editors
pub struct RelayHub {
    registry: Arc<ActionRegistry>,
    config: ReplicationConfig,
    policy: Box<dyn PermissionPolicy>,
    /// Actors in connection order
    connections: IndexMap<EditorId, EditorActions>,
    outbound: Vec<OutboundFrame>,
}

impl RelayHub {
    /// Create a hub that accepts every well-formed action
    pub fn new(registry: Arc<ActionRegistry>, config: ReplicationConfig) -> Self {
        Self::with_policy(registry, config, AllowAll)
    }

    /// Create a hub with a permission policy
    pub fn with_policy(
        registry: Arc<ActionRegistry>,
        config: ReplicationConfig,
        policy: impl PermissionPolicy + 'static,
    ) -> Self {
        Self {
            registry,
            config,
            policy: Box::new(policy),
            connections: IndexMap::new(),
            outbound: Vec::new(),
        }
    }

    /// Replace the permission policy
    pub fn set_policy(&mut self, policy: impl PermissionPolicy + 'static) {
        self.policy = Box::new(policy);
    }

    /// Register a new editor connection
    ///
    /// The newcomer starts with empty caches, so every existing origin
    /// re-sends its settings on the next relayed message.
    pub fn connect(&mut self, editor: EditorId) -> Result<()> {
        if editor.is_server() {
            return Err(Error::ReservedId(editor));
        }
        if self.connections.contains_key(&editor) {
            return Err(Error::AlreadyConnected(editor));
        }
        for existing in self.connections.values_mut() {
            existing.reset_downstream();
        }
        let actor = EditorActions::new(editor, self.registry.clone(), self.config.clone());
        self.connections.insert(editor, actor);
        info!(editor = %editor, connections = self.connections.len(), "editor connected");
        Ok(())
    }

    /// Drop a connection together with its caches and undelivered frames
    pub fn disconnect(&mut self, editor: EditorId) -> Result<()> {
        let actor = self
            .connections
            .shift_remove(&editor)
            .ok_or(Error::NotConnected(editor))?;
        self.outbound.retain(|frame| frame.target != editor);
        info!(
            editor = %editor,
            dropped_actions = actor.apply_queue_len(),
            connections = self.connections.len(),
            "editor disconnected"
        );
        Ok(())
    }

    pub fn is_connected(&self, editor: EditorId) -> bool {
        self.connections.contains_key(&editor)
    }

    /// Connected editors in connection order
    pub fn connections(&self) -> impl Iterator<Item = EditorId> + '_ {
        self.connections.keys().copied()
    }

    pub fn connection(&self, editor: EditorId) -> Option<&EditorActions> {
        self.connections.get(&editor)
    }

    /// Relay a message from `from` to every other connection
    ///
    /// Returns the number of frames queued.
    pub fn receive(&mut self, from: EditorId, bytes: Bytes) -> Result<usize> {
        let actor = self
            .connections
            .get_mut(&from)
            .ok_or(Error::NotConnected(from))?;
        let messages = actor.relay(bytes, self.policy.as_ref())?;

        let before = self.outbound.len();
        for target in self.connections.keys().copied().filter(|id| *id != from) {
            for payload in &messages {
                self.outbound.push(OutboundFrame {
                    target,
                    origin: from,
                    payload: payload.clone(),
                });
            }
        }
        let queued = self.outbound.len() - before;
        debug!(origin = %from, messages = messages.len(), frames = queued, "fanned out");
        Ok(queued)
    }

    /// Relay everything waiting in an inbox; bad frames are logged and skipped
    pub fn receive_all(&mut self, inbox: &Inbox) -> usize {
        let mut queued = 0;
        for frame in inbox.drain() {
            match self.receive(frame.origin, frame.payload) {
                Ok(n) => queued += n,
                Err(e) => warn!(origin = %frame.origin, error = %e, "dropped inbound frame"),
            }
        }
        queued
    }

    /// Run every connection's apply loop against the server's world
    pub fn tick(&mut self, frame: FrameTime, world: &mut dyn EditorWorld, events: &mut ApplyEvents) -> usize {
        self.connections
            .values_mut()
            .map(|actor| actor.apply_pending(frame.delta, world, events))
            .sum()
    }

    /// Take every queued outbound frame
    pub fn drain_outbound(&mut self) -> Vec<OutboundFrame> {
        std::mem::take(&mut self.outbound)
    }

    /// Hand queued frames to a sink, stopping at the first failure
    ///
    /// Frames not yet sent stay queued.
    pub fn flush_to(&mut self, sink: &mut dyn FrameSink) -> Result<usize> {
        let mut sent = 0;
        let mut frames = std::mem::take(&mut self.outbound).into_iter();
        while let Some(frame) = frames.next() {
            if let Err(e) = sink.send_frame(frame.clone()) {
                self.outbound.push(frame);
                self.outbound.extend(frames);
                return Err(e.into());
            }
            sent += 1;
        }
        Ok(sent)
    }
}

impl std::fmt::Debug for RelayHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayHub")
            .field("connections", &self.connections.len())
            .field("outbound", &self.outbound.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelsync_actions::{Action, ActionKind, CapabilitySet, HolePaint, ObjectDelete, RecordingWorld};
    use levelsync_netcode::Error as NetcodeError;

    fn hub() -> RelayHub {
        RelayHub::new(ActionRegistry::shared().unwrap(), ReplicationConfig::default())
    }

    fn client(id: u64) -> EditorActions {
        EditorActions::new(
            EditorId::new(id),
            ActionRegistry::shared().unwrap(),
            ReplicationConfig::default(),
        )
    }

    #[test]
    fn test_connect_rules() {
        let mut hub = hub();
        hub.connect(EditorId::new(1)).unwrap();
        assert!(matches!(hub.connect(EditorId::new(1)), Err(Error::AlreadyConnected(_))));
        assert!(matches!(hub.connect(EditorId::SERVER), Err(Error::ReservedId(_))));
        assert!(matches!(hub.disconnect(EditorId::new(2)), Err(Error::NotConnected(_))));
        assert!(matches!(
            hub.receive(EditorId::new(2), Bytes::new()),
            Err(Error::NotConnected(_))
        ));
    }

    #[test]
    fn test_fan_out_skips_sender() {
        let mut hub = hub();
        for id in 1..=3 {
            hub.connect(EditorId::new(id)).unwrap();
        }
        let mut alice = client(1);
        alice.queue_action(Action::new(HolePaint::default()), FrameTime::default());

        assert_eq!(hub.receive(EditorId::new(1), alice.flush().unwrap()).unwrap(), 2);
        let targets: Vec<EditorId> = hub.drain_outbound().iter().map(|f| f.target).collect();
        assert_eq!(targets, vec![EditorId::new(2), EditorId::new(3)]);
        assert!(hub.drain_outbound().is_empty());

        let mut world = RecordingWorld::new();
        assert_eq!(hub.tick(FrameTime::default(), &mut world, &mut ApplyEvents::new()), 1);
    }

    #[test]
    fn test_rejected_messages_not_forwarded() {
        let mut hub = hub();
        hub.connect(EditorId::new(1)).unwrap();
        hub.connect(EditorId::new(2)).unwrap();
        hub.set_policy(|_: EditorId, kind: ActionKind, _: CapabilitySet| kind != ActionKind::ObjectDelete);

        let mut alice = client(1);
        alice.queue_action(Action::new(ObjectDelete::default()), FrameTime::default());
        assert_eq!(hub.receive(EditorId::new(1), alice.flush().unwrap()).unwrap(), 0);
        assert_eq!(hub.connection(EditorId::new(1)).unwrap().stats().actions_rejected, 1);
    }

    #[test]
    fn test_malformed_message() {
        let mut hub = hub();
        hub.connect(EditorId::new(1)).unwrap();
        let err = hub
            .receive(EditorId::new(1), Bytes::from_static(&[9, 9]))
            .unwrap_err();
        assert!(matches!(err, Error::Netcode(NetcodeError::Decode { .. })));
    }

    #[test]
    fn test_disconnect_drops_pending_frames() {
        let mut hub = hub();
        hub.connect(EditorId::new(1)).unwrap();
        hub.connect(EditorId::new(2)).unwrap();
        let mut alice = client(1);
        alice.queue_action(Action::new(HolePaint::default()), FrameTime::default());
        hub.receive(EditorId::new(1), alice.flush().unwrap()).unwrap();

        hub.disconnect(EditorId::new(2)).unwrap();
        assert!(hub.drain_outbound().is_empty());
        assert_eq!(hub.connections().collect::<Vec<_>>(), vec![EditorId::new(1)]);
    }

    struct RefusingSink;

    impl FrameSink for RefusingSink {
        fn send_frame(&mut self, _: OutboundFrame) -> levelsync_netcode::Result<()> {
            Err(NetcodeError::Transport("link down".to_string()))
        }
    }

    #[test]
    fn test_flush_to_keeps_unsent_frames() {
        let mut hub = hub();
        hub.connect(EditorId::new(1)).unwrap();
        hub.connect(EditorId::new(2)).unwrap();
        let mut alice = client(1);
        alice.queue_action(Action::new(HolePaint::default()), FrameTime::default());
        hub.receive(EditorId::new(1), alice.flush().unwrap()).unwrap();

        assert!(hub.flush_to(&mut RefusingSink).is_err());
        let mut sink: Vec<OutboundFrame> = Vec::new();
        assert_eq!(hub.flush_to(&mut sink).unwrap(), 1);
        assert_eq!(sink[0].target, EditorId::new(2));
    }
}
