//! Per-connection action actor
//!
//! `EditorActions` owns everything one editor identity needs on one side of
//! a connection: the queue of locally produced actions waiting for a flush,
//! the settings caches for both directions, and the paced queue of received
//! actions waiting to be applied.
//!
//! ## Caches
//!
//! - `outgoing` mirrors what the peer has decoded from our flushes
//! - `incoming` mirrors what the peer has encoded into messages to us
//! - `downstream` (server only) mirrors what every other peer has decoded
//!   from the relayed copy of this editor's messages

use crate::config::ReplicationConfig;
use crate::error::{Error, Result};
use crate::events::ApplyEvents;
use crate::pacing::{EnqueueStamp, PacingClock};
use bytes::Bytes;
use levelsync_actions::{
    Action, ActionRegistry, BatchDecoder, BatchEncoder, EditorWorld, PermissionPolicy,
    SettingsCache,
};
use levelsync_core::{EditorId, FrameTime};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Traffic and apply counters for one actor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorStats {
    pub messages_sent: u64,
    pub bytes_sent: u64,
    pub actions_flushed: u64,
    pub collections_sent: u64,
    pub messages_received: u64,
    pub bytes_received: u64,
    pub actions_received: u64,
    pub decode_failures: u64,
    pub actions_applied: u64,
    pub actions_cancelled: u64,
    pub apply_failures: u64,
    pub actions_rejected: u64,
    /// Relayed messages forwarded byte for byte
    pub relayed_verbatim: u64,
    /// Relayed messages re-encoded after filtering
    pub relayed_reencoded: u64,
}

/// Action queues and settings caches for one editor identity
#[derive(Debug)]
pub struct EditorActions {
    owner: EditorId,
    registry: Arc<ActionRegistry>,
    config: ReplicationConfig,
    pending: VecDeque<Action>,
    outgoing: SettingsCache,
    incoming: SettingsCache,
    downstream: SettingsCache,
    apply_queue: VecDeque<Action>,
    stamp: EnqueueStamp,
    flush_timer: f32,
    pacing: PacingClock,
    /// Delay of rejected relay actions not yet folded into a survivor
    rejected_carry: f32,
    stats: ActorStats,
}

impl EditorActions {
    /// Create an actor for `owner`
    pub fn new(owner: EditorId, registry: Arc<ActionRegistry>, config: ReplicationConfig) -> Self {
        Self {
            owner,
            registry,
            config,
            pending: VecDeque::new(),
            outgoing: SettingsCache::new(),
            incoming: SettingsCache::new(),
            downstream: SettingsCache::new(),
            apply_queue: VecDeque::new(),
            stamp: EnqueueStamp::new(),
            flush_timer: 0.0,
            pacing: PacingClock::new(),
            rejected_carry: 0.0,
            stats: ActorStats::default(),
        }
    }

    /// The editor identity this actor speaks for
    pub fn owner(&self) -> EditorId {
        self.owner
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    pub fn stats(&self) -> &ActorStats {
        &self.stats
    }

    /// Actions waiting for a flush
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Received actions waiting to be applied
    pub fn apply_queue_len(&self) -> usize {
        self.apply_queue.len()
    }

    /// Received actions waiting to be applied, oldest first
    pub fn apply_queue(&self) -> impl Iterator<Item = &Action> {
        self.apply_queue.iter()
    }

    /// Queue a locally produced action for the next flush
    ///
    /// Stamps the instigator and the delay since the previous enqueue.
    pub fn queue_action(&mut self, mut action: Action, frame: FrameTime) {
        action.set_instigator(self.owner);
        action.set_delta_time(self.stamp.stamp(frame));
        trace!(owner = %self.owner, action = %action, "queued");
        self.pending.push_back(action);
    }

    /// Advance the flush timer; flushes once per elapsed interval
    pub fn update(&mut self, frame: FrameTime) -> Option<Bytes> {
        let interval = self.config.flush_interval_secs();
        self.flush_timer = (self.flush_timer + frame.delta.max(0.0)).min(interval);
        if self.flush_timer < interval || self.pending.is_empty() {
            return None;
        }
        self.flush_timer = 0.0;
        self.flush()
    }

    /// Encode the next message from the pending queue
    ///
    /// Covers at most `max_actions_per_message` actions; larger bursts need
    /// several flushes.
    pub fn flush(&mut self) -> Option<Bytes> {
        if self.pending.is_empty() {
            return None;
        }

        let encoder = BatchEncoder::new(&self.registry, self.config.limits());
        let batch = encoder.encode(&mut self.outgoing, &self.pending);
        if batch.is_empty() {
            return None;
        }
        self.pending.drain(..batch.action_count);

        self.stats.messages_sent += 1;
        self.stats.bytes_sent += batch.bytes.len() as u64;
        self.stats.actions_flushed += batch.action_count as u64;
        self.stats.collections_sent += batch.collection_count as u64;
        debug!(
            owner = %self.owner,
            actions = batch.action_count,
            collections = batch.collection_count,
            bytes = batch.bytes.len(),
            remaining = self.pending.len(),
            "flushed actions"
        );
        Some(Bytes::from(batch.bytes))
    }

    fn decode(&mut self, bytes: &[u8]) -> Result<Vec<Action>> {
        self.stats.messages_received += 1;
        self.stats.bytes_received += bytes.len() as u64;

        let decoder = BatchDecoder::new(&self.registry, self.config.limits());
        match decoder.decode(&mut self.incoming, bytes, self.owner) {
            Ok(batch) => {
                self.stats.actions_received += batch.actions.len() as u64;
                Ok(batch.actions)
            }
            Err(source) => {
                self.stats.decode_failures += 1;
                warn!(origin = %self.owner, error = %source, bytes = bytes.len(), "dropping undecodable message");
                Err(Error::Decode {
                    origin: self.owner,
                    source,
                })
            }
        }
    }

    /// Decode a message from the peer and queue its actions for apply
    pub fn receive(&mut self, bytes: &[u8]) -> Result<usize> {
        let actions = self.decode(bytes)?;
        let count = actions.len();
        debug!(origin = %self.owner, actions = count, "received actions");
        self.apply_queue.extend(actions);
        Ok(count)
    }

    /// Server side: decode, filter through `policy` and prepare the downstream copy
    ///
    /// Accepted actions join the local apply queue. The returned messages are
    /// what every other peer should receive, in order; rejected actions are
    /// dropped silently from the sender's point of view. When every action
    /// passes and the downstream view already matches this actor's incoming
    /// cache, the original bytes are forwarded untouched.
    pub fn relay(&mut self, bytes: Bytes, policy: &dyn PermissionPolicy) -> Result<Vec<Bytes>> {
        let coherent = self.downstream.matches(&self.incoming) && self.rejected_carry == 0.0;
        let actions = self.decode(&bytes)?;
        let total = actions.len();

        let mut survivors = Vec::with_capacity(total);
        for mut action in actions {
            if action.check_can_apply(policy) {
                action.set_delta_time(action.delta_time() + self.rejected_carry);
                self.rejected_carry = 0.0;
                survivors.push(action);
            } else {
                self.rejected_carry += action.delta_time();
                self.stats.actions_rejected += 1;
                warn!(origin = %self.owner, kind = action.kind().name(), "rejected action");
            }
        }

        let downstream = if coherent && survivors.len() == total {
            self.downstream.sync_from(&self.incoming);
            self.stats.relayed_verbatim += 1;
            vec![bytes]
        } else {
            let messages = self.encode_downstream(&survivors);
            if !messages.is_empty() {
                self.stats.relayed_reencoded += 1;
            }
            messages
        };

        debug!(
            origin = %self.owner,
            accepted = survivors.len(),
            rejected = total - survivors.len(),
            messages = downstream.len(),
            "relayed actions"
        );
        self.apply_queue.extend(survivors);
        Ok(downstream)
    }

    fn encode_downstream(&mut self, actions: &[Action]) -> Vec<Bytes> {
        let encoder = BatchEncoder::new(&self.registry, self.config.limits());
        let mut messages = Vec::new();
        let mut offset = 0;
        while offset < actions.len() {
            let batch = encoder.encode(&mut self.downstream, &actions[offset..]);
            if batch.is_empty() {
                break;
            }
            offset += batch.action_count;
            messages.push(Bytes::from(batch.bytes));
        }
        messages
    }

    /// Apply received actions whose delay has elapsed
    ///
    /// Returns the number of actions that reached the world.
    pub fn apply_pending(
        &mut self,
        dt: f32,
        world: &mut dyn EditorWorld,
        events: &mut ApplyEvents,
    ) -> usize {
        self.pacing.advance(dt);
        let mut applied = 0;

        while let Some(front) = self.apply_queue.front() {
            if !self.pacing.try_consume(front.delta_time()) {
                break;
            }
            let Some(action) = self.apply_queue.pop_front() else {
                break;
            };

            if !events.before_apply(&action) {
                self.stats.actions_cancelled += 1;
                debug!(origin = %self.owner, kind = action.kind().name(), "apply cancelled");
                continue;
            }
            match action.apply(world) {
                Ok(()) => {
                    applied += 1;
                    self.stats.actions_applied += 1;
                    events.after_apply(&action);
                }
                Err(e) => {
                    self.stats.apply_failures += 1;
                    warn!(origin = %self.owner, kind = action.kind().name(), error = %e, "apply failed");
                }
            }
        }

        if self.apply_queue.is_empty() {
            self.pacing.reset();
        }
        applied
    }

    /// Drop queued actions and cached settings, as after a reconnect
    pub fn reset(&mut self) {
        self.pending.clear();
        self.apply_queue.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.downstream.clear();
        self.stamp = EnqueueStamp::new();
        self.flush_timer = 0.0;
        self.pacing.reset();
        self.rejected_carry = 0.0;
    }

    /// Forget what peers have decoded from this editor's relayed messages
    ///
    /// Needed whenever a peer joins with an empty cache. The next relayed
    /// message is re-encoded with every capability its actions carry.
    pub fn reset_downstream(&mut self) {
        self.downstream.clear();
        debug!(origin = %self.owner, "downstream view cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelsync_actions::{
        caps, ActionKind, AllowAll, CapabilitySet, HeightmapAdjust, ObjectDelete, ObjectTransform,
        RecordingWorld, WorldError,
    };
    use levelsync_core::{Clock, InstanceId, Vec3};

    fn actor(owner: u64) -> EditorActions {
        EditorActions::new(
            EditorId::new(owner),
            ActionRegistry::shared().unwrap(),
            ReplicationConfig::default(),
        )
    }

    fn brush(radius: f32) -> Action {
        Action::new(HeightmapAdjust {
            brush_radius: radius,
            brush_falloff: 0.5,
            ..Default::default()
        })
    }

    #[test]
    fn test_queue_stamps_owner_and_delay() {
        let mut sender = actor(1);
        let mut clock = Clock::new();
        sender.queue_action(brush(1.0).with_instigator(EditorId::new(9)), clock.advance(0.1));
        clock.advance(0.2);
        let frame = clock.advance(0.3);
        sender.queue_action(brush(2.0), frame);
        sender.queue_action(brush(3.0), frame);

        let mut receiver = actor(1);
        receiver.receive(&sender.flush().unwrap()).unwrap();
        let delays: Vec<f32> = receiver.apply_queue().map(Action::delta_time).collect();
        assert_eq!(delays.len(), 3);
        assert_eq!(delays[0], 0.0);
        assert!((delays[1] - 0.5).abs() < 1e-6);
        assert_eq!(delays[2], 0.0);
        assert!(receiver.apply_queue().all(|a| a.instigator() == EditorId::new(1)));
    }

    #[test]
    fn test_capacity_split() {
        let mut sender = actor(1);
        let mut receiver = actor(1);
        let frame = FrameTime::new(1, 0.0, 0.0);
        for i in 0..150 {
            sender.queue_action(brush((i % 7) as f32), frame);
        }

        let mut messages = 0;
        while let Some(bytes) = sender.flush() {
            assert!(bytes[2] as usize <= 96);
            assert!(bytes[3] as usize <= 255);
            receiver.receive(&bytes).unwrap();
            messages += 1;
        }
        assert!(messages >= 2);
        assert_eq!(receiver.apply_queue_len(), 150);
        assert_eq!(sender.stats().actions_flushed, 150);

        let radii: Vec<f32> = receiver
            .apply_queue()
            .map(|a| a.capability::<caps::BrushRadius>().unwrap())
            .collect();
        let expected: Vec<f32> = (0..150).map(|i| (i % 7) as f32).collect();
        assert_eq!(radii, expected);
    }

    #[test]
    fn test_update_waits_for_interval() {
        let mut sender = actor(1);
        let mut clock = Clock::new();
        assert!(sender.update(clock.advance(2.0)).is_none());

        sender.queue_action(brush(1.0), clock.advance(0.1));
        // The timer saturates while idle, so the first update after queueing flushes
        assert!(sender.update(clock.advance(0.1)).is_some());
        sender.queue_action(brush(1.0), clock.frame());
        assert!(sender.update(clock.advance(0.5)).is_none());
        assert!(sender.update(clock.advance(0.5)).is_some());
    }

    #[test]
    fn test_paced_apply() {
        let mut sender = actor(1);
        let mut receiver = actor(1);
        let mut clock = Clock::new();
        sender.queue_action(brush(1.0), clock.advance(0.1));
        clock.advance(0.4);
        sender.queue_action(brush(2.0), clock.advance(0.1));
        receiver.receive(&sender.flush().unwrap()).unwrap();

        let mut world = RecordingWorld::new();
        let mut events = ApplyEvents::new();
        assert_eq!(receiver.apply_pending(0.1, &mut world, &mut events), 1);
        assert_eq!(receiver.apply_pending(0.3, &mut world, &mut events), 0);
        assert_eq!(receiver.apply_pending(0.2, &mut world, &mut events), 1);
        assert_eq!(receiver.apply_queue_len(), 0);
        assert_eq!(world.applied().len(), 2);
        assert_eq!(receiver.stats().actions_applied, 2);
    }

    #[test]
    fn test_cancelled_actions_skip_world() {
        let mut sender = actor(1);
        let mut receiver = actor(1);
        let frame = FrameTime::new(1, 0.0, 0.0);
        sender.queue_action(brush(1.0), frame);
        sender.queue_action(Action::new(ObjectDelete::default()), frame);
        receiver.receive(&sender.flush().unwrap()).unwrap();

        let mut events = ApplyEvents::new();
        events.on_applying(|action| action.kind() != ActionKind::ObjectDelete);
        let mut world = RecordingWorld::new();
        assert_eq!(receiver.apply_pending(0.0, &mut world, &mut events), 1);
        assert_eq!(world.applied()[0].kind(), ActionKind::HeightmapAdjust);
        assert_eq!(receiver.stats().actions_cancelled, 1);
    }

    struct FailingWorld;

    impl EditorWorld for FailingWorld {
        fn apply_action(&mut self, action: &Action) -> std::result::Result<(), WorldError> {
            Err(WorldError::TargetNotFound(action.kind().name().to_string()))
        }
    }

    #[test]
    fn test_apply_failure_is_counted() {
        let mut sender = actor(1);
        let mut receiver = actor(1);
        sender.queue_action(brush(1.0), FrameTime::default());
        receiver.receive(&sender.flush().unwrap()).unwrap();

        let mut events = ApplyEvents::new();
        assert_eq!(receiver.apply_pending(0.0, &mut FailingWorld, &mut events), 0);
        assert_eq!(receiver.stats().apply_failures, 1);
        assert_eq!(receiver.apply_queue_len(), 0);
    }

    #[test]
    fn test_decode_failure_reports_origin() {
        let mut receiver = actor(4);
        let err = receiver.receive(&[1, 0, 1, 0, 200]).unwrap_err();
        assert!(matches!(err, Error::Decode { origin, .. } if origin == EditorId::new(4)));
        assert_eq!(receiver.stats().decode_failures, 1);
    }

    #[test]
    fn test_relay_fast_path_forwards_original_bytes() {
        let mut client = actor(1);
        let mut server = actor(1);
        let mut peer = actor(1);
        let frame = FrameTime::new(1, 0.0, 0.0);

        for radius in [1.0, 1.0, 2.0] {
            client.queue_action(brush(radius), frame);
        }
        let bytes = client.flush().unwrap();
        let downstream = server.relay(bytes.clone(), &AllowAll).unwrap();
        assert_eq!(downstream, vec![bytes]);
        assert_eq!(server.stats().relayed_verbatim, 1);
        assert_eq!(server.apply_queue_len(), 3);

        peer.receive(&downstream[0]).unwrap();
        assert_eq!(peer.apply_queue_len(), 3);
    }

    #[test]
    fn test_relay_rejection_reencodes_and_folds_delay() {
        let mut client = actor(1);
        let mut server = actor(1);
        let mut peer = actor(1);
        let mut clock = Clock::new();

        client.queue_action(brush(1.0), clock.advance(0.1));
        clock.advance(0.2);
        client.queue_action(
            Action::new(ObjectDelete {
                instance_id: InstanceId::new(5),
            }),
            clock.advance(0.2),
        );
        client.queue_action(brush(3.0), clock.advance(0.25));

        let no_deletes = |_: EditorId, kind: ActionKind, _: CapabilitySet| kind != ActionKind::ObjectDelete;
        let downstream = server.relay(client.flush().unwrap(), &no_deletes).unwrap();
        assert_eq!(downstream.len(), 1);
        assert_eq!(server.stats().actions_rejected, 1);
        assert_eq!(server.stats().relayed_reencoded, 1);

        peer.receive(&downstream[0]).unwrap();
        let received: Vec<&Action> = peer.apply_queue().collect();
        assert_eq!(received.len(), 2);
        assert_eq!(received[1].capability::<caps::BrushRadius>(), Some(3.0));
        // The rejected action's 0.4s delay moves onto the next survivor
        assert!((received[1].delta_time() - 0.65).abs() < 1e-5);

        // The peer never saw the rejected instance id, so the server sends it
        client.queue_action(
            Action::new(ObjectTransform {
                instance_id: InstanceId::new(5),
                position: Vec3::ONE,
                rotation: Vec3::ZERO,
                scale: Vec3::ONE,
            }),
            clock.advance(0.1),
        );
        let bytes = client.flush().unwrap();
        assert_eq!(bytes[3], 0);
        let downstream = server.relay(bytes.clone(), &no_deletes).unwrap();
        assert_ne!(downstream, vec![bytes]);
        peer.receive(&downstream[0]).unwrap();
        assert_eq!(
            peer.apply_queue().last().unwrap().capability::<caps::Instance>(),
            Some(InstanceId::new(5))
        );

        // Views agree again, so the next message is forwarded untouched
        client.queue_action(brush(3.0), clock.advance(0.1));
        let bytes = client.flush().unwrap();
        let downstream = server.relay(bytes.clone(), &no_deletes).unwrap();
        assert_eq!(downstream, vec![bytes]);
        peer.receive(&downstream[0]).unwrap();
        assert_eq!(peer.apply_queue_len(), 4);
    }

    #[test]
    fn test_relay_rejects_invalid_actions() {
        let mut client = actor(1);
        let mut server = actor(1);
        client.queue_action(brush(-5.0), FrameTime::default());
        let downstream = server.relay(client.flush().unwrap(), &AllowAll).unwrap();
        assert!(downstream.is_empty());
        assert_eq!(server.apply_queue_len(), 0);
        assert_eq!(server.stats().actions_rejected, 1);
    }

    #[test]
    fn test_reset_downstream_resends_settings() {
        let mut client = actor(1);
        let mut server = actor(1);
        let frame = FrameTime::new(1, 0.0, 0.0);

        client.queue_action(brush(2.0), frame);
        let bytes = client.flush().unwrap();
        assert_eq!(server.relay(bytes.clone(), &AllowAll).unwrap(), vec![bytes]);

        // A peer joining now has never seen radius 2.0
        let mut late_peer = actor(1);
        server.reset_downstream();

        client.queue_action(brush(2.0), frame);
        let bytes = client.flush().unwrap();
        assert_eq!(bytes[3], 0);
        let downstream = server.relay(bytes.clone(), &AllowAll).unwrap();
        assert_eq!(downstream.len(), 1);
        assert_ne!(downstream[0], bytes);
        assert!(downstream[0][3] > 0);

        late_peer.receive(&downstream[0]).unwrap();
        assert_eq!(
            late_peer.apply_queue().next().unwrap().capability::<caps::BrushRadius>(),
            Some(2.0)
        );
    }

    #[test]
    fn test_reset() {
        let mut sender = actor(1);
        sender.queue_action(brush(1.0), FrameTime::default());
        sender.reset();
        assert_eq!(sender.pending_len(), 0);
        assert!(sender.flush().is_none());
    }
}
