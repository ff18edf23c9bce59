//! Two editors exchanging actions through the transport boundary

use levelsync_actions::{
    caps, Action, ActionKind, ActionRegistry, FoliageAdd, HeightmapFlatten, ObjectInstantiate,
    RecordingWorld,
};
use levelsync_core::{AssetRef, Clock, EditorId, InstanceId, Vec3};
use levelsync_netcode::{inbox, ApplyEvents, EditorSession, FrameSink, OutboundFrame, ReplicationConfig};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_session_to_session_through_inbox() {
    let registry = ActionRegistry::shared().unwrap();
    let config = ReplicationConfig::default().with_flush_interval(0.5);
    let mut alice = EditorSession::new(EditorId::new(1), registry.clone(), config.clone());
    let mut bob = EditorSession::new(EditorId::new(2), registry, config);

    let mut clock = Clock::new();
    let tree = AssetRef::new(0xdead_beef);
    alice.queue_action(
        Action::new(FoliageAdd {
            brush_radius: 4.0,
            asset: tree,
            position: Vec3::new(10.0, 0.0, 5.0),
            seed: 7,
            ..Default::default()
        }),
        clock.advance(0.1),
    );
    alice.queue_action(
        Action::new(ObjectInstantiate {
            asset: tree,
            instance_id: InstanceId::new(100),
            position: Vec3::ONE,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }),
        clock.advance(0.2),
    );
    alice.queue_action(
        Action::new(HeightmapFlatten {
            brush_radius: 4.0,
            flatten_target: 2.5,
            ..Default::default()
        }),
        clock.advance(0.1),
    );

    // Stand-in for the server: everything alice flushes is delivered to bob
    let mut outbound: Vec<OutboundFrame> = Vec::new();
    for _ in 0..10 {
        if let Some(frame) = alice.update(clock.advance(0.1)) {
            outbound.send_frame(frame).unwrap();
        }
    }
    assert_eq!(outbound.len(), 1);

    let (sender, bob_inbox) = inbox();
    for frame in outbound {
        sender.send(frame.origin, frame.payload).unwrap();
    }
    assert_eq!(bob.receive_all(&bob_inbox), 3);

    let order = Rc::new(RefCell::new(Vec::new()));
    let log = order.clone();
    let mut events = ApplyEvents::new();
    events.on_applied(move |action| log.borrow_mut().push(action.kind()));

    let mut world = RecordingWorld::new();
    let mut applied = 0;
    for _ in 0..20 {
        applied += bob.apply_pending(0.05, &mut world, &mut events);
    }
    assert_eq!(applied, 3);

    let applied = world.drain();
    assert!(applied.iter().all(|a| a.instigator() == EditorId::new(1)));
    assert_eq!(applied[0].capability::<caps::Asset>(), Some(tree));
    assert_eq!(applied[1].capability::<caps::Instance>(), Some(InstanceId::new(100)));
    // Radius was sent once and restored from bob's cache for the flatten stroke
    assert_eq!(applied[2].capability::<caps::BrushRadius>(), Some(4.0));
    assert_eq!(applied[2].capability::<caps::FlattenTarget>(), Some(2.5));
    assert_eq!(
        *order.borrow(),
        vec![
            ActionKind::FoliageAdd,
            ActionKind::ObjectInstantiate,
            ActionKind::HeightmapFlatten,
        ]
    );
}
