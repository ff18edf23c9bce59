//! End-to-end: three editors, one hub, a policy that rejects some actions
//!
//! Every peer must end up with the same settings as the hub's downstream
//! view, so capability values that were only ever sent alongside a rejected
//! action still reach the peers when a later accepted action needs them.

use levelsync_actions::{
    caps, Action, ActionKind, ActionRegistry, CapabilitySet, FoliageAdd, FoliageRemove,
    ObjectInstantiate, RecordingWorld,
};
use levelsync_core::{AssetRef, Clock, EditorId, InstanceId, TileCoord, Vec3};
use levelsync_hub::RelayHub;
use levelsync_netcode::{ApplyEvents, EditorSession, ReplicationConfig};

fn deny_foliage_for_carol(instigator: EditorId, kind: ActionKind, _: CapabilitySet) -> bool {
    !(instigator == EditorId::new(3) && kind == ActionKind::FoliageAdd)
}

#[test]
fn test_peers_converge_after_rejections() {
    let registry = ActionRegistry::shared().unwrap();
    let config = ReplicationConfig::default();
    let mut hub = RelayHub::with_policy(registry.clone(), config.clone(), deny_foliage_for_carol);

    let ids: Vec<EditorId> = (1..=3).map(EditorId::new).collect();
    let mut sessions: Vec<EditorSession> = ids
        .iter()
        .map(|id| EditorSession::new(*id, registry.clone(), config.clone()))
        .collect();
    for id in &ids {
        hub.connect(*id).unwrap();
    }

    let mut clock = Clock::new();
    let grass = AssetRef::new(0x9a55);
    let rock = AssetRef::new(0x70c4);
    let carol = 2;

    // Carol adds foliage (rejected), then removes it (accepted) with the same brush
    sessions[carol].queue_action(
        Action::new(FoliageAdd {
            brush_radius: 6.0,
            brush_falloff: 0.3,
            asset: grass,
            tile_coordinates: TileCoord::new(2, 3),
            position: Vec3::new(1.0, 0.0, 1.0),
            ..Default::default()
        }),
        clock.advance(0.1),
    );
    let first = sessions[carol].flush().unwrap();
    hub.receive(first.origin, first.payload).unwrap();

    sessions[carol].queue_action(
        Action::new(FoliageRemove {
            brush_radius: 6.0,
            brush_falloff: 0.3,
            asset: grass,
            tile_coordinates: TileCoord::new(2, 3),
            position: Vec3::new(1.0, 0.0, 1.0),
            remove_all: false,
        }),
        clock.advance(0.1),
    );
    sessions[0].queue_action(
        Action::new(ObjectInstantiate {
            asset: rock,
            instance_id: InstanceId::new(1),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }),
        clock.advance(0.1),
    );
    for session in sessions.iter_mut() {
        if let Some(frame) = session.flush() {
            hub.receive(frame.origin, frame.payload).unwrap();
        }
    }

    for frame in hub.drain_outbound() {
        let target = ids.iter().position(|id| *id == frame.target).unwrap();
        sessions[target].receive(frame.origin, &frame.payload).unwrap();
    }

    let mut server_world = RecordingWorld::new();
    let mut events = ApplyEvents::new();
    for _ in 0..10 {
        hub.tick(clock.advance(0.1), &mut server_world, &mut events);
    }
    let server_kinds: Vec<ActionKind> = server_world.applied().iter().map(Action::kind).collect();
    assert!(!server_kinds.contains(&ActionKind::FoliageAdd));
    assert_eq!(server_kinds.len(), 2);

    // Alice sees carol's removal with the brush settings carol only sent once
    let mut alice_world = RecordingWorld::new();
    for _ in 0..10 {
        sessions[0].apply_pending(0.1, &mut alice_world, &mut events);
    }
    assert_eq!(alice_world.applied().len(), 1);
    let removal = &alice_world.applied()[0];
    assert_eq!(removal.kind(), ActionKind::FoliageRemove);
    assert_eq!(removal.instigator(), EditorId::new(3));
    assert_eq!(removal.capability::<caps::BrushRadius>(), Some(6.0));
    assert_eq!(removal.capability::<caps::Asset>(), Some(grass));
    assert_eq!(removal.capability::<caps::TileCoordinates>(), Some(TileCoord::new(2, 3)));

    // Bob sees both accepted actions; carol only sees alice's
    let mut bob_world = RecordingWorld::new();
    for _ in 0..10 {
        sessions[1].apply_pending(0.1, &mut bob_world, &mut events);
    }
    assert_eq!(bob_world.applied().len(), 2);

    let mut carol_world = RecordingWorld::new();
    for _ in 0..10 {
        sessions[carol].apply_pending(0.1, &mut carol_world, &mut events);
    }
    assert_eq!(carol_world.applied().len(), 1);
    assert_eq!(carol_world.applied()[0].capability::<caps::Asset>(), Some(rock));
}
