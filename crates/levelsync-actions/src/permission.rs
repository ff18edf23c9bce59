//! Permission boundary
//!
//! The decision engine lives outside this crate. The relay only asks one
//! question per action, after structural validation has passed.

use crate::capability::CapabilitySet;
use crate::kinds::ActionKind;
use levelsync_core::EditorId;

/// Decides whether an editor may apply an action
pub trait PermissionPolicy {
    fn can_apply(&self, instigator: EditorId, kind: ActionKind, capabilities: CapabilitySet) -> bool;
}

/// Policy that accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionPolicy for AllowAll {
    fn can_apply(&self, _: EditorId, _: ActionKind, _: CapabilitySet) -> bool {
        true
    }
}

impl<F> PermissionPolicy for F
where
    F: Fn(EditorId, ActionKind, CapabilitySet) -> bool,
{
    fn can_apply(&self, instigator: EditorId, kind: ActionKind, capabilities: CapabilitySet) -> bool {
        self(instigator, kind, capabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_policy() {
        let terrain_only = |_: EditorId, kind: ActionKind, _: CapabilitySet| {
            !matches!(kind, ActionKind::ObjectDelete)
        };
        let policy: &dyn PermissionPolicy = &terrain_only;
        assert!(policy.can_apply(EditorId::new(1), ActionKind::HeightmapAdjust, CapabilitySet::EMPTY));
        assert!(!policy.can_apply(EditorId::new(1), ActionKind::ObjectDelete, CapabilitySet::EMPTY));
        assert!(AllowAll.can_apply(EditorId::SERVER, ActionKind::ObjectDelete, CapabilitySet::EMPTY));
    }
}
