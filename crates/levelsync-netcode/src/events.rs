//! Apply hooks
//!
//! Hosts observe remote actions as they are applied. A pre-apply hook may
//! cancel an action; a cancelled action is dropped without touching the
//! world and the post-apply hooks do not run for it.

use levelsync_actions::Action;

type ApplyingHook = Box<dyn FnMut(&Action) -> bool>;
type AppliedHook = Box<dyn FnMut(&Action)>;

/// Registered apply hooks
#[derive(Default)]
pub struct ApplyEvents {
    applying: Vec<ApplyingHook>,
    applied: Vec<AppliedHook>,
}

impl ApplyEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pre-apply hook; returning `false` cancels the action
    pub fn on_applying(&mut self, hook: impl FnMut(&Action) -> bool + 'static) {
        self.applying.push(Box::new(hook));
    }

    /// Register a post-apply observer
    pub fn on_applied(&mut self, hook: impl FnMut(&Action) + 'static) {
        self.applied.push(Box::new(hook));
    }

    /// Run every pre-apply hook; false if any of them cancelled
    ///
    /// All hooks run even after a cancellation so each one sees every action.
    pub fn before_apply(&mut self, action: &Action) -> bool {
        let mut allowed = true;
        for hook in self.applying.iter_mut() {
            allowed &= hook(action);
        }
        allowed
    }

    pub fn after_apply(&mut self, action: &Action) {
        for hook in self.applied.iter_mut() {
            hook(action);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.applying.is_empty() && self.applied.is_empty()
    }
}

impl std::fmt::Debug for ApplyEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyEvents")
            .field("applying", &self.applying.len())
            .field("applied", &self.applied.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelsync_actions::ObjectDelete;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_cancel_and_observe() {
        let seen = Rc::new(RefCell::new(0));
        let mut events = ApplyEvents::new();
        assert!(events.is_empty());

        let counter = seen.clone();
        events.on_applying(move |_| {
            *counter.borrow_mut() += 1;
            true
        });
        events.on_applying(|action| action.delta_time() < 1.0);

        let quick = Action::new(ObjectDelete::default());
        let slow = Action::new(ObjectDelete::default()).with_delta_time(2.0);
        assert!(events.before_apply(&quick));
        assert!(!events.before_apply(&slow));
        assert_eq!(*seen.borrow(), 2);

        let applied = Rc::new(RefCell::new(Vec::new()));
        let log = applied.clone();
        events.on_applied(move |action| log.borrow_mut().push(action.delta_time()));
        events.after_apply(&quick);
        assert_eq!(*applied.borrow(), vec![0.0]);
    }
}
