//! Replicated actions
//!
//! An `Action` wraps one concrete action body with the metadata every action
//! carries: who produced it and how long after the previous action it was
//! produced. Concrete bodies are generated by `actions!` in `kinds`.

use crate::capability::{Capability, CapabilityKind, CapabilitySet, SettingsValues};
use crate::error::{Error, Result, WorldError};
use crate::kinds::{ActionBody, ActionKind};
use crate::permission::PermissionPolicy;
use crate::world::EditorWorld;
use levelsync_core::{EditorId, WireReader, WireWriter};
use std::fmt;

/// Generated per-kind procedures
///
/// Implemented by `actions!` for every concrete action struct.
pub trait ActionSchema: Default + Clone + Into<ActionBody> {
    /// Wire tag
    const KIND: ActionKind;
    /// Capabilities the struct carries
    const CAPABILITIES: CapabilitySet;
    /// Encoded payload size in bytes
    const PAYLOAD_SIZE: usize;

    /// Whether the value for `capability` differs from `cached`
    fn differs(&self, capability: Capability, cached: &SettingsValues) -> bool;

    /// Copy the value for `capability` into a collection snapshot
    fn stage(&self, capability: Capability, values: &mut SettingsValues);

    /// Overwrite the value for `capability` from a cached snapshot
    fn load(&mut self, capability: Capability, values: &SettingsValues);

    fn write_payload(&self, writer: &mut WireWriter);

    fn read_payload(reader: &mut WireReader<'_>) -> levelsync_core::Result<Self>;

    fn payload_is_valid(&self) -> bool;

    /// Diagnostic rendering of every field
    fn describe(&self) -> String;
}

/// Typed access to one capability of a concrete action
pub trait HasCapability<C: CapabilityKind> {
    fn capability(&self) -> C::Value;

    fn set_capability(&mut self, value: C::Value);
}

/// An atomic replicated edit
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    instigator: EditorId,
    delta_time: f32,
    body: ActionBody,
}

impl Action {
    /// Create an action with no instigator and no delay
    pub fn new(body: impl Into<ActionBody>) -> Self {
        Self {
            instigator: EditorId::SERVER,
            delta_time: 0.0,
            body: body.into(),
        }
    }

    /// Builder: set the instigator
    pub fn with_instigator(mut self, instigator: EditorId) -> Self {
        self.instigator = instigator;
        self
    }

    /// Builder: set the delay after the previous action
    pub fn with_delta_time(mut self, delta_time: f32) -> Self {
        self.delta_time = delta_time;
        self
    }

    pub fn instigator(&self) -> EditorId {
        self.instigator
    }

    pub fn set_instigator(&mut self, instigator: EditorId) {
        self.instigator = instigator;
    }

    /// Seconds between the previous action and this one
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn set_delta_time(&mut self, delta_time: f32) {
        self.delta_time = delta_time;
    }

    pub fn kind(&self) -> ActionKind {
        self.body.kind()
    }

    /// Capabilities carried by this action's kind
    pub fn capabilities(&self) -> CapabilitySet {
        self.body.kind().capabilities()
    }

    pub fn body(&self) -> &ActionBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut ActionBody {
        &mut self.body
    }

    pub fn into_body(self) -> ActionBody {
        self.body
    }

    /// Read one capability value, if the kind carries it
    pub fn capability<C: CapabilityKind>(&self) -> Option<C::Value> {
        if !self.capabilities().contains(C::CAPABILITY) {
            return None;
        }
        let mut values = SettingsValues::default();
        self.body.stage(C::CAPABILITY, &mut values);
        Some(*C::slot(&values))
    }

    /// Overwrite one capability value; returns false if the kind lacks it
    pub fn set_capability<C: CapabilityKind>(&mut self, value: C::Value) -> bool {
        if !self.capabilities().contains(C::CAPABILITY) {
            return false;
        }
        let mut values = SettingsValues::default();
        *C::slot_mut(&mut values) = value;
        self.body.load(C::CAPABILITY, &values);
        true
    }

    /// Structural validation of timing, payload and capability ranges
    pub fn validate(&self) -> Result<()> {
        let kind = self.kind();
        if !self.delta_time.is_finite() || self.delta_time < 0.0 {
            return Err(Error::InvalidAction {
                kind,
                reason: "delta time must be finite and non-negative",
            });
        }
        if !self.body.payload_is_valid() {
            return Err(Error::InvalidAction {
                kind,
                reason: "malformed payload",
            });
        }

        let mut values = SettingsValues::default();
        for capability in self.capabilities().iter() {
            self.body.stage(capability, &mut values);
            capability
                .check(&values)
                .map_err(|reason| Error::InvalidAction { kind, reason })?;
        }
        Ok(())
    }

    /// Validate, then ask the policy whether the instigator may apply this action
    pub fn check_can_apply(&self, policy: &dyn PermissionPolicy) -> bool {
        self.validate().is_ok()
            && policy.can_apply(self.instigator, self.kind(), self.capabilities())
    }

    /// Hand the action to the world
    pub fn apply(&self, world: &mut dyn EditorWorld) -> std::result::Result<(), WorldError> {
        world.apply_action(self)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} by {} (+{:.3}s)",
            self.body.describe(),
            self.instigator,
            self.delta_time
        )
    }
}
