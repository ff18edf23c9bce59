//! Capability model
//!
//! A capability is a field group that unrelated action kinds can share, for
//! example the brush radius carried by every terrain brush. Capabilities are
//! replicated through the settings cache instead of inside each action, so an
//! unchanged value costs nothing on the wire.

use crate::values::{AutoFoundationSettings, AutoSlopeSettings, CapabilityValue};
use levelsync_core::{AssetRef, InstanceId, TileCoord, Wire, WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of slots in a capability flag set and in a settings cache
pub const CAPABILITY_SLOTS: usize = 32;

/// Binds a marker type to one capability and its value slot
pub trait CapabilityKind {
    /// Value type stored in the slot
    type Value: CapabilityValue;

    /// The capability this marker stands for
    const CAPABILITY: Capability;

    /// Borrow the slot from a snapshot
    fn slot(values: &SettingsValues) -> &Self::Value;

    /// Mutably borrow the slot from a snapshot
    fn slot_mut(values: &mut SettingsValues) -> &mut Self::Value;
}

capabilities! {
    /// Brush radius in world units
    0 => BrushRadius(brush_radius: f32),
    /// Brush edge falloff in 0..=1
    1 => BrushFalloff(brush_falloff: f32),
    /// Brush strength multiplier
    2 => BrushStrength(brush_strength: f32),
    /// Pressure sensitivity of the brush
    3 => BrushSensitivity(brush_sensitivity: f32),
    /// Target height for flatten strokes
    4 => FlattenTarget(flatten_target: f32),
    /// Slope band limiting splatmap strokes
    5 => AutoSlope(auto_slope: AutoSlopeSettings),
    /// Foundation raycast limiting splatmap strokes
    6 => AutoFoundation(auto_foundation: AutoFoundationSettings),
    /// Asset placed by foliage and object actions
    7 => Asset(asset: AssetRef),
    /// Material painted by splatmap strokes
    8 => SplatMaterial(splat_material: AssetRef),
    /// Tile a stroke started on
    9 => TileCoordinates(tile_coordinates: TileCoord),
    /// Target of object actions
    10 => Instance(instance_id: InstanceId),
}

const _: () = assert!(Capability::COUNT <= CAPABILITY_SLOTS);

impl Capability {
    /// Range check of a staged value
    ///
    /// Rejects non-finite components and out-of-range brush parameters.
    pub fn check(self, values: &SettingsValues) -> Result<(), &'static str> {
        if !values.is_finite(self) {
            return Err("non-finite value");
        }
        match self {
            Capability::BrushRadius if values.brush_radius < 0.0 => Err("negative brush radius"),
            Capability::BrushFalloff if !(0.0..=1.0).contains(&values.brush_falloff) => {
                Err("brush falloff outside 0..=1")
            }
            Capability::BrushStrength if values.brush_strength < 0.0 => {
                Err("negative brush strength")
            }
            Capability::AutoFoundation
                if values.auto_foundation.radius < 0.0 || values.auto_foundation.length < 0.0 =>
            {
                Err("negative foundation raycast")
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of capabilities encoded as a 32-bit flag word
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilitySet(u32);

impl CapabilitySet {
    /// The empty set
    pub const EMPTY: CapabilitySet = CapabilitySet(0);

    /// Every known capability
    pub fn all() -> Self {
        Capability::ALL.iter().copied().collect()
    }

    /// Build a set from raw flags, rejecting unknown bits
    pub fn from_bits_checked(bits: u32) -> Option<Self> {
        let known = Self::all().0;
        if bits & !known == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Raw flag word
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Return a copy with `capability` added
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    /// Add a capability
    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    /// Remove a capability
    pub fn remove(&mut self, capability: Capability) {
        self.0 &= !capability.bit();
    }

    /// Check if a capability is in the set
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn union(self, other: CapabilitySet) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(self, other: CapabilitySet) -> Self {
        Self(self.0 & other.0)
    }

    pub const fn difference(self, other: CapabilitySet) -> Self {
        Self(self.0 & !other.0)
    }

    /// Iterate in ascending bit order
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(move |capability| self.contains(*capability))
    }

    /// Encoded size of the values for every capability in the set
    pub fn values_size(self) -> usize {
        self.iter().map(Capability::wire_size).sum()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::EMPTY;
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Wire for CapabilitySet {
    const SIZE: usize = u32::SIZE;

    fn ser(&self, writer: &mut WireWriter) {
        self.0.ser(writer);
    }

    fn de(reader: &mut WireReader<'_>) -> levelsync_core::Result<Self> {
        let bits = u32::de(reader)?;
        CapabilitySet::from_bits_checked(bits).ok_or(levelsync_core::Error::InvalidValue {
            field: "capability flags",
            value: bits as u64,
        })
    }
}
