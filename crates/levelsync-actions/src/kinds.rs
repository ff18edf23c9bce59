//! Concrete editor actions
//!
//! Tags are part of the wire format and must never be reused. Capability
//! fields are replicated through the settings cache; payload fields travel
//! with every action.

use crate::action::{ActionSchema, HasCapability};
use crate::capability::{caps, Capability, CapabilityKind, CapabilitySet, SettingsValues};
use crate::values::{CapabilityValue, FlattenMethod, PayloadValue, SmoothMethod};
use levelsync_core::{TileBounds, Vec3, Wire, WireReader, WireWriter};
use serde::{Deserialize, Serialize};

actions! {
    /// Raise or lower terrain under the brush
    1 => HeightmapAdjust {
        capabilities {
            BrushRadius: brush_radius,
            BrushFalloff: brush_falloff,
            BrushStrength: brush_strength,
            BrushSensitivity: brush_sensitivity,
        }
        payload {
            position: Vec3,
            bounds: TileBounds,
            /// Lower instead of raise
            subtract: bool,
        }
    },
    /// Pull terrain towards a target height
    2 => HeightmapFlatten {
        capabilities {
            BrushRadius: brush_radius,
            BrushFalloff: brush_falloff,
            BrushStrength: brush_strength,
            BrushSensitivity: brush_sensitivity,
            FlattenTarget: flatten_target,
        }
        payload {
            position: Vec3,
            bounds: TileBounds,
            method: FlattenMethod,
        }
    },
    /// Average terrain heights under the brush
    3 => HeightmapSmooth {
        capabilities {
            BrushRadius: brush_radius,
            BrushFalloff: brush_falloff,
            BrushStrength: brush_strength,
            BrushSensitivity: brush_sensitivity,
        }
        payload {
            position: Vec3,
            bounds: TileBounds,
            method: SmoothMethod,
        }
    },
    /// Straight ramp between two points
    4 => HeightmapRamp {
        capabilities {
            BrushRadius: brush_radius,
            BrushFalloff: brush_falloff,
        }
        payload {
            start: Vec3,
            end: Vec3,
            bounds: TileBounds,
        }
    },
    /// Paint a material into the splatmap
    5 => SplatmapPaint {
        capabilities {
            BrushRadius: brush_radius,
            BrushFalloff: brush_falloff,
            BrushStrength: brush_strength,
            BrushSensitivity: brush_sensitivity,
            AutoSlope: auto_slope,
            AutoFoundation: auto_foundation,
            SplatMaterial: splat_material,
        }
        payload {
            position: Vec3,
            bounds: TileBounds,
            /// Erase the material instead of painting it
            remove: bool,
            use_auto_slope: bool,
            use_auto_foundation: bool,
        }
    },
    /// Cut or fill terrain holes
    6 => HolePaint {
        capabilities {
            BrushRadius: brush_radius,
        }
        payload {
            position: Vec3,
            bounds: TileBounds,
            fill: bool,
        }
    },
    /// Scatter foliage of one asset
    7 => FoliageAdd {
        capabilities {
            BrushRadius: brush_radius,
            BrushFalloff: brush_falloff,
            BrushStrength: brush_strength,
            Asset: asset,
            TileCoordinates: tile_coordinates,
        }
        payload {
            position: Vec3,
            /// Seed for placement jitter so every peer scatters identically
            seed: u32,
        }
    },
    /// Remove foliage under the brush
    8 => FoliageRemove {
        capabilities {
            BrushRadius: brush_radius,
            BrushFalloff: brush_falloff,
            Asset: asset,
            TileCoordinates: tile_coordinates,
        }
        payload {
            position: Vec3,
            /// Ignore the asset filter
            remove_all: bool,
        }
    },
    /// Place a new level object
    9 => ObjectInstantiate {
        capabilities {
            Asset: asset,
            Instance: instance_id,
        }
        payload {
            position: Vec3,
            rotation: Vec3,
            scale: Vec3,
        }
    },
    /// Move, rotate or scale a level object
    10 => ObjectTransform {
        capabilities {
            Instance: instance_id,
        }
        payload {
            position: Vec3,
            rotation: Vec3,
            scale: Vec3,
        }
    },
    11 => ObjectDelete {
        capabilities {
            Instance: instance_id,
        }
        payload {}
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_roundtrip() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_tag(kind.tag()), Some(*kind));
            assert_eq!(kind.factory()().kind(), *kind);
        }
        assert_eq!(ActionKind::from_tag(0), None);
        assert_eq!(ActionKind::from_tag(200), None);
    }

    #[test]
    fn test_shared_capabilities() {
        let radius = Capability::BrushRadius;
        assert!(ActionKind::HeightmapAdjust.capabilities().contains(radius));
        assert!(ActionKind::FoliageAdd.capabilities().contains(radius));
        assert!(!ActionKind::ObjectDelete.capabilities().contains(radius));
        assert_eq!(
            ActionKind::ObjectDelete.capabilities(),
            CapabilitySet::EMPTY.with(Capability::Instance)
        );
    }

    #[test]
    fn test_payload_sizes() {
        // position + bounds + bool
        assert_eq!(ActionKind::HeightmapAdjust.payload_size(), 12 + 16 + 1);
        assert_eq!(ActionKind::ObjectTransform.payload_size(), 36);
        assert_eq!(ActionKind::ObjectDelete.payload_size(), 0);
    }

    #[test]
    fn test_payload_excludes_capabilities() {
        let action = FoliageAdd {
            brush_radius: 9.0,
            position: Vec3::new(1.0, 0.0, -1.0),
            seed: 42,
            ..Default::default()
        };
        let mut writer = WireWriter::new();
        action.write_payload(&mut writer);
        assert_eq!(writer.len(), FoliageAdd::PAYLOAD_SIZE);

        let bytes = writer.into_bytes();
        let decoded = FoliageAdd::read_payload(&mut WireReader::new(&bytes)).unwrap();
        assert_eq!(decoded.position, action.position);
        assert_eq!(decoded.seed, 42);
        assert_eq!(decoded.brush_radius, 0.0);
    }

    #[test]
    fn test_stage_and_load() {
        let source = HeightmapFlatten {
            flatten_target: 12.5,
            ..Default::default()
        };
        let mut values = SettingsValues::default();
        source.stage(Capability::FlattenTarget, &mut values);
        assert_eq!(values.flatten_target, 12.5);
        assert!(!source.differs(Capability::FlattenTarget, &values));
        // Capabilities the kind does not carry never differ
        assert!(!source.differs(Capability::Asset, &SettingsValues::sentinel()));

        let mut target = HeightmapFlatten::default();
        target.load(Capability::FlattenTarget, &values);
        assert_eq!(target.flatten_target, 12.5);
    }
}
