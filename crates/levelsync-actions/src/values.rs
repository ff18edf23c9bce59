//! Value types stored in capability slots and action payloads

use levelsync_core::{AssetRef, InstanceId, TileBounds, TileCoord, Vec3, Wire, WireReader, WireWriter};
use serde::{Deserialize, Serialize};

/// Absolute tolerance for float comparisons in diff decisions
pub const FLOAT_TOLERANCE: f32 = 1e-4;

/// A value that can live in a capability slot
pub trait CapabilityValue: Wire + Copy + Default + PartialEq + std::fmt::Debug {
    /// Equality used by the diff: exact for integral values, tolerant for floats
    fn approx_eq(&self, other: &Self) -> bool;

    /// Check that no component is NaN or infinite
    fn is_finite(&self) -> bool {
        true
    }

    /// A value distinct from `Default`, used by the registry self-test
    fn sentinel() -> Self;
}

impl CapabilityValue for f32 {
    fn approx_eq(&self, other: &Self) -> bool {
        (self - other).abs() <= FLOAT_TOLERANCE
    }

    fn is_finite(&self) -> bool {
        f32::is_finite(*self)
    }

    fn sentinel() -> Self {
        1.5
    }
}

impl CapabilityValue for i32 {
    fn approx_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn sentinel() -> Self {
        -7
    }
}

impl CapabilityValue for u32 {
    fn approx_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn sentinel() -> Self {
        7
    }
}

impl CapabilityValue for AssetRef {
    fn approx_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn sentinel() -> Self {
        AssetRef::new(0x5e17_u128 << 64 | 0x5e17)
    }
}

impl CapabilityValue for InstanceId {
    fn approx_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn sentinel() -> Self {
        InstanceId::new(7)
    }
}

impl CapabilityValue for TileCoord {
    fn approx_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn sentinel() -> Self {
        TileCoord::new(3, -4)
    }
}

/// Angle bands that limit splatmap painting to slopes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoSlopeSettings {
    pub min_angle_begin: f32,
    pub min_angle_end: f32,
    pub max_angle_begin: f32,
    pub max_angle_end: f32,
}

impl Wire for AutoSlopeSettings {
    const SIZE: usize = f32::SIZE * 4;

    fn ser(&self, writer: &mut WireWriter) {
        self.min_angle_begin.ser(writer);
        self.min_angle_end.ser(writer);
        self.max_angle_begin.ser(writer);
        self.max_angle_end.ser(writer);
    }

    fn de(reader: &mut WireReader<'_>) -> levelsync_core::Result<Self> {
        Ok(Self {
            min_angle_begin: f32::de(reader)?,
            min_angle_end: f32::de(reader)?,
            max_angle_begin: f32::de(reader)?,
            max_angle_end: f32::de(reader)?,
        })
    }
}

impl CapabilityValue for AutoSlopeSettings {
    fn approx_eq(&self, other: &Self) -> bool {
        self.min_angle_begin.approx_eq(&other.min_angle_begin)
            && self.min_angle_end.approx_eq(&other.min_angle_end)
            && self.max_angle_begin.approx_eq(&other.max_angle_begin)
            && self.max_angle_end.approx_eq(&other.max_angle_end)
    }

    fn is_finite(&self) -> bool {
        self.min_angle_begin.is_finite()
            && self.min_angle_end.is_finite()
            && self.max_angle_begin.is_finite()
            && self.max_angle_end.is_finite()
    }

    fn sentinel() -> Self {
        Self {
            min_angle_begin: 10.0,
            min_angle_end: 20.0,
            max_angle_begin: 40.0,
            max_angle_end: 50.0,
        }
    }
}

/// Raycast settings that limit splatmap painting to object foundations
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoFoundationSettings {
    pub radius: f32,
    pub length: f32,
    pub layer_mask: i32,
}

impl Wire for AutoFoundationSettings {
    const SIZE: usize = f32::SIZE * 2 + i32::SIZE;

    fn ser(&self, writer: &mut WireWriter) {
        self.radius.ser(writer);
        self.length.ser(writer);
        self.layer_mask.ser(writer);
    }

    fn de(reader: &mut WireReader<'_>) -> levelsync_core::Result<Self> {
        Ok(Self {
            radius: f32::de(reader)?,
            length: f32::de(reader)?,
            layer_mask: i32::de(reader)?,
        })
    }
}

impl CapabilityValue for AutoFoundationSettings {
    fn approx_eq(&self, other: &Self) -> bool {
        self.radius.approx_eq(&other.radius)
            && self.length.approx_eq(&other.length)
            && self.layer_mask == other.layer_mask
    }

    fn is_finite(&self) -> bool {
        self.radius.is_finite() && self.length.is_finite()
    }

    fn sentinel() -> Self {
        Self {
            radius: 2.0,
            length: 8.0,
            layer_mask: 0x0f,
        }
    }
}

/// How a flatten stroke treats samples above or below the target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FlattenMethod {
    #[default]
    Regular = 0,
    /// Only lower samples above the target
    Min = 1,
    /// Only raise samples below the target
    Max = 2,
}

impl Wire for FlattenMethod {
    const SIZE: usize = 1;

    fn ser(&self, writer: &mut WireWriter) {
        (*self as u8).ser(writer);
    }

    fn de(reader: &mut WireReader<'_>) -> levelsync_core::Result<Self> {
        match u8::de(reader)? {
            0 => Ok(FlattenMethod::Regular),
            1 => Ok(FlattenMethod::Min),
            2 => Ok(FlattenMethod::Max),
            other => Err(levelsync_core::Error::InvalidValue {
                field: "FlattenMethod",
                value: other as u64,
            }),
        }
    }
}

/// Which neighbourhood a smoothing stroke averages over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SmoothMethod {
    #[default]
    BrushAverage = 0,
    PixelAverage = 1,
}

impl Wire for SmoothMethod {
    const SIZE: usize = 1;

    fn ser(&self, writer: &mut WireWriter) {
        (*self as u8).ser(writer);
    }

    fn de(reader: &mut WireReader<'_>) -> levelsync_core::Result<Self> {
        match u8::de(reader)? {
            0 => Ok(SmoothMethod::BrushAverage),
            1 => Ok(SmoothMethod::PixelAverage),
            other => Err(levelsync_core::Error::InvalidValue {
                field: "SmoothMethod",
                value: other as u64,
            }),
        }
    }
}

/// A value that can appear in an action payload
pub trait PayloadValue: Wire + Clone + Default + PartialEq + std::fmt::Debug {
    /// Structural validity of a decoded or produced value
    fn is_valid(&self) -> bool {
        true
    }
}

impl PayloadValue for bool {}
impl PayloadValue for u8 {}
impl PayloadValue for u32 {}
impl PayloadValue for FlattenMethod {}
impl PayloadValue for SmoothMethod {}

impl PayloadValue for f32 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl PayloadValue for Vec3 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl PayloadValue for TileBounds {
    fn is_valid(&self) -> bool {
        self.is_ordered()
    }
}
