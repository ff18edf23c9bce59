//! Plain geometry values carried in action payloads

use crate::wire::{Wire, WireReader, WireWriter};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// World-space vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Check that no component is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl Wire for Vec3 {
    const SIZE: usize = f32::SIZE * 3;

    fn ser(&self, writer: &mut WireWriter) {
        self.x.ser(writer);
        self.y.ser(writer);
        self.z.ser(writer);
    }

    fn de(reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            x: f32::de(reader)?,
            y: f32::de(reader)?,
            z: f32::de(reader)?,
        })
    }
}

/// Coordinates of a terrain tile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

impl Wire for TileCoord {
    const SIZE: usize = i32::SIZE * 2;

    fn ser(&self, writer: &mut WireWriter) {
        self.x.ser(writer);
        self.y.ser(writer);
    }

    fn de(reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            x: i32::de(reader)?,
            y: i32::de(reader)?,
        })
    }
}

/// Inclusive rectangle of samples touched by a brush stroke
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileBounds {
    pub min: TileCoord,
    pub max: TileCoord,
}

impl TileBounds {
    pub const fn new(min: TileCoord, max: TileCoord) -> Self {
        Self { min, max }
    }

    /// Check that `min` does not exceed `max` on either axis
    pub fn is_ordered(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    /// Check if a coordinate lies inside the bounds
    pub fn contains(&self, coord: TileCoord) -> bool {
        coord.x >= self.min.x && coord.x <= self.max.x && coord.y >= self.min.y && coord.y <= self.max.y
    }
}

impl Wire for TileBounds {
    const SIZE: usize = TileCoord::SIZE * 2;

    fn ser(&self, writer: &mut WireWriter) {
        self.min.ser(writer);
        self.max.ser(writer);
    }

    fn de(reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            min: TileCoord::de(reader)?,
            max: TileCoord::de(reader)?,
        })
    }
}
