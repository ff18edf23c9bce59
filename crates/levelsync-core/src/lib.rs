//! Levelsync Core - Shared primitives for collaborative editor replication
//!
//! This crate provides the building blocks every other levelsync crate sits on:
//! - Identity types (`EditorId`, `AssetRef`, `InstanceId`)
//! - Frame-based time (`Clock`, `FrameTime`)
//! - Plain geometry values carried by actions (`Vec3`, `TileCoord`, `TileBounds`)
//! - The little-endian wire codec (`Wire`, `WireWriter`, `WireReader`)
//!
//! ## Wire Encoding
//!
//! All multi-byte values are little-endian and fixed-size, so every `Wire`
//! type knows its encoded length at compile time:
//!
//! ```
//! use levelsync_core::{Wire, WireReader, WireWriter};
//!
//! let mut writer = WireWriter::new();
//! 5.0f32.ser(&mut writer);
//! 3u8.ser(&mut writer);
//! assert_eq!(writer.len(), f32::SIZE + u8::SIZE);
//!
//! let bytes = writer.into_bytes();
//! let mut reader = WireReader::new(&bytes);
//! assert_eq!(f32::de(&mut reader).unwrap(), 5.0);
//! assert_eq!(u8::de(&mut reader).unwrap(), 3);
//! assert!(reader.is_empty());
//! ```

mod error;
mod geometry;
mod identity;
pub mod time;
pub mod wire;

pub use error::{Error, Result};
pub use geometry::{TileBounds, TileCoord, Vec3};
pub use identity::{AssetRef, EditorId, InstanceId};
pub use time::{Clock, FrameTime, Tick};
pub use wire::{Wire, WireReader, WireWriter};
