//! Identity types for editors, assets and placed objects

use crate::wire::{Wire, WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a connected editor (the instigator of an action)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EditorId(pub u64);

impl EditorId {
    /// The server itself
    pub const SERVER: EditorId = EditorId(0);

    /// Create a new editor ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Check if this is the server identity
    pub fn is_server(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_server() {
            write!(f, "editor:server")
        } else {
            write!(f, "editor:{}", self.0)
        }
    }
}

/// Reference to an asset by its 128-bit GUID
///
/// Asset lookup itself happens outside this crate; the reference is opaque.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef(pub u128);

impl AssetRef {
    /// The empty reference
    pub const NONE: AssetRef = AssetRef(0);

    /// Create a new asset reference
    pub fn new(guid: u128) -> Self {
        Self(guid)
    }

    /// Check if this is the empty reference
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl Wire for AssetRef {
    const SIZE: usize = u128::SIZE;

    fn ser(&self, writer: &mut WireWriter) {
        self.0.ser(writer);
    }

    fn de(reader: &mut WireReader<'_>) -> crate::Result<Self> {
        Ok(Self(u128::de(reader)?))
    }
}

/// Network instance id of a placed level object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub u32);

impl InstanceId {
    /// Create a new instance ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance:{}", self.0)
    }
}

impl Wire for InstanceId {
    const SIZE: usize = u32::SIZE;

    fn ser(&self, writer: &mut WireWriter) {
        self.0.ser(writer);
    }

    fn de(reader: &mut WireReader<'_>) -> crate::Result<Self> {
        Ok(Self(u32::de(reader)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_id() {
        let server = EditorId::SERVER;
        assert!(server.is_server());
        assert_eq!(format!("{}", server), "editor:server");

        let editor = EditorId::new(7);
        assert!(!editor.is_server());
        assert_eq!(editor.raw(), 7);
        assert_eq!(format!("{}", editor), "editor:7");
    }

    #[test]
    fn test_asset_ref_display() {
        let asset = AssetRef::new(0xabc);
        assert_eq!(format!("{}", asset), "00000000000000000000000000000abc");
        assert!(AssetRef::NONE.is_none());
        assert!(!asset.is_none());
    }

    #[test]
    fn test_asset_ref_wire() {
        let asset = AssetRef::new(u128::MAX - 1);
        let mut writer = WireWriter::new();
        asset.ser(&mut writer);
        assert_eq!(writer.len(), AssetRef::SIZE);

        let bytes = writer.into_bytes();
        let mut reader = WireReader::new(&bytes);
        assert_eq!(AssetRef::de(&mut reader).unwrap(), asset);
    }
}
