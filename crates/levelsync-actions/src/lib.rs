//! Levelsync Actions - Replicated editor actions and their wire codec
//!
//! This crate defines what travels between collaborating editors:
//! - **Capabilities**: field groups shared by unrelated actions (brush radius,
//!   asset, target instance, ...), replicated through a settings cache so
//!   unchanged values are never resent
//! - **Actions**: a closed set of concrete edits, generated at compile time
//!   together with their encode, decode and diff procedures
//! - **Registry**: the verified tag dispatch table, built once at startup
//! - **Batch codec**: diff-and-encode on the sending side, decode-and-merge on
//!   the receiving side
//!
//! # Example
//!
//! ```
//! use levelsync_actions::{
//!     Action, ActionRegistry, BatchDecoder, BatchEncoder, BatchLimits, HeightmapAdjust,
//!     SettingsCache,
//! };
//! use levelsync_core::EditorId;
//!
//! let registry = ActionRegistry::build().unwrap();
//! let limits = BatchLimits::default();
//!
//! let action = Action::new(HeightmapAdjust {
//!     brush_radius: 5.0,
//!     brush_falloff: 0.25,
//!     ..Default::default()
//! });
//!
//! let mut sender = SettingsCache::new();
//! let batch = BatchEncoder::new(&registry, limits).encode(&mut sender, [&action]);
//!
//! let mut receiver = SettingsCache::new();
//! let decoded = BatchDecoder::new(&registry, limits)
//!     .decode(&mut receiver, &batch.bytes, EditorId::new(1))
//!     .unwrap();
//! assert_eq!(decoded.actions[0].body(), action.body());
//! ```

#[macro_use]
mod macros;

mod action;
pub mod batch;
mod capability;
mod error;
mod kinds;
mod permission;
mod registry;
mod settings;
mod values;
mod world;

pub use action::{Action, ActionSchema, HasCapability};
pub use batch::{
    BatchDecoder, BatchEncoder, BatchLimits, DecodedBatch, EncodedBatch, MessageHeader,
    DATA_VERSION, MAX_ACTIONS_PER_MESSAGE, MAX_COLLECTIONS_PER_MESSAGE,
};
pub use capability::{
    caps, Capability, CapabilityKind, CapabilitySet, SettingsValues, CAPABILITY_SLOTS,
};
pub use error::{Error, RegistryError, Result, WorldError};
pub use kinds::{
    ActionBody, ActionKind, FoliageAdd, FoliageRemove, HeightmapAdjust, HeightmapFlatten,
    HeightmapRamp, HeightmapSmooth, HolePaint, ObjectDelete, ObjectInstantiate, ObjectTransform,
    SplatmapPaint,
};
pub use permission::{AllowAll, PermissionPolicy};
pub use registry::ActionRegistry;
pub use settings::{CollectionHandle, CollectionPool, SettingsCache, SettingsCollection};
pub use values::{
    AutoFoundationSettings, AutoSlopeSettings, CapabilityValue, FlattenMethod, PayloadValue,
    SmoothMethod, FLOAT_TOLERANCE,
};
pub use world::{EditorWorld, RecordingWorld};
