//! Verified action registry
//!
//! `ActionRegistry::build` runs once at startup, before any connection
//! exists. It assembles the tag dispatch table and drives every generated
//! procedure through a self-test. A registry that fails the self-test is never
//! returned, so no connection can run against a broken codec.

use crate::action::Action;
use crate::capability::{Capability, CapabilitySet, SettingsValues, CAPABILITY_SLOTS};
use crate::error::{Error, RegistryError, Result};
use crate::kinds::{ActionBody, ActionKind};
use crate::settings::{SettingsCache, SettingsCollection};
use levelsync_core::{EditorId, Wire, WireReader, WireWriter};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Factory and metadata for one action kind
#[derive(Debug, Clone, Copy)]
struct KindEntry {
    kind: ActionKind,
    factory: fn() -> ActionBody,
}

/// Tag to entry lookup
#[derive(Debug, Clone)]
enum Dispatch {
    /// Contiguous tags: direct index from `tag - base`
    Dense { base: u8 },
    /// Gapped tags: sorted `(tag, entry)` pairs
    Sparse(Vec<(u8, usize)>),
}

/// Immutable table of every action kind and its generated procedures
#[derive(Debug)]
pub struct ActionRegistry {
    entries: Vec<KindEntry>,
    dispatch: Dispatch,
}

impl ActionRegistry {
    /// Build and self-test the registry
    pub fn build() -> std::result::Result<Self, RegistryError> {
        let result = Self::build_unchecked().and_then(|registry| {
            registry.self_test()?;
            Ok(registry)
        });

        match &result {
            Ok(registry) => info!(
                kinds = registry.entries.len(),
                capabilities = Capability::COUNT,
                dense = registry.is_dense(),
                "action registry built"
            ),
            Err(e) => error!(error = %e, "action registry self-test failed"),
        }
        result
    }

    /// Build the registry behind an `Arc` for sharing between actors
    pub fn shared() -> std::result::Result<Arc<Self>, RegistryError> {
        Self::build().map(Arc::new)
    }

    fn build_unchecked() -> std::result::Result<Self, RegistryError> {
        let mut entries: Vec<KindEntry> = ActionKind::ALL
            .iter()
            .map(|kind| KindEntry {
                kind: *kind,
                factory: kind.factory(),
            })
            .collect();
        entries.sort_by_key(|entry| entry.kind.tag());

        for pair in entries.windows(2) {
            if pair[0].kind.tag() == pair[1].kind.tag() {
                return Err(RegistryError::DuplicateTag {
                    tag: pair[0].kind.tag(),
                    first: pair[0].kind,
                    second: pair[1].kind,
                });
            }
        }

        let dispatch = match (entries.first(), entries.last()) {
            (Some(first), Some(last))
                if (last.kind.tag() - first.kind.tag()) as usize + 1 == entries.len() =>
            {
                Dispatch::Dense { base: first.kind.tag() }
            }
            _ => Dispatch::Sparse(
                entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| (entry.kind.tag(), i))
                    .collect(),
            ),
        };

        Ok(Self { entries, dispatch })
    }

    fn self_test(&self) -> std::result::Result<(), RegistryError> {
        let mut previous: Option<Capability> = None;
        for capability in Capability::ALL.iter().copied() {
            let ascending = previous.map_or(true, |prev| prev.index() < capability.index());
            if !ascending || capability.index() as usize >= CAPABILITY_SLOTS {
                return Err(RegistryError::CapabilityOrder(capability));
            }
            previous = Some(capability);
            Self::test_collection_codec(capability)?;
        }

        for entry in &self.entries {
            Self::test_kind(entry)?;
            debug!(kind = entry.kind.name(), tag = entry.kind.tag(), "action kind verified");
        }
        Ok(())
    }

    fn test_collection_codec(capability: Capability) -> std::result::Result<(), RegistryError> {
        let failure = RegistryError::CollectionCodec { capability };

        let mut collection = SettingsCollection::new();
        collection.flags = CapabilitySet::EMPTY.with(capability);
        collection.start_index = 95;
        collection.values = SettingsValues::sentinel();

        let mut writer = WireWriter::new();
        collection.write(&mut writer);
        if writer.len() != SettingsCollection::BASE_SIZE + capability.wire_size() {
            return Err(failure);
        }

        let bytes = writer.into_bytes();
        let mut reader = WireReader::new(&bytes);
        let mut decoded = SettingsCollection::new();
        match decoded.read(&mut reader) {
            Ok(()) if reader.is_empty()
                && decoded.flags == collection.flags
                && decoded.start_index == collection.start_index
                && decoded.values.matches(capability, &collection.values) =>
            {
                Ok(())
            }
            _ => Err(failure),
        }
    }

    fn test_kind(entry: &KindEntry) -> std::result::Result<(), RegistryError> {
        let kind = entry.kind;
        let body = (entry.factory)();
        if body.kind() != kind {
            return Err(RegistryError::FactoryMismatch {
                expected: kind,
                got: body.kind(),
            });
        }

        let sentinel = SettingsValues::sentinel();
        let defaults = SettingsValues::default();

        // A capability is handled when loading a distinct value makes it differ
        let mut generated = CapabilitySet::EMPTY;
        for capability in Capability::ALL.iter().copied() {
            let mut probe = (entry.factory)();
            probe.load(capability, &sentinel);
            if probe.differs(capability, &defaults) {
                generated.insert(capability);
            }
        }
        if generated != kind.capabilities() {
            return Err(RegistryError::CapabilityMismatch {
                kind,
                declared: kind.capabilities().bits(),
                generated: generated.bits(),
            });
        }

        for capability in generated.iter() {
            let mut probe = (entry.factory)();
            probe.load(capability, &sentinel);
            let mut staged = SettingsValues::default();
            probe.stage(capability, &mut staged);
            if !staged.matches(capability, &sentinel) || probe.differs(capability, &staged) {
                return Err(RegistryError::StageLoadMismatch { kind, capability });
            }
        }

        let mut writer = WireWriter::new();
        body.write_payload(&mut writer);
        if writer.len() != kind.payload_size() {
            return Err(RegistryError::PayloadAsymmetry { kind });
        }
        let bytes = writer.into_bytes();
        let mut reader = WireReader::new(&bytes);
        match ActionBody::read_payload(kind, &mut reader) {
            Ok(decoded) if decoded == body && reader.is_empty() => Ok(()),
            _ => Err(RegistryError::PayloadAsymmetry { kind }),
        }
    }

    /// Whether tags resolve through a direct index
    pub fn is_dense(&self) -> bool {
        matches!(self.dispatch, Dispatch::Dense { .. })
    }

    /// Every registered kind in tag order
    pub fn kinds(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.entries.iter().map(|entry| entry.kind)
    }

    fn entry(&self, tag: u8) -> Option<&KindEntry> {
        let index = match &self.dispatch {
            Dispatch::Dense { base } => Some(tag.checked_sub(*base)? as usize),
            Dispatch::Sparse(pairs) => pairs
                .binary_search_by_key(&tag, |(t, _)| *t)
                .ok()
                .map(|i| pairs[i].1),
        }?;
        self.entries.get(index)
    }

    /// Resolve a wire tag
    pub fn lookup(&self, tag: u8) -> Option<ActionKind> {
        self.entry(tag).map(|entry| entry.kind)
    }

    /// Create a default body for a wire tag
    pub fn create(&self, tag: u8) -> Result<ActionBody> {
        self.entry(tag)
            .map(|entry| (entry.factory)())
            .ok_or(Error::UnknownActionTag(tag))
    }

    /// Encode tag, delta time and payload
    pub fn write_action(&self, action: &Action, writer: &mut WireWriter) {
        action.kind().tag().ser(writer);
        action.delta_time().ser(writer);
        action.body().write_payload(writer);
    }

    /// Decode tag, delta time and payload; capability fields stay at their defaults
    pub fn read_action(&self, reader: &mut WireReader<'_>, instigator: EditorId) -> Result<Action> {
        let tag = u8::de(reader)?;
        let kind = self.lookup(tag).ok_or(Error::UnknownActionTag(tag))?;
        let delta_time = f32::de(reader)?;
        let body = ActionBody::read_payload(kind, reader)?;
        Ok(Action::new(body)
            .with_instigator(instigator)
            .with_delta_time(delta_time))
    }

    /// Capabilities of `action` that differ from the cache; empty slots always differ
    pub fn diff(&self, action: &Action, cache: &SettingsCache) -> CapabilitySet {
        action
            .capabilities()
            .iter()
            .filter(|capability| match cache.cached(*capability) {
                Some(collection) => action.body().differs(*capability, &collection.values),
                None => true,
            })
            .collect()
    }

    /// Stage the `changed` values of `action` into a collection
    pub fn stage(&self, action: &Action, changed: CapabilitySet, collection: &mut SettingsCollection) {
        for capability in changed.iter() {
            action.body().stage(capability, &mut collection.values);
            collection.flags.insert(capability);
        }
    }

    /// Fill every capability field of a decoded action from the cache
    pub fn apply_cached(&self, action: &mut Action, cache: &SettingsCache) -> Result<()> {
        let kind = action.kind();
        for capability in action.capabilities().iter() {
            let collection = cache
                .cached(capability)
                .ok_or(Error::MissingSetting { kind, capability })?;
            action.body_mut().load(capability, &collection.values);
        }
        Ok(())
    }

    pub fn write_collection(&self, collection: &SettingsCollection, writer: &mut WireWriter) {
        collection.write(writer);
    }

    pub fn read_collection(
        &self,
        reader: &mut WireReader<'_>,
        collection: &mut SettingsCollection,
    ) -> Result<()> {
        collection.read(reader)?;
        Ok(())
    }

    /// Human-readable dump of a collection
    pub fn dump_collection(&self, collection: &SettingsCollection) -> String {
        collection.to_string()
    }
}
