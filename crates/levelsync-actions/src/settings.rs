//! Settings collections, their pool and the per-direction settings cache
//!
//! A `SettingsCollection` is a snapshot of the capability values that changed
//! at one point of an action stream. Both ends of a connection keep a
//! `SettingsCache` with one slot per capability; a slot points at the most
//! recent collection that carried that capability. Collections live in a
//! reference-counted arena so one collection can back several slots at once.

use crate::capability::{Capability, CapabilitySet, SettingsValues, CAPABILITY_SLOTS};
use levelsync_core::{Wire, WireReader, WireWriter};
use std::fmt;

/// Changed capability values anchored at one action of a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsCollection {
    /// Capabilities this collection carries
    pub flags: CapabilitySet,
    /// Batch-relative index of the first action that uses the values
    pub start_index: u8,
    /// Value slots; only flagged ones are meaningful
    pub values: SettingsValues,
}

impl SettingsCollection {
    /// Encoded size of flags plus start index
    pub const BASE_SIZE: usize = u32::SIZE + u8::SIZE;

    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear flags and index before reuse
    pub fn reset(&mut self) {
        self.flags = CapabilitySet::EMPTY;
        self.start_index = 0;
    }

    /// Exact encoded size
    pub fn encoded_size(&self) -> usize {
        Self::BASE_SIZE + self.flags.values_size()
    }

    /// Encode flags, start index and every flagged value in bit order
    pub fn write(&self, writer: &mut WireWriter) {
        self.flags.ser(writer);
        self.start_index.ser(writer);
        for capability in self.flags.iter() {
            self.values.write_value(capability, writer);
        }
    }

    /// Decode in place; unflagged slots keep their previous contents
    pub fn read(&mut self, reader: &mut WireReader<'_>) -> levelsync_core::Result<()> {
        self.flags = CapabilitySet::de(reader)?;
        self.start_index = u8::de(reader)?;
        for capability in self.flags.iter() {
            self.values.read_value(capability, reader)?;
        }
        Ok(())
    }
}

impl fmt::Display for SettingsCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} {{", self.start_index)?;
        for (i, capability) in self.flags.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}={}", capability, self.values.describe(capability))?;
        }
        write!(f, " }}")
    }
}

/// Generation-checked reference to a pooled collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct PoolEntry {
    collection: SettingsCollection,
    generation: u32,
    refs: u32,
}

/// Arena of reusable collections
///
/// A collection returns to the free list only when its reference count drops
/// to zero. Releasing bumps the generation, so stale handles resolve to
/// nothing instead of aliasing a recycled collection.
#[derive(Debug, Default)]
pub struct CollectionPool {
    entries: Vec<PoolEntry>,
    free: Vec<u32>,
}

impl CollectionPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a reset collection with one reference held by the caller
    pub fn acquire(&mut self) -> CollectionHandle {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.collection.reset();
            entry.refs = 1;
            return CollectionHandle {
                index,
                generation: entry.generation,
            };
        }

        let index = self.entries.len() as u32;
        self.entries.push(PoolEntry {
            collection: SettingsCollection::new(),
            generation: 0,
            refs: 1,
        });
        CollectionHandle {
            index,
            generation: 0,
        }
    }

    fn entry(&self, handle: CollectionHandle) -> Option<&PoolEntry> {
        self.entries
            .get(handle.index as usize)
            .filter(|entry| entry.generation == handle.generation && entry.refs > 0)
    }

    fn entry_mut(&mut self, handle: CollectionHandle) -> Option<&mut PoolEntry> {
        self.entries
            .get_mut(handle.index as usize)
            .filter(|entry| entry.generation == handle.generation && entry.refs > 0)
    }

    /// Resolve a live handle
    pub fn get(&self, handle: CollectionHandle) -> Option<&SettingsCollection> {
        self.entry(handle).map(|entry| &entry.collection)
    }

    /// Resolve a live handle mutably
    pub fn get_mut(&mut self, handle: CollectionHandle) -> Option<&mut SettingsCollection> {
        self.entry_mut(handle).map(|entry| &mut entry.collection)
    }

    /// Add a reference; returns false for a stale handle
    pub fn retain(&mut self, handle: CollectionHandle) -> bool {
        match self.entry_mut(handle) {
            Some(entry) => {
                entry.refs += 1;
                true
            }
            None => false,
        }
    }

    /// Drop a reference; returns true when the collection went back to the free list
    pub fn release(&mut self, handle: CollectionHandle) -> bool {
        let Some(entry) = self.entry_mut(handle) else {
            return false;
        };
        entry.refs -= 1;
        if entry.refs > 0 {
            return false;
        }
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(handle.index);
        true
    }

    /// Current reference count, zero for stale handles
    pub fn ref_count(&self, handle: CollectionHandle) -> u32 {
        self.entry(handle).map_or(0, |entry| entry.refs)
    }

    /// Number of collections currently referenced
    pub fn live(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    /// Number of collections waiting for reuse
    pub fn available(&self) -> usize {
        self.free.len()
    }
}

/// Per-direction view of the latest value of every capability
///
/// Each cache owns its pool, so dropping an actor frees every collection it
/// created.
#[derive(Debug)]
pub struct SettingsCache {
    pool: CollectionPool,
    slots: [Option<CollectionHandle>; CAPABILITY_SLOTS],
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            pool: CollectionPool::new(),
            slots: [None; CAPABILITY_SLOTS],
        }
    }

    /// The backing pool
    pub fn pool(&self) -> &CollectionPool {
        &self.pool
    }

    /// Take a fresh collection from this cache's pool
    pub fn acquire(&mut self) -> CollectionHandle {
        self.pool.acquire()
    }

    /// Drop the caller's reference to a collection
    pub fn release(&mut self, handle: CollectionHandle) -> bool {
        self.pool.release(handle)
    }

    pub fn collection(&self, handle: CollectionHandle) -> Option<&SettingsCollection> {
        self.pool.get(handle)
    }

    pub fn collection_mut(&mut self, handle: CollectionHandle) -> Option<&mut SettingsCollection> {
        self.pool.get_mut(handle)
    }

    /// Point every slot flagged by the collection at it
    ///
    /// Each slot takes its own reference; the collection previously in the
    /// slot loses one. Returns the number of slots replaced.
    pub fn activate(&mut self, handle: CollectionHandle) -> usize {
        let Some(flags) = self.pool.get(handle).map(|collection| collection.flags) else {
            return 0;
        };
        let mut replaced = 0;
        for capability in flags.iter() {
            self.pool.retain(handle);
            if let Some(previous) = self.slots[capability.index() as usize].replace(handle) {
                self.pool.release(previous);
            }
            replaced += 1;
        }
        replaced
    }

    /// The collection currently cached for a capability
    pub fn cached(&self, capability: Capability) -> Option<&SettingsCollection> {
        self.slots[capability.index() as usize].and_then(|handle| self.pool.get(handle))
    }

    /// Handle currently cached for a capability
    pub fn slot(&self, capability: Capability) -> Option<CollectionHandle> {
        self.slots[capability.index() as usize]
    }

    /// Release every slot
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(handle) = slot.take() {
                self.pool.release(handle);
            }
        }
    }

    /// Check that both caches hold the same values for every capability
    pub fn matches(&self, other: &SettingsCache) -> bool {
        Capability::ALL.iter().all(|capability| {
            match (self.cached(*capability), other.cached(*capability)) {
                (None, None) => true,
                (Some(ours), Some(theirs)) => ours.values.matches(*capability, &theirs.values),
                _ => false,
            }
        })
    }

    /// Make this cache hold the same values as `other`
    ///
    /// Collections shared between slots in `other` stay shared here.
    pub fn sync_from(&mut self, other: &SettingsCache) {
        let mut copies: Vec<(CollectionHandle, CollectionHandle)> = Vec::new();

        for capability in Capability::ALL.iter().copied() {
            let Some(source) = other.slot(capability) else {
                if let Some(previous) = self.slots[capability.index() as usize].take() {
                    self.pool.release(previous);
                }
                continue;
            };
            let Some(collection) = other.pool.get(source) else {
                continue;
            };

            let local = match copies.iter().find(|(from, _)| *from == source) {
                Some((_, local)) => *local,
                None => {
                    let local = self.pool.acquire();
                    if let Some(copy) = self.pool.get_mut(local) {
                        copy.clone_from(collection);
                        copy.flags = CapabilitySet::EMPTY;
                    }
                    copies.push((source, local));
                    local
                }
            };
            if let Some(copy) = self.pool.get_mut(local) {
                copy.flags.insert(capability);
            }
        }

        for (_, local) in copies {
            self.activate(local);
            self.pool.release(local);
        }
    }
}
