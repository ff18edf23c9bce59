//! Batch wire codec
//!
//! One message carries a header, the settings collections that changed
//! during the batch, then the actions themselves:
//!
//! ```text
//! u16 data_version | u8 action_count | u8 collection_count
//! collection_count x ( u32 flags | u8 start_index | flagged values... )
//! action_count     x ( u8 tag | f32 delta_time | payload... )
//! ```
//!
//! The encoder diffs every action against the sender's cache and only emits
//! capability values that changed. The decoder replays the collections into
//! the receiver's cache as it walks the action stream, so both caches agree
//! after every message.

use crate::action::Action;
use crate::error::{Error, Result};
use crate::registry::ActionRegistry;
use crate::settings::{CollectionHandle, SettingsCache};
use levelsync_core::{EditorId, Wire, WireReader, WireWriter};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Hard cap on actions per message
pub const MAX_ACTIONS_PER_MESSAGE: usize = 96;

/// Hard cap on collections per message
pub const MAX_COLLECTIONS_PER_MESSAGE: usize = u8::MAX as usize;

/// Current wire format version
pub const DATA_VERSION: u16 = 1;

/// Fixed message prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub data_version: u16,
    pub action_count: u8,
    pub collection_count: u8,
}

impl Wire for MessageHeader {
    const SIZE: usize = u16::SIZE + u8::SIZE * 2;

    fn ser(&self, writer: &mut WireWriter) {
        self.data_version.ser(writer);
        self.action_count.ser(writer);
        self.collection_count.ser(writer);
    }

    fn de(reader: &mut WireReader<'_>) -> levelsync_core::Result<Self> {
        Ok(Self {
            data_version: u16::de(reader)?,
            action_count: u8::de(reader)?,
            collection_count: u8::de(reader)?,
        })
    }
}

/// Per-message limits, clamped to the hard caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLimits {
    pub max_actions: usize,
    pub max_collections: usize,
    pub data_version: u16,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_actions: MAX_ACTIONS_PER_MESSAGE,
            max_collections: MAX_COLLECTIONS_PER_MESSAGE,
            data_version: DATA_VERSION,
        }
    }
}

impl BatchLimits {
    /// Create limits, clamping both counts into `1..=cap`
    pub fn new(max_actions: usize, max_collections: usize, data_version: u16) -> Self {
        Self {
            max_actions: max_actions.clamp(1, MAX_ACTIONS_PER_MESSAGE),
            max_collections: max_collections.clamp(1, MAX_COLLECTIONS_PER_MESSAGE),
            data_version,
        }
    }
}

/// One encoded message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBatch {
    pub bytes: Vec<u8>,
    /// Number of leading actions the message covers
    pub action_count: usize,
    pub collection_count: usize,
}

impl EncodedBatch {
    pub fn is_empty(&self) -> bool {
        self.action_count == 0
    }
}

/// Encodes action batches against a sender-side cache
#[derive(Debug, Clone, Copy)]
pub struct BatchEncoder<'a> {
    registry: &'a ActionRegistry,
    limits: BatchLimits,
}

impl<'a> BatchEncoder<'a> {
    pub fn new(registry: &'a ActionRegistry, limits: BatchLimits) -> Self {
        Self { registry, limits }
    }

    /// Encode the longest prefix of `actions` that fits the limits
    ///
    /// The cache is updated as if the receiver had already decoded the
    /// message. Callers drop `action_count` actions from their queue.
    pub fn encode<'b, I>(&self, cache: &mut SettingsCache, actions: I) -> EncodedBatch
    where
        I: IntoIterator<Item = &'b Action>,
    {
        let mut handles: Vec<CollectionHandle> = Vec::new();
        let mut body = WireWriter::new();
        let mut action_count = 0usize;

        for (index, action) in actions.into_iter().take(self.limits.max_actions).enumerate() {
            let changed = self.registry.diff(action, cache);
            if !changed.is_empty() {
                if handles.len() >= self.limits.max_collections {
                    break;
                }
                let handle = cache.acquire();
                if let Some(collection) = cache.collection_mut(handle) {
                    collection.start_index = index as u8;
                    self.registry.stage(action, changed, collection);
                }
                cache.activate(handle);
                handles.push(handle);
            }
            self.registry.write_action(action, &mut body);
            action_count += 1;
        }

        let header = MessageHeader {
            data_version: self.limits.data_version,
            action_count: action_count as u8,
            collection_count: handles.len() as u8,
        };
        let mut writer = WireWriter::with_capacity(MessageHeader::SIZE + body.len());
        header.ser(&mut writer);
        for handle in &handles {
            if let Some(collection) = cache.collection(*handle) {
                trace!(collection = %self.registry.dump_collection(collection), "staged");
                self.registry.write_collection(collection, &mut writer);
            }
        }
        writer.write_bytes(body.as_slice());

        for handle in &handles {
            cache.release(*handle);
        }

        EncodedBatch {
            bytes: writer.into_bytes(),
            action_count,
            collection_count: handles.len(),
        }
    }
}

/// A decoded message
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBatch {
    pub header: MessageHeader,
    /// Actions in submission order with every capability field restored
    pub actions: Vec<Action>,
}

/// Decodes messages against a receiver-side cache
#[derive(Debug, Clone, Copy)]
pub struct BatchDecoder<'a> {
    registry: &'a ActionRegistry,
    limits: BatchLimits,
}

impl<'a> BatchDecoder<'a> {
    pub fn new(registry: &'a ActionRegistry, limits: BatchLimits) -> Self {
        Self { registry, limits }
    }

    /// Decode a whole message, stamping every action with `instigator`
    ///
    /// Any error aborts the message. Collections activated before the error
    /// stay in the cache.
    pub fn decode(
        &self,
        cache: &mut SettingsCache,
        bytes: &[u8],
        instigator: EditorId,
    ) -> Result<DecodedBatch> {
        let mut handles = Vec::new();
        let result = self.decode_message(cache, &mut WireReader::new(bytes), instigator, &mut handles);
        for handle in handles {
            cache.release(handle);
        }
        result
    }

    fn decode_message(
        &self,
        cache: &mut SettingsCache,
        reader: &mut WireReader<'_>,
        instigator: EditorId,
        handles: &mut Vec<CollectionHandle>,
    ) -> Result<DecodedBatch> {
        let header = MessageHeader::de(reader)?;
        if header.data_version != self.limits.data_version {
            return Err(Error::DataVersionMismatch {
                expected: self.limits.data_version,
                got: header.data_version,
            });
        }
        if header.action_count as usize > MAX_ACTIONS_PER_MESSAGE {
            return Err(Error::TooManyActions(header.action_count as usize));
        }

        let mut anchors: Vec<(u8, CollectionHandle)> = Vec::with_capacity(header.collection_count as usize);
        for _ in 0..header.collection_count {
            let handle = cache.acquire();
            handles.push(handle);
            let Some(collection) = cache.collection_mut(handle) else {
                continue;
            };
            self.registry.read_collection(reader, collection)?;
            if collection.start_index >= header.action_count {
                return Err(Error::CollectionOutOfRange {
                    start_index: collection.start_index,
                    action_count: header.action_count,
                });
            }
            anchors.push((collection.start_index, handle));
        }
        anchors.sort_by_key(|(start_index, _)| *start_index);

        let mut anchors = anchors.into_iter().peekable();
        let mut actions = Vec::with_capacity(header.action_count as usize);
        for index in 0..header.action_count {
            while let Some((_, handle)) = anchors.next_if(|(start_index, _)| *start_index <= index) {
                cache.activate(handle);
            }
            let mut action = self.registry.read_action(reader, instigator)?;
            self.registry.apply_cached(&mut action, cache)?;
            actions.push(action);
        }
        reader.expect_end()?;

        Ok(DecodedBatch { header, actions })
    }
}
