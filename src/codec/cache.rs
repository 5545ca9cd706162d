//! Per-connection delta cache.
//!
//! The delta protocol transmits only changed fields; everything else is
//! reconstructed from the last fully decoded record for the same
//! `(packet_type, key_tuple)`. This cache is that memory. It belongs to
//! exactly one connection, is mutated only by the delta codec on that
//! connection's task, and is cleared on disconnect - a stale entry would
//! silently corrupt every later decode.

use std::collections::HashMap;

use crate::types::{DecodedRecord, FieldValue};

/// Ordered key-field values identifying one cached record. Packets without
/// key fields use the empty tuple.
pub type KeyTuple = Vec<FieldValue>;

/// Cache of the last fully decoded record per `(packet_type, key_tuple)`.
///
/// Entries hold exactly the non-key fields of their packet type; key
/// values live in the lookup tuple.
#[derive(Debug, Default)]
pub struct DeltaCache {
    entries: HashMap<u16, HashMap<KeyTuple, DecodedRecord>>,
}

impl DeltaCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached record for a packet type and key tuple.
    pub fn get(&self, packet_type: u16, key: &KeyTuple) -> Option<&DecodedRecord> {
        self.entries.get(&packet_type)?.get(key)
    }

    /// Store a record, replacing any previous entry for the same key.
    ///
    /// The cache owns its copy; callers keep no handle into it.
    pub fn put(&mut self, packet_type: u16, key: KeyTuple, record: DecodedRecord) {
        self.entries.entry(packet_type).or_default().insert(key, record);
    }

    /// Drop every entry. Called on disconnect.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Total number of cached records, for lifecycle logging.
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }
}
