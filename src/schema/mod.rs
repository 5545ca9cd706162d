//! Declarative packet schemas.
//!
//! A [`PacketSchema`] describes one packet type the way the protocol
//! definition files do: an ordered list of fields split into a key prefix
//! (always transmitted, forms the delta-cache lookup tuple) and non-key
//! fields (delta encoded, one bitvector bit each). Field order is contract:
//! it fixes both serialization order and every non-key field's bit index.
//!
//! Schemas are immutable after construction and validated up front, so the
//! decoder never re-checks structural invariants per packet.

mod registry;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};
use crate::types::{FieldKind, FieldValue};

pub use registry::{SchemaRegistry, baseline_registry};

/// Specification of a single packet field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Stable field identifier.
    pub name: String,
    /// Wire kind of the field.
    pub kind: FieldKind,
    /// Key fields are transmitted unconditionally and form the cache key.
    pub is_key: bool,
    /// Element kind for `Array` fields; must be a scalar kind.
    pub element_kind: Option<FieldKind>,
    /// Declared maximum element count for `Array` fields (1..=65535).
    /// Doubles as the array-diff sentinel value.
    pub capacity: u16,
    /// Whether the array is transmitted as sparse index/value pairs.
    pub use_diff: bool,
}

impl FieldSchema {
    /// A plain non-key scalar or string field.
    pub fn scalar(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind, is_key: false, element_kind: None, capacity: 0, use_diff: false }
    }

    /// A key field: always on the wire, part of the cache key tuple.
    pub fn key(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { is_key: true, ..Self::scalar(name, kind) }
    }

    /// A dense array field: `capacity` elements, every one on the wire.
    pub fn array(name: impl Into<String>, element_kind: FieldKind, capacity: u16) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Array,
            is_key: false,
            element_kind: Some(element_kind),
            capacity,
            use_diff: false,
        }
    }

    /// An array-diff field: only changed slots travel, terminated by a
    /// sentinel index equal to `capacity`.
    pub fn array_diff(name: impl Into<String>, element_kind: FieldKind, capacity: u16) -> Self {
        Self { use_diff: true, ..Self::array(name, element_kind, capacity) }
    }

    /// The value this field reconstructs to without a cached baseline.
    pub fn default_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Array => {
                let element = self
                    .element_kind
                    .map(|k| k.default_value())
                    .unwrap_or(FieldValue::U8(0));
                FieldValue::Array(vec![element; usize::from(self.capacity)])
            }
            kind => kind.default_value(),
        }
    }
}

/// Complete specification of one packet type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketSchema {
    /// Numeric packet type this schema decodes.
    pub packet_type: u16,
    /// Human-readable packet name, used in logs.
    pub name: String,
    /// Whether the body is delta encoded (bitvector-gated non-key fields).
    pub has_delta: bool,
    fields: Vec<FieldSchema>,
    key_count: usize,
}

impl PacketSchema {
    /// Create a schema with validation.
    ///
    /// Rejects key fields declared after non-key fields, array metadata on
    /// non-array fields, arrays without a scalar element kind, and zero
    /// capacity.
    pub fn new(
        packet_type: u16,
        name: impl Into<String>,
        has_delta: bool,
        fields: Vec<FieldSchema>,
    ) -> Result<Self> {
        let name = name.into();
        let mut seen_non_key = false;
        let mut key_count = 0;

        for field in &fields {
            if field.is_key {
                if seen_non_key {
                    return Err(ProtocolError::schema_invalid(format!(
                        "{name}: key field '{}' declared after a non-key field",
                        field.name
                    )));
                }
                key_count += 1;
            } else {
                seen_non_key = true;
            }

            match field.kind {
                FieldKind::Array => {
                    let element = field.element_kind.ok_or_else(|| {
                        ProtocolError::schema_invalid(format!(
                            "{name}: array field '{}' has no element kind",
                            field.name
                        ))
                    })?;
                    if !element.is_scalar() {
                        return Err(ProtocolError::schema_invalid(format!(
                            "{name}: array field '{}' has non-scalar element kind {element:?}",
                            field.name
                        )));
                    }
                    if field.capacity == 0 {
                        return Err(ProtocolError::schema_invalid(format!(
                            "{name}: array field '{}' has zero capacity",
                            field.name
                        )));
                    }
                }
                _ => {
                    if field.element_kind.is_some() || field.use_diff || field.capacity != 0 {
                        return Err(ProtocolError::schema_invalid(format!(
                            "{name}: non-array field '{}' carries array metadata",
                            field.name
                        )));
                    }
                }
            }
        }

        Ok(Self { packet_type, name, has_delta, fields, key_count })
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// The key prefix, in declaration order.
    pub fn key_fields(&self) -> &[FieldSchema] {
        &self.fields[..self.key_count]
    }

    /// Non-key fields, in declaration order. Index here is bitvector bit
    /// index.
    pub fn non_key_fields(&self) -> &[FieldSchema] {
        &self.fields[self.key_count..]
    }

    /// Number of bits the delta bitvector carries.
    pub fn bitvector_bit_count(&self) -> usize {
        self.fields.len() - self.key_count
    }

    /// Number of bytes the delta bitvector occupies on the wire.
    pub fn bitvector_byte_count(&self) -> usize {
        self.bitvector_bit_count().div_ceil(8)
    }
}
