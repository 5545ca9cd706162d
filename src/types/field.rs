//! Field kind and runtime value definitions

use serde::{Deserialize, Serialize};

/// Wire-level field kinds understood by the codec.
///
/// Maps to the type names used in the protocol definition files
/// (`UINT8`..`UINT32`, `SINT8`..`SINT32`, `BOOL`, `STRING`, plus arrays of
/// any scalar kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer, big-endian on the wire
    U16,
    /// 32-bit unsigned integer, big-endian on the wire
    U32,
    /// 8-bit signed integer
    S8,
    /// 16-bit signed integer, big-endian on the wire
    S16,
    /// 32-bit signed integer, big-endian on the wire
    S32,
    /// One byte on the wire; zero is false, anything else is true
    Bool,
    /// Null-terminated UTF-8
    String,
    /// Fixed-capacity sequence of a scalar element kind
    Array,
}

impl FieldKind {
    /// Returns the on-wire size in bytes for fixed-width kinds.
    ///
    /// `String` and `Array` have no fixed width and return `None`.
    pub const fn wire_size(&self) -> Option<usize> {
        match self {
            FieldKind::U8 | FieldKind::S8 | FieldKind::Bool => Some(1),
            FieldKind::U16 | FieldKind::S16 => Some(2),
            FieldKind::U32 | FieldKind::S32 => Some(4),
            FieldKind::String | FieldKind::Array => None,
        }
    }

    /// Returns whether this kind can be an array element.
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, FieldKind::String | FieldKind::Array)
    }

    /// The value an absent field of this kind reconstructs to when the
    /// delta cache has no baseline.
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldKind::U8 => FieldValue::U8(0),
            FieldKind::U16 => FieldValue::U16(0),
            FieldKind::U32 => FieldValue::U32(0),
            FieldKind::S8 => FieldValue::S8(0),
            FieldKind::S16 => FieldValue::S16(0),
            FieldKind::S32 => FieldValue::S32(0),
            FieldKind::Bool => FieldValue::Bool(false),
            FieldKind::String => FieldValue::String(String::new()),
            // Array defaults need a capacity and element kind; the schema
            // layer builds them via FieldSchema::default_value
            FieldKind::Array => FieldValue::Array(Vec::new()),
        }
    }
}

/// Runtime value for any decodable field.
///
/// No floating-point variants exist in this protocol, so the type is fully
/// `Eq` + `Hash` and key tuples can index the delta cache directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    S8(i8),
    S16(i16),
    S32(i32),
    Bool(bool),
    String(String),
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// Returns the kind tag of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::U8(_) => FieldKind::U8,
            FieldValue::U16(_) => FieldKind::U16,
            FieldValue::U32(_) => FieldKind::U32,
            FieldValue::S8(_) => FieldKind::S8,
            FieldValue::S16(_) => FieldKind::S16,
            FieldValue::S32(_) => FieldKind::S32,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Array(_) => FieldKind::Array,
        }
    }

    /// Borrow as `bool` if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow as `&str` if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Borrow as an element slice if this is an `Array`.
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Widen any integer variant to `i64`.
    ///
    /// Returns `None` for bool, string, and array values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::U8(v) => Some(i64::from(*v)),
            FieldValue::U16(v) => Some(i64::from(*v)),
            FieldValue::U32(v) => Some(i64::from(*v)),
            FieldValue::S8(v) => Some(i64::from(*v)),
            FieldValue::S16(v) => Some(i64::from(*v)),
            FieldValue::S32(v) => Some(i64::from(*v)),
            FieldValue::Bool(_) | FieldValue::String(_) | FieldValue::Array(_) => None,
        }
    }
}
