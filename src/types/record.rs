//! Decoded packet records with by-name typed lookups
//!
//! A [`DecodedRecord`] is the output of the delta decoder: one entry per
//! schema field, in schema declaration order. Order matters - it is the
//! wire contract - so the record is a small ordered vector rather than a
//! hash map. Lookups scan linearly; packets have tens of fields at most.

use serde::{Deserialize, Serialize};

use super::FieldValue;

/// A fully decoded packet body: field name -> typed value, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedRecord {
    fields: Vec<(String, FieldValue)>,
}

impl DecodedRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { fields: Vec::with_capacity(capacity) }
    }

    /// Append a field. Declaration order is preserved.
    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Convenience typed helpers
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_i64()
    }
    pub fn array(&self, name: &str) -> Option<&[FieldValue]> {
        self.get(name)?.as_array()
    }
}

impl FromIterator<(String, FieldValue)> for DecodedRecord {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_preserves_insertion_order() {
        let mut record = DecodedRecord::new();
        record.push("message", FieldValue::String("Hi".into()));
        record.push("tile", FieldValue::S32(-1));
        record.push("turn", FieldValue::S16(1));

        let names: Vec<&str> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["message", "tile", "turn"]);
    }

    #[test]
    fn typed_accessors() {
        let mut record = DecodedRecord::new();
        record.push("active", FieldValue::Bool(true));
        record.push("name", FieldValue::String("alpha".into()));
        record.push("count", FieldValue::S16(10));

        assert_eq!(record.bool("active"), Some(true));
        assert_eq!(record.str("name"), Some("alpha"));
        assert_eq!(record.i64("count"), Some(10));
        assert_eq!(record.bool("name"), None);
        assert_eq!(record.get("missing"), None);
    }
}
