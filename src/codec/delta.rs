//! Delta and array-diff packet body codec.
//!
//! A delta body is laid out as `bitvector ‖ key fields ‖ payload`, where
//! the payload carries exactly the non-key fields whose bitvector bit is
//! set, in schema order. Two optimizations ride on top:
//!
//! - **Boolean header folding**: a standalone `Bool` field never appears in
//!   the payload; its bitvector bit *is* the value.
//! - **Array diff**: an array field marked `use_diff` transmits sparse
//!   `index value` pairs terminated by a sentinel index equal to the
//!   array's capacity. Indices are one byte when `capacity <= 255`, two
//!   big-endian bytes otherwise.
//!
//! Fields whose bit is clear are reconstructed from the delta cache (or
//! per-kind defaults on a cache miss), and the merged record is written
//! back to the cache before the caller sees it. The encoder is the exact
//! reciprocal and keeps its own cache side in step, so a client and server
//! running these two functions against the same stream stay synchronized.

use tracing::trace;

use crate::error::{ProtocolError, Result};
use crate::schema::{FieldSchema, PacketSchema};
use crate::types::{DecodedRecord, FieldKind, FieldValue};

use super::bitvector::Bitvector;
use super::cache::{DeltaCache, KeyTuple};
use super::primitives;

/// Decode a packet body into a full record.
///
/// Returns the record and the number of body bytes consumed. Trailing
/// bytes are not an error at this layer; frame-level byte-exactness is the
/// reader's job.
///
/// For delta schemas the cache is consulted for absent fields and updated
/// with the merged result. Non-delta schemas decode densely and leave the
/// cache untouched.
pub fn decode_body(
    schema: &PacketSchema,
    body: &[u8],
    cache: &mut DeltaCache,
) -> Result<(DecodedRecord, usize)> {
    if !schema.has_delta {
        return decode_dense(schema, body);
    }

    let mut offset = 0;

    let (bits, next) = primitives::read_raw(body, offset, schema.bitvector_byte_count())?;
    let bitvector = Bitvector::from_bytes(bits);
    offset = next;

    let mut record = DecodedRecord::with_capacity(schema.fields().len());
    let mut key: KeyTuple = Vec::with_capacity(schema.key_fields().len());
    for field in schema.key_fields() {
        let (value, next) = decode_field(field, body, offset)?;
        offset = next;
        key.push(value.clone());
        record.push(field.name.clone(), value);
    }

    let baseline = cache.get(schema.packet_type, &key).cloned();
    trace!(
        packet_type = schema.packet_type,
        cached = baseline.is_some(),
        "resolving delta baseline"
    );

    let mut non_key = DecodedRecord::with_capacity(schema.non_key_fields().len());
    for (bit, field) in schema.non_key_fields().iter().enumerate() {
        let present = bitvector.bit(bit);
        let value = if field.kind == FieldKind::Bool {
            // folded: the bit is the value and no payload byte exists
            FieldValue::Bool(present)
        } else if field.kind == FieldKind::Array && field.use_diff {
            let base_elements = baseline_elements(&baseline, field);
            if present {
                let (elements, next) = decode_array_diff(
                    body,
                    offset,
                    field.element_kind.expect("array schemas carry an element kind"),
                    field.capacity,
                    &base_elements,
                )?;
                offset = next;
                FieldValue::Array(elements)
            } else {
                FieldValue::Array(base_elements)
            }
        } else if present {
            let (value, next) = decode_field(field, body, offset)?;
            offset = next;
            value
        } else {
            baseline_value(&baseline, field)
        };
        non_key.push(field.name.clone(), value.clone());
        record.push(field.name.clone(), value);
    }

    cache.put(schema.packet_type, key, non_key);

    Ok((record, offset))
}

/// Encode a full record into a packet body.
///
/// The reciprocal of [`decode_body`]: emits `bitvector ‖ keys ‖ payload`
/// for delta schemas, diffing against the cache baseline so unchanged
/// fields stay off the wire, then stores the record as the new baseline.
/// Non-delta schemas serialize densely and skip the cache.
pub fn encode_body(
    schema: &PacketSchema,
    record: &DecodedRecord,
    cache: &mut DeltaCache,
) -> Result<Vec<u8>> {
    if !schema.has_delta {
        let mut out = Vec::new();
        for field in schema.fields() {
            primitives::write_scalar(&mut out, expect_field(record, field)?);
        }
        return Ok(out);
    }

    let mut key: KeyTuple = Vec::with_capacity(schema.key_fields().len());
    let mut key_bytes = Vec::new();
    for field in schema.key_fields() {
        let value = expect_field(record, field)?;
        key.push(value.clone());
        primitives::write_scalar(&mut key_bytes, value);
    }

    let baseline = cache.get(schema.packet_type, &key).cloned();

    let mut bitvector = Bitvector::with_bit_count(schema.bitvector_bit_count());
    let mut payload = Vec::new();
    let mut non_key = DecodedRecord::with_capacity(schema.non_key_fields().len());

    for (bit, field) in schema.non_key_fields().iter().enumerate() {
        let value = expect_field(record, field)?;
        non_key.push(field.name.clone(), value.clone());

        if field.kind == FieldKind::Bool {
            if value == &FieldValue::Bool(true) {
                bitvector.set_bit(bit);
            }
            continue;
        }

        if field.kind == FieldKind::Array && field.use_diff {
            let base_elements = baseline_elements(&baseline, field);
            let elements = value.as_array().expect("kind checked by expect_field");
            if elements == base_elements.as_slice() {
                continue;
            }
            bitvector.set_bit(bit);
            encode_array_diff(&mut payload, field.capacity, elements, &base_elements);
        } else {
            if *value == baseline_value(&baseline, field) {
                continue;
            }
            bitvector.set_bit(bit);
            primitives::write_scalar(&mut payload, value);
        }
    }

    cache.put(schema.packet_type, key, non_key);

    let mut out = Vec::with_capacity(bitvector.as_bytes().len() + key_bytes.len() + payload.len());
    out.extend_from_slice(bitvector.as_bytes());
    out.extend_from_slice(&key_bytes);
    out.extend_from_slice(&payload);
    Ok(out)
}

fn decode_dense(schema: &PacketSchema, body: &[u8]) -> Result<(DecodedRecord, usize)> {
    let mut record = DecodedRecord::with_capacity(schema.fields().len());
    let mut offset = 0;
    for field in schema.fields() {
        let (value, next) = decode_field(field, body, offset)?;
        offset = next;
        record.push(field.name.clone(), value);
    }
    Ok((record, offset))
}

/// Decode one field at `offset`: a scalar, or a dense array of `capacity`
/// elements.
fn decode_field(field: &FieldSchema, body: &[u8], offset: usize) -> Result<(FieldValue, usize)> {
    match field.kind {
        FieldKind::Array => {
            let element_kind = field.element_kind.expect("array schemas carry an element kind");
            let mut elements = Vec::with_capacity(usize::from(field.capacity));
            let mut offset = offset;
            for _ in 0..field.capacity {
                let (value, next) = primitives::read_scalar(element_kind, body, offset)?;
                elements.push(value);
                offset = next;
            }
            Ok((FieldValue::Array(elements), offset))
        }
        kind => primitives::read_scalar(kind, body, offset),
    }
}

/// Decode a sparse array diff over a copy of `baseline`.
///
/// The sentinel is the capacity itself: the smallest value outside the
/// valid index range, guaranteed to fit the chosen index width.
fn decode_array_diff(
    body: &[u8],
    offset: usize,
    element_kind: FieldKind,
    capacity: u16,
    baseline: &[FieldValue],
) -> Result<(Vec<FieldValue>, usize)> {
    let mut working = baseline.to_vec();
    let mut offset = offset;

    loop {
        let (index, next) = read_diff_index(body, offset, capacity)?;
        offset = next;

        if index == capacity {
            break;
        }
        if index > capacity {
            return Err(ProtocolError::ArrayIndexOutOfRange { index, capacity });
        }

        let (value, next) = primitives::read_scalar(element_kind, body, offset)?;
        working[usize::from(index)] = value;
        offset = next;
    }

    Ok((working, offset))
}

fn encode_array_diff(
    out: &mut Vec<u8>,
    capacity: u16,
    elements: &[FieldValue],
    baseline: &[FieldValue],
) {
    for (index, (element, base)) in elements.iter().zip(baseline).enumerate() {
        if element != base {
            write_diff_index(out, capacity, index as u16);
            primitives::write_scalar(out, element);
        }
    }
    write_diff_index(out, capacity, capacity);
}

fn read_diff_index(body: &[u8], offset: usize, capacity: u16) -> Result<(u16, usize)> {
    if capacity <= u16::from(u8::MAX) {
        let (index, next) = primitives::read_u8(body, offset)?;
        Ok((u16::from(index), next))
    } else {
        primitives::read_u16(body, offset)
    }
}

fn write_diff_index(out: &mut Vec<u8>, capacity: u16, index: u16) {
    if capacity <= u16::from(u8::MAX) {
        out.push(index as u8);
    } else {
        out.extend_from_slice(&index.to_be_bytes());
    }
}

/// The baseline value for one non-key field: the cache entry's value when
/// present, the field default otherwise.
fn baseline_value(baseline: &Option<DecodedRecord>, field: &FieldSchema) -> FieldValue {
    baseline
        .as_ref()
        .and_then(|record| record.get(&field.name))
        .cloned()
        .unwrap_or_else(|| field.default_value())
}

/// Baseline elements for an array field, always `capacity` long.
fn baseline_elements(baseline: &Option<DecodedRecord>, field: &FieldSchema) -> Vec<FieldValue> {
    if let Some(FieldValue::Array(elements)) =
        baseline.as_ref().and_then(|record| record.get(&field.name))
    {
        if elements.len() == usize::from(field.capacity) {
            return elements.clone();
        }
    }
    let element = field.element_kind.map(|k| k.default_value()).unwrap_or(FieldValue::U8(0));
    vec![element; usize::from(field.capacity)]
}

/// Fetch a field from a caller-supplied record, checking shape against the
/// schema so encode errors surface before half a body is written.
fn expect_field<'a>(record: &'a DecodedRecord, field: &FieldSchema) -> Result<&'a FieldValue> {
    let value = record.get(&field.name).ok_or_else(|| {
        ProtocolError::schema_invalid(format!("record is missing field '{}'", field.name))
    })?;
    if value.kind() != field.kind {
        return Err(ProtocolError::schema_invalid(format!(
            "field '{}' is {:?}, schema says {:?}",
            field.name,
            value.kind(),
            field.kind
        )));
    }
    if let FieldValue::Array(elements) = value {
        if elements.len() != usize::from(field.capacity) {
            return Err(ProtocolError::schema_invalid(format!(
                "array '{}' has {} elements, capacity is {}",
                field.name,
                elements.len(),
                field.capacity
            )));
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PacketSchema;
    use crate::types::PACKET_CHAT_MSG;

    fn chat_schema() -> PacketSchema {
        PacketSchema::new(
            PACKET_CHAT_MSG,
            "chat_msg",
            true,
            vec![
                FieldSchema::scalar("message", FieldKind::String),
                FieldSchema::scalar("tile", FieldKind::S32),
                FieldSchema::scalar("event", FieldKind::S16),
                FieldSchema::scalar("turn", FieldKind::S16),
                FieldSchema::scalar("phase", FieldKind::S16),
                FieldSchema::scalar("conn_id", FieldKind::S16),
            ],
        )
        .unwrap()
    }

    #[test]
    fn chat_msg_first_delta_decodes_every_field() {
        let schema = chat_schema();
        let mut cache = DeltaCache::new();
        let body = [
            0x3F, // all six bits set
            0x48, 0x69, 0x00, // "Hi"
            0xFF, 0xFF, 0xFF, 0xFF, // tile = -1
            0x00, 0x05, // event = 5
            0x00, 0x01, // turn = 1
            0x00, 0x00, // phase = 0
            0x00, 0x07, // conn_id = 7
        ];

        let (record, consumed) = decode_body(&schema, &body, &mut cache).unwrap();
        assert_eq!(consumed, body.len());
        assert_eq!(record.str("message"), Some("Hi"));
        assert_eq!(record.i64("tile"), Some(-1));
        assert_eq!(record.i64("event"), Some(5));
        assert_eq!(record.i64("turn"), Some(1));
        assert_eq!(record.i64("phase"), Some(0));
        assert_eq!(record.i64("conn_id"), Some(7));

        let cached = cache.get(PACKET_CHAT_MSG, &vec![]).unwrap();
        assert_eq!(cached.str("message"), Some("Hi"));
        assert_eq!(cached.i64("conn_id"), Some(7));
    }

    #[test]
    fn chat_msg_second_delta_reuses_cache() {
        let schema = chat_schema();
        let mut cache = DeltaCache::new();
        let first = [
            0x3F, 0x48, 0x69, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x05, 0x00, 0x01, 0x00, 0x00,
            0x00, 0x07,
        ];
        decode_body(&schema, &first, &mut cache).unwrap();

        // only bit 0 (message) set; everything else comes from cache
        let second = [0x01, 0x42, 0x79, 0x65, 0x00];
        let (record, consumed) = decode_body(&schema, &second, &mut cache).unwrap();
        assert_eq!(consumed, second.len());
        assert_eq!(record.str("message"), Some("Bye"));
        assert_eq!(record.i64("tile"), Some(-1));
        assert_eq!(record.i64("event"), Some(5));
        assert_eq!(record.i64("turn"), Some(1));
        assert_eq!(record.i64("phase"), Some(0));
        assert_eq!(record.i64("conn_id"), Some(7));
    }

    #[test]
    fn absent_fields_without_cache_take_defaults() {
        let schema = chat_schema();
        let mut cache = DeltaCache::new();
        // only message present, cold cache
        let body = [0x01, 0x48, 0x69, 0x00];
        let (record, _) = decode_body(&schema, &body, &mut cache).unwrap();
        assert_eq!(record.str("message"), Some("Hi"));
        assert_eq!(record.i64("tile"), Some(0));
        assert_eq!(record.i64("conn_id"), Some(0));
    }

    #[test]
    fn boolean_folding_consumes_no_payload_bytes() {
        let schema = PacketSchema::new(
            60,
            "folded",
            true,
            vec![
                FieldSchema::key("id", FieldKind::U32),
                FieldSchema::scalar("active", FieldKind::Bool),
                FieldSchema::scalar("visible", FieldKind::Bool),
                FieldSchema::scalar("count", FieldKind::S16),
            ],
        )
        .unwrap();
        let mut cache = DeltaCache::new();

        // key id=1, bitvector 0x05 (bits 0 and 2), then count=10
        let body = [0x00, 0x00, 0x00, 0x01, 0x05, 0x00, 0x0A];
        let (record, consumed) = decode_body(&schema, &body, &mut cache).unwrap();
        assert_eq!(consumed, 7);
        assert_eq!(record.i64("id"), Some(1));
        assert_eq!(record.bool("active"), Some(true));
        assert_eq!(record.bool("visible"), Some(false));
        assert_eq!(record.i64("count"), Some(10));

        // a cleared bool bit is the value false, not "reuse cached true"
        let body = [0x00, 0x00, 0x00, 0x01, 0x00];
        let (record, consumed) = decode_body(&schema, &body, &mut cache).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(record.bool("active"), Some(false));
        assert_eq!(record.i64("count"), Some(10));
    }

    #[test]
    fn bitvector_precedes_key_fields_on_the_wire() {
        // key id after the bitvector byte: proves the ordering contract
        let schema = PacketSchema::new(
            61,
            "keyed",
            true,
            vec![
                FieldSchema::key("id", FieldKind::U8),
                FieldSchema::scalar("value", FieldKind::U16),
            ],
        )
        .unwrap();
        let mut cache = DeltaCache::new();

        let body = [0x01, 0x2A, 0x12, 0x34];
        let (record, _) = decode_body(&schema, &body, &mut cache).unwrap();
        assert_eq!(record.i64("id"), Some(42));
        assert_eq!(record.i64("value"), Some(0x1234));
    }

    #[test]
    fn key_only_packet_reads_no_bitvector() {
        let schema = PacketSchema::new(
            228,
            "unit_bonus",
            true,
            vec![
                FieldSchema::key("unit", FieldKind::U16),
                FieldSchema::key("flag", FieldKind::U8),
                FieldSchema::key("type", FieldKind::U8),
                FieldSchema::key("value", FieldKind::S16),
                FieldSchema::key("quiet", FieldKind::Bool),
            ],
        )
        .unwrap();
        let mut cache = DeltaCache::new();

        let body = [0x00, 0x03, 0x01, 0x02, 0xFF, 0xFE, 0x01];
        let (record, consumed) = decode_body(&schema, &body, &mut cache).unwrap();
        assert_eq!(consumed, 7);
        assert_eq!(record.i64("unit"), Some(3));
        assert_eq!(record.i64("value"), Some(-2));
        assert_eq!(record.bool("quiet"), Some(true));
    }

    #[test]
    fn array_diff_one_byte_indices() {
        let baseline = vec![FieldValue::Bool(false); 10];
        let body = [0x02, 0x01, 0x05, 0x01, 0x0A];
        let (elements, consumed) =
            decode_array_diff(&body, 0, FieldKind::Bool, 10, &baseline).unwrap();
        assert_eq!(consumed, 5);
        for (i, element) in elements.iter().enumerate() {
            assert_eq!(element.as_bool(), Some(i == 2 || i == 5), "index {i}");
        }
    }

    #[test]
    fn array_diff_two_byte_indices() {
        let baseline = vec![FieldValue::Bool(false); 401];
        // indices 5 and 10, then sentinel 0x0191 = 401
        let body = [0x00, 0x05, 0x01, 0x00, 0x0A, 0x01, 0x01, 0x91];
        let (elements, consumed) =
            decode_array_diff(&body, 0, FieldKind::Bool, 401, &baseline).unwrap();
        assert_eq!(consumed, 8);
        for (i, element) in elements.iter().enumerate() {
            assert_eq!(element.as_bool(), Some(i == 5 || i == 10), "index {i}");
        }
    }

    #[test]
    fn array_diff_empty_delta_is_just_the_sentinel() {
        let baseline = vec![FieldValue::S8(7); 20];
        let (elements, consumed) =
            decode_array_diff(&[20], 0, FieldKind::S8, 20, &baseline).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(elements, baseline);
    }

    #[test]
    fn array_diff_full_delta_is_accepted() {
        let capacity = 4u16;
        let baseline = vec![FieldValue::U8(0); 4];
        let body = [0, 10, 1, 11, 2, 12, 3, 13, 4];
        let (elements, consumed) =
            decode_array_diff(&body, 0, FieldKind::U8, capacity, &baseline).unwrap();
        assert_eq!(consumed, 9);
        assert_eq!(
            elements,
            vec![FieldValue::U8(10), FieldValue::U8(11), FieldValue::U8(12), FieldValue::U8(13)]
        );
    }

    #[test]
    fn array_diff_index_beyond_capacity_fails() {
        let baseline = vec![FieldValue::Bool(false); 10];
        let body = [0x0B, 0x01, 0x0A];
        let err = decode_array_diff(&body, 0, FieldKind::Bool, 10, &baseline).unwrap_err();
        assert!(matches!(err, ProtocolError::ArrayIndexOutOfRange { index: 11, capacity: 10 }));
    }

    #[test]
    fn array_diff_merges_over_cached_baseline() {
        let schema = PacketSchema::new(
            16,
            "game_info",
            true,
            vec![
                FieldSchema::scalar("count", FieldKind::U16),
                FieldSchema::array_diff("advances", FieldKind::Bool, 10),
            ],
        )
        .unwrap();
        let mut cache = DeltaCache::new();

        // first packet: count=2, advances[2] = true
        let body = [0x03, 0x00, 0x02, 0x02, 0x01, 0x0A];
        decode_body(&schema, &body, &mut cache).unwrap();

        // second packet: only advances bit set, flips index 5
        let body = [0x02, 0x05, 0x01, 0x0A];
        let (record, _) = decode_body(&schema, &body, &mut cache).unwrap();
        assert_eq!(record.i64("count"), Some(2));
        let advances = record.array("advances").unwrap();
        assert_eq!(advances[2].as_bool(), Some(true));
        assert_eq!(advances[5].as_bool(), Some(true));
        assert_eq!(advances[0].as_bool(), Some(false));
    }

    #[test]
    fn array_diff_bit_clear_keeps_baseline_verbatim() {
        let schema = PacketSchema::new(
            16,
            "game_info",
            true,
            vec![
                FieldSchema::scalar("count", FieldKind::U16),
                FieldSchema::array_diff("advances", FieldKind::Bool, 10),
            ],
        )
        .unwrap();
        let mut cache = DeltaCache::new();

        let body = [0x03, 0x00, 0x02, 0x02, 0x01, 0x0A];
        decode_body(&schema, &body, &mut cache).unwrap();

        // only count changes; the array bit is clear
        let body = [0x01, 0x00, 0x09];
        let (record, consumed) = decode_body(&schema, &body, &mut cache).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(record.i64("count"), Some(9));
        assert_eq!(record.array("advances").unwrap()[2].as_bool(), Some(true));
    }

    #[test]
    fn non_delta_schema_decodes_densely_and_skips_cache() {
        let schema = PacketSchema::new(
            5,
            "server_join_reply",
            false,
            vec![
                FieldSchema::scalar("you_can_join", FieldKind::Bool),
                FieldSchema::scalar("message", FieldKind::String),
                FieldSchema::scalar("capability", FieldKind::String),
                FieldSchema::scalar("challenge_file", FieldKind::String),
            ],
        )
        .unwrap();
        let mut cache = DeltaCache::new();

        let mut body = vec![0x01];
        body.extend_from_slice(b"Welcome\x00");
        body.extend_from_slice(b"+caps\x00");
        body.extend_from_slice(b"challenge\x00");

        let (record, consumed) = decode_body(&schema, &body, &mut cache).unwrap();
        assert_eq!(consumed, body.len());
        assert_eq!(record.bool("you_can_join"), Some(true));
        assert_eq!(record.str("message"), Some("Welcome"));
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn truncated_body_is_a_short_read() {
        let schema = chat_schema();
        let mut cache = DeltaCache::new();
        // bitvector says tile is present but the body ends after two bytes
        let body = [0x02, 0xFF, 0xFF];
        let err = decode_body(&schema, &body, &mut cache).unwrap_err();
        assert!(matches!(err, ProtocolError::ShortRead { .. }));
    }

    #[test]
    fn encode_decode_roundtrip_with_cold_caches() {
        let schema = chat_schema();
        let mut record = DecodedRecord::new();
        record.push("message", FieldValue::String("Hi".into()));
        record.push("tile", FieldValue::S32(-1));
        record.push("event", FieldValue::S16(5));
        record.push("turn", FieldValue::S16(1));
        record.push("phase", FieldValue::S16(0));
        record.push("conn_id", FieldValue::S16(7));

        let mut encode_cache = DeltaCache::new();
        let body = encode_body(&schema, &record, &mut encode_cache).unwrap();

        let mut decode_cache = DeltaCache::new();
        let (decoded, consumed) = decode_body(&schema, &body, &mut decode_cache).unwrap();
        assert_eq!(consumed, body.len());
        assert_eq!(decoded, record);
    }

    #[test]
    fn encoder_omits_fields_matching_the_baseline() {
        let schema = chat_schema();
        let mut cache = DeltaCache::new();

        let mut record = DecodedRecord::new();
        record.push("message", FieldValue::String("Hi".into()));
        record.push("tile", FieldValue::S32(-1));
        record.push("event", FieldValue::S16(5));
        record.push("turn", FieldValue::S16(1));
        record.push("phase", FieldValue::S16(0));
        record.push("conn_id", FieldValue::S16(7));
        let first = encode_body(&schema, &record, &mut cache).unwrap();

        // same record again: every non-bool field matches the baseline
        let second = encode_body(&schema, &record, &mut cache).unwrap();
        assert!(second.len() < first.len());
        assert_eq!(second, vec![0x00]);

        // and an all-zero bitvector round-trips to the identical record
        let mut decode_cache = DeltaCache::new();
        decode_body(&schema, &first, &mut decode_cache).unwrap();
        let (decoded, _) = decode_body(&schema, &second, &mut decode_cache).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn encoder_emits_sparse_wire_layout_for_array_diff() {
        let schema = PacketSchema::new(
            16,
            "game_info",
            true,
            vec![FieldSchema::array_diff("advances", FieldKind::Bool, 10)],
        )
        .unwrap();
        let mut cache = DeltaCache::new();

        let mut elements = vec![FieldValue::Bool(false); 10];
        elements[2] = FieldValue::Bool(true);
        elements[5] = FieldValue::Bool(true);
        let mut record = DecodedRecord::new();
        record.push("advances", FieldValue::Array(elements));

        let body = encode_body(&schema, &record, &mut cache).unwrap();
        assert_eq!(body, vec![0x01, 0x02, 0x01, 0x05, 0x01, 0x0A]);
    }

    #[test]
    fn encode_rejects_misshapen_records() {
        let schema = chat_schema();
        let mut cache = DeltaCache::new();

        let mut record = DecodedRecord::new();
        record.push("message", FieldValue::S32(1));
        let err = encode_body(&schema, &record, &mut cache).unwrap_err();
        assert!(matches!(err, ProtocolError::SchemaInvalid { .. }));
    }
}
