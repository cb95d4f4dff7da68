//! Property-based tests for avrokit.
//!
//! These tests use proptest to check the round-trip and skip-length
//! properties over many generated values.

use proptest::prelude::*;

use avrokit::codec::Codec;
use avrokit::{
    parse_schema, AvroSchema, AvroValue, ContainerReader, ContainerWriter, DatumReader,
    DatumWriter, Decoder, Encoder, GenericRecord, WriterConfig,
};

// ============================================================================
// Helpers
// ============================================================================

fn encode(schema: &AvroSchema, value: &AvroValue) -> Vec<u8> {
    let mut encoder = Encoder::new();
    DatumWriter::new(schema)
        .unwrap()
        .write(&mut encoder, value)
        .unwrap();
    encoder.as_bytes().to_vec()
}

/// Decode with `reader`/`writer` and return the value plus the bytes consumed
/// by `read` and by `skip`.
fn decode(reader: &AvroSchema, writer: &AvroSchema, bytes: &[u8]) -> (AvroValue, usize, usize) {
    let datum = DatumReader::with_schemas(reader, writer).unwrap();
    let mut decoder = Decoder::new(bytes);
    let value = datum.read(&mut decoder).unwrap();
    let mut skipper = Decoder::new(bytes);
    datum.skip(&mut skipper).unwrap();
    (value, decoder.position(), skipper.position())
}

// ============================================================================
// Value Generators
// ============================================================================

/// Floats without NaN, which never compares equal to itself.
fn arb_f32() -> impl Strategy<Value = f32> {
    any::<f32>().prop_filter("not NaN", |f| !f.is_nan())
}

fn arb_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("not NaN", |f| !f.is_nan())
}

/// A primitive schema paired with a generated value of that schema.
fn arb_primitive() -> impl Strategy<Value = (AvroSchema, AvroValue)> {
    prop_oneof![
        Just((AvroSchema::Null, AvroValue::Null)),
        any::<bool>().prop_map(|b| (AvroSchema::Boolean, AvroValue::Boolean(b))),
        any::<i32>().prop_map(|i| (AvroSchema::Int, AvroValue::Int(i))),
        any::<i64>().prop_map(|l| (AvroSchema::Long, AvroValue::Long(l))),
        arb_f32().prop_map(|f| (AvroSchema::Float, AvroValue::Float(f))),
        arb_f64().prop_map(|d| (AvroSchema::Double, AvroValue::Double(d))),
        prop::collection::vec(any::<u8>(), 0..64)
            .prop_map(|b| (AvroSchema::Bytes, AvroValue::Bytes(b))),
        ".{0,32}".prop_map(|s| (AvroSchema::String, AvroValue::String(s))),
    ]
}

const POINT: &str = r#"{
    "type": "record",
    "name": "Point",
    "fields": [
        {"name": "x", "type": "long"},
        {"name": "y", "type": "double"},
        {"name": "label", "type": ["null", "string"]},
        {"name": "tags", "type": {"type": "array", "items": "string"}}
    ]
}"#;

fn arb_point() -> impl Strategy<Value = AvroValue> {
    (
        any::<i64>(),
        arb_f64(),
        prop::option::of("[a-z]{0,8}"),
        prop::collection::vec("[a-z]{1,4}", 0..5),
    )
        .prop_map(|(x, y, label, tags)| {
            let schema = parse_schema(POINT).unwrap();
            let record = GenericRecord::from_schema(&schema)
                .unwrap()
                .with("x", x)
                .unwrap()
                .with("y", y)
                .unwrap()
                .with("label", label.map(AvroValue::String).unwrap_or(AvroValue::Null))
                .unwrap()
                .with(
                    "tags",
                    AvroValue::Array(tags.into_iter().map(AvroValue::String).collect()),
                )
                .unwrap();
            AvroValue::Record(record)
        })
}

// ============================================================================
// Round Trip Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every primitive decodes to itself and skip consumes exactly its encoding.
    #[test]
    fn prop_primitive_round_trip((schema, value) in arb_primitive()) {
        let bytes = encode(&schema, &value);
        let (decoded, read, skipped) = decode(&schema, &schema, &bytes);
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(read, bytes.len());
        prop_assert_eq!(skipped, bytes.len());
    }

    #[test]
    fn prop_array_round_trip(items in prop::collection::vec(any::<i64>(), 0..100)) {
        let schema = parse_schema(r#"{"type": "array", "items": "long"}"#).unwrap();
        let value = AvroValue::Array(items.into_iter().map(AvroValue::Long).collect());
        let bytes = encode(&schema, &value);
        let (decoded, read, skipped) = decode(&schema, &schema, &bytes);
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(read, bytes.len());
        prop_assert_eq!(skipped, bytes.len());
    }

    #[test]
    fn prop_map_round_trip(
        entries in prop::collection::btree_map("[a-z]{1,6}", arb_f64(), 0..20)
    ) {
        let schema = parse_schema(r#"{"type": "map", "values": "double"}"#).unwrap();
        let value = AvroValue::Map(
            entries.into_iter().map(|(k, v)| (k, AvroValue::Double(v))).collect(),
        );
        let bytes = encode(&schema, &value);
        let (decoded, read, skipped) = decode(&schema, &schema, &bytes);
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(read, bytes.len());
        prop_assert_eq!(skipped, bytes.len());
    }

    #[test]
    fn prop_record_round_trip(value in arb_point()) {
        let schema = parse_schema(POINT).unwrap();
        let bytes = encode(&schema, &value);
        let (decoded, read, skipped) = decode(&schema, &schema, &bytes);
        prop_assert_eq!(read, bytes.len());
        prop_assert_eq!(skipped, bytes.len());

        let (AvroValue::Record(decoded), AvroValue::Record(original)) = (&decoded, &value) else {
            panic!("expected records");
        };
        prop_assert_eq!(decoded.get("x"), original.get("x"));
        prop_assert_eq!(decoded.get("y"), original.get("y"));
        prop_assert_eq!(decoded.get("tags"), original.get("tags"));
        prop_assert_eq!(
            decoded.get("label").map(|v| v.unwrap_union()),
            original.get("label")
        );
    }

    /// Re-encoding a decoded value reproduces the original bytes.
    #[test]
    fn prop_record_reencode_is_stable(value in arb_point()) {
        let schema = parse_schema(POINT).unwrap();
        let bytes = encode(&schema, &value);
        let (decoded, _, _) = decode(&schema, &schema, &bytes);
        prop_assert_eq!(encode(&schema, &decoded), bytes);
    }
}

// ============================================================================
// Promotion Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_int_promotes_to_long(i in any::<i32>()) {
        let bytes = encode(&AvroSchema::Int, &AvroValue::Int(i));
        let (decoded, _, skipped) = decode(&AvroSchema::Long, &AvroSchema::Int, &bytes);
        prop_assert_eq!(decoded, AvroValue::Long(i as i64));
        prop_assert_eq!(skipped, bytes.len());
    }

    #[test]
    fn prop_int_promotes_to_double(i in any::<i32>()) {
        let bytes = encode(&AvroSchema::Int, &AvroValue::Int(i));
        let (decoded, _, _) = decode(&AvroSchema::Double, &AvroSchema::Int, &bytes);
        prop_assert_eq!(decoded, AvroValue::Double(i as f64));
    }

    #[test]
    fn prop_float_promotes_to_double(f in arb_f32()) {
        let bytes = encode(&AvroSchema::Float, &AvroValue::Float(f));
        let (decoded, _, _) = decode(&AvroSchema::Double, &AvroSchema::Float, &bytes);
        prop_assert_eq!(decoded, AvroValue::Double(f as f64));
    }

    #[test]
    fn prop_string_bytes_symmetry(s in ".{0,32}") {
        let bytes = encode(&AvroSchema::String, &AvroValue::String(s.clone()));
        let (as_bytes, _, _) = decode(&AvroSchema::Bytes, &AvroSchema::String, &bytes);
        prop_assert_eq!(as_bytes, AvroValue::Bytes(s.clone().into_bytes()));

        let encoded = encode(&AvroSchema::Bytes, &AvroValue::Bytes(s.clone().into_bytes()));
        let (as_string, _, _) = decode(&AvroSchema::String, &AvroSchema::Bytes, &encoded);
        prop_assert_eq!(as_string, AvroValue::String(s));
    }

    /// Reordered nullable unions read the same value and skip the same bytes.
    #[test]
    fn prop_nullable_remap(value in prop::option::of(arb_f32())) {
        let writer = parse_schema(r#"["float", "null"]"#).unwrap();
        let reader = parse_schema(r#"["null", "float"]"#).unwrap();
        let input = value.map(AvroValue::Float).unwrap_or(AvroValue::Null);
        let bytes = encode(&writer, &input);
        let (decoded, read, skipped) = decode(&reader, &writer, &bytes);
        prop_assert_eq!(decoded.unwrap_union(), &input);
        prop_assert_eq!(read, bytes.len());
        prop_assert_eq!(skipped, bytes.len());
    }
}

// ============================================================================
// Codec and Container Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_null_codec_round_trip(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        let compressed = Codec::Null.compress(&data).unwrap();
        prop_assert_eq!(Codec::Null.decompress(&compressed).unwrap(), data);
    }

    #[test]
    #[cfg(feature = "deflate")]
    fn prop_deflate_codec_round_trip(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        let compressed = Codec::Deflate.compress(&data).unwrap();
        prop_assert_eq!(Codec::Deflate.decompress(&compressed).unwrap(), data);
    }

    /// Any block size yields the records back in order.
    #[test]
    fn prop_container_preserves_order(
        values in prop::collection::vec(any::<i64>(), 0..200),
        block_records in 1usize..50,
    ) {
        let config = WriterConfig::new().with_max_block_records(block_records);
        let mut writer =
            ContainerWriter::with_config(Vec::new(), &AvroSchema::Long, config).unwrap();
        for v in &values {
            writer.append(&AvroValue::Long(*v)).unwrap();
        }
        prop_assert_eq!(writer.records_written() as usize + writer.pending_records(), values.len());
        let file = writer.close().unwrap();

        let read: Vec<AvroValue> = ContainerReader::new(file.as_slice())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        prop_assert_eq!(read, values.into_iter().map(AvroValue::Long).collect::<Vec<_>>());
    }
}
