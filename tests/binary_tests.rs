//! Tests for the binary encoding of primitive, complex and logical values.

use std::str::FromStr;

use avrokit::binary::varint::{decode_zigzag, encode_zigzag};
use avrokit::error::DecodeError;
use avrokit::{
    parse_schema, AvroValue, DatumReader, DatumWriter, Decimal, Decoder, Duration, Encoder,
};

fn encode(schema_json: &str, value: &AvroValue) -> Vec<u8> {
    let schema = parse_schema(schema_json).unwrap();
    let mut encoder = Encoder::new();
    DatumWriter::new(&schema)
        .unwrap()
        .write(&mut encoder, value)
        .unwrap();
    encoder.as_bytes().to_vec()
}

fn decode(schema_json: &str, bytes: &[u8]) -> AvroValue {
    let schema = parse_schema(schema_json).unwrap();
    let mut decoder = Decoder::new(bytes);
    let value = DatumReader::new(&schema).unwrap().read(&mut decoder).unwrap();
    assert!(decoder.is_empty(), "decoder left {} bytes", decoder.remaining().len());
    value
}

// ============================================================================
// Varint Tests
// ============================================================================

#[test]
fn test_int_64_is_two_bytes() {
    let mut encoder = Encoder::new();
    encoder.write_int(64);
    assert_eq!(encoder.as_bytes(), &[0x80, 0x01]);
}

#[test]
fn test_int_min_is_five_bytes() {
    let mut encoder = Encoder::new();
    encoder.write_int(i32::MIN);
    assert_eq!(encoder.as_bytes(), &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    assert_eq!(Decoder::new(encoder.as_bytes()).read_int().unwrap(), i32::MIN);
}

#[test]
fn test_long_min_is_ten_bytes() {
    let bytes = encode_zigzag(i64::MIN);
    assert_eq!(bytes.len(), 10);
    assert_eq!(bytes[9], 0x01);
    assert_eq!(decode_zigzag(&mut bytes.as_slice()).unwrap(), i64::MIN);
}

#[test]
fn test_zigzag_small_values() {
    for (value, expected) in [(0i64, 0u8), (-1, 1), (1, 2), (-2, 3), (2, 4), (-64, 127)] {
        assert_eq!(encode_zigzag(value), vec![expected]);
    }
}

#[test]
fn test_varint_too_long() {
    let bytes = [0xFFu8; 11];
    assert!(matches!(
        Decoder::new(&bytes).read_long(),
        Err(DecodeError::InvalidVarint)
    ));
}

#[test]
fn test_int_out_of_range() {
    let bytes = encode_zigzag(i32::MAX as i64 + 1);
    assert!(Decoder::new(&bytes).read_int().is_err());
}

#[test]
fn test_truncated_input() {
    assert!(matches!(
        Decoder::new(&[0x80]).read_long(),
        Err(DecodeError::UnexpectedEof)
    ));
    assert!(matches!(
        Decoder::new(&[0x00, 0x00]).read_double(),
        Err(DecodeError::UnexpectedEof)
    ));
    assert!(matches!(
        Decoder::new(&[0x08, b'a']).read_string(),
        Err(DecodeError::UnexpectedEof)
    ));
}

// ============================================================================
// Primitive Encoding Tests
// ============================================================================

#[test]
fn test_null_writes_nothing() {
    assert!(encode(r#""null""#, &AvroValue::Null).is_empty());
}

#[test]
fn test_boolean_bytes() {
    assert_eq!(encode(r#""boolean""#, &AvroValue::Boolean(true)), vec![0x01]);
    assert_eq!(encode(r#""boolean""#, &AvroValue::Boolean(false)), vec![0x00]);
}

#[test]
fn test_float_and_double_little_endian() {
    assert_eq!(
        encode(r#""float""#, &AvroValue::Float(1.5)),
        1.5f32.to_le_bytes().to_vec()
    );
    assert_eq!(
        encode(r#""double""#, &AvroValue::Double(-2.25)),
        (-2.25f64).to_le_bytes().to_vec()
    );
}

#[test]
fn test_string_is_length_prefixed() {
    let bytes = encode(r#""string""#, &AvroValue::String("foo".into()));
    assert_eq!(bytes, vec![0x06, b'f', b'o', b'o']);
    assert_eq!(decode(r#""string""#, &bytes), AvroValue::String("foo".into()));
}

#[test]
fn test_invalid_utf8_string() {
    let bytes = [0x02, 0xFF];
    let schema = parse_schema(r#""string""#).unwrap();
    let result = DatumReader::new(&schema).unwrap().read(&mut Decoder::new(&bytes));
    assert!(result.is_err());
}

// ============================================================================
// Complex Encoding Tests
// ============================================================================

#[test]
fn test_array_blocks() {
    let value = AvroValue::Array(vec![AvroValue::Long(3), AvroValue::Long(27)]);
    let bytes = encode(r#"{"type": "array", "items": "long"}"#, &value);
    assert_eq!(bytes, vec![0x04, 0x06, 0x36, 0x00]);
    assert_eq!(decode(r#"{"type": "array", "items": "long"}"#, &bytes), value);
}

#[test]
fn test_empty_array_is_single_zero() {
    let bytes = encode(r#"{"type": "array", "items": "int"}"#, &AvroValue::Array(vec![]));
    assert_eq!(bytes, vec![0x00]);
}

#[test]
fn test_huge_count_of_zero_width_items_is_rejected() {
    let schemas = [
        r#"{"type": "array", "items": "null"}"#,
        r#"{"type": "array", "items": {"type": "record", "name": "Unit", "fields": []}}"#,
    ];
    let mut bytes = encode_zigzag(1i64 << 62);
    bytes.push(0x00);

    for schema in schemas {
        let reader = DatumReader::new(&parse_schema(schema).unwrap()).unwrap();
        assert!(matches!(
            reader.read(&mut Decoder::new(&bytes)),
            Err(DecodeError::CollectionTooLarge { .. })
        ));
        assert!(matches!(
            reader.skip(&mut Decoder::new(&bytes)),
            Err(DecodeError::CollectionTooLarge { .. })
        ));
    }

    // the limit counts items across blocks
    let value = AvroValue::Array(vec![AvroValue::Null; 4]);
    let bytes = encode(schemas[0], &value);
    let reader = DatumReader::new(&parse_schema(schemas[0]).unwrap()).unwrap();
    let mut limited = Decoder::new(&bytes).with_max_collection_items(4);
    assert_eq!(reader.read(&mut limited).unwrap(), value);
    let mut limited = Decoder::new(&bytes).with_max_collection_items(3);
    assert!(reader.read(&mut limited).is_err());
}

#[test]
fn test_negative_block_count_is_accepted() {
    // count -2 with byte size 2, items 3 and 27, then end
    let bytes = [0x03, 0x04, 0x06, 0x36, 0x00];
    let schema = r#"{"type": "array", "items": "long"}"#;
    assert_eq!(
        decode(schema, &bytes),
        AvroValue::Array(vec![AvroValue::Long(3), AvroValue::Long(27)])
    );

    let parsed = parse_schema(schema).unwrap();
    let mut decoder = Decoder::new(&bytes);
    DatumReader::new(&parsed).unwrap().skip(&mut decoder).unwrap();
    assert!(decoder.is_empty());
}

#[test]
fn test_multiple_blocks() {
    // two blocks of one item each
    let bytes = [0x02, 0x02, 0x02, 0x04, 0x00];
    assert_eq!(
        decode(r#"{"type": "array", "items": "int"}"#, &bytes),
        AvroValue::Array(vec![AvroValue::Int(1), AvroValue::Int(2)])
    );
}

#[test]
fn test_map_keeps_encoded_order() {
    let schema = r#"{"type": "map", "values": "int"}"#;
    let value = AvroValue::Map(vec![
        ("b".to_string(), AvroValue::Int(1)),
        ("a".to_string(), AvroValue::Int(2)),
    ]);
    let bytes = encode(schema, &value);
    assert_eq!(bytes, vec![0x04, 0x02, b'b', 0x02, 0x02, b'a', 0x04, 0x00]);
    assert_eq!(decode(schema, &bytes), value);
}

#[test]
fn test_union_index_is_long() {
    let schema = r#"["null", "string"]"#;
    let bytes = encode(schema, &AvroValue::String("a".into()));
    assert_eq!(bytes, vec![0x02, 0x02, b'a']);
    assert_eq!(encode(schema, &AvroValue::Null), vec![0x00]);
}

#[test]
fn test_union_index_out_of_range() {
    let schema = parse_schema(r#"["null", "int"]"#).unwrap();
    let reader = DatumReader::new(&schema).unwrap();
    assert!(matches!(
        reader.read(&mut Decoder::new(&[0x04])),
        Err(DecodeError::UnionIndexOutOfRange { index: 2, branches: 2 })
    ));
    assert!(matches!(
        reader.read(&mut Decoder::new(&[0x01])),
        Err(DecodeError::UnionIndexOutOfRange { index: -1, .. })
    ));
}

#[test]
fn test_enum_ordinal() {
    let schema = r#"{"type": "enum", "name": "Suit", "symbols": ["HEARTS", "SPADES"]}"#;
    let bytes = encode(schema, &AvroValue::String("SPADES".into()));
    assert_eq!(bytes, vec![0x02]);
    let AvroValue::Enum(e) = decode(schema, &bytes) else {
        panic!("expected enum");
    };
    assert_eq!(e.symbol(), "SPADES");
    assert_eq!(e.ordinal(), 1);
}

#[test]
fn test_enum_ordinal_out_of_range() {
    let schema = parse_schema(r#"{"type": "enum", "name": "E", "symbols": ["A"]}"#).unwrap();
    let reader = DatumReader::new(&schema).unwrap();
    assert!(reader.read(&mut Decoder::new(&[0x02])).is_err());
}

#[test]
fn test_record_fields_in_order() {
    let schema = r#"{"type": "record", "name": "P", "fields": [
        {"name": "x", "type": "int"}, {"name": "label", "type": "string"}]}"#;
    let parsed = parse_schema(schema).unwrap();
    let record = avrokit::GenericRecord::from_schema(&parsed)
        .unwrap()
        .with("x", 1)
        .unwrap()
        .with("label", "hi")
        .unwrap();
    let bytes = encode(schema, &AvroValue::Record(record.clone()));
    assert_eq!(bytes, vec![0x02, 0x04, b'h', b'i']);
    assert_eq!(decode(schema, &bytes), AvroValue::Record(record));
}

// ============================================================================
// Logical Type Encoding Tests
// ============================================================================

const DURATION: &str = r#"{"type": "fixed", "name": "Span", "size": 12, "logicalType": "duration"}"#;

#[test]
fn test_duration_round_trips_byte_for_byte() {
    let value = AvroValue::Duration(Duration::new(12, 45, 98234));
    let bytes = encode(DURATION, &value);
    assert_eq!(bytes.len(), 12);
    assert_eq!(bytes, Duration::new(12, 45, 98234).to_bytes().to_vec());
    assert_eq!(decode(DURATION, &bytes), value);
    assert_eq!(encode(DURATION, &decode(DURATION, &bytes)), bytes);
}

const BIG_DECIMAL: &str = "-7922816251426433.7593543950335";

#[test]
fn test_decimal_over_bytes() {
    let schema = r#"{"type": "bytes", "logicalType": "decimal", "precision": 29, "scale": 13}"#;
    let decimal = Decimal::from_str(BIG_DECIMAL).unwrap();
    assert_eq!(decimal.scale(), 13);
    let value = AvroValue::Decimal(decimal.clone());

    let bytes = encode(schema, &value);
    assert_eq!(bytes[1..], *decimal.unscaled_bytes());
    let AvroValue::Decimal(back) = decode(schema, &bytes) else {
        panic!("expected decimal");
    };
    assert_eq!(back.to_string(), BIG_DECIMAL);
}

#[test]
fn test_decimal_over_fixed() {
    let schema = r#"{"type": "fixed", "name": "Money", "size": 16,
                     "logicalType": "decimal", "precision": 29, "scale": 13}"#;
    let value = AvroValue::Decimal(Decimal::from_str(BIG_DECIMAL).unwrap());

    let bytes = encode(schema, &value);
    assert_eq!(bytes.len(), 16);
    assert_eq!(bytes[0], 0xFF);
    let AvroValue::Decimal(back) = decode(schema, &bytes) else {
        panic!("expected decimal");
    };
    assert_eq!(back.to_string(), BIG_DECIMAL);
    assert_eq!(AvroValue::Decimal(back), value);
}

#[test]
fn test_decimal_scale_mismatch_rejected() {
    let schema = parse_schema(
        r#"{"type": "bytes", "logicalType": "decimal", "precision": 5, "scale": 2}"#,
    )
    .unwrap();
    let writer = DatumWriter::new(&schema).unwrap();
    let mut encoder = Encoder::new();
    let value = AvroValue::Decimal(Decimal::from_str("1.234").unwrap());
    assert!(writer.write(&mut encoder, &value).is_err());
}

#[test]
fn test_uuid_is_string() {
    let schema = r#"{"type": "string", "logicalType": "uuid"}"#;
    let id = uuid::Uuid::from_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap();
    let bytes = encode(schema, &AvroValue::Uuid(id));
    assert_eq!(bytes[0], 72);
    assert_eq!(&bytes[1..], id.to_string().as_bytes());
    assert_eq!(decode(schema, &bytes), AvroValue::Uuid(id));
}

#[test]
fn test_invalid_uuid_text() {
    let schema = parse_schema(r#"{"type": "string", "logicalType": "uuid"}"#).unwrap();
    let bytes = [0x06, b'n', b'o', b'p'];
    let result = DatumReader::new(&schema).unwrap().read(&mut Decoder::new(&bytes));
    assert!(matches!(result, Err(DecodeError::InvalidLogical(_))));
}

#[test]
fn test_date_and_timestamps() {
    let date = r#"{"type": "int", "logicalType": "date"}"#;
    assert_eq!(decode(date, &encode(date, &AvroValue::Date(19000))), AvroValue::Date(19000));

    let ts = r#"{"type": "long", "logicalType": "local-timestamp-micros"}"#;
    let value = AvroValue::LocalTimestampMicros(1_700_000_000_000_000);
    assert_eq!(decode(ts, &encode(ts, &value)), value);

    // plain longs are accepted for long-backed logical types
    assert_eq!(
        encode(ts, &AvroValue::Long(5)),
        encode(ts, &AvroValue::LocalTimestampMicros(5))
    );
}
