//! In-memory Avro values.

mod default;
mod logical;
mod named;
mod record;

pub(crate) use default::default_value;
pub use logical::{Decimal, Duration};
pub use named::{EnumValue, FixedValue, UnionValue};
pub use record::{GenericRecord, RecordLayout};

use base64::Engine;
use serde_json::{json, Map, Value};

/// Represents a decoded Avro value.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Record (or error) value
    Record(GenericRecord),
    /// Enum symbol
    Enum(EnumValue),
    /// Array of values
    Array(Vec<AvroValue>),
    /// Map with string keys, in encoded order
    Map(Vec<(String, AvroValue)>),
    /// Value tagged with its union branch
    Union(UnionValue),
    /// Fixed-size byte array
    Fixed(FixedValue),

    // Logical type values
    /// Decimal value over bytes or fixed
    Decimal(Decimal),
    /// UUID value
    Uuid(uuid::Uuid),
    /// Days since Unix epoch, 1970-01-01
    Date(i32),
    /// Milliseconds since midnight
    TimeMillis(i32),
    /// Microseconds since midnight
    TimeMicros(i64),
    /// Nanoseconds since midnight
    TimeNanos(i64),
    /// Milliseconds since Unix epoch (UTC)
    TimestampMillis(i64),
    /// Microseconds since Unix epoch (UTC)
    TimestampMicros(i64),
    /// Nanoseconds since Unix epoch (UTC)
    TimestampNanos(i64),
    /// Milliseconds since Unix epoch, local time
    LocalTimestampMillis(i64),
    /// Microseconds since Unix epoch, local time
    LocalTimestampMicros(i64),
    /// Nanoseconds since Unix epoch, local time
    LocalTimestampNanos(i64),
    /// Months, days and milliseconds
    Duration(Duration),
}

impl AvroValue {
    /// Short name of the value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AvroValue::Null => "null",
            AvroValue::Boolean(_) => "boolean",
            AvroValue::Int(_) => "int",
            AvroValue::Long(_) => "long",
            AvroValue::Float(_) => "float",
            AvroValue::Double(_) => "double",
            AvroValue::Bytes(_) => "bytes",
            AvroValue::String(_) => "string",
            AvroValue::Record(_) => "record",
            AvroValue::Enum(_) => "enum",
            AvroValue::Array(_) => "array",
            AvroValue::Map(_) => "map",
            AvroValue::Union(_) => "union",
            AvroValue::Fixed(_) => "fixed",
            AvroValue::Decimal(_) => "decimal",
            AvroValue::Uuid(_) => "uuid",
            AvroValue::Date(_) => "date",
            AvroValue::TimeMillis(_) => "time-millis",
            AvroValue::TimeMicros(_) => "time-micros",
            AvroValue::TimeNanos(_) => "time-nanos",
            AvroValue::TimestampMillis(_) => "timestamp-millis",
            AvroValue::TimestampMicros(_) => "timestamp-micros",
            AvroValue::TimestampNanos(_) => "timestamp-nanos",
            AvroValue::LocalTimestampMillis(_) => "local-timestamp-millis",
            AvroValue::LocalTimestampMicros(_) => "local-timestamp-micros",
            AvroValue::LocalTimestampNanos(_) => "local-timestamp-nanos",
            AvroValue::Duration(_) => "duration",
        }
    }

    /// Strip any union tags, returning the innermost payload.
    pub fn unwrap_union(&self) -> &AvroValue {
        match self {
            AvroValue::Union(u) => u.value().unwrap_union(),
            other => other,
        }
    }

    /// Convert the value to JSON for diagnostics.
    ///
    /// Bytes and fixed become base64 strings, decimals their plain decimal
    /// text and unions their payload.
    pub fn to_json(&self) -> Value {
        match self {
            AvroValue::Null => Value::Null,
            AvroValue::Boolean(b) => Value::Bool(*b),
            AvroValue::Int(i) | AvroValue::Date(i) | AvroValue::TimeMillis(i) => json!(i),
            AvroValue::Long(l)
            | AvroValue::TimeMicros(l)
            | AvroValue::TimeNanos(l)
            | AvroValue::TimestampMillis(l)
            | AvroValue::TimestampMicros(l)
            | AvroValue::TimestampNanos(l)
            | AvroValue::LocalTimestampMillis(l)
            | AvroValue::LocalTimestampMicros(l)
            | AvroValue::LocalTimestampNanos(l) => json!(l),
            AvroValue::Float(f) => serde_json::Number::from_f64(*f as f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            AvroValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            AvroValue::Bytes(b) => Value::String(base64::engine::general_purpose::STANDARD.encode(b)),
            AvroValue::Fixed(f) => {
                Value::String(base64::engine::general_purpose::STANDARD.encode(f.bytes()))
            }
            AvroValue::String(s) => Value::String(s.clone()),
            AvroValue::Record(record) => {
                let mut map = Map::new();
                for (name, value) in record.fields() {
                    map.insert(name.to_string(), value.to_json());
                }
                Value::Object(map)
            }
            AvroValue::Enum(e) => Value::String(e.symbol().to_string()),
            AvroValue::Array(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
            AvroValue::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), value.to_json());
                }
                Value::Object(map)
            }
            AvroValue::Union(u) => u.value().to_json(),
            AvroValue::Decimal(d) => Value::String(d.to_string()),
            AvroValue::Uuid(u) => Value::String(u.to_string()),
            AvroValue::Duration(d) => json!({
                "months": d.months,
                "days": d.days,
                "milliseconds": d.millis
            }),
        }
    }
}

/// Types that can be extracted from an `AvroValue`.
pub trait FromAvroValue: Sized {
    /// Name used when reporting a mismatch.
    const TYPE_NAME: &'static str;

    fn from_avro_value(value: &AvroValue) -> Option<Self>;
}

macro_rules! from_avro_value {
    ($ty:ty, $name:literal, $($pat:pat => $out:expr),+ $(,)?) => {
        impl FromAvroValue for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_avro_value(value: &AvroValue) -> Option<Self> {
                match value {
                    $($pat => Some($out),)+
                    _ => None,
                }
            }
        }
    };
}

from_avro_value!((), "null", AvroValue::Null => ());
from_avro_value!(bool, "boolean", AvroValue::Boolean(b) => *b);
from_avro_value!(i32, "int", AvroValue::Int(i) => *i);
from_avro_value!(i64, "long", AvroValue::Long(l) => *l);
from_avro_value!(f32, "float", AvroValue::Float(f) => *f);
from_avro_value!(f64, "double", AvroValue::Double(d) => *d);
from_avro_value!(String, "string", AvroValue::String(s) => s.clone());
from_avro_value!(Vec<u8>, "bytes", AvroValue::Bytes(b) => b.clone());
from_avro_value!(GenericRecord, "record", AvroValue::Record(r) => r.clone());
from_avro_value!(EnumValue, "enum", AvroValue::Enum(e) => e.clone());
from_avro_value!(FixedValue, "fixed", AvroValue::Fixed(f) => f.clone());
from_avro_value!(Vec<AvroValue>, "array", AvroValue::Array(a) => a.clone());
from_avro_value!(Decimal, "decimal", AvroValue::Decimal(d) => d.clone());
from_avro_value!(Duration, "duration", AvroValue::Duration(d) => *d);
from_avro_value!(uuid::Uuid, "uuid", AvroValue::Uuid(u) => *u);

macro_rules! into_avro_value {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for AvroValue {
                fn from(value: $ty) -> Self {
                    AvroValue::$variant(value)
                }
            }
        )+
    };
}

into_avro_value!(
    bool => Boolean,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Vec<u8> => Bytes,
    String => String,
    GenericRecord => Record,
    EnumValue => Enum,
    FixedValue => Fixed,
    UnionValue => Union,
    Decimal => Decimal,
    Duration => Duration,
    uuid::Uuid => Uuid,
);

impl From<()> for AvroValue {
    fn from(_: ()) -> Self {
        AvroValue::Null
    }
}

impl From<&str> for AvroValue {
    fn from(value: &str) -> Self {
        AvroValue::String(value.to_string())
    }
}

impl From<Vec<AvroValue>> for AvroValue {
    fn from(items: Vec<AvroValue>) -> Self {
        AvroValue::Array(items)
    }
}

impl<T: Into<AvroValue>> From<Option<T>> for AvroValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AvroValue::Null, Into::into)
    }
}
