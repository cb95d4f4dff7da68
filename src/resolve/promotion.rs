//! Promotion lattice between writer and reader types.

use crate::schema::{AvroSchema, LogicalTypeName};

/// Type promotions supported by schema resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePromotion {
    /// int → long
    IntToLong,
    /// int → float
    IntToFloat,
    /// int → double
    IntToDouble,
    /// long → float
    LongToFloat,
    /// long → double
    LongToDouble,
    /// float → double
    FloatToDouble,
    /// string → bytes
    StringToBytes,
    /// bytes → string
    BytesToString,
    /// Coarser time unit read as a finer one of the same family; the writer
    /// value is multiplied by `factor`.
    TimeUnit { factor: i64 },
}

impl TypePromotion {
    /// Promotion that lets `reader` read values written as `writer`.
    ///
    /// Returns `None` when the pair is identical or not promotable; callers
    /// handle identity separately.
    pub fn between(writer: &AvroSchema, reader: &AvroSchema) -> Option<Self> {
        match (writer, reader) {
            (AvroSchema::Int, AvroSchema::Long) => Some(TypePromotion::IntToLong),
            (AvroSchema::Int, AvroSchema::Float) => Some(TypePromotion::IntToFloat),
            (AvroSchema::Int, AvroSchema::Double) => Some(TypePromotion::IntToDouble),
            (AvroSchema::Long, AvroSchema::Float) => Some(TypePromotion::LongToFloat),
            (AvroSchema::Long, AvroSchema::Double) => Some(TypePromotion::LongToDouble),
            (AvroSchema::Float, AvroSchema::Double) => Some(TypePromotion::FloatToDouble),
            (AvroSchema::String, AvroSchema::Bytes) => Some(TypePromotion::StringToBytes),
            (AvroSchema::Bytes, AvroSchema::String) => Some(TypePromotion::BytesToString),
            (AvroSchema::Logical(w), AvroSchema::Logical(r)) => {
                time_factor(w.logical_type(), r.logical_type())
                    .map(|factor| TypePromotion::TimeUnit { factor })
            }
            _ => None,
        }
    }
}

/// Unit scale between two time logical types of the same family, coarse to fine.
fn time_factor(writer: &LogicalTypeName, reader: &LogicalTypeName) -> Option<i64> {
    let (family_w, exp_w) = time_unit(writer)?;
    let (family_r, exp_r) = time_unit(reader)?;
    if family_w != family_r || exp_r <= exp_w {
        return None;
    }
    Some(10i64.pow(exp_r - exp_w))
}

/// Family tag and power-of-ten exponent of a time unit (millis = 3).
fn time_unit(logical: &LogicalTypeName) -> Option<(u8, u32)> {
    use LogicalTypeName::*;

    match logical {
        TimeMillis => Some((0, 3)),
        TimeMicros => Some((0, 6)),
        TimeNanos => Some((0, 9)),
        TimestampMillis => Some((1, 3)),
        TimestampMicros => Some((1, 6)),
        TimestampNanos => Some((1, 9)),
        LocalTimestampMillis => Some((2, 3)),
        LocalTimestampMicros => Some((2, 6)),
        LocalTimestampNanos => Some((2, 9)),
        _ => None,
    }
}
