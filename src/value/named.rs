//! Enum, fixed and union values.

use std::sync::Arc;

use super::{AvroValue, FromAvroValue};
use crate::error::ValueError;
use crate::schema::{EnumSchema, FixedSchema, UnionSchema};

/// An enum symbol, held as an ordinal into its schema's symbol table.
#[derive(Debug, Clone)]
pub struct EnumValue {
    schema: Arc<EnumSchema>,
    ordinal: usize,
}

impl EnumValue {
    pub fn new(schema: Arc<EnumSchema>, ordinal: usize) -> Result<Self, ValueError> {
        check_ordinal(&schema, ordinal)?;
        Ok(Self { schema, ordinal })
    }

    pub fn from_symbol(schema: Arc<EnumSchema>, symbol: &str) -> Result<Self, ValueError> {
        let ordinal = symbol_ordinal(&schema, symbol)?;
        Ok(Self { schema, ordinal })
    }

    pub fn schema(&self) -> &Arc<EnumSchema> {
        &self.schema
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn symbol(&self) -> &str {
        &self.schema.symbols()[self.ordinal]
    }

    pub fn set_ordinal(&mut self, ordinal: usize) -> Result<(), ValueError> {
        check_ordinal(&self.schema, ordinal)?;
        self.ordinal = ordinal;
        Ok(())
    }

    pub fn set_symbol(&mut self, symbol: &str) -> Result<(), ValueError> {
        self.ordinal = symbol_ordinal(&self.schema, symbol)?;
        Ok(())
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal && self.schema.name() == other.schema.name()
    }
}

fn check_ordinal(schema: &EnumSchema, ordinal: usize) -> Result<(), ValueError> {
    if ordinal >= schema.symbols().len() {
        return Err(ValueError::OrdinalOutOfRange {
            name: schema.fullname(),
            ordinal,
            symbols: schema.symbols().len(),
        });
    }
    Ok(())
}

fn symbol_ordinal(schema: &EnumSchema, symbol: &str) -> Result<usize, ValueError> {
    schema
        .symbol_index(symbol)
        .ok_or_else(|| ValueError::UnknownSymbol {
            name: schema.fullname(),
            symbol: symbol.to_string(),
        })
}

/// Bytes of a fixed schema. The length always equals the schema size.
#[derive(Debug, Clone)]
pub struct FixedValue {
    schema: Arc<FixedSchema>,
    bytes: Vec<u8>,
}

impl FixedValue {
    pub fn new(schema: Arc<FixedSchema>, bytes: Vec<u8>) -> Result<Self, ValueError> {
        if bytes.len() != schema.size() {
            return Err(ValueError::FixedSizeMismatch {
                name: schema.fullname(),
                expected: schema.size(),
                actual: bytes.len(),
            });
        }
        Ok(Self { schema, bytes })
    }

    pub fn schema(&self) -> &Arc<FixedSchema> {
        &self.schema
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl PartialEq for FixedValue {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes && self.schema.name() == other.schema.name()
    }
}

/// A value tagged with the union branch it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionValue {
    branch: usize,
    value: Box<AvroValue>,
}

impl UnionValue {
    /// Tag `value` with `branch`, which must be a valid index into `schema`.
    pub fn new(schema: &UnionSchema, branch: usize, value: AvroValue) -> Result<Self, ValueError> {
        if branch >= schema.len() {
            return Err(ValueError::BranchOutOfRange {
                index: branch,
                branches: schema.len(),
            });
        }
        Ok(Self::from_parts(branch, value))
    }

    pub(crate) fn from_parts(branch: usize, value: AvroValue) -> Self {
        Self {
            branch,
            value: Box::new(value),
        }
    }

    pub fn branch(&self) -> usize {
        self.branch
    }

    pub fn value(&self) -> &AvroValue {
        &self.value
    }

    pub fn into_value(self) -> AvroValue {
        *self.value
    }

    /// Extract the payload as `T`, failing if the branch holds something else.
    pub fn as_branch<T: FromAvroValue>(&self) -> Result<T, ValueError> {
        T::from_avro_value(&self.value).ok_or_else(|| ValueError::WrongBranch {
            requested: T::TYPE_NAME,
            actual: self.value.kind_name().to_string(),
        })
    }

    /// True if the payload is null.
    pub fn is_null(&self) -> bool {
        matches!(*self.value, AvroValue::Null)
    }
}
