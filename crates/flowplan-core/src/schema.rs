//! Logical schema types. Pure data.
//!
//! A `Schema` is an ordered list of `FieldSchema`s. Complex types (`tuple`,
//! `bag`) carry a nested schema describing their members.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Type tag of a field.
///
/// `Bytearray` is the opaque tag: raw bytes handed over by an ingestion
/// operator without any interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Bytearray,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Chararray,
    Datetime,
    Biginteger,
    Bigdecimal,
    Tuple,
    Bag,
    Map,
}

impl DataType {
    /// True for the untyped payload tag that never needs a cast.
    pub fn is_opaque(self) -> bool {
        self == DataType::Bytearray
    }

    /// True for the types whose field descriptor may carry a nested schema.
    pub fn is_complex(self) -> bool {
        matches!(self, DataType::Tuple | DataType::Bag)
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Bytearray => "bytearray",
            DataType::Boolean => "boolean",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Chararray => "chararray",
            DataType::Datetime => "datetime",
            DataType::Biginteger => "biginteger",
            DataType::Bigdecimal => "bigdecimal",
            DataType::Tuple => "tuple",
            DataType::Bag => "bag",
            DataType::Map => "map",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let dt = match s.trim().to_ascii_lowercase().as_str() {
            "bytearray" | "bytes" => DataType::Bytearray,
            "boolean" | "bool" => DataType::Boolean,
            "int" | "int32" => DataType::Int,
            "long" | "int64" => DataType::Long,
            "float" | "float32" => DataType::Float,
            "double" | "float64" => DataType::Double,
            "chararray" | "string" | "utf8" => DataType::Chararray,
            "datetime" => DataType::Datetime,
            "biginteger" => DataType::Biginteger,
            "bigdecimal" => DataType::Bigdecimal,
            "tuple" => DataType::Tuple,
            "bag" => DataType::Bag,
            "map" => DataType::Map,
            other => return Err(Error::Schema(format!("unknown type '{other}'"))),
        };
        Ok(dt)
    }
}

/// A field descriptor: optional alias, type tag and optional nested schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub alias: Option<String>,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl FieldSchema {
    pub fn new(alias: impl Into<String>, data_type: DataType) -> Self {
        Self {
            alias: Some(alias.into()),
            data_type,
            schema: None,
        }
    }

    pub fn anonymous(data_type: DataType) -> Self {
        Self {
            alias: None,
            data_type,
            schema: None,
        }
    }

    /// A `tuple` or `bag` field with the given member schema.
    pub fn nested(alias: impl Into<String>, data_type: DataType, schema: Schema) -> Result<Self> {
        if !data_type.is_complex() {
            return Err(Error::Schema(format!(
                "type {data_type} cannot carry a nested schema"
            )));
        }
        Ok(Self {
            alias: Some(alias.into()),
            data_type,
            schema: Some(schema),
        })
    }

    /// Structural equality over (type tag, nested schema). Aliases are ignored.
    pub fn is_equal(&self, other: &FieldSchema) -> bool {
        if self.data_type != other.data_type {
            return false;
        }
        match (&self.schema, &other.schema) {
            (None, None) => true,
            (Some(a), Some(b)) => a.is_equal(b),
            _ => false,
        }
    }
}

impl fmt::Display for FieldSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.alias {
            write!(f, "{alias}:")?;
        }
        write!(f, "{}", self.data_type)?;
        if let Some(inner) = &self.schema {
            write!(f, "{inner}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    pub fn size(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&FieldSchema> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, alias: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.alias.as_deref() == Some(alias))
    }

    /// Structural equality, field by field. Aliases are ignored.
    pub fn is_equal(&self, other: &Schema) -> bool {
        self.size() == other.size()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.is_equal(b))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}")?;
        }
        f.write_str(")")
    }
}
