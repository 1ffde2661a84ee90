//! Relational type name -> graph property type
//!
//! Raw type names arrive as the catalog reports them (`VARCHAR(255)`,
//! `timestamp with time zone`, `INT UNSIGNED`, ...). The length/precision
//! suffix and sign modifiers are dropped before the lookup; unknown types
//! map to `String`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PropertyType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Decimal,
    String,
    Date,
    Datetime,
    Binary,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyType::Boolean => "BOOLEAN",
            PropertyType::Byte => "BYTE",
            PropertyType::Short => "SHORT",
            PropertyType::Integer => "INTEGER",
            PropertyType::Long => "LONG",
            PropertyType::Float => "FLOAT",
            PropertyType::Double => "DOUBLE",
            PropertyType::Decimal => "DECIMAL",
            PropertyType::String => "STRING",
            PropertyType::Date => "DATE",
            PropertyType::Datetime => "DATETIME",
            PropertyType::Binary => "BINARY",
        };
        f.write_str(name)
    }
}

pub trait TypeMapper {
    fn map_type(&self, raw_type: &str) -> PropertyType;
}

const TYPE_TABLE: &[(&str, PropertyType)] = &[
    ("bool", PropertyType::Boolean),
    ("boolean", PropertyType::Boolean),
    ("bit", PropertyType::Boolean),
    ("tinyint", PropertyType::Byte),
    ("smallint", PropertyType::Short),
    ("int2", PropertyType::Short),
    ("int", PropertyType::Integer),
    ("integer", PropertyType::Integer),
    ("int4", PropertyType::Integer),
    ("mediumint", PropertyType::Integer),
    ("serial", PropertyType::Integer),
    ("bigint", PropertyType::Long),
    ("int8", PropertyType::Long),
    ("bigserial", PropertyType::Long),
    ("real", PropertyType::Float),
    ("float", PropertyType::Float),
    ("float4", PropertyType::Float),
    ("double", PropertyType::Double),
    ("double precision", PropertyType::Double),
    ("float8", PropertyType::Double),
    ("decimal", PropertyType::Decimal),
    ("numeric", PropertyType::Decimal),
    ("number", PropertyType::Decimal),
    ("money", PropertyType::Decimal),
    ("char", PropertyType::String),
    ("character", PropertyType::String),
    ("varchar", PropertyType::String),
    ("varchar2", PropertyType::String),
    ("character varying", PropertyType::String),
    ("nchar", PropertyType::String),
    ("nvarchar", PropertyType::String),
    ("nvarchar2", PropertyType::String),
    ("text", PropertyType::String),
    ("clob", PropertyType::String),
    ("string", PropertyType::String),
    ("uuid", PropertyType::String),
    ("date", PropertyType::Date),
    ("datetime", PropertyType::Datetime),
    ("timestamp", PropertyType::Datetime),
    ("timestamptz", PropertyType::Datetime),
    ("timestamp with time zone", PropertyType::Datetime),
    ("timestamp without time zone", PropertyType::Datetime),
    ("blob", PropertyType::Binary),
    ("longblob", PropertyType::Binary),
    ("binary", PropertyType::Binary),
    ("varbinary", PropertyType::Binary),
    ("bytea", PropertyType::Binary),
    ("image", PropertyType::Binary),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTypeMapper;

impl DefaultTypeMapper {
    fn normalize(raw_type: &str) -> String {
        let base = match raw_type.find('(') {
            Some(paren) => {
                // keep anything after the closing paren: `timestamp(6) with time zone`
                let tail = raw_type[paren..]
                    .find(')')
                    .map(|close| &raw_type[paren + close + 1..])
                    .unwrap_or("");
                format!("{}{}", &raw_type[..paren], tail)
            }
            None => raw_type.to_string(),
        };

        base.to_ascii_lowercase()
            .replace("unsigned", "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TypeMapper for DefaultTypeMapper {
    fn map_type(&self, raw_type: &str) -> PropertyType {
        let normalized = Self::normalize(raw_type);
        TYPE_TABLE
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, ty)| *ty)
            .unwrap_or(PropertyType::String)
    }
}
