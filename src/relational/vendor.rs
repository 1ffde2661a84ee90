//! Vendor-specific accommodations
//!
//! The generic introspection path knows nothing about individual database
//! products. The few quirks that need special handling are collected in a
//! table of [`VendorAccommodation`]s, picked once per build from the data
//! source's [`Vendor`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::model::{Entity, PrimaryKey};

/// Name of the surrogate key synthesised for schemaless sources
pub const ROW_INDEX_ATTRIBUTE: &str = "row_index";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    PostgreSql,
    MySql,
    MariaDb,
    Oracle,
    SqlServer,
    HyperSql,
    Hive,
    #[default]
    Generic,
}

impl Vendor {
    pub fn name(&self) -> &'static str {
        match self {
            Vendor::PostgreSql => "postgresql",
            Vendor::MySql => "mysql",
            Vendor::MariaDb => "mariadb",
            Vendor::Oracle => "oracle",
            Vendor::SqlServer => "sqlserver",
            Vendor::HyperSql => "hypersql",
            Vendor::Hive => "hive",
            Vendor::Generic => "generic",
        }
    }

    pub fn accommodations(&self) -> VendorAccommodation {
        match self {
            Vendor::MySql | Vendor::MariaDb => MYSQL_FAMILY,
            Vendor::Hive => SCHEMALESS_FAMILY,
            _ => GENERIC,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(Vendor::PostgreSql),
            "mysql" => Ok(Vendor::MySql),
            "mariadb" => Ok(Vendor::MariaDb),
            "oracle" => Ok(Vendor::Oracle),
            "sqlserver" | "mssql" => Ok(Vendor::SqlServer),
            "hypersql" | "hsqldb" => Ok(Vendor::HyperSql),
            "hive" => Ok(Vendor::Hive),
            "generic" => Ok(Vendor::Generic),
            other => Err(format!("unsupported vendor '{}'", other)),
        }
    }
}

/// Hooks applied by the relational schema builder
#[derive(Clone, Copy)]
pub struct VendorAccommodation {
    /// Table types requested during enumeration
    pub table_types: &'static [&'static str],
    /// Schema name used for introspection, from the configured schema and the
    /// connection's database name
    pub resolve_schema: fn(Option<&str>, Option<&str>) -> Option<String>,
    /// Runs on every entity once its attributes and primary key are known
    pub complete_entity: fn(&mut Entity),
}

impl fmt::Debug for VendorAccommodation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendorAccommodation")
            .field("table_types", &self.table_types)
            .finish_non_exhaustive()
    }
}

const GENERIC: VendorAccommodation = VendorAccommodation {
    table_types: &["TABLE"],
    resolve_schema: configured_schema,
    complete_entity: leave_entity,
};

const MYSQL_FAMILY: VendorAccommodation = VendorAccommodation {
    table_types: &["TABLE"],
    resolve_schema: schema_from_database_name,
    complete_entity: leave_entity,
};

const SCHEMALESS_FAMILY: VendorAccommodation = VendorAccommodation {
    table_types: &["TABLE", "MANAGED_TABLE", "EXTERNAL_TABLE"],
    resolve_schema: configured_schema,
    complete_entity: add_row_index_key,
};

fn configured_schema(configured: Option<&str>, _database_name: Option<&str>) -> Option<String> {
    configured.map(str::to_string)
}

// MySQL has no schema level; the database plays that role
fn schema_from_database_name(configured: Option<&str>, database_name: Option<&str>) -> Option<String> {
    configured.or(database_name).map(str::to_string)
}

fn leave_entity(_entity: &mut Entity) {}

fn add_row_index_key(entity: &mut Entity) {
    if !entity.primary_key.is_empty() {
        return;
    }
    if !entity.has_attribute_ignore_case(ROW_INDEX_ATTRIBUTE) {
        entity.add_attribute(ROW_INDEX_ATTRIBUTE, "INTEGER");
    }
    if let Some(row_index) = entity.attribute_by_name_ignore_case(ROW_INDEX_ATTRIBUTE) {
        entity.primary_key = PrimaryKey::new(vec![row_index.clone()]);
    }
}
