//! Relational metadata source
//!
//! The mapper never talks to a database driver directly. Everything it needs
//! from the catalog goes through [`MetadataSource`]: product information, table
//! enumeration, columns, primary-key columns and imported keys.
//!
//! [`SnapshotSource`] is an in-memory catalog snapshot that can be loaded from
//! YAML or JSON. It backs the `relgraph` binary and the test-suite:
//!
//! ```yaml
//! product:
//!   product_name: PostgreSQL
//!   product_version: "15.2"
//! database_name: library
//! tables:
//!   - name: BOOK
//!     schema: public
//!     columns:
//!       - { name: ID, type: INTEGER }
//!       - { name: AUTHOR_ID, type: INTEGER }
//!     primary_key: [ID]
//!     foreign_keys:
//!       - parent_table: AUTHOR
//!         columns: [AUTHOR_ID]
//!         parent_columns: [ID]
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised by a metadata source
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Metadata query `{operation}` failed for table '{table}': {message}")]
    Query {
        operation: String,
        table: String,
        message: String,
    },
    #[error("Unknown table '{table}'")]
    UnknownTable { table: String },
    #[error("Failed to read catalog snapshot: {0}")]
    SnapshotRead(#[from] std::io::Error),
    #[error("Failed to parse catalog snapshot: {message}")]
    SnapshotParse { message: String },
}

pub type Result<T> = std::result::Result<T, MetadataError>;

/// Database product and driver versions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_version: String,
    #[serde(default)]
    pub driver_name: String,
    #[serde(default)]
    pub driver_version: String,
}

/// Arguments of a table enumeration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRequest {
    pub catalog: Option<String>,
    pub schema_pattern: Option<String>,
    pub name_pattern: Option<String>,
    pub types: Vec<String>,
}

/// A table reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        TableRef {
            schema,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub name: String,
    pub ordinal_position: usize,
    pub type_name: String,
}

/// One row of an imported-keys enumeration: one column of one foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedKeyRow {
    pub pktable_schema: Option<String>,
    pub pktable_name: String,
    pub pkcolumn_name: String,
    pub fkcolumn_name: String,
    /// 1-based position of the column inside its foreign key
    pub key_seq: usize,
    pub fk_name: Option<String>,
}

/// Catalog access used by the relational schema builder
#[cfg_attr(test, mockall::automock)]
pub trait MetadataSource {
    fn product_info(&self) -> Result<ProductInfo>;

    /// Name of the database the connection is bound to, if any
    fn database_name(&self) -> Result<Option<String>>;

    fn tables(&self, request: &TableRequest) -> Result<Vec<TableRef>>;

    /// Columns of a table, in ordinal order
    fn columns(&self, table: &TableRef) -> Result<Vec<ColumnRow>>;

    /// Primary-key column names, in key order
    fn primary_key_columns(&self, table: &TableRef) -> Result<Vec<String>>;

    /// Imported keys, grouped by referenced table and ordered by key sequence
    fn imported_keys(&self, table: &TableRef) -> Result<Vec<ImportedKeyRow>>;

    /// Number of rows in a table, when the source can tell
    fn count_rows(&self, table: &TableRef) -> Result<Option<u64>>;
}

// ============================================================================
// In-memory snapshot
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotForeignKey {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_schema: Option<String>,
    pub parent_table: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub parent_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTable {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(rename = "type", default = "default_table_type")]
    pub table_type: String,
    #[serde(default)]
    pub columns: Vec<SnapshotColumn>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<SnapshotForeignKey>,
    #[serde(default)]
    pub row_count: Option<u64>,
}

fn default_table_type() -> String {
    "TABLE".to_string()
}

impl SnapshotTable {
    pub fn new(name: impl Into<String>) -> Self {
        SnapshotTable {
            name: name.into(),
            schema: None,
            table_type: default_table_type(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            row_count: None,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn column(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.columns.push(SnapshotColumn {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn foreign_key(mut self, parent_table: &str, columns: &[&str], parent_columns: &[&str]) -> Self {
        self.foreign_keys.push(SnapshotForeignKey {
            name: None,
            parent_schema: None,
            parent_table: parent_table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            parent_columns: parent_columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn rows(mut self, row_count: u64) -> Self {
        self.row_count = Some(row_count);
        self
    }
}

/// Catalog snapshot held in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSource {
    #[serde(default)]
    pub product: ProductInfo,
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default)]
    pub tables: Vec<SnapshotTable>,
}

impl SnapshotSource {
    pub fn new(tables: Vec<SnapshotTable>) -> Self {
        SnapshotSource {
            product: ProductInfo::default(),
            database_name: None,
            tables,
        }
    }

    pub fn with_database_name(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = Some(database_name.into());
        self
    }

    pub fn with_product(mut self, product: ProductInfo) -> Self {
        self.product = product;
        self
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| MetadataError::SnapshotParse {
            message: e.to_string(),
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| MetadataError::SnapshotParse {
            message: e.to_string(),
        })
    }

    /// Loads a snapshot file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        debug!("Loaded catalog snapshot from {}", path.display());

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    fn find_table(&self, table: &TableRef) -> Result<&SnapshotTable> {
        self.tables
            .iter()
            .find(|t| {
                t.name.eq_ignore_ascii_case(&table.name)
                    && (table.schema.is_none() || t.schema.is_none() || t.schema == table.schema)
            })
            .ok_or_else(|| MetadataError::UnknownTable {
                table: table.name.clone(),
            })
    }
}

/// `None` and `%` match everything, otherwise a case-insensitive exact match.
/// A snapshot table recorded without a schema matches any schema pattern.
fn pattern_matches(pattern: Option<&str>, value: Option<&str>) -> bool {
    match (pattern, value) {
        (None | Some("%"), _) | (Some(_), None) => true,
        (Some(pattern), Some(value)) => value.eq_ignore_ascii_case(pattern),
    }
}

impl MetadataSource for SnapshotSource {
    fn product_info(&self) -> Result<ProductInfo> {
        Ok(self.product.clone())
    }

    fn database_name(&self) -> Result<Option<String>> {
        Ok(self.database_name.clone())
    }

    fn tables(&self, request: &TableRequest) -> Result<Vec<TableRef>> {
        Ok(self
            .tables
            .iter()
            .filter(|t| {
                pattern_matches(request.schema_pattern.as_deref(), t.schema.as_deref())
                    && pattern_matches(request.name_pattern.as_deref(), Some(&t.name))
                    && (request.types.is_empty()
                        || request
                            .types
                            .iter()
                            .any(|ty| ty.eq_ignore_ascii_case(&t.table_type)))
            })
            .map(|t| TableRef::new(t.schema.clone(), t.name.clone()))
            .collect())
    }

    fn columns(&self, table: &TableRef) -> Result<Vec<ColumnRow>> {
        let snapshot = self.find_table(table)?;
        Ok(snapshot
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| ColumnRow {
                name: c.name.clone(),
                ordinal_position: i + 1,
                type_name: c.type_name.clone(),
            })
            .collect())
    }

    fn primary_key_columns(&self, table: &TableRef) -> Result<Vec<String>> {
        Ok(self.find_table(table)?.primary_key.clone())
    }

    fn imported_keys(&self, table: &TableRef) -> Result<Vec<ImportedKeyRow>> {
        let snapshot = self.find_table(table)?;
        let mut rows = Vec::new();

        for fk in &snapshot.foreign_keys {
            for (i, column) in fk.columns.iter().enumerate() {
                rows.push(ImportedKeyRow {
                    pktable_schema: fk.parent_schema.clone(),
                    pktable_name: fk.parent_table.clone(),
                    pkcolumn_name: fk.parent_columns.get(i).cloned().unwrap_or_default(),
                    fkcolumn_name: column.clone(),
                    key_seq: i + 1,
                    fk_name: fk.name.clone(),
                });
            }
        }

        Ok(rows)
    }

    fn count_rows(&self, table: &TableRef) -> Result<Option<u64>> {
        Ok(self.find_table(table)?.row_count)
    }
}
