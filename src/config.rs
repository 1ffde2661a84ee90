use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::relational::model::JoinDirection;
use crate::relational::vendor::Vendor;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Naming convention applied to graph type and property names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingConvention {
    /// `BOOK_AUTHOR` -> `BookAuthor`, `AUTHOR_ID` -> `authorId`
    #[default]
    Java,
    /// Names are kept, spaces become underscores
    Original,
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingConvention::Java => f.write_str("java"),
            NamingConvention::Original => f.write_str("original"),
        }
    }
}

impl FromStr for NamingConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(NamingConvention::Java),
            "original" => Ok(NamingConvention::Original),
            other => Err(format!("unknown naming convention '{}'", other)),
        }
    }
}

/// Mapping strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingStrategy {
    /// One vertex type per table, one edge type per foreign key name
    Naive,
    /// Like `Naive`, then two-column join tables collapse into direct edges
    #[default]
    NaiveAggregate,
}

impl MappingStrategy {
    pub fn aggregates(&self) -> bool {
        matches!(self, MappingStrategy::NaiveAggregate)
    }
}

impl fmt::Display for MappingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingStrategy::Naive => f.write_str("naive"),
            MappingStrategy::NaiveAggregate => f.write_str("naive-aggregate"),
        }
    }
}

impl FromStr for MappingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "naive" => Ok(MappingStrategy::Naive),
            "naive-aggregate" | "naive_aggregate" => Ok(MappingStrategy::NaiveAggregate),
            other => Err(format!("unknown mapping strategy '{}'", other)),
        }
    }
}

/// Where the relational metadata comes from
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(default)]
    pub vendor: Vendor,

    /// Connection URL or snapshot path
    #[validate(length(min = 1, message = "Data source name cannot be empty"))]
    pub name: String,

    #[serde(default)]
    pub catalog: Option<String>,

    #[serde(default)]
    pub schema: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl DataSource {
    pub fn new(vendor: Vendor, name: impl Into<String>) -> Self {
        DataSource {
            vendor,
            name: name.into(),
            catalog: None,
            schema: None,
            username: None,
            password: None,
        }
    }
}

/// Orientation and name of the edge replacing one join table
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
pub struct JoinTableOverride {
    #[validate(length(min = 1, message = "Join table name cannot be empty"))]
    pub table: String,

    #[serde(default)]
    pub direction: JoinDirection,

    #[serde(default)]
    pub relationship_name: Option<String>,
}

/// Mapper configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct MapperConfig {
    #[validate(nested)]
    pub data_source: DataSource,

    #[serde(default)]
    pub naming_convention: NamingConvention,

    #[serde(default)]
    pub strategy: MappingStrategy,

    /// When non-empty, only these tables are mapped
    #[serde(default)]
    #[validate(custom(function = "validate_table_names"))]
    pub include_tables: Vec<String>,

    /// Ignored when `include_tables` is non-empty
    #[serde(default)]
    #[validate(custom(function = "validate_table_names"))]
    pub exclude_tables: Vec<String>,

    /// ORM inheritance descriptor (hbm.xml)
    #[serde(default)]
    pub inheritance_descriptor: Option<PathBuf>,

    #[serde(default)]
    #[validate(nested)]
    pub join_table_overrides: Vec<JoinTableOverride>,
}

fn validate_table_names(names: &[String]) -> Result<(), ValidationError> {
    if names.iter().any(|n| n.trim().is_empty()) {
        let mut err = ValidationError::new("empty_table_name");
        err.message = Some("Table filter entries cannot be empty".into());
        return Err(err);
    }
    Ok(())
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            data_source: DataSource::new(Vendor::Generic, "snapshot"),
            naming_convention: NamingConvention::Java,
            strategy: MappingStrategy::NaiveAggregate,
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
            inheritance_descriptor: None,
            join_table_overrides: Vec::new(),
        }
    }
}

impl MapperConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut data_source = DataSource::new(
            parse_env_var("RELGRAPH_VENDOR", "generic")?,
            env::var("RELGRAPH_DATA_SOURCE").unwrap_or_else(|_| "snapshot".to_string()),
        );
        data_source.catalog = env::var("RELGRAPH_CATALOG").ok();
        data_source.schema = env::var("RELGRAPH_SCHEMA").ok();
        data_source.username = env::var("RELGRAPH_USERNAME").ok();
        data_source.password = env::var("RELGRAPH_PASSWORD").ok();

        let config = Self {
            data_source,
            naming_convention: parse_env_var("RELGRAPH_NAMING", "java")?,
            strategy: parse_env_var("RELGRAPH_STRATEGY", "naive-aggregate")?,
            include_tables: list_env_var("RELGRAPH_INCLUDE"),
            exclude_tables: list_env_var("RELGRAPH_EXCLUDE"),
            inheritance_descriptor: env::var("RELGRAPH_DESCRIPTOR").ok().map(PathBuf::from),
            join_table_overrides: Vec::new(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.merge_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line values on top of this configuration (CLI wins)
    pub fn merge_cli(&mut self, cli: CliConfig) {
        if let Some(vendor) = cli.vendor {
            self.data_source.vendor = vendor;
        }
        if let Some(name) = cli.data_source {
            self.data_source.name = name;
        }
        if let Some(schema) = cli.schema {
            self.data_source.schema = Some(schema);
        }
        if let Some(naming) = cli.naming_convention {
            self.naming_convention = naming;
        }
        if let Some(strategy) = cli.strategy {
            self.strategy = strategy;
        }
        if !cli.include_tables.is_empty() {
            self.include_tables = cli.include_tables;
        }
        if !cli.exclude_tables.is_empty() {
            self.exclude_tables = cli.exclude_tables;
        }
        if cli.inheritance_descriptor.is_some() {
            self.inheritance_descriptor = cli.inheritance_descriptor;
        }
    }

    pub fn join_table_override(&self, table: &str) -> Option<&JoinTableOverride> {
        self.join_table_overrides
            .iter()
            .find(|o| o.table.eq_ignore_ascii_case(table))
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub vendor: Option<Vendor>,
    pub data_source: Option<String>,
    pub schema: Option<String>,
    pub naming_convention: Option<NamingConvention>,
    pub strategy: Option<MappingStrategy>,
    pub include_tables: Vec<String>,
    pub exclude_tables: Vec<String>,
    pub inheritance_descriptor: Option<PathBuf>,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e: T::Err| ConfigError::Parse {
        field: key.to_string(),
        value: value.clone(),
        source: e.to_string().into(),
    })
}

/// Comma-separated list, empty when unset
fn list_env_var(key: &str) -> Vec<String> {
    env::var(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
