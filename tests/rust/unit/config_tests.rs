//! Unit tests for mapper configuration loading
//!
//! Covers the CLI and YAML loaders and their validation failures.

#[cfg(test)]
mod config_tests {
    use std::io::Write;
    use std::path::PathBuf;

    use relgraph::config::{CliConfig, ConfigError, MapperConfig, MappingStrategy};
    use relgraph::relational::vendor::Vendor;

    #[test]
    fn test_from_cli() {
        let config = MapperConfig::from_cli(CliConfig {
            vendor: Some(Vendor::Hive),
            data_source: Some("catalog.yaml".to_string()),
            strategy: Some(MappingStrategy::Naive),
            inheritance_descriptor: Some(PathBuf::from("mapping.hbm.xml")),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.data_source.vendor, Vendor::Hive);
        assert_eq!(config.data_source.name, "catalog.yaml");
        assert!(!config.strategy.aggregates());
        assert_eq!(
            config.inheritance_descriptor,
            Some(PathBuf::from("mapping.hbm.xml"))
        );
    }

    #[test]
    fn test_from_cli_rejects_blank_filter() {
        let result = MapperConfig::from_cli(CliConfig {
            include_tables: vec!["".to_string()],
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_yaml_join_override_requires_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
data_source:
  name: catalog.yaml
join_table_overrides:
  - table: ""
    direction: direct
"#
        )
        .unwrap();

        let result = MapperConfig::from_yaml_file(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_yaml_unknown_strategy_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
data_source:
  name: catalog.yaml
strategy: clever
"#
        )
        .unwrap();

        let result = MapperConfig::from_yaml_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_yaml_file() {
        let result = MapperConfig::from_yaml_file("/nonexistent/relgraph.yaml");
        assert!(matches!(result, Err(ConfigError::Parse { ref field, .. }) if field == "yaml_file"));
    }

    #[test]
    fn test_config_round_trips_without_password() {
        let mut config = MapperConfig::default();
        config.data_source.password = Some("secret".to_string());

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
        let parsed: MapperConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.data_source.password, None);
    }
}
