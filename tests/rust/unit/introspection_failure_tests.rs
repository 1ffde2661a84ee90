//! Unit tests for introspection failure handling
//!
//! A metadata source that fails mid-build must abort the whole mapping run
//! with a single error; no partial schema is kept.

#[cfg(test)]
mod introspection_failure_tests {
    use mockall::mock;

    use relgraph::config::MapperConfig;
    use relgraph::relational::errors::RelationalSchemaError;
    use relgraph::relational::metadata::{
        self as md, ColumnRow, ImportedKeyRow, MetadataError, MetadataSource, ProductInfo,
        TableRef, TableRequest,
    };
    use relgraph::{MappingError, SchemaMapper};

    mock! {
        pub Catalog {}

        impl MetadataSource for Catalog {
            fn product_info(&self) -> md::Result<ProductInfo>;
            fn database_name(&self) -> md::Result<Option<String>>;
            fn tables(&self, request: &TableRequest) -> md::Result<Vec<TableRef>>;
            fn columns(&self, table: &TableRef) -> md::Result<Vec<ColumnRow>>;
            fn primary_key_columns(&self, table: &TableRef) -> md::Result<Vec<String>>;
            fn imported_keys(&self, table: &TableRef) -> md::Result<Vec<ImportedKeyRow>>;
            fn count_rows(&self, table: &TableRef) -> md::Result<Option<u64>>;
        }
    }

    fn catalog_with_one_table() -> MockCatalog {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_product_info()
            .returning(|| Ok(ProductInfo::default()));
        catalog.expect_database_name().returning(|| Ok(None));
        catalog
            .expect_tables()
            .returning(|_| Ok(vec![TableRef::new(None, "ORDERS")]));
        catalog.expect_columns().returning(|_| {
            Ok(vec![ColumnRow {
                name: "ID".to_string(),
                ordinal_position: 1,
                type_name: "INTEGER".to_string(),
            }])
        });
        catalog
            .expect_primary_key_columns()
            .returning(|_| Ok(vec!["ID".to_string()]));
        catalog.expect_count_rows().returning(|_| Ok(None));
        catalog
    }

    #[test]
    fn test_failing_imported_keys_abort_the_run() {
        let mut catalog = catalog_with_one_table();
        catalog.expect_imported_keys().returning(|t| {
            Err(MetadataError::Query {
                operation: "imported_keys".to_string(),
                table: t.name.clone(),
                message: "permission denied".to_string(),
            })
        });

        let mut mapper = SchemaMapper::with_default_types(MapperConfig::default(), Box::new(catalog));
        let err = mapper.run().unwrap_err();

        match err {
            MappingError::RelationalSchema(RelationalSchemaError::Introspection { source, .. }) => {
                assert!(matches!(source, MetadataError::Query { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(mapper.schema().entity_count(), 0);
        assert_eq!(mapper.graph_model().vertex_count(), 0);
    }

    #[test]
    fn test_failing_product_info_aborts_before_tables() {
        let mut catalog = MockCatalog::new();
        catalog.expect_product_info().returning(|| {
            Err(MetadataError::Query {
                operation: "product_info".to_string(),
                table: String::new(),
                message: "driver unavailable".to_string(),
            })
        });
        catalog.expect_tables().never();

        let mut mapper = SchemaMapper::with_default_types(MapperConfig::default(), Box::new(catalog));
        assert!(mapper.build_source_database_schema().is_err());
    }

    #[test]
    fn test_healthy_catalog_maps() {
        let mut catalog = catalog_with_one_table();
        catalog.expect_imported_keys().returning(|_| Ok(vec![]));

        let mut mapper = SchemaMapper::with_default_types(MapperConfig::default(), Box::new(catalog));
        mapper.run().unwrap();

        let orders = mapper.graph_model().require_vertex("Orders").unwrap();
        assert_eq!(orders.external_key, vec!["id".to_string()]);
    }
}
