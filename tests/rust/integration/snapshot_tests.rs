//! Full runs over catalog snapshots, including the files under `demos/`

#[cfg(test)]
mod snapshot_tests {
    use relgraph::config::{DataSource, MapperConfig, MappingStrategy};
    use relgraph::relational::metadata::{SnapshotSource, SnapshotTable};
    use relgraph::relational::vendor::Vendor;
    use relgraph::SchemaMapper;
    use std::io::Write;
    use std::path::PathBuf;

    fn demo_path(file: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(file)
    }

    fn library_mapper() -> SchemaMapper {
        let mut config = MapperConfig::from_yaml_file(demo_path("mapper.yaml")).unwrap();
        config.inheritance_descriptor = Some(demo_path("member.hbm.xml"));
        let source = SnapshotSource::from_file(demo_path("library.yaml")).unwrap();

        let mut mapper = SchemaMapper::with_default_types(config, Box::new(source));
        mapper.run().unwrap();
        mapper
    }

    #[test]
    fn test_library_demo() {
        let mapper = library_mapper();
        let schema = mapper.schema();
        let model = mapper.graph_model();

        assert_eq!(schema.product.product_name, "PostgreSQL");
        assert!(schema.entity_by_name("BOOK_SUMMARY").is_none());
        assert!(!schema
            .entity_by_name("MEMBER")
            .unwrap()
            .has_attribute_ignore_case("MEMBER_TYPE"));

        let order: Vec<&str> = model.vertices().map(|v| v.name.as_str()).collect();
        assert_eq!(order, vec!["Author", "Book", "Member", "Employee", "Student"]);

        let borrowed = model.require_edge("Borrowed").unwrap();
        assert!(borrowed.is_aggregator);
        assert_eq!(borrowed.out_vertex, model.vertex_id_by_name("Member"));
        assert_eq!(borrowed.in_vertex, model.vertex_id_by_name("Book").unwrap());
        assert!(borrowed.property_by_name("loanedAt").is_some());

        let edge_names: Vec<&str> = model.edges().map(|e| e.name.as_str()).collect();
        assert_eq!(edge_names.len(), 2);
        assert!(edge_names.contains(&"HasAuthor"));

        let student = model.vertex_by_name("Student").unwrap();
        assert_eq!(student.parent_type, model.vertex_id_by_name("Member"));
        assert!(student.property_by_name("school").is_some());
        assert_eq!(student.external_key, vec!["id".to_string()]);

        let stats = mapper.statistics();
        assert_eq!(stats.detected_hierarchies, 1);
        assert_eq!(stats.aggregated_join_tables, 1);
        assert!(stats.elapsed_ms().is_some());
    }

    #[test]
    fn test_library_report() {
        let mapper = library_mapper();
        let report = mapper.report();

        assert_eq!(report.aggregator_edges.len(), 1);
        assert_eq!(report.aggregator_edges[0].join_vertex, "Loan");
        assert_eq!(report.hierarchies.len(), 1);

        let yaml = report.to_yaml().unwrap();
        assert!(yaml.contains("Borrowed"));
        assert!(yaml.contains("product_name: PostgreSQL"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["aggregator_edges"][0]["edge"], "Borrowed");
        assert_eq!(json["aggregator_edges"][0]["out_vertex"], "Member");
        assert_eq!(json["hierarchies"][0]["discriminator_column"], "MEMBER_TYPE");
    }

    #[test]
    fn test_json_snapshot_file() {
        let snapshot = serde_json::json!({
            "product": { "product_name": "HSQL Database Engine", "product_version": "2.7", "driver_name": "snapshot" },
            "tables": [
                { "name": "CITY", "columns": [{ "name": "ID", "type": "INTEGER" }], "primary_key": ["ID"] }
            ]
        });
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(snapshot.to_string().as_bytes()).unwrap();

        let source = SnapshotSource::from_file(file.path()).unwrap();
        let mut mapper = SchemaMapper::with_default_types(MapperConfig::default(), Box::new(source));
        mapper.run().unwrap();

        assert_eq!(mapper.schema().product.product_name, "HSQL Database Engine");
        assert!(mapper.graph_model().vertex_by_name("City").is_some());
    }

    #[test]
    fn test_hive_table_gets_row_index_key() {
        let mut events = SnapshotTable::new("EVENTS")
            .column("PAYLOAD", "STRING")
            .column("SEEN_AT", "TIMESTAMP");
        events.table_type = "MANAGED_TABLE".to_string();

        let config = MapperConfig {
            data_source: DataSource::new(Vendor::Hive, "thrift://metastore:9083"),
            ..Default::default()
        };
        let mut mapper = SchemaMapper::with_default_types(config, Box::new(SnapshotSource::new(vec![events])));
        mapper.run().unwrap();

        let vertex = mapper.graph_model().vertex_by_name("Events").unwrap();
        assert_eq!(vertex.external_key, vec!["rowIndex".to_string()]);
        assert_eq!(vertex.properties.len(), 3);
        assert_eq!(mapper.statistics().entities_without_primary_key, 0);
    }

    #[test]
    fn test_mysql_database_name_scopes_tables() {
        let source = SnapshotSource::new(vec![
            SnapshotTable::new("CUSTOMER").column("ID", "INT").primary_key(&["ID"]),
            SnapshotTable::new("ORDERS")
                .column("ID", "INT")
                .column("CUSTOMER_ID", "INT")
                .primary_key(&["ID"])
                .foreign_key("CUSTOMER", &["CUSTOMER_ID"], &["ID"]),
        ])
        .with_database_name("shop");

        let config = MapperConfig {
            data_source: DataSource::new(Vendor::MySql, "jdbc:mysql://localhost:3306/shop"),
            ..Default::default()
        };
        let mut mapper = SchemaMapper::with_default_types(config, Box::new(source));
        mapper.run().unwrap();

        assert_eq!(mapper.schema().entity_count(), 2);
        let model = mapper.graph_model();
        let edge = model.require_edge("HasCustomer").unwrap();
        assert_eq!(edge.in_vertex, model.vertex_id_by_name("Customer").unwrap());
    }

    #[test]
    fn test_filtered_out_parent_drops_edge() {
        let source = SnapshotSource::new(vec![
            SnapshotTable::new("AUTHOR").column("ID", "INTEGER").primary_key(&["ID"]),
            SnapshotTable::new("BOOK")
                .column("ID", "INTEGER")
                .column("AUTHOR_ID", "INTEGER")
                .primary_key(&["ID"])
                .foreign_key("AUTHOR", &["AUTHOR_ID"], &["ID"]),
        ]);
        let config = MapperConfig {
            strategy: MappingStrategy::Naive,
            include_tables: vec!["BOOK".to_string()],
            ..Default::default()
        };
        let mut mapper = SchemaMapper::with_default_types(config, Box::new(source));
        mapper.run().unwrap();

        let model = mapper.graph_model();
        assert_eq!(model.vertex_count(), 1);
        assert_eq!(model.edge_count(), 0);
        assert!(model.vertex_by_name("Book").unwrap().property_by_name("authorId").is_some());
    }
}
