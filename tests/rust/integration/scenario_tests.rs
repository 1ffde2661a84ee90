//! End-to-end mapping scenarios over small in-memory catalogs

#[cfg(test)]
mod scenario_tests {
    use relgraph::config::{MapperConfig, MappingStrategy};
    use relgraph::relational::metadata::{SnapshotSource, SnapshotTable};
    use relgraph::SchemaMapper;

    fn run(strategy: MappingStrategy, tables: Vec<SnapshotTable>) -> SchemaMapper {
        let config = MapperConfig {
            strategy,
            ..Default::default()
        };
        let mut mapper = SchemaMapper::with_default_types(config, Box::new(SnapshotSource::new(tables)));
        mapper.run().expect("mapping run failed");
        mapper
    }

    fn author_table(name: &str) -> SnapshotTable {
        SnapshotTable::new(name)
            .column("ID", "INTEGER")
            .column("NAME", "VARCHAR(50)")
            .column("AGE", "INTEGER")
            .primary_key(&["ID"])
    }

    fn book_table(name: &str, parent: &str) -> SnapshotTable {
        SnapshotTable::new(name)
            .column("ID", "INTEGER")
            .column("TITLE", "VARCHAR(200)")
            .column("AUTHOR_ID", "INTEGER")
            .primary_key(&["ID"])
            .foreign_key(parent, &["AUTHOR_ID"], &["ID"])
    }

    #[test]
    fn test_single_foreign_key_becomes_edge() {
        let mapper = run(
            MappingStrategy::Naive,
            vec![author_table("BOOK_AUTHOR"), book_table("BOOK", "BOOK_AUTHOR")],
        );
        let model = mapper.graph_model();

        let names: Vec<&str> = model.vertices().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Book", "BookAuthor"]);
        assert_eq!(model.edge_count(), 1);

        let book = model.vertex_by_name("Book").unwrap();
        let author = model.vertex_by_name("BookAuthor").unwrap();
        let has_author = model.require_edge("HasAuthor").unwrap();
        assert_eq!(has_author.in_vertex, author.id);
        assert!(book.out_edges.contains(&has_author.id));
        assert!(author.in_edges.contains(&has_author.id));

        let author_id = book.property_by_name("authorId").unwrap();
        assert_eq!(author_id.ordinal_position, 3);
        assert!(!author_id.from_primary_key);
        assert_eq!(book.external_key, vec!["id".to_string()]);
    }

    #[test]
    fn test_repeated_foreign_key_name_shares_edge() {
        let mapper = run(
            MappingStrategy::Naive,
            vec![
                author_table("AUTHOR"),
                book_table("BOOK", "AUTHOR"),
                book_table("ARTICLE", "AUTHOR"),
            ],
        );
        let model = mapper.graph_model();
        let rules = mapper.rules();

        assert_eq!(model.edge_count(), 1);
        let has_author = model.require_edge("HasAuthor").unwrap();
        assert_eq!(has_author.relationships_represented, 2);
        assert_eq!(rules.relationships_for_edge(has_author.id).len(), 2);

        for source in ["Article", "Book"] {
            let vertex = model.vertex_by_name(source).unwrap();
            assert!(vertex.out_edges.contains(&has_author.id), "{} lost its edge", source);
        }
    }

    #[test]
    fn test_join_table_collapses_into_aggregator_edge() {
        let mapper = run(
            MappingStrategy::NaiveAggregate,
            vec![
                SnapshotTable::new("FILM")
                    .column("ID", "INTEGER")
                    .column("TITLE", "VARCHAR(100)")
                    .primary_key(&["ID"]),
                SnapshotTable::new("ACTOR")
                    .column("ID", "INTEGER")
                    .column("NAME", "VARCHAR(100)")
                    .primary_key(&["ID"]),
                SnapshotTable::new("FILM_ACTOR")
                    .column("FILM_ID", "INTEGER")
                    .column("ACTOR_ID", "INTEGER")
                    .column("CHARACTER_NAME", "VARCHAR(100)")
                    .primary_key(&["FILM_ID", "ACTOR_ID"])
                    .foreign_key("FILM", &["FILM_ID"], &["ID"])
                    .foreign_key("ACTOR", &["ACTOR_ID"], &["ID"]),
            ],
        );
        let model = mapper.graph_model();
        let rules = mapper.rules();

        assert!(model.vertex_by_name("FilmActor").is_none());
        assert_eq!(model.vertex_count(), 2);
        assert_eq!(model.edge_count(), 1);

        let film = model.vertex_id_by_name("Film").unwrap();
        let actor = model.vertex_id_by_name("Actor").unwrap();
        let edge = model.require_edge("FilmActor").unwrap();
        assert!(edge.is_aggregator);
        assert_eq!(edge.out_vertex, Some(film));
        assert_eq!(edge.in_vertex, actor);
        assert_eq!(edge.relationships_represented, 1);

        let character = edge.property_by_name("characterName").unwrap();
        assert_eq!(character.ordinal_position, 1);
        assert_eq!(edge.properties.len(), 1);

        let (join_vertex, aggregator) = rules.aggregator_by_edge_name(model, "FilmActor").unwrap();
        assert!(!model.is_live_vertex(join_vertex));
        assert_eq!(aggregator.out_vertex_name, "Film");
        assert_eq!(aggregator.in_vertex_name, "Actor");
        assert_eq!(mapper.statistics().aggregated_join_tables, 1);
    }

    #[test]
    fn test_self_reference_keeps_edges_apart() {
        let mapper = run(
            MappingStrategy::Naive,
            vec![
                SnapshotTable::new("EMPLOYEE")
                    .column("EMP_ID", "INTEGER")
                    .column("MGR_ID", "INTEGER")
                    .primary_key(&["EMP_ID"])
                    .foreign_key("EMPLOYEE", &["MGR_ID"], &["EMP_ID"]),
                SnapshotTable::new("PROJECT")
                    .column("ID", "INTEGER")
                    .column("PROJECT_MANAGER", "INTEGER")
                    .primary_key(&["ID"])
                    .foreign_key("EMPLOYEE", &["PROJECT_MANAGER"], &["EMP_ID"]),
            ],
        );
        let model = mapper.graph_model();
        let employee = model.vertex_id_by_name("Employee").unwrap();

        let mgr = model.require_edge("HasMgr").unwrap();
        let pm = model.require_edge("HasProjectManager").unwrap();
        assert_ne!(mgr.id, pm.id);
        assert_eq!(mgr.in_vertex, employee);
        assert_eq!(pm.in_vertex, employee);
        assert!(model.vertex(employee).out_edges.contains(&mgr.id));
        assert!(model.vertex(employee).in_edges.contains(&mgr.id));
    }

    #[test]
    fn test_composite_foreign_key_follows_primary_key_order() {
        let mapper = run(
            MappingStrategy::Naive,
            vec![
                SnapshotTable::new("SHIPMENT")
                    .column("REGION", "VARCHAR(4)")
                    .column("CODE", "INTEGER")
                    .primary_key(&["REGION", "CODE"]),
                SnapshotTable::new("PACKAGE")
                    .column("ID", "INTEGER")
                    .column("SHIP_CODE", "INTEGER")
                    .column("SHIP_REGION", "VARCHAR(4)")
                    .primary_key(&["ID"])
                    .foreign_key("SHIPMENT", &["SHIP_CODE", "SHIP_REGION"], &["CODE", "REGION"]),
            ],
        );

        let relationship = &mapper.schema().relationships()[0];
        assert_eq!(
            relationship.column_pairs(),
            vec![("SHIP_REGION", "REGION"), ("SHIP_CODE", "CODE")]
        );

        let model = mapper.graph_model();
        let edge = model.require_edge("Package2Shipment").unwrap();
        assert_eq!(edge.in_vertex, model.vertex_id_by_name("Shipment").unwrap());

        let shipment = model.vertex_by_name("Shipment").unwrap();
        assert_eq!(shipment.external_key, vec!["region".to_string(), "code".to_string()]);
    }

    #[test]
    fn test_rebuilding_graph_model_changes_nothing() {
        let mut mapper = run(
            MappingStrategy::Naive,
            vec![
                author_table("AUTHOR"),
                book_table("BOOK", "AUTHOR"),
                book_table("ARTICLE", "AUTHOR"),
            ],
        );
        let vertices_before = mapper.graph_model().vertex_count();
        let counter_before = mapper
            .graph_model()
            .require_edge("HasAuthor")
            .unwrap()
            .relationships_represented;
        let ev_mappers_before = mapper.rules().ev_mappers().len();

        mapper.build_graph_model();
        assert_eq!(mapper.rules().ev_mappers().len(), ev_mappers_before);
        let book = mapper.graph_model().vertex_id_by_name("Book").unwrap();
        assert_eq!(mapper.rules().ev_mappers_by_vertex(book).len(), 1);

        let model = mapper.graph_model();
        assert_eq!(model.vertex_count(), vertices_before);
        assert_eq!(model.edge_count(), 1);
        let has_author = model.require_edge("HasAuthor").unwrap();
        assert_eq!(has_author.relationships_represented, counter_before);
        assert_eq!(model.vertex_by_name("Book").unwrap().properties.len(), 3);
        assert_eq!(model.vertex_by_name("Book").unwrap().out_edges.len(), 1);
    }

    #[test]
    fn test_unknown_vertex_lookup_is_an_error() {
        let mapper = run(MappingStrategy::Naive, vec![author_table("AUTHOR")]);
        let err = mapper.graph_model().require_vertex("Publisher").unwrap_err();
        assert!(err.to_string().contains("Publisher"));
    }
}
