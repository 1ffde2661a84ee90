//! Inheritance hierarchies declared by a Hibernate mapping file

#[cfg(test)]
mod inheritance_tests {
    use relgraph::config::{MapperConfig, MappingStrategy};
    use relgraph::relational::metadata::{SnapshotSource, SnapshotTable};
    use relgraph::relational::model::InheritancePattern;
    use relgraph::SchemaMapper;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn descriptor_file(xml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(xml.as_bytes()).unwrap();
        file
    }

    fn run(tables: Vec<SnapshotTable>, descriptor: &NamedTempFile) -> SchemaMapper {
        let config = MapperConfig {
            strategy: MappingStrategy::Naive,
            inheritance_descriptor: Some(descriptor.path().to_path_buf()),
            ..Default::default()
        };
        let mut mapper = SchemaMapper::with_default_types(config, Box::new(SnapshotSource::new(tables)));
        mapper.run().expect("mapping run failed");
        mapper
    }

    fn assert_contiguous_ordinals(mapper: &SchemaMapper) {
        for entity in mapper.schema().entities() {
            for (i, attribute) in entity.attributes().iter().enumerate() {
                assert_eq!(
                    attribute.ordinal_position,
                    i + 1,
                    "{}.{} out of sequence",
                    entity.name,
                    attribute.name
                );
            }
        }
    }

    #[test]
    fn test_table_per_hierarchy() {
        let descriptor = descriptor_file(
            r#"<?xml version="1.0"?>
<!DOCTYPE hibernate-mapping PUBLIC
    "-//Hibernate/Hibernate Mapping DTD 3.0//EN"
    "http://www.hibernate.org/dtd/hibernate-mapping-3.0.dtd">
<hibernate-mapping package="com.acme.hr">
  <class name="Employee" table="EMPLOYEE" discriminator-value="E">
    <id name="id" column="ID"/>
    <discriminator column="KIND" type="string"/>
    <property name="name" column="NAME"/>
    <subclass name="Regular" discriminator-value="R">
      <property name="salary" column="SALARY"/>
    </subclass>
    <subclass name="Contractor" discriminator-value="C">
      <property name="rate" column="RATE"/>
    </subclass>
  </class>
</hibernate-mapping>"#,
        );
        let mapper = run(
            vec![
                SnapshotTable::new("DEPARTMENT")
                    .column("ID", "INTEGER")
                    .column("NAME", "VARCHAR(50)")
                    .primary_key(&["ID"]),
                SnapshotTable::new("EMPLOYEE")
                    .column("ID", "INTEGER")
                    .column("NAME", "VARCHAR(50)")
                    .column("KIND", "CHAR(1)")
                    .column("DEPT_ID", "INTEGER")
                    .column("SALARY", "NUMERIC(10,2)")
                    .column("RATE", "NUMERIC(6,2)")
                    .primary_key(&["ID"])
                    .foreign_key("DEPARTMENT", &["DEPT_ID"], &["ID"]),
            ],
            &descriptor,
        );

        let schema = mapper.schema();
        let employee = schema.entity_by_name("EMPLOYEE").unwrap();
        assert!(!employee.has_attribute_ignore_case("KIND"));
        assert!(!employee.has_attribute_ignore_case("SALARY"));

        let bag = schema.bag(employee.hierarchical_bag.unwrap());
        assert_eq!(bag.pattern, InheritancePattern::TablePerHierarchy);
        assert_eq!(bag.discriminator_column.as_deref(), Some("KIND"));
        assert_eq!(bag.discriminator_value("Regular"), Some("R"));
        assert_eq!(bag.discriminator_value("EMPLOYEE"), Some("E"));
        assert_eq!(mapper.statistics().detected_hierarchies, 1);

        let model = mapper.graph_model();
        let order: Vec<&str> = model.vertices().map(|v| v.name.as_str()).collect();
        assert_eq!(order, vec!["Department", "Employee", "Contractor", "Regular"]);

        let has_dept = model.require_edge("HasDept").unwrap();
        let regular = model.vertex_by_name("Regular").unwrap();
        assert_eq!(regular.parent_type, model.vertex_id_by_name("Employee"));
        assert_eq!(regular.inheritance_level, 1);
        assert!(regular.out_edges.contains(&has_dept.id));
        assert_eq!(regular.external_key, vec!["id".to_string()]);
        assert!(regular.property_by_name("salary").is_some());
        assert!(regular.inherited_property_by_name("name").is_some());

        assert_contiguous_ordinals(&mapper);
    }

    #[test]
    fn test_table_per_type() {
        let descriptor = descriptor_file(
            r#"<hibernate-mapping>
  <class name="org.people.Person" table="PERSON">
    <id name="id" column="ID"/>
    <joined-subclass name="org.people.Employee" table="EMPLOYEE">
      <key column="PERSON_ID"/>
      <joined-subclass name="org.people.Manager" table="MANAGER">
        <key column="EMP_ID"/>
      </joined-subclass>
    </joined-subclass>
  </class>
</hibernate-mapping>"#,
        );
        let mapper = run(
            vec![
                SnapshotTable::new("PERSON")
                    .column("ID", "INTEGER")
                    .column("NAME", "VARCHAR(80)")
                    .primary_key(&["ID"]),
                SnapshotTable::new("EMPLOYEE")
                    .column("PERSON_ID", "INTEGER")
                    .column("SALARY", "NUMERIC(10,2)")
                    .primary_key(&["PERSON_ID"]),
                SnapshotTable::new("MANAGER")
                    .column("EMP_ID", "INTEGER")
                    .column("BONUS", "NUMERIC(10,2)")
                    .primary_key(&["EMP_ID"]),
            ],
            &descriptor,
        );

        let model = mapper.graph_model();
        assert_eq!(model.edge_count(), 0);

        let employee = model.vertex_by_name("Employee").unwrap();
        let manager = model.vertex_by_name("Manager").unwrap();
        assert_eq!(employee.inheritance_level, 1);
        assert_eq!(manager.inheritance_level, 2);
        assert_eq!(manager.parent_type, Some(employee.id));
        assert_eq!(model.max_inheritance_level(), 2);
        assert!(manager.property_by_name("empId").is_none());

        // name lookups fall back through the parent chain
        let rules = mapper.rules();
        assert_eq!(
            rules.property_name_for(model, manager.id, "BONUS").as_deref(),
            Some("bonus")
        );
        assert_eq!(
            rules.property_name_for(model, manager.id, "NAME").as_deref(),
            Some("name")
        );
        assert_eq!(
            rules.attribute_name_for(model, manager.id, "salary").as_deref(),
            Some("SALARY")
        );

        let schema = mapper.schema();
        let bag = schema.bag(schema.entity_by_name("PERSON").unwrap().hierarchical_bag.unwrap());
        assert_eq!(bag.pattern, InheritancePattern::TablePerType);
        assert_eq!(bag.entities_at_depth(2).len(), 1);

        assert_contiguous_ordinals(&mapper);
    }

    #[test]
    fn test_table_per_concrete_type() {
        let descriptor = descriptor_file(
            r#"<hibernate-mapping>
  <class name="Shape" table="SHAPE">
    <union-subclass name="Circle" table="CIRCLE">
      <property name="radius" column="RADIUS"/>
    </union-subclass>
  </class>
</hibernate-mapping>"#,
        );
        let mapper = run(
            vec![
                SnapshotTable::new("CANVAS").column("ID", "INTEGER").primary_key(&["ID"]),
                SnapshotTable::new("SHAPE")
                    .column("ID", "INTEGER")
                    .column("COLOR", "VARCHAR(20)")
                    .column("CANVAS_ID", "INTEGER")
                    .primary_key(&["ID"])
                    .foreign_key("CANVAS", &["CANVAS_ID"], &["ID"]),
                SnapshotTable::new("CIRCLE")
                    .column("ID", "INTEGER")
                    .column("COLOR", "VARCHAR(20)")
                    .column("RADIUS", "DOUBLE")
                    .primary_key(&["ID"]),
            ],
            &descriptor,
        );

        let circle_entity = mapper.schema().entity_by_name("CIRCLE").unwrap();
        let own: Vec<&str> = circle_entity.attributes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(own, vec!["RADIUS"]);
        assert!(circle_entity
            .inherited_attributes()
            .iter()
            .any(|a| a.name == "COLOR"));

        let model = mapper.graph_model();
        let has_canvas = model.require_edge("HasCanvas").unwrap();
        let circle = model.vertex_by_name("Circle").unwrap();
        assert!(circle.out_edges.contains(&has_canvas.id));
        assert_eq!(has_canvas.relationships_represented, 1);
        assert_eq!(circle.parent_type, model.vertex_id_by_name("Shape"));

        assert_contiguous_ordinals(&mapper);
    }

    #[test]
    fn test_descriptor_for_unknown_tables_changes_nothing() {
        let descriptor = descriptor_file(
            r#"<hibernate-mapping>
  <class name="Vehicle" table="VEHICLE">
    <joined-subclass name="Car" table="CAR"/>
  </class>
</hibernate-mapping>"#,
        );
        let mapper = run(
            vec![SnapshotTable::new("AUTHOR").column("ID", "INTEGER").primary_key(&["ID"])],
            &descriptor,
        );

        assert_eq!(mapper.statistics().detected_hierarchies, 0);
        assert!(mapper.schema().bags().is_empty());
        assert_eq!(mapper.graph_model().vertex_count(), 1);
    }

    #[test]
    fn test_malformed_descriptor_aborts_run() {
        let descriptor = descriptor_file("<hibernate-mapping><class name=");
        let config = MapperConfig {
            inheritance_descriptor: Some(descriptor.path().to_path_buf()),
            ..Default::default()
        };
        let source = SnapshotSource::new(vec![SnapshotTable::new("AUTHOR").column("ID", "INTEGER")]);
        let mut mapper = SchemaMapper::with_default_types(config, Box::new(source));

        let err = mapper.run().unwrap_err();
        assert!(matches!(err, relgraph::MappingError::Descriptor(_)));
    }
}
