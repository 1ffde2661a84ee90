//! Relational schema builder
//!
//! Introspects the catalog into a [`DataBaseSchema`] in three ordered steps:
//!
//! 1. entities, their attributes and primary keys
//! 2. outgoing relationships, rebuilt from imported-key rows
//! 3. incoming relationships, derived from the global relationship list
//!
//! Step 2 needs every entity (and its primary key) from step 1, and step 3
//! needs every relationship from step 2, so the order is fixed.

use log::{debug, info, warn};

use super::errors::{RelationalSchemaError, Result};
use super::metadata::{ImportedKeyRow, MetadataSource, TableRef, TableRequest};
use super::model::{Attribute, DataBaseSchema, EntityId, ForeignKey};
use super::vendor::VendorAccommodation;
use crate::config::DataSource;
use crate::statistics::Statistics;

/// Include/exclude filter over table names (case-insensitive).
///
/// A non-empty include list wins outright; the exclude list only applies
/// when there is no include list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl TableFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        TableFilter { include, exclude }
    }

    pub fn allows(&self, table: &str) -> bool {
        if !self.include.is_empty() {
            return self.include.iter().any(|t| t.eq_ignore_ascii_case(table));
        }
        !self.exclude.iter().any(|t| t.eq_ignore_ascii_case(table))
    }
}

pub struct RelationalSchemaBuilder<'a, S: MetadataSource + ?Sized> {
    source: &'a S,
    data_source: &'a DataSource,
    filter: TableFilter,
}

impl<'a, S: MetadataSource + ?Sized> RelationalSchemaBuilder<'a, S> {
    pub fn new(source: &'a S, data_source: &'a DataSource, filter: TableFilter) -> Self {
        RelationalSchemaBuilder {
            source,
            data_source,
            filter,
        }
    }

    pub fn build(&self, stats: &mut Statistics) -> Result<DataBaseSchema> {
        let accommodation = self.data_source.vendor.accommodations();

        let product = self
            .source
            .product_info()
            .map_err(RelationalSchemaError::introspection("reading product info"))?;
        info!(
            "Introspecting {} {} (vendor: {})",
            product.product_name, product.product_version, self.data_source.vendor
        );

        let database_name = self
            .source
            .database_name()
            .map_err(RelationalSchemaError::introspection("reading database name"))?;
        let schema_name = (accommodation.resolve_schema)(
            self.data_source.schema.as_deref(),
            database_name.as_deref(),
        );

        let mut schema = DataBaseSchema::new(product);
        self.build_entities(&mut schema, &accommodation, schema_name, stats)?;
        self.build_out_relationships(&mut schema, stats)?;
        build_in_relationships(&mut schema);

        info!(
            "Source schema built: {} entities, {} relationships",
            schema.entity_count(),
            schema.relationship_count()
        );
        Ok(schema)
    }

    fn build_entities(
        &self,
        schema: &mut DataBaseSchema,
        accommodation: &VendorAccommodation,
        schema_name: Option<String>,
        stats: &mut Statistics,
    ) -> Result<()> {
        let request = TableRequest {
            catalog: self.data_source.catalog.clone(),
            schema_pattern: schema_name,
            name_pattern: None,
            types: accommodation
                .table_types
                .iter()
                .map(|t| t.to_string())
                .collect(),
        };

        let tables: Vec<TableRef> = self
            .source
            .tables(&request)
            .map_err(RelationalSchemaError::introspection("enumerating tables"))?
            .into_iter()
            .filter(|t| self.filter.allows(&t.name))
            .collect();
        stats.total_entities = tables.len();

        for table in tables {
            let mut columns = self
                .source
                .columns(&table)
                .map_err(RelationalSchemaError::introspection(format!(
                    "reading columns of {}",
                    table.name
                )))?;
            columns.sort_by_key(|c| c.ordinal_position);

            let pk_columns = self
                .source
                .primary_key_columns(&table)
                .map_err(RelationalSchemaError::introspection(format!(
                    "reading primary key of {}",
                    table.name
                )))?;

            if let Some(rows) = self
                .source
                .count_rows(&table)
                .map_err(RelationalSchemaError::introspection(format!(
                    "counting rows of {}",
                    table.name
                )))?
            {
                stats.total_records += rows;
            }

            let id = schema.add_entity(
                table.name.clone(),
                table.schema.clone(),
                self.data_source.name.clone(),
            );
            let entity = schema.entity_mut(id);
            for column in columns {
                entity.add_attribute(column.name, column.type_name);
            }

            // Key order comes from the catalog, not from column order
            let pk_attributes: Vec<Attribute> = pk_columns
                .iter()
                .filter_map(|c| entity.attribute_by_name(c).cloned())
                .collect();
            entity.primary_key.attributes = pk_attributes;

            (accommodation.complete_entity)(entity);

            if entity.primary_key.is_empty() {
                warn!(
                    "Entity '{}' has no primary key; its vertex type will have no external key",
                    entity.name
                );
                stats.entities_without_primary_key += 1;
            }

            debug!(
                "Built entity '{}' with {} attributes, primary key {:?}",
                entity.name,
                entity.attributes().len(),
                entity.primary_key.attribute_names()
            );
            stats.built_entities += 1;
        }

        Ok(())
    }

    fn build_out_relationships(&self, schema: &mut DataBaseSchema, stats: &mut Statistics) -> Result<()> {
        let mut groups_per_entity: Vec<(EntityId, Vec<Vec<ImportedKeyRow>>)> = Vec::new();

        for id in schema.entity_ids() {
            let entity = schema.entity(id);
            let table = TableRef::new(entity.schema_name.clone(), entity.name.clone());
            let rows: Vec<ImportedKeyRow> = self
                .source
                .imported_keys(&table)
                .map_err(RelationalSchemaError::introspection(format!(
                    "reading imported keys of {}",
                    entity.name
                )))?
                .into_iter()
                .filter(|r| self.filter.allows(&r.pktable_name))
                .collect();

            let groups = group_imported_keys(rows);
            stats.total_relationships += groups.len();
            groups_per_entity.push((id, groups));
        }

        for (foreign_id, groups) in groups_per_entity {
            for group in groups {
                if link_foreign_key(schema, foreign_id, &group) {
                    stats.built_relationships += 1;
                }
            }
        }

        Ok(())
    }
}

/// Derives every entity's incoming relationships from the global list
pub fn build_in_relationships(schema: &mut DataBaseSchema) {
    let links: Vec<_> = schema
        .relationships()
        .iter()
        .map(|r| (r.parent_entity, r.id))
        .collect();

    for (parent, relationship) in links {
        let incoming = &mut schema.entity_mut(parent).in_relationships;
        if !incoming.contains(&relationship) {
            incoming.push(relationship);
        }
    }
}

/// Splits imported-key rows into one group per foreign key.
///
/// Rows carrying a constraint name are grouped by (parent table, name).
/// Unnamed rows are split into runs: a run ends when the parent table changes
/// or the key sequence restarts.
pub fn group_imported_keys(rows: Vec<ImportedKeyRow>) -> Vec<Vec<ImportedKeyRow>> {
    let mut groups: Vec<Vec<ImportedKeyRow>> = Vec::new();
    let mut open_run: Option<usize> = None;

    for row in rows {
        if let Some(fk_name) = row.fk_name.clone() {
            let existing = groups.iter().position(|g| {
                g[0].fk_name.as_deref() == Some(fk_name.as_str())
                    && g[0].pktable_name.eq_ignore_ascii_case(&row.pktable_name)
            });
            match existing {
                Some(index) => groups[index].push(row),
                None => groups.push(vec![row]),
            }
            open_run = None;
            continue;
        }

        let continues_run = open_run.is_some_and(|index| {
            let last = &groups[index][groups[index].len() - 1];
            last.pktable_name.eq_ignore_ascii_case(&row.pktable_name)
                && last.pktable_schema == row.pktable_schema
                && row.key_seq > last.key_seq
        });

        if continues_run {
            if let Some(index) = open_run {
                groups[index].push(row);
            }
        } else {
            groups.push(vec![row]);
            open_run = Some(groups.len() - 1);
        }
    }

    for group in &mut groups {
        group.sort_by_key(|r| r.key_seq);
    }
    groups
}

/// Turns one imported-key group into a canonical relationship.
/// Returns false when the group cannot be linked; the reason is logged.
fn link_foreign_key(schema: &mut DataBaseSchema, foreign_id: EntityId, group: &[ImportedKeyRow]) -> bool {
    let parent_table = &group[0].pktable_name;
    let parent_schema = group[0].pktable_schema.as_deref();
    let Some(parent_id) = schema.entity_id_in_schema(parent_schema, parent_table) else {
        debug!(
            "Skipping foreign key of '{}': parent table '{}' was not introspected",
            schema.entity(foreign_id).name,
            parent_table
        );
        return false;
    };

    let foreign = schema.entity(foreign_id);
    let primary_key = schema.entity(parent_id).primary_key.clone();

    if primary_key.len() != group.len() {
        warn!(
            "Skipping foreign key {}{:?} -> {}: {} columns against a {}-column primary key",
            foreign.name,
            group.iter().map(|r| r.fkcolumn_name.as_str()).collect::<Vec<_>>(),
            parent_table,
            group.len(),
            primary_key.len()
        );
        return false;
    }

    // Align by the referenced column when the catalog reports it, so that
    // foreign-key position i always matches primary-key position i
    let aligned: Option<Vec<&ImportedKeyRow>> = primary_key
        .attributes
        .iter()
        .map(|pk| group.iter().find(|r| r.pkcolumn_name == pk.name))
        .collect();
    let ordered: Vec<&ImportedKeyRow> = aligned.unwrap_or_else(|| group.iter().collect());

    let fk_attributes: Option<Vec<Attribute>> = ordered
        .iter()
        .map(|r| foreign.attribute_by_name(&r.fkcolumn_name).cloned())
        .collect();
    let Some(fk_attributes) = fk_attributes else {
        warn!(
            "Skipping foreign key of '{}': a referencing column is not an attribute of the table",
            foreign.name
        );
        return false;
    };

    let foreign_key = ForeignKey::new(fk_attributes);
    debug!(
        "Relationship {} {:?} -> {} {:?}",
        foreign.name,
        foreign_key.attributes.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
        parent_table,
        primary_key.attribute_names()
    );

    schema
        .entity_mut(foreign_id)
        .foreign_keys
        .push(foreign_key.clone());
    schema.add_relationship(foreign_id, parent_id, foreign_key, primary_key);
    true
}
