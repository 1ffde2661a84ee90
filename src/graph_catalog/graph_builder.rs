//! Graph schema synthesis
//!
//! Two ordered passes over a finished [`DataBaseSchema`]: one vertex type per
//! entity, then one edge type per distinct resolved relationship name. Both
//! passes record what they did in the [`MappingRules`].

use log::{debug, error, info, warn};

use super::graph_model::{GraphModel, ModelProperty, PropertyOwner, VertexId};
use super::mapping_rules::{EVClassMapper, MappingRules};
use super::name_resolver::NameResolver;
use super::type_mapper::TypeMapper;
use crate::relational::model::{Attribute, DataBaseSchema, Entity};
use crate::statistics::Statistics;

pub struct GraphSchemaBuilder<'a> {
    resolver: &'a dyn NameResolver,
    type_mapper: &'a dyn TypeMapper,
}

impl<'a> GraphSchemaBuilder<'a> {
    pub fn new(resolver: &'a dyn NameResolver, type_mapper: &'a dyn TypeMapper) -> Self {
        GraphSchemaBuilder {
            resolver,
            type_mapper,
        }
    }

    /// Vertex pass followed by the edge pass
    pub fn build(
        &self,
        schema: &DataBaseSchema,
        model: &mut GraphModel,
        rules: &mut MappingRules,
        stats: &mut Statistics,
    ) {
        self.build_vertex_types(schema, model, rules, stats);
        self.build_edge_types(schema, model, rules, stats);
    }

    fn to_property(
        &self,
        entity: &Entity,
        attribute: &Attribute,
        owner: VertexId,
    ) -> ModelProperty {
        ModelProperty::new(
            self.resolver.resolve_vertex_property(&attribute.name),
            attribute.ordinal_position,
            attribute.data_type.as_str(),
            self.type_mapper.map_type(&attribute.data_type),
            entity.primary_key.contains(&attribute.name),
            PropertyOwner::Vertex(owner),
        )
    }

    pub fn build_vertex_types(
        &self,
        schema: &DataBaseSchema,
        model: &mut GraphModel,
        rules: &mut MappingRules,
        stats: &mut Statistics,
    ) {
        info!("Building vertex types from {} entities", schema.entity_count());
        stats.total_vertex_types = schema.entity_count();

        for entity in schema.entities() {
            let vertex_name = self.resolver.resolve_vertex_name(&entity.name);
            let vertex_id = match model.vertex_id_by_name(&vertex_name) {
                Some(existing) => {
                    debug!(
                        "Entity '{}' converges on existing vertex type '{}'",
                        entity.name, vertex_name
                    );
                    existing
                }
                None => {
                    stats.built_vertex_types += 1;
                    model.new_vertex(vertex_name.as_str())
                }
            };

            if entity.is_aggregable_join_table() {
                model.vertex_mut(vertex_id).is_from_join_table = true;
            }

            let mut mapper = EVClassMapper::new(entity.id, vertex_id);
            for attribute in entity.attributes() {
                let property = self.to_property(entity, attribute, vertex_id);
                let property_name = property.name.clone();
                let from_primary_key = property.from_primary_key;

                let vertex = model.vertex_mut(vertex_id);
                vertex.add_property(property);
                if from_primary_key && !vertex.external_key.contains(&property_name) {
                    vertex.external_key.push(property_name.clone());
                }
                mapper.names.insert(attribute.name.as_str(), property_name);
            }

            for attribute in entity.inherited_attributes() {
                let property = self.to_property(entity, attribute, vertex_id);
                let property_name = property.name.clone();
                let from_primary_key = property.from_primary_key;

                let vertex = model.vertex_mut(vertex_id);
                vertex.add_inherited_property(property);
                if from_primary_key && !vertex.external_key.contains(&property_name) {
                    vertex.external_key.push(property_name);
                }
            }

            if let Some(parent_entity) = entity.parent_entity {
                match rules.vertex_for_entity(parent_entity) {
                    Some(parent_vertex) if parent_vertex != vertex_id => {
                        let vertex = model.vertex_mut(vertex_id);
                        vertex.parent_type = Some(parent_vertex);
                        vertex.inheritance_level = entity.inheritance_level;
                    }
                    Some(_) => debug!(
                        "Entity '{}' shares its vertex type with its parent",
                        entity.name
                    ),
                    None => warn!(
                        "Parent of entity '{}' has no vertex type yet, parent link dropped",
                        entity.name
                    ),
                }
            }

            debug!(
                "Vertex type '{}' mapped from entity '{}' ({} properties)",
                vertex_name,
                entity.name,
                mapper.names.len()
            );
            rules.add_ev_mapper(mapper);
        }

        model.sort_vertices_by_level_and_name();
        info!("Built {} vertex types", model.vertex_count());
    }

    pub fn build_edge_types(
        &self,
        schema: &DataBaseSchema,
        model: &mut GraphModel,
        rules: &mut MappingRules,
        stats: &mut Statistics,
    ) {
        info!(
            "Building edge types from {} relationships",
            schema.relationship_count()
        );

        for entity in schema.entities() {
            for &relationship_id in &entity.out_relationships {
                let relationship = schema.relationship(relationship_id);

                if rules.is_relationship_registered(relationship_id) {
                    debug!("Relationship {:?} already mapped, skipping", relationship_id);
                    continue;
                }
                if entity.parent_entity == Some(relationship.parent_entity) {
                    debug!(
                        "Relationship from '{}' to its parent entity is an inheritance link, skipping",
                        entity.name
                    );
                    continue;
                }

                let endpoints = (
                    rules.vertex_for_entity(relationship.foreign_entity),
                    rules.vertex_for_entity(relationship.parent_entity),
                );
                let (Some(out_vertex), Some(in_vertex)) = endpoints else {
                    error!(
                        "Cannot resolve vertex types for relationship '{}' -> '{}', edge skipped",
                        schema.entity(relationship.foreign_entity).name,
                        schema.entity(relationship.parent_entity).name
                    );
                    stats.skipped_edges += 1;
                    continue;
                };

                let edge_name = self.resolver.resolve_edge_name(schema, relationship);
                let edge_id = match model.edge_id_by_name(&edge_name) {
                    Some(existing) => {
                        model.edge_mut(existing).relationships_represented += 1;
                        existing
                    }
                    None => {
                        let id = model.new_edge(edge_name.as_str(), in_vertex);
                        model.edge_mut(id).relationships_represented = 1;
                        debug!(
                            "Edge type '{}' created: '{}' -> '{}'",
                            edge_name,
                            model.vertex(out_vertex).name,
                            model.vertex(in_vertex).name
                        );
                        id
                    }
                };

                model.attach_edge(edge_id, out_vertex, in_vertex);
                rules.register_relationship(relationship_id, edge_id);
            }

            // a child entity carries its parent's foreign keys
            let Some(vertex_id) = rules.vertex_for_entity(entity.id) else {
                continue;
            };
            for &relationship_id in &entity.inherited_out_relationships {
                if let Some(edge_id) = rules.edge_for_relationship(relationship_id) {
                    model.vertex_mut(vertex_id).add_out_edge(edge_id);
                }
            }
        }

        stats.total_edge_types = model.edge_count();
        stats.built_edge_types = model.edge_count();
        info!(
            "Built {} edge types ({} skipped)",
            model.edge_count(),
            stats.skipped_edges
        );
    }
}
