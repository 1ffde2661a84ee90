//! Class-mapping rule store
//!
//! Records how the relational schema was translated: which entity produced
//! which vertex/edge type, the attribute <-> property names on each side,
//! which edge type a canonical relationship became, and which edge replaced
//! a collapsed join vertex type. Every registry is keyed by handle and keeps
//! insertion order.

use std::collections::{BTreeMap, HashMap};

use super::errors::{GraphSchemaError, Result};
use super::graph_model::{AggregatorEdge, EdgeId, GraphModel, VertexId};
use crate::relational::model::{EntityId, RelationshipId};

/// Attribute-name <-> property-name dictionaries shared by both mapper kinds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMapping {
    attribute_to_property: HashMap<String, String>,
    property_to_attribute: HashMap<String, String>,
}

impl NameMapping {
    pub fn insert(&mut self, attribute: impl Into<String>, property: impl Into<String>) {
        let (attribute, property) = (attribute.into(), property.into());
        self.attribute_to_property
            .insert(attribute.clone(), property.clone());
        self.property_to_attribute.insert(property, attribute);
    }

    pub fn property_for(&self, attribute: &str) -> Option<&str> {
        self.attribute_to_property.get(attribute).map(|s| s.as_str())
    }

    pub fn attribute_for(&self, property: &str) -> Option<&str> {
        self.property_to_attribute.get(property).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.attribute_to_property.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attribute_to_property.is_empty()
    }
}

/// Entity -> vertex type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EVClassMapper {
    pub entity: EntityId,
    pub vertex_type: VertexId,
    pub names: NameMapping,
}

impl EVClassMapper {
    pub fn new(entity: EntityId, vertex_type: VertexId) -> Self {
        EVClassMapper {
            entity,
            vertex_type,
            names: NameMapping::default(),
        }
    }
}

/// Entity -> edge type (join entities collapsed into aggregator edges)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EEClassMapper {
    pub entity: EntityId,
    pub edge_type: EdgeId,
    pub names: NameMapping,
}

impl EEClassMapper {
    pub fn new(entity: EntityId, edge_type: EdgeId) -> Self {
        EEClassMapper {
            entity,
            edge_type,
            names: NameMapping::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MappingRules {
    ev_mappers: Vec<EVClassMapper>,
    ee_mappers: Vec<EEClassMapper>,
    relationship_to_edge: HashMap<RelationshipId, EdgeId>,
    join_vertex_to_aggregator: BTreeMap<VertexId, AggregatorEdge>,
}

impl MappingRules {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== entity <-> vertex type =====

    /// Registers a mapper, replacing an earlier one for the same
    /// (entity, vertex type) pair so repeated builds do not duplicate rules
    pub fn add_ev_mapper(&mut self, mapper: EVClassMapper) {
        match self
            .ev_mappers
            .iter_mut()
            .find(|m| m.entity == mapper.entity && m.vertex_type == mapper.vertex_type)
        {
            Some(existing) => *existing = mapper,
            None => self.ev_mappers.push(mapper),
        }
    }

    pub fn ev_mappers(&self) -> &[EVClassMapper] {
        &self.ev_mappers
    }

    pub fn ev_mappers_by_entity(&self, entity: EntityId) -> Vec<&EVClassMapper> {
        self.ev_mappers
            .iter()
            .filter(|m| m.entity == entity)
            .collect()
    }

    pub fn ev_mappers_by_vertex(&self, vertex_type: VertexId) -> Vec<&EVClassMapper> {
        self.ev_mappers
            .iter()
            .filter(|m| m.vertex_type == vertex_type)
            .collect()
    }

    pub fn vertex_for_entity(&self, entity: EntityId) -> Option<VertexId> {
        self.ev_mappers
            .iter()
            .find(|m| m.entity == entity)
            .map(|m| m.vertex_type)
    }

    pub fn entity_for_vertex(&self, vertex_type: VertexId) -> Option<EntityId> {
        self.ev_mappers
            .iter()
            .find(|m| m.vertex_type == vertex_type)
            .map(|m| m.entity)
    }

    /// Like [`Self::entity_for_vertex`], failing with the vertex type's name
    pub fn require_entity_for_vertex(
        &self,
        model: &GraphModel,
        vertex_type: VertexId,
    ) -> Result<EntityId> {
        self.entity_for_vertex(vertex_type)
            .ok_or_else(|| GraphSchemaError::UnmappedVertexType {
                vertex_type: model.vertex(vertex_type).name.clone(),
            })
    }

    // ===== entity <-> edge type =====

    pub fn add_ee_mapper(&mut self, mapper: EEClassMapper) {
        self.ee_mappers.push(mapper);
    }

    pub fn ee_mappers(&self) -> &[EEClassMapper] {
        &self.ee_mappers
    }

    pub fn ee_mappers_by_entity(&self, entity: EntityId) -> Vec<&EEClassMapper> {
        self.ee_mappers
            .iter()
            .filter(|m| m.entity == entity)
            .collect()
    }

    pub fn ee_mappers_by_edge(&self, edge_type: EdgeId) -> Vec<&EEClassMapper> {
        self.ee_mappers
            .iter()
            .filter(|m| m.edge_type == edge_type)
            .collect()
    }

    // ===== relationship <-> edge type =====

    pub fn register_relationship(&mut self, relationship: RelationshipId, edge_type: EdgeId) {
        self.relationship_to_edge.insert(relationship, edge_type);
    }

    pub fn is_relationship_registered(&self, relationship: RelationshipId) -> bool {
        self.relationship_to_edge.contains_key(&relationship)
    }

    pub fn edge_for_relationship(&self, relationship: RelationshipId) -> Option<EdgeId> {
        self.relationship_to_edge.get(&relationship).copied()
    }

    /// Relationships represented by an edge type, in creation order
    pub fn relationships_for_edge(&self, edge_type: EdgeId) -> Vec<RelationshipId> {
        let mut relationships: Vec<RelationshipId> = self
            .relationship_to_edge
            .iter()
            .filter(|(_, e)| **e == edge_type)
            .map(|(r, _)| *r)
            .collect();
        relationships.sort();
        relationships
    }

    // ===== join vertex <-> aggregator edge =====

    pub fn register_aggregator(&mut self, join_vertex: VertexId, aggregator: AggregatorEdge) {
        self.join_vertex_to_aggregator.insert(join_vertex, aggregator);
    }

    pub fn aggregator_for_join_vertex(&self, join_vertex: VertexId) -> Option<&AggregatorEdge> {
        self.join_vertex_to_aggregator.get(&join_vertex)
    }

    pub fn aggregator_by_edge_name(
        &self,
        model: &GraphModel,
        edge_name: &str,
    ) -> Option<(VertexId, &AggregatorEdge)> {
        self.join_vertex_to_aggregator
            .iter()
            .find(|(_, agg)| model.edge(agg.edge).name == edge_name)
            .map(|(v, agg)| (*v, agg))
    }

    pub fn aggregators(&self) -> impl Iterator<Item = (VertexId, &AggregatorEdge)> + '_ {
        self.join_vertex_to_aggregator.iter().map(|(v, a)| (*v, a))
    }

    // ===== name translation =====

    /// Property name of `attribute` on `vertex_type`, falling back to the
    /// parent types when the vertex type itself has no matching entry
    pub fn property_name_for(
        &self,
        model: &GraphModel,
        vertex_type: VertexId,
        attribute: &str,
    ) -> Option<String> {
        self.walk_parent_chain(model, vertex_type, |names| names.property_for(attribute))
    }

    /// Attribute name behind `property` on `vertex_type`, with the same
    /// parent fallback as [`Self::property_name_for`]
    pub fn attribute_name_for(
        &self,
        model: &GraphModel,
        vertex_type: VertexId,
        property: &str,
    ) -> Option<String> {
        self.walk_parent_chain(model, vertex_type, |names| names.attribute_for(property))
    }

    fn walk_parent_chain<'a, F>(
        &'a self,
        model: &GraphModel,
        vertex_type: VertexId,
        lookup: F,
    ) -> Option<String>
    where
        F: Fn(&'a NameMapping) -> Option<&'a str>,
    {
        let max_depth = model.max_inheritance_level() + 1;

        model
            .parent_chain(vertex_type, max_depth)
            .into_iter()
            .find_map(|v| {
                self.ev_mappers
                    .iter()
                    .filter(|m| m.vertex_type == v)
                    .find_map(|m| lookup(&m.names))
            })
            .map(str::to_string)
    }
}
