//! Graph schema model
//!
//! Vertex and edge types live in arenas inside [`GraphModel`]. Removing a type
//! (as the many-to-many aggregation does) only drops its handle from the live
//! ordering, so every other [`VertexId`]/[`EdgeId`] stays valid.

use log::warn;
use serde::Serialize;

use super::errors::{GraphSchemaError, Result};
use super::type_mapper::PropertyType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VertexId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOwner {
    Vertex(VertexId),
    Edge(EdgeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelProperty {
    pub name: String,
    /// 1-based position inside the owning type
    pub ordinal_position: usize,
    pub original_type: String,
    pub property_type: PropertyType,
    pub from_primary_key: bool,
    pub mandatory: Option<bool>,
    pub read_only: Option<bool>,
    pub not_null: Option<bool>,
    pub owner: PropertyOwner,
}

impl ModelProperty {
    pub fn new(
        name: impl Into<String>,
        ordinal_position: usize,
        original_type: impl Into<String>,
        property_type: PropertyType,
        from_primary_key: bool,
        owner: PropertyOwner,
    ) -> Self {
        ModelProperty {
            name: name.into(),
            ordinal_position,
            original_type: original_type.into(),
            property_type,
            from_primary_key,
            mandatory: None,
            read_only: None,
            not_null: None,
            owner,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VertexType {
    pub id: VertexId,
    pub name: String,
    pub properties: Vec<ModelProperty>,
    pub inherited_properties: Vec<ModelProperty>,
    /// Names of the properties that came from the source primary key
    pub external_key: Vec<String>,
    pub is_from_join_table: bool,
    pub parent_type: Option<VertexId>,
    pub inheritance_level: usize,
    pub out_edges: Vec<EdgeId>,
    pub in_edges: Vec<EdgeId>,
}

impl VertexType {
    fn new(id: VertexId, name: String) -> Self {
        VertexType {
            id,
            name,
            properties: Vec::new(),
            inherited_properties: Vec::new(),
            external_key: Vec::new(),
            is_from_join_table: false,
            parent_type: None,
            inheritance_level: 0,
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        }
    }

    pub fn property_by_name(&self, name: &str) -> Option<&ModelProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn inherited_property_by_name(&self, name: &str) -> Option<&ModelProperty> {
        self.inherited_properties.iter().find(|p| p.name == name)
    }

    /// Own properties followed by inherited ones
    pub fn all_properties(&self) -> impl Iterator<Item = &ModelProperty> + '_ {
        self.properties.iter().chain(self.inherited_properties.iter())
    }

    /// Adds a property unless one with the same name exists. Returns whether
    /// it was added.
    pub fn add_property(&mut self, property: ModelProperty) -> bool {
        if self.property_by_name(&property.name).is_some() {
            return false;
        }
        self.properties.push(property);
        true
    }

    pub fn add_inherited_property(&mut self, property: ModelProperty) -> bool {
        if self.inherited_property_by_name(&property.name).is_some() {
            return false;
        }
        self.inherited_properties.push(property);
        true
    }

    pub fn add_out_edge(&mut self, edge: EdgeId) {
        if !self.out_edges.contains(&edge) {
            self.out_edges.push(edge);
        }
    }

    pub fn add_in_edge(&mut self, edge: EdgeId) {
        if !self.in_edges.contains(&edge) {
            self.in_edges.push(edge);
        }
    }

    pub fn remove_edge(&mut self, edge: EdgeId) {
        self.out_edges.retain(|e| *e != edge);
        self.in_edges.retain(|e| *e != edge);
    }
}

#[derive(Debug, Clone)]
pub struct EdgeType {
    pub id: EdgeId,
    pub name: String,
    pub properties: Vec<ModelProperty>,
    pub in_vertex: VertexId,
    /// Only set on aggregator edges; plain edges take their source implicitly
    pub out_vertex: Option<VertexId>,
    pub relationships_represented: usize,
    pub is_aggregator: bool,
}

impl EdgeType {
    pub fn property_by_name(&self, name: &str) -> Option<&ModelProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A join vertex type collapsed into one direct edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorEdge {
    pub out_vertex_name: String,
    pub in_vertex_name: String,
    pub edge: EdgeId,
}

#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    vertex_arena: Vec<VertexType>,
    vertex_order: Vec<VertexId>,
    edge_arena: Vec<EdgeType>,
    edge_order: Vec<EdgeId>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== vertices =====

    pub fn new_vertex(&mut self, name: impl Into<String>) -> VertexId {
        let id = VertexId(self.vertex_arena.len());
        self.vertex_arena.push(VertexType::new(id, name.into()));
        self.vertex_order.push(id);
        id
    }

    pub fn vertex(&self, id: VertexId) -> &VertexType {
        &self.vertex_arena[id.0]
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> &mut VertexType {
        &mut self.vertex_arena[id.0]
    }

    /// Live vertex types, in model order
    pub fn vertices(&self) -> impl Iterator<Item = &VertexType> + '_ {
        self.vertex_order.iter().map(move |id| &self.vertex_arena[id.0])
    }

    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertex_order.clone()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_order.len()
    }

    pub fn is_live_vertex(&self, id: VertexId) -> bool {
        self.vertex_order.contains(&id)
    }

    pub fn vertex_by_name(&self, name: &str) -> Option<&VertexType> {
        self.vertices().find(|v| v.name == name)
    }

    pub fn vertex_id_by_name(&self, name: &str) -> Option<VertexId> {
        self.vertex_by_name(name).map(|v| v.id)
    }

    pub fn require_vertex(&self, name: &str) -> Result<&VertexType> {
        self.vertex_by_name(name)
            .ok_or_else(|| GraphSchemaError::VertexType {
                vertex_type: name.to_string(),
            })
    }

    /// Drops a vertex type from the live set; the handle stays readable
    pub fn remove_vertex(&mut self, id: VertexId) {
        self.vertex_order.retain(|v| *v != id);
    }

    /// Stable sort by inheritance level, then name
    pub fn sort_vertices_by_level_and_name(&mut self) {
        let arena = &self.vertex_arena;
        self.vertex_order.sort_by(|a, b| {
            let (va, vb) = (&arena[a.0], &arena[b.0]);
            va.inheritance_level
                .cmp(&vb.inheritance_level)
                .then_with(|| va.name.cmp(&vb.name))
        });
    }

    pub fn max_inheritance_level(&self) -> usize {
        self.vertices()
            .map(|v| v.inheritance_level)
            .max()
            .unwrap_or(0)
    }

    /// The vertex type followed by its ancestors, nearest first. The walk
    /// stops after `max_depth` hops or when a type repeats.
    pub fn parent_chain(&self, id: VertexId, max_depth: usize) -> Vec<VertexId> {
        let mut chain = vec![id];
        let mut current = id;

        for _ in 0..max_depth {
            let Some(parent) = self.vertex(current).parent_type else {
                break;
            };
            if chain.contains(&parent) {
                warn!(
                    "Cyclic parent link detected at vertex type '{}'",
                    self.vertex(current).name
                );
                break;
            }
            chain.push(parent);
            current = parent;
        }

        chain
    }

    // ===== edges =====

    pub fn new_edge(&mut self, name: impl Into<String>, in_vertex: VertexId) -> EdgeId {
        let id = EdgeId(self.edge_arena.len());
        self.edge_arena.push(EdgeType {
            id,
            name: name.into(),
            properties: Vec::new(),
            in_vertex,
            out_vertex: None,
            relationships_represented: 0,
            is_aggregator: false,
        });
        self.edge_order.push(id);
        id
    }

    pub fn edge(&self, id: EdgeId) -> &EdgeType {
        &self.edge_arena[id.0]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut EdgeType {
        &mut self.edge_arena[id.0]
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeType> + '_ {
        self.edge_order.iter().map(move |id| &self.edge_arena[id.0])
    }

    pub fn edge_count(&self) -> usize {
        self.edge_order.len()
    }

    pub fn is_live_edge(&self, id: EdgeId) -> bool {
        self.edge_order.contains(&id)
    }

    pub fn edge_by_name(&self, name: &str) -> Option<&EdgeType> {
        self.edges().find(|e| e.name == name)
    }

    pub fn edge_id_by_name(&self, name: &str) -> Option<EdgeId> {
        self.edge_by_name(name).map(|e| e.id)
    }

    pub fn require_edge(&self, name: &str) -> Result<&EdgeType> {
        self.edge_by_name(name).ok_or_else(|| GraphSchemaError::EdgeType {
            edge_type: name.to_string(),
        })
    }

    /// Links an edge type to its endpoints' edge lists (no duplicates)
    pub fn attach_edge(&mut self, edge: EdgeId, out_vertex: VertexId, in_vertex: VertexId) {
        self.vertex_mut(out_vertex).add_out_edge(edge);
        self.vertex_mut(in_vertex).add_in_edge(edge);
    }

    /// Drops an edge type from the live set and from every vertex's edge lists
    pub fn remove_edge(&mut self, id: EdgeId) {
        self.edge_order.retain(|e| *e != id);
        for vertex in self.vertex_arena.iter_mut() {
            vertex.remove_edge(id);
        }
    }
}
