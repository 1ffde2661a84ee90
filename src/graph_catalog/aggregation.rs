//! Many-to-many aggregation
//!
//! A vertex type derived from a two-column join table, with exactly two
//! outgoing edge types, is replaced by one direct edge type between the two
//! vertex types the join table links. Single pass: vertex types created or
//! exposed by a collapse are not revisited in the same call.

use log::{debug, info, warn};

use super::errors::Result;
use super::graph_model::{AggregatorEdge, EdgeId, GraphModel, ModelProperty, PropertyOwner, VertexId};
use super::mapping_rules::{EEClassMapper, MappingRules};
use crate::relational::model::{DataBaseSchema, JoinDirection};
use crate::statistics::Statistics;

/// Collapses every eligible join vertex type. Returns how many were collapsed.
pub fn perform_many2many_aggregation(
    schema: &DataBaseSchema,
    model: &mut GraphModel,
    rules: &mut MappingRules,
    stats: &mut Statistics,
) -> Result<usize> {
    let edges_before = model.edge_count();
    let mut collapsed = 0;

    for vertex_id in model.vertex_ids() {
        let vertex = model.vertex(vertex_id);
        if !vertex.is_from_join_table || vertex.out_edges.len() != 2 {
            continue;
        }
        if collapse_join_vertex(schema, model, rules, vertex_id)? {
            collapsed += 1;
        }
    }

    stats.aggregated_join_tables += collapsed;
    stats.built_edge_types = model.edge_count();
    info!(
        "Aggregated {} join vertex types, edge types {} -> {}",
        collapsed,
        edges_before,
        model.edge_count()
    );
    Ok(collapsed)
}

fn collapse_join_vertex(
    schema: &DataBaseSchema,
    model: &mut GraphModel,
    rules: &mut MappingRules,
    join_vertex: VertexId,
) -> Result<bool> {
    let entity_id = rules.require_entity_for_vertex(model, join_vertex)?;
    let entity = schema.entity(entity_id);

    let vertex = model.vertex(join_vertex);
    let (first, second) = (vertex.out_edges[0], vertex.out_edges[1]);
    let (out_vertex, in_vertex) = match entity.n2n_direction {
        JoinDirection::Direct => (model.edge(first).in_vertex, model.edge(second).in_vertex),
        JoinDirection::Inverse => (model.edge(second).in_vertex, model.edge(first).in_vertex),
    };

    let edge_name = entity
        .n2n_relationship_name
        .clone()
        .unwrap_or_else(|| vertex.name.clone());
    if model.edge_by_name(&edge_name).is_some() {
        warn!(
            "Edge type '{}' already exists, join vertex type '{}' left as is",
            edge_name, vertex.name
        );
        return Ok(false);
    }

    // join vertex non-key properties first, then the two collapsed edges'
    let join_properties: Vec<ModelProperty> = vertex
        .properties
        .iter()
        .filter(|p| !p.from_primary_key)
        .cloned()
        .collect();
    let candidates: Vec<ModelProperty> = join_properties
        .iter()
        .chain(model.edge(first).properties.iter())
        .chain(model.edge(second).properties.iter())
        .cloned()
        .collect();

    let aggregator = model.new_edge(edge_name.as_str(), in_vertex);
    let mut properties: Vec<ModelProperty> = Vec::with_capacity(candidates.len());
    for mut property in candidates {
        if properties.iter().any(|p| p.name == property.name) {
            continue;
        }
        property.ordinal_position = properties.len() + 1;
        property.owner = PropertyOwner::Edge(aggregator);
        properties.push(property);
    }

    let mut mapper = EEClassMapper::new(entity_id, aggregator);
    for property in &join_properties {
        if let Some(attribute) = rules.attribute_name_for(model, join_vertex, &property.name) {
            mapper.names.insert(attribute, property.name.as_str());
        }
    }

    let removed = release_collapsed_edges(model, [first, second]);

    let edge = model.edge_mut(aggregator);
    edge.properties = properties;
    edge.out_vertex = Some(out_vertex);
    edge.relationships_represented = 1;
    edge.is_aggregator = true;
    model.attach_edge(aggregator, out_vertex, in_vertex);
    model.remove_vertex(join_vertex);

    rules.add_ee_mapper(mapper);
    rules.register_aggregator(
        join_vertex,
        AggregatorEdge {
            out_vertex_name: model.vertex(out_vertex).name.clone(),
            in_vertex_name: model.vertex(in_vertex).name.clone(),
            edge: aggregator,
        },
    );

    debug!(
        "Join vertex type '{}' collapsed into edge '{}' ({} -> {}), {} edge types dropped",
        model.vertex(join_vertex).name,
        edge_name,
        model.vertex(out_vertex).name,
        model.vertex(in_vertex).name,
        removed
    );
    Ok(true)
}

/// Decrements each edge's relationship counter and drops the ones that reach
/// zero. Returns how many were dropped.
fn release_collapsed_edges(model: &mut GraphModel, edges: [EdgeId; 2]) -> usize {
    let mut removed = 0;
    for edge_id in edges {
        let edge = model.edge_mut(edge_id);
        edge.relationships_represented = edge.relationships_represented.saturating_sub(1);
        if edge.relationships_represented == 0 {
            model.remove_edge(edge_id);
            removed += 1;
        }
    }
    removed
}
