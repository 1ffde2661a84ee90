//! Serializable summary of a finished mapping run

use serde::Serialize;
use std::collections::BTreeMap;

use crate::graph_catalog::graph_model::{EdgeId, GraphModel, ModelProperty};
use crate::graph_catalog::mapping_rules::MappingRules;
use crate::graph_catalog::type_mapper::PropertyType;
use crate::relational::model::{DataBaseSchema, InheritancePattern};
use crate::statistics::Statistics;

#[derive(Debug, Clone, Serialize)]
pub struct PropertyReport {
    pub name: String,
    pub ordinal_position: usize,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub original_type: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub from_primary_key: bool,
}

impl From<&ModelProperty> for PropertyReport {
    fn from(property: &ModelProperty) -> Self {
        PropertyReport {
            name: property.name.clone(),
            ordinal_position: property.ordinal_position,
            property_type: property.property_type,
            original_type: property.original_type.clone(),
            from_primary_key: property.from_primary_key,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VertexTypeReport {
    pub name: String,
    pub source_entities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub inheritance_level: usize,
    pub external_key: Vec<String>,
    pub properties: Vec<PropertyReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inherited_properties: Vec<PropertyReport>,
    pub out_edges: Vec<String>,
    pub in_edges: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeTypeReport {
    pub name: String,
    pub out_vertices: Vec<String>,
    pub in_vertex: String,
    pub relationships_represented: usize,
    pub is_aggregator: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregatorEdgeReport {
    pub join_vertex: String,
    pub edge: String,
    pub out_vertex: String,
    pub in_vertex: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HierarchyReport {
    pub pattern: InheritancePattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator_column: Option<String>,
    /// inheritance level -> entity names
    pub levels: BTreeMap<usize, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MappingReport {
    pub product_name: String,
    pub vertex_types: Vec<VertexTypeReport>,
    pub edge_types: Vec<EdgeTypeReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregator_edges: Vec<AggregatorEdgeReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hierarchies: Vec<HierarchyReport>,
    pub statistics: Statistics,
}

impl MappingReport {
    pub fn new(
        schema: &DataBaseSchema,
        model: &GraphModel,
        rules: &MappingRules,
        statistics: &Statistics,
    ) -> Self {
        let edge_names = |edges: &[EdgeId]| -> Vec<String> {
            edges
                .iter()
                .filter(|e| model.is_live_edge(**e))
                .map(|e| model.edge(*e).name.clone())
                .collect()
        };

        let vertex_types = model
            .vertices()
            .map(|vertex| VertexTypeReport {
                name: vertex.name.clone(),
                source_entities: rules
                    .ev_mappers_by_vertex(vertex.id)
                    .iter()
                    .map(|m| schema.entity(m.entity).name.clone())
                    .collect(),
                parent: vertex.parent_type.map(|p| model.vertex(p).name.clone()),
                inheritance_level: vertex.inheritance_level,
                external_key: vertex.external_key.clone(),
                properties: vertex.properties.iter().map(PropertyReport::from).collect(),
                inherited_properties: vertex
                    .inherited_properties
                    .iter()
                    .map(PropertyReport::from)
                    .collect(),
                out_edges: edge_names(&vertex.out_edges),
                in_edges: edge_names(&vertex.in_edges),
            })
            .collect();

        let edge_types = model
            .edges()
            .map(|edge| EdgeTypeReport {
                name: edge.name.clone(),
                out_vertices: model
                    .vertices()
                    .filter(|v| v.out_edges.contains(&edge.id))
                    .map(|v| v.name.clone())
                    .collect(),
                in_vertex: model.vertex(edge.in_vertex).name.clone(),
                relationships_represented: edge.relationships_represented,
                is_aggregator: edge.is_aggregator,
                properties: edge.properties.iter().map(PropertyReport::from).collect(),
            })
            .collect();

        let aggregator_edges = rules
            .aggregators()
            .map(|(join_vertex, aggregator)| AggregatorEdgeReport {
                join_vertex: model.vertex(join_vertex).name.clone(),
                edge: model.edge(aggregator.edge).name.clone(),
                out_vertex: aggregator.out_vertex_name.clone(),
                in_vertex: aggregator.in_vertex_name.clone(),
            })
            .collect();

        let hierarchies = schema
            .bags()
            .iter()
            .map(|bag| HierarchyReport {
                pattern: bag.pattern,
                discriminator_column: bag.discriminator_column.clone(),
                levels: bag
                    .depth_to_entities()
                    .iter()
                    .map(|(depth, entities)| {
                        let names = entities
                            .iter()
                            .map(|e| schema.entity(*e).name.clone())
                            .collect();
                        (*depth, names)
                    })
                    .collect(),
            })
            .collect();

        MappingReport {
            product_name: schema.product.product_name.clone(),
            vertex_types,
            edge_types,
            aggregator_edges,
            hierarchies,
            statistics: statistics.clone(),
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
