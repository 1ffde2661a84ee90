pub mod aggregation;
pub mod errors;
pub mod graph_builder;
pub mod graph_model;
pub mod mapping_rules;
pub mod name_resolver;
pub mod type_mapper;

// Re-export commonly used types
pub use aggregation::perform_many2many_aggregation;
pub use errors::GraphSchemaError;
pub use graph_builder::GraphSchemaBuilder;
pub use graph_model::{
    AggregatorEdge, EdgeId, EdgeType, GraphModel, ModelProperty, PropertyOwner, VertexId,
    VertexType,
};
pub use mapping_rules::{EEClassMapper, EVClassMapper, MappingRules};
pub use name_resolver::{resolver_for, JavaNameResolver, NameResolver, OriginalNameResolver};
pub use type_mapper::{DefaultTypeMapper, PropertyType, TypeMapper};
