//! # Graph Schema Error Types
//!
//! Lookups against the graph model and the class-mapping rule store that
//! found nothing to return.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphSchemaError {
    #[error("No vertex type found for `{vertex_type}`")]
    VertexType { vertex_type: String },
    #[error("No edge type found for `{edge_type}`.")]
    EdgeType { edge_type: String },
    #[error("Vertex type `{vertex_type}` is not mapped to any entity")]
    UnmappedVertexType { vertex_type: String },
}

pub type Result<T> = std::result::Result<T, GraphSchemaError>;
