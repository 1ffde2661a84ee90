//! relgraph - Relational-to-graph schema mapping
//!
//! This crate turns relational catalog metadata into a property-graph schema:
//! - Relational schema introspection through a pluggable metadata source
//! - Vertex and edge type synthesis with configurable naming
//! - Many-to-many join table aggregation into direct edges
//! - ORM (Hibernate) inheritance detection
//! - Class-mapping rules linking every graph element back to its tables

pub mod config;
pub mod graph_catalog;
pub mod inheritance;
pub mod mapper;
pub mod relational;
pub mod report;
pub mod statistics;

pub use mapper::{MappingError, SchemaMapper};
