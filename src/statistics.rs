//! Mapping-run statistics
//!
//! Counters are written by each phase as a side effect. The engine never reads
//! them back; they exist for logging and for the report printed by the binary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunningStep {
    #[default]
    NotStarted,
    SourceSchemaBuilding,
    InheritanceDetection,
    GraphModelBuilding,
    Aggregation,
    Completed,
}

impl fmt::Display for RunningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunningStep::NotStarted => "not started",
            RunningStep::SourceSchemaBuilding => "source schema building",
            RunningStep::InheritanceDetection => "inheritance detection",
            RunningStep::GraphModelBuilding => "graph model building",
            RunningStep::Aggregation => "many-to-many aggregation",
            RunningStep::Completed => "completed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub running_step: RunningStep,

    // Source schema
    pub total_entities: usize,
    pub built_entities: usize,
    pub entities_without_primary_key: usize,
    pub total_relationships: usize,
    pub built_relationships: usize,
    pub total_records: u64,

    // Inheritance
    pub detected_hierarchies: usize,

    // Graph model
    pub total_vertex_types: usize,
    pub built_vertex_types: usize,
    pub total_edge_types: usize,
    pub built_edge_types: usize,
    pub skipped_edges: usize,

    // Aggregation
    pub aggregated_join_tables: usize,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        *self = Statistics {
            start_time: Some(Utc::now()),
            ..Default::default()
        };
    }

    pub fn enter(&mut self, step: RunningStep) {
        self.running_step = step;
    }

    pub fn finish(&mut self) {
        self.running_step = RunningStep::Completed;
        self.end_time = Some(Utc::now());
    }

    pub fn elapsed_ms(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Running step: {}\n", self.running_step));
        out.push_str(&format!(
            "Entities: {}/{} ({} without primary key)\n",
            self.built_entities, self.total_entities, self.entities_without_primary_key
        ));
        out.push_str(&format!(
            "Relationships: {}/{}\n",
            self.built_relationships, self.total_relationships
        ));
        if self.total_records > 0 {
            out.push_str(&format!("Records: {}\n", self.total_records));
        }
        if self.detected_hierarchies > 0 {
            out.push_str(&format!("Hierarchies: {}\n", self.detected_hierarchies));
        }
        out.push_str(&format!(
            "Vertex types: {}/{}\n",
            self.built_vertex_types, self.total_vertex_types
        ));
        out.push_str(&format!(
            "Edge types: {}/{} ({} skipped)\n",
            self.built_edge_types, self.total_edge_types, self.skipped_edges
        ));
        if self.aggregated_join_tables > 0 {
            out.push_str(&format!(
                "Aggregated join tables: {}\n",
                self.aggregated_join_tables
            ));
        }
        if let Some(ms) = self.elapsed_ms() {
            out.push_str(&format!("Elapsed: {} ms\n", ms));
        }
        out
    }
}
