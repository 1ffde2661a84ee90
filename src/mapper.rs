//! Mapping pipeline
//!
//! [`SchemaMapper`] owns everything one mapping run produces and runs the
//! phases strictly in order:
//!
//! 1. relational schema introspection
//! 2. inheritance detection (only with a descriptor)
//! 3. graph model synthesis
//! 4. many-to-many aggregation (only under `naive-aggregate`)

use log::{info, warn};
use thiserror::Error;

use crate::config::MapperConfig;
use crate::graph_catalog::aggregation;
use crate::graph_catalog::errors::GraphSchemaError;
use crate::graph_catalog::graph_builder::GraphSchemaBuilder;
use crate::graph_catalog::graph_model::GraphModel;
use crate::graph_catalog::mapping_rules::MappingRules;
use crate::graph_catalog::name_resolver::resolver_for;
use crate::graph_catalog::type_mapper::{DefaultTypeMapper, TypeMapper};
use crate::inheritance::descriptor::{DescriptorError, InheritanceDescriptor};
use crate::inheritance::detector::InheritanceDetector;
use crate::relational::builder::{RelationalSchemaBuilder, TableFilter};
use crate::relational::errors::RelationalSchemaError;
use crate::relational::metadata::MetadataSource;
use crate::relational::model::DataBaseSchema;
use crate::report::MappingReport;
use crate::statistics::{RunningStep, Statistics};

#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    RelationalSchema(#[from] RelationalSchemaError),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error(transparent)]
    GraphSchema(#[from] GraphSchemaError),
}

pub type Result<T> = std::result::Result<T, MappingError>;

pub struct SchemaMapper {
    config: MapperConfig,
    source: Box<dyn MetadataSource>,
    type_mapper: Box<dyn TypeMapper>,
    schema: DataBaseSchema,
    model: GraphModel,
    rules: MappingRules,
    statistics: Statistics,
}

impl SchemaMapper {
    pub fn new(
        config: MapperConfig,
        source: Box<dyn MetadataSource>,
        type_mapper: Box<dyn TypeMapper>,
    ) -> Self {
        SchemaMapper {
            config,
            source,
            type_mapper,
            schema: DataBaseSchema::default(),
            model: GraphModel::new(),
            rules: MappingRules::new(),
            statistics: Statistics::new(),
        }
    }

    pub fn with_default_types(config: MapperConfig, source: Box<dyn MetadataSource>) -> Self {
        Self::new(config, source, Box::new(DefaultTypeMapper))
    }

    /// Full pipeline
    pub fn run(&mut self) -> Result<()> {
        self.build_source_database_schema()?;
        self.apply_inheritance()?;
        self.build_graph_model();
        if self.config.strategy.aggregates() {
            self.perform_many2many_aggregation()?;
        }
        self.statistics.finish();

        info!(
            "Mapping finished: {} vertex types, {} edge types",
            self.model.vertex_count(),
            self.model.edge_count()
        );
        Ok(())
    }

    pub fn build_source_database_schema(&mut self) -> Result<()> {
        self.statistics.start();
        self.statistics.enter(RunningStep::SourceSchemaBuilding);

        let filter = TableFilter::new(
            self.config.include_tables.clone(),
            self.config.exclude_tables.clone(),
        );
        let builder =
            RelationalSchemaBuilder::new(self.source.as_ref(), &self.config.data_source, filter);
        self.schema = builder.build(&mut self.statistics)?;

        self.apply_join_table_overrides();
        Ok(())
    }

    fn apply_join_table_overrides(&mut self) {
        for join_override in &self.config.join_table_overrides {
            let Some(entity_id) = self.schema.entity_id_by_name(&join_override.table) else {
                warn!(
                    "Join table override for unknown table '{}' ignored",
                    join_override.table
                );
                continue;
            };
            let entity = self.schema.entity_mut(entity_id);
            entity.n2n_direction = join_override.direction;
            entity.n2n_relationship_name = join_override.relationship_name.clone();
        }
    }

    /// Applies the configured inheritance descriptor, if any. Returns the
    /// number of hierarchies detected.
    pub fn apply_inheritance(&mut self) -> Result<usize> {
        let Some(path) = self.config.inheritance_descriptor.clone() else {
            return Ok(0);
        };
        self.statistics.enter(RunningStep::InheritanceDetection);
        info!("Reading inheritance descriptor {}", path.display());

        let descriptor = InheritanceDescriptor::from_file(&path)?;
        Ok(self.apply_inheritance_descriptor(&descriptor))
    }

    pub fn apply_inheritance_descriptor(&mut self, descriptor: &InheritanceDescriptor) -> usize {
        InheritanceDetector::new(descriptor).apply(&mut self.schema, &mut self.statistics)
    }

    pub fn build_graph_model(&mut self) {
        self.statistics.enter(RunningStep::GraphModelBuilding);

        let resolver = resolver_for(self.config.naming_convention);
        GraphSchemaBuilder::new(resolver.as_ref(), self.type_mapper.as_ref()).build(
            &self.schema,
            &mut self.model,
            &mut self.rules,
            &mut self.statistics,
        );
    }

    pub fn perform_many2many_aggregation(&mut self) -> Result<usize> {
        self.statistics.enter(RunningStep::Aggregation);
        let collapsed = aggregation::perform_many2many_aggregation(
            &self.schema,
            &mut self.model,
            &mut self.rules,
            &mut self.statistics,
        )?;
        Ok(collapsed)
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn schema(&self) -> &DataBaseSchema {
        &self.schema
    }

    pub fn graph_model(&self) -> &GraphModel {
        &self.model
    }

    pub fn rules(&self) -> &MappingRules {
        &self.rules
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn report(&self) -> MappingReport {
        MappingReport::new(&self.schema, &self.model, &self.rules, &self.statistics)
    }
}
