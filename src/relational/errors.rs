use thiserror::Error;

use super::metadata::MetadataError;

/// Failure while building the relational schema. Any of these aborts the
/// build; no partial schema is handed back.
#[derive(Debug, Error)]
pub enum RelationalSchemaError {
    #[error("Introspection failed while {phase}: {source}")]
    Introspection {
        phase: String,
        #[source]
        source: MetadataError,
    },
}

impl RelationalSchemaError {
    /// Wraps a metadata failure with the phase it happened in
    pub fn introspection(phase: impl Into<String>) -> impl FnOnce(MetadataError) -> Self {
        let phase = phase.into();
        move |source| RelationalSchemaError::Introspection { phase, source }
    }
}

pub type Result<T> = std::result::Result<T, RelationalSchemaError>;
