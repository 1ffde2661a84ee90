pub mod builder;
pub mod errors;
pub mod metadata;
pub mod model;
pub mod vendor;

pub use builder::{RelationalSchemaBuilder, TableFilter};
pub use errors::RelationalSchemaError;
pub use metadata::{MetadataError, MetadataSource, SnapshotSource, SnapshotTable};
pub use model::{
    Attribute, CanonicalRelationship, DataBaseSchema, Entity, EntityId, HierarchicalBag,
    InheritancePattern, JoinDirection, RelationshipId,
};
pub use vendor::Vendor;
