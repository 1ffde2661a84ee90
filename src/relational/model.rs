//! In-memory relational schema model
//!
//! Entities, attributes, keys and canonical relationships are stored in arenas
//! owned by [`DataBaseSchema`] and addressed by small copyable handles. Two
//! relationships with identical content are still two distinct relationships:
//! every map keyed by a relationship (or an entity) uses the handle, never the
//! structural content.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::metadata::ProductInfo;

/// Handle of an [`Entity`] inside its [`DataBaseSchema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub usize);

/// Handle of a [`CanonicalRelationship`] inside its [`DataBaseSchema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RelationshipId(pub usize);

/// Handle of a [`HierarchicalBag`] inside its [`DataBaseSchema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BagId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    /// 1-based position inside the owning entity
    pub ordinal_position: usize,
    pub data_type: String,
    pub belonging_entity: EntityId,
}

impl Attribute {
    pub fn new(
        name: impl Into<String>,
        ordinal_position: usize,
        data_type: impl Into<String>,
        belonging_entity: EntityId,
    ) -> Self {
        Attribute {
            name: name.into(),
            ordinal_position,
            data_type: data_type.into(),
            belonging_entity,
        }
    }
}

/// Ordered key columns. Order matters: a foreign key and the primary key it
/// references are aligned by index, not by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimaryKey {
    pub attributes: Vec<Attribute>,
}

impl PrimaryKey {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        PrimaryKey { attributes }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn contains(&self, attribute_name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == attribute_name)
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForeignKey {
    pub attributes: Vec<Attribute>,
}

impl ForeignKey {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        ForeignKey { attributes }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn contains(&self, attribute_name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == attribute_name)
    }
}

/// One resolved foreign-key → primary-key link between two entities
#[derive(Debug, Clone)]
pub struct CanonicalRelationship {
    pub id: RelationshipId,
    /// Entity holding the foreign key
    pub foreign_entity: EntityId,
    /// Entity whose primary key is referenced
    pub parent_entity: EntityId,
    pub foreign_key: ForeignKey,
    pub primary_key: PrimaryKey,
}

impl CanonicalRelationship {
    /// Pairs of (foreign column, referenced column), aligned by position
    pub fn column_pairs(&self) -> Vec<(&str, &str)> {
        self.foreign_key
            .attributes
            .iter()
            .zip(self.primary_key.attributes.iter())
            .map(|(f, p)| (f.name.as_str(), p.name.as_str()))
            .collect()
    }
}

/// Orientation of the direct edge that replaces a many-to-many join table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinDirection {
    #[default]
    Direct,
    Inverse,
}

/// How an inheritance hierarchy is laid out over physical tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InheritancePattern {
    /// One table for the whole hierarchy, rows told apart by a discriminator
    TablePerHierarchy,
    /// One table per class, linked to the parent table by the shared key
    TablePerType,
    /// One self-contained table per concrete class
    TablePerConcreteType,
}

impl fmt::Display for InheritancePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InheritancePattern::TablePerHierarchy => f.write_str("table-per-hierarchy"),
            InheritancePattern::TablePerType => f.write_str("table-per-type"),
            InheritancePattern::TablePerConcreteType => f.write_str("table-per-concrete-type"),
        }
    }
}

/// All entities of one inheritance root
#[derive(Debug, Clone)]
pub struct HierarchicalBag {
    pub id: BagId,
    pub pattern: InheritancePattern,
    depth_to_entities: BTreeMap<usize, Vec<EntityId>>,
    pub discriminator_column: Option<String>,
    /// entity name -> discriminator value
    pub discriminator_values: HashMap<String, String>,
}

impl HierarchicalBag {
    pub fn new(id: BagId, pattern: InheritancePattern) -> Self {
        HierarchicalBag {
            id,
            pattern,
            depth_to_entities: BTreeMap::new(),
            discriminator_column: None,
            discriminator_values: HashMap::new(),
        }
    }

    pub fn add_entity(&mut self, depth: usize, entity: EntityId) {
        let entities = self.depth_to_entities.entry(depth).or_default();
        if !entities.contains(&entity) {
            entities.push(entity);
        }
    }

    pub fn entities_at_depth(&self, depth: usize) -> &[EntityId] {
        self.depth_to_entities
            .get(&depth)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn depth_to_entities(&self) -> &BTreeMap<usize, Vec<EntityId>> {
        &self.depth_to_entities
    }

    pub fn all_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.depth_to_entities.values().flatten().copied()
    }

    pub fn discriminator_value(&self, entity_name: &str) -> Option<&str> {
        self.discriminator_values.get(entity_name).map(|s| s.as_str())
    }
}

/// In-memory representation of a relational table
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub schema_name: Option<String>,
    pub data_source: String,
    attributes: Vec<Attribute>,
    inherited_attributes: Vec<Attribute>,
    pub primary_key: PrimaryKey,
    pub foreign_keys: Vec<ForeignKey>,
    pub out_relationships: Vec<RelationshipId>,
    pub in_relationships: Vec<RelationshipId>,
    pub inherited_out_relationships: Vec<RelationshipId>,
    pub inherited_in_relationships: Vec<RelationshipId>,
    pub parent_entity: Option<EntityId>,
    /// 0 for hierarchy roots and entities outside any hierarchy
    pub inheritance_level: usize,
    pub hierarchical_bag: Option<BagId>,
    pub n2n_direction: JoinDirection,
    pub n2n_relationship_name: Option<String>,
}

impl Entity {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        schema_name: Option<String>,
        data_source: impl Into<String>,
    ) -> Self {
        Entity {
            id,
            name: name.into(),
            schema_name,
            data_source: data_source.into(),
            attributes: Vec::new(),
            inherited_attributes: Vec::new(),
            primary_key: PrimaryKey::default(),
            foreign_keys: Vec::new(),
            out_relationships: Vec::new(),
            in_relationships: Vec::new(),
            inherited_out_relationships: Vec::new(),
            inherited_in_relationships: Vec::new(),
            parent_entity: None,
            inheritance_level: 0,
            hierarchical_bag: None,
            n2n_direction: JoinDirection::Direct,
            n2n_relationship_name: None,
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn inherited_attributes(&self) -> &[Attribute] {
        &self.inherited_attributes
    }

    /// Appends an attribute at the next ordinal position
    pub fn add_attribute(&mut self, name: impl Into<String>, data_type: impl Into<String>) -> &Attribute {
        let ordinal = self.attributes.len() + 1;
        self.attributes
            .push(Attribute::new(name, ordinal, data_type, self.id));
        &self.attributes[ordinal - 1]
    }

    /// Moves an existing attribute (e.g. taken from another entity) into this one
    pub fn adopt_attribute(&mut self, mut attribute: Attribute) {
        attribute.belonging_entity = self.id;
        self.attributes.push(attribute);
        self.renumber_attributes();
    }

    pub fn add_inherited_attribute(&mut self, attribute: Attribute) {
        if !self
            .inherited_attributes
            .iter()
            .any(|a| a.name == attribute.name)
        {
            self.inherited_attributes.push(attribute);
        }
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_by_name_ignore_case(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn attribute_by_ordinal(&self, ordinal: usize) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.ordinal_position == ordinal)
    }

    pub fn has_attribute_ignore_case(&self, name: &str) -> bool {
        self.attribute_by_name_ignore_case(name).is_some()
    }

    /// Removes an attribute (case-insensitive) and renumbers the rest
    pub fn remove_attribute_ignore_case(&mut self, name: &str) -> Option<Attribute> {
        let index = self
            .attributes
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))?;
        let removed = self.attributes.remove(index);
        self.renumber_attributes();
        Some(removed)
    }

    fn renumber_attributes(&mut self) {
        for (i, attribute) in self.attributes.iter_mut().enumerate() {
            attribute.ordinal_position = i + 1;
        }
    }

    /// A join table that can collapse into a single edge: exactly two foreign
    /// keys whose columns together are the primary key.
    pub fn is_aggregable_join_table(&self) -> bool {
        if self.foreign_keys.len() != 2 || self.primary_key.is_empty() {
            return false;
        }

        let mut fk_columns: Vec<&str> = self
            .foreign_keys
            .iter()
            .flat_map(|fk| fk.attributes.iter().map(|a| a.name.as_str()))
            .collect();
        fk_columns.sort_unstable();
        fk_columns.dedup();

        let mut pk_columns = self.primary_key.attribute_names();
        pk_columns.sort_unstable();

        fk_columns == pk_columns
    }
}

/// Root aggregate of one mapping run
#[derive(Debug, Clone, Default)]
pub struct DataBaseSchema {
    pub product: ProductInfo,
    entities: Vec<Entity>,
    entity_order: Vec<EntityId>,
    relationships: Vec<CanonicalRelationship>,
    bags: Vec<HierarchicalBag>,
}

impl DataBaseSchema {
    pub fn new(product: ProductInfo) -> Self {
        DataBaseSchema {
            product,
            ..Default::default()
        }
    }

    pub fn add_entity(
        &mut self,
        name: impl Into<String>,
        schema_name: Option<String>,
        data_source: impl Into<String>,
    ) -> EntityId {
        let id = EntityId(self.entities.len());
        self.entities
            .push(Entity::new(id, name, schema_name, data_source));
        self.entity_order.push(id);
        id
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0]
    }

    /// Two distinct entities at once (panics if `a == b`)
    pub fn entity_pair_mut(&mut self, a: EntityId, b: EntityId) -> (&mut Entity, &mut Entity) {
        assert_ne!(a, b, "entity_pair_mut requires two distinct entities");
        if a.0 < b.0 {
            let (left, right) = self.entities.split_at_mut(b.0);
            (&mut left[a.0], &mut right[0])
        } else {
            let (left, right) = self.entities.split_at_mut(a.0);
            (&mut right[0], &mut left[b.0])
        }
    }

    /// Entities in schema order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entity_order.iter().map(move |id| &self.entities[id.0])
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entity_order.clone()
    }

    pub fn entity_count(&self) -> usize {
        self.entity_order.len()
    }

    /// Exact name match first, then case-insensitive
    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities()
            .find(|e| e.name == name)
            .or_else(|| self.entities().find(|e| e.name.eq_ignore_ascii_case(name)))
    }

    pub fn entity_id_by_name(&self, name: &str) -> Option<EntityId> {
        self.entity_by_name(name).map(|e| e.id)
    }

    /// Name lookup restricted to `schema_name` when one is given. Entities
    /// recorded without a schema match any schema.
    pub fn entity_id_in_schema(&self, schema_name: Option<&str>, name: &str) -> Option<EntityId> {
        let Some(schema_name) = schema_name else {
            return self.entity_id_by_name(name);
        };
        let in_schema = |e: &&Entity| {
            e.schema_name
                .as_deref()
                .map_or(true, |s| s.eq_ignore_ascii_case(schema_name))
        };
        self.entities()
            .filter(in_schema)
            .find(|e| e.name == name)
            .or_else(|| {
                self.entities()
                    .filter(in_schema)
                    .find(|e| e.name.eq_ignore_ascii_case(name))
            })
            .map(|e| e.id)
    }

    /// Registers a relationship and appends it to the foreign entity's
    /// outgoing list. Incoming lists are derived in a separate pass.
    pub fn add_relationship(
        &mut self,
        foreign_entity: EntityId,
        parent_entity: EntityId,
        foreign_key: ForeignKey,
        primary_key: PrimaryKey,
    ) -> RelationshipId {
        let id = RelationshipId(self.relationships.len());
        self.relationships.push(CanonicalRelationship {
            id,
            foreign_entity,
            parent_entity,
            foreign_key,
            primary_key,
        });
        self.entities[foreign_entity.0].out_relationships.push(id);
        id
    }

    pub fn relationship(&self, id: RelationshipId) -> &CanonicalRelationship {
        &self.relationships[id.0]
    }

    pub fn relationships(&self) -> &[CanonicalRelationship] {
        &self.relationships
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn add_bag(&mut self, pattern: InheritancePattern) -> BagId {
        let id = BagId(self.bags.len());
        self.bags.push(HierarchicalBag::new(id, pattern));
        id
    }

    pub fn bag(&self, id: BagId) -> &HierarchicalBag {
        &self.bags[id.0]
    }

    pub fn bag_mut(&mut self, id: BagId) -> &mut HierarchicalBag {
        &mut self.bags[id.0]
    }

    pub fn bags(&self) -> &[HierarchicalBag] {
        &self.bags
    }

    pub fn max_inheritance_level(&self) -> usize {
        self.entities()
            .map(|e| e.inheritance_level)
            .max()
            .unwrap_or(0)
    }

    /// Stable re-sort of the schema order by inheritance level, then name
    pub fn sort_entities_by_level_and_name(&mut self) {
        let entities = &self.entities;
        self.entity_order.sort_by(|a, b| {
            let (ea, eb) = (&entities[a.0], &entities[b.0]);
            ea.inheritance_level
                .cmp(&eb.inheritance_level)
                .then_with(|| ea.name.cmp(&eb.name))
        });
    }
}
