//! Inheritance detection
//!
//! Rewrites an introspected [`DataBaseSchema`] so that every hierarchy the
//! descriptor declares shows up as parent-linked entities sharing one
//! [`HierarchicalBag`](crate::relational::model::HierarchicalBag):
//!
//! - table-per-hierarchy: a new child entity per subclass, owning the columns
//!   its `<property>` elements name (moved out of the shared table)
//! - table-per-type: the subclass table's entity, minus its key columns
//! - table-per-concrete-type: as table-per-type, and columns the parent also
//!   has become inherited attributes of the child
//!
//! Afterwards children inherit their parent's relationships and attributes,
//! and the schema is re-sorted by inheritance level then name.

use log::{debug, info};
use std::collections::VecDeque;

use super::descriptor::{ClassDescriptor, InheritanceDescriptor, SubclassDescriptor, SubclassKind};
use crate::relational::model::{BagId, DataBaseSchema, EntityId, InheritancePattern};
use crate::statistics::Statistics;

/// One subclass waiting to be applied
struct PendingSubclass<'d> {
    subclass: &'d SubclassDescriptor,
    parent: EntityId,
    /// Entity of the physical table holding table-per-hierarchy columns
    shared_table: EntityId,
    level: usize,
}

pub struct InheritanceDetector<'d> {
    descriptor: &'d InheritanceDescriptor,
}

impl<'d> InheritanceDetector<'d> {
    pub fn new(descriptor: &'d InheritanceDescriptor) -> Self {
        InheritanceDetector { descriptor }
    }

    /// Applies every declared hierarchy. Returns how many were detected.
    pub fn apply(&self, schema: &mut DataBaseSchema, stats: &mut Statistics) -> usize {
        let mut detected = 0;

        for class in self.descriptor.hierarchies() {
            if self.apply_hierarchy(schema, class) {
                detected += 1;
            }
        }

        inherit_from_parents(schema);
        schema.sort_entities_by_level_and_name();

        stats.detected_hierarchies += detected;
        info!("Detected {} inheritance hierarchies", detected);
        detected
    }

    fn apply_hierarchy(&self, schema: &mut DataBaseSchema, class: &ClassDescriptor) -> bool {
        let Some(pattern) = class.pattern() else {
            return false;
        };
        let Some(root) = schema.entity_id_by_name(&class.table) else {
            debug!(
                "Table '{}' of class '{}' was not introspected, hierarchy skipped",
                class.table, class.name
            );
            return false;
        };

        let bag = schema.add_bag(pattern);
        schema.entity_mut(root).hierarchical_bag = Some(bag);
        schema.bag_mut(bag).add_entity(0, root);

        if pattern == InheritancePattern::TablePerHierarchy {
            if let Some(column) = &class.discriminator_column {
                schema.entity_mut(root).remove_attribute_ignore_case(column);
                schema.bag_mut(bag).discriminator_column = Some(column.clone());
            }
            if let Some(value) = &class.discriminator_value {
                let root_name = schema.entity(root).name.clone();
                schema
                    .bag_mut(bag)
                    .discriminator_values
                    .insert(root_name, value.clone());
            }
        }

        let mut worklist: VecDeque<PendingSubclass> = class
            .subclasses
            .iter()
            .map(|subclass| PendingSubclass {
                subclass,
                parent: root,
                shared_table: root,
                level: 1,
            })
            .collect();

        while let Some(pending) = worklist.pop_front() {
            let child = match pending.subclass.kind {
                SubclassKind::Subclass => {
                    split_table_per_hierarchy(schema, &pending, bag)
                }
                SubclassKind::SubclassWithJoin | SubclassKind::JoinedSubclass => {
                    attach_table_per_type(schema, &pending)
                }
                SubclassKind::UnionSubclass => attach_table_per_concrete_type(schema, &pending),
            };
            let Some(child) = child else {
                continue;
            };

            let entity = schema.entity_mut(child);
            entity.parent_entity = Some(pending.parent);
            entity.inheritance_level = pending.level;
            entity.hierarchical_bag = Some(bag);
            schema.bag_mut(bag).add_entity(pending.level, child);

            let shared_table = match pending.subclass.kind {
                SubclassKind::Subclass => pending.shared_table,
                _ => child,
            };
            worklist.extend(pending.subclass.subclasses.iter().map(|subclass| {
                PendingSubclass {
                    subclass,
                    parent: child,
                    shared_table,
                    level: pending.level + 1,
                }
            }));
        }

        debug!(
            "Hierarchy rooted at '{}' applied as {}",
            class.table, pattern
        );
        true
    }
}

/// New child entity carved out of the shared hierarchy table
fn split_table_per_hierarchy(
    schema: &mut DataBaseSchema,
    pending: &PendingSubclass,
    bag: BagId,
) -> Option<EntityId> {
    let subclass = pending.subclass;
    let table = schema.entity(pending.shared_table);
    let (schema_name, data_source) = (table.schema_name.clone(), table.data_source.clone());
    let primary_key = schema.entity(pending.parent).primary_key.clone();

    let child = schema.add_entity(subclass.simple_name(), schema_name, data_source);
    for column in &subclass.property_columns {
        match schema
            .entity_mut(pending.shared_table)
            .remove_attribute_ignore_case(column)
        {
            Some(attribute) => schema.entity_mut(child).adopt_attribute(attribute),
            None => debug!(
                "Column '{}' of subclass '{}' not found in its table",
                column, subclass.name
            ),
        }
    }
    schema.entity_mut(child).primary_key = primary_key;

    if let Some(value) = &subclass.discriminator_value {
        schema
            .bag_mut(bag)
            .discriminator_values
            .insert(subclass.simple_name().to_string(), value.clone());
    }

    debug!(
        "Entity '{}' split out of '{}'",
        subclass.simple_name(),
        schema.entity(pending.shared_table).name
    );
    Some(child)
}

/// Existing subclass table; its key columns duplicate the inherited key
fn attach_table_per_type(schema: &mut DataBaseSchema, pending: &PendingSubclass) -> Option<EntityId> {
    let table = pending.subclass.table.as_deref()?;
    let Some(child) = schema.entity_id_by_name(table) else {
        debug!(
            "Table '{}' of subclass '{}' was not introspected, skipped",
            table, pending.subclass.name
        );
        return None;
    };

    let parent_key = schema.entity(pending.parent).primary_key.clone();
    let entity = schema.entity_mut(child);
    let own_key: Vec<String> = entity
        .primary_key
        .attributes
        .iter()
        .map(|a| a.name.clone())
        .collect();
    for column in &own_key {
        entity.remove_attribute_ignore_case(column);
    }
    entity.primary_key = parent_key;

    Some(child)
}

/// Self-contained subclass table: columns repeated from the parent become
/// inherited attributes
fn attach_table_per_concrete_type(
    schema: &mut DataBaseSchema,
    pending: &PendingSubclass,
) -> Option<EntityId> {
    let child = attach_table_per_type(schema, pending)?;

    let parent = schema.entity(pending.parent);
    let parent_columns: Vec<String> = parent
        .attributes()
        .iter()
        .chain(parent.inherited_attributes())
        .map(|a| a.name.clone())
        .collect();

    let entity = schema.entity_mut(child);
    for column in &parent_columns {
        if let Some(attribute) = entity.remove_attribute_ignore_case(column) {
            entity.add_inherited_attribute(attribute);
        }
    }

    Some(child)
}

/// Children receive their parent's relationships and attributes, top level
/// first so grandchildren see what their parent already inherited
fn inherit_from_parents(schema: &mut DataBaseSchema) {
    let mut children: Vec<EntityId> = schema
        .entities()
        .filter(|e| e.parent_entity.is_some())
        .map(|e| e.id)
        .collect();
    children.sort_by_key(|id| schema.entity(*id).inheritance_level);

    for child in children {
        let Some(parent_id) = schema.entity(child).parent_entity else {
            continue;
        };
        if parent_id == child {
            continue;
        }

        let (parent, entity) = schema.entity_pair_mut(parent_id, child);
        for relationship in parent
            .out_relationships
            .iter()
            .chain(parent.inherited_out_relationships.iter())
        {
            if !entity.inherited_out_relationships.contains(relationship) {
                entity.inherited_out_relationships.push(*relationship);
            }
        }
        for relationship in parent
            .in_relationships
            .iter()
            .chain(parent.inherited_in_relationships.iter())
        {
            if !entity.inherited_in_relationships.contains(relationship) {
                entity.inherited_in_relationships.push(*relationship);
            }
        }
        for attribute in parent
            .attributes()
            .iter()
            .chain(parent.inherited_attributes())
        {
            if !entity.has_attribute_ignore_case(&attribute.name) {
                entity.add_inherited_attribute(attribute.clone());
            }
        }
    }
}
