//! Identifier resolution: relational names -> graph type/property names
//!
//! Two conventions are supported. [`JavaNameResolver`] normalizes names into
//! camel case (`BOOK_AUTHOR` -> `BookAuthor` for types, `authorId` for
//! properties). [`OriginalNameResolver`] keeps names as they are and only
//! replaces spaces.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::NamingConvention;
use crate::relational::model::{CanonicalRelationship, DataBaseSchema};

lazy_static! {
    /// Key-column suffixes dropped when naming a single-column edge
    static ref KEY_SUFFIX: Regex = Regex::new(r"(?i)_(id|oid|eid)$").unwrap();
}

const SEPARATORS: [char; 3] = [' ', '_', '-'];

pub trait NameResolver {
    fn resolve_vertex_name(&self, name: &str) -> String;

    fn resolve_vertex_property(&self, name: &str) -> String;

    fn resolve_edge_name(&self, schema: &DataBaseSchema, relationship: &CanonicalRelationship)
        -> String;
}

pub fn resolver_for(convention: NamingConvention) -> Box<dyn NameResolver> {
    match convention {
        NamingConvention::Java => Box::new(JavaNameResolver),
        NamingConvention::Original => Box::new(OriginalNameResolver),
    }
}

/// Column name with a trailing `_id`/`_oid`/`_eid` removed, when the foreign
/// key has exactly one column
fn single_key_stem(relationship: &CanonicalRelationship) -> Option<String> {
    match relationship.foreign_key.attributes.as_slice() {
        [only] => Some(KEY_SUFFIX.replace(&only.name, "").into_owned()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JavaNameResolver;

impl JavaNameResolver {
    fn is_all_uppercase(name: &str) -> bool {
        name.chars().any(char::is_alphabetic) && !name.chars().any(char::is_lowercase)
    }

    fn is_in_convention(name: &str, upper_first: bool) -> bool {
        let Some(first) = name.chars().next() else {
            return true;
        };
        let leading_ok = if upper_first {
            !first.is_lowercase()
        } else {
            !first.is_uppercase()
        };

        !name.contains(SEPARATORS) && leading_ok && !Self::is_all_uppercase(name)
    }

    fn to_camel_case(name: &str, upper_first: bool) -> String {
        if Self::is_in_convention(name, upper_first) {
            return name.to_string();
        }

        let source = if Self::is_all_uppercase(name) {
            name.to_lowercase()
        } else {
            name.to_string()
        };

        let mut joined = String::with_capacity(source.len());
        let mut boundary = false;
        for c in source.chars() {
            if SEPARATORS.contains(&c) {
                boundary = true;
            } else if boundary {
                joined.extend(c.to_uppercase());
                boundary = false;
            } else {
                joined.push(c);
            }
        }

        let mut chars = joined.chars();
        match chars.next() {
            Some(first) if upper_first => first.to_uppercase().chain(chars).collect(),
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl NameResolver for JavaNameResolver {
    fn resolve_vertex_name(&self, name: &str) -> String {
        Self::to_camel_case(name, true)
    }

    fn resolve_vertex_property(&self, name: &str) -> String {
        Self::to_camel_case(name, false)
    }

    fn resolve_edge_name(
        &self,
        schema: &DataBaseSchema,
        relationship: &CanonicalRelationship,
    ) -> String {
        match single_key_stem(relationship) {
            Some(stem) => format!("Has{}", self.resolve_vertex_name(&stem)),
            None => format!(
                "{}2{}",
                self.resolve_vertex_name(&schema.entity(relationship.foreign_entity).name),
                self.resolve_vertex_name(&schema.entity(relationship.parent_entity).name)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OriginalNameResolver;

impl NameResolver for OriginalNameResolver {
    fn resolve_vertex_name(&self, name: &str) -> String {
        name.replace(' ', "_")
    }

    fn resolve_vertex_property(&self, name: &str) -> String {
        name.replace(' ', "_")
    }

    fn resolve_edge_name(
        &self,
        schema: &DataBaseSchema,
        relationship: &CanonicalRelationship,
    ) -> String {
        match single_key_stem(relationship) {
            Some(stem) => format!("has_{}", self.resolve_vertex_name(&stem)),
            None => format!(
                "{}2{}",
                self.resolve_vertex_name(&schema.entity(relationship.foreign_entity).name),
                self.resolve_vertex_name(&schema.entity(relationship.parent_entity).name)
            ),
        }
    }
}
