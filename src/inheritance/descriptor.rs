//! ORM inheritance descriptor (Hibernate mapping XML)
//!
//! Only the elements that describe inheritance are read: `class`, `subclass`
//! (optionally with a nested `join`), `joined-subclass`, `union-subclass`,
//! `discriminator` and `property`. Everything else in the file is ignored.

use log::debug;
use roxmltree::Node;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::relational::model::InheritancePattern;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Failed to read inheritance descriptor '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed inheritance descriptor: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("<{element}> element without required '{attribute}' attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, DescriptorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubclassKind {
    /// `<subclass>` sharing the parent's table
    Subclass,
    /// `<subclass>` with a nested `<join table=..>`
    SubclassWithJoin,
    JoinedSubclass,
    UnionSubclass,
}

impl SubclassKind {
    pub fn pattern(self) -> InheritancePattern {
        match self {
            SubclassKind::Subclass => InheritancePattern::TablePerHierarchy,
            SubclassKind::SubclassWithJoin | SubclassKind::JoinedSubclass => {
                InheritancePattern::TablePerType
            }
            SubclassKind::UnionSubclass => InheritancePattern::TablePerConcreteType,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubclassDescriptor {
    pub kind: SubclassKind,
    /// Fully qualified class name
    pub name: String,
    /// Own table; `None` for a subclass living in its parent's table
    pub table: Option<String>,
    pub discriminator_value: Option<String>,
    pub property_columns: Vec<String>,
    pub subclasses: Vec<SubclassDescriptor>,
}

impl SubclassDescriptor {
    pub fn simple_name(&self) -> &str {
        simple_class_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub name: String,
    pub table: String,
    pub discriminator_column: Option<String>,
    pub discriminator_value: Option<String>,
    pub subclasses: Vec<SubclassDescriptor>,
}

impl ClassDescriptor {
    /// Pattern of the hierarchy rooted here, decided by its first subclass.
    /// `None` when the class has no subclasses.
    pub fn pattern(&self) -> Option<InheritancePattern> {
        self.subclasses.first().map(|s| s.kind.pattern())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InheritanceDescriptor {
    pub classes: Vec<ClassDescriptor>,
}

impl InheritanceDescriptor {
    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path).map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_xml_str(&xml)
    }

    pub fn from_xml_str(xml: &str) -> Result<Self> {
        // hbm.xml files carry a DOCTYPE
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = roxmltree::Document::parse_with_options(xml, options)?;
        let root = doc.root_element();

        let class_nodes: Vec<Node> = if root.has_tag_name("class") {
            vec![root]
        } else {
            root.children().filter(|n| n.has_tag_name("class")).collect()
        };

        let classes = class_nodes
            .into_iter()
            .map(parse_class)
            .collect::<Result<Vec<_>>>()?;
        debug!("Parsed {} mapped classes from descriptor", classes.len());

        Ok(InheritanceDescriptor { classes })
    }

    /// Root classes that have at least one subclass
    pub fn hierarchies(&self) -> impl Iterator<Item = &ClassDescriptor> + '_ {
        self.classes.iter().filter(|c| !c.subclasses.is_empty())
    }
}

pub fn simple_class_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn required(node: Node, attribute: &'static str) -> Result<String> {
    node.attribute(attribute)
        .map(str::to_string)
        .ok_or_else(|| DescriptorError::MissingAttribute {
            element: node.tag_name().name().to_string(),
            attribute,
        })
}

fn is_subclass_element(node: &Node) -> bool {
    matches!(
        node.tag_name().name(),
        "subclass" | "joined-subclass" | "union-subclass"
    )
}

fn parse_class(node: Node) -> Result<ClassDescriptor> {
    let table = required(node, "table")?;
    let name = required(node, "name")?;

    let discriminator_column = match node.children().find(|n| n.has_tag_name("discriminator")) {
        Some(discriminator) => Some(required(discriminator, "column")?),
        None => None,
    };

    Ok(ClassDescriptor {
        name,
        table,
        discriminator_column,
        discriminator_value: node.attribute("discriminator-value").map(str::to_string),
        subclasses: parse_subclasses(node)?,
    })
}

fn parse_subclasses(node: Node) -> Result<Vec<SubclassDescriptor>> {
    node.children()
        .filter(is_subclass_element)
        .map(parse_subclass)
        .collect()
}

fn parse_subclass(node: Node) -> Result<SubclassDescriptor> {
    let name = required(node, "name")?;

    let (kind, table) = match node.tag_name().name() {
        "joined-subclass" => (SubclassKind::JoinedSubclass, Some(required(node, "table")?)),
        "union-subclass" => (SubclassKind::UnionSubclass, Some(required(node, "table")?)),
        _ => match node.children().find(|n| n.has_tag_name("join")) {
            Some(join) => (SubclassKind::SubclassWithJoin, Some(required(join, "table")?)),
            None => (SubclassKind::Subclass, None),
        },
    };

    Ok(SubclassDescriptor {
        kind,
        name,
        table,
        discriminator_value: node.attribute("discriminator-value").map(str::to_string),
        property_columns: parse_property_columns(node)?,
        subclasses: parse_subclasses(node)?,
    })
}

/// `<property column="..">` or `<property><column name=".."/></property>`
fn parse_property_columns(node: Node) -> Result<Vec<String>> {
    node.children()
        .filter(|n| n.has_tag_name("property"))
        .map(|property| match property.attribute("column") {
            Some(column) => Ok(column.to_string()),
            None => property
                .children()
                .find(|n| n.has_tag_name("column"))
                .and_then(|c| c.attribute("name"))
                .map(str::to_string)
                .ok_or_else(|| DescriptorError::MissingAttribute {
                    element: "property".to_string(),
                    attribute: "column",
                }),
        })
        .collect()
}
