use std::collections::BTreeMap;

use crate::expression::Expression;

#[derive(Debug, Clone, PartialEq)]
pub struct ObjAttribute {
    pub name: String,
    /// Dotted db path; more than one segment means the attribute is
    /// flattened across relationships.
    pub db_attribute_path: String,
    pub host_type: String,
}

impl ObjAttribute {
    pub fn new(name: &str, db_attribute_path: &str, host_type: &str) -> Self {
        ObjAttribute {
            name: name.to_string(),
            db_attribute_path: db_attribute_path.to_string(),
            host_type: host_type.to_string(),
        }
    }

    pub fn is_flattened(&self) -> bool {
        self.db_attribute_path.contains('.')
    }

    /// Final column name of the db path.
    pub fn db_attribute_name(&self) -> &str {
        self.db_attribute_path
            .rsplit('.')
            .next()
            .unwrap_or(&self.db_attribute_path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddableAttribute {
    pub name: String,
    pub db_attribute_name: String,
    pub host_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embeddable {
    pub class_name: String,
    pub attributes: Vec<EmbeddableAttribute>,
}

impl Embeddable {
    pub fn attribute(&self, name: &str) -> Option<&EmbeddableAttribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

/// An attribute whose value is an embeddable, stored in columns of the
/// owning table.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedAttribute {
    pub name: String,
    pub embeddable: String,
    /// Embeddable property name to column name, overriding the embeddable's
    /// own mapping.
    pub overrides: BTreeMap<String, String>,
}

impl EmbeddedAttribute {
    pub fn column_for<'a>(&'a self, property: &'a EmbeddableAttribute) -> &'a str {
        self.overrides
            .get(&property.name)
            .map(String::as_str)
            .unwrap_or(&property.db_attribute_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjRelationship {
    pub name: String,
    pub target_entity: String,
    /// Dotted db relationship path; more than one segment means a flattened
    /// relationship.
    pub db_relationship_path: String,
    pub to_many: bool,
}

impl ObjRelationship {
    pub fn is_flattened(&self) -> bool {
        self.db_relationship_path.contains('.')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjEntity {
    pub name: String,
    pub class_name: String,
    pub db_entity: String,
    pub attributes: Vec<ObjAttribute>,
    pub embedded: Vec<EmbeddedAttribute>,
    pub relationships: Vec<ObjRelationship>,
    /// Inheritance discriminator, expressed in object paths of this entity.
    pub qualifier: Option<Expression>,
}

impl ObjEntity {
    pub fn new(name: &str, db_entity: &str) -> Self {
        ObjEntity {
            name: name.to_string(),
            class_name: name.to_string(),
            db_entity: db_entity.to_string(),
            attributes: Vec::new(),
            embedded: Vec::new(),
            relationships: Vec::new(),
            qualifier: None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&ObjAttribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn embedded_attribute(&self, name: &str) -> Option<&EmbeddedAttribute> {
        self.embedded.iter().find(|attr| attr.name == name)
    }

    pub fn relationship(&self, name: &str) -> Option<&ObjRelationship> {
        self.relationships.iter().find(|rel| rel.name == name)
    }

    pub fn with_qualifier(mut self, qualifier: Expression) -> Self {
        self.qualifier = Some(qualifier);
        self
    }
}
