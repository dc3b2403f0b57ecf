//! # Catalog Error Types
//!
//! Errors raised while loading the entity catalog or looking up entities,
//! attributes and relationships in it.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("No db entity named `{name}`")]
    DbEntity { name: String },
    #[error("No object entity named `{name}`")]
    ObjEntity { name: String },
    #[error("No embeddable named `{name}`")]
    Embeddable { name: String },
    #[error("Entity `{entity}` has no attribute `{attribute}`")]
    Attribute { entity: String, attribute: String },
    #[error("Entity `{entity}` has no relationship `{relationship}`")]
    Relationship {
        entity: String,
        relationship: String,
    },
    #[error("Can't resolve `{property}` of path `{path}` on entity `{entity}`")]
    Property {
        entity: String,
        property: String,
        path: String,
    },
    #[error("Relationship `{relationship}` is to-many, a foreign key snapshot is undefined for it")]
    ToManySnapshot { relationship: String },
    #[error("Snapshot for relationship `{relationship}` has no value for `{column}`")]
    SnapshotColumn { relationship: String, column: String },
    #[error("Failed to read catalog file: {error}")]
    ConfigRead { error: String },
    #[error("Failed to parse catalog: {error}")]
    ConfigParse { error: String },
    #[error("Invalid catalog: {message}")]
    InvalidConfig { message: String },
}

impl CatalogError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        CatalogError::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn attribute(entity: &str, attribute: &str) -> Self {
        CatalogError::Attribute {
            entity: entity.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn relationship(entity: &str, relationship: &str) -> Self {
        CatalogError::Relationship {
            entity: entity.to_string(),
            relationship: relationship.to_string(),
        }
    }
}
