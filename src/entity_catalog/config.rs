//! YAML catalog definitions.
//!
//! ```yaml
//! name: gallery
//! catalog:
//!   db_entities:
//!     - name: ARTIST
//!       attributes:
//!         - { name: ARTIST_ID, type: BIGINT, primary_key: true }
//!         - { name: ARTIST_NAME, type: VARCHAR, mandatory: true }
//!       relationships:
//!         - name: paintingArray
//!           target: PAINTING
//!           to_many: true
//!           joins:
//!             - { source: ARTIST_ID, target: ARTIST_ID }
//!   obj_entities:
//!     - name: Artist
//!       db_entity: ARTIST
//!       attributes:
//!         - { name: artistName, db_path: ARTIST_NAME, type: java.lang.String }
//!       relationships:
//!         - { name: paintingArray, target: Painting, db_path: paintingArray }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::catalog::EntityCatalog;
use super::db_entity::{DbAttribute, DbEntity, DbJoin, DbRelationship};
use super::errors::CatalogError;
use super::obj_entity::{
    Embeddable, EmbeddableAttribute, EmbeddedAttribute, ObjAttribute, ObjEntity, ObjRelationship,
};
use super::types_mapping::JdbcType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCatalogConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub catalog: CatalogDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDefinition {
    pub db_entities: Vec<DbEntityDefinition>,
    #[serde(default)]
    pub obj_entities: Vec<ObjEntityDefinition>,
    #[serde(default)]
    pub embeddables: Vec<EmbeddableDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbEntityDefinition {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    pub attributes: Vec<DbAttributeDefinition>,
    #[serde(default)]
    pub relationships: Vec<DbRelationshipDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbAttributeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub jdbc_type: JdbcType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub mandatory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbRelationshipDefinition {
    pub name: String,
    pub target: String,
    #[serde(default)]
    pub to_many: bool,
    #[serde(default)]
    pub to_dependent_pk: bool,
    pub joins: Vec<DbJoinDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbJoinDefinition {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjEntityDefinition {
    pub name: String,
    #[serde(default)]
    pub class_name: Option<String>,
    pub db_entity: String,
    #[serde(default)]
    pub attributes: Vec<ObjAttributeDefinition>,
    #[serde(default)]
    pub embedded: Vec<EmbeddedAttributeDefinition>,
    #[serde(default)]
    pub relationships: Vec<ObjRelationshipDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjAttributeDefinition {
    pub name: String,
    pub db_path: String,
    #[serde(rename = "type")]
    pub host_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedAttributeDefinition {
    pub name: String,
    pub embeddable: String,
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjRelationshipDefinition {
    pub name: String,
    pub target: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddableDefinition {
    pub class_name: String,
    pub attributes: Vec<EmbeddableAttributeDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddableAttributeDefinition {
    pub name: String,
    pub column: String,
    #[serde(rename = "type")]
    pub host_type: String,
}

impl EntityCatalogConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|e| CatalogError::ConfigRead {
            error: e.to_string(),
        })?;

        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        serde_yaml::from_str(yaml).map_err(|e| CatalogError::ConfigParse {
            error: e.to_string(),
        })
    }

    /// Structural checks that don't need cross references.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.catalog.db_entities.is_empty() {
            return Err(CatalogError::invalid_config(
                "Catalog must contain at least one db entity",
            ));
        }

        let mut seen = HashSet::new();
        for entity in &self.catalog.db_entities {
            if !seen.insert(&entity.name) {
                return Err(CatalogError::invalid_config(format!(
                    "Duplicate db entity: {}",
                    entity.name
                )));
            }
            let mut columns = HashSet::new();
            for attr in &entity.attributes {
                if !columns.insert(&attr.name) {
                    return Err(CatalogError::invalid_config(format!(
                        "Duplicate attribute {}.{}",
                        entity.name, attr.name
                    )));
                }
            }
        }

        let mut seen = HashSet::new();
        for entity in &self.catalog.obj_entities {
            if !seen.insert(&entity.name) {
                return Err(CatalogError::invalid_config(format!(
                    "Duplicate object entity: {}",
                    entity.name
                )));
            }
        }
        Ok(())
    }

    /// Validates and builds the read-only catalog.
    pub fn to_catalog(&self) -> Result<EntityCatalog, CatalogError> {
        self.validate()?;

        let mut builder = EntityCatalog::builder();
        for def in &self.catalog.db_entities {
            let mut entity = DbEntity::new(&def.name);
            entity.schema = def.schema.clone();
            entity.attributes = def
                .attributes
                .iter()
                .map(|attr| DbAttribute {
                    entity: def.name.clone(),
                    name: attr.name.clone(),
                    jdbc_type: attr.jdbc_type,
                    primary_key: attr.primary_key,
                    mandatory: attr.mandatory || attr.primary_key,
                })
                .collect();
            entity.relationships = def
                .relationships
                .iter()
                .map(|rel| DbRelationship {
                    name: rel.name.clone(),
                    source_entity: def.name.clone(),
                    target_entity: rel.target.clone(),
                    to_many: rel.to_many,
                    to_dependent_pk: rel.to_dependent_pk,
                    joins: rel
                        .joins
                        .iter()
                        .map(|j| DbJoin {
                            source_name: j.source.clone(),
                            target_name: j.target.clone(),
                        })
                        .collect(),
                })
                .collect();
            builder = builder.db_entity(entity);
        }

        for def in &self.catalog.embeddables {
            builder = builder.embeddable(Embeddable {
                class_name: def.class_name.clone(),
                attributes: def
                    .attributes
                    .iter()
                    .map(|a| EmbeddableAttribute {
                        name: a.name.clone(),
                        db_attribute_name: a.column.clone(),
                        host_type: a.host_type.clone(),
                    })
                    .collect(),
            });
        }

        for def in &self.catalog.obj_entities {
            let mut entity = ObjEntity::new(&def.name, &def.db_entity);
            if let Some(class_name) = &def.class_name {
                entity.class_name = class_name.clone();
            }
            entity.attributes = def
                .attributes
                .iter()
                .map(|a| ObjAttribute::new(&a.name, &a.db_path, &a.host_type))
                .collect();
            entity.embedded = def
                .embedded
                .iter()
                .map(|e| EmbeddedAttribute {
                    name: e.name.clone(),
                    embeddable: e.embeddable.clone(),
                    overrides: e.overrides.clone(),
                })
                .collect();
            // to_many is derived from the db path when the catalog is built
            entity.relationships = def
                .relationships
                .iter()
                .map(|r| ObjRelationship {
                    name: r.name.clone(),
                    target_entity: r.target.clone(),
                    db_relationship_path: r.db_path.clone(),
                    to_many: false,
                })
                .collect();
            builder = builder.obj_entity(entity);
        }

        builder.build()
    }
}
