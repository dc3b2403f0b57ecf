pub mod catalog;
pub mod config;
pub mod db_entity;
pub mod errors;
pub mod obj_entity;
pub mod types_mapping;

pub use catalog::{ClassDescriptor, EntityCatalog, EntityCatalogBuilder, PropertyDescriptor};
pub use config::EntityCatalogConfig;
pub use db_entity::{DbAttribute, DbEntity, DbJoin, DbRelationship};
pub use errors::CatalogError;
pub use obj_entity::{
    Embeddable, EmbeddableAttribute, EmbeddedAttribute, ObjAttribute, ObjEntity, ObjRelationship,
};
pub use types_mapping::JdbcType;
