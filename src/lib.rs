//! Selectgraph - object/relational select query translation
//!
//! This crate turns entity- and path-based select queries into SQL through:
//! - An entity catalog mapping object entities onto tables
//! - A filter expression AST with object and db paths
//! - A staged translator building a generic SQL tree
//! - SQL rendering with ordered parameter bindings and result column metadata

pub mod config;
pub mod entity_catalog;
pub mod expression;
pub mod query;
pub mod sql_tree;
pub mod translator;

pub use config::{PrefetchLimitPolicy, TranslatorConfig};
pub use entity_catalog::{EntityCatalog, EntityCatalogConfig};
pub use expression::{Expression, Path, Value};
pub use query::{Ordering, PrefetchSemantics, Property, SelectQuery};
pub use translator::{SelectTranslation, SelectTranslator, TranslatorError};
