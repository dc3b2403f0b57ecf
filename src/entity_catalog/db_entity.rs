use std::collections::BTreeMap;

use super::errors::CatalogError;
use super::types_mapping::JdbcType;
use crate::expression::{Expression, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct DbAttribute {
    /// Owning db entity name.
    pub entity: String,
    pub name: String,
    pub jdbc_type: JdbcType,
    pub primary_key: bool,
    pub mandatory: bool,
}

impl DbAttribute {
    pub fn new(entity: &str, name: &str, jdbc_type: JdbcType) -> Self {
        DbAttribute {
            entity: entity.to_string(),
            name: name.to_string(),
            jdbc_type,
            primary_key: false,
            mandatory: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.mandatory = true;
        self
    }
}

/// One column pair of a relationship join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbJoin {
    pub source_name: String,
    pub target_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbRelationship {
    pub name: String,
    pub source_entity: String,
    pub target_entity: String,
    pub to_many: bool,
    pub to_dependent_pk: bool,
    pub joins: Vec<DbJoin>,
}

impl DbRelationship {
    /// True if the join target columns are exactly the target primary key.
    pub fn is_exact_to_pk(&self, target: &DbEntity) -> bool {
        let pk: Vec<&str> = target
            .primary_keys()
            .map(|attr| attr.name.as_str())
            .collect();
        if pk.is_empty() || pk.len() != self.joins.len() {
            return false;
        }
        pk.iter()
            .all(|name| self.joins.iter().any(|join| join.target_name == *name))
    }

    /// A to-one relationship pointing at the target's full primary key.
    pub fn is_belongs_to(&self, target: &DbEntity) -> bool {
        !self.to_many && !self.to_dependent_pk && self.is_exact_to_pk(target)
    }

    /// Converts a snapshot keyed by target column names into one keyed by the
    /// source foreign key columns.
    pub fn src_fk_snapshot_with_target_snapshot(
        &self,
        target_snapshot: &BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, CatalogError> {
        if self.to_many {
            return Err(CatalogError::ToManySnapshot {
                relationship: self.name.clone(),
            });
        }

        let mut snapshot = BTreeMap::new();
        for join in &self.joins {
            let value = target_snapshot.get(&join.target_name).ok_or_else(|| {
                CatalogError::SnapshotColumn {
                    relationship: self.name.clone(),
                    column: join.target_name.clone(),
                }
            })?;
            snapshot.insert(join.source_name.clone(), value.clone());
        }
        Ok(snapshot)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbEntity {
    pub name: String,
    pub schema: Option<String>,
    pub attributes: Vec<DbAttribute>,
    pub relationships: Vec<DbRelationship>,
    /// Restriction applied to every query touching this table.
    pub qualifier: Option<Expression>,
}

impl DbEntity {
    pub fn new(name: &str) -> Self {
        DbEntity {
            name: name.to_string(),
            schema: None,
            attributes: Vec::new(),
            relationships: Vec::new(),
            qualifier: None,
        }
    }

    pub fn fully_qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&DbAttribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn relationship(&self, name: &str) -> Option<&DbRelationship> {
        self.relationships.iter().find(|rel| rel.name == name)
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &DbAttribute> {
        self.attributes.iter().filter(|attr| attr.primary_key)
    }

    pub fn with_attribute(mut self, attribute: DbAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_relationship(mut self, relationship: DbRelationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn with_qualifier(mut self, qualifier: Expression) -> Self {
        self.qualifier = Some(qualifier);
        self
    }
}
