use std::collections::HashMap;

use super::db_entity::{DbAttribute, DbEntity, DbRelationship};
use super::errors::CatalogError;
use super::obj_entity::{Embeddable, EmbeddedAttribute, ObjAttribute, ObjEntity, ObjRelationship};
use super::types_mapping::DEFAULT_HOST_TYPE;
use crate::expression::{Expression, Path, PathSegment, Rewrite};

/// Read-only schema graph shared by every translation.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    db_entities: HashMap<String, DbEntity>,
    obj_entities: HashMap<String, ObjEntity>,
    embeddables: HashMap<String, Embeddable>,
}

#[derive(Debug, Default)]
pub struct EntityCatalogBuilder {
    db_entities: Vec<DbEntity>,
    obj_entities: Vec<ObjEntity>,
    embeddables: Vec<Embeddable>,
}

impl EntityCatalogBuilder {
    pub fn db_entity(mut self, entity: DbEntity) -> Self {
        self.db_entities.push(entity);
        self
    }

    pub fn obj_entity(mut self, entity: ObjEntity) -> Self {
        self.obj_entities.push(entity);
        self
    }

    pub fn embeddable(mut self, embeddable: Embeddable) -> Self {
        self.embeddables.push(embeddable);
        self
    }

    /// Indexes the entities, derives to-many flags of object relationships
    /// from their db paths and validates every cross reference.
    pub fn build(self) -> Result<EntityCatalog, CatalogError> {
        let mut catalog = EntityCatalog::default();
        for entity in self.db_entities {
            if catalog.db_entities.contains_key(&entity.name) {
                return Err(CatalogError::invalid_config(format!(
                    "duplicate db entity `{}`",
                    entity.name
                )));
            }
            catalog.db_entities.insert(entity.name.clone(), entity);
        }
        for embeddable in self.embeddables {
            catalog
                .embeddables
                .insert(embeddable.class_name.clone(), embeddable);
        }

        let mut obj_entities = self.obj_entities;
        for entity in &mut obj_entities {
            for rel in &mut entity.relationships {
                rel.to_many =
                    catalog.is_to_many_db_path(&entity.db_entity, &rel.db_relationship_path)?;
            }
        }
        for entity in obj_entities {
            if catalog.obj_entities.contains_key(&entity.name) {
                return Err(CatalogError::invalid_config(format!(
                    "duplicate object entity `{}`",
                    entity.name
                )));
            }
            catalog.obj_entities.insert(entity.name.clone(), entity);
        }

        catalog.validate()?;
        log::info!(
            "Entity catalog built: {} db entities, {} object entities, {} embeddables",
            catalog.db_entities.len(),
            catalog.obj_entities.len(),
            catalog.embeddables.len()
        );
        Ok(catalog)
    }
}

/// Persistent properties of an object entity in declaration order.
#[derive(Debug, Clone)]
pub enum PropertyDescriptor<'a> {
    Attribute(&'a ObjAttribute),
    Embedded(&'a EmbeddedAttribute, &'a Embeddable),
    ToOne(&'a ObjRelationship),
    ToMany(&'a ObjRelationship),
}

#[derive(Debug, Clone)]
pub struct ClassDescriptor<'a> {
    pub entity: &'a ObjEntity,
    pub db_entity: &'a DbEntity,
    pub properties: Vec<PropertyDescriptor<'a>>,
}

impl EntityCatalog {
    pub fn builder() -> EntityCatalogBuilder {
        EntityCatalogBuilder::default()
    }

    pub fn db_entity(&self, name: &str) -> Result<&DbEntity, CatalogError> {
        self.db_entities
            .get(name)
            .ok_or_else(|| CatalogError::DbEntity {
                name: name.to_string(),
            })
    }

    pub fn obj_entity(&self, name: &str) -> Result<&ObjEntity, CatalogError> {
        self.obj_entities
            .get(name)
            .ok_or_else(|| CatalogError::ObjEntity {
                name: name.to_string(),
            })
    }

    pub fn embeddable(&self, class_name: &str) -> Result<&Embeddable, CatalogError> {
        self.embeddables
            .get(class_name)
            .ok_or_else(|| CatalogError::Embeddable {
                name: class_name.to_string(),
            })
    }

    pub fn db_entity_for(&self, entity: &ObjEntity) -> Result<&DbEntity, CatalogError> {
        self.db_entity(&entity.db_entity)
    }

    /// Target of a db relationship.
    pub fn target_of(&self, relationship: &DbRelationship) -> Result<&DbEntity, CatalogError> {
        self.db_entity(&relationship.target_entity)
    }

    pub fn class_descriptor(&self, obj_entity: &str) -> Result<ClassDescriptor<'_>, CatalogError> {
        let entity = self.obj_entity(obj_entity)?;
        let db_entity = self.db_entity_for(entity)?;

        let mut properties: Vec<PropertyDescriptor<'_>> = entity
            .attributes
            .iter()
            .map(PropertyDescriptor::Attribute)
            .collect();
        for embedded in &entity.embedded {
            properties.push(PropertyDescriptor::Embedded(
                embedded,
                self.embeddable(&embedded.embeddable)?,
            ));
        }
        for rel in &entity.relationships {
            if rel.to_many {
                properties.push(PropertyDescriptor::ToMany(rel));
            } else {
                properties.push(PropertyDescriptor::ToOne(rel));
            }
        }

        Ok(ClassDescriptor {
            entity,
            db_entity,
            properties,
        })
    }

    /// Rewrites an object path into the db path it maps to.
    pub fn obj_path_to_db_path(
        &self,
        entity: &ObjEntity,
        path: &Path,
    ) -> Result<Path, CatalogError> {
        let mut current = entity;
        let mut db_path = Path::root().with_marker(path.marker());
        let segments = path.segments();
        let mut i = 0;

        while i < segments.len() {
            let segment = &segments[i];
            if let Some(attr) = current.attribute(&segment.name) {
                for part in attr.db_attribute_path.split('.') {
                    db_path = db_path.child(PathSegment {
                        name: part.to_string(),
                        outer: segment.outer,
                    });
                }
            } else if let Some(embedded) = current.embedded_attribute(&segment.name) {
                let embeddable = self.embeddable(&embedded.embeddable)?;
                let property = segments
                    .get(i + 1)
                    .and_then(|next| embeddable.attribute(&next.name))
                    .ok_or_else(|| CatalogError::Property {
                        entity: current.name.clone(),
                        property: segment.name.clone(),
                        path: path.to_string(),
                    })?;
                db_path = db_path.child(PathSegment::new(embedded.column_for(property)));
                i += 1;
            } else if let Some(rel) = current.relationship(&segment.name) {
                for hop in rel.db_relationship_path.split('.') {
                    db_path = db_path.child(PathSegment {
                        name: hop.to_string(),
                        outer: segment.outer,
                    });
                }
                current = self.obj_entity(&rel.target_entity)?;
            } else {
                return Err(CatalogError::Property {
                    entity: current.name.clone(),
                    property: segment.name.clone(),
                    path: path.to_string(),
                });
            }
            i += 1;
        }

        Ok(db_path)
    }

    /// Replaces every object path in `expression` with its db path.
    /// Subqueries keep their own paths.
    pub fn translate_to_db_expression(
        &self,
        entity: &ObjEntity,
        expression: &Expression,
    ) -> Result<Expression, CatalogError> {
        expression.rewrite(&mut |e| match e {
            Expression::ObjPath(path) => Ok(Rewrite::Replaced(Expression::DbPath(
                self.obj_path_to_db_path(entity, path)?,
            ))),
            _ => Ok(Rewrite::Descend),
        })
    }

    /// Last object relationship named by `path`, if the path ends on one.
    pub fn terminal_relationship<'a>(
        &'a self,
        entity: &'a ObjEntity,
        path: &Path,
    ) -> Option<&'a ObjRelationship> {
        let mut current = entity;
        let mut last = None;
        for segment in path.segments() {
            match current.relationship(&segment.name) {
                Some(rel) => {
                    last = Some(rel);
                    current = self.obj_entity(&rel.target_entity).ok()?;
                }
                None => last = None,
            }
        }
        last
    }

    /// Declared host type of the object property mapped onto `attribute`.
    pub fn declared_type_for(&self, attribute: &DbAttribute) -> &str {
        for entity in self.obj_entities.values() {
            if entity.db_entity != attribute.entity {
                continue;
            }
            if let Some(attr) = entity
                .attributes
                .iter()
                .find(|a| !a.is_flattened() && a.db_attribute_path == attribute.name)
            {
                return &attr.host_type;
            }
            for embedded in &entity.embedded {
                if let Ok(embeddable) = self.embeddable(&embedded.embeddable) {
                    if let Some(property) = embeddable
                        .attributes
                        .iter()
                        .find(|p| embedded.column_for(p) == attribute.name)
                    {
                        return &property.host_type;
                    }
                }
            }
        }
        DEFAULT_HOST_TYPE
    }

    fn is_to_many_db_path(&self, db_entity: &str, db_path: &str) -> Result<bool, CatalogError> {
        let mut entity = self.db_entity(db_entity)?;
        let mut to_many = false;
        for hop in db_path.split('.') {
            let rel = entity
                .relationship(hop)
                .ok_or_else(|| CatalogError::relationship(&entity.name, hop))?;
            to_many |= rel.to_many;
            entity = self.target_of(rel)?;
        }
        Ok(to_many)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for entity in self.db_entities.values() {
            for rel in &entity.relationships {
                if rel.source_entity != entity.name {
                    return Err(CatalogError::invalid_config(format!(
                        "relationship `{}` is declared on `{}` but names `{}` as its source",
                        rel.name, entity.name, rel.source_entity
                    )));
                }
                let target = self.target_of(rel)?;
                if rel.joins.is_empty() {
                    return Err(CatalogError::invalid_config(format!(
                        "relationship `{}.{}` has no joins",
                        entity.name, rel.name
                    )));
                }
                for join in &rel.joins {
                    if entity.attribute(&join.source_name).is_none() {
                        return Err(CatalogError::attribute(&entity.name, &join.source_name));
                    }
                    if target.attribute(&join.target_name).is_none() {
                        return Err(CatalogError::attribute(&target.name, &join.target_name));
                    }
                }
            }
        }

        for entity in self.obj_entities.values() {
            let db_entity = self.db_entity_for(entity)?;
            for attr in &entity.attributes {
                let mut current = db_entity;
                let parts: Vec<&str> = attr.db_attribute_path.split('.').collect();
                let (column, hops) = parts
                    .split_last()
                    .ok_or_else(|| CatalogError::attribute(&entity.name, &attr.name))?;
                for hop in hops {
                    let rel = current
                        .relationship(hop)
                        .ok_or_else(|| CatalogError::relationship(&current.name, hop))?;
                    current = self.target_of(rel)?;
                }
                if current.attribute(column).is_none() {
                    return Err(CatalogError::attribute(&current.name, column));
                }
            }
            for embedded in &entity.embedded {
                let embeddable = self.embeddable(&embedded.embeddable)?;
                for property in &embeddable.attributes {
                    let column = embedded.column_for(property);
                    if db_entity.attribute(column).is_none() {
                        return Err(CatalogError::attribute(&db_entity.name, column));
                    }
                }
            }
            for rel in &entity.relationships {
                let target = self.obj_entity(&rel.target_entity)?;
                let mut current = db_entity;
                for hop in rel.db_relationship_path.split('.') {
                    let db_rel = current
                        .relationship(hop)
                        .ok_or_else(|| CatalogError::relationship(&current.name, hop))?;
                    current = self.target_of(db_rel)?;
                }
                if current.name != target.db_entity {
                    return Err(CatalogError::invalid_config(format!(
                        "relationship `{}.{}` ends on `{}` but `{}` maps to `{}`",
                        entity.name, rel.name, current.name, target.name, target.db_entity
                    )));
                }
            }
        }
        Ok(())
    }
}
