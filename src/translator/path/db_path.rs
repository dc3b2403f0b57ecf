use crate::entity_catalog::{
    CatalogError, DbAttribute, DbEntity, DbRelationship, Embeddable, EntityCatalog,
};
use crate::expression::{Path, PathSegment};
use crate::sql_tree::JoinType;
use crate::translator::errors::{TranslatorError, TranslatorResult};

use super::{expand_steps, unresolved, PathScope, PathTranslationResult};

/// Walks db relationships one hop at a time, registering joins and
/// collecting the attributes the walk ends on.
pub(super) struct DbWalker<'s, 'a> {
    scope: PathScope<'s, 'a>,
    pub entity: &'a DbEntity,
    current_path: Path,
    final_path: Option<Path>,
    result: PathTranslationResult,
}

impl<'s, 'a> DbWalker<'s, 'a> {
    pub fn new(scope: PathScope<'s, 'a>, entity: &'a DbEntity, start: Path) -> Self {
        DbWalker {
            scope,
            entity,
            current_path: start,
            final_path: None,
            result: PathTranslationResult::default(),
        }
    }

    pub fn catalog(&self) -> &'a EntityCatalog {
        self.scope.catalog
    }

    fn push(&mut self, attribute: &DbAttribute) {
        self.result.attribute_paths.push(self.current_path.clone());
        self.result.attributes.push(attribute.clone());
    }

    /// Adds a column of the current table.
    pub fn attribute(&mut self, name: &str) -> TranslatorResult<()> {
        let entity = self.entity;
        let attribute = entity
            .attribute(name)
            .ok_or_else(|| CatalogError::attribute(&entity.name, name))?;
        self.push(attribute);
        Ok(())
    }

    pub fn relationship(&self, name: &str) -> TranslatorResult<&'a DbRelationship> {
        let entity = self.entity;
        entity
            .relationship(name)
            .ok_or_else(|| CatalogError::relationship(&entity.name, name).into())
    }

    /// Passes through `relationship` on the way to a later segment. A
    /// belongs-to hop also pre-fetches the target primary key.
    pub fn traverse(
        &mut self,
        relationship: &'a DbRelationship,
        key: PathSegment,
    ) -> TranslatorResult<()> {
        let target = self.join(relationship, key)?;
        if relationship.is_belongs_to(target) {
            for pk in target.primary_keys() {
                self.result
                    .prefetched
                    .push((self.current_path.clone(), pk.clone()));
            }
        }
        Ok(())
    }

    /// Joins the target of `relationship` and moves onto it.
    fn join(
        &mut self,
        relationship: &'a DbRelationship,
        key: PathSegment,
    ) -> TranslatorResult<&'a DbEntity> {
        let target = self.scope.catalog.target_of(relationship)?;
        let join_type = if key.outer {
            JoinType::Left
        } else {
            JoinType::Inner
        };
        let path = self.current_path.child(key);
        self.scope
            .table_tree
            .add_join(path.clone(), relationship, target, join_type, None);
        self.current_path = path;
        self.entity = target;
        Ok(target)
    }

    /// Ends the walk on `relationship`. A to-one relationship that points
    /// exactly at the target primary key resolves to the source foreign key
    /// without a join; anything else joins the target and uses its primary
    /// key.
    pub fn terminate(
        &mut self,
        relationship: &'a DbRelationship,
        key: PathSegment,
    ) -> TranslatorResult<()> {
        let target = self.scope.catalog.target_of(relationship)?;
        self.result.relationship = Some(relationship.clone());

        if relationship.to_many || !relationship.is_exact_to_pk(target) {
            self.join(relationship, key)?;
            let pks: Vec<&'a DbAttribute> = target.primary_keys().collect();
            if pks.is_empty() {
                return Err(TranslatorError::PrimaryKeyMismatch {
                    entity: target.name.clone(),
                    count: 0,
                });
            }
            for pk in pks {
                self.push(pk);
            }
            return Ok(());
        }

        for join in &relationship.joins {
            self.attribute(&join.source_name)?;
        }
        self.result.fk_shortcut = true;
        self.final_path = Some(self.current_path.child(key));
        Ok(())
    }

    pub fn set_embeddable(&mut self, embeddable: Embeddable) {
        self.result.embeddable = Some(embeddable);
    }

    pub fn finish(mut self) -> PathTranslationResult {
        self.result.final_path = self.final_path.unwrap_or(self.current_path);
        self.result
    }
}

pub(super) fn translate<'a>(
    scope: PathScope<'_, 'a>,
    entity: &'a DbEntity,
    path: &Path,
    start: Path,
) -> TranslatorResult<PathTranslationResult> {
    let steps = expand_steps(path, scope.aliases);
    let mut walker = DbWalker::new(scope, entity, start);

    for (i, step) in steps.iter().enumerate() {
        let current = walker.entity;
        let last = i + 1 == steps.len();

        if let Some(alias) = &step.aliased {
            if current.relationship(&step.name).is_none() {
                return Err(TranslatorError::AliasNotRelationship {
                    alias: alias.clone(),
                    target: step.name.clone(),
                });
            }
        }

        if current.attribute(&step.name).is_some() {
            if !last {
                return Err(unresolved(&current.name, path, &steps[i + 1].name));
            }
            walker.attribute(&step.name)?;
        } else if let Some(relationship) = current.relationship(&step.name) {
            if last {
                walker.terminate(relationship, step.key.clone())?;
            } else {
                walker.traverse(relationship, step.key.clone())?;
            }
        } else {
            return Err(unresolved(&current.name, path, &step.name));
        }
    }

    Ok(walker.finish())
}
