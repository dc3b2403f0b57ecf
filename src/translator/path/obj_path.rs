use crate::entity_catalog::ObjEntity;
use crate::expression::{Path, PathSegment};
use crate::translator::errors::{TranslatorError, TranslatorResult};

use super::db_path::DbWalker;
use super::{expand_steps, unresolved, PathScope, PathTranslationResult};

/// Resolves an object path by mapping every property onto the db hops and
/// columns behind it. Joins are keyed by db relationship names, so an object
/// path and the equivalent db path share their joins.
pub(super) fn translate<'a>(
    scope: PathScope<'_, 'a>,
    entity: &'a ObjEntity,
    path: &Path,
    start: Path,
) -> TranslatorResult<PathTranslationResult> {
    let catalog = scope.catalog;
    let steps = expand_steps(path, scope.aliases);
    let mut walker = DbWalker::new(scope, catalog.db_entity_for(entity)?, start);
    let mut current = entity;

    let mut i = 0;
    while i < steps.len() {
        let step = &steps[i];
        let last = i + 1 == steps.len();

        if let Some(alias) = &step.aliased {
            if current.relationship(&step.name).is_none() {
                return Err(TranslatorError::AliasNotRelationship {
                    alias: alias.clone(),
                    target: step.name.clone(),
                });
            }
        }

        if let Some(attribute) = current.attribute(&step.name) {
            if !last {
                return Err(unresolved(&current.name, path, &steps[i + 1].name));
            }
            let hops: Vec<&str> = attribute.db_attribute_path.split('.').collect();
            if let Some((column, relationships)) = hops.split_last() {
                for hop in relationships {
                    let relationship = walker.relationship(hop)?;
                    walker.traverse(
                        relationship,
                        PathSegment {
                            name: hop.to_string(),
                            outer: step.key.outer,
                        },
                    )?;
                }
                walker.attribute(column)?;
            }
        } else if let Some(embedded) = current.embedded_attribute(&step.name) {
            let embeddable = catalog.embeddable(&embedded.embeddable)?;
            if last {
                for property in &embeddable.attributes {
                    walker.attribute(embedded.column_for(property))?;
                }
                walker.set_embeddable(embeddable.clone());
            } else {
                let next = &steps[i + 1];
                let property = embeddable
                    .attribute(&next.name)
                    .ok_or_else(|| unresolved(&embeddable.class_name, path, &next.name))?;
                if let Some(extra) = steps.get(i + 2) {
                    return Err(unresolved(&embeddable.class_name, path, &extra.name));
                }
                walker.attribute(embedded.column_for(property))?;
                i += 1;
            }
        } else if let Some(relationship) = current.relationship(&step.name) {
            let hops: Vec<&str> = relationship.db_relationship_path.split('.').collect();
            for (j, hop) in hops.iter().enumerate() {
                let db_relationship = walker.relationship(hop)?;
                let key = match (&step.aliased, j) {
                    (Some(_), 0) => step.key.clone(),
                    _ => PathSegment {
                        name: hop.to_string(),
                        outer: step.key.outer,
                    },
                };
                if last && j + 1 == hops.len() {
                    walker.terminate(db_relationship, key)?;
                } else {
                    walker.traverse(db_relationship, key)?;
                }
            }
            current = walker.catalog().obj_entity(&relationship.target_entity)?;
        } else {
            return Err(unresolved(&current.name, path, &step.name));
        }

        i += 1;
    }

    Ok(walker.finish())
}
