use crate::config::PrefetchLimitPolicy;
use crate::entity_catalog::{DbEntity, ObjEntity};
use crate::expression::{Expression, Path, PathMarker, PathSegment};
use crate::query::PrefetchSemantics;
use crate::sql_tree::builder::attribute_column;
use crate::translator::context::TranslatorContext;
use crate::translator::errors::{Stage, TranslationWarning, TranslatorError, TranslatorResult};
use crate::translator::extractors::{ColumnExtractor, DescriptorColumnExtractor};
use crate::translator::path::unresolved;
use crate::translator::result::ResultNodeDescriptor;

use super::TranslationStage;

/// Joins joint prefetches into the statement and selects the ids of
/// disjoint-by-id prefetches.
pub struct PrefetchStage;

impl TranslationStage for PrefetchStage {
    fn stage(&self) -> Stage {
        Stage::PrefetchJoins
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        let query = ctx.query;
        let (Some(root), Some(prefetch)) = (ctx.root_obj, query.prefetch.as_ref()) else {
            return Ok(());
        };

        // paginated queries and subqueries select the root ids only
        if query.is_paginated() || ctx.is_nested() {
            log::debug!("PrefetchStage: id-only selection, prefetches ignored");
            return Ok(());
        }

        // explicit columns only carry prefetches along with the root object
        if !query.columns.is_empty()
            && !query
                .columns
                .iter()
                .any(|c| c.expression == Expression::FullObject(None))
        {
            log::debug!("PrefetchStage: no root object selected, prefetches ignored");
            return Ok(());
        }

        for (path, semantics) in prefetch.nodes() {
            match semantics {
                PrefetchSemantics::Joint => joint(ctx, root, &path)?,
                PrefetchSemantics::DisjointById => disjoint_by_id(ctx, root, &path)?,
                PrefetchSemantics::Disjoint => {}
            }
        }
        Ok(())
    }
}

fn joint<'a>(
    ctx: &mut TranslatorContext<'a>,
    root: &'a ObjEntity,
    path: &Path,
) -> TranslatorResult<()> {
    let catalog = ctx.catalog;
    let relationship = catalog
        .terminal_relationship(root, path)
        .filter(|rel| path.last().is_some_and(|s| s.name == rel.name))
        .ok_or_else(|| {
            TranslatorError::InvalidQuery(format!(
                "prefetch `{}` does not end on a relationship of {}",
                path, root.name
            ))
        })?;
    let target = catalog.obj_entity(&relationship.target_entity)?;
    let db_path = catalog
        .obj_path_to_db_path(root, path)?
        .with_marker(PathMarker::Prefetch);

    let query = ctx.query;
    if (query.limit > 0 || query.offset > 0) && crosses_to_many(ctx, &db_path)? {
        match ctx.config.prefetch_limit_policy {
            PrefetchLimitPolicy::Warn => ctx.warn(TranslationWarning::ToManyPrefetchWithLimit {
                path: path.to_string(),
            }),
            PrefetchLimitPolicy::Reject => {
                return Err(TranslatorError::PrefetchWithLimit {
                    path: path.to_string(),
                })
            }
        }
    }

    let extra_qualifier = match &target.qualifier {
        Some(qualifier) => Some(catalog.translate_to_db_expression(target, qualifier)?),
        None => None,
    };
    let (joined, _) = ctx.join_db_path(&db_path, true, extra_qualifier)?;

    ctx.set_splice_into_root(true);
    let extracted = DescriptorColumnExtractor { entity: target }.extract(ctx, &joined);
    ctx.set_splice_into_root(false);
    extracted
}

fn crosses_to_many(ctx: &TranslatorContext<'_>, db_path: &Path) -> TranslatorResult<bool> {
    let mut entity: &DbEntity = ctx.root_db;
    for segment in db_path.segments() {
        let relationship = entity
            .relationship(&segment.name)
            .ok_or_else(|| unresolved(&entity.name, db_path, &segment.name))?;
        if relationship.to_many {
            return Ok(true);
        }
        entity = ctx.catalog.target_of(relationship)?;
    }
    Ok(false)
}

/// Selects the target ids under the target path. Through a foreign key
/// shortcut the values come from the source columns, but are still labelled
/// with the target column names.
fn disjoint_by_id<'a>(
    ctx: &mut TranslatorContext<'a>,
    root: &'a ObjEntity,
    path: &Path,
) -> TranslatorResult<()> {
    // roots without related objects must still come back
    let outer = Path::from_segments(
        path.segments()
            .iter()
            .map(|s| PathSegment::outer(s.name.clone()))
            .collect(),
    );
    let result = ctx.translate_obj_path(root, &outer, &Path::root())?;
    let relationship = result.relationship.as_ref().ok_or_else(|| {
        TranslatorError::InvalidQuery(format!(
            "disjoint prefetch `{}` does not end on a relationship of {}",
            path, root.name
        ))
    })?;

    for (table_path, attribute) in result.columns() {
        let target_name = if result.fk_shortcut {
            relationship
                .joins
                .iter()
                .find(|j| j.source_name == attribute.name)
                .map(|j| j.target_name.as_str())
                .unwrap_or(attribute.name.as_str())
        } else {
            attribute.name.as_str()
        };
        let alias = ctx.table_tree.alias_for(table_path)?;
        let key = format!("{}.{}", path, target_name);
        ctx.add_result_node(ResultNodeDescriptor::attribute(
            attribute_column(&alias, attribute),
            attribute,
            key,
        ));
    }
    Ok(())
}
