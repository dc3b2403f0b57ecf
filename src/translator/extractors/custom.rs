use crate::entity_catalog::ObjEntity;
use crate::expression::{Expression, Path};
use crate::query::{Property, PropertyKind};
use crate::sql_tree::builder::{aliased, attribute_column};
use crate::translator::context::TranslatorContext;
use crate::translator::errors::{TranslatorError, TranslatorResult};
use crate::translator::result::{ResultGroup, ResultNodeDescriptor};

use super::{ColumnExtractor, DescriptorColumnExtractor, IdColumnExtractor};

/// Columns listed explicitly on the query, in order.
pub struct CustomColumnExtractor<'a> {
    pub columns: &'a [Property],
}

impl<'a> ColumnExtractor<'a> for CustomColumnExtractor<'a> {
    fn extract(&self, ctx: &mut TranslatorContext<'a>, _prefix: &Path) -> TranslatorResult<()> {
        for property in self.columns {
            check_not_to_many(ctx, property)?;
        }

        for property in self.columns {
            match property.kind {
                PropertyKind::FullObject => full_object(ctx, property)?,
                PropertyKind::Embedded => embedded(ctx, property)?,
                PropertyKind::Scalar => scalar(ctx, property)?,
            }
        }
        Ok(())
    }
}

/// A to-many relationship yields many values per row; it can only be
/// selected through an aggregate or as full objects.
fn check_not_to_many(ctx: &TranslatorContext<'_>, property: &Property) -> TranslatorResult<()> {
    if property.kind != PropertyKind::Scalar || property.is_aggregate() {
        return Ok(());
    }

    let to_many = match &property.expression {
        Expression::ObjPath(path) => ctx.root_obj.is_some_and(|entity| {
            ctx.catalog
                .terminal_relationship(entity, path)
                .is_some_and(|rel| rel.to_many && path.last().is_some_and(|s| s.name == rel.name))
        }),
        Expression::DbPath(path) => ends_on_to_many_db_relationship(ctx, path),
        _ => false,
    };

    if to_many {
        return Err(TranslatorError::InvalidQuery(format!(
            "to-many relationship `{}` can't be selected as a column, \
             select an aggregate or the full objects instead",
            property.expression
        )));
    }
    Ok(())
}

fn ends_on_to_many_db_relationship(ctx: &TranslatorContext<'_>, path: &Path) -> bool {
    let mut entity = ctx.root_db;
    let mut to_many = false;
    for segment in path.segments() {
        match entity.relationship(&segment.name) {
            Some(relationship) => {
                to_many = relationship.to_many;
                match ctx.catalog.target_of(relationship) {
                    Ok(target) => entity = target,
                    Err(_) => return false,
                }
            }
            None => to_many = false,
        }
    }
    to_many
}

fn full_object(ctx: &mut TranslatorContext<'_>, property: &Property) -> TranslatorResult<()> {
    let root = ctx.root_obj.ok_or_else(|| {
        TranslatorError::InvalidQuery(format!(
            "full object column `{}` needs a query rooted at an object entity",
            property.expression
        ))
    })?;

    let path = match &property.expression {
        Expression::FullObject(None) => Path::root(),
        Expression::ObjPath(path) => path.clone(),
        Expression::FullObject(Some(inner)) => match inner.as_ref() {
            Expression::ObjPath(path) => path.clone(),
            other => {
                return Err(TranslatorError::InvalidQuery(format!(
                    "full object column must be a relationship path, got `{}`",
                    other
                )))
            }
        },
        other => {
            return Err(TranslatorError::InvalidQuery(format!(
                "full object column must be a relationship path, got `{}`",
                other
            )))
        }
    };

    if path.is_empty() {
        extract_object(ctx, root, &Path::root())?;
        ctx.mark_root_segment_end();
        return Ok(());
    }

    let catalog = ctx.catalog;
    let relationship = catalog
        .terminal_relationship(root, &path)
        .filter(|rel| path.last().is_some_and(|s| s.name == rel.name))
        .ok_or_else(|| {
            TranslatorError::InvalidQuery(format!("`{}` does not end on a relationship", path))
        })?;
    let target = catalog.obj_entity(&relationship.target_entity)?;
    let db_path = catalog.obj_path_to_db_path(root, &path)?;
    let (joined, _) = ctx.join_db_path(&db_path, true, None)?;

    // the related object reads its row without the path prefix
    let start = ctx.result_nodes.len();
    extract_object(ctx, target, &joined)?;
    for node in &mut ctx.result_nodes[start..] {
        node.data_row_key = None;
        node.property = Some(property.clone());
    }
    Ok(())
}

fn extract_object<'a>(
    ctx: &mut TranslatorContext<'a>,
    entity: &'a ObjEntity,
    prefix: &Path,
) -> TranslatorResult<()> {
    if ctx.query.is_paginated() {
        IdColumnExtractor {
            db_entity: ctx.catalog.db_entity_for(entity)?,
            obj_entity: Some(entity),
        }
        .extract(ctx, prefix)
    } else {
        DescriptorColumnExtractor { entity }.extract(ctx, prefix)
    }
}

fn embedded(ctx: &mut TranslatorContext<'_>, property: &Property) -> TranslatorResult<()> {
    let (Some(root), Expression::ObjPath(path)) = (ctx.root_obj, &property.expression) else {
        return Err(TranslatorError::InvalidQuery(format!(
            "embedded column `{}` must be an object path",
            property.expression
        )));
    };

    let result = ctx.translate_obj_path(root, path, &Path::root())?;
    let embeddable = result.embeddable.as_ref().ok_or_else(|| {
        TranslatorError::InvalidQuery(format!("`{}` is not an embedded attribute", path))
    })?;
    let group = Some(ctx.add_result_group(ResultGroup::Embedded {
        embeddable: embeddable.class_name.clone(),
    }));

    for ((table_path, attribute), embeddable_attribute) in
        result.columns().zip(embeddable.attributes.iter())
    {
        let alias = ctx.table_tree.alias_for(table_path)?;
        let mut descriptor = ResultNodeDescriptor::attribute(
            attribute_column(&alias, attribute),
            attribute,
            format!("{}.{}", path, embeddable_attribute.name),
        )
        .in_group(group);
        descriptor.property = Some(property.clone());
        ctx.add_result_node(descriptor);
    }
    Ok(())
}

fn scalar(ctx: &mut TranslatorContext<'_>, property: &Property) -> TranslatorResult<()> {
    // a path to a multi-column relationship selects one column per key part
    let resolved = match (&property.expression, ctx.root_obj) {
        (Expression::ObjPath(path), Some(root)) => {
            Some(ctx.translate_obj_path(root, path, &Path::root())?)
        }
        (Expression::DbPath(path), _) => {
            let root = ctx.root_db;
            Some(ctx.translate_db_path(root, path, &Path::root())?)
        }
        _ => None,
    };
    if let Some(result) = resolved.filter(|r| r.is_multi_column()) {
        for (table_path, attribute) in result.columns() {
            let alias = ctx.table_tree.alias_for(table_path)?;
            let mut descriptor = ResultNodeDescriptor::attribute(
                attribute_column(&alias, attribute),
                attribute,
                format!("{}.{}", property.name(), attribute.name),
            );
            descriptor.property = Some(property.clone());
            ctx.add_result_node(descriptor);
        }
        return Ok(());
    }

    let mut node = ctx.translate_expression(&property.expression)?;
    if let Some(alias) = &property.alias {
        node = aliased(node, alias);
    }
    ctx.add_result_node(ResultNodeDescriptor::property(node, property));
    Ok(())
}
