use crate::entity_catalog::{CatalogError, DbAttribute, DbEntity};
use crate::expression::{Expression, Path, PathMarker, Rewrite};
use crate::sql_tree::builder::{and, attribute_column, eq};
use crate::sql_tree::{FromItem, Join, JoinType, SqlNode};
use crate::translator::context::TranslatorContext;
use crate::translator::errors::{Stage, TranslatorError, TranslatorResult};
use crate::translator::table_tree::{TableTreeNode, TableTreeWorkQueue};

use super::TranslationStage;

/// ANDs the entity qualifiers of the root and the inner joined tables into
/// WHERE. Qualifiers of outer joined tables go into their ON clause instead
/// (see [`TableTreeStage`]).
pub struct TableTreeQualifierStage;

impl TranslationStage for TableTreeQualifierStage {
    fn stage(&self) -> Stage {
        Stage::TableTreeQualifier
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        let mut queue = TableTreeWorkQueue::new();
        while let Some(node_ref) = queue.next(&ctx.table_tree) {
            let node = ctx.table_tree.node(node_ref);
            if node.join_type == JoinType::Left {
                continue;
            }
            let path = node.path.clone();
            for qualifier in node_qualifiers(node) {
                let scoped = under(&qualifier, &path)?;
                let sql = ctx.translate_expression(&scoped)?;
                ctx.append_qualifier(sql);
            }
        }

        ctx.select.where_clause = ctx.qualifier.clone();
        Ok(())
    }
}

/// Emits FROM and one JOIN per table tree node, in the order the joins were
/// discovered.
pub struct TableTreeStage;

impl TranslationStage for TableTreeStage {
    fn stage(&self) -> Stage {
        Stage::TableTree
    }

    fn perform(&self, ctx: &mut TranslatorContext<'_>) -> TranslatorResult<()> {
        let mut from = Vec::new();
        let mut queue = TableTreeWorkQueue::new();

        while let Some(node_ref) = queue.next(&ctx.table_tree) {
            let node = ctx.table_tree.node(node_ref).clone();
            let Some(relationship) = node.relationship else {
                from.push(FromItem {
                    table: node.entity.fully_qualified_name(),
                    alias: node.alias.clone(),
                    join: None,
                });
                continue;
            };

            let source = ctx.catalog.db_entity(&relationship.source_entity)?;
            let parent_path = node.path.parent().unwrap_or_else(Path::root);
            let parent_alias = ctx.table_tree.alias_for(&parent_path)?;

            let mut conditions = Vec::with_capacity(relationship.joins.len());
            for join in &relationship.joins {
                conditions.push(eq(
                    attribute_column(&parent_alias, column_of(source, &join.source_name)?),
                    attribute_column(&node.alias, column_of(node.entity, &join.target_name)?),
                ));
            }

            if node.join_type == JoinType::Left {
                ctx.table_tree.set_active(Some(node_ref));
                let extra = outer_join_conditions(ctx, &node);
                ctx.table_tree.set_active(None);
                conditions.extend(extra?);
            }

            let on = and(conditions);
            if on.is_empty() {
                return Err(TranslatorError::Invariant(format!(
                    "relationship `{}` joins no columns",
                    relationship.name
                )));
            }
            from.push(FromItem {
                table: node.entity.fully_qualified_name(),
                alias: node.alias.clone(),
                join: Some(Join {
                    join_type: node.join_type,
                    on,
                }),
            });
        }

        ctx.select.from = from;
        Ok(())
    }
}

fn outer_join_conditions(
    ctx: &mut TranslatorContext<'_>,
    node: &TableTreeNode<'_>,
) -> TranslatorResult<Vec<SqlNode>> {
    let mut conditions = Vec::new();
    for qualifier in node_qualifiers(node) {
        let scoped = on_active(&qualifier, node)?;
        conditions.push(ctx.translate_expression(&scoped)?);
    }
    Ok(conditions)
}

fn node_qualifiers(node: &TableTreeNode<'_>) -> Vec<Expression> {
    [node.entity.qualifier.clone(), node.extra_qualifier.clone()]
        .into_iter()
        .flatten()
        .collect()
}

fn column_of<'e>(entity: &'e DbEntity, name: &str) -> TranslatorResult<&'e DbAttribute> {
    entity
        .attribute(name)
        .ok_or_else(|| CatalogError::attribute(&entity.name, name).into())
}

/// Moves every db path of `qualifier` below the table at `prefix`.
fn under(qualifier: &Expression, prefix: &Path) -> TranslatorResult<Expression> {
    if prefix.is_empty() {
        return Ok(qualifier.clone());
    }
    qualifier.rewrite(&mut |e| match e {
        Expression::DbPath(path) => Ok(Rewrite::Replaced(Expression::DbPath(prefix.join(path)))),
        _ => Ok(Rewrite::Descend),
    })
}

/// Like [`under`], except that plain columns of the node itself resolve
/// against the node being joined rather than through a fresh walk.
fn on_active(qualifier: &Expression, node: &TableTreeNode<'_>) -> TranslatorResult<Expression> {
    qualifier.rewrite(&mut |e| match e {
        Expression::DbPath(path) if path.len() == 1 => {
            let name = path.first().map(|s| s.name.as_str()).unwrap_or_default();
            if node.entity.attribute(name).is_some() {
                Ok(Rewrite::Replaced(Expression::DbPath(
                    path.clone().with_marker(PathMarker::CurrentAlias),
                )))
            } else {
                Ok(Rewrite::Replaced(Expression::DbPath(node.path.join(path))))
            }
        }
        Expression::DbPath(path) => Ok(Rewrite::Replaced(Expression::DbPath(node.path.join(path)))),
        _ => Ok(Rewrite::Descend),
    })
}
