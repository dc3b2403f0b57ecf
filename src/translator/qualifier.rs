//! Lowers query expressions into SQL nodes.
//!
//! Most expressions map one-to-one onto a node. A few are special forms that
//! replace a whole subtree: equality against a multi-column path expands into
//! one comparison per column, and EXISTS over a path becomes a correlated
//! subquery. Values nested inside another expression are bound as
//! parameters, typed by the db attribute of a sibling path when there is one.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entity_catalog::DbAttribute;
use crate::expression::{CompareOp, Expression, Path, PathMarker, Value};
use crate::sql_tree::builder::{and, attribute_column, bound_value, op, or, text, value as literal};
use crate::sql_tree::SqlNode;

use super::context::TranslatorContext;
use super::errors::{TranslatorError, TranslatorResult};
use super::exists;
use super::path::PathTranslationResult;

/// Outcome of the special-form check for one expression.
enum Lowering {
    Descend,
    Replaced(SqlNode),
}

#[derive(Debug, Clone, Default)]
struct Frame<'e> {
    /// Operand of another expression; values are bound as parameters.
    nested: bool,
    /// Attribute of a sibling path, used to type bound values.
    attribute: Option<DbAttribute>,
    /// Arrays are only accepted as the value list of IN.
    allow_array: bool,
    parent: Option<&'e Expression>,
}

impl<'e> Frame<'e> {
    fn child_of(parent: &'e Expression) -> Self {
        Frame {
            nested: true,
            attribute: None,
            allow_array: false,
            parent: Some(parent),
        }
    }

    fn with_attribute(mut self, attribute: Option<DbAttribute>) -> Self {
        self.attribute = attribute;
        self
    }
}

pub struct QualifierTranslator<'c, 'a> {
    ctx: &'c mut TranslatorContext<'a>,
}

impl<'c, 'a> QualifierTranslator<'c, 'a> {
    pub fn new(ctx: &'c mut TranslatorContext<'a>) -> Self {
        QualifierTranslator { ctx }
    }

    pub fn translate(&mut self, expression: &Expression) -> TranslatorResult<SqlNode> {
        self.lower(expression, &Frame::default())
    }

    fn lower(&mut self, expression: &Expression, frame: &Frame<'_>) -> TranslatorResult<SqlNode> {
        if let Lowering::Replaced(node) = self.special_form(expression)? {
            return Ok(node);
        }

        let child = Frame::child_of(expression);
        match expression {
            Expression::And(children) => Ok(and(self.lower_all(children, &child)?)),
            Expression::Or(children) => Ok(or(self.lower_all(children, &child)?)),
            Expression::Not(inner) => Ok(SqlNode::Not(Box::new(self.lower(inner, &child)?))),

            Expression::Compare { op: cmp, left, right } => {
                let sibling = self.sibling_attribute(&[left.as_ref(), right.as_ref()])?;
                let frame = child.with_attribute(sibling);
                let null_check = match (cmp, is_null(left), is_null(right)) {
                    (CompareOp::Equal | CompareOp::NotEqual, false, true) => Some(left),
                    (CompareOp::Equal | CompareOp::NotEqual, true, false) => Some(right),
                    _ => None,
                };
                if let Some(operand) = null_check {
                    return Ok(SqlNode::IsNull {
                        operand: Box::new(self.lower(operand, &frame)?),
                        not: *cmp == CompareOp::NotEqual,
                    });
                }
                Ok(op(
                    cmp.sql(),
                    vec![self.lower(left, &frame)?, self.lower(right, &frame)?],
                ))
            }

            Expression::Like {
                operand,
                pattern,
                ignore_case,
                not,
                escape,
            } => {
                let frame = child.with_attribute(self.sibling_attribute(&[operand.as_ref()])?);
                Ok(SqlNode::Like {
                    operand: Box::new(self.lower(operand, &frame)?),
                    pattern: Box::new(self.lower(pattern, &frame)?),
                    not: *not,
                    ignore_case: *ignore_case,
                    escape: *escape,
                })
            }

            Expression::In {
                operand,
                values,
                not,
            } => {
                let empty = match values.as_ref() {
                    Expression::List(items) => items.is_empty(),
                    Expression::Scalar(Value::Array(items)) => items.is_empty(),
                    _ => false,
                };
                if empty {
                    return Ok(text(if *not { "1=1" } else { "1=0" }));
                }

                let frame = child.with_attribute(self.sibling_attribute(&[operand.as_ref()])?);
                let list_frame = Frame {
                    allow_array: true,
                    ..frame.clone()
                };
                Ok(SqlNode::In {
                    operand: Box::new(self.lower(operand, &frame)?),
                    values: Box::new(self.lower(values, &list_frame)?),
                    not: *not,
                })
            }

            Expression::Between {
                operand,
                lower,
                upper,
                not,
            } => {
                let frame = child.with_attribute(self.sibling_attribute(&[operand.as_ref()])?);
                Ok(SqlNode::Between {
                    operand: Box::new(self.lower(operand, &frame)?),
                    lower: Box::new(self.lower(lower, &frame)?),
                    upper: Box::new(self.lower(upper, &frame)?),
                    not: *not,
                })
            }

            Expression::Arithmetic { op: arith, operands } => {
                let refs: Vec<&Expression> = operands.iter().collect();
                let frame = child.with_attribute(self.sibling_attribute(&refs)?);
                Ok(op(arith.sql(), self.lower_all(operands, &frame)?))
            }

            Expression::Negate(inner) => Ok(SqlNode::Negate(Box::new(self.lower(inner, &child)?))),
            Expression::BitwiseNot(inner) => {
                Ok(SqlNode::BitwiseNot(Box::new(self.lower(inner, &child)?)))
            }

            Expression::ObjPath(_) | Expression::DbPath(_) | Expression::DbIdPath(_) => {
                let result = self.resolve_path(expression)?;
                self.path_column(&result)
            }

            Expression::Scalar(v) => self.lower_value(v, frame),

            Expression::List(items) => {
                let frame = Frame {
                    allow_array: false,
                    ..child.with_attribute(frame.attribute.clone())
                };
                Ok(SqlNode::List(self.lower_all(items, &frame)?))
            }

            Expression::Function {
                name,
                args,
                aggregate,
            } => Ok(SqlNode::Function {
                name: name.clone(),
                args: self.lower_all(args, &child)?,
                aggregate: *aggregate,
                parens: true,
            }),

            Expression::Exists(inner) => self.keyword("EXISTS", inner, &child),
            Expression::NotExists(inner) => self.keyword("NOT EXISTS", inner, &child),
            Expression::All(inner) => self.keyword("ALL", inner, &child),
            Expression::Any(inner) => self.keyword("ANY", inner, &child),

            Expression::Subquery(query) => Ok(SqlNode::Subquery(Box::new(
                self.ctx.translate_subquery(query)?,
            ))),

            Expression::EnclosingObject(inner) => self.ctx.translate_in_parent(inner),

            Expression::FullObject(None) => self.root_identity(),
            Expression::FullObject(Some(inner)) => self.lower(inner, frame),

            Expression::Case { whens, otherwise } => {
                let mut lowered = Vec::with_capacity(whens.len());
                for (when, then) in whens {
                    lowered.push((self.lower(when, &child)?, self.lower(then, &child)?));
                }
                let otherwise = match otherwise {
                    Some(e) => Some(Box::new(self.lower(e, &child)?)),
                    None => None,
                };
                Ok(SqlNode::Case {
                    whens: lowered,
                    otherwise,
                })
            }

            Expression::True => Ok(text("1=1")),
            Expression::False => Ok(text("1=0")),
            Expression::Asterisk => Ok(text("*")),
        }
    }

    fn lower_all(
        &mut self,
        expressions: &[Expression],
        frame: &Frame<'_>,
    ) -> TranslatorResult<Vec<SqlNode>> {
        expressions.iter().map(|e| self.lower(e, frame)).collect()
    }

    fn keyword(
        &mut self,
        name: &str,
        inner: &Expression,
        frame: &Frame<'_>,
    ) -> TranslatorResult<SqlNode> {
        Ok(SqlNode::Function {
            name: name.to_string(),
            args: vec![self.lower(inner, frame)?],
            aggregate: false,
            parens: false,
        })
    }

    fn special_form(&mut self, expression: &Expression) -> TranslatorResult<Lowering> {
        match expression {
            Expression::Compare {
                op: cmp @ (CompareOp::Equal | CompareOp::NotEqual),
                left,
                right,
            } => self.multi_column_match(*cmp, left, right),
            Expression::Exists(inner) | Expression::NotExists(inner)
                if !matches!(inner.as_ref(), Expression::Subquery(_)) =>
            {
                let expanded = exists::expand(self.ctx, expression)?;
                log::debug!("QualifierTranslator: `{}` expanded to `{}`", expression, expanded);
                Ok(Lowering::Replaced(self.lower(&expanded, &Frame::default())?))
            }
            _ => Ok(Lowering::Descend),
        }
    }

    /// Equality between a multi-column path and an id, embedded value or
    /// NULL: AND of per-column equalities, or OR of inequalities.
    fn multi_column_match(
        &mut self,
        cmp: CompareOp,
        left: &Expression,
        right: &Expression,
    ) -> TranslatorResult<Lowering> {
        let (path, other) = if left.is_path() {
            (left, right)
        } else if right.is_path() {
            (right, left)
        } else {
            return Ok(Lowering::Descend);
        };

        let result = self.resolve_path(path)?;
        if !result.is_multi_column() {
            return Ok(Lowering::Descend);
        }
        let snapshot = match_snapshot(&result, path, other)?;

        let mut nodes = Vec::with_capacity(result.attributes.len());
        for (table_path, attribute) in result.columns() {
            let column = attribute_column(&self.ctx.table_tree.alias_for(table_path)?, attribute);
            let value = match &snapshot {
                None => Value::Null,
                Some(snapshot) => snapshot.get(&attribute.name).cloned().ok_or_else(|| {
                    TranslatorError::InvalidQuery(format!(
                        "`{}` has no value for column `{}` of `{}`",
                        other, attribute.name, path
                    ))
                })?,
            };
            nodes.push(if value.is_null() {
                SqlNode::IsNull {
                    operand: Box::new(column),
                    not: cmp == CompareOp::NotEqual,
                }
            } else {
                op(cmp.sql(), vec![column, bound_value(value, Some(attribute.clone()))])
            });
        }

        Ok(Lowering::Replaced(match cmp {
            CompareOp::Equal => and(nodes),
            _ => or(nodes),
        }))
    }

    fn resolve_path(
        &mut self,
        expression: &Expression,
    ) -> TranslatorResult<Arc<PathTranslationResult>> {
        match expression {
            Expression::ObjPath(path) => {
                let entity = self.ctx.root_obj.ok_or_else(|| {
                    TranslatorError::InvalidQuery(format!(
                        "object path `{}` used in a query rooted at db entity `{}`",
                        path, self.ctx.root_db.name
                    ))
                })?;
                self.ctx.translate_obj_path(entity, path, &Path::root())
            }
            Expression::DbPath(path) => {
                let entity = if path.marker() == PathMarker::CurrentAlias {
                    self.ctx
                        .table_tree
                        .active()
                        .map(|node| node.entity)
                        .ok_or_else(|| TranslatorError::MissingActiveNode {
                            path: path.to_string(),
                        })?
                } else {
                    self.ctx.root_db
                };
                self.ctx.translate_db_path(entity, path, &Path::root())
            }
            Expression::DbIdPath(path) => Ok(Arc::new(self.ctx.translate_id_path(path)?)),
            other => Err(TranslatorError::Invariant(format!(
                "`{}` is not a path",
                other
            ))),
        }
    }

    fn path_column(&self, result: &PathTranslationResult) -> TranslatorResult<SqlNode> {
        match (result.last_attribute(), result.last_attribute_path()) {
            (Some(attribute), Some(table_path)) => Ok(attribute_column(
                &self.ctx.table_tree.alias_for(table_path)?,
                attribute,
            )),
            _ => Ok(SqlNode::Empty),
        }
    }

    /// Last attribute of the first path among `operands`.
    fn sibling_attribute(
        &mut self,
        operands: &[&Expression],
    ) -> TranslatorResult<Option<DbAttribute>> {
        for operand in operands {
            if operand.is_path() {
                let result = self.resolve_path(operand)?;
                return Ok(result.last_attribute().cloned());
            }
        }
        Ok(None)
    }

    fn lower_value(&mut self, v: &Value, frame: &Frame<'_>) -> TranslatorResult<SqlNode> {
        let v = match v {
            Value::Array(_) if !frame.allow_array => {
                return Err(TranslatorError::ArrayArgument(
                    frame
                        .parent
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| v.to_string()),
                ));
            }
            Value::ObjectId(_) | Value::Persistent(_) => single_id_value(v)?,
            Value::Embedded(_) => {
                return Err(TranslatorError::InvalidQuery(format!(
                    "embedded value `{}` can only be compared with its embedded path",
                    v
                )));
            }
            other => other.clone(),
        };

        if frame.nested {
            Ok(bound_value(v, frame.attribute.clone()))
        } else {
            Ok(literal(v))
        }
    }

    /// Root table primary key column; the entity must have exactly one.
    fn root_identity(&self) -> TranslatorResult<SqlNode> {
        let root = self.ctx.root_db;
        let pks: Vec<&DbAttribute> = root.primary_keys().collect();
        match pks.as_slice() {
            [pk] => Ok(attribute_column(self.ctx.table_tree.root_alias(), pk)),
            _ => Err(TranslatorError::PrimaryKeyMismatch {
                entity: root.name.clone(),
                count: pks.len(),
            }),
        }
    }
}

fn is_null(expression: &Expression) -> bool {
    matches!(expression, Expression::Scalar(Value::Null))
}

/// Collapses an id with a single column into that column's value.
fn single_id_value(v: &Value) -> TranslatorResult<Value> {
    match v.id_snapshot() {
        Some(snapshot) if snapshot.len() == 1 => Ok(snapshot
            .values()
            .next()
            .cloned()
            .unwrap_or(Value::Null)),
        _ => Err(TranslatorError::InvalidQuery(format!(
            "multi-column id `{}` can't be compared with a single column",
            v
        ))),
    }
}

/// Values keyed by column name for each column of a multi-column path.
/// `None` compares every column with NULL.
fn match_snapshot(
    result: &PathTranslationResult,
    path: &Expression,
    other: &Expression,
) -> TranslatorResult<Option<BTreeMap<String, Value>>> {
    let invalid = |reason: &str| {
        TranslatorError::InvalidQuery(format!(
            "can't match `{}` against multi-column `{}`: {}",
            other, path, reason
        ))
    };

    let v = match other {
        Expression::Scalar(v) => v,
        e if e.is_path() => return Err(invalid("path to path comparison is not supported")),
        _ => return Err(invalid("expected an id, an embedded value or NULL")),
    };

    if v.is_null() {
        return Ok(None);
    }

    if let Value::Embedded(embedded) = v {
        let embeddable = result
            .embeddable
            .as_ref()
            .ok_or_else(|| invalid("path does not end on an embedded attribute"))?;
        let snapshot = embeddable
            .attributes
            .iter()
            .zip(result.attributes.iter())
            .map(|(property, attribute)| {
                let v = embedded
                    .properties
                    .get(&property.name)
                    .cloned()
                    .unwrap_or(Value::Null);
                (attribute.name.clone(), v)
            })
            .collect();
        return Ok(Some(snapshot));
    }

    let id = v
        .id_snapshot()
        .ok_or_else(|| invalid("expected an id, an embedded value or NULL"))?;
    let snapshot = match &result.relationship {
        Some(relationship) if result.fk_shortcut => {
            relationship.src_fk_snapshot_with_target_snapshot(id)?
        }
        _ => id.clone(),
    };
    if snapshot.len() != result.attributes.len() {
        return Err(invalid(&format!(
            "id has {} columns, path has {}",
            snapshot.len(),
            result.attributes.len()
        )));
    }
    Ok(Some(snapshot))
}
