//! Generic SQL node tree.
//!
//! The translator assembles a [`SelectNode`] out of owned [`SqlNode`]
//! expressions. Rendering lives in [`render`]; optional per-type rewrites in
//! [`type_processors`].

pub mod builder;
pub mod errors;
pub mod render;
pub mod type_processors;

use crate::entity_catalog::DbAttribute;
use crate::expression::Value;
use crate::query::SortOrder;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlNode {
    Column {
        table: Option<String>,
        name: String,
        attribute: Option<DbAttribute>,
    },
    Value {
        value: Value,
        attribute: Option<DbAttribute>,
        /// Rendered as a `?` parameter instead of an inline literal.
        binding: bool,
    },
    /// Infix operator applied to two or more operands.
    Op {
        op: String,
        operands: Vec<SqlNode>,
    },
    Not(Box<SqlNode>),
    Negate(Box<SqlNode>),
    BitwiseNot(Box<SqlNode>),
    IsNull {
        operand: Box<SqlNode>,
        not: bool,
    },
    In {
        operand: Box<SqlNode>,
        values: Box<SqlNode>,
        not: bool,
    },
    Between {
        operand: Box<SqlNode>,
        lower: Box<SqlNode>,
        upper: Box<SqlNode>,
        not: bool,
    },
    Like {
        operand: Box<SqlNode>,
        pattern: Box<SqlNode>,
        not: bool,
        ignore_case: bool,
        escape: Option<char>,
    },
    Function {
        name: String,
        args: Vec<SqlNode>,
        aggregate: bool,
        /// `false` renders `NAME arg` instead of `NAME(arg)`.
        parens: bool,
    },
    Case {
        whens: Vec<(SqlNode, SqlNode)>,
        otherwise: Option<Box<SqlNode>>,
    },
    List(Vec<SqlNode>),
    Aliased {
        node: Box<SqlNode>,
        alias: String,
    },
    Subquery(Box<SelectNode>),
    Text(String),
    Empty,
}

impl SqlNode {
    pub fn is_empty(&self) -> bool {
        matches!(self, SqlNode::Empty)
    }

    /// Db attribute bound to this node, looking through an alias wrapper.
    pub fn attribute(&self) -> Option<&DbAttribute> {
        match self {
            SqlNode::Column { attribute, .. } | SqlNode::Value { attribute, .. } => {
                attribute.as_ref()
            }
            SqlNode::Aliased { node, .. } => node.attribute(),
            _ => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        match self {
            SqlNode::Function {
                aggregate: true, ..
            } => true,
            SqlNode::Subquery(_) => false,
            other => other.children().iter().any(|c| c.is_aggregate()),
        }
    }

    pub fn children(&self) -> Vec<&SqlNode> {
        match self {
            SqlNode::Op { operands, .. } => operands.iter().collect(),
            SqlNode::Function { args, .. } => args.iter().collect(),
            SqlNode::List(items) => items.iter().collect(),
            SqlNode::Not(n) | SqlNode::Negate(n) | SqlNode::BitwiseNot(n) => vec![n.as_ref()],
            SqlNode::Aliased { node, .. } => vec![node.as_ref()],
            SqlNode::IsNull { operand, .. } => vec![operand.as_ref()],
            SqlNode::In {
                operand, values, ..
            } => vec![operand.as_ref(), values.as_ref()],
            SqlNode::Between {
                operand,
                lower,
                upper,
                ..
            } => vec![operand.as_ref(), lower.as_ref(), upper.as_ref()],
            SqlNode::Like {
                operand, pattern, ..
            } => vec![operand.as_ref(), pattern.as_ref()],
            SqlNode::Case { whens, otherwise } => {
                let mut out: Vec<&SqlNode> = Vec::new();
                for (when, then) in whens {
                    out.push(when);
                    out.push(then);
                }
                if let Some(e) = otherwise {
                    out.push(e.as_ref());
                }
                out
            }
            _ => Vec::new(),
        }
    }

    /// Structural form used to decide whether two expressions select the
    /// same thing: alias wrappers are dropped, value binding flags and bound
    /// attributes are ignored.
    pub fn normalized(&self) -> SqlNode {
        match self {
            SqlNode::Aliased { node, .. } => node.normalized(),
            SqlNode::Column { table, name, .. } => SqlNode::Column {
                table: table.clone(),
                name: name.clone(),
                attribute: None,
            },
            SqlNode::Value { value, .. } => SqlNode::Value {
                value: value.clone(),
                attribute: None,
                binding: false,
            },
            SqlNode::Op { op, operands } => SqlNode::Op {
                op: op.clone(),
                operands: operands.iter().map(|n| n.normalized()).collect(),
            },
            SqlNode::Function {
                name,
                args,
                aggregate,
                parens,
            } => SqlNode::Function {
                name: name.to_uppercase(),
                args: args.iter().map(|n| n.normalized()).collect(),
                aggregate: *aggregate,
                parens: *parens,
            },
            SqlNode::Not(n) => SqlNode::Not(Box::new(n.normalized())),
            SqlNode::Negate(n) => SqlNode::Negate(Box::new(n.normalized())),
            SqlNode::BitwiseNot(n) => SqlNode::BitwiseNot(Box::new(n.normalized())),
            SqlNode::List(items) => SqlNode::List(items.iter().map(|n| n.normalized()).collect()),
            other => other.clone(),
        }
    }

    /// Applies `f` bottom-up to every node, subqueries included.
    pub fn transform<F: FnMut(SqlNode) -> SqlNode>(self, f: &mut F) -> SqlNode {
        let node = match self {
            SqlNode::Op { op, operands } => SqlNode::Op {
                op,
                operands: operands.into_iter().map(|n| n.transform(f)).collect(),
            },
            SqlNode::Function {
                name,
                args,
                aggregate,
                parens,
            } => SqlNode::Function {
                name,
                args: args.into_iter().map(|n| n.transform(f)).collect(),
                aggregate,
                parens,
            },
            SqlNode::List(items) => {
                SqlNode::List(items.into_iter().map(|n| n.transform(f)).collect())
            }
            SqlNode::Not(n) => SqlNode::Not(Box::new(n.transform(f))),
            SqlNode::Negate(n) => SqlNode::Negate(Box::new(n.transform(f))),
            SqlNode::BitwiseNot(n) => SqlNode::BitwiseNot(Box::new(n.transform(f))),
            SqlNode::Aliased { node, alias } => SqlNode::Aliased {
                node: Box::new(node.transform(f)),
                alias,
            },
            SqlNode::IsNull { operand, not } => SqlNode::IsNull {
                operand: Box::new(operand.transform(f)),
                not,
            },
            SqlNode::In {
                operand,
                values,
                not,
            } => SqlNode::In {
                operand: Box::new(operand.transform(f)),
                values: Box::new(values.transform(f)),
                not,
            },
            SqlNode::Between {
                operand,
                lower,
                upper,
                not,
            } => SqlNode::Between {
                operand: Box::new(operand.transform(f)),
                lower: Box::new(lower.transform(f)),
                upper: Box::new(upper.transform(f)),
                not,
            },
            SqlNode::Like {
                operand,
                pattern,
                not,
                ignore_case,
                escape,
            } => SqlNode::Like {
                operand: Box::new(operand.transform(f)),
                pattern: Box::new(pattern.transform(f)),
                not,
                ignore_case,
                escape,
            },
            SqlNode::Case { whens, otherwise } => SqlNode::Case {
                whens: whens
                    .into_iter()
                    .map(|(w, t)| (w.transform(f), t.transform(f)))
                    .collect(),
                otherwise: otherwise.map(|e| Box::new(e.transform(f))),
            },
            SqlNode::Subquery(select) => SqlNode::Subquery(Box::new(select.transform(f))),
            leaf => leaf,
        };
        f(node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub on: SqlNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromItem {
    pub table: String,
    pub alias: String,
    /// `None` for the root table.
    pub join: Option<Join>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expression: SqlNode,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectNode {
    pub distinct: bool,
    pub columns: Vec<SqlNode>,
    pub from: Vec<FromItem>,
    pub where_clause: Option<SqlNode>,
    pub group_by: Vec<SqlNode>,
    pub having: Option<SqlNode>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SelectNode {
    pub fn transform<F: FnMut(SqlNode) -> SqlNode>(self, f: &mut F) -> SelectNode {
        SelectNode {
            distinct: self.distinct,
            columns: self.columns.into_iter().map(|n| n.transform(f)).collect(),
            from: self
                .from
                .into_iter()
                .map(|item| FromItem {
                    join: item.join.map(|j| Join {
                        join_type: j.join_type,
                        on: j.on.transform(f),
                    }),
                    ..item
                })
                .collect(),
            where_clause: self.where_clause.map(|n| n.transform(f)),
            group_by: self.group_by.into_iter().map(|n| n.transform(f)).collect(),
            having: self.having.map(|n| n.transform(f)),
            order_by: self
                .order_by
                .into_iter()
                .map(|item| OrderByItem {
                    expression: item.expression.transform(f),
                    order: item.order,
                })
                .collect(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}
