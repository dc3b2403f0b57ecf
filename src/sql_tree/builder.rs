//! Small DSL for assembling [`SqlNode`] trees.

use super::SqlNode;
use crate::entity_catalog::DbAttribute;
use crate::expression::Value;

/// Column of an aliased table.
pub fn column(table: &str, name: &str) -> SqlNode {
    SqlNode::Column {
        table: Some(table.to_string()),
        name: name.to_string(),
        attribute: None,
    }
}

/// Column bound to its db attribute, used for type inference downstream.
pub fn attribute_column(table: &str, attribute: &DbAttribute) -> SqlNode {
    SqlNode::Column {
        table: Some(table.to_string()),
        name: attribute.name.clone(),
        attribute: Some(attribute.clone()),
    }
}

pub fn value(value: Value) -> SqlNode {
    SqlNode::Value {
        value,
        attribute: None,
        binding: false,
    }
}

pub fn bound_value(value: Value, attribute: Option<DbAttribute>) -> SqlNode {
    SqlNode::Value {
        value,
        attribute,
        binding: true,
    }
}

pub fn op(op: &str, operands: Vec<SqlNode>) -> SqlNode {
    SqlNode::Op {
        op: op.to_string(),
        operands,
    }
}

pub fn eq(left: SqlNode, right: SqlNode) -> SqlNode {
    op("=", vec![left, right])
}

/// Conjunction of the non-empty nodes. A single node is returned unwrapped.
pub fn and(nodes: Vec<SqlNode>) -> SqlNode {
    fold("AND", nodes)
}

pub fn or(nodes: Vec<SqlNode>) -> SqlNode {
    fold("OR", nodes)
}

fn fold(operator: &str, nodes: Vec<SqlNode>) -> SqlNode {
    let mut nodes: Vec<SqlNode> = nodes.into_iter().filter(|n| !n.is_empty()).collect();
    match nodes.len() {
        0 => SqlNode::Empty,
        1 => nodes.remove(0),
        _ => op(operator, nodes),
    }
}

/// ANDs `node` onto an optional accumulated qualifier.
pub fn and_fold(existing: Option<SqlNode>, node: SqlNode) -> Option<SqlNode> {
    if node.is_empty() {
        return existing;
    }
    Some(match existing {
        Some(SqlNode::Op { op, mut operands }) if op == "AND" => {
            operands.push(node);
            SqlNode::Op { op, operands }
        }
        Some(prev) => and(vec![prev, node]),
        None => node,
    })
}

pub fn function(name: &str, args: Vec<SqlNode>) -> SqlNode {
    SqlNode::Function {
        name: name.to_string(),
        args,
        aggregate: false,
        parens: true,
    }
}

pub fn aliased(node: SqlNode, alias: &str) -> SqlNode {
    SqlNode::Aliased {
        node: Box::new(node),
        alias: alias.to_string(),
    }
}

pub fn text(text: &str) -> SqlNode {
    SqlNode::Text(text.to_string())
}
