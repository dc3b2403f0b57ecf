//! Renders a [`SelectNode`] to SQL text plus ordered parameter bindings.

use super::errors::SqlRenderError;
use super::{FromItem, JoinType, OrderByItem, SelectNode, SqlNode};
use crate::entity_catalog::{DbAttribute, JdbcType};
use crate::expression::Value;
use crate::query::SortOrder;

/// One `?` parameter, in the order it appears in the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub value: Value,
    pub jdbc_type: JdbcType,
    pub attribute: Option<DbAttribute>,
}

#[derive(Debug, Default)]
pub struct SqlWriter {
    sql: String,
    bindings: Vec<Binding>,
}

impl SqlWriter {
    pub fn new() -> Self {
        SqlWriter::default()
    }

    pub fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn bind(&mut self, value: &Value, attribute: Option<&DbAttribute>) {
        let jdbc_type = attribute
            .map(|a| a.jdbc_type)
            .unwrap_or_else(|| value.jdbc_type());
        self.bindings.push(Binding {
            value: value.clone(),
            jdbc_type,
            attribute: attribute.cloned(),
        });
        self.sql.push('?');
    }

    pub fn finish(self) -> (String, Vec<Binding>) {
        (self.sql, self.bindings)
    }
}

pub trait ToSql {
    fn to_sql(&self, out: &mut SqlWriter) -> Result<(), SqlRenderError>;
}

/// Renders a complete statement.
pub fn render(select: &SelectNode) -> Result<(String, Vec<Binding>), SqlRenderError> {
    let mut writer = SqlWriter::new();
    select.to_sql(&mut writer)?;
    Ok(writer.finish())
}

impl ToSql for SelectNode {
    fn to_sql(&self, out: &mut SqlWriter) -> Result<(), SqlRenderError> {
        if self.from.is_empty() {
            return Err(SqlRenderError::NoFromClause);
        }

        out.push_str("SELECT ");
        if self.distinct {
            out.push_str("DISTINCT ");
        }
        write_list(out, &self.columns, ", ")?;

        out.push_str(" FROM ");
        for (i, item) in self.from.iter().enumerate() {
            if i > 0 {
                out.push_str(if item.join.is_some() { " " } else { ", " });
            }
            item.to_sql(out)?;
        }

        if let Some(qualifier) = &self.where_clause {
            out.push_str(" WHERE ");
            qualifier.to_sql(out)?;
        }

        if !self.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            write_list(out, &self.group_by, ", ")?;
        }

        if let Some(having) = &self.having {
            out.push_str(" HAVING ");
            having.to_sql(out)?;
        }

        if !self.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            for (i, item) in self.order_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                item.to_sql(out)?;
            }
        }

        if let Some(limit) = self.limit {
            out.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            out.push_str(&format!(" OFFSET {}", offset));
        }
        Ok(())
    }
}

impl ToSql for FromItem {
    fn to_sql(&self, out: &mut SqlWriter) -> Result<(), SqlRenderError> {
        if let Some(join) = &self.join {
            out.push_str(match join.join_type {
                JoinType::Inner => "JOIN ",
                JoinType::Left => "LEFT JOIN ",
            });
        }
        out.push_str(&self.table);
        out.push(' ');
        out.push_str(&self.alias);
        if let Some(join) = &self.join {
            out.push_str(" ON ");
            join.on.to_sql(out)?;
        }
        Ok(())
    }
}

impl ToSql for OrderByItem {
    fn to_sql(&self, out: &mut SqlWriter) -> Result<(), SqlRenderError> {
        self.expression.to_sql(out)?;
        if self.order == SortOrder::Descending {
            out.push_str(" DESC");
        }
        Ok(())
    }
}

impl SqlWriter {
    fn push(&mut self, c: char) {
        self.sql.push(c);
    }
}

fn write_list(
    out: &mut SqlWriter,
    nodes: &[SqlNode],
    separator: &str,
) -> Result<(), SqlRenderError> {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        node.to_sql(out)?;
    }
    Ok(())
}

/// Binding strength of a node when it appears as an operand.
fn precedence(node: &SqlNode) -> u8 {
    match node {
        SqlNode::Op { op, .. } => match op.as_str() {
            "OR" => 1,
            "AND" => 2,
            "=" | "<>" | "<" | "<=" | ">" | ">=" => 4,
            "|" => 5,
            "^" => 6,
            "&" => 7,
            "<<" | ">>" => 8,
            "+" | "-" => 9,
            "*" | "/" => 10,
            _ => 11,
        },
        SqlNode::Not(_) => 3,
        SqlNode::IsNull { .. }
        | SqlNode::In { .. }
        | SqlNode::Between { .. }
        | SqlNode::Like { .. } => 4,
        _ => u8::MAX,
    }
}

fn needs_parens(parent_op: &str, parent_prec: u8, child: &SqlNode) -> bool {
    let child_prec = precedence(child);
    if child_prec < parent_prec {
        return true;
    }
    if child_prec == parent_prec {
        let same_associative = matches!(child, SqlNode::Op { op, .. } if op == parent_op)
            && matches!(parent_op, "AND" | "OR" | "+" | "*");
        return !same_associative;
    }
    false
}

fn write_operand(
    out: &mut SqlWriter,
    parent: &SqlNode,
    child: &SqlNode,
) -> Result<(), SqlRenderError> {
    let parent_op = match parent {
        SqlNode::Op { op, .. } => op.as_str(),
        _ => "",
    };
    if needs_parens(parent_op, precedence(parent), child) {
        out.push('(');
        child.to_sql(out)?;
        out.push(')');
        Ok(())
    } else {
        child.to_sql(out)
    }
}

fn write_literal(out: &mut SqlWriter, value: &Value) -> Result<(), SqlRenderError> {
    match value {
        Value::Null => out.push_str("NULL"),
        Value::Bool(b) => out.push_str(if *b { "TRUE" } else { "FALSE" }),
        Value::Int(i) => out.push_str(&i.to_string()),
        Value::Float(f) => out.push_str(&f.to_string()),
        Value::String(s) => out.push_str(&format!("'{}'", s.replace('\'', "''"))),
        Value::Date(d) => out.push_str(&format!("'{}'", d.format("%Y-%m-%d"))),
        Value::Time(t) => out.push_str(&format!("'{}'", t.format("%H:%M:%S"))),
        Value::Timestamp(ts) => out.push_str(&format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S"))),
        Value::Bytes(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
            out.push_str(&format!("X'{}'", hex));
        }
        Value::Array(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(out, item)?;
            }
            out.push(')');
        }
        other => {
            return Err(SqlRenderError::UnsupportedValue {
                value: other.to_string(),
            })
        }
    }
    Ok(())
}

fn write_value(
    out: &mut SqlWriter,
    value: &Value,
    attribute: Option<&DbAttribute>,
    binding: bool,
) -> Result<(), SqlRenderError> {
    if !binding {
        return write_literal(out, value);
    }
    match value {
        Value::Array(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, attribute, true)?;
            }
            out.push(')');
            Ok(())
        }
        Value::ObjectId(_) | Value::Persistent(_) | Value::Embedded(_) => {
            Err(SqlRenderError::UnsupportedValue {
                value: value.to_string(),
            })
        }
        _ => {
            out.bind(value, attribute);
            Ok(())
        }
    }
}

impl ToSql for SqlNode {
    fn to_sql(&self, out: &mut SqlWriter) -> Result<(), SqlRenderError> {
        match self {
            SqlNode::Column { table, name, .. } => {
                if let Some(table) = table {
                    out.push_str(table);
                    out.push('.');
                }
                out.push_str(name);
            }
            SqlNode::Value {
                value,
                attribute,
                binding,
            } => write_value(out, value, attribute.as_ref(), *binding)?,
            SqlNode::Op { op, operands } => {
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                        out.push_str(op);
                        out.push(' ');
                    }
                    write_operand(out, self, operand)?;
                }
            }
            SqlNode::Not(inner) => {
                out.push_str("NOT ");
                if matches!(inner.as_ref(), SqlNode::Op { .. }) {
                    out.push('(');
                    inner.to_sql(out)?;
                    out.push(')');
                } else {
                    inner.to_sql(out)?;
                }
            }
            SqlNode::Negate(inner) | SqlNode::BitwiseNot(inner) => {
                out.push(if matches!(self, SqlNode::Negate(_)) { '-' } else { '~' });
                if matches!(inner.as_ref(), SqlNode::Op { .. }) {
                    out.push('(');
                    inner.to_sql(out)?;
                    out.push(')');
                } else {
                    inner.to_sql(out)?;
                }
            }
            SqlNode::IsNull { operand, not } => {
                write_operand(out, self, operand)?;
                out.push_str(if *not { " IS NOT NULL" } else { " IS NULL" });
            }
            SqlNode::In {
                operand,
                values,
                not,
            } => {
                write_operand(out, self, operand)?;
                out.push_str(if *not { " NOT IN " } else { " IN " });
                values.to_sql(out)?;
            }
            SqlNode::Between {
                operand,
                lower,
                upper,
                not,
            } => {
                write_operand(out, self, operand)?;
                out.push_str(if *not { " NOT BETWEEN " } else { " BETWEEN " });
                write_operand(out, self, lower)?;
                out.push_str(" AND ");
                write_operand(out, self, upper)?;
            }
            SqlNode::Like {
                operand,
                pattern,
                not,
                ignore_case,
                escape,
            } => {
                if *ignore_case {
                    out.push_str("UPPER(");
                    operand.to_sql(out)?;
                    out.push(')');
                } else {
                    write_operand(out, self, operand)?;
                }
                out.push_str(if *not { " NOT LIKE " } else { " LIKE " });
                if *ignore_case {
                    out.push_str("UPPER(");
                    pattern.to_sql(out)?;
                    out.push(')');
                } else {
                    pattern.to_sql(out)?;
                }
                if let Some(escape) = escape {
                    out.push_str(&format!(" ESCAPE '{}'", escape));
                }
            }
            SqlNode::Function {
                name, args, parens, ..
            } => {
                out.push_str(name);
                if *parens {
                    out.push('(');
                    write_list(out, args, ", ")?;
                    out.push(')');
                } else {
                    for arg in args {
                        out.push(' ');
                        arg.to_sql(out)?;
                    }
                }
            }
            SqlNode::Case { whens, otherwise } => {
                out.push_str("CASE");
                for (when, then) in whens {
                    out.push_str(" WHEN ");
                    when.to_sql(out)?;
                    out.push_str(" THEN ");
                    then.to_sql(out)?;
                }
                if let Some(otherwise) = otherwise {
                    out.push_str(" ELSE ");
                    otherwise.to_sql(out)?;
                }
                out.push_str(" END");
            }
            SqlNode::List(items) => {
                out.push('(');
                write_list(out, items, ", ")?;
                out.push(')');
            }
            SqlNode::Aliased { node, alias } => {
                node.to_sql(out)?;
                out.push_str(" AS ");
                out.push_str(alias);
            }
            SqlNode::Subquery(select) => {
                out.push('(');
                select.to_sql(out)?;
                out.push(')');
            }
            SqlNode::Text(text) => out.push_str(text),
            SqlNode::Empty => {}
        }
        Ok(())
    }
}
