//! Type-aware post-processing of SQL trees.
//!
//! Some backends need columns or values of opaque types wrapped before they
//! can be selected or compared (geometry types read through a function,
//! JSON compared through a cast, ...). A [`TypeProcessorRegistry`] maps a
//! declared host type and a node position to a rewrite. Registries are plain
//! values passed to the translator; there is no global default.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::builder::aliased;
use super::{SelectNode, SqlNode};
use crate::entity_catalog::EntityCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A column in the SELECT list.
    ResultColumn,
    /// A value compared for equality.
    Value,
}

pub trait SqlNodeProcessor: Send + Sync {
    fn process(&self, node: SqlNode) -> SqlNode;
}

impl<F> SqlNodeProcessor for F
where
    F: Fn(SqlNode) -> SqlNode + Send + Sync,
{
    fn process(&self, node: SqlNode) -> SqlNode {
        self(node)
    }
}

/// Wraps the node in a function call, e.g. `ST_AsText(t0.SHAPE)`.
pub struct FunctionWrapProcessor {
    pub function: String,
}

impl SqlNodeProcessor for FunctionWrapProcessor {
    fn process(&self, node: SqlNode) -> SqlNode {
        SqlNode::Function {
            name: self.function.clone(),
            args: vec![node],
            aggregate: false,
            parens: true,
        }
    }
}

/// Wraps the node in `CAST(node AS type)`.
pub struct CastProcessor {
    pub sql_type: String,
}

impl SqlNodeProcessor for CastProcessor {
    fn process(&self, node: SqlNode) -> SqlNode {
        SqlNode::Function {
            name: "CAST".to_string(),
            args: vec![aliased(node, &self.sql_type)],
            aggregate: false,
            parens: true,
        }
    }
}

#[derive(Clone, Default)]
pub struct TypeProcessorRegistry {
    processors: HashMap<(String, NodeKind), Arc<dyn SqlNodeProcessor>>,
}

impl fmt::Debug for TypeProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.processors.keys().collect();
        keys.sort_by(|a, b| a.0.cmp(&b.0));
        f.debug_struct("TypeProcessorRegistry")
            .field("processors", &keys)
            .finish()
    }
}

impl TypeProcessorRegistry {
    pub fn new() -> Self {
        TypeProcessorRegistry::default()
    }

    pub fn register(
        mut self,
        host_type: &str,
        kind: NodeKind,
        processor: impl SqlNodeProcessor + 'static,
    ) -> Self {
        self.processors
            .insert((host_type.to_string(), kind), Arc::new(processor));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Processor registered for exactly this host type.
    pub fn get(&self, host_type: &str, kind: NodeKind) -> Option<&Arc<dyn SqlNodeProcessor>> {
        self.processors.get(&(host_type.to_string(), kind))
    }

    fn process(&self, node: SqlNode, kind: NodeKind, catalog: &EntityCatalog) -> SqlNode {
        let host_type = match node.attribute() {
            Some(attribute) => catalog.declared_type_for(attribute).to_string(),
            None => return node,
        };
        match self.get(&host_type, kind) {
            Some(processor) => processor.process(node),
            None => node,
        }
    }

    /// Rewrites result columns and equality values of `select` and its
    /// subqueries.
    pub fn apply(&self, select: SelectNode, catalog: &EntityCatalog) -> SelectNode {
        if self.is_empty() {
            return select;
        }

        let select = SelectNode {
            columns: select
                .columns
                .into_iter()
                .map(|column| self.process_result_column(column, catalog))
                .collect(),
            ..select
        };

        select.transform(&mut |node| match node {
            SqlNode::Op { op, operands } if op == "=" || op == "<>" => SqlNode::Op {
                op,
                operands: operands
                    .into_iter()
                    .map(|operand| match operand {
                        SqlNode::Value { .. } => self.process(operand, NodeKind::Value, catalog),
                        other => other,
                    })
                    .collect(),
            },
            SqlNode::Subquery(inner) => {
                let inner = SelectNode {
                    columns: inner
                        .columns
                        .into_iter()
                        .map(|column| self.process_result_column(column, catalog))
                        .collect(),
                    ..*inner
                };
                SqlNode::Subquery(Box::new(inner))
            }
            other => other,
        })
    }

    fn process_result_column(&self, column: SqlNode, catalog: &EntityCatalog) -> SqlNode {
        match column {
            SqlNode::Aliased { node, alias } => {
                aliased(self.process(*node, NodeKind::ResultColumn, catalog), &alias)
            }
            SqlNode::Column { .. } => {
                let processed = self.process(column.clone(), NodeKind::ResultColumn, catalog);
                if processed != column {
                    // keep the original column name as the result label
                    if let SqlNode::Column { name, .. } = &column {
                        return aliased(processed, name);
                    }
                }
                processed
            }
            other => other,
        }
    }
}
