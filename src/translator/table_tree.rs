//! Tables participating in one SELECT, keyed by the path that reached them.
//!
//! The root table sits at the empty path. Every relationship hop walked while
//! translating paths registers a join node here; registering the same path
//! twice returns the existing node, so two expressions that traverse the same
//! relationship share one join.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::entity_catalog::{DbEntity, DbRelationship};
use crate::expression::{Expression, Path, PathMarker};
use crate::sql_tree::JoinType;

use super::errors::{TranslatorError, TranslatorResult};

/// Alias counter shared by a query and all of its subqueries, so that every
/// table alias in a statement is unique.
pub type AliasSequence = Rc<Cell<usize>>;

pub fn new_alias_sequence() -> AliasSequence {
    Rc::new(Cell::new(0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Root,
    Join(usize),
}

#[derive(Debug, Clone)]
pub struct TableTreeNode<'a> {
    pub path: Path,
    pub entity: &'a DbEntity,
    /// `None` for the root.
    pub relationship: Option<&'a DbRelationship>,
    pub join_type: JoinType,
    pub alias: String,
    /// Extra condition attached to this table, e.g. an inheritance qualifier
    /// of a prefetched entity. Expressed in db paths relative to the node.
    pub extra_qualifier: Option<Expression>,
}

impl TableTreeNode<'_> {
    pub fn is_root(&self) -> bool {
        self.relationship.is_none()
    }
}

#[derive(Debug)]
pub struct TableTree<'a> {
    root: TableTreeNode<'a>,
    nodes: Vec<TableTreeNode<'a>>,
    index: HashMap<Path, usize>,
    aliases: AliasSequence,
    active: Option<NodeRef>,
}

impl<'a> TableTree<'a> {
    pub fn new(root_entity: &'a DbEntity, aliases: AliasSequence) -> Self {
        let alias = next_alias(&aliases);
        TableTree {
            root: TableTreeNode {
                path: Path::root(),
                entity: root_entity,
                relationship: None,
                join_type: JoinType::Inner,
                alias,
                extra_qualifier: None,
            },
            nodes: Vec::new(),
            index: HashMap::new(),
            aliases,
            active: None,
        }
    }

    pub fn aliases(&self) -> AliasSequence {
        Rc::clone(&self.aliases)
    }

    pub fn root(&self) -> &TableTreeNode<'a> {
        &self.root
    }

    pub fn root_alias(&self) -> &str {
        &self.root.alias
    }

    /// Registers a join for `path` unless one exists already, in which case
    /// the existing node is left untouched. Returns the alias of the node.
    pub fn add_join(
        &mut self,
        path: Path,
        relationship: &'a DbRelationship,
        target: &'a DbEntity,
        join_type: JoinType,
        extra_qualifier: Option<Expression>,
    ) -> String {
        if let Some(&i) = self.index.get(&path) {
            return self.nodes[i].alias.clone();
        }

        let alias = next_alias(&self.aliases);
        log::debug!(
            "TableTree: join {} `{}` -> {} as {} ({:?}, {:?})",
            relationship.name,
            path,
            target.name,
            alias,
            join_type,
            path.marker()
        );
        self.index.insert(path.clone(), self.nodes.len());
        self.nodes.push(TableTreeNode {
            path,
            entity: target,
            relationship: Some(relationship),
            join_type,
            alias: alias.clone(),
            extra_qualifier,
        });
        alias
    }

    /// Alias of the table reached by `path`. An empty unmarked or prefetch
    /// path is the root; a current-alias path is whatever node is active.
    pub fn alias_for(&self, path: &Path) -> TranslatorResult<String> {
        if path.marker() == PathMarker::CurrentAlias && path.is_empty() {
            return match self.active {
                Some(node) => Ok(self.node(node).alias.clone()),
                None => Err(TranslatorError::MissingActiveNode {
                    path: path.to_string(),
                }),
            };
        }
        if path.is_empty() {
            return Ok(self.root.alias.clone());
        }
        self.index
            .get(path)
            .map(|&i| self.nodes[i].alias.clone())
            .ok_or_else(|| TranslatorError::MissingTableNode {
                path: format!("{} ({:?})", path, path.marker()),
            })
    }

    pub fn node(&self, node: NodeRef) -> &TableTreeNode<'a> {
        match node {
            NodeRef::Root => &self.root,
            NodeRef::Join(i) => &self.nodes[i],
        }
    }

    pub fn node_for(&self, path: &Path) -> Option<&TableTreeNode<'a>> {
        if path.is_empty() && path.marker() != PathMarker::CurrentAlias {
            return Some(&self.root);
        }
        self.index.get(path).map(|&i| &self.nodes[i])
    }

    /// Number of joined tables, root excluded.
    pub fn join_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn has_to_many_join(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| n.relationship.is_some_and(|r| r.to_many))
    }

    pub fn set_active(&mut self, node: Option<NodeRef>) {
        self.active = node;
    }

    pub fn active(&self) -> Option<&TableTreeNode<'a>> {
        self.active.map(|n| self.node(n))
    }
}

fn next_alias(aliases: &AliasSequence) -> String {
    let n = aliases.get();
    aliases.set(n + 1);
    format!("t{}", n)
}

/// Visits the root and then every join node in registration order. Nodes
/// registered while the queue is being drained are visited too.
#[derive(Debug, Default)]
pub struct TableTreeWorkQueue {
    root_done: bool,
    next: usize,
}

impl TableTreeWorkQueue {
    pub fn new() -> Self {
        TableTreeWorkQueue::default()
    }

    pub fn next(&mut self, tree: &TableTree<'_>) -> Option<NodeRef> {
        if !self.root_done {
            self.root_done = true;
            return Some(NodeRef::Root);
        }
        if self.next < tree.nodes.len() {
            let node = NodeRef::Join(self.next);
            self.next += 1;
            return Some(node);
        }
        None
    }
}
