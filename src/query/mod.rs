//! Query descriptor handed to the translator.

use std::collections::BTreeMap;
use std::fmt;

use crate::expression::{Expression, Path, PathSegment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRoot {
    /// Object entity name; results are objects or their columns.
    Object(String),
    /// Db entity name; results are raw rows.
    Db(String),
}

impl fmt::Display for QueryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryRoot::Object(name) => write!(f, "{}", name),
            QueryRoot::Db(name) => write!(f, "db:{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub expression: Expression,
    pub order: SortOrder,
    pub case_insensitive: bool,
}

impl Ordering {
    pub fn asc(expression: Expression) -> Self {
        Ordering {
            expression,
            order: SortOrder::Ascending,
            case_insensitive: false,
        }
    }

    pub fn desc(expression: Expression) -> Self {
        Ordering {
            expression,
            order: SortOrder::Descending,
            case_insensitive: false,
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.case_insensitive = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// A value: attribute, function, aggregate or any other expression.
    Scalar,
    /// A whole object reached through the path (or the root object for
    /// `Expression::FullObject(None)`).
    FullObject,
    /// A value of an embedded attribute.
    Embedded,
}

/// One requested result column.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub expression: Expression,
    pub alias: Option<String>,
    pub kind: PropertyKind,
    /// Host type override for the produced column.
    pub host_type: Option<String>,
}

impl Property {
    pub fn scalar(expression: Expression) -> Self {
        Property {
            expression,
            alias: None,
            kind: PropertyKind::Scalar,
            host_type: None,
        }
    }

    pub fn full_object(expression: Expression) -> Self {
        Property {
            kind: PropertyKind::FullObject,
            ..Property::scalar(expression)
        }
    }

    pub fn embedded(expression: Expression) -> Self {
        Property {
            kind: PropertyKind::Embedded,
            ..Property::scalar(expression)
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn with_type(mut self, host_type: &str) -> Self {
        self.host_type = Some(host_type.to_string());
        self
    }

    /// Label of the produced data row entry.
    pub fn name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expression.to_string(),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        self.expression.is_aggregate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchSemantics {
    /// Fetched through a join in the same statement.
    Joint,
    /// Fetched by a separate query.
    Disjoint,
    /// Fetched by a separate query keyed by the target ids selected here.
    DisjointById,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefetchTreeNode {
    pub name: String,
    /// `None` for intermediate (phantom) nodes.
    pub semantics: Option<PrefetchSemantics>,
    pub children: Vec<PrefetchTreeNode>,
}

impl PrefetchTreeNode {
    pub fn root() -> Self {
        PrefetchTreeNode {
            name: String::new(),
            semantics: None,
            children: Vec::new(),
        }
    }

    /// Adds a node for a dotted object relationship path, creating phantom
    /// nodes for the intermediate hops.
    pub fn add_path(&mut self, path: &str, semantics: PrefetchSemantics) -> &mut Self {
        let mut node = self;
        for name in path.split('.').filter(|s| !s.is_empty()) {
            let index = match node.children.iter().position(|c| c.name == name) {
                Some(index) => index,
                None => {
                    node.children.push(PrefetchTreeNode {
                        name: name.to_string(),
                        semantics: None,
                        children: Vec::new(),
                    });
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }
        node.semantics = Some(semantics);
        node
    }

    /// Non-phantom nodes in pre-order with their full paths.
    pub fn nodes(&self) -> Vec<(Path, PrefetchSemantics)> {
        let mut out = Vec::new();
        self.collect(&Path::root(), &mut out);
        out
    }

    fn collect(&self, prefix: &Path, out: &mut Vec<(Path, PrefetchSemantics)>) {
        for child in &self.children {
            let path = prefix.child(PathSegment::new(child.name.clone()));
            if let Some(semantics) = child.semantics {
                out.push((path.clone(), semantics));
            }
            child.collect(&path, out);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub root: QueryRoot,
    pub qualifier: Option<Expression>,
    pub having: Option<Expression>,
    pub orderings: Vec<Ordering>,
    pub columns: Vec<Property>,
    pub prefetch: Option<PrefetchTreeNode>,
    pub page_size: u32,
    pub limit: u32,
    pub offset: u32,
    pub distinct: bool,
    pub suppress_distinct: bool,
    /// Alias name to the relationship path it stands for.
    pub path_split_aliases: BTreeMap<String, String>,
    pub result_set_mapping: bool,
}

impl SelectQuery {
    fn new(root: QueryRoot) -> Self {
        SelectQuery {
            root,
            qualifier: None,
            having: None,
            orderings: Vec::new(),
            columns: Vec::new(),
            prefetch: None,
            page_size: 0,
            limit: 0,
            offset: 0,
            distinct: false,
            suppress_distinct: false,
            path_split_aliases: BTreeMap::new(),
            result_set_mapping: false,
        }
    }

    pub fn object(entity: &str) -> Self {
        SelectQuery::new(QueryRoot::Object(entity.to_string()))
    }

    pub fn db(entity: &str) -> Self {
        SelectQuery::new(QueryRoot::Db(entity.to_string()))
    }

    /// ANDs `qualifier` with any existing one.
    pub fn where_(mut self, qualifier: Expression) -> Self {
        self.qualifier = Some(match self.qualifier.take() {
            Some(Expression::And(mut children)) => {
                children.push(qualifier);
                Expression::And(children)
            }
            Some(existing) => Expression::And(vec![existing, qualifier]),
            None => qualifier,
        });
        self
    }

    pub fn having(mut self, having: Expression) -> Self {
        self.having = Some(having);
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    pub fn columns(mut self, columns: Vec<Property>) -> Self {
        self.columns = columns;
        self
    }

    pub fn prefetch(mut self, path: &str, semantics: PrefetchSemantics) -> Self {
        self.prefetch
            .get_or_insert_with(PrefetchTreeNode::root)
            .add_path(path, semantics);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn suppress_distinct(mut self) -> Self {
        self.suppress_distinct = true;
        self
    }

    pub fn alias_path(mut self, alias: &str, path: &str) -> Self {
        self.path_split_aliases
            .insert(alias.to_string(), path.to_string());
        self
    }

    pub fn with_result_set_mapping(mut self) -> Self {
        self.result_set_mapping = true;
        self
    }

    pub fn is_paginated(&self) -> bool {
        self.page_size > 0
    }
}
