//! Per-translation state threaded through every stage.
//!
//! A context owns the table tree, the path cache and the SELECT under
//! construction. A subquery gets a context of its own that keeps a mutable
//! handle on its enclosing context: expressions wrapped in
//! `Expression::EnclosingObject` are translated there, against the outer
//! query's tables.

use std::sync::Arc;

use crate::config::TranslatorConfig;
use crate::entity_catalog::{DbEntity, EntityCatalog, ObjEntity};
use crate::expression::{Expression, Path};
use crate::query::{QueryRoot, SelectQuery};
use crate::sql_tree::builder::and_fold;
use crate::sql_tree::render::Binding;
use crate::sql_tree::type_processors::TypeProcessorRegistry;
use crate::sql_tree::{JoinType, SelectNode, SqlNode};

use super::errors::{TranslationWarning, TranslatorError, TranslatorResult};
use super::path::{unresolved, PathScope, PathTranslationResult, PathTranslator};
use super::qualifier::QualifierTranslator;
use super::result::{ColumnDescriptor, ResultGroup, ResultNodeDescriptor, SqlResultMapping};
use super::stages;
use super::table_tree::{new_alias_sequence, AliasSequence, TableTree};

/// A query that can evaluate expressions for one of its subqueries.
pub trait EnclosingScope {
    fn translate_enclosing(&mut self, expression: &Expression) -> TranslatorResult<SqlNode>;
}

pub struct TranslatorContext<'a> {
    pub(crate) catalog: &'a EntityCatalog,
    pub(crate) config: &'a TranslatorConfig,
    pub(crate) query: &'a SelectQuery,
    pub(crate) type_processors: Option<&'a TypeProcessorRegistry>,
    pub(crate) root_obj: Option<&'a ObjEntity>,
    pub(crate) root_db: &'a DbEntity,
    parent: Option<&'a mut (dyn EnclosingScope + 'a)>,

    pub(crate) table_tree: TableTree<'a>,
    path_translator: PathTranslator,

    pub(crate) select: SelectNode,
    pub(crate) result_nodes: Vec<ResultNodeDescriptor>,
    pub(crate) result_groups: Vec<ResultGroup>,
    /// Nodes past this index belong to custom columns; prefetch columns are
    /// spliced in before them.
    root_segment_end: usize,
    splice_into_root: bool,
    pub(crate) qualifier: Option<SqlNode>,

    pub(crate) column_descriptors: Vec<ColumnDescriptor>,
    pub(crate) result_mapping: Option<SqlResultMapping>,
    pub(crate) distinct_suppressed: bool,
    pub(crate) warnings: Vec<TranslationWarning>,
    pub(crate) sql: Option<(String, Vec<Binding>)>,
}

impl<'a> TranslatorContext<'a> {
    pub fn new(
        catalog: &'a EntityCatalog,
        config: &'a TranslatorConfig,
        query: &'a SelectQuery,
        type_processors: Option<&'a TypeProcessorRegistry>,
    ) -> TranslatorResult<Self> {
        Self::build(catalog, config, query, type_processors, None, new_alias_sequence())
    }

    /// Context for a subquery of `parent`. Table aliases continue the
    /// parent's sequence.
    pub fn nested<'p: 'a>(
        parent: &'a mut TranslatorContext<'p>,
        query: &'a SelectQuery,
    ) -> TranslatorResult<Self> {
        let catalog = parent.catalog;
        let config = parent.config;
        let type_processors = parent.type_processors;
        let aliases = parent.table_tree.aliases();
        Self::build(
            catalog,
            config,
            query,
            type_processors,
            Some(parent as &mut dyn EnclosingScope),
            aliases,
        )
    }

    fn build(
        catalog: &'a EntityCatalog,
        config: &'a TranslatorConfig,
        query: &'a SelectQuery,
        type_processors: Option<&'a TypeProcessorRegistry>,
        parent: Option<&'a mut (dyn EnclosingScope + 'a)>,
        aliases: AliasSequence,
    ) -> TranslatorResult<Self> {
        let (root_obj, root_db) = match &query.root {
            QueryRoot::Object(name) => {
                let entity = catalog.obj_entity(name)?;
                (Some(entity), catalog.db_entity_for(entity)?)
            }
            QueryRoot::Db(name) => (None, catalog.db_entity(name)?),
        };

        Ok(TranslatorContext {
            catalog,
            config,
            query,
            type_processors,
            root_obj,
            root_db,
            parent,
            table_tree: TableTree::new(root_db, aliases),
            path_translator: PathTranslator::new(),
            select: SelectNode::default(),
            result_nodes: Vec::new(),
            result_groups: Vec::new(),
            root_segment_end: 0,
            splice_into_root: false,
            qualifier: None,
            column_descriptors: Vec::new(),
            result_mapping: None,
            distinct_suppressed: false,
            warnings: Vec::new(),
            sql: None,
        })
    }

    pub fn is_nested(&self) -> bool {
        self.parent.is_some()
    }

    pub fn translate_obj_path(
        &mut self,
        entity: &'a ObjEntity,
        path: &Path,
        parent: &Path,
    ) -> TranslatorResult<Arc<PathTranslationResult>> {
        let scope = PathScope {
            catalog: self.catalog,
            table_tree: &mut self.table_tree,
            aliases: &self.query.path_split_aliases,
        };
        self.path_translator
            .translate_obj_path(scope, entity, path, parent)
    }

    pub fn translate_db_path(
        &mut self,
        entity: &'a DbEntity,
        path: &Path,
        parent: &Path,
    ) -> TranslatorResult<Arc<PathTranslationResult>> {
        let scope = PathScope {
            catalog: self.catalog,
            table_tree: &mut self.table_tree,
            aliases: &self.query.path_split_aliases,
        };
        self.path_translator
            .translate_db_path(scope, entity, path, parent)
    }

    pub fn translate_id_path(&self, path: &Path) -> TranslatorResult<PathTranslationResult> {
        self.path_translator.translate_id_path(self.root_db, path)
    }

    pub fn translate_expression(&mut self, expression: &Expression) -> TranslatorResult<SqlNode> {
        QualifierTranslator::new(self).translate(expression)
    }

    /// Translates `expression` in the enclosing query.
    pub fn translate_in_parent(&mut self, expression: &Expression) -> TranslatorResult<SqlNode> {
        match self.parent.as_deref_mut() {
            Some(parent) => parent.translate_enclosing(expression),
            None => Err(TranslatorError::InvalidQuery(format!(
                "`{}` refers to an enclosing query, but `{}` is not a subquery",
                expression, self.query.root
            ))),
        }
    }

    /// Runs the full stage pipeline for `query` as a subquery of this one.
    pub fn translate_subquery(&mut self, query: &SelectQuery) -> TranslatorResult<SelectNode> {
        let mut child = TranslatorContext::nested(self, query)?;
        stages::run(&mut child)?;
        Ok(std::mem::take(&mut child.select))
    }

    /// Joins every hop of `db_path` from the root, regardless of whether a
    /// path walk would have taken a foreign key shortcut. `final_qualifier`
    /// is attached to the last hop.
    pub fn join_db_path(
        &mut self,
        db_path: &Path,
        outer: bool,
        final_qualifier: Option<Expression>,
    ) -> TranslatorResult<(Path, &'a DbEntity)> {
        let mut entity = self.root_db;
        let mut current = Path::root().with_marker(db_path.marker());
        let segments = db_path.segments();

        for (i, segment) in segments.iter().enumerate() {
            let relationship = entity
                .relationship(&segment.name)
                .ok_or_else(|| unresolved(&entity.name, db_path, &segment.name))?;
            let target = self.catalog.target_of(relationship)?;
            let join_type = if outer || segment.outer {
                JoinType::Left
            } else {
                JoinType::Inner
            };
            let qualifier = if i + 1 == segments.len() {
                final_qualifier.clone()
            } else {
                None
            };

            current = current.child(segment.clone());
            self.table_tree
                .add_join(current.clone(), relationship, target, join_type, qualifier);
            entity = target;
        }

        Ok((current, entity))
    }

    pub fn add_result_node(&mut self, descriptor: ResultNodeDescriptor) {
        if self.splice_into_root {
            self.result_nodes.insert(self.root_segment_end, descriptor);
            self.root_segment_end += 1;
        } else {
            self.result_nodes.push(descriptor);
        }
    }

    pub fn mark_root_segment_end(&mut self) {
        self.root_segment_end = self.result_nodes.len();
    }

    pub fn set_splice_into_root(&mut self, splice: bool) {
        self.splice_into_root = splice;
    }

    pub fn add_result_group(&mut self, group: ResultGroup) -> usize {
        self.result_groups.push(group);
        self.result_groups.len() - 1
    }

    pub fn append_qualifier(&mut self, node: SqlNode) {
        self.qualifier = and_fold(self.qualifier.take(), node);
    }

    /// True once any aggregate is selected, HAVING is present or an ordering
    /// aggregates.
    pub fn needs_group_by(&self) -> bool {
        self.result_nodes.iter().any(|r| r.aggregate)
            || self.query.having.is_some()
            || self
                .query
                .orderings
                .iter()
                .any(|o| o.expression.is_aggregate())
    }

    /// Adds `node` as a column outside the data row unless an equal column
    /// is selected already.
    pub fn ensure_result_column(&mut self, node: &SqlNode) {
        let wanted = node.normalized();
        if self
            .result_nodes
            .iter()
            .any(|r| r.node.normalized() == wanted)
        {
            return;
        }
        log::debug!("TranslatorContext: adding hidden result column {:?}", wanted);
        self.result_nodes
            .push(ResultNodeDescriptor::hidden(node.clone()));
    }

    pub fn warn(&mut self, warning: TranslationWarning) {
        log::warn!("{}: {:?}", self.query.root, warning);
        self.warnings.push(warning);
    }
}

impl EnclosingScope for TranslatorContext<'_> {
    fn translate_enclosing(&mut self, expression: &Expression) -> TranslatorResult<SqlNode> {
        self.translate_expression(expression)
    }
}
