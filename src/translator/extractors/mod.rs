//! Strategies that decide which result columns a query selects.
//!
//! * [`CustomColumnExtractor`] for queries with an explicit column list,
//! * [`IdColumnExtractor`] for paginated queries and subqueries,
//! * [`DescriptorColumnExtractor`] for object queries,
//! * [`DbEntityColumnExtractor`] for raw db entity queries.

mod custom;
mod db_entity;
mod descriptor;
mod id;

pub use custom::CustomColumnExtractor;
pub use db_entity::DbEntityColumnExtractor;
pub use descriptor::DescriptorColumnExtractor;
pub use id::IdColumnExtractor;

use std::collections::HashSet;

use crate::entity_catalog::DbAttribute;
use crate::expression::Path;
use crate::sql_tree::builder::attribute_column;

use super::context::TranslatorContext;
use super::errors::TranslatorResult;
use super::result::ResultNodeDescriptor;

pub trait ColumnExtractor<'a> {
    /// Adds result columns for the table reached by `prefix`.
    fn extract(&self, ctx: &mut TranslatorContext<'a>, prefix: &Path) -> TranslatorResult<()>;
}

/// Data row key of a column reached through `prefix`.
pub(crate) fn prefixed(prefix: &Path, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix.dotted(), name)
    }
}

/// Columns already selected, by table alias and column name.
#[derive(Debug, Default)]
pub(crate) struct SeenColumns(HashSet<(String, String)>);

impl SeenColumns {
    /// Adds an attribute column unless the same table column is selected
    /// already.
    pub fn add(
        &mut self,
        ctx: &mut TranslatorContext<'_>,
        alias: &str,
        attribute: &DbAttribute,
        data_row_key: String,
        group: Option<usize>,
    ) {
        if !self.0.insert((alias.to_string(), attribute.name.clone())) {
            return;
        }
        ctx.add_result_node(
            ResultNodeDescriptor::attribute(
                attribute_column(alias, attribute),
                attribute,
                data_row_key,
            )
            .in_group(group),
        );
    }
}
