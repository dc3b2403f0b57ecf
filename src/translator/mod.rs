//! Select query translation.
//!
//! [`SelectTranslator`] turns a [`SelectQuery`] into SQL text, the ordered
//! parameter bindings and a description of every data row column. All the
//! work happens in the stage pipeline (see [`stages`]) over one
//! [`TranslatorContext`].
//!
//! ```ignore
//! let translator = SelectTranslator::new(&catalog, &config);
//! let translation = translator.translate(
//!     &SelectQuery::object("Artist")
//!         .where_(Expression::obj_path("artistName").like("A%"))
//!         .order_by(Ordering::asc(Expression::obj_path("artistName"))),
//! )?;
//! println!("{}", translation.sql);
//! ```

pub mod context;
pub mod errors;
pub mod exists;
pub mod extractors;
pub mod path;
pub mod qualifier;
pub mod result;
pub mod stages;
pub mod table_tree;

use serde_json::json;

use crate::config::TranslatorConfig;
use crate::entity_catalog::EntityCatalog;
use crate::query::SelectQuery;
use crate::sql_tree::render::Binding;
use crate::sql_tree::type_processors::TypeProcessorRegistry;

pub use context::TranslatorContext;
pub use errors::{ErrorCategory, Stage, TranslationWarning, TranslatorError, TranslatorResult};
pub use result::{ColumnDescriptor, ResultComponent, SqlResultMapping};

/// Everything produced for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectTranslation {
    pub sql: String,
    /// Values for the `?` placeholders, in order.
    pub bindings: Vec<Binding>,
    /// One per data row column, in SELECT order.
    pub columns: Vec<ColumnDescriptor>,
    pub result_mapping: Option<SqlResultMapping>,
    pub has_joins: bool,
    /// DISTINCT was wanted but a column type prevented it; rows may repeat.
    pub distinct_suppressed: bool,
    pub warnings: Vec<TranslationWarning>,
}

impl SelectTranslation {
    /// JSON summary for logs and tooling. Bindings carry their value and
    /// JDBC type only.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        let bindings = self
            .bindings
            .iter()
            .map(|b| {
                Ok(json!({
                    "value": serde_json::to_value(&b.value)?,
                    "jdbc_type": b.jdbc_type,
                }))
            })
            .collect::<serde_json::Result<Vec<_>>>()?;

        Ok(json!({
            "sql": self.sql,
            "bindings": bindings,
            "columns": serde_json::to_value(&self.columns)?,
            "result_mapping": serde_json::to_value(&self.result_mapping)?,
            "has_joins": self.has_joins,
            "distinct_suppressed": self.distinct_suppressed,
            "warnings": serde_json::to_value(&self.warnings)?,
        }))
    }
}

pub struct SelectTranslator<'a> {
    catalog: &'a EntityCatalog,
    config: &'a TranslatorConfig,
    type_processors: Option<&'a TypeProcessorRegistry>,
}

impl<'a> SelectTranslator<'a> {
    pub fn new(catalog: &'a EntityCatalog, config: &'a TranslatorConfig) -> Self {
        SelectTranslator {
            catalog,
            config,
            type_processors: None,
        }
    }

    pub fn with_type_processors(mut self, registry: &'a TypeProcessorRegistry) -> Self {
        self.type_processors = Some(registry);
        self
    }

    pub fn translate(&self, query: &SelectQuery) -> TranslatorResult<SelectTranslation> {
        log::debug!("SelectTranslator: translating query on {}", query.root);
        let mut ctx =
            TranslatorContext::new(self.catalog, self.config, query, self.type_processors)?;
        stages::run(&mut ctx)?;

        let (sql, bindings) = ctx.sql.take().ok_or_else(|| {
            TranslatorError::Invariant("pipeline finished without rendering SQL".to_string())
        })?;
        Ok(SelectTranslation {
            sql,
            bindings,
            columns: std::mem::take(&mut ctx.column_descriptors),
            result_mapping: ctx.result_mapping.take(),
            has_joins: ctx.table_tree.join_count() > 0,
            distinct_suppressed: ctx.distinct_suppressed,
            warnings: std::mem::take(&mut ctx.warnings),
        })
    }
}
