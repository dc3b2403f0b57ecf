use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

use crate::entity_catalog::CatalogError;
use crate::sql_tree::errors::SqlRenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ColumnExtraction,
    PrefetchJoins,
    Ordering,
    Qualifier,
    Having,
    GroupBy,
    Distinct,
    OrderingDistinct,
    LimitOffset,
    ColumnDescriptors,
    TableTreeQualifier,
    TableTree,
    SqlResult,
    SqlGeneration,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::ColumnExtraction => write!(f, "ColumnExtraction"),
            Stage::PrefetchJoins => write!(f, "PrefetchJoins"),
            Stage::Ordering => write!(f, "Ordering"),
            Stage::Qualifier => write!(f, "Qualifier"),
            Stage::Having => write!(f, "Having"),
            Stage::GroupBy => write!(f, "GroupBy"),
            Stage::Distinct => write!(f, "Distinct"),
            Stage::OrderingDistinct => write!(f, "OrderingDistinct"),
            Stage::LimitOffset => write!(f, "LimitOffset"),
            Stage::ColumnDescriptors => write!(f, "ColumnDescriptors"),
            Stage::TableTreeQualifier => write!(f, "TableTreeQualifier"),
            Stage::TableTree => write!(f, "TableTree"),
            Stage::SqlResult => write!(f, "SqlResult"),
            Stage::SqlGeneration => write!(f, "SqlGeneration"),
        }
    }
}

/// Coarse classification callers can branch on without matching every
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A name in the query does not exist in the catalog.
    Unresolved,
    /// The query is well-formed but cannot be expressed as SQL.
    InvalidQuery,
    /// Broken translator state or an inconsistent catalog.
    Internal,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslatorError {
    #[error("Can't resolve path `{path}`: `{segment}` is not a property of `{entity}`")]
    UnresolvedPath {
        entity: String,
        path: String,
        segment: String,
    },

    #[error("Path alias `{alias}` must point to a relationship, `{target}` is not one")]
    AliasNotRelationship { alias: String, target: String },

    #[error("Entity `{entity}` must have exactly one primary key here, found {count}")]
    PrimaryKeyMismatch { entity: String, count: usize },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Arrays are not supported as arguments of `{0}`")]
    ArrayArgument(String),

    #[error("EXISTS condition `{0}` spans more than one root relationship")]
    AmbiguousExistsRoot(String),

    #[error("To-many joint prefetch `{path}` can't be combined with limit or offset")]
    PrefetchWithLimit { path: String },

    #[error("No table node registered for path `{path}`")]
    MissingTableNode { path: String },

    #[error("No active table node while resolving `{path}`")]
    MissingActiveNode { path: String },

    #[error("Translator invariant violated: {0}")]
    Invariant(String),

    #[error("Catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Render: {0}")]
    Render(#[from] SqlRenderError),

    #[error("{stage}: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<TranslatorError>,
    },
}

impl TranslatorError {
    pub fn in_stage(self, stage: Stage) -> Self {
        TranslatorError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Innermost error, with stage wrappers removed.
    pub fn root_cause(&self) -> &TranslatorError {
        match self {
            TranslatorError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root_cause() {
            TranslatorError::UnresolvedPath { .. }
            | TranslatorError::AliasNotRelationship { .. } => ErrorCategory::Unresolved,
            TranslatorError::Catalog(
                CatalogError::DbEntity { .. }
                | CatalogError::ObjEntity { .. }
                | CatalogError::Embeddable { .. }
                | CatalogError::Attribute { .. }
                | CatalogError::Relationship { .. }
                | CatalogError::Property { .. },
            ) => ErrorCategory::Unresolved,
            TranslatorError::PrimaryKeyMismatch { .. }
            | TranslatorError::InvalidQuery(_)
            | TranslatorError::ArrayArgument(_)
            | TranslatorError::AmbiguousExistsRoot(_)
            | TranslatorError::PrefetchWithLimit { .. } => ErrorCategory::InvalidQuery,
            _ => ErrorCategory::Internal,
        }
    }
}

pub type TranslatorResult<T> = Result<T, TranslatorError>;

/// Non-fatal notes collected while translating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TranslationWarning {
    /// A to-many joint prefetch was kept although the query is limited, so
    /// the limit counts joined rows rather than root objects.
    ToManyPrefetchWithLimit { path: String },
    /// DISTINCT was wanted but a result column type can't be compared.
    DistinctSuppressed { column: String },
    /// HAVING was given without any aggregate to group by.
    HavingIgnored,
}
