use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlRenderError {
    #[error("Value `{value}` can't be rendered as a SQL literal")]
    UnsupportedValue { value: String },
    #[error("SELECT has no FROM clause")]
    NoFromClause,
}
