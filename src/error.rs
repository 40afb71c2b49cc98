//! Construction-time validation errors. The decision path itself never
//! errors: missing categories, no-match lookups and unknown operations all
//! degrade to "not granted".

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("empty path prefix")]
    EmptyPrefix,
    #[error("path prefix must be absolute: {0}")]
    RelativePrefix(String),
    #[error("empty template prefix")]
    EmptyTemplate,
    #[error("empty domain suffix")]
    EmptySuffix,
}
