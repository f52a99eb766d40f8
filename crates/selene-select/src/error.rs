//! Selector error taxonomy
//!
//! Grammar errors abort the query with zero results; they are never
//! downgraded to a partial match set.

/// Selector parsing and compilation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector could not be fully consumed; names the unparsed remainder
    #[error("unrecognized selector near {0:?}")]
    Syntax(String),

    /// Unknown pseudo-class name
    #[error("unsupported pseudo-class :{0}")]
    UnsupportedPseudo(String),

    /// Unterminated pseudo-class argument list
    #[error("unbalanced argument list in :{0}")]
    UnbalancedArgument(String),

    /// An nth-* pseudo missing its argument, or a non-nth variant given one
    #[error("{0}")]
    Requirement(String),
}

/// Result type for selector operations
pub type SelectorResult<T> = Result<T, SelectorError>;
