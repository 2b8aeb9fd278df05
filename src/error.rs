//! Error and diagnostic types for tree serialization

use thiserror::Error;

/// Fatal errors that abort a conversion with no partial output
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The tree's viewport is unusable (non-finite or non-positive dimensions)
    #[error("invalid viewport: {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },

    /// The output grew past the configured byte limit
    #[error("output exceeds the configured limit of {limit} bytes")]
    OutputLimit { limit: usize },
}

/// Non-fatal anomalies recovered during a conversion
///
/// The conversion still produces a well-formed document; each diagnostic
/// records what was degraded and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A reference could not be resolved to a usable resource: the id is
    /// missing from the table, or a use-reference names a resource that is
    /// not a symbol. The referencing attribute (or use-reference node) was
    /// omitted.
    UnresolvedReference { id: String },

    /// Text content contained characters invalid in XML 1.0 and was replaced
    /// with the empty string.
    InvalidCharacters { context: String },

    /// A use-reference chain looped back onto itself and was cut.
    CyclicReference { id: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnresolvedReference { id } => {
                write!(f, "unresolved resource reference '{}'", id)
            }
            Diagnostic::InvalidCharacters { context } => {
                write!(f, "invalid XML characters in {}", context)
            }
            Diagnostic::CyclicReference { id } => {
                write!(f, "cyclic use-reference through '{}'", id)
            }
        }
    }
}
