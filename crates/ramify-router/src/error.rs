//! Router error types.

use thiserror::Error;

/// Errors raised while building or querying a resource tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// A resource id that does not belong to this tree.
    #[error("unknown resource: {0}")]
    UnknownResource(usize),

    /// Two siblings share an identifier name.
    #[error("identifier '{id_name}' is already used by a sibling of '{uid}'")]
    DuplicateIdentifier {
        /// The resource being added.
        uid: String,
        /// The clashing identifier name.
        id_name: String,
    },

    /// Two siblings share a collection path segment.
    #[error("path segment '{segment}' is already used by a sibling of '{uid}'")]
    DuplicateSegment {
        /// The resource being added.
        uid: String,
        /// The clashing segment.
        segment: String,
    },

    /// A path parameter needed to build a URL is missing.
    #[error("missing path parameter '{name}' for resource '{uid}'")]
    MissingParameter {
        /// The resource whose URL was requested.
        uid: String,
        /// The missing parameter name.
        name: String,
    },
}
