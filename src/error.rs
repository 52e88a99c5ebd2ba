//! Error types for the string-constraint engine.
//!
//! Two classes of failure exist and only one of them lives here: contract
//! violations by a caller (missing length facts, a non-total length model,
//! malformed replacement input). These abort the current call via
//! [`SolverError`]. Expected non-determinism ("no splittable equation",
//! "arithmetic facts unsatisfiable") is *not* an error and flows through
//! [`crate::nielsen::Outcome`] instead.

use crate::ast::TermId;
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, SolverError>;

/// Engine error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SolverError {
    /// A symbolic string term participates in a concatenation group but has
    /// no associated length fact. Precondition breach by the host.
    #[error("no length fact for symbolic term {0:?}")]
    MissingLengthFact(TermId),

    /// The length model does not resolve the given length term to exactly
    /// one value. The model-totality precondition has been violated.
    #[error("length model does not uniquely determine {0:?}")]
    AmbiguousLengthModel(TermId),

    /// Internal invariant breach.
    #[error("internal error: {0}")]
    Internal(String),
}
