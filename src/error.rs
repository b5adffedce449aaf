//! Error taxonomy (spec.md §7).
//!
//! Only contradictions (fuse) and infrastructure failures propagate; a
//! built-in that can't apply just returns zero solutions and the prover
//! backtracks (spec.md §7 "Built-in type error"). That case never reaches
//! this enum.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EyelingError {
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax { message: String, line: usize, column: usize },

    #[error("failed to dereference {iri}: {detail}")]
    Dereference { iri: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EyelingError {
    /// Exit code contract from spec.md §7/§6: syntax and I/O errors exit 1;
    /// fuse (not represented here, see `ReasonStatus`) exits 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            EyelingError::Syntax { .. } | EyelingError::Dereference { .. } | EyelingError::Io(_) => 1,
        }
    }
}

/// Outcome of a reasoning run distinguished from ordinary errors: a fuse
/// firing is a successful run that detected a contradiction, not an
/// exceptional condition (spec.md §7 "Result cap reached: not an error").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonStatus {
    Ok,
    Fuse,
}

impl ReasonStatus {
    pub fn exit_code(&self) -> i32 {
        match self {
            ReasonStatus::Ok => 0,
            ReasonStatus::Fuse => 2,
        }
    }
}
