//! Error types for the compilation crate.

use thiserror::Error;

/// Errors that can occur during compilation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error(transparent)]
    Ir(#[from] bubble_ir::IrError),

    /// A rewrite left the circuit in a state it must never reach.
    #[error("Pass '{pass}' broke an invariant: {detail}")]
    InvariantViolation {
        /// Name of the pass that detected the violation.
        pass: String,
        /// What went wrong, naming the offending nodes or wires.
        detail: String,
    },

    /// Invalid pass configuration.
    #[error("Invalid pass configuration: {0}")]
    InvalidConfiguration(String),
}

impl CompileError {
    /// Shorthand for an [`CompileError::InvariantViolation`].
    pub(crate) fn invariant(pass: &str, detail: impl Into<String>) -> Self {
        CompileError::InvariantViolation {
            pass: pass.to_string(),
            detail: detail.into(),
        }
    }
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
