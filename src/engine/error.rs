use thiserror::Error;

use crate::dsl::CompileError;

/// Errors from control-surface operations on a [`Synth`](super::Synth).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The expression did not compile; the active program is unchanged.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    /// A 1-based preset index outside `1..=count`.
    #[error("preset index {index} out of range (1..{count})")]
    PresetOutOfRange { index: usize, count: usize },
    #[error("preset bank is empty")]
    NoPresets,
}
