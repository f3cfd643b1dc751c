//! Error types. Lex and parse errors are accumulated, not raised one at a
//! time: a single bad line substitutes a zero operand and assembly
//! continues, so the user sees every mistake in one run instead of fixing
//! them one by one. `AssembleError::Failed` is the only thing the top-level
//! `assemble()` ever returns as `Err`; everything else is a diagnostic
//! logged through `log::warn!` as it's found.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("assembly failed with {0} error(s); see log output")]
    Failed(u32),

    #[error("program has {0} instructions, exceeding the {1}-slot memory")]
    TooManyInstructions(usize, usize),
}
