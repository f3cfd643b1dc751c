//! Runtime error types, fatal by construction: every variant here ends a run.

use crate::memory::StackError;
use thiserror::Error;

/// Errors raised while the fetch-decode-execute loop is running. Each one
/// terminates the run immediately; there is no recoverable-runtime-error tier
/// in this machine (compare `crate::asm` and `savm_asm`'s non-fatal diagnostics).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("reached end of memory")]
    MemoryExhausted,

    #[error("{0}")]
    Stack(#[from] StackError),

    #[error("console i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while populating `I[]`/`D[]` from a decoded pair stream,
/// before execution ever starts.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("memory overflow: program has more than {0} slots")]
    MemoryOverflow(usize),

    #[error("undefined opcode {0}")]
    UndefinedOpcode(i64),
}
