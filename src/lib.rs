//! ISA, VM state and execution engine for the stack-accumulator virtual machine.
//!
//! This crate owns the machine model (`isa`, `memory`, `registers`) and the
//! fetch-decode-execute engine (`vm`) plus the disassembly renderer
//! (`disasm`). The assembler lives in `savm-asm`, the textual machine-code
//! codec in `savm-file`; both depend on this crate for `Opcode` and nothing
//! else.

#[macro_use]
extern crate num_derive;

pub mod disasm;
pub mod error;
pub mod isa;
pub mod memory;
pub mod registers;
pub mod vm;

pub use isa::{Opcode, OperandMode};
pub use vm::Vm;

#[cfg(test)]
mod test;
