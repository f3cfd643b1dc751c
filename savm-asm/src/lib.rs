//! Assembler for the savm virtual machine.
//!
//! [`assemble`] turns source text into a flat `(Opcode, i64)` program image,
//! one pair per memory slot, ready for `Vm::load` or `savm_file::write`.
//!
//! # Syntax
//!
//! A program is a sequence of lines. Each line optionally starts with a
//! `label:`, followed by either nothing (the label attaches to the next
//! line's address), a `.text`/`.data` section directive, or one
//! instruction. `;` starts a comment running to end of line.
//!
//! Most mnemonics are *family stems*: `lda`, `add`, `cmp`, `not`, and so on
//! name a whole family of opcodes differing only in where the operand comes
//! from, and the token following the mnemonic picks the mode:
//!
//! - an integer literal (`lda 5`) selects the immediate form,
//! - a bare identifier (`lda total`) selects the memory form, addressing
//!   the named label,
//! - the `tos` keyword (`lda tos`) selects the stack form, operating on
//!   the top of the operand stack,
//! - no operand at all (`not`) selects the accumulator form.
//!
//! A handful of mnemonics (`nop`, `hlt`, `bra`, the conditional branches,
//! `drp`, `ips`, ...) have only one possible spelling and are looked up
//! directly.
//!
//! `dsr`/`rsr`, and `csr` when given a label operand, implement subroutine
//! calls without a call stack, by having the call site write the return
//! address into a slot reserved at the subroutine's entry point; see
//! [`parser`] for the exact desugaring. This has no support for
//! reentrancy or recursion. `csr` given a bare address is the real opcode
//! instead, so disassembled output re-assembles unchanged.
//!
//! [`assemble`] takes a source name alongside the text, used only to stamp
//! diagnostics (`file:line:col: error: ...`).

pub mod error;
pub mod families;
pub mod labels;
pub mod lexer;
pub mod parser;
pub mod token;


pub use error::AssembleError;
pub use parser::assemble;
