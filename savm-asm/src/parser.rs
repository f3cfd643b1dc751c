//! Two-pass assembler. Pass one walks every line computing label addresses;
//! pass two re-walks the same lines emitting the final `(Opcode, operand)`
//! stream, resolving label references against the table pass one built.
//! Two passes are unavoidable here: a branch to a label defined later in
//! the file can't be resolved on a single forward walk.
//!
//! `dsr`/`rsr` are pseudo-instructions, not real opcodes — they desugar
//! into short real-opcode sequences implementing a self-modifying call
//! convention with no call stack:
//!
//! - `name: dsr` reserves one slot at `name`'s address holding `Stm name`:
//!   a real store instruction whose own address is its target, so the slot
//!   is both the subroutine's header instruction and the return-address
//!   cell it overwrites on every call.
//! - `rsr` becomes `Ldm <slot>`, `Braa` (load the stored return address
//!   back and jump to it).
//!
//! `csr` is a real opcode (`Csr`, identical at runtime to `Bra`) as well as
//! the subroutine call-site syntax, and the two are told apart by the kind
//! of its operand token, exactly the way family-stem mnemonics are:
//!
//! - `csr <integer>` (as produced by the disassembler, e.g. `csr [5]`) is
//!   the bare opcode: a single slot, emitted as-is, so `assemble(disassemble
//!   (img)) == img` holds even for images containing a real `Csr`.
//! - `csr <label>` is the call convenience: it expands to `Ldi
//!   <return-address>` then `Csr <label's address>`, and the label must
//!   have been declared with `dsr` — calling a non-subroutine label this
//!   way is a resolve-time error.
//!
//! This convention has no call stack, so it cannot support reentrancy or
//! recursion — a subroutine that calls itself, directly or indirectly,
//! clobbers its own return slot. That's accepted as part of the
//! convention, not treated as a bug.

use crate::error::AssembleError;
use crate::families::{self, NextKind};
use crate::labels::{AssembleContext, Section};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use savm::isa::{Opcode, OperandMode};
use savm::memory::MEM;

struct LogicalLine {
    label: Option<Token>,
    mnemonic: Option<Token>,
    operands: Vec<Token>,
    line_no: u32,
}

fn mnemonic_text(line: &LogicalLine) -> Option<&str> {
    line.mnemonic.as_ref().map(|t| t.text.as_str())
}

fn logical_lines(source: &str, ctx: &mut AssembleContext) -> Vec<LogicalLine> {
    let mut lexer = Lexer::new(source, ctx.file().to_string());
    let mut lines = Vec::new();
    let mut current: Vec<Token> = Vec::new();

    loop {
        let tok = lexer.next_token();
        let done = tok.kind == TokenKind::Eof;
        if tok.kind == TokenKind::Eol || done {
            if !current.is_empty() {
                lines.push(split_line(std::mem::take(&mut current)));
            }
            if done {
                break;
            }
        } else {
            current.push(tok);
        }
    }

    ctx.error_count += lexer.error_count;
    lines
}

fn split_line(tokens: Vec<Token>) -> LogicalLine {
    let line_no = tokens[0].line;

    let (label, rest_start) = if tokens.len() >= 2
        && tokens[0].kind == TokenKind::Ident
        && tokens[1].kind == TokenKind::Colon
    {
        (Some(tokens[0].clone()), 2)
    } else {
        (None, 0)
    };

    let mnemonic = tokens
        .get(rest_start)
        .filter(|t| t.kind == TokenKind::Ident)
        .cloned();

    let operands = if mnemonic.is_some() {
        tokens[rest_start + 1..].to_vec()
    } else {
        Vec::new()
    };

    LogicalLine {
        label,
        mnemonic,
        operands,
        line_no,
    }
}

/// Number of slots a line occupies once emitted. `csr`'s size depends on
/// its operand's token kind, not just its mnemonic: a bare address is one
/// real opcode, a label reference is the two-slot call expansion.
fn line_size(line: &LogicalLine) -> usize {
    match mnemonic_text(line) {
        None | Some(".text") | Some(".data") => 0,
        Some("csr") => match line.operands.first() {
            Some(t) if t.kind == TokenKind::Ident => 2,
            _ => 1,
        },
        Some("rsr") => 2,
        Some("dsr") => 1,
        Some(_) => 1,
    }
}

fn resolve_label_addresses(lines: &[LogicalLine], ctx: &mut AssembleContext) {
    let mut address = 0usize;
    for line in lines {
        if let Some(label_tok) = &line.label {
            let is_subroutine = mnemonic_text(line) == Some("dsr");
            if !ctx.define(&label_tok.text, address, is_subroutine) {
                ctx.report(
                    label_tok.line,
                    label_tok.col,
                    format!("duplicate label '{}'", label_tok.text),
                );
            }
        }
        address += line_size(line);
    }
}

fn classify_next(token: Option<&Token>) -> NextKind {
    match token {
        None => NextKind::Accumulator,
        Some(t) if t.kind == TokenKind::Int => NextKind::Immediate,
        Some(t) if t.kind == TokenKind::Ident && t.text == "tos" => NextKind::Stack,
        Some(t) if t.kind == TokenKind::Ident => NextKind::Memory,
        Some(_) => NextKind::Accumulator,
    }
}

fn resolve_operand(mode: OperandMode, operands: &[Token], mnemonic: &Token, ctx: &mut AssembleContext) -> i64 {
    match mode {
        OperandMode::Accumulator | OperandMode::Stack | OperandMode::None => 0,
        OperandMode::Immediate => match operands.first() {
            Some(t) if t.kind == TokenKind::Int => t.value,
            _ => {
                ctx.report(mnemonic.line, mnemonic.col, "missing immediate operand");
                0
            }
        },
        OperandMode::Memory => match operands.first() {
            Some(t) if t.kind == TokenKind::Int => t.value,
            Some(t) if t.kind == TokenKind::Ident => match ctx.resolve(&t.text) {
                Some(addr) => addr as i64,
                None => {
                    ctx.report(t.line, t.col, format!("undefined label '{}'", t.text));
                    0
                }
            },
            _ => {
                ctx.report(mnemonic.line, mnemonic.col, "missing memory operand");
                0
            }
        },
    }
}

fn emit_instruction(mnemonic: &Token, operands: &[Token], ctx: &mut AssembleContext) -> (Opcode, i64) {
    if let Some(op) = Opcode::from_mnemonic(&mnemonic.text) {
        return (op, resolve_operand(op.mode(), operands, mnemonic, ctx));
    }

    if families::is_family_stem(&mnemonic.text) {
        let kind = classify_next(operands.first());
        return match families::resolve(&mnemonic.text, kind) {
            Some(op) => (op, resolve_operand(op.mode(), operands, mnemonic, ctx)),
            None => {
                ctx.report(
                    mnemonic.line,
                    mnemonic.col,
                    format!("'{}' has no form taking a {:?} operand", mnemonic.text, kind),
                );
                (Opcode::Nop, 0)
            }
        };
    }

    ctx.report(mnemonic.line, mnemonic.col, format!("unknown mnemonic '{}'", mnemonic.text));
    (Opcode::Nop, 0)
}

/// Emit a `csr` line: either the bare real opcode (integer operand) or the
/// subroutine call-site expansion (label operand).
fn emit_csr(mnemonic: &Token, operands: &[Token], address: usize, ctx: &mut AssembleContext) -> Vec<(Opcode, i64)> {
    match operands.first() {
        Some(t) if t.kind == TokenKind::Int => vec![(Opcode::Csr, t.value)],
        Some(t) if t.kind == TokenKind::Ident => {
            match ctx.resolve(&t.text) {
                Some(addr) => {
                    if ctx.is_subroutine(&t.text) != Some(true) {
                        ctx.report(
                            t.line,
                            t.col,
                            format!("'csr' target '{}' is not a subroutine (missing 'dsr')", t.text),
                        );
                    }
                    let return_addr = (address + 2) as i64;
                    vec![(Opcode::Ldi, return_addr), (Opcode::Csr, addr as i64)]
                }
                None => {
                    ctx.report(t.line, t.col, format!("'csr' target '{}' is undefined", t.text));
                    let return_addr = (address + 2) as i64;
                    vec![(Opcode::Ldi, return_addr), (Opcode::Csr, address as i64)]
                }
            }
        }
        _ => {
            ctx.report(mnemonic.line, mnemonic.col, "missing 'csr' operand");
            vec![(Opcode::Csr, 0)]
        }
    }
}

/// Assemble source text into a flat `(Opcode, operand)` program image, one
/// pair per memory slot, ready for `Vm::load` or `savm_file::write`.
/// `file` names the source for diagnostics (`file:line:col: error: ...`).
pub fn assemble(source: &str, file: &str) -> Result<Vec<(Opcode, i64)>, AssembleError> {
    let mut ctx = AssembleContext::new(file);
    let lines = logical_lines(source, &mut ctx);
    resolve_label_addresses(&lines, &mut ctx);

    let mut out = Vec::new();
    let mut address = 0usize;

    for line in &lines {
        match mnemonic_text(line) {
            None => {}
            Some(".text") => ctx.section = Section::Text,
            Some(".data") => ctx.section = Section::Data,
            Some("dsr") => {
                ctx.current_return_slot = Some(address);
                out.push((Opcode::Stm, address as i64));
            }
            Some("rsr") => {
                let mnemonic = line.mnemonic.as_ref().unwrap();
                let slot = ctx.current_return_slot.unwrap_or_else(|| {
                    ctx.report(mnemonic.line, mnemonic.col, "'rsr' outside any subroutine");
                    address
                });
                out.push((Opcode::Ldm, slot as i64));
                out.push((Opcode::Braa, 0));
            }
            Some("csr") => {
                let mnemonic = line.mnemonic.as_ref().unwrap();
                out.extend(emit_csr(mnemonic, &line.operands, address, &mut ctx));
            }
            Some(_) => {
                let mnemonic = line.mnemonic.as_ref().unwrap();
                out.push(emit_instruction(mnemonic, &line.operands, &mut ctx));
            }
        }

        address += line_size(line);
    }

    if ctx.error_count > 0 {
        return Err(AssembleError::Failed(ctx.error_count));
    }

    if out.len() > MEM {
        return Err(AssembleError::TooManyInstructions(out.len(), MEM));
    }

    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    fn assemble_test(source: &str) -> Result<Vec<(Opcode, i64)>, AssembleError> {
        assemble(source, "test.asm")
    }

    fn opcodes(source: &str) -> Vec<Opcode> {
        assemble_test(source).unwrap().into_iter().map(|(op, _)| op).collect()
    }

    #[test]
    fn direct_mnemonic_bypasses_family_dispatch() {
        let program = assemble_test("hlt").unwrap();
        assert_eq!(program, vec![(Opcode::Hlt, 0)]);
    }

    #[test]
    fn family_stem_dispatches_on_operand_kind() {
        let program = assemble_test("lda 5\nlda foo\nlda tos\nfoo: nop").unwrap();
        assert_eq!(program[0].0, Opcode::Ldi);
        assert_eq!(program[1].0, Opcode::Ldm);
        assert_eq!(program[1].1, 3);
        assert_eq!(program[2].0, Opcode::Ldas);
    }

    #[test]
    fn forward_label_reference_resolves() {
        let program = assemble_test("bra target\ntarget: hlt").unwrap();
        assert_eq!(program[0], (Opcode::Bra, 1));
    }

    #[test]
    fn undefined_label_is_a_failure() {
        assert!(assemble_test("bra nowhere").is_err());
    }

    #[test]
    fn duplicate_label_is_a_failure() {
        assert!(assemble_test("a: nop\na: nop").is_err());
    }

    #[test]
    fn bare_csr_address_round_trips_as_the_real_opcode() {
        // What the disassembler emits for a real `Csr` slot (`csr [5]`)
        // re-lexes as mnemonic `csr` + an `Int` operand (brackets are
        // transparent punctuation), and must assemble back to the single
        // real opcode, not the call expansion.
        let program = assemble_test("csr 5\nhlt").unwrap();
        assert_eq!(program, vec![(Opcode::Csr, 5), (Opcode::Hlt, 0)]);
    }

    #[test]
    fn subroutine_call_desugars_to_self_modifying_sequence() {
        let source = "csr sub\nhlt\nsub: dsr\nnop\nrsr";
        assert_eq!(
            opcodes(source),
            vec![
                Opcode::Ldi,
                Opcode::Csr,
                Opcode::Hlt,
                Opcode::Stm,
                Opcode::Nop,
                Opcode::Ldm,
                Opcode::Braa,
            ]
        );

        let program = assemble_test(source).unwrap();
        // return address points past the 2-slot call site.
        assert_eq!(program[0].1, 2);
        // csr targets sub's header slot (address 3).
        assert_eq!(program[1].1, 3);
        // the header slot stores into itself.
        assert_eq!(program[3].1, 3);
        // rsr reloads from that same slot.
        assert_eq!(program[5].1, 3);
    }

    #[test]
    fn csr_targeting_a_non_subroutine_label_is_an_error() {
        assert!(assemble_test("csr plain\nhlt\nplain: nop").is_err());
    }

    #[test]
    fn rsr_outside_a_subroutine_is_an_error() {
        assert!(assemble_test("rsr").is_err());
    }

    #[test]
    fn section_directives_are_accepted_and_emit_nothing() {
        let program = assemble_test(".text\nnop\n.data\ndat 4").unwrap();
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn family_with_no_matching_mode_is_an_error() {
        // `not` has no immediate form.
        assert!(assemble_test("not 5").is_err());
    }
}
