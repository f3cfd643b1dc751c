//! Family-stem operand-mode dispatch for source syntax.
//!
//! `isa::opcode_table!` gives every opcode its own fully distinct mnemonic
//! (`ldi`/`ldm`/`ldas`) so the disassembler never collapses two opcodes into
//! one spelling. Source text is friendlier the other way around: a program
//! writes the bare family stem (`lda 5`, `lda label`, `lda tos`) and the
//! *next token's kind* picks the concrete opcode. This table is the bridge
//! between the two: one stem maps to up to four concrete opcodes, one per
//! operand mode the family actually supports.
//!
//! Opcodes with only one possible spelling (`nop`, `bra`, `csr`, the
//! conditional branches, ...) have no entry here; the parser resolves those
//! directly via `Opcode::from_mnemonic` before ever consulting this table.

use savm::isa::Opcode;

/// The operand-mode slot a following token resolves to, as judged purely
/// from what the token looks like: an `Int` literal selects immediate, the
/// `tos` keyword selects stack, any other bare identifier selects memory
/// (a label reference), and no token at all (end of line) selects
/// accumulator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NextKind {
    Immediate,
    Memory,
    Stack,
    Accumulator,
}

macro_rules! family {
    ($stem:expr, $kind:expr, $target:expr => { $( $k:ident : $variant:ident ),+ $(,)? }) => {
        if $stem == $target {
            return match $kind {
                $( NextKind::$k => Some(Opcode::$variant), )+
                #[allow(unreachable_patterns)]
                _ => None,
            };
        }
    };
}

/// Resolve a source-level family stem plus the next token's kind into a
/// concrete opcode. `stem` must already be lowercased. Returns `None` when
/// `stem` names no family, or when the family has no variant for `kind`
/// (e.g. `not 5` — `not` has no immediate form).
pub fn resolve(stem: &str, kind: NextKind) -> Option<Opcode> {
    family!(stem, kind, "lda" => { Immediate: Ldi, Memory: Ldm, Stack: Ldas });
    family!(stem, kind, "sta" => { Memory: Stm, Stack: Stas });
    family!(stem, kind, "prc" => { Immediate: Prci, Memory: Prcm, Accumulator: Prca, Stack: Prcs });
    family!(stem, kind, "pri" => { Immediate: Prii, Memory: Prim, Accumulator: Pria, Stack: Pris });

    family!(stem, kind, "add" => { Immediate: Addi, Memory: Addm, Stack: Adds });
    family!(stem, kind, "sub" => { Immediate: Subi, Memory: Subm, Stack: Subs });
    family!(stem, kind, "mul" => { Immediate: Muli, Memory: Mulm, Stack: Muls });
    family!(stem, kind, "div" => { Immediate: Divi, Memory: Divm, Stack: Divs });
    family!(stem, kind, "mod" => { Immediate: Modi, Memory: Modm, Stack: Mods });

    family!(stem, kind, "shl" => { Immediate: Shli, Memory: Shlm, Stack: Shls });
    family!(stem, kind, "shr" => { Immediate: Shri, Memory: Shrm, Stack: Shrs });
    family!(stem, kind, "and" => { Immediate: Andi, Memory: Andm, Stack: Ands });
    family!(stem, kind, "or"  => { Immediate: Ori,  Memory: Orm,  Stack: Ors });
    family!(stem, kind, "xor" => { Immediate: Xori, Memory: Xorm, Stack: Xors });

    family!(stem, kind, "not" => { Accumulator: Not, Memory: NotM, Stack: NotS });
    family!(stem, kind, "neg" => { Accumulator: Neg, Memory: NegM, Stack: NegS });

    family!(stem, kind, "cmp" => { Immediate: Cmpi, Memory: Cmpm, Stack: Cmps });

    family!(stem, kind, "psh" => { Accumulator: Psha, Immediate: Pshi, Memory: Pshm, Stack: Pshs });
    family!(stem, kind, "pop" => { Accumulator: Popa, Memory: Popm });
    family!(stem, kind, "swp" => { Memory: Swpm, Stack: Swps });

    family!(stem, kind, "rdc" => { Accumulator: Rdca, Memory: Rdcm, Stack: Rdcs });
    family!(stem, kind, "rdi" => { Accumulator: Rdia, Memory: Rdim, Stack: Rdis });

    family!(stem, kind, "ref" => { Memory: Refm, Stack: Refs });
    family!(stem, kind, "ldd" => { Accumulator: Ldda, Memory: Lddm, Stack: Ldds });
    family!(stem, kind, "std" => { Memory: Stdm, Stack: Stds });

    family!(stem, kind, "sez"  => { Accumulator: Seza,  Memory: Sezm,  Stack: Sezs });
    family!(stem, kind, "sep"  => { Accumulator: Sepa,  Memory: Sepm,  Stack: Seps });
    family!(stem, kind, "sen"  => { Accumulator: Sena,  Memory: Senm,  Stack: Sens });
    family!(stem, kind, "seq"  => { Accumulator: Seqa,  Memory: Seqm,  Stack: Seqs });
    family!(stem, kind, "sene" => { Accumulator: Senea, Memory: Senem, Stack: Senes });
    family!(stem, kind, "selt" => { Accumulator: Selta, Memory: Seltm, Stack: Selts });
    family!(stem, kind, "sele" => { Accumulator: Selea, Memory: Selem, Stack: Seles });
    family!(stem, kind, "segt" => { Accumulator: Segta, Memory: Segtm, Stack: Segts });
    family!(stem, kind, "sege" => { Accumulator: Segea, Memory: Segem, Stack: Seges });

    None
}

/// True when `stem` names a family at all (regardless of whether `kind`
/// would resolve) — used by the parser to tell "unknown mnemonic" apart
/// from "known family, wrong operand for this mode".
pub fn is_family_stem(stem: &str) -> bool {
    const STEMS: &[&str] = &[
        "lda", "sta", "prc", "pri", "add", "sub", "mul", "div", "mod", "shl", "shr", "and", "or",
        "xor", "not", "neg", "cmp", "psh", "pop", "swp", "rdc", "rdi", "ref", "ldd", "std", "sez",
        "sep", "sen", "seq", "sene", "selt", "sele", "segt", "sege",
    ];
    STEMS.contains(&stem)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lda_dispatches_on_next_token_kind() {
        assert_eq!(resolve("lda", NextKind::Immediate), Some(Opcode::Ldi));
        assert_eq!(resolve("lda", NextKind::Memory), Some(Opcode::Ldm));
        assert_eq!(resolve("lda", NextKind::Stack), Some(Opcode::Ldas));
        assert_eq!(resolve("lda", NextKind::Accumulator), None);
    }

    #[test]
    fn not_has_no_immediate_form() {
        assert_eq!(resolve("not", NextKind::Immediate), None);
        assert_eq!(resolve("not", NextKind::Accumulator), Some(Opcode::Not));
    }

    #[test]
    fn unknown_stem_resolves_to_none() {
        assert_eq!(resolve("wat", NextKind::Memory), None);
        assert!(!is_family_stem("wat"));
    }

    #[test]
    fn every_family_stem_resolves_at_least_one_mode() {
        for stem in [
            "lda", "sta", "prc", "pri", "add", "sub", "mul", "div", "mod", "shl", "shr", "and",
            "or", "xor", "not", "neg", "cmp", "psh", "pop", "swp", "rdc", "rdi", "ref", "ldd",
            "std", "sez", "sep", "sen", "seq", "sene", "selt", "sele", "segt", "sege",
        ] {
            let any = [
                NextKind::Immediate,
                NextKind::Memory,
                NextKind::Stack,
                NextKind::Accumulator,
            ]
            .iter()
            .any(|k| resolve(stem, *k).is_some());
            assert!(any, "stem {} resolved nothing", stem);
        }
    }
}
