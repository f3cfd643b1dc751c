//! The instruction set: opcodes, their canonical mnemonics and their operand modes.
//!
//! Unlike a register machine's R/I/J word encoding, a slot in this machine is just
//! an `(Opcode, i64)` pair living in two parallel arrays — there is no bit layout to
//! pack. `opcode_table!` instead generates the `Opcode` enum together with the two
//! lookup functions every other component needs: `mnemonic()` for the disassembler
//! and `mode()` for the parser's operand-mode dispatch.

use num_derive::{FromPrimitive, ToPrimitive};

/// How a slot's operand word is produced and rendered.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandMode {
    /// Operand is a literal value, carried straight from the source text or label table.
    Immediate,
    /// Operand is a memory address; disassembles bracketed, e.g. `lda [4]`.
    Memory,
    /// Effective operand is the accumulator; no operand token in either direction.
    Accumulator,
    /// Effective operand is the top of the operand stack; no operand token.
    Stack,
    /// No operand at all.
    None,
}

macro_rules! opcode_table {
    ( $( $variant:ident => ($mnemonic:expr, $mode:expr) ),+ $(,)? ) => {
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, FromPrimitive, ToPrimitive)]
        pub enum Opcode {
            $( $variant ),+
        }

        impl Opcode {
            /// The mnemonic this opcode disassembles to. Every variant gets its own
            /// distinct spelling — no two opcodes share a mnemonic in this table,
            /// which is what makes `assemble(disassemble(img)) == img` hold even
            /// for images mixing `bra`/`braa`/`csr`.
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $( Opcode::$variant => $mnemonic ),+
                }
            }

            pub fn mode(self) -> OperandMode {
                match self {
                    $( Opcode::$variant => $mode ),+
                }
            }

            /// Look up an opcode by its source-level mnemonic (already lowercased).
            pub fn from_mnemonic(text: &str) -> Option<Opcode> {
                match text {
                    $( $mnemonic => Some(Opcode::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

use OperandMode::*;

opcode_table! {
    Nop   => ("nop", None),
    Hlt   => ("hlt", None),
    Dat   => ("dat", Immediate),

    Ldi   => ("ldi", Immediate),
    Ldm   => ("ldm", Memory),
    Ldas  => ("ldas", Stack),
    Stm   => ("stm", Memory),
    Stas  => ("stas", Stack),

    Prci  => ("prci", Immediate),
    Prcm  => ("prcm", Memory),
    Prca  => ("prca", Accumulator),
    Prcs  => ("prcs", Stack),
    Prii  => ("prii", Immediate),
    Prim  => ("prim", Memory),
    Pria  => ("pria", Accumulator),
    Pris  => ("pris", Stack),

    Addi  => ("addi", Immediate), Addm => ("addm", Memory), Adds => ("adds", Stack),
    Subi  => ("subi", Immediate), Subm => ("subm", Memory), Subs => ("subs", Stack),
    Muli  => ("muli", Immediate), Mulm => ("mulm", Memory), Muls => ("muls", Stack),
    Divi  => ("divi", Immediate), Divm => ("divm", Memory), Divs => ("divs", Stack),
    Modi  => ("modi", Immediate), Modm => ("modm", Memory), Mods => ("mods", Stack),

    Shli  => ("shli", Immediate), Shlm => ("shlm", Memory), Shls => ("shls", Stack),
    Shri  => ("shri", Immediate), Shrm => ("shrm", Memory), Shrs => ("shrs", Stack),
    Andi  => ("andi", Immediate), Andm => ("andm", Memory), Ands => ("ands", Stack),
    Ori   => ("ori", Immediate),  Orm  => ("orm", Memory),  Ors  => ("ors", Stack),
    Xori  => ("xori", Immediate), Xorm => ("xorm", Memory), Xors => ("xors", Stack),

    Not   => ("not", Accumulator), NotM => ("notm", Memory), NotS => ("nots", Stack),
    Neg   => ("neg", Accumulator), NegM => ("negm", Memory), NegS => ("negs", Stack),

    Bra   => ("bra", Memory),
    Braa  => ("braa", None),
    Brz   => ("brz", Memory),
    Brp   => ("brp", Memory),
    Brn   => ("brn", Memory),

    Cmpi  => ("cmpi", Immediate), Cmpm => ("cmpm", Memory), Cmps => ("cmps", Stack),
    Beq   => ("beq", Memory), Bne => ("bne", Memory),
    Blt   => ("blt", Memory), Ble => ("ble", Memory),
    Bgt   => ("bgt", Memory), Bge => ("bge", Memory),

    Psha  => ("psha", Accumulator), Pshi => ("pshi", Immediate),
    Pshm  => ("pshm", Memory), Pshs => ("pshs", Stack),
    Popa  => ("popa", Accumulator), Popm => ("popm", Memory),
    Drp   => ("drp", None),
    Swpm  => ("swpm", Memory), Swps => ("swps", Stack),

    Rdca  => ("rdca", Accumulator), Rdcm => ("rdcm", Memory), Rdcs => ("rdcs", Stack),
    Rdia  => ("rdia", Accumulator), Rdim => ("rdim", Memory), Rdis => ("rdis", Stack),

    Refm  => ("refm", Memory), Refs => ("refs", Stack),
    Ldda  => ("ldda", Accumulator), Lddm => ("lddm", Memory), Ldds => ("ldds", Stack),
    Stdm  => ("stdm", Memory), Stds => ("stds", Stack),

    Seza  => ("seza", Accumulator), Sezm => ("sezm", Memory), Sezs => ("sezs", Stack),
    Sepa  => ("sepa", Accumulator), Sepm => ("sepm", Memory), Seps => ("seps", Stack),
    Sena  => ("sena", Accumulator), Senm => ("senm", Memory), Sens => ("sens", Stack),
    Seqa  => ("seqa", Accumulator), Seqm => ("seqm", Memory), Seqs => ("seqs", Stack),
    Senea => ("senea", Accumulator), Senem => ("senem", Memory), Senes => ("senes", Stack),
    Selta => ("selta", Accumulator), Seltm => ("seltm", Memory), Selts => ("selts", Stack),
    Selea => ("selea", Accumulator), Selem => ("selem", Memory), Seles => ("seles", Stack),
    Segta => ("segta", Accumulator), Segtm => ("segtm", Memory), Segts => ("segts", Stack),
    Segea => ("segea", Accumulator), Segem => ("segem", Memory), Seges => ("seges", Stack),

    Csr   => ("csr", Memory),
    Ips   => ("ips", None),
}
