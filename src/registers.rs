//! Registers and condition flags.
//!
//! `MAR`/`CIR`/`MDR` are private to [`crate::vm::Vm`] — guest code has no way to
//! observe them, only `ACC` and the effect of branches on `PC`.

use crate::isa::Opcode;
use bitflags::bitflags;

bitflags! {
    /// `CF`/`ZF`/`NF`, set only by the `cmp*` family. Exactly one bit is ever set
    /// after a comparison; all clear before the first one in a run.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Flags: u8 {
        const CF = 0b001;
        const ZF = 0b010;
        const NF = 0b100;
    }
}

impl Flags {
    /// Derive the one-hot triple from the result of a `cmp*`.
    pub fn from_comparison(result: i64) -> Flags {
        if result > 0 {
            Flags::CF
        } else if result == 0 {
            Flags::ZF
        } else {
            Flags::NF
        }
    }
}

impl Default for Flags {
    fn default() -> Flags {
        Flags::empty()
    }
}

/// The register file. `pc`/`mar`/`cir`/`mdr` are machine-internal; only `acc`
/// is meaningfully guest-visible through opcode semantics.
#[derive(Clone, Copy, Debug)]
pub struct Registers {
    pub acc: i64,
    pub pc: i64,
    pub(crate) mar: i64,
    pub(crate) cir: Opcode,
    pub(crate) mdr: i64,
    pub flags: Flags,
}

impl Default for Registers {
    fn default() -> Registers {
        Registers {
            acc: 0,
            pc: 0,
            mar: 0,
            cir: Opcode::Nop,
            mdr: 0,
            flags: Flags::default(),
        }
    }
}
