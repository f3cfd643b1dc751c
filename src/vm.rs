//! The fetch-decode-execute loop.
//!
//! A cycle is atomic: `execute` may change `pc`, but that only takes effect on
//! the *next* `fetch`. Branches never retarget the instruction currently
//! executing.

use crate::error::{LoadError, RuntimeError};
use crate::isa::Opcode;
use crate::memory::{Memory, Stack, MEM};
use crate::registers::{Flags, Registers};
use log::{debug, trace};
use num_traits::FromPrimitive;
use std::io::{BufRead, Write};

/// The virtual machine: registers, both memories, the operand stack and the
/// run/halt flag.
pub struct Vm {
    pub registers: Registers,
    pub memory: Memory,
    pub stack: Stack,
    pub running: bool,
}

impl Vm {
    pub fn new() -> Vm {
        Vm {
            registers: Registers::default(),
            memory: Memory::new(),
            stack: Stack::new(),
            running: false,
        }
    }

    /// Populate `I[]`/`D[]` from a decoded `(opcode, operand)` pair stream,
    /// in insertion order starting at slot 0. Mirrors the reference loader's
    /// `push_op`, except unknown opcode values are reported rather than
    /// killing the process outright.
    pub fn load(&mut self, pairs: impl IntoIterator<Item = (i64, i64)>) -> Result<(), LoadError> {
        for (raw_opcode, operand) in pairs {
            let opcode = Opcode::from_i64(raw_opcode).ok_or(LoadError::UndefinedOpcode(raw_opcode))?;
            if !self.memory.push(opcode, operand) {
                return Err(LoadError::MemoryOverflow(MEM));
            }
        }
        Ok(())
    }

    /// Run until `hlt`, a runtime error, or `pc` running off the end of memory.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> Result<(), RuntimeError> {
        self.running = true;
        while self.running {
            self.cycle(input, output)?;
        }
        debug!("halted at pc={}", self.registers.pc);
        Ok(())
    }

    pub fn cycle<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> Result<(), RuntimeError> {
        self.fetch()?;
        self.decode();
        trace!(
            "pc={} cir={:?} mdr={}",
            self.registers.pc,
            self.registers.cir,
            self.registers.mdr
        );
        self.execute(input, output)
    }

    fn fetch(&mut self) -> Result<(), RuntimeError> {
        if self.registers.pc as usize >= MEM {
            return Err(RuntimeError::MemoryExhausted);
        }
        self.registers.mar = self.registers.pc;
        self.registers.pc += 1;
        Ok(())
    }

    fn decode(&mut self) {
        let mar = self.registers.mar as usize;
        self.registers.cir = self.memory.instruction_at(mar);
        self.registers.mdr = self.memory.data_at(mar);
    }

    fn read_line<R: BufRead>(input: &mut R) -> Result<String, RuntimeError> {
        let mut line = String::new();
        input.read_line(&mut line)?;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    fn execute<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> Result<(), RuntimeError> {
        use Opcode::*;

        let mdr = self.registers.mdr;
        let addr = mdr as usize;

        match self.registers.cir {
            Nop | Dat | Ips => {}
            Hlt => self.running = false,

            Ldi => self.registers.acc = mdr,
            Ldm => self.registers.acc = self.memory.data_at(addr),
            Ldas => self.registers.acc = self.stack.tos(),
            Stm => self.memory.set_data(addr, self.registers.acc),
            Stas => self.stack.set_tos(self.registers.acc),

            Prci => Self::write_char(output, mdr)?,
            Prcm => Self::write_char(output, self.memory.data_at(addr))?,
            Prca => Self::write_char(output, self.registers.acc)?,
            Prcs => Self::write_char(output, self.stack.tos())?,
            Prii => Self::write_int(output, mdr)?,
            Prim => Self::write_int(output, self.memory.data_at(addr))?,
            Pria => Self::write_int(output, self.registers.acc)?,
            Pris => Self::write_int(output, self.stack.tos())?,

            Addi => self.registers.acc = self.registers.acc.wrapping_add(mdr),
            Addm => self.registers.acc = self.registers.acc.wrapping_add(self.memory.data_at(addr)),
            Adds => self.registers.acc = self.registers.acc.wrapping_add(self.stack.tos()),
            Subi => self.registers.acc = self.registers.acc.wrapping_sub(mdr),
            Subm => self.registers.acc = self.registers.acc.wrapping_sub(self.memory.data_at(addr)),
            Subs => self.registers.acc = self.registers.acc.wrapping_sub(self.stack.tos()),
            Muli => self.registers.acc = self.registers.acc.wrapping_mul(mdr),
            Mulm => self.registers.acc = self.registers.acc.wrapping_mul(self.memory.data_at(addr)),
            Muls => self.registers.acc = self.registers.acc.wrapping_mul(self.stack.tos()),
            Divi => self.registers.acc = self.registers.acc.checked_div(mdr).unwrap_or(0),
            Divm => self.registers.acc = self.registers.acc.checked_div(self.memory.data_at(addr)).unwrap_or(0),
            Divs => self.registers.acc = self.registers.acc.checked_div(self.stack.tos()).unwrap_or(0),
            Modi => self.registers.acc = self.registers.acc.checked_rem(mdr).unwrap_or(0),
            Modm => self.registers.acc = self.registers.acc.checked_rem(self.memory.data_at(addr)).unwrap_or(0),
            Mods => self.registers.acc = self.registers.acc.checked_rem(self.stack.tos()).unwrap_or(0),

            Shli => self.registers.acc <<= (mdr as u32).rem_euclid(64),
            Shlm => self.registers.acc <<= (self.memory.data_at(addr) as u32).rem_euclid(64),
            Shls => self.registers.acc <<= (self.stack.tos() as u32).rem_euclid(64),
            Shri => self.registers.acc >>= (mdr as u32).rem_euclid(64),
            Shrm => self.registers.acc >>= (self.memory.data_at(addr) as u32).rem_euclid(64),
            Shrs => self.registers.acc >>= (self.stack.tos() as u32).rem_euclid(64),
            Andi => self.registers.acc &= mdr,
            Andm => self.registers.acc &= self.memory.data_at(addr),
            Ands => self.registers.acc &= self.stack.tos(),
            Ori => self.registers.acc |= mdr,
            Orm => self.registers.acc |= self.memory.data_at(addr),
            Ors => self.registers.acc |= self.stack.tos(),
            Xori => self.registers.acc ^= mdr,
            Xorm => self.registers.acc ^= self.memory.data_at(addr),
            Xors => self.registers.acc ^= self.stack.tos(),

            Not => self.registers.acc = (self.registers.acc == 0) as i64,
            NotM => self.memory.set_data(addr, (self.memory.data_at(addr) == 0) as i64),
            NotS => self.stack.set_tos((self.stack.tos() == 0) as i64),
            Neg => self.registers.acc = -self.registers.acc,
            NegM => self.memory.set_data(addr, -self.memory.data_at(addr)),
            NegS => self.stack.set_tos(-self.stack.tos()),

            Bra | Csr => self.registers.pc = mdr,
            Braa => self.registers.pc = self.registers.acc,
            Brz => {
                if self.registers.acc == 0 {
                    self.registers.pc = mdr;
                }
            }
            Brp => {
                if self.registers.acc >= 0 {
                    self.registers.pc = mdr;
                }
            }
            Brn => {
                if self.registers.acc < 0 {
                    self.registers.pc = mdr;
                }
            }

            Cmpi => self.compare(mdr),
            Cmpm => self.compare(self.memory.data_at(addr)),
            Cmps => self.compare(self.stack.tos()),
            Beq => {
                if self.registers.flags.contains(Flags::ZF) {
                    self.registers.pc = mdr;
                }
            }
            Bne => {
                if !self.registers.flags.contains(Flags::ZF) {
                    self.registers.pc = mdr;
                }
            }
            Blt => {
                if self.registers.flags.contains(Flags::NF) {
                    self.registers.pc = mdr;
                }
            }
            Ble => {
                if self.registers.flags.intersects(Flags::NF | Flags::ZF) {
                    self.registers.pc = mdr;
                }
            }
            Bgt => {
                if self.registers.flags.contains(Flags::CF) {
                    self.registers.pc = mdr;
                }
            }
            Bge => {
                if self.registers.flags.intersects(Flags::CF | Flags::ZF) {
                    self.registers.pc = mdr;
                }
            }

            Psha => self.stack.push(self.registers.acc)?,
            Pshi => self.stack.push(mdr)?,
            Pshm => self.stack.push(self.memory.data_at(addr))?,
            Pshs => {
                let tos = self.stack.tos();
                self.stack.push(tos)?;
            }
            Popa => self.registers.acc = self.stack.pop()?,
            Popm => {
                let value = self.stack.pop()?;
                self.memory.set_data(addr, value);
            }
            Drp => self.stack.drop_top(),
            Swpm => {
                let tos = self.stack.tos();
                let mem_val = self.memory.data_at(addr);
                self.stack.set_tos(mem_val);
                self.memory.set_data(addr, tos);
            }
            Swps => self.stack.swap_top_two()?,

            Rdca => self.registers.acc = Self::read_char(input)?,
            Rdcm => {
                let value = Self::read_char(input)?;
                self.memory.set_data(addr, value);
            }
            Rdcs => {
                let value = Self::read_char(input)?;
                self.stack.set_tos(value);
            }
            Rdia => self.registers.acc = Self::read_int(input)?,
            Rdim => {
                let value = Self::read_int(input)?;
                self.memory.set_data(addr, value);
            }
            Rdis => {
                let value = Self::read_int(input)?;
                self.stack.set_tos(value);
            }

            Refm => self.registers.acc = mdr,
            Refs => self.registers.acc = self.stack.tos(),
            Ldda => self.registers.acc = self.memory.data_at(self.registers.acc as usize),
            Lddm => {
                let indirect = self.memory.data_at(addr) as usize;
                self.registers.acc = self.memory.data_at(indirect);
            }
            Ldds => {
                let indirect = self.stack.tos() as usize;
                self.registers.acc = self.stack.slot(indirect).unwrap_or(0);
            }
            Stdm => {
                let indirect = self.memory.data_at(addr) as usize;
                self.memory.set_data(indirect, self.registers.acc);
            }
            Stds => {
                let indirect = self.stack.tos() as usize;
                self.stack.set_slot(indirect, self.registers.acc);
            }

            Seza => self.registers.acc = (self.registers.acc == 0) as i64,
            Sezm => self.memory.set_data(addr, (self.registers.acc == 0) as i64),
            Sezs => self.stack.set_tos((self.registers.acc == 0) as i64),
            Sepa => self.registers.acc = (self.registers.acc >= 0) as i64,
            Sepm => self.memory.set_data(addr, (self.registers.acc >= 0) as i64),
            Seps => self.stack.set_tos((self.registers.acc >= 0) as i64),
            Sena => self.registers.acc = (self.registers.acc < 0) as i64,
            Senm => self.memory.set_data(addr, (self.registers.acc < 0) as i64),
            Sens => self.stack.set_tos((self.registers.acc < 0) as i64),

            Seqa => self.registers.acc = self.registers.flags.contains(Flags::ZF) as i64,
            Seqm => self.memory.set_data(addr, self.registers.flags.contains(Flags::ZF) as i64),
            Seqs => self.stack.set_tos(self.registers.flags.contains(Flags::ZF) as i64),
            Senea => self.registers.acc = !self.registers.flags.contains(Flags::ZF) as i64,
            Senem => self.memory.set_data(addr, !self.registers.flags.contains(Flags::ZF) as i64),
            Senes => self.stack.set_tos(!self.registers.flags.contains(Flags::ZF) as i64),
            Selta => self.registers.acc = self.registers.flags.contains(Flags::NF) as i64,
            Seltm => self.memory.set_data(addr, self.registers.flags.contains(Flags::NF) as i64),
            Selts => self.stack.set_tos(self.registers.flags.contains(Flags::NF) as i64),
            Selea => self.registers.acc = self.registers.flags.intersects(Flags::NF | Flags::ZF) as i64,
            Selem => self.memory.set_data(addr, self.registers.flags.intersects(Flags::NF | Flags::ZF) as i64),
            Seles => self.stack.set_tos(self.registers.flags.intersects(Flags::NF | Flags::ZF) as i64),
            Segta => self.registers.acc = self.registers.flags.contains(Flags::CF) as i64,
            Segtm => self.memory.set_data(addr, self.registers.flags.contains(Flags::CF) as i64),
            Segts => self.stack.set_tos(self.registers.flags.contains(Flags::CF) as i64),
            Segea => self.registers.acc = self.registers.flags.intersects(Flags::CF | Flags::ZF) as i64,
            Segem => self.memory.set_data(addr, self.registers.flags.intersects(Flags::CF | Flags::ZF) as i64),
            Seges => self.stack.set_tos(self.registers.flags.intersects(Flags::CF | Flags::ZF) as i64),
        }

        Ok(())
    }

    fn compare(&mut self, operand: i64) {
        self.registers.acc = self.registers.acc.abs().wrapping_sub(operand.abs());
        self.registers.flags = Flags::from_comparison(self.registers.acc);
    }

    fn write_char<W: Write>(output: &mut W, value: i64) -> Result<(), RuntimeError> {
        output.write_all(&[value as u8])?;
        Ok(())
    }

    fn write_int<W: Write>(output: &mut W, value: i64) -> Result<(), RuntimeError> {
        write!(output, "{}", value)?;
        Ok(())
    }

    fn read_char<R: BufRead>(input: &mut R) -> Result<i64, RuntimeError> {
        let line = Self::read_line(input)?;
        Ok(line.bytes().next().unwrap_or(0) as i64)
    }

    fn read_int<R: BufRead>(input: &mut R) -> Result<i64, RuntimeError> {
        let line = Self::read_line(input)?;
        Ok(line.trim().parse().unwrap_or(0))
    }
}

impl Default for Vm {
    fn default() -> Vm {
        Vm::new()
    }
}
