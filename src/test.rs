use crate::isa::Opcode::*;
use crate::vm::Vm;
use std::io::Cursor;

/// Build a VM with a program laid directly into memory, bypassing the codec
/// and assembler crates so these tests exercise only executor semantics.
fn build(program: &[(crate::isa::Opcode, i64)]) -> Vm {
    let mut vm = Vm::new();
    for (opcode, operand) in program {
        vm.memory.push(*opcode, *operand);
    }
    vm
}

fn run_built(vm: &mut Vm, stdin: &str) -> String {
    let mut input = Cursor::new(stdin.as_bytes().to_vec());
    let mut output = Vec::new();
    vm.run(&mut input, &mut output)
        .expect("program should run to completion");
    String::from_utf8(output).unwrap()
}

#[test]
fn hello_digit_prints_one_byte() {
    let mut vm = build(&[(Prci, 'A' as i64), (Hlt, 0)]);
    let out = run_built(&mut vm, "");
    assert_eq!(out, "A");
}

#[test]
fn sum_loop_counts_down_to_zero() {
    let mut vm = build(&[
        (Ldi, 3),  // 0: acc = 3
        (Stm, 10), // 1: d[10] = acc (counter)
        (Ldm, 10), // 2: loop: acc = d[10]
        (Cmpi, 0), // 3: compare counter to zero
        (Beq, 8),  // 4: if zero, done
        (Subi, 1), // 5: acc -= 1
        (Stm, 10), // 6: d[10] = acc
        (Bra, 2),  // 7: loop
        (Hlt, 0),  // 8: done
    ]);
    run_built(&mut vm, "");
    assert_eq!(vm.memory.data_at(10), 0);
}

#[test]
fn forward_branch_skips_instruction() {
    let mut vm = build(&[
        (Ldi, 1),  // 0
        (Bra, 3),  // 1: jump to slot 3
        (Ldi, 99), // 2: skipped
        (Hlt, 0),  // 3
    ]);
    run_built(&mut vm, "");
    assert_eq!(vm.registers.acc, 1);
}

#[test]
fn subroutine_self_modifying_return_slot() {
    // csr/rsr desugaring: the caller loads the return address into the
    // header slot (dsr) before jumping into the routine body; the routine
    // loads that slot back and braas to it.
    let mut vm = build(&[
        (Ldi, 4),  // 0: return address literal
        (Stm, 6),  // 1: store into the dsr header slot at 6
        (Bra, 7),  // 2: jump into the routine body
        (Hlt, 0),  // 3
        (Ldi, 42), // 4: return target — acc = 42
        (Hlt, 0),  // 5
        (Dat, 0),  // 6: dsr header / return-address slot
        (Ldm, 6),  // 7: routine body: load return addr
        (Braa, 0), // 8: branch to acc (rsr)
    ]);
    run_built(&mut vm, "");
    assert_eq!(vm.registers.acc, 42);
}

#[test]
fn stack_discipline_push_pop_round_trips() {
    let mut vm = build(&[(Ldi, 7), (Psha, 0), (Ldi, 0), (Popa, 0), (Hlt, 0)]);
    run_built(&mut vm, "");
    assert_eq!(vm.registers.acc, 7);
    assert_eq!(vm.stack.sp(), 0);
}

#[test]
fn stack_underflow_is_fatal() {
    let mut vm = build(&[(Popa, 0), (Hlt, 0)]);
    let mut input = Cursor::new(Vec::new());
    let mut output = Vec::new();
    assert!(vm.run(&mut input, &mut output).is_err());
}

#[test]
fn comparison_sets_one_hot_flags() {
    let mut vm = build(&[(Ldi, 5), (Cmpi, 5), (Hlt, 0)]);
    run_built(&mut vm, "");
    assert!(vm.registers.flags.contains(crate::registers::Flags::ZF));
    assert!(!vm.registers.flags.contains(crate::registers::Flags::CF));
    assert!(!vm.registers.flags.contains(crate::registers::Flags::NF));
}

#[test]
fn empty_stack_tos_reads_slot_zero() {
    let vm = build(&[(Hlt, 0)]);
    assert_eq!(vm.stack.tos(), 0);
}

#[test]
fn memory_exhaustion_is_fatal() {
    let mut vm = Vm::new();
    vm.registers.pc = crate::memory::MEM as i64;
    let mut input = Cursor::new(Vec::new());
    let mut output = Vec::new();
    assert!(vm.run(&mut input, &mut output).is_err());
}

#[test]
fn undefined_label_style_program_still_runs_via_direct_memory_build() {
    // Guards against a regression where `dsr`'s reserved slot (opcode `dat`)
    // would be misinterpreted as an executable no-op that advances past its
    // own return address instead of holding it inert.
    let mut vm = build(&[(Dat, 99), (Hlt, 0)]);
    run_built(&mut vm, "");
    assert_eq!(vm.memory.data_at(0), 99);
}
