use vm::isa::{encode, Instruction};
use vm::{Cpu, Memory, StepOutcome, FLAG_CARRY, FLAG_ZERO};

fn assemble(program: &[Instruction]) -> Vec<u8> {
    program.iter().flat_map(|&i| encode(i)).collect()
}

fn machine_with(program: &[Instruction]) -> (Cpu, Memory) {
    let mut mem = Memory::new(0x10000);
    mem.write_code(0, &assemble(program));
    (Cpu::new(), mem)
}

#[test]
fn arithmetic_sets_registers_and_flags() {
    let (mut cpu, mut mem) = machine_with(&[
        Instruction::Loadi { rd: 1, imm: 5 },
        Instruction::Loadi { rd: 2, imm: 5 },
        Instruction::Add { rd: 3, ra: 1, rb: 2 },
        Instruction::Sub { rd: 4, ra: 1, rb: 2 },
    ]);

    assert_eq!(cpu.step(&mut mem), StepOutcome::Ran);
    assert_eq!(cpu.regs[1], 5);
    assert_eq!(cpu.step(&mut mem), StepOutcome::Ran);
    assert_eq!(cpu.step(&mut mem), StepOutcome::Ran);
    assert_eq!(cpu.regs[3], 10);
    assert_eq!(cpu.flags & FLAG_ZERO, 0);

    assert_eq!(cpu.step(&mut mem), StepOutcome::Ran);
    assert_eq!(cpu.regs[4], 0);
    assert_ne!(cpu.flags & FLAG_ZERO, 0);
}

#[test]
fn carry_flag_tracks_unsigned_overflow_and_borrow() {
    let (mut cpu, mut mem) = machine_with(&[
        Instruction::Loadi { rd: 1, imm: u32::MAX },
        Instruction::Loadi { rd: 2, imm: 1 },
        Instruction::Add { rd: 3, ra: 1, rb: 2 },
        Instruction::Cmp { ra: 2, rb: 1 },
    ]);

    for _ in 0..3 {
        cpu.step(&mut mem);
    }
    assert_eq!(cpu.regs[3], 0);
    assert_ne!(cpu.flags & FLAG_CARRY, 0);
    assert_ne!(cpu.flags & FLAG_ZERO, 0);

    cpu.step(&mut mem);
    // 1 - MAX borrows but is not zero.
    assert_ne!(cpu.flags & FLAG_CARRY, 0);
    assert_eq!(cpu.flags & FLAG_ZERO, 0);
}

#[test]
fn loads_stores_and_jumps() {
    let (mut cpu, mut mem) = machine_with(&[
        Instruction::Loadi { rd: 1, imm: 0x1234 },
        Instruction::Loadi { rd: 2, imm: 0x8000 },
        Instruction::Store { ra: 2, rb: 1, imm: 4 },
        Instruction::Load { rd: 3, ra: 2, imm: 4 },
        Instruction::Jmp { imm: 0x30 },
    ]);
    // Zeroed memory decodes as NOP, so land the jump on an explicit halt.
    mem.write_code(0x30, &encode(Instruction::Halt));

    for _ in 0..4 {
        assert_eq!(cpu.step(&mut mem), StepOutcome::Ran);
    }
    assert_eq!(cpu.regs[3], 0x1234);
    assert_eq!(mem.load_u32(0x8004), Some(0x1234));

    assert_eq!(cpu.step(&mut mem), StepOutcome::Ran); // jmp
    assert_eq!(cpu.pc, 0x30);
    assert_eq!(cpu.step(&mut mem), StepOutcome::Halted);
    assert!(cpu.is_halted());
}

#[test]
fn conditional_jump_follows_zero_flag() {
    let (mut cpu, mut mem) = machine_with(&[
        Instruction::Loadi { rd: 1, imm: 7 },
        Instruction::Cmp { ra: 1, rb: 1 },
        Instruction::Jz { imm: 0x28 },
    ]);
    mem.write_code(0x28, &encode(Instruction::Halt));

    for _ in 0..3 {
        cpu.step(&mut mem);
    }
    assert_eq!(cpu.pc, 0x28);
}

#[test]
fn breakpoint_trap_fires_on_the_new_pc() {
    let (mut cpu, mut mem) = machine_with(&[
        Instruction::Nop,
        Instruction::Nop,
        Instruction::Halt,
    ]);
    assert!(cpu.add_breakpoint(0x08));

    assert_eq!(cpu.step(&mut mem), StepOutcome::Break(0x08));
    // Continuing from the breakpoint address runs instead of re-trapping.
    assert_eq!(cpu.step(&mut mem), StepOutcome::Ran);

    cpu.remove_breakpoint(0x08);
    assert!(!cpu.is_breakpoint(0x08));
}

#[test]
fn undecodable_instruction_faults_the_machine() {
    let mut mem = Memory::new(64);
    mem.write_code(0, &[0xff; 8]);
    let mut cpu = Cpu::new();

    assert_eq!(cpu.step(&mut mem), StepOutcome::Fault(0));
    assert!(cpu.is_halted());
    assert_eq!(cpu.step(&mut mem), StepOutcome::Halted);
}

#[test]
fn register_snapshot_ids_cover_pc_and_flags() {
    let mut cpu = Cpu::new();
    cpu.write_register(5, 0xabcd);
    cpu.write_register(16, 0x40);
    cpu.write_register(17, FLAG_ZERO);

    assert_eq!(cpu.read_register(5), 0xabcd);
    assert_eq!(cpu.pc, 0x40);
    assert_eq!(cpu.read_register(17), FLAG_ZERO);
    // Unknown ids read as zero and ignore writes.
    cpu.write_register(99, 1);
    assert_eq!(cpu.read_register(99), 0);
}
