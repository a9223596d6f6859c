use log::trace;

use crate::isa::{decode, Instruction, INSTR_LEN};
use crate::memory::Memory;
use crate::registers::{FLAG_CARRY, FLAG_ZERO, GPR_COUNT, REG_FLAGS, REG_PC};

/// Most breakpoints the machine will carry at once.
pub const MAX_BREAKPOINTS: usize = 32;

/// What one instruction cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Executed normally; more instructions follow.
    Ran,
    /// HALT executed (or the machine was already halted).
    Halted,
    /// The new program counter sits on an installed breakpoint.
    Break(u32),
    /// Fetch or data access left the memory, or the instruction did not
    /// decode. The faulting address is recorded and the machine halts.
    Fault(u32),
}

/// The processor: sixteen general-purpose registers, a program counter, and
/// a flags word, stepped one fetch/decode/execute cycle at a time.
pub struct Cpu {
    pub regs: [u32; GPR_COUNT],
    pub pc: u32,
    pub flags: u32,
    halted: bool,
    breakpoints: Vec<u32>,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            regs: [0; GPR_COUNT],
            pc: 0,
            flags: 0,
            halted: false,
            breakpoints: Vec::new(),
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Clears the halt latch so a debugger can resume a halted machine.
    pub fn resume(&mut self) {
        self.halted = false;
    }

    pub fn add_breakpoint(&mut self, addr: u32) -> bool {
        if self.breakpoints.len() >= MAX_BREAKPOINTS {
            return false;
        }
        self.breakpoints.push(addr);
        true
    }

    /// Removing an address that is not installed is fine.
    pub fn remove_breakpoint(&mut self, addr: u32) {
        if let Some(pos) = self.breakpoints.iter().position(|&a| a == addr) {
            self.breakpoints.swap_remove(pos);
        }
    }

    pub fn is_breakpoint(&self, addr: u32) -> bool {
        self.breakpoints.iter().any(|&a| a == addr)
    }

    /// Register access in protocol snapshot order: 0..=15 the GPRs, 16 the
    /// program counter, 17 the flags word. Out-of-range ids read as zero.
    pub fn read_register(&self, id: usize) -> u32 {
        match id {
            0..=15 => self.regs[id],
            REG_PC => self.pc,
            REG_FLAGS => self.flags,
            _ => 0,
        }
    }

    pub fn write_register(&mut self, id: usize, value: u32) {
        match id {
            0..=15 => self.regs[id] = value,
            REG_PC => self.pc = value,
            REG_FLAGS => self.flags = value,
            _ => {}
        }
    }

    /// One fetch/decode/execute cycle. A breakpoint is reported when the
    /// *new* pc lands on one, so continuing from a breakpoint address makes
    /// progress instead of re-trapping in place.
    pub fn step(&mut self, mem: &mut Memory) -> StepOutcome {
        if self.halted {
            return StepOutcome::Halted;
        }

        let fetch_pc = self.pc;
        let raw = match mem.read(fetch_pc, INSTR_LEN as usize) {
            Some(raw) => raw,
            None => {
                self.halted = true;
                return StepOutcome::Fault(fetch_pc);
            }
        };
        let instr = match decode(raw) {
            Some(instr) => instr,
            None => {
                self.halted = true;
                return StepOutcome::Fault(fetch_pc);
            }
        };
        trace!("{:#010x}: {:?}", fetch_pc, instr);

        let mut next_pc = fetch_pc.wrapping_add(INSTR_LEN);
        match instr {
            Instruction::Nop => {}
            Instruction::Halt => {
                self.halted = true;
                self.pc = next_pc;
                return StepOutcome::Halted;
            }
            Instruction::Loadi { rd, imm } => self.regs[rd as usize] = imm,
            Instruction::Mov { rd, ra } => self.regs[rd as usize] = self.regs[ra as usize],
            Instruction::Add { rd, ra, rb } => {
                let (result, carry) =
                    self.regs[ra as usize].overflowing_add(self.regs[rb as usize]);
                self.set_flags(result, carry);
                self.regs[rd as usize] = result;
            }
            Instruction::Sub { rd, ra, rb } => {
                let (result, borrow) =
                    self.regs[ra as usize].overflowing_sub(self.regs[rb as usize]);
                self.set_flags(result, borrow);
                self.regs[rd as usize] = result;
            }
            Instruction::Cmp { ra, rb } => {
                let (result, borrow) =
                    self.regs[ra as usize].overflowing_sub(self.regs[rb as usize]);
                self.set_flags(result, borrow);
            }
            Instruction::Load { rd, ra, imm } => {
                let addr = self.regs[ra as usize].wrapping_add(imm);
                match mem.load_u32(addr) {
                    Some(value) => self.regs[rd as usize] = value,
                    None => {
                        self.halted = true;
                        return StepOutcome::Fault(addr);
                    }
                }
            }
            Instruction::Store { ra, rb, imm } => {
                let addr = self.regs[ra as usize].wrapping_add(imm);
                if mem.store_u32(addr, self.regs[rb as usize]).is_none() {
                    self.halted = true;
                    return StepOutcome::Fault(addr);
                }
            }
            Instruction::Jmp { imm } => next_pc = imm,
            Instruction::Jz { imm } => {
                if self.flags & FLAG_ZERO != 0 {
                    next_pc = imm;
                }
            }
        }

        self.pc = next_pc;
        if self.is_breakpoint(self.pc) {
            return StepOutcome::Break(self.pc);
        }
        StepOutcome::Ran
    }

    fn set_flags(&mut self, result: u32, carry: bool) {
        self.flags = 0;
        if result == 0 {
            self.flags |= FLAG_ZERO;
        }
        if carry {
            self.flags |= FLAG_CARRY;
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
