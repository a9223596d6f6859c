//! A small bytecode virtual machine, built to be debugged.
//!
//! The register file is shaped exactly like the remote protocol's snapshot:
//! sixteen 32-bit general-purpose registers, a program counter, and a flags
//! word. Instructions are fixed-width (8 bytes); memory is a flat
//! little-endian byte array. Out-of-range access faults the machine instead
//! of panicking, so a debug server can report it and keep the session alive.

pub mod cpu;
pub mod isa;
pub mod memory;
pub mod registers;

pub use cpu::{Cpu, StepOutcome, MAX_BREAKPOINTS};
pub use isa::{decode, Instruction, Opcode, INSTR_LEN};
pub use memory::Memory;
pub use registers::{FLAG_CARRY, FLAG_ZERO, GPR_COUNT, REG_FLAGS, REG_PC};
