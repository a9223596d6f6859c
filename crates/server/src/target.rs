//! Adapter between the protocol engine's [`Target`] trait and the VM.

use rsp::{Target, TargetError};
use vm::{Cpu, Memory, StepOutcome};

pub struct VmTarget {
    pub cpu: Cpu,
    pub mem: Memory,
}

impl VmTarget {
    pub fn new(memory_size: usize) -> Self {
        Self {
            cpu: Cpu::new(),
            mem: Memory::new(memory_size),
        }
    }

    pub fn load_program(&mut self, addr: u32, image: &[u8]) {
        self.mem.write_code(addr, image);
        self.cpu.pc = addr;
    }

    /// One instruction cycle, exposed for the host run loop (the trait's
    /// `step` discards the outcome; the run loop needs it for stop replies).
    pub fn step_outcome(&mut self) -> StepOutcome {
        self.cpu.step(&mut self.mem)
    }
}

impl Target for VmTarget {
    fn get_register(&self, id: usize) -> u32 {
        self.cpu.read_register(id)
    }

    fn set_register(&mut self, id: usize, value: u32) {
        self.cpu.write_register(id, value);
    }

    fn read_memory(&self, addr: u32, len: usize) -> Result<Vec<u8>, TargetError> {
        self.mem
            .read(addr, len)
            .map(|s| s.to_vec())
            .ok_or(TargetError::OutOfRange(addr))
    }

    fn write_memory(&mut self, addr: u32, data: &[u8]) -> Result<(), TargetError> {
        self.mem
            .write(addr, data)
            .ok_or(TargetError::OutOfRange(addr))
    }

    fn step(&mut self) {
        // A halted machine stays steppable under the debugger.
        self.cpu.resume();
        self.cpu.step(&mut self.mem);
    }

    fn add_breakpoint(&mut self, addr: u32) -> Result<(), TargetError> {
        if self.cpu.add_breakpoint(addr) {
            Ok(())
        } else {
            Err(TargetError::NoSlot)
        }
    }

    fn remove_breakpoint(&mut self, addr: u32) -> Result<(), TargetError> {
        self.cpu.remove_breakpoint(addr);
        Ok(())
    }
}
