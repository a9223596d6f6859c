//! The seam between the protocol engine and the machine being debugged.

use crate::breakpoints::WatchKind;
use crate::error::TargetError;

/// Number of general-purpose registers in the protocol's register snapshot.
pub const GPR_COUNT: usize = 16;
/// Register id of the program counter.
pub const REG_PC: usize = 16;
/// Register id of the flags word.
pub const REG_FLAGS: usize = 17;
/// Total registers in a `g`/`G` packet: sixteen GPRs, pc, flags.
pub const REG_COUNT: usize = 18;

/// The machine being debugged. The engine calls these primitives and maps
/// every failure to `E01` on the wire; the error variants are for the host's
/// logs only.
///
/// Register ids follow the snapshot layout: 0..=15 are the GPRs, 16 the
/// program counter, 17 the flags word. Ids outside that range read as zero
/// and ignore writes; the engine never passes them.
pub trait Target {
    fn get_register(&self, id: usize) -> u32;

    fn set_register(&mut self, id: usize, value: u32);

    fn read_memory(&self, addr: u32, len: usize) -> Result<Vec<u8>, TargetError>;

    fn write_memory(&mut self, addr: u32, data: &[u8]) -> Result<(), TargetError>;

    /// Executes exactly one instruction.
    fn step(&mut self);

    fn add_breakpoint(&mut self, addr: u32) -> Result<(), TargetError>;

    /// Removing an address that is not installed is not an error.
    fn remove_breakpoint(&mut self, addr: u32) -> Result<(), TargetError>;

    /// Optional hardware watchpoint hook. The session's watchpoint table is
    /// authoritative either way; targets without hardware support keep the
    /// default no-op.
    fn set_watchpoint(&mut self, _addr: u32, _len: u32, _kind: WatchKind) -> Result<(), TargetError> {
        Ok(())
    }

    fn clear_watchpoint(
        &mut self,
        _addr: u32,
        _len: u32,
        _kind: WatchKind,
    ) -> Result<(), TargetError> {
        Ok(())
    }
}
