//! Register file layout. The snapshot order is shared with the debug
//! protocol: ids 0..=15 are the general-purpose registers, 16 the program
//! counter, 17 the flags word.

/// Number of general-purpose registers.
pub const GPR_COUNT: usize = 16;

/// Snapshot id of the program counter.
pub const REG_PC: usize = 16;
/// Snapshot id of the flags word.
pub const REG_FLAGS: usize = 17;

/// Zero flag: set when the last arithmetic result was zero.
pub const FLAG_ZERO: u32 = 1 << 0;
/// Carry flag: set on unsigned overflow (add) or borrow (sub/cmp).
pub const FLAG_CARRY: u32 = 1 << 1;
