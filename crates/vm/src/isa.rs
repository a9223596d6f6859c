//! Instruction set and decoder.
//!
//! Every instruction is 8 bytes: `[opcode, a, b, c, imm as u32 LE]`. The
//! register fields that an opcode does not use are ignored by the decoder.

/// Instruction width in bytes.
pub const INSTR_LEN: u32 = 8;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Nop = 0x00,
    Halt = 0x01,
    Loadi = 0x02,
    Mov = 0x03,
    Add = 0x04,
    Sub = 0x05,
    Load = 0x06,
    Store = 0x07,
    Jmp = 0x08,
    Jz = 0x09,
    Cmp = 0x0a,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        use Opcode::*;
        Some(match value {
            0x00 => Nop,
            0x01 => Halt,
            0x02 => Loadi,
            0x03 => Mov,
            0x04 => Add,
            0x05 => Sub,
            0x06 => Load,
            0x07 => Store,
            0x08 => Jmp,
            0x09 => Jz,
            0x0a => Cmp,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    Halt,
    /// rd = imm
    Loadi { rd: u8, imm: u32 },
    /// rd = ra
    Mov { rd: u8, ra: u8 },
    /// rd = ra + rb, sets ZF/CF
    Add { rd: u8, ra: u8, rb: u8 },
    /// rd = ra - rb, sets ZF/CF
    Sub { rd: u8, ra: u8, rb: u8 },
    /// rd = mem[ra + imm] (u32, little endian)
    Load { rd: u8, ra: u8, imm: u32 },
    /// mem[ra + imm] = rb
    Store { ra: u8, rb: u8, imm: u32 },
    /// pc = imm
    Jmp { imm: u32 },
    /// pc = imm when ZF is set
    Jz { imm: u32 },
    /// ra - rb, flags only
    Cmp { ra: u8, rb: u8 },
}

/// Decodes one 8-byte instruction. `None` for a short slice, an unknown
/// opcode, or a register field out of range.
pub fn decode(raw: &[u8]) -> Option<Instruction> {
    if raw.len() < INSTR_LEN as usize {
        return None;
    }
    let op = Opcode::from_u8(raw[0])?;
    let (a, b, c) = (raw[1], raw[2], raw[3]);
    let imm = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);

    let reg = |r: u8| if (r as usize) < crate::registers::GPR_COUNT { Some(r) } else { None };

    Some(match op {
        Opcode::Nop => Instruction::Nop,
        Opcode::Halt => Instruction::Halt,
        Opcode::Loadi => Instruction::Loadi { rd: reg(a)?, imm },
        Opcode::Mov => Instruction::Mov { rd: reg(a)?, ra: reg(b)? },
        Opcode::Add => Instruction::Add { rd: reg(a)?, ra: reg(b)?, rb: reg(c)? },
        Opcode::Sub => Instruction::Sub { rd: reg(a)?, ra: reg(b)?, rb: reg(c)? },
        Opcode::Load => Instruction::Load { rd: reg(a)?, ra: reg(b)?, imm },
        Opcode::Store => Instruction::Store { ra: reg(a)?, rb: reg(b)?, imm },
        Opcode::Jmp => Instruction::Jmp { imm },
        Opcode::Jz => Instruction::Jz { imm },
        Opcode::Cmp => Instruction::Cmp { ra: reg(a)?, rb: reg(b)? },
    })
}

/// Assembles one instruction back into its 8-byte encoding. Used by tests
/// and host tooling to build program images.
pub fn encode(instr: Instruction) -> [u8; 8] {
    let (op, a, b, c, imm) = match instr {
        Instruction::Nop => (Opcode::Nop, 0, 0, 0, 0),
        Instruction::Halt => (Opcode::Halt, 0, 0, 0, 0),
        Instruction::Loadi { rd, imm } => (Opcode::Loadi, rd, 0, 0, imm),
        Instruction::Mov { rd, ra } => (Opcode::Mov, rd, ra, 0, 0),
        Instruction::Add { rd, ra, rb } => (Opcode::Add, rd, ra, rb, 0),
        Instruction::Sub { rd, ra, rb } => (Opcode::Sub, rd, ra, rb, 0),
        Instruction::Load { rd, ra, imm } => (Opcode::Load, rd, ra, 0, imm),
        Instruction::Store { ra, rb, imm } => (Opcode::Store, ra, rb, 0, imm),
        Instruction::Jmp { imm } => (Opcode::Jmp, 0, 0, 0, imm),
        Instruction::Jz { imm } => (Opcode::Jz, 0, 0, 0, imm),
        Instruction::Cmp { ra, rb } => (Opcode::Cmp, ra, rb, 0, 0),
    };
    let le = imm.to_le_bytes();
    [op as u8, a, b, c, le[0], le[1], le[2], le[3]]
}
