use std::convert::TryInto;

/// Flat little-endian byte memory. Every accessor is bounds-checked and
/// reports out-of-range access through its return value; the machine faults,
/// it does not panic.
pub struct Memory {
    mem: Vec<u8>,
}

impl Memory {
    pub fn new(size: usize) -> Self {
        Self {
            mem: vec![0u8; size],
        }
    }

    pub fn size(&self) -> usize {
        self.mem.len()
    }

    pub fn load_u8(&self, addr: u32) -> Option<u8> {
        self.mem.get(addr as usize).copied()
    }

    pub fn load_u32(&self, addr: u32) -> Option<u32> {
        let addr = addr as usize;
        let bytes = self.mem.get(addr..addr.checked_add(4)?)?;
        Some(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn store_u8(&mut self, addr: u32, val: u8) -> Option<()> {
        *self.mem.get_mut(addr as usize)? = val;
        Some(())
    }

    pub fn store_u32(&mut self, addr: u32, val: u32) -> Option<()> {
        let addr = addr as usize;
        let slot = self.mem.get_mut(addr..addr.checked_add(4)?)?;
        slot.copy_from_slice(&val.to_le_bytes());
        Some(())
    }

    /// Reads `len` bytes starting at `addr`; `None` when any byte of the
    /// window is out of range.
    pub fn read(&self, addr: u32, len: usize) -> Option<&[u8]> {
        let addr = addr as usize;
        self.mem.get(addr..addr.checked_add(len)?)
    }

    /// Writes the whole slice at `addr`; `None` (and no partial write) when
    /// the window is out of range.
    pub fn write(&mut self, addr: u32, data: &[u8]) -> Option<()> {
        let addr = addr as usize;
        let slot = self.mem.get_mut(addr..addr.checked_add(data.len())?)?;
        slot.copy_from_slice(data);
        Some(())
    }

    /// Loads a program image at `addr`. Panics on overflow; this runs at
    /// host startup, before any debugger is attached.
    pub fn write_code(&mut self, addr: u32, code: &[u8]) {
        let addr = addr as usize;
        assert!(
            addr + code.len() <= self.mem.len(),
            "program image does not fit at {:#010x}",
            addr
        );
        self.mem[addr..addr + code.len()].copy_from_slice(code);
    }
}
