//! Test doubles: an in-memory transport and a scripted target.

use std::collections::VecDeque;

use rsp::{Target, TargetError, Transport, TransportError, WatchKind, REG_COUNT};

/// Loopback transport: the test queues inbound bytes and inspects what the
/// session sent back.
#[derive(Default)]
pub struct LoopTransport {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    pub closed: bool,
    pub disconnected: bool,
}

impl LoopTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// Everything the session has sent so far, as a lossy string.
    pub fn sent(&self) -> String {
        String::from_utf8_lossy(&self.outbound).into_owned()
    }

    pub fn clear_sent(&mut self) {
        self.outbound.clear();
    }

    /// Queued bytes the session has not read yet.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }
}

impl Transport for LoopTransport {
    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.outbound.extend_from_slice(data);
        Ok(data.len())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.disconnected && self.inbound.is_empty() {
            return Err(TransportError::Disconnected);
        }
        let mut n = 0;
        while n < buf.len() {
            match self.inbound.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// A target backed by plain arrays, recording every call the engine makes.
pub struct ScriptedTarget {
    pub regs: [u32; REG_COUNT],
    pub memory: Vec<u8>,
    pub breakpoints: Vec<u32>,
    pub watchpoints: Vec<(u32, u32, WatchKind)>,
    pub steps: usize,
    /// When set, every memory operation fails (simulated bus fault).
    pub fail_memory: bool,
}

impl ScriptedTarget {
    pub fn new() -> Self {
        Self {
            regs: [0; REG_COUNT],
            memory: vec![0; 0x10000],
            breakpoints: Vec::new(),
            watchpoints: Vec::new(),
            steps: 0,
            fail_memory: false,
        }
    }
}

impl Target for ScriptedTarget {
    fn get_register(&self, id: usize) -> u32 {
        self.regs.get(id).copied().unwrap_or(0)
    }

    fn set_register(&mut self, id: usize, value: u32) {
        if let Some(slot) = self.regs.get_mut(id) {
            *slot = value;
        }
    }

    fn read_memory(&self, addr: u32, len: usize) -> Result<Vec<u8>, TargetError> {
        if self.fail_memory {
            return Err(TargetError::OutOfRange(addr));
        }
        let start = addr as usize;
        let end = start.checked_add(len).ok_or(TargetError::OutOfRange(addr))?;
        self.memory
            .get(start..end)
            .map(|s| s.to_vec())
            .ok_or(TargetError::OutOfRange(addr))
    }

    fn write_memory(&mut self, addr: u32, data: &[u8]) -> Result<(), TargetError> {
        if self.fail_memory {
            return Err(TargetError::OutOfRange(addr));
        }
        let start = addr as usize;
        let end = start
            .checked_add(data.len())
            .ok_or(TargetError::OutOfRange(addr))?;
        self.memory
            .get_mut(start..end)
            .ok_or(TargetError::OutOfRange(addr))?
            .copy_from_slice(data);
        Ok(())
    }

    fn step(&mut self) {
        self.steps += 1;
    }

    fn add_breakpoint(&mut self, addr: u32) -> Result<(), TargetError> {
        if self.breakpoints.len() >= 32 {
            return Err(TargetError::NoSlot);
        }
        self.breakpoints.push(addr);
        Ok(())
    }

    fn remove_breakpoint(&mut self, addr: u32) -> Result<(), TargetError> {
        self.breakpoints.retain(|&a| a != addr);
        Ok(())
    }

    fn set_watchpoint(&mut self, addr: u32, len: u32, kind: WatchKind) -> Result<(), TargetError> {
        self.watchpoints.push((addr, len, kind));
        Ok(())
    }

    fn clear_watchpoint(
        &mut self,
        addr: u32,
        len: u32,
        kind: WatchKind,
    ) -> Result<(), TargetError> {
        self.watchpoints.retain(|&w| w != (addr, len, kind));
        Ok(())
    }
}
