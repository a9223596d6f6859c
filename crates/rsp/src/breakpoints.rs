//! Bounded breakpoint and watchpoint bookkeeping.
//!
//! The tables mirror what the debugger believes is installed. For
//! breakpoints the Target owns the real install (and any deduplication); the
//! table exists so the session can report and re-install state. Watchpoints
//! are authoritative here, with optional Target hooks for hardware support.

/// Capacity mirrors the maximum the reference target supports.
pub const MAX_BREAKPOINTS: usize = 32;
pub const MAX_WATCHPOINTS: usize = 16;

/// Watchpoint flavor, matching the `Z2`/`Z3`/`Z4` packet types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    Write,
    Read,
    Access,
}

impl WatchKind {
    /// Maps a `Z`/`z` packet type number to a watchpoint kind.
    pub fn from_z_type(z_type: u32) -> Option<Self> {
        match z_type {
            2 => Some(WatchKind::Write),
            3 => Some(WatchKind::Read),
            4 => Some(WatchKind::Access),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct BreakpointTable {
    addrs: Vec<u32>,
}

impl BreakpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a breakpoint address. Duplicates are stored as-is; the Target
    /// owns deduplication. Fails when the table is full.
    pub fn add(&mut self, addr: u32) -> bool {
        if self.addrs.len() >= MAX_BREAKPOINTS {
            return false;
        }
        self.addrs.push(addr);
        true
    }

    /// Removes one entry for `addr`. Removing an absent address is fine.
    pub fn remove(&mut self, addr: u32) {
        if let Some(pos) = self.addrs.iter().position(|&a| a == addr) {
            self.addrs.swap_remove(pos);
        }
    }

    pub fn contains(&self, addr: u32) -> bool {
        self.addrs.iter().any(|&a| a == addr)
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    pub fn clear(&mut self) {
        self.addrs.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watchpoint {
    pub addr: u32,
    pub len: u32,
    pub kind: WatchKind,
}

#[derive(Debug, Default)]
pub struct WatchpointTable {
    entries: Vec<Watchpoint>,
}

impl WatchpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, addr: u32, len: u32, kind: WatchKind) -> bool {
        if self.entries.len() >= MAX_WATCHPOINTS {
            return false;
        }
        self.entries.push(Watchpoint { addr, len, kind });
        true
    }

    /// Removes the first entry matching all three fields; idempotent.
    pub fn remove(&mut self, addr: u32, len: u32, kind: WatchKind) {
        let target = Watchpoint { addr, len, kind };
        if let Some(pos) = self.entries.iter().position(|w| *w == target) {
            self.entries.swap_remove(pos);
        }
    }

    /// Finds a watchpoint covering `addr` that should fire for the given
    /// access kind (`Access` entries fire for both reads and writes).
    pub fn matching(&self, addr: u32, access: WatchKind) -> Option<&Watchpoint> {
        self.entries.iter().find(|w| {
            let covers = addr >= w.addr && addr < w.addr.saturating_add(w.len.max(1));
            let fires = w.kind == WatchKind::Access || w.kind == access;
            covers && fires
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_add_remove_lookup() {
        let mut table = BreakpointTable::new();
        assert!(table.add(0x1000));
        assert!(table.add(0x2000));
        assert!(table.contains(0x1000));
        table.remove(0x1000);
        assert!(!table.contains(0x1000));
        // Idempotent removal.
        table.remove(0x1000);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn breakpoint_table_is_bounded() {
        let mut table = BreakpointTable::new();
        for i in 0..MAX_BREAKPOINTS as u32 {
            assert!(table.add(i * 4));
        }
        assert!(!table.add(0xffff_0000));
        assert_eq!(table.len(), MAX_BREAKPOINTS);
    }

    #[test]
    fn watchpoint_matching_respects_range_and_kind() {
        let mut table = WatchpointTable::new();
        table.add(0x100, 4, WatchKind::Write);
        table.add(0x200, 8, WatchKind::Access);

        assert!(table.matching(0x102, WatchKind::Write).is_some());
        assert!(table.matching(0x102, WatchKind::Read).is_none());
        assert!(table.matching(0x104, WatchKind::Write).is_none());
        // Access entries fire for either direction.
        assert!(table.matching(0x207, WatchKind::Read).is_some());
        assert!(table.matching(0x207, WatchKind::Write).is_some());

        table.remove(0x100, 4, WatchKind::Write);
        assert!(table.matching(0x102, WatchKind::Write).is_none());
    }
}
