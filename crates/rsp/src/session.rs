//! Per-connection protocol state: mode flags, stop signal, the framer, and
//! the breakpoint/watchpoint tables, plus the dispatch loop that ties them
//! to a [`Target`] and a [`Transport`].
//!
//! One `Session` serves one debugger connection. The Target and Transport
//! are never stored; they are passed by reference into every operation, so
//! several sessions can coexist without shared state.

use log::{debug, info, trace, warn};

use crate::breakpoints::{BreakpointTable, WatchKind, WatchpointTable};
use crate::codec::{parse_hex, write_hex};
use crate::command::Command;
use crate::error::TransportError;
use crate::packet::{self, FrameEvent, Framer, MAX_PACKET_LEN};
use crate::target::{Target, REG_COUNT};
use crate::transport::Transport;

/// Stop signal reported after an interrupt byte.
pub const SIGINT: u8 = 2;
/// Stop signal reported for breakpoints and single steps.
pub const SIGTRAP: u8 = 5;
/// Stop signal reported for memory faults.
pub const SIGSEGV: u8 = 11;

/// Upper bound on one `m` reply, in bytes of target memory.
pub const MAX_MEM_READ: usize = 512;
/// Upper bound on one `M` write, in bytes of target memory.
pub const MAX_MEM_WRITE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No debugger attached; waiting for the host to accept a connection.
    Listening,
    /// A debugger is attached but has not resumed or halted the target yet.
    Connected,
    /// The target is halted and the debugger is in control.
    Stopped,
    /// The target is executing; the host drives it between polls.
    Running,
    /// The debugger sent `D`. Terminal for this connection.
    Detached,
}

pub struct Session {
    status: Status,
    no_ack_mode: bool,
    extended_mode: bool,
    multiprocess: bool,
    stop_signal: u8,
    framer: Framer,
    breakpoints: BreakpointTable,
    watchpoints: WatchpointTable,
}

impl Session {
    pub fn new() -> Self {
        Self {
            status: Status::Listening,
            no_ack_mode: false,
            extended_mode: false,
            multiprocess: false,
            stop_signal: SIGTRAP,
            framer: Framer::new(),
            breakpoints: BreakpointTable::new(),
            watchpoints: WatchpointTable::new(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.status == Status::Stopped
    }

    pub fn no_ack_mode(&self) -> bool {
        self.no_ack_mode
    }

    pub fn extended_mode(&self) -> bool {
        self.extended_mode
    }

    pub fn multiprocess(&self) -> bool {
        self.multiprocess
    }

    pub fn stop_signal(&self) -> u8 {
        self.stop_signal
    }

    pub fn breakpoints(&self) -> &BreakpointTable {
        &self.breakpoints
    }

    pub fn watchpoints(&self) -> &WatchpointTable {
        &self.watchpoints
    }

    /// The host accepted a connection and hands its byte stream to us.
    pub fn connect(&mut self) {
        info!("debugger attached");
        self.status = Status::Connected;
        self.stop_signal = SIGTRAP;
    }

    /// Back to `Listening`: in-flight framing and per-connection state are
    /// discarded. Called on transport close; also usable by the host after
    /// a detach to reuse the instance.
    pub fn reset(&mut self) {
        self.status = Status::Listening;
        self.no_ack_mode = false;
        self.extended_mode = false;
        self.multiprocess = false;
        self.stop_signal = SIGTRAP;
        self.framer.reset();
        self.breakpoints.clear();
        self.watchpoints.clear();
    }

    /// One cooperative tick: a single non-blocking receive, then synchronous
    /// dispatch of every complete packet it contained, in byte order. A
    /// receive with no bytes is a no-op. Disconnection resets the session to
    /// `Listening` and is not an error.
    pub fn poll<T: Target, C: Transport>(
        &mut self,
        target: &mut T,
        transport: &mut C,
    ) -> Result<(), TransportError> {
        let mut buf = [0u8; 512];
        let n = match transport.recv(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(TransportError::Disconnected) => {
                info!("debugger disconnected");
                self.reset();
                return Ok(());
            }
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };

        match self.process_bytes(&buf[..n], target, transport) {
            Err(TransportError::Disconnected) => {
                info!("debugger disconnected");
                self.reset();
                Ok(())
            }
            other => other,
        }
    }

    /// Feeds raw wire bytes through the framer and dispatches complete
    /// packets. Exposed for hosts that carry the transport themselves.
    pub fn process_bytes<T: Target, C: Transport>(
        &mut self,
        bytes: &[u8],
        target: &mut T,
        transport: &mut C,
    ) -> Result<(), TransportError> {
        for &byte in bytes {
            match self.framer.push(byte) {
                Some(FrameEvent::Interrupt) => {
                    debug!("interrupt from debugger");
                    self.notify_stop(SIGINT, transport)?;
                }
                Some(FrameEvent::Packet(body)) => {
                    if !self.no_ack_mode {
                        transport.send(b"+")?;
                    }
                    self.dispatch(&body, target, transport)?;
                }
                Some(FrameEvent::BadChecksum) => {
                    transport.send(b"-")?;
                }
                Some(FrameEvent::Ack) | Some(FrameEvent::Nack) | None => {}
            }
        }
        Ok(())
    }

    /// The Target trapped on an installed breakpoint. May be raised between
    /// polls, not only in response to a command.
    pub fn notify_breakpoint<C: Transport>(
        &mut self,
        addr: u32,
        transport: &mut C,
    ) -> Result<(), TransportError> {
        debug!("breakpoint hit at {:#010x}", addr);
        self.notify_stop(SIGTRAP, transport)
    }

    /// Forces the session into `Stopped` with the given signal and sends a
    /// stop-reply if a debugger is attached.
    pub fn notify_stop<C: Transport>(
        &mut self,
        signal: u8,
        transport: &mut C,
    ) -> Result<(), TransportError> {
        self.stop_signal = signal;
        let attached = matches!(
            self.status,
            Status::Connected | Status::Stopped | Status::Running
        );
        self.status = Status::Stopped;
        if attached {
            let mut reply = String::with_capacity(3);
            reply.push('S');
            write_hex(&mut reply, signal as u32, 1);
            self.send_reply(&reply, transport)?;
        }
        Ok(())
    }

    fn dispatch<T: Target, C: Transport>(
        &mut self,
        body: &[u8],
        target: &mut T,
        transport: &mut C,
    ) -> Result<(), TransportError> {
        let command = Command::parse(body);
        trace!("dispatch {:?}", command);

        let reply = match command {
            Command::HaltReason => Some(self.stop_reply()),
            Command::ReadRegisters => Some(read_registers(target)),
            Command::WriteRegisters(hex) => Some(write_registers(target, hex)),
            Command::ReadMemory(args) => Some(read_memory(target, args)),
            Command::WriteMemory(args) => Some(write_memory(target, args)),
            Command::Continue => {
                self.status = Status::Running;
                // The reply is the stop packet sent when the target halts.
                None
            }
            Command::Step => {
                target.step();
                self.status = Status::Stopped;
                self.stop_signal = SIGTRAP;
                Some(self.stop_reply())
            }
            Command::Insert(args) => Some(self.insert_point(target, args)),
            Command::Remove(args) => Some(self.remove_point(target, args)),
            Command::Query(q) => Some(self.query(q)),
            Command::Set(q) => Some(self.set(q)),
            Command::ExtendedMode => {
                self.extended_mode = true;
                Some("OK".to_string())
            }
            Command::SetThread => Some("OK".to_string()),
            Command::Detach => {
                info!("debugger detached");
                self.status = Status::Detached;
                Some("OK".to_string())
            }
            Command::Kill => {
                // No reply is defined for `k`; target teardown is the
                // host's responsibility.
                info!("kill requested");
                None
            }
            Command::Unsupported => Some(String::new()),
        };

        if let Some(reply) = reply {
            self.send_reply(&reply, transport)?;
        }
        Ok(())
    }

    fn stop_reply(&self) -> String {
        let mut reply = String::with_capacity(3);
        reply.push('S');
        write_hex(&mut reply, self.stop_signal as u32, 1);
        reply
    }

    fn send_reply<C: Transport>(
        &mut self,
        body: &str,
        transport: &mut C,
    ) -> Result<(), TransportError> {
        trace!("packet out: {}", body);
        let framed = packet::encode(body.as_bytes());
        transport.send(&framed)?;
        Ok(())
    }

    /// `Z type,addr,kind`. Types 0 and 1 go to the Target's breakpoint
    /// primitive; 2..=4 are watchpoints owned by this session. Unknown types
    /// get the protocol's empty "unsupported" reply.
    fn insert_point<T: Target>(&mut self, target: &mut T, args: &[u8]) -> String {
        let Some((z_type, addr, kind)) = parse_point_args(args) else {
            return err_reply();
        };
        match z_type {
            0 | 1 => match target.add_breakpoint(addr) {
                Ok(()) => {
                    if !self.breakpoints.add(addr) {
                        warn!("breakpoint table full, {:#010x} not mirrored", addr);
                    }
                    "OK".to_string()
                }
                Err(e) => {
                    debug!("add_breakpoint({:#010x}) failed: {}", addr, e);
                    err_reply()
                }
            },
            2..=4 => {
                // kind carries the watched length for watchpoint types.
                let watch = WatchKind::from_z_type(z_type).unwrap();
                if !self.watchpoints.add(addr, kind, watch) {
                    return err_reply();
                }
                match target.set_watchpoint(addr, kind, watch) {
                    Ok(()) => "OK".to_string(),
                    Err(e) => {
                        debug!("set_watchpoint({:#010x}) failed: {}", addr, e);
                        self.watchpoints.remove(addr, kind, watch);
                        err_reply()
                    }
                }
            }
            _ => String::new(),
        }
    }

    /// `z type,addr,kind`, the inverse of [`Self::insert_point`]. Removal is
    /// idempotent: clearing something that is not installed still answers
    /// `OK`.
    fn remove_point<T: Target>(&mut self, target: &mut T, args: &[u8]) -> String {
        let Some((z_type, addr, kind)) = parse_point_args(args) else {
            return err_reply();
        };
        match z_type {
            0 | 1 => match target.remove_breakpoint(addr) {
                Ok(()) => {
                    self.breakpoints.remove(addr);
                    "OK".to_string()
                }
                Err(e) => {
                    debug!("remove_breakpoint({:#010x}) failed: {}", addr, e);
                    err_reply()
                }
            },
            2..=4 => {
                let watch = WatchKind::from_z_type(z_type).unwrap();
                self.watchpoints.remove(addr, kind, watch);
                match target.clear_watchpoint(addr, kind, watch) {
                    Ok(()) => "OK".to_string(),
                    Err(e) => {
                        debug!("clear_watchpoint({:#010x}) failed: {}", addr, e);
                        err_reply()
                    }
                }
            }
            _ => String::new(),
        }
    }

    fn query(&mut self, q: &[u8]) -> String {
        if q.starts_with(b"Supported") {
            // Record the client's multiprocess offer, but keep replies in
            // single-thread syntax; thread-aware debugging is out of scope.
            if contains(q, b"multiprocess+") {
                self.multiprocess = true;
            }
            return format!("PacketSize={:x};QStartNoAckMode+;swbreak+", MAX_PACKET_LEN);
        }
        if q.starts_with(b"Attached") {
            return "1".to_string();
        }
        if q == b"C" {
            return "QC1".to_string();
        }
        if q.starts_with(b"fThreadInfo") {
            return "m1".to_string();
        }
        if q.starts_with(b"sThreadInfo") {
            return "l".to_string();
        }
        if q.starts_with(b"Offsets") {
            return "Text=0;Data=0;Bss=0".to_string();
        }
        String::new()
    }

    fn set(&mut self, q: &[u8]) -> String {
        if q == b"StartNoAckMode" {
            // The ack for this very packet has already been sent; only
            // subsequent packets go unacknowledged.
            self.no_ack_mode = true;
            return "OK".to_string();
        }
        String::new()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn err_reply() -> String {
    "E01".to_string()
}

/// `g`: every register as exactly 8 hex characters, most-significant nibble
/// first, in snapshot order.
fn read_registers<T: Target>(target: &T) -> String {
    let mut out = String::with_capacity(REG_COUNT * 8);
    for id in 0..REG_COUNT {
        write_hex(&mut out, target.get_register(id), 4);
    }
    out
}

/// `G<hex>`: the inverse of `g`. Short or non-hex input is a grammar error.
fn write_registers<T: Target>(target: &mut T, hex: &[u8]) -> String {
    if hex.len() < REG_COUNT * 8 {
        return err_reply();
    }
    let mut values = [0u32; REG_COUNT];
    for (id, value) in values.iter_mut().enumerate() {
        let chunk = &hex[id * 8..id * 8 + 8];
        let (parsed, consumed) = parse_hex(chunk);
        if consumed != 8 {
            return err_reply();
        }
        *value = parsed;
    }
    for (id, &value) in values.iter().enumerate() {
        target.set_register(id, value);
    }
    "OK".to_string()
}

/// `m addr,len`: read a memory window, clamped to [`MAX_MEM_READ`].
fn read_memory<T: Target>(target: &T, args: &[u8]) -> String {
    let (addr, n) = parse_hex(args);
    if n == 0 || args.get(n) != Some(&b',') {
        return err_reply();
    }
    let (len, m) = parse_hex(&args[n + 1..]);
    if m == 0 {
        return err_reply();
    }
    let len = (len as usize).min(MAX_MEM_READ);
    match target.read_memory(addr, len) {
        Ok(bytes) => hex::encode(bytes),
        Err(e) => {
            debug!("read_memory({:#010x}, {}) failed: {}", addr, len, e);
            err_reply()
        }
    }
}

/// `M addr,len:data`: write a memory window, clamped to [`MAX_MEM_WRITE`].
fn write_memory<T: Target>(target: &mut T, args: &[u8]) -> String {
    let (addr, n) = parse_hex(args);
    if n == 0 || args.get(n) != Some(&b',') {
        return err_reply();
    }
    let rest = &args[n + 1..];
    let (len, m) = parse_hex(rest);
    if m == 0 || rest.get(m) != Some(&b':') {
        return err_reply();
    }
    let data = &rest[m + 1..];
    let len = (len as usize).min(MAX_MEM_WRITE);
    if data.len() < len * 2 {
        return err_reply();
    }
    let bytes = match hex::decode(&data[..len * 2]) {
        Ok(bytes) => bytes,
        Err(_) => return err_reply(),
    };
    match target.write_memory(addr, &bytes) {
        Ok(()) => "OK".to_string(),
        Err(e) => {
            debug!("write_memory({:#010x}, {}) failed: {}", addr, len, e);
            err_reply()
        }
    }
}

/// Shared `type,addr,kind` grammar of the `Z`/`z` packets. Every numeric
/// field needs at least one digit.
fn parse_point_args(args: &[u8]) -> Option<(u32, u32, u32)> {
    let (z_type, n) = parse_hex(args);
    if n == 0 || args.get(n) != Some(&b',') {
        return None;
    }
    let rest = &args[n + 1..];
    let (addr, m) = parse_hex(rest);
    if m == 0 || rest.get(m) != Some(&b',') {
        return None;
    }
    let (kind, k) = parse_hex(&rest[m + 1..]);
    if k == 0 {
        return None;
    }
    Some((z_type, addr, kind))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
