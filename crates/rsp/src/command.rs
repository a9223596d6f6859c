//! Decoded command bodies.
//!
//! Dispatch is a match over a closed set of variants rather than raw
//! character switching, so adding a packet type means adding a variant and a
//! handler arm. Argument payloads stay as raw bytes here; the session parses
//! each command's grammar with [`crate::codec::parse_hex`] so that grammar
//! errors can be answered uniformly with `E01`.

/// One decoded command, borrowing its argument bytes from the packet body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `?` - report why the target last stopped.
    HaltReason,
    /// `g` - read the full register snapshot.
    ReadRegisters,
    /// `G<hex>` - write the full register snapshot.
    WriteRegisters(&'a [u8]),
    /// `m addr,len` - read a memory window.
    ReadMemory(&'a [u8]),
    /// `M addr,len:data` - write a memory window.
    WriteMemory(&'a [u8]),
    /// `c` - resume execution.
    Continue,
    /// `s` - execute one instruction.
    Step,
    /// `Z type,addr,kind` - insert a breakpoint or watchpoint.
    Insert(&'a [u8]),
    /// `z type,addr,kind` - remove a breakpoint or watchpoint.
    Remove(&'a [u8]),
    /// `q...` - general query.
    Query(&'a [u8]),
    /// `Q...` - general set.
    Set(&'a [u8]),
    /// `!` - enable extended mode.
    ExtendedMode,
    /// `H<op><tid>` - set thread for subsequent operations (ignored, one
    /// logical thread).
    SetThread,
    /// `D` - detach.
    Detach,
    /// `k` - kill. No reply is defined; teardown is the host's job.
    Kill,
    /// Anything else. Answered with an empty body, the protocol's own
    /// "not implemented" signal.
    Unsupported,
}

impl<'a> Command<'a> {
    /// Splits a packet body into a command variant and its argument bytes.
    /// An empty body is `Unsupported`.
    pub fn parse(body: &'a [u8]) -> Self {
        let Some((&head, args)) = body.split_first() else {
            return Command::Unsupported;
        };
        match head {
            b'?' => Command::HaltReason,
            b'g' => Command::ReadRegisters,
            b'G' => Command::WriteRegisters(args),
            b'm' => Command::ReadMemory(args),
            b'M' => Command::WriteMemory(args),
            b'c' => Command::Continue,
            b's' => Command::Step,
            b'Z' => Command::Insert(args),
            b'z' => Command::Remove(args),
            b'q' => Command::Query(args),
            b'Q' => Command::Set(args),
            b'!' => Command::ExtendedMode,
            b'H' => Command::SetThread,
            b'D' => Command::Detach,
            b'k' => Command::Kill,
            _ => Command::Unsupported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_character_selects_the_variant() {
        assert_eq!(Command::parse(b"?"), Command::HaltReason);
        assert_eq!(Command::parse(b"g"), Command::ReadRegisters);
        assert_eq!(Command::parse(b"m1000,200"), Command::ReadMemory(b"1000,200"));
        assert_eq!(Command::parse(b"Z0,1000,4"), Command::Insert(b"0,1000,4"));
        assert_eq!(Command::parse(b"qSupported:x"), Command::Query(b"Supported:x"));
        assert_eq!(Command::parse(b"Hg0"), Command::SetThread);
        assert_eq!(Command::parse(b"vCont?"), Command::Unsupported);
        assert_eq!(Command::parse(b""), Command::Unsupported);
    }
}
