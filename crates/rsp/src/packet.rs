//! Packet framing: `$<body>#<2-hex-checksum>` plus the three control bytes
//! recognized outside of framing (`+`, `-`, 0x03).
//!
//! The framer is fed one byte at a time and owns nothing but its in-flight
//! accumulation buffer. Escape sequences (`0x7d` followed by `byte ^ 0x20`)
//! are applied on decode after the checksum has been verified, and produced
//! on encode before the checksum is computed, matching what RSP clients
//! send on the wire.
//!
//! 0x03 is always read as an interrupt, even right after an escape marker.
//! Since `'#' ^ 0x20 == 0x03`, an inbound body therefore cannot carry a
//! literal `#`; no command this stub understands needs one, and a client
//! that sends `0x7d 0x03` gets an interrupt plus a checksum failure for the
//! mangled packet.

use log::{trace, warn};

use crate::codec::{checksum, hex_digit_value, value_to_hex_digit};

/// Interrupt control byte (Ctrl-C on the debugger side).
pub const INTERRUPT_BYTE: u8 = 0x03;

/// Escape marker inside a packet body.
pub const ESCAPE_BYTE: u8 = 0x7d;

/// Bodies longer than this are truncated; the excess bytes are dropped
/// silently rather than faulting the connection.
pub const MAX_PACKET_LEN: usize = 4096;

/// What one input byte produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// A complete, checksum-verified, unescaped command body.
    Packet(Vec<u8>),
    /// 0x03 seen anywhere in the stream. Framing state is untouched.
    Interrupt,
    /// `+` outside a body.
    Ack,
    /// `-` outside a body.
    Nack,
    /// A packet whose declared checksum did not match (or was not hex).
    /// The body has been discarded; the caller should answer `-`.
    BadChecksum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Idle,
    Body,
    Check1,
    Check2,
}

/// Byte-at-a-time packet accumulator.
#[derive(Debug)]
pub struct Framer {
    state: FrameState,
    buf: Vec<u8>,
    declared_hi: u8,
}

impl Framer {
    pub fn new() -> Self {
        Self {
            state: FrameState::Idle,
            buf: Vec::new(),
            declared_hi: 0,
        }
    }

    /// Discards any in-flight accumulation (transport close, session reset).
    pub fn reset(&mut self) {
        self.state = FrameState::Idle;
        self.buf.clear();
    }

    /// Feeds one byte; returns an event when the byte completes something.
    pub fn push(&mut self, byte: u8) -> Option<FrameEvent> {
        // Out-of-band: the interrupt byte takes effect regardless of how far
        // into a packet we are, and leaves the accumulation alone.
        if byte == INTERRUPT_BYTE {
            return Some(FrameEvent::Interrupt);
        }

        match self.state {
            FrameState::Idle => match byte {
                b'+' => Some(FrameEvent::Ack),
                b'-' => Some(FrameEvent::Nack),
                b'$' => {
                    self.buf.clear();
                    self.state = FrameState::Body;
                    None
                }
                // Garbage between packets is skipped.
                _ => None,
            },
            FrameState::Body => match byte {
                b'#' => {
                    self.state = FrameState::Check1;
                    None
                }
                b'$' => {
                    // A new start marker abandons the half-built body.
                    self.buf.clear();
                    None
                }
                _ => {
                    if self.buf.len() < MAX_PACKET_LEN {
                        self.buf.push(byte);
                    } else {
                        warn!("packet body exceeds {} bytes, dropping byte", MAX_PACKET_LEN);
                    }
                    None
                }
            },
            FrameState::Check1 => match hex_digit_value(byte) {
                Some(d) => {
                    self.declared_hi = d;
                    self.state = FrameState::Check2;
                    None
                }
                None => {
                    self.reset();
                    Some(FrameEvent::BadChecksum)
                }
            },
            FrameState::Check2 => {
                let event = match hex_digit_value(byte) {
                    Some(lo) => {
                        let declared = (self.declared_hi << 4) | lo;
                        let computed = checksum(&self.buf);
                        if declared == computed {
                            let body = unescape(&self.buf);
                            trace!("packet in: {}", String::from_utf8_lossy(&body));
                            FrameEvent::Packet(body)
                        } else {
                            warn!(
                                "checksum mismatch: declared {:02x}, computed {:02x}",
                                declared, computed
                            );
                            FrameEvent::BadChecksum
                        }
                    }
                    None => FrameEvent::BadChecksum,
                };
                self.reset();
                Some(event)
            }
        }
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes a response body as `$<escaped-body>#<2-hex-checksum>`, ready for
/// a single `send` call.
pub fn encode(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 4);
    out.push(b'$');
    for &b in body {
        if needs_escape(b) {
            out.push(ESCAPE_BYTE);
            out.push(b ^ 0x20);
        } else {
            out.push(b);
        }
    }
    let sum = checksum(&out[1..]);
    out.push(b'#');
    out.push(value_to_hex_digit(sum >> 4));
    out.push(value_to_hex_digit(sum & 0x0f));
    out
}

fn needs_escape(b: u8) -> bool {
    matches!(b, b'#' | b'$' | b'*' | ESCAPE_BYTE)
}

/// Resolves `0x7d`-escapes in a verified body. A trailing lone escape byte
/// is dropped.
fn unescape(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut iter = raw.iter();
    while let Some(&b) = iter.next() {
        if b == ESCAPE_BYTE {
            if let Some(&next) = iter.next() {
                out.push(next ^ 0x20);
            }
        } else {
            out.push(b);
        }
    }
    out
}
