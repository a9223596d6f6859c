//! The byte-stream seam between the session and the debugger.
//!
//! The session only ever sees a connected stream; listening and accepting
//! stay with the host, which hands each accepted connection to a fresh
//! session. `recv` must never block: `Ok(0)` means "no bytes right now",
//! and a closed peer is `Err(TransportError::Disconnected)`.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::error::TransportError;

/// How many times `send` sleeps and retries on a full kernel buffer before
/// giving up on the connection.
const SEND_RETRY_LIMIT: u32 = 100;

/// Pause between send retries.
const SEND_RETRY_DELAY: Duration = Duration::from_millis(1);

pub trait Transport {
    /// Writes the whole buffer, returning the byte count on success.
    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Non-blocking read. `Ok(0)` is "nothing available", not end-of-stream.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    fn close(&mut self);
}

/// [`Transport`] over a non-blocking TCP stream.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> std::io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let mut written = 0;
        let mut retries = 0;
        while written < data.len() {
            match self.stream.write(&data[written..]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => {
                    written += n;
                    retries = 0;
                }
                // Responses are small; a full kernel buffer normally drains
                // within a retry or two. A peer that stops reading for
                // good gets the connection dropped instead of a stuck host.
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if retries == SEND_RETRY_LIMIT {
                        return Err(TransportError::Io(std::io::Error::new(
                            ErrorKind::WouldBlock,
                            "peer stopped draining the stream",
                        )));
                    }
                    retries += 1;
                    thread::sleep(SEND_RETRY_DELAY);
                }
                Err(e)
                    if e.kind() == ErrorKind::BrokenPipe
                        || e.kind() == ErrorKind::ConnectionReset =>
                {
                    return Err(TransportError::Disconnected)
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Ok(written)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.stream.read(buf) {
            // A zero-byte read on TCP means the peer closed the stream.
            Ok(0) => Err(TransportError::Disconnected),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) if e.kind() == ErrorKind::ConnectionReset => Err(TransportError::Disconnected),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn close(&mut self) {
        debug!("closing debugger connection");
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
