//! GDB Remote Serial Protocol engine for the debug server.
//!
//! This crate implements the wire side of remote debugging: packet framing
//! and checksum verification, hex serialization of registers and memory,
//! command dispatch, and breakpoint/watchpoint bookkeeping. It knows nothing
//! about how the debugged machine executes or how bytes reach the debugger;
//! both are injected through the [`Target`] and [`Transport`] traits.
//!
//! The main types are:
//! - [`Session`] - per-connection protocol state machine
//! - [`Target`] - the machine being debugged (registers, memory, stepping)
//! - [`Transport`] - the byte stream carrying packets

pub mod breakpoints;
pub mod codec;
pub mod command;
pub mod error;
pub mod packet;
pub mod session;
pub mod target;
pub mod transport;

pub use breakpoints::{BreakpointTable, WatchKind, Watchpoint, WatchpointTable};
pub use command::Command;
pub use error::{TargetError, TransportError};
pub use packet::{FrameEvent, Framer, MAX_PACKET_LEN};
pub use session::{Session, Status, MAX_MEM_READ, MAX_MEM_WRITE, SIGINT, SIGSEGV, SIGTRAP};
pub use target::{Target, GPR_COUNT, REG_COUNT, REG_FLAGS, REG_PC};
pub use transport::{TcpTransport, Transport};
