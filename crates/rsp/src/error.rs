use thiserror::Error;

/// Failures reported by a [`crate::Target`]. The wire collapses all of them
/// into `E01`; the variants exist for host-side logging.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("address out of range: {0:#010x}")]
    OutOfRange(u32),
    #[error("no breakpoint slot available")]
    NoSlot,
    #[error("operation not supported by this target")]
    Unsupported,
}

/// Failures reported by a [`crate::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer closed the connection. The session resets to `Listening`.
    #[error("debugger disconnected")]
    Disconnected,
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),
}
