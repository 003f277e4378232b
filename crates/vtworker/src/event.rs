/// The only four things a `Worker` ever reports to its embedder.
/// Everything else (escape sequence handling, buffer mutation) stays
/// internal to the terminal interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    /// The session produced output while the worker was suspended, or
    /// a parked read was satisfied; the embedder should repaint.
    Data,
    /// The active session reached end of stream or failed; the
    /// terminal remains a static, readable display.
    Close,
    /// A key was queued for the session (echoed back for surfaces
    /// that want to show immediate feedback before the round trip).
    Key,
    /// The viewport geometry changed and has been forwarded to the
    /// active session.
    Resize,
}
