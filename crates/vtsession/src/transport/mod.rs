pub mod pipe;
pub mod socket;
pub mod telnet;

#[cfg(feature = "pty")]
pub mod pty;

pub use pipe::PipeSession;
pub use socket::SocketSession;
pub use telnet::TelnetSession;

#[cfg(feature = "pty")]
pub use pty::PtySession;
