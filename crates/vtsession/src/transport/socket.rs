use std::io::{ErrorKind, Read as _, Write as _};
use std::net::TcpStream;

use crate::error::SessionError;
use crate::session::Session;

/// A plain TCP session. Set to non-blocking after connect so `read`
/// can honor the `Session` contract of returning `Ok(0)` rather than
/// blocking the worker's input thread when no data has arrived yet.
pub struct SocketSession {
    hostname: String,
    port: u16,
    stream: Option<TcpStream>,
}

impl SocketSession {
    #[must_use]
    pub fn new(hostname: String, port: u16) -> Self {
        SocketSession {
            hostname,
            port,
            stream: None,
        }
    }
}

impl Session for SocketSession {
    fn connect(&mut self) -> Result<(), SessionError> {
        let stream = TcpStream::connect((self.hostname.as_str(), self.port))?;
        stream.set_nonblocking(true)?;
        tracing::info!(host = %self.hostname, port = self.port, "socket session connected");
        self.stream = Some(stream);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SessionError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(SessionError::Eof);
        };
        match stream.read(buf) {
            Ok(0) => Err(SessionError::Eof),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, SessionError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(SessionError::Eof);
        };
        match stream.write(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn shutdown(&mut self) {
        if let Some(stream) = &self.stream {
            let _ = stream.shutdown(std::net::Shutdown::Write);
        }
    }

    fn close(&mut self) {
        tracing::info!(host = %self.hostname, "socket session closed");
        self.stream = None;
    }

    fn resize(&mut self, _width: u16, _height: u16) {
        // A bare TCP stream has no notion of a viewport; NAWS
        // propagation happens one layer up, in TelnetSession.
    }
}
