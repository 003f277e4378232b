use std::collections::VecDeque;

use crate::error::SessionError;
use crate::session::Session;

/// An in-memory loopback session: bytes a test pushes with
/// [`PipeSession::feed`] come back out of `read`; bytes written with
/// `write` accumulate in an outbox a test drains with
/// [`PipeSession::take_written`].
///
/// Never errors or blocks; `read` with nothing queued returns `Ok(0)`.
#[derive(Debug, Default)]
pub struct PipeSession {
    inbox: VecDeque<u8>,
    outbox: VecDeque<u8>,
    closed: bool,
}

impl PipeSession {
    #[must_use]
    pub fn new() -> Self {
        PipeSession::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.inbox.extend(bytes.iter().copied());
    }

    pub fn take_written(&mut self) -> Vec<u8> {
        self.outbox.drain(..).collect()
    }
}

impl Session for PipeSession {
    fn connect(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SessionError> {
        if self.closed && self.inbox.is_empty() {
            return Err(SessionError::Eof);
        }
        let n = self.inbox.len().min(buf.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.inbox.pop_front().expect("checked length above");
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, SessionError> {
        self.outbox.extend(buf.iter().copied());
        Ok(buf.len())
    }

    fn shutdown(&mut self) {
        self.closed = true;
    }

    fn close(&mut self) {
        self.closed = true;
        self.inbox.clear();
        self.outbox.clear();
    }

    fn resize(&mut self, _width: u16, _height: u16) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_fed_bytes() {
        let mut p = PipeSession::new();
        p.feed(b"hello");
        let mut buf = [0u8; 3];
        assert_eq!(p.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"hel");
        let mut buf = [0u8; 3];
        assert_eq!(p.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"lo");
    }

    #[test]
    fn read_with_nothing_queued_is_zero_not_eof() {
        let mut p = PipeSession::new();
        let mut buf = [0u8; 4];
        assert_eq!(p.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn closed_with_empty_inbox_is_eof() {
        let mut p = PipeSession::new();
        p.shutdown();
        let mut buf = [0u8; 4];
        assert!(matches!(p.read(&mut buf), Err(SessionError::Eof)));
    }

    #[test]
    fn writes_accumulate_for_inspection() {
        let mut p = PipeSession::new();
        p.write(b"abc").unwrap();
        p.write(b"def").unwrap();
        assert_eq!(p.take_written(), b"abcdef");
    }
}
