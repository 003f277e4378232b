use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use smallvec::SmallVec;
use vtsession::Session;
use vtsurface::Surface;
use vtterm::Terminal;

use crate::codec::{self, Utf8Decoder};
use crate::error::WorkerError;
use crate::event::WorkerEvent;
use crate::request::{QueuedRequest, RequestKind, Response, WorkerShared};

const READ_BUFFER_SIZE: usize = 4096;
const MAX_SESSIONS: usize = 3;
const IDLE_POLL: Duration = Duration::from_millis(10);

type SessionHandle = Arc<Mutex<Box<dyn Session>>>;

/// The per-terminal background I/O coordinator: a stack of up to
/// three sessions (layered transports, e.g. TELNET over a socket),
/// a request queue shared with two background threads, and the
/// `Terminal` those threads' requests ultimately mutate.
///
/// The terminal stays single-writer: only [`Worker::handle_requests`]
/// (run on whatever thread owns the `Worker`) ever calls into it.
/// Background threads communicate purely through [`WorkerShared`].
pub struct Worker<S: Surface = vtsurface::NullSurface> {
    terminal: Terminal<S>,
    shared: Arc<WorkerShared>,
    sessions: SmallVec<[SessionHandle; MAX_SESSIONS]>,
    input_thread: Option<JoinHandle<()>>,
    output_thread: Option<JoinHandle<()>>,
    active: bool,
    events_tx: Sender<WorkerEvent>,
}

impl<S: Surface> Worker<S> {
    /// Create a worker around a freshly sized terminal. Returns the
    /// worker and the receiving half of its event channel; the
    /// embedder polls that channel (or blocks on it) to learn about
    /// `Data`/`Close`/`Key`/`Resize` notifications.
    #[must_use]
    pub fn new(width: i32, height: i32, save_height: i32) -> (Self, Receiver<WorkerEvent>) {
        let (events_tx, events_rx) = mpsc::channel();
        let worker = Worker {
            terminal: Terminal::new(width, height, save_height),
            shared: Arc::new(WorkerShared::new()),
            sessions: SmallVec::new(),
            input_thread: None,
            output_thread: None,
            active: false,
            events_tx,
        };
        (worker, events_rx)
    }

    #[must_use]
    pub fn terminal(&self) -> &Terminal<S> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<S> {
        &mut self.terminal
    }

    /// Push a new session on top of the stack, layered over the
    /// current top (if any) as its "source". Capped at three deep.
    pub fn open(&mut self, session: Box<dyn Session>) -> Result<(), WorkerError> {
        if self.sessions.len() == MAX_SESSIONS {
            return Err(WorkerError::SessionStackFull { max: MAX_SESSIONS });
        }
        self.sessions.push(Arc::new(Mutex::new(session)));
        Ok(())
    }

    fn top(&self) -> Result<&SessionHandle, WorkerError> {
        self.sessions.last().ok_or(WorkerError::NoSession)
    }

    /// Connect the top session and spawn the input/output threads.
    pub fn connect(&mut self) -> Result<(), WorkerError> {
        let top = self.top()?.clone();
        top.lock()
            .expect("session mutex poisoned")
            .connect()
            .map_err(WorkerError::Session)?;
        self.active = true;
        self.shared.reset_shutdown();

        let shared = Arc::clone(&self.shared);
        let session = Arc::clone(&top);
        self.input_thread = Some(std::thread::spawn(move || input_task(session, shared)));

        let shared = Arc::clone(&self.shared);
        let session = Arc::clone(&top);
        self.output_thread = Some(std::thread::spawn(move || output_task(session, shared)));

        Ok(())
    }

    pub fn suspend(&mut self) {
        if !self.sessions.is_empty() {
            self.active = false;
        }
    }

    pub fn resume(&mut self) {
        if !self.sessions.is_empty() {
            self.active = true;
        }
    }

    /// Drain and service every request currently queued by the
    /// background threads. Call this whenever the embedder's event
    /// loop wakes (e.g. on the shared condvar, or on a timer).
    pub fn handle_requests(&mut self) {
        for request in self.shared.drain_requests() {
            self.service(request);
        }
    }

    /// Block until at least one request is queued, then service every
    /// request that has accumulated. For an embedder with no event
    /// loop of its own, this is the whole main-thread driver: call it
    /// in a tight loop after `connect`.
    pub fn wait_and_handle_requests(&mut self) {
        for request in self.shared.wait_for_requests() {
            self.service(request);
        }
    }

    fn service(&mut self, request: QueuedRequest) {
        match request.kind {
            RequestKind::Write(chars) => {
                let count = chars.len();
                self.terminal.write(&chars);
                let _ = request.resp_tx.send(Response::Write(count));
            }
            RequestKind::Read { cap } => self.service_read(request.resp_tx, cap),
            RequestKind::Close => {
                let _ = request.resp_tx.send(Response::Close);
                let _ = self.events_tx.send(WorkerEvent::Close);
            }
        }
    }

    fn service_read(&mut self, resp_tx: mpsc::Sender<Response>, cap: usize) {
        if self.shared.take_resized() {
            let _ = resp_tx.send(Response::Read {
                chars: Vec::new(),
                resized: Some(self.terminal.size()),
            });
            return;
        }
        let mut buf = vec![' '; cap];
        let n = self.terminal.read(&mut buf);
        if n > 0 {
            buf.truncate(n);
            let _ = resp_tx.send(Response::Read {
                chars: buf,
                resized: None,
            });
        } else {
            self.shared.park_read(QueuedRequest {
                kind: RequestKind::Read { cap },
                resp_tx,
            });
        }
    }

    /// Called after anything appends to the terminal's type-ahead
    /// queue (a keypress, a paste, or the terminal's own internal
    /// echo) to wake a parked read, if any.
    fn data_ready(&mut self) {
        if !self.terminal.read_ready() {
            return;
        }
        if !self.active {
            let _ = self.events_tx.send(WorkerEvent::Data);
            return;
        }
        if let Some(request) = self.shared.take_pending_read() {
            let QueuedRequest { kind, resp_tx } = request;
            let RequestKind::Read { cap } = kind else {
                unreachable!("only reads are ever parked");
            };
            self.service_read(resp_tx, cap);
        }
    }

    pub fn keydown(&mut self, meta: bool, key: vtterm::Key) {
        self.terminal.keydown(meta, key);
        let _ = self.events_tx.send(WorkerEvent::Key);
        self.data_ready();
    }

    pub fn paste(&mut self, text: &[char]) {
        self.terminal.paste(text);
        self.data_ready();
    }

    pub fn mouse_button(&mut self, down: bool, button: i32, x: i32, y: i32, align: i32) {
        self.terminal.mouse_button(down, button, x, y, align);
        self.data_ready();
    }

    pub fn mouse_move(&mut self, x: i32, y: i32, align: i32) {
        self.terminal.mouse_move(x, y, align);
        self.data_ready();
    }

    /// Resize the terminal and fast-path a parked read so the output
    /// thread learns the new geometry without waiting for data.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<(), WorkerError> {
        self.terminal.resize(width, height).map_err(WorkerError::Grid)?;
        self.shared.set_resized();
        if let Some(request) = self.shared.take_pending_read() {
            let QueuedRequest { resp_tx, .. } = request;
            let _ = resp_tx.send(Response::Read {
                chars: Vec::new(),
                resized: Some(self.terminal.size()),
            });
            self.shared.take_resized();
        }
        let _ = self.events_tx.send(WorkerEvent::Resize);
        Ok(())
    }

    /// Tear the whole stack down: shut down the top session
    /// (unblocking any in-flight read/write), fail every queued and
    /// parked request with a zero-length response, join both
    /// background threads, then close every session top-down.
    pub fn shutdown(&mut self) {
        if self.sessions.is_empty() {
            return;
        }
        if let Ok(top) = self.top() {
            top.lock().expect("session mutex poisoned").shutdown();
        }
        let (queued, pending) = self.shared.begin_shutdown();
        for request in queued.into_iter().chain(pending) {
            match request.kind {
                RequestKind::Read { .. } => {
                    let _ = request.resp_tx.send(Response::Read {
                        chars: Vec::new(),
                        resized: None,
                    });
                }
                RequestKind::Write(_) => {
                    let _ = request.resp_tx.send(Response::Write(0));
                }
                RequestKind::Close => {
                    let _ = request.resp_tx.send(Response::Close);
                }
            }
        }
        if let Some(handle) = self.input_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.output_thread.take() {
            let _ = handle.join();
        }
        while let Some(session) = self.sessions.pop() {
            session.lock().expect("session mutex poisoned").close();
        }
        self.active = false;
    }
}

impl<S: Surface> Drop for Worker<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn input_task(session: SessionHandle, shared: Arc<WorkerShared>) {
    let mut decoder = Utf8Decoder::new();
    let mut raw = [0u8; READ_BUFFER_SIZE];
    let mut chars = Vec::new();
    loop {
        let n = {
            let mut s = session.lock().expect("session mutex poisoned");
            s.read(&mut raw)
        };
        match n {
            Ok(0) => std::thread::sleep(IDLE_POLL),
            Ok(n) => {
                decoder.decode(&raw[..n], &mut chars);
                if !chars.is_empty() {
                    if shared.submit(RequestKind::Write(std::mem::take(&mut chars))).is_none() {
                        break;
                    }
                }
            }
            Err(_) => break,
        }
    }
    let _ = shared.submit(RequestKind::Close);
}

fn output_task(session: SessionHandle, shared: Arc<WorkerShared>) {
    let mut bytes = Vec::new();
    loop {
        let Some(response) = shared.submit(RequestKind::Read {
            cap: READ_BUFFER_SIZE,
        }) else {
            break;
        };
        let Response::Read { chars, resized } = response else {
            break;
        };
        if let Some((width, height)) = resized {
            let mut s = session.lock().expect("session mutex poisoned");
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            s.resize(width.max(0) as u16, height.max(0) as u16);
            continue;
        }
        if chars.is_empty() {
            break;
        }
        bytes.clear();
        codec::encode(&chars, &mut bytes);
        let mut s = session.lock().expect("session mutex poisoned");
        let mut sent = 0;
        while sent < bytes.len() {
            match s.write(&bytes[sent..]) {
                Ok(0) => std::thread::sleep(IDLE_POLL),
                Ok(n) => sent += n,
                Err(_) => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{RequestKind, Response};
    use pretty_assertions::assert_eq;
    use vtsession::PipeSession;
    use vtsurface::NullSurface;

    #[test]
    fn write_request_updates_terminal() {
        let (mut worker, _events) = Worker::<NullSurface>::new(10, 3, 0);
        let shared = Arc::clone(&worker.shared);
        let submitter = std::thread::spawn(move || shared.submit(RequestKind::Write(vec!['h', 'i'])));
        worker.wait_and_handle_requests();
        assert!(matches!(submitter.join().unwrap(), Some(Response::Write(2))));
        assert_eq!(worker.terminal().console().cursor(), (2, 0));
    }

    #[test]
    fn read_request_parks_until_data_then_delivers_on_data_ready() {
        let (mut worker, _events) = Worker::<NullSurface>::new(10, 3, 0);
        worker.active = true;
        let shared = Arc::clone(&worker.shared);
        let submitter = std::thread::spawn(move || shared.submit(RequestKind::Read { cap: 8 }));
        worker.wait_and_handle_requests();
        worker.terminal_mut().append_input(&['x', 'y']);
        worker.data_ready();
        match submitter.join().unwrap() {
            Some(Response::Read { chars, resized }) => {
                assert_eq!(chars, vec!['x', 'y']);
                assert!(resized.is_none());
            }
            _ => panic!("expected a data response"),
        }
    }

    #[test]
    fn resize_wakes_a_parked_read_with_zero_length_and_new_size() {
        let (mut worker, _events) = Worker::<NullSurface>::new(10, 3, 0);
        worker.active = true;
        let shared = Arc::clone(&worker.shared);
        let submitter = std::thread::spawn(move || shared.submit(RequestKind::Read { cap: 8 }));
        worker.wait_and_handle_requests();
        worker.resize(20, 6).unwrap();
        match submitter.join().unwrap() {
            Some(Response::Read { chars, resized }) => {
                assert!(chars.is_empty());
                assert_eq!(resized, Some((20, 6)));
            }
            _ => panic!("expected a resize response"),
        }
    }

    #[test]
    fn suspended_worker_reports_data_event_instead_of_fulfilling_a_parked_read() {
        let (mut worker, events) = Worker::<NullSurface>::new(10, 3, 0);
        worker.active = false;
        worker.terminal_mut().append_input(&['z']);
        worker.data_ready();
        assert_eq!(events.try_recv(), Ok(WorkerEvent::Data));
    }

    #[test]
    fn session_stack_caps_at_three() {
        let (mut worker, _events) = Worker::<NullSurface>::new(10, 3, 0);
        for _ in 0..3 {
            worker.open(Box::new(PipeSession::new())).unwrap();
        }
        assert!(matches!(
            worker.open(Box::new(PipeSession::new())),
            Err(WorkerError::SessionStackFull { max: 3 })
        ));
    }
}
