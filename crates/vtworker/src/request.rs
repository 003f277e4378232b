use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Condvar, Mutex};

/// What a background task is asking the main thread to do on its
/// behalf. The terminal is single-writer, so every mutation crosses
/// this queue rather than being touched from the I/O threads
/// directly.
pub(crate) enum RequestKind {
    Write(Vec<char>),
    Read { cap: usize },
    Close,
}

/// What the main thread hands back once a queued request has been
/// serviced.
pub(crate) enum Response {
    Write(usize),
    /// `resized` carries the new viewport size when this read was
    /// woken by a resize rather than by data; `chars` is empty in
    /// that case and the caller must re-issue the read.
    Read {
        chars: Vec<char>,
        resized: Option<(i32, i32)>,
    },
    Close,
}

pub(crate) struct QueuedRequest {
    pub(crate) kind: RequestKind,
    pub(crate) resp_tx: mpsc::Sender<Response>,
}

#[derive(Default)]
struct State {
    queue: VecDeque<QueuedRequest>,
    pending_read: Option<QueuedRequest>,
    resized: bool,
    shutting_down: bool,
}

/// The state a `Worker` shares with its two background I/O threads:
/// the request queue, the parked read (if any), and the flags that
/// drive resize and shutdown handling. Scoped to a single `Worker`,
/// not a process-wide singleton.
pub struct WorkerShared {
    state: Mutex<State>,
    kick: Condvar,
}

impl Default for WorkerShared {
    fn default() -> Self {
        WorkerShared {
            state: Mutex::new(State::default()),
            kick: Condvar::new(),
        }
    }
}

impl WorkerShared {
    #[must_use]
    pub fn new() -> Self {
        WorkerShared::default()
    }

    /// Submit a request and block until the main thread services it.
    /// Returns `None` if the worker is already shutting down.
    pub(crate) fn submit(&self, kind: RequestKind) -> Option<Response> {
        let (resp_tx, resp_rx) = mpsc::channel();
        {
            let mut state = self.state.lock().expect("worker state mutex poisoned");
            if state.shutting_down {
                return None;
            }
            state.queue.push_back(QueuedRequest { kind, resp_tx });
            self.kick.notify_all();
        }
        resp_rx.recv().ok()
    }

    /// Block until a request is queued, then drain and return all of
    /// them for the main thread to process.
    pub(crate) fn wait_for_requests(&self) -> Vec<QueuedRequest> {
        let mut state = self.state.lock().expect("worker state mutex poisoned");
        while state.queue.is_empty() && !state.shutting_down {
            state = self.kick.wait(state).expect("worker state mutex poisoned");
        }
        state.queue.drain(..).collect()
    }

    /// Non-blocking variant of [`WorkerShared::wait_for_requests`],
    /// used by an embedder's own event loop that polls rather than
    /// blocks on this queue.
    pub(crate) fn drain_requests(&self) -> Vec<QueuedRequest> {
        let mut state = self.state.lock().expect("worker state mutex poisoned");
        state.queue.drain(..).collect()
    }

    pub(crate) fn park_read(&self, request: QueuedRequest) {
        let mut state = self.state.lock().expect("worker state mutex poisoned");
        state.pending_read = Some(request);
    }

    pub(crate) fn take_pending_read(&self) -> Option<QueuedRequest> {
        let mut state = self.state.lock().expect("worker state mutex poisoned");
        state.pending_read.take()
    }

    pub(crate) fn set_resized(&self) {
        let mut state = self.state.lock().expect("worker state mutex poisoned");
        state.resized = true;
    }

    pub(crate) fn take_resized(&self) -> bool {
        let mut state = self.state.lock().expect("worker state mutex poisoned");
        std::mem::take(&mut state.resized)
    }

    pub(crate) fn begin_shutdown(&self) -> (Vec<QueuedRequest>, Option<QueuedRequest>) {
        let mut state = self.state.lock().expect("worker state mutex poisoned");
        state.shutting_down = true;
        let queued = state.queue.drain(..).collect();
        let pending = state.pending_read.take();
        self.kick.notify_all();
        (queued, pending)
    }

    pub(crate) fn reset_shutdown(&self) {
        let mut state = self.state.lock().expect("worker state mutex poisoned");
        state.shutting_down = false;
    }
}
