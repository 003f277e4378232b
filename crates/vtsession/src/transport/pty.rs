use std::ffi::CString;
use std::fs::File;
use std::io::{ErrorKind, Read as _, Write as _};
use std::os::fd::{AsRawFd, OwnedFd};

use nix::pty::{openpty, Winsize};
use nix::sys::signal::{kill, Signal};
use nix::sys::termios;
use nix::sys::wait::waitpid;
use nix::unistd::{execv, fork, setsid, ForkResult, Pid};

use crate::error::SessionError;
use crate::session::Session;

/// A Unix pseudo-terminal running the user's shell as a child
/// process. `resize` propagates the viewport size to the kernel's
/// `TIOCSWINSZ`, which in turn delivers `SIGWINCH` to the child.
pub struct PtySession {
    terminal_type: String,
    master: Option<File>,
    child: Option<Pid>,
}

impl PtySession {
    #[must_use]
    pub fn new(terminal_type: impl Into<String>) -> Self {
        PtySession {
            terminal_type: terminal_type.into(),
            master: None,
            child: None,
        }
    }
}

impl Session for PtySession {
    fn connect(&mut self) -> Result<(), SessionError> {
        let result = openpty(None, None).map_err(|e| std::io::Error::from(e))?;
        let master: OwnedFd = result.master;
        let slave: OwnedFd = result.slave;

        // SAFETY: fork() duplicates the process; the child branch
        // only calls async-signal-safe functions before execv.
        match unsafe { fork() }.map_err(|e| std::io::Error::from(e))? {
            ForkResult::Child => {
                let slave_fd = slave.as_raw_fd();
                unsafe { nix::libc::close(master.as_raw_fd()) };
                let _ = setsid();
                for fd in 0..3 {
                    unsafe { nix::libc::dup2(slave_fd, fd) };
                }
                unsafe {
                    std::env::set_var("TERM", &self.terminal_type);
                    std::env::remove_var("LINES");
                    std::env::remove_var("COLUMNS");
                    std::env::remove_var("TERMCAP");
                }
                let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
                let path = CString::new(shell.clone()).expect("shell path has no NUL bytes");
                let _ = execv(&path, &[path.clone()]);
                std::process::exit(1);
            }
            ForkResult::Parent { child } => {
                drop(slave);
                let _ = termios::tcgetattr(&master);
                let file = File::from(master);
                set_nonblocking(&file)?;
                self.master = Some(file);
                self.child = Some(child);
                tracing::info!(pid = child.as_raw(), "pty session spawned child shell");
                Ok(())
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SessionError> {
        let Some(master) = self.master.as_mut() else {
            return Err(SessionError::Eof);
        };
        match master.read(buf) {
            Ok(0) => Err(SessionError::Eof),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, SessionError> {
        let Some(master) = self.master.as_mut() else {
            return Err(SessionError::Eof);
        };
        match master.write(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn shutdown(&mut self) {
        if let Some(pid) = self.child.take() {
            let _ = kill(pid, Signal::SIGKILL);
            let _ = waitpid(pid, None);
            tracing::info!(pid = pid.as_raw(), "pty child process killed");
        }
    }

    fn close(&mut self) {
        self.shutdown();
        self.master = None;
    }

    fn resize(&mut self, width: u16, height: u16) {
        let Some(master) = self.master.as_ref() else {
            return;
        };
        let ws = Winsize {
            ws_row: height,
            ws_col: width,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        // SAFETY: TIOCSWINSZ with a valid Winsize on a pty master fd.
        let _ = unsafe {
            nix::libc::ioctl(master.as_raw_fd(), nix::libc::TIOCSWINSZ, std::ptr::addr_of!(ws))
        };
    }
}

fn set_nonblocking(file: &File) -> Result<(), SessionError> {
    let fd = file.as_raw_fd();
    let flags = unsafe { nix::libc::fcntl(fd, nix::libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    let rc = unsafe { nix::libc::fcntl(fd, nix::libc::F_SETFL, flags | nix::libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}
