//! A small PTY-backed terminal: runs the user's shell behind a
//! `vtterm::Terminal`/`vtworker::Worker` pair and renders the result
//! onto the real terminal through a minimal ANSI-passthrough
//! `Surface`. Exercised by hand; needs a real TTY.

use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use vtsession::PtySession;
use vtsurface::{Cell, CursorKind, ModeId, Surface};
use vtterm::Key;
use vtworker::{Worker, WorkerEvent};

#[cfg(unix)]
mod raw_mode {
    use std::io;
    use std::os::unix::io::AsRawFd;

    pub struct RawModeGuard {
        original: libc::termios,
    }

    impl RawModeGuard {
        pub fn new() -> io::Result<Self> {
            let fd = io::stdin().as_raw_fd();
            let original = unsafe {
                let mut termios = std::mem::zeroed();
                if libc::tcgetattr(fd, &mut termios) != 0 {
                    return Err(io::Error::last_os_error());
                }
                termios
            };
            let mut raw = original;
            raw.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ECHONL | libc::IEXTEN | libc::ISIG);
            raw.c_iflag &=
                !(libc::IXON | libc::ICRNL | libc::INLCR | libc::IGNCR | libc::BRKINT | libc::INPCK | libc::ISTRIP);
            raw.c_oflag &= !(libc::OPOST);
            raw.c_cflag &= !(libc::CSIZE | libc::PARENB);
            raw.c_cflag |= libc::CS8;
            raw.c_cc[libc::VMIN] = 0;
            raw.c_cc[libc::VTIME] = 0;
            unsafe {
                if libc::tcsetattr(fd, libc::TCSANOW, &raw) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
            Ok(RawModeGuard { original })
        }
    }

    impl Drop for RawModeGuard {
        fn drop(&mut self) {
            let fd = io::stdin().as_raw_fd();
            unsafe {
                let _ = libc::tcsetattr(fd, libc::TCSANOW, &self.original);
            }
        }
    }
}

/// Writes straight to the real stdout as ANSI escape sequences. No
/// damage tracking beyond what `Console` already gives us: a
/// `draw_text` call repaints exactly the cells that changed.
struct AnsiSurface {
    out: io::Stdout,
    width: i32,
    height: i32,
    last_fg: Option<vtcolor::Color>,
    last_bg: Option<vtcolor::Color>,
}

impl AnsiSurface {
    fn new(width: i32, height: i32) -> Self {
        AnsiSurface {
            out: io::stdout(),
            width,
            height,
            last_fg: None,
            last_bg: None,
        }
    }

    fn move_to(&mut self, x: i32, y: i32) {
        let _ = write!(self.out, "\x1b[{};{}H", y + 1, x + 1);
    }

    fn apply_attr(&mut self, attr: vtsurface::Attr) {
        if self.last_fg == Some(attr.fg) && self.last_bg == Some(attr.bg) {
            return;
        }
        let _ = write!(self.out, "\x1b[0m");
        if attr.flags.contains(vtsurface::AttrFlags::BRIGHT) {
            let _ = write!(self.out, "\x1b[1m");
        }
        if attr.flags.contains(vtsurface::AttrFlags::DIM) {
            let _ = write!(self.out, "\x1b[2m");
        }
        if attr.flags.contains(vtsurface::AttrFlags::UNDERSCORE) {
            let _ = write!(self.out, "\x1b[4m");
        }
        if attr.flags.contains(vtsurface::AttrFlags::BLINK) {
            let _ = write!(self.out, "\x1b[5m");
        }
        if attr.flags.contains(vtsurface::AttrFlags::REVERSE) {
            let _ = write!(self.out, "\x1b[7m");
        }
        if attr.flags.contains(vtsurface::AttrFlags::HIDDEN) {
            let _ = write!(self.out, "\x1b[8m");
        }
        if attr.fg.is_default() {
            let _ = write!(self.out, "\x1b[39m");
        } else {
            let _ = write!(self.out, "\x1b[38;5;{}m", attr.fg.index());
        }
        if attr.bg.is_default() {
            let _ = write!(self.out, "\x1b[49m");
        } else {
            let _ = write!(self.out, "\x1b[48;5;{}m", attr.bg.index());
        }
        self.last_fg = Some(attr.fg);
        self.last_bg = Some(attr.bg);
    }
}

impl Surface for AnsiSurface {
    type PaintHandle = ();

    fn begin(&mut self) -> Option<Self::PaintHandle> {
        Some(())
    }

    fn end(&mut self, (): Self::PaintHandle) {
        let _ = self.out.flush();
    }

    fn draw_text(&mut self, (): &Self::PaintHandle, x: i32, y: i32, cells: &[Cell]) {
        self.move_to(x, y);
        for cell in cells {
            if cell.attr.is_no_char() {
                continue;
            }
            self.apply_attr(cell.attr);
            let ch = if cell.ch == '\0' { ' ' } else { cell.ch };
            let mut buf = [0u8; 4];
            let _ = self.out.write_all(ch.encode_utf8(&mut buf).as_bytes());
        }
    }

    fn clear_rect(&mut self, (): &Self::PaintHandle, x1: i32, y1: i32, x2: i32, y2: i32, bg: vtcolor::Color) {
        let blank = vtsurface::Attr {
            fg: vtcolor::Color::DEFAULT,
            bg,
            flags: vtsurface::AttrFlags::empty(),
        };
        let line: String = " ".repeat((x2 - x1 + 1).max(0) as usize);
        for y in y1..=y2 {
            self.move_to(x1, y);
            self.apply_attr(blank);
            let _ = self.out.write_all(line.as_bytes());
        }
    }

    fn scroll(&mut self, y1: i32, y2: i32, count: i32) {
        if count == 0 {
            return;
        }
        let (top, bottom) = if y1 < 0 { (0, self.height - 1) } else { (y1, y2) };
        let _ = write!(self.out, "\x1b[{};{}r", top + 1, bottom + 1);
        if count > 0 {
            let _ = write!(self.out, "\x1b[{count}S");
        } else {
            let _ = write!(self.out, "\x1b[{}T", -count);
        }
        let _ = write!(self.out, "\x1b[1;{}r", self.height);
    }

    fn move_cursor(&mut self, kind: CursorKind, x: i32, y: i32) {
        if kind == CursorKind::Current && x >= 0 && y >= 0 {
            self.move_to(x, y);
        }
    }

    fn beep(&mut self) {
        let _ = self.out.write_all(b"\x07");
        let _ = self.out.flush();
    }

    fn get_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn resize(&mut self, w: i32, h: i32) {
        self.width = w;
        self.height = h;
    }

    fn set_title(&mut self, title: &str) {
        let _ = write!(self.out, "\x1b]0;{title}\x07");
    }

    fn set_scroll_info(&mut self, _top: i32, _bottom: i32) {}

    fn set_mode(&mut self, mode: ModeId, value: bool) {
        if mode == ModeId::ShowCursor {
            let _ = write!(self.out, "\x1b[?25{}", if value { 'h' } else { 'l' });
        }
    }
}

fn terminal_size() -> (i32, i32) {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(io::stdout().as_raw_fd(), libc::TIOCGWINSZ, std::ptr::addr_of_mut!(ws)) };
    if rc != 0 || ws.ws_col == 0 || ws.ws_row == 0 {
        (80, 24)
    } else {
        (i32::from(ws.ws_col), i32::from(ws.ws_row))
    }
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let (width, height) = terminal_size();
    let (mut worker, events) = Worker::<AnsiSurface>::new(width, height, 1000);
    worker
        .terminal_mut()
        .console_mut()
        .attach(AnsiSurface::new(width, height));

    let term_type = std::env::var("TERM").unwrap_or_else(|_| "xterm-256color".to_string());
    worker
        .open(Box::new(PtySession::new(term_type)))
        .expect("fresh worker accepts its first session");
    worker.connect().expect("pty session connects");

    let _raw_mode = raw_mode::RawModeGuard::new().ok();
    worker.terminal_mut().console_mut().repaint();

    let mut stdin_buf = [0u8; 1024];
    loop {
        if poll_stdin(Duration::from_millis(20))? {
            let n = io::stdin().read(&mut stdin_buf)?;
            if n == 0 {
                break;
            }
            let chars: Vec<char> = stdin_buf[..n].iter().map(|&b| b as char).collect();
            for ch in chars {
                worker.keydown(false, Key::Char(ch));
            }
        }
        worker.handle_requests();
        while let Ok(event) = events.try_recv() {
            match event {
                WorkerEvent::Close => return Ok(()),
                WorkerEvent::Data | WorkerEvent::Key | WorkerEvent::Resize => {}
            }
        }
    }
    Ok(())
}

fn poll_stdin(timeout: Duration) -> io::Result<bool> {
    let fd = io::stdin().as_raw_fd();
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    #[allow(clippy::cast_possible_truncation)]
    let timeout_ms = timeout.as_millis() as libc::c_int;
    let rc = unsafe { libc::poll(std::ptr::addr_of_mut!(pollfd), 1, timeout_ms) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(rc > 0 && pollfd.revents & libc::POLLIN != 0)
}
