use vtcolor::Color;
use vtgrid::{Attr, AttrFlags, Console};
use vtkeys::{encode_key, KeyCode};
use vtsurface::{ModeId, Surface};

use crate::flags::TerminalFlags;
use crate::state::{ParserState, Params, MAX_TITLE_LEN};

const ANSIMODE_KAM: i32 = 2;
const ANSIMODE_CRM: i32 = 3;
const ANSIMODE_IRM: i32 = 4;
const ANSIMODE_HEM: i32 = 10;
const ANSIMODE_SRM: i32 = 12;
const ANSIMODE_LNM: i32 = 20;

const DECMODE_DECCKM: i32 = 1;
const DECMODE_DECANM: i32 = 2;
const DECMODE_DECTCEM: i32 = 25;
const DECMODE_VT200MOUSE: i32 = 1000;

fn is_control(wc: char) -> bool {
    (wc as u32) < 0x20
}

/// The escape sequence interpreter: consumes a stream of code points
/// and drives the cursor, attributes and buffer of the `Console` it
/// wraps.
pub struct Terminal<S: Surface = vtsurface::NullSurface> {
    console: Console<S>,
    flags: TerminalFlags,
    state: ParserState,
    params: Params,
    title_buf: Vec<char>,
    mouse_capture: bool,
    mouse_x: i32,
    mouse_y: i32,
    mouse_align: i32,
}

impl<S: Surface> Terminal<S> {
    #[must_use]
    pub fn new(width: i32, height: i32, save_height: i32) -> Self {
        Terminal {
            console: Console::new(width, height, save_height),
            flags: TerminalFlags::default(),
            state: ParserState::Normal,
            params: Params::new(),
            title_buf: Vec::new(),
            mouse_capture: false,
            mouse_x: 0,
            mouse_y: 0,
            mouse_align: 0,
        }
    }

    #[must_use]
    pub fn console(&self) -> &Console<S> {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console<S> {
        &mut self.console
    }

    #[must_use]
    pub fn state(&self) -> ParserState {
        self.state
    }

    #[must_use]
    pub fn echo(&self) -> bool {
        self.flags.contains(TerminalFlags::ECHO)
    }

    pub fn set_echo(&mut self, value: bool) {
        self.set_flag(TerminalFlags::ECHO, ModeId::Echo, value);
    }

    #[must_use]
    pub fn meta_sends_escape(&self) -> bool {
        self.flags.contains(TerminalFlags::META)
    }

    pub fn set_meta_sends_escape(&mut self, value: bool) {
        self.set_flag(TerminalFlags::META, ModeId::MetaSendsEscape, value);
    }

    fn set_flag(&mut self, bit: TerminalFlags, mode: ModeId, value: bool) {
        self.flags.set(bit, value);
        self.console.notify_mode(mode, value);
    }

    /// Consume `text`, updating the console and parser state. Mirrors
    /// the original's per-code-point dispatch loop exactly: one state
    /// transition (or one maximal run of plain text) per iteration.
    pub fn write(&mut self, text: &[char]) {
        self.console.begin();
        let mut i = 0;
        while i < text.len() {
            match self.state {
                ParserState::Normal => {
                    let wc = text[i];
                    if is_control(wc) {
                        self.write_control(wc);
                        i += 1;
                    } else {
                        i += self.write_text(&text[i..]);
                    }
                }
                ParserState::Esc => {
                    self.write_esc(text[i]);
                    i += 1;
                }
                ParserState::Csi => {
                    self.write_csi(text[i]);
                    i += 1;
                }
                ParserState::Osc => {
                    self.write_osc(text[i]);
                    i += 1;
                }
                ParserState::OscText => {
                    i += self.write_osc_text(&text[i..]);
                }
            }
        }
        self.console.end();
    }

    fn write_control(&mut self, wc: char) {
        match wc as u32 {
            0x00 => {}
            0x07 => self.console.beep(),
            0x08 => self.console.move_cursor_relative(-1, 0),
            0x09 => self.console.forward_tabstops(1),
            0x0a | 0x0b | 0x0c => self.console.line_feed(),
            0x0d => self.console.carriage_return(),
            0x1b => self.state = ParserState::Esc,
            _ => tracing::trace!(code = wc as u32, "unknown control character"),
        }
    }

    /// Consume a maximal run of non-control code points, returning how
    /// many were taken. In insert mode the gap opened ahead of the
    /// cursor is sized to the *whole remaining slice*, not just the
    /// run being written in this call — matching the original, which
    /// never implemented multi-width-aware insertion here.
    fn write_text(&mut self, text: &[char]) -> usize {
        let run_end = text.iter().position(|&c| is_control(c)).unwrap_or(text.len());
        if self.flags.contains(TerminalFlags::INSERTMODE) {
            self.console.insert_chars(text.len() as i32);
        }
        self.console.write(&text[..run_end]);
        run_end
    }

    fn write_esc(&mut self, wc: char) {
        match wc {
            '7' => self.console.save_cursor(),
            '8' => self.console.restore_cursor(),
            '=' => {
                self.flags.insert(TerminalFlags::APPNUMPAD);
                self.console.notify_mode(ModeId::ApplicationKeypad, true);
            }
            '>' => {
                self.flags.remove(TerminalFlags::APPNUMPAD);
                self.console.notify_mode(ModeId::ApplicationKeypad, false);
            }
            '[' => {
                self.state = ParserState::Csi;
                self.params = Params::new();
                return;
            }
            ']' => {
                self.state = ParserState::Osc;
                self.params = Params::new();
                return;
            }
            'D' => self.console.line_feed(),
            'E' => {
                self.console.carriage_return();
                self.console.line_feed();
            }
            'M' => self.console.reverse_index(),
            'N' | 'O' => {}
            'c' => self.console.full_reset(),
            _ => tracing::trace!(byte = %wc, "unsupported ESC sequence"),
        }
        self.state = ParserState::Normal;
    }

    fn write_csi(&mut self, wc: char) {
        if self.params.len() == 1 && self.params.raw(0) == 0 && wc == '?' {
            self.params.private = true;
            return;
        }

        if wc.is_ascii_digit() {
            self.params.push_digit(wc.to_digit(10).expect("checked is_ascii_digit"));
            return;
        }

        if wc == ';' {
            self.params.next_param();
            return;
        }

        if wc == '\x1b' {
            self.state = ParserState::Esc;
            return;
        }

        if !(('@'..='Z').contains(&wc) || ('a'..='z').contains(&wc)) {
            tracing::trace!(byte = %wc, "non-alphabetic byte after CSI");
            self.state = ParserState::Normal;
            return;
        }

        if self.params.private {
            self.write_csi1(wc);
        } else {
            self.write_csi0(wc);
        }
        self.state = ParserState::Normal;
    }

    fn write_sm(&mut self, value: bool) {
        for i in 0..self.params.len() {
            match self.params.raw(i) {
                ANSIMODE_IRM => self.flags.set(TerminalFlags::INSERTMODE, value),
                ANSIMODE_KAM | ANSIMODE_CRM | ANSIMODE_HEM | ANSIMODE_SRM | ANSIMODE_LNM => {
                    tracing::trace!(mode = self.params.raw(i), "unsupported ANSI mode");
                }
                m => tracing::trace!(mode = m, "unsupported ANSI mode"),
            }
        }
        self.console.notify_mode(ModeId::Insert, self.flags.contains(TerminalFlags::INSERTMODE));
    }

    fn write_csi0(&mut self, wc: char) {
        match wc {
            '@' => self.console.insert_chars(self.params.get(0, 1)),
            'A' => self.console.move_cursor_relative(0, -self.params.get(0, 1)),
            'B' => self.console.move_cursor_relative(0, self.params.get(0, 1)),
            'C' => self.console.move_cursor_relative(self.params.get(0, 1), 0),
            'D' => self.console.move_cursor_relative(-self.params.get(0, 1), 0),
            'G' => self.console.move_cursor(self.params.get(0, 1) - 1, -1),
            'H' => self.console.move_cursor(self.params.get(1, 1) - 1, self.params.get(0, 1) - 1),
            'J' => self.console.erase_display(self.params.raw(0)),
            'K' => self.console.erase_line(self.params.raw(0)),
            'L' => self.console.insert_lines(self.params.get(0, 1)),
            'M' => self.console.delete_lines(self.params.get(0, 1)),
            'P' => self.console.delete_chars(self.params.get(0, 1)),
            'X' => self.console.erase_chars(self.params.get(0, 1)),
            'd' => self.console.move_cursor(-1, self.params.get(0, 1) - 1),
            'h' => self.write_sm(true),
            'l' => self.write_sm(false),
            'm' => self.write_csi_sgr(),
            'r' => {
                let y1 = self.params.get(0, 0) - 1;
                let y2 = self.params.get(1, 0) - 1;
                if y1 < 0 {
                    self.console.set_scroll_region(None);
                } else {
                    self.console.set_scroll_region(Some((y1, y2)));
                }
            }
            _ => tracing::trace!(byte = %wc, "unsupported CSI"),
        }
    }

    fn write_decset(&mut self, value: bool) {
        for i in 0..self.params.len() {
            match self.params.raw(i) {
                0 => {}
                DECMODE_DECCKM => {
                    self.flags.set(TerminalFlags::NORMCURSOR, value);
                    self.console.notify_mode(ModeId::ApplicationCursorKeys, value);
                }
                DECMODE_DECANM => tracing::trace!("ignored DECANM"),
                DECMODE_DECTCEM => self.console.set_show_cursor(value),
                DECMODE_VT200MOUSE => {
                    self.flags.set(TerminalFlags::VT200MOUSE, value);
                    self.console.notify_mode(ModeId::MouseTracking, value);
                }
                m => tracing::trace!(mode = m, "unsupported DEC private mode"),
            }
        }
    }

    fn write_csi1(&mut self, wc: char) {
        match wc {
            'h' => self.write_decset(true),
            'l' => self.write_decset(false),
            _ => tracing::trace!(byte = %wc, "unsupported private CSI"),
        }
    }

    fn write_csi_sgr(&mut self) {
        let mut attribute = self.console.attribute();
        for i in 0..self.params.len() {
            let code = self.params.raw(i);
            match code {
                0 => attribute = Attr::default(),
                1 => {
                    attribute.flags.insert(AttrFlags::BRIGHT);
                    attribute.flags.remove(AttrFlags::DIM);
                }
                2 => {
                    attribute.flags.remove(AttrFlags::BRIGHT);
                    attribute.flags.insert(AttrFlags::DIM);
                }
                4 => attribute.flags.insert(AttrFlags::UNDERSCORE),
                5 => attribute.flags.insert(AttrFlags::BLINK),
                7 => attribute.flags.insert(AttrFlags::REVERSE),
                8 => attribute.flags.insert(AttrFlags::HIDDEN),
                22 => {
                    attribute.flags.remove(AttrFlags::BRIGHT);
                    attribute.flags.remove(AttrFlags::DIM);
                }
                24 => attribute.flags.remove(AttrFlags::UNDERSCORE),
                25 => attribute.flags.remove(AttrFlags::BLINK),
                27 => attribute.flags.remove(AttrFlags::REVERSE),
                28 => attribute.flags.remove(AttrFlags::HIDDEN),
                30..=37 => attribute.fg = Color::ansi((code - 30) as u8),
                38 if self.params.raw(i + 1) == 5 => {
                    attribute.fg = Color::new(self.params.raw(i + 2) as u16);
                }
                39 => attribute.fg = Color::DEFAULT,
                40..=47 => attribute.bg = Color::ansi((code - 40) as u8),
                48 if self.params.raw(i + 1) == 5 => {
                    attribute.bg = Color::new(self.params.raw(i + 2) as u16);
                }
                49 => attribute.bg = Color::DEFAULT,
                _ => tracing::trace!(code, "unsupported SGR attribute"),
            }
        }
        self.console.set_attribute(attribute);
    }

    fn write_osc(&mut self, wc: char) {
        if let Some(d) = wc.to_digit(10) {
            self.params.push_digit(d);
        } else if wc == ';' {
            self.state = ParserState::OscText;
            self.title_buf.clear();
        } else {
            self.state = ParserState::Normal;
        }
    }

    fn write_osc_text(&mut self, text: &[char]) -> usize {
        for (i, &wc) in text.iter().enumerate() {
            if wc == '\x07' || wc == '\u{9c}' {
                if matches!(self.params.raw(0), 0..=3) {
                    let title: String = self.title_buf.iter().collect();
                    self.console.set_title(&title);
                }
                self.state = ParserState::Normal;
                return i + 1;
            }
            if self.title_buf.len() < MAX_TITLE_LEN {
                self.title_buf.push(wc);
            }
        }
        text.len()
    }

    /// Read queued type-ahead bytes (echoed input, paste, key events)
    /// into `out`, returning the count written.
    pub fn read(&mut self, out: &mut [char]) -> usize {
        self.console.read_input(out)
    }

    #[must_use]
    pub fn read_ready(&self) -> bool {
        self.console.has_input()
    }

    #[must_use]
    pub fn size(&self) -> (i32, i32) {
        self.console.size()
    }

    pub fn resize(&mut self, width: i32, height: i32) -> Result<(), vtgrid::GridError> {
        self.console.resize(width, height)
    }

    pub fn append_input(&mut self, text: &[char]) {
        self.console.append_input(text);
    }

    pub fn paste(&mut self, text: &[char]) {
        self.append_input(text);
    }

    /// Encode a key press into the console's type-ahead queue,
    /// echoing it back through the parser if `echo` is set.
    pub fn keydown(&mut self, meta: bool, key: Key) {
        let mut buf: Vec<char> = Vec::with_capacity(5);
        match key {
            Key::Code(code) => {
                let app_numpad = self.flags.contains(TerminalFlags::APPNUMPAD);
                // `NORMCURSOR` mirrors DECCKM's raw on/off state (set = application
                // cursor keys); `encode_key` wants the inverse, "classic" sense.
                let normal_cursor_keys = !self.flags.contains(TerminalFlags::NORMCURSOR);
                let seq = encode_key(code, app_numpad, normal_cursor_keys);
                buf.extend(seq);
            }
            Key::Char(ch) => {
                if meta {
                    if self.flags.contains(TerminalFlags::META) {
                        buf.push('\x1b');
                        buf.push(ch);
                    } else {
                        let byte = (ch as u32 & 0x7f) as u8 | 0x80;
                        buf.push(byte as char);
                    }
                } else {
                    buf.push(ch);
                }
            }
        }
        if !buf.is_empty() {
            self.console.append_input(&buf);
            if self.flags.contains(TerminalFlags::ECHO) {
                self.write(&buf);
            }
        }
    }

    /// Encode a mouse press/release, either as a VT200 byte triple
    /// (when mouse reporting is on) or as a selection anchor.
    pub fn mouse_button(&mut self, down: bool, button: i32, x: i32, y: i32, align: i32) {
        if self.flags.contains(TerminalFlags::VT200MOUSE) {
            if button == 0 {
                return;
            }
            let b = if down { button - 1 } else { 3 } + 32;
            let buf = ['\x1b', '[', 'M', (b as u8) as char, ((x + 1 + 32) as u8) as char, ((y + 1 + 32) as u8) as char];
            self.console.append_input(&buf);
        } else if down {
            self.mouse_capture = true;
            self.mouse_x = x;
            self.mouse_y = y;
            self.mouse_align = align;
        } else {
            self.mouse_capture = false;
        }
    }

    /// Extend the active selection to `(x, y)`, normalizing so the
    /// anchor and the new point are in reading order.
    pub fn mouse_move(&mut self, x: i32, y: i32, align: i32) {
        if !self.mouse_capture {
            return;
        }
        let (mut x1, mut y1, mut align1) = (self.mouse_x, self.mouse_y, self.mouse_align);
        let (mut x2, mut y2, mut align2) = (x, y, align);
        if y1 > y2 || (y1 == y2 && (x1 > x2 || (x1 == x2 && align1 > align2))) {
            std::mem::swap(&mut y1, &mut y2);
            std::mem::swap(&mut x1, &mut x2);
            std::mem::swap(&mut align1, &mut align2);
        }
        if align2 == 0 {
            x2 += 1;
        }
        self.console.begin();
        self.console.set_selection(x1, y1, align1, x2, y2, align2);
        self.console.end();
    }
}

/// A key event: either a named, non-printable key, or an ordinary
/// printable character typed on the main keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Code(KeyCode),
    Char(char),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vtsurface::NullSurface;

    fn feed(term: &mut Terminal<NullSurface>, s: &str) {
        let chars: Vec<char> = s.chars().collect();
        term.write(&chars);
    }

    fn row(term: &Terminal<NullSurface>, y: i32) -> String {
        let (width, _) = term.size();
        (0..width).map(|x| term.console().cell(x, y).ch).collect()
    }

    #[test]
    fn plain_text_advances_cursor() {
        let mut term = Terminal::<NullSurface>::new(10, 3, 0);
        feed(&mut term, "hi");
        assert_eq!(term.console().cursor(), (2, 0));
        assert_eq!(&row(&term, 0)[..2], "hi");
    }

    #[test]
    fn csi_cursor_position_is_one_based() {
        let mut term = Terminal::<NullSurface>::new(10, 5, 0);
        feed(&mut term, "\x1b[3;4H");
        assert_eq!(term.console().cursor(), (3, 2));
        assert_eq!(term.state(), ParserState::Normal);
    }

    #[test]
    fn sgr_reset_clears_attribute() {
        let mut term = Terminal::<NullSurface>::new(10, 3, 0);
        feed(&mut term, "\x1b[31;44m");
        assert_eq!(term.console().attribute().fg, Color::ansi(1));
        feed(&mut term, "\x1b[0m");
        assert_eq!(term.console().attribute(), Attr::default());
    }

    #[test]
    fn sgr_extended_256_color() {
        let mut term = Terminal::<NullSurface>::new(10, 3, 0);
        feed(&mut term, "\x1b[38;5;201;48;5;22m");
        let attr = term.console().attribute();
        assert_eq!(attr.fg, Color::new(201));
        assert_eq!(attr.bg, Color::new(22));
    }

    #[test]
    fn unknown_csi_final_returns_to_normal_without_crashing() {
        let mut term = Terminal::<NullSurface>::new(10, 3, 0);
        feed(&mut term, "\x1b[5q");
        assert_eq!(term.state(), ParserState::Normal);
    }

    #[test]
    fn junk_between_sequences_leaves_no_residual_params() {
        let mut term = Terminal::<NullSurface>::new(10, 3, 0);
        feed(&mut term, "\x1b[3;4H");
        let after_first = term.console().cursor();
        feed(&mut term, "\x1b[!\x1b[3;4H");
        assert_eq!(term.console().cursor(), after_first);
    }

    #[test]
    fn osc_title_sets_console_title() {
        let mut term = Terminal::<NullSurface>::new(10, 3, 0);
        feed(&mut term, "\x1b]0;hello\x07");
        assert_eq!(term.console().title(), "hello");
        assert_eq!(term.state(), ParserState::Normal);
    }

    #[test]
    fn osc_unknown_selector_is_ignored() {
        let mut term = Terminal::<NullSurface>::new(10, 3, 0);
        feed(&mut term, "\x1b]52;clipboard-junk\x07");
        assert_eq!(term.console().title(), "");
    }

    #[test]
    fn decckm_toggles_arrow_key_encoding() {
        let mut term = Terminal::<NullSurface>::new(10, 3, 0);
        term.keydown(false, Key::Code(KeyCode::Up));
        let mut buf = [' '; 8];
        let n = term.read(&mut buf);
        assert_eq!(&buf[..n].iter().collect::<String>(), "\u{1b}[A");

        feed(&mut term, "\x1b[?1h");
        term.keydown(false, Key::Code(KeyCode::Up));
        let n = term.read(&mut buf);
        assert_eq!(&buf[..n].iter().collect::<String>(), "\u{1b}OA");
    }

    #[test]
    fn echo_mode_writes_key_back_to_console() {
        let mut term = Terminal::<NullSurface>::new(10, 3, 0);
        term.set_echo(true);
        term.keydown(false, Key::Char('x'));
        assert_eq!(term.console().cell(0, 0).ch, 'x');
    }

    #[test]
    fn meta_with_escape_mode_prefixes_esc() {
        let mut term = Terminal::<NullSurface>::new(10, 3, 0);
        term.keydown(true, Key::Char('x'));
        let mut buf = [' '; 4];
        let n = term.read(&mut buf);
        assert_eq!(&buf[..n], &['\x1b', 'x']);
    }

    #[test]
    fn vt200_mouse_encodes_button_press() {
        let mut term = Terminal::<NullSurface>::new(10, 3, 0);
        feed(&mut term, "\x1b[?1000h");
        term.mouse_button(true, 1, 2, 3, 0);
        let mut buf = [' '; 8];
        let n = term.read(&mut buf);
        let bytes: Vec<u32> = buf[..n].iter().map(|&c| c as u32).collect();
        assert_eq!(bytes, vec![0x1b, b'[' as u32, b'M' as u32, 32, 35, 36]);
    }
}
