//! The closed set of keypad/function key identifiers a surface can
//! report to the terminal interpreter.

/// A named, non-printable key.
///
/// Ordinary printable keys (letters, digits typed on the main
/// keyboard, punctuation) are not represented here — they travel as
/// plain `char` plus a meta/shift flag. `KeyCode` covers only the
/// keys that need a fixed escape sequence: keypad keys, cursor keys,
/// and function keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyCode {
    Space,
    Tab,
    Enter,
    Pf1,
    Pf2,
    Pf3,
    Pf4,
    Home,
    Left,
    Up,
    Right,
    Down,
    Prior,
    PageUp,
    Next,
    PageDown,
    End,
    Begin,
    Insert,
    Equal,
    Multiply,
    Add,
    Separator,
    Subtract,
    Decimal,
    Divide,
    Digit(u8),
    Function(u8),
}

impl KeyCode {
    /// Position in the fixed tables used by [`crate::encode::encode_key`],
    /// mirroring the original driver's contiguous `MVT_KEYPAD_*` enum.
    pub(crate) fn table_index(self) -> Option<usize> {
        let idx = match self {
            KeyCode::Space => 0,
            KeyCode::Tab => 1,
            KeyCode::Enter => 2,
            KeyCode::Pf1 => 3,
            KeyCode::Pf2 => 4,
            KeyCode::Pf3 => 5,
            KeyCode::Pf4 => 6,
            KeyCode::Home => 7,
            KeyCode::Left => 8,
            KeyCode::Up => 9,
            KeyCode::Right => 10,
            KeyCode::Down => 11,
            KeyCode::Prior | KeyCode::PageUp => 12,
            KeyCode::Next | KeyCode::PageDown => 14,
            KeyCode::End => 16,
            KeyCode::Begin => 17,
            KeyCode::Insert => 18,
            KeyCode::Equal => 19,
            KeyCode::Multiply => 20,
            KeyCode::Add => 21,
            KeyCode::Separator => 22,
            KeyCode::Subtract => 23,
            KeyCode::Decimal => 24,
            KeyCode::Divide => 25,
            KeyCode::Digit(d) if d <= 9 => 26 + d as usize,
            KeyCode::Function(f) if (1..=20).contains(&f) => 36 + (f as usize - 1),
            _ => return None,
        };
        Some(idx)
    }

    /// True for the contiguous PF1-PF4 / keypad-digit / keypad-operator
    /// block that always encodes via SS3 (`ESC O`), and for the cursor
    /// keys when the terminal is in application-cursor-keys mode.
    pub(crate) fn prefers_ss3(self, normal_cursor_keys: bool) -> bool {
        matches!(
            self,
            KeyCode::Space
                | KeyCode::Tab
                | KeyCode::Enter
                | KeyCode::Pf1
                | KeyCode::Pf2
                | KeyCode::Pf3
                | KeyCode::Pf4
                | KeyCode::Multiply
                | KeyCode::Add
                | KeyCode::Separator
                | KeyCode::Subtract
                | KeyCode::Decimal
                | KeyCode::Divide
        ) || (!normal_cursor_keys
            && matches!(
                self,
                KeyCode::Left | KeyCode::Up | KeyCode::Right | KeyCode::Down
            ))
    }
}
