//! Keypad/function key -> escape sequence encoding.

use crate::keycode::KeyCode;
use smallvec::SmallVec;

/// `char` emitted directly (no escape sequence) when the terminal is
/// *not* in application-numpad mode, `'\0'` meaning "no direct
/// mapping, always use an escape sequence".
///
/// Transcribed from the original driver's `vktochar_table`.
const DIRECT_CHAR: [char; 56] = [
    '\0', '\t', '\r', '\0', '\0', '\0', '\0', '\0', '\0', '\0', '\0', '\0', '\0', '\0', '\0',
    '\0', '\0', '\0', '\0', '\0', '*', '+', ',', '-', '.', '/', '0', '1', '2', '3', '4', '5',
    '6', '7', '8', '9', '\0', '\0', '\0', '\0', '\0', '\0', '\0', '\0', '\0', '\0', '\0', '\0',
    '\0', '\0', '\0', '\0', '\0', '\0', '\0', '\0',
];

/// The final byte (or small numeric id, for the `CSI n ~` family) used
/// when building the escape sequence, `0` meaning "no sequence at all".
///
/// Transcribed from the original driver's `vktoappchar_table`. Values
/// `1..=9` become `CSI n ~`; values in `11..32` become a two-digit
/// `CSI nn ~`; everything else is the literal final byte after
/// `ESC [` or `ESC O`.
const SEQ_CODE: [u8; 56] = [
    b' ', b'I', b'M', b'P', b'Q', b'R', b'S', 1, b'D', b'A', b'C', b'B', 5, 5, 6, 6, 4, b'E', 2,
    b'X', b'j', b'k', b'l', b'm', 0, b'o', 2, 4, b'B', 6, b'D', b'E', b'C', 1, b'A', 5, 11, 12,
    13, 14, 15, 17, 18, 19, 20, 21, 23, 24, 25, 26, 28, 29, 31, 32, 33, 34,
];

/// Encode a key press into the bytes (as code points) that should be
/// appended to the console's type-ahead queue.
///
/// `application_numpad` mirrors `DECNKM`/`DECKPAM`; `normal_cursor_keys`
/// is true when `DECCKM` (mode 1) is *not* set (the terminal's default,
/// "normal" cursor-key mode).
#[must_use]
pub fn encode_key(
    code: KeyCode,
    application_numpad: bool,
    normal_cursor_keys: bool,
) -> SmallVec<[char; 5]> {
    let mut out = SmallVec::new();
    let Some(idx) = code.table_index() else {
        return out;
    };

    if !application_numpad {
        let direct = DIRECT_CHAR[idx];
        if direct != '\0' {
            out.push(direct);
            return out;
        }
    }

    let last = SEQ_CODE[idx];
    if last == 0 {
        return out;
    }

    out.push('\u{1b}');
    out.push(if code.prefers_ss3(normal_cursor_keys) { 'O' } else { '[' });
    if (1..=9).contains(&last) {
        out.push((b'0' + last) as char);
        out.push('~');
    } else if (10..0x20).contains(&last) {
        out.push((b'0' + last % 10) as char);
        out.push((b'0' + last / 10) as char);
        out.push('~');
    } else {
        out.push(last as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_keys_default_to_csi() {
        let seq = encode_key(KeyCode::Up, false, true);
        assert_eq!(seq.iter().collect::<String>(), "\u{1b}[A");
    }

    #[test]
    fn arrow_keys_use_ss3_in_application_cursor_mode() {
        let seq = encode_key(KeyCode::Up, false, false);
        assert_eq!(seq.iter().collect::<String>(), "\u{1b}OA");
    }

    #[test]
    fn pf1_is_always_ss3() {
        let seq = encode_key(KeyCode::Pf1, false, true);
        assert_eq!(seq.iter().collect::<String>(), "\u{1b}OP");
    }

    #[test]
    fn keypad_digit_without_app_numpad_is_direct() {
        let seq = encode_key(KeyCode::Digit(5), false, true);
        assert_eq!(seq.iter().collect::<String>(), "5");
    }

    #[test]
    fn home_uses_single_digit_csi_tilde() {
        // HOME -> seq code 1 -> CSI 1 ~
        let seq = encode_key(KeyCode::Home, false, true);
        assert_eq!(seq.iter().collect::<String>(), "\u{1b}[1~");
    }

    #[test]
    fn f5_uses_two_digit_csi_tilde() {
        let seq = encode_key(KeyCode::Function(5), false, true);
        assert_eq!(seq.iter().collect::<String>(), "\u{1b}[15~");
    }

    #[test]
    fn decimal_has_no_direct_or_app_mapping() {
        assert!(encode_key(KeyCode::Decimal, false, true).is_empty());
        assert!(encode_key(KeyCode::Decimal, true, true).is_empty());
    }
}
