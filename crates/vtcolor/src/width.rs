//! East-Asian display width.
//!
//! Transcribed from the classic `wcwidth` boundary table: everything
//! not listed here is width 1 (including ASCII and the NUL filler
//! used for the trailing half of a double-width glyph, which is
//! handled at the cell level rather than here).

/// Inclusive `(start, end)` code point ranges that render as two
/// display columns.
const WIDE_RANGES: &[(u32, u32)] = &[
    (0x1100, 0x115F),
    (0x2329, 0x232A),
    (0x2E80, 0x2E99),
    (0x2E9B, 0x2EF3),
    (0x2F00, 0x2FD5),
    (0x2FF0, 0x2FFB),
    (0x3000, 0x303E),
    (0x3041, 0x3096),
    (0x3099, 0x30FF),
    (0x3105, 0x312D),
    (0x3131, 0x318E),
    (0x3190, 0x31BA),
    (0x31C0, 0x31E3),
    (0x31F0, 0x321E),
    (0x3220, 0x3247),
    (0x3250, 0x32FE),
    (0x3300, 0x4DBF),
    (0x4E00, 0xA48C),
    (0xA490, 0xA4C6),
    (0xA960, 0xA97C),
    (0xF900, 0xFAFF),
    (0xFE10, 0xFE19),
    (0xFE30, 0xFE52),
    (0xFE54, 0xFE66),
    (0xFE68, 0xFE6B),
    (0xFF01, 0xFF60),
    (0xFFE0, 0xFFE6),
];

/// Display width of a single code point: 1 or 2.
#[must_use]
pub fn char_width(c: char) -> u8 {
    let cp = c as u32;
    match WIDE_RANGES.binary_search_by(|&(start, end)| {
        if cp < start {
            core::cmp::Ordering::Greater
        } else if cp > end {
            core::cmp::Ordering::Less
        } else {
            core::cmp::Ordering::Equal
        }
    }) {
        Ok(_) => 2,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_narrow() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width(' '), 1);
    }

    #[test]
    fn hiragana_a_is_wide() {
        assert_eq!(char_width('\u{3042}'), 2);
    }

    #[test]
    fn hangul_jamo_is_wide() {
        assert_eq!(char_width('\u{1100}'), 2);
        assert_eq!(char_width('\u{115F}'), 2);
        assert_eq!(char_width('\u{1160}'), 1);
    }

    #[test]
    fn cjk_unified_block_is_wide() {
        assert_eq!(char_width('\u{4E00}'), 2);
        assert_eq!(char_width('\u{9FFF}'.min('\u{A48C}')), 2);
    }

    #[test]
    fn fullwidth_forms_boundary() {
        assert_eq!(char_width('\u{FF01}'), 2);
        assert_eq!(char_width('\u{FF60}'), 2);
        assert_eq!(char_width('\u{FF61}'), 1);
    }

    #[test]
    fn ranges_are_sorted_for_binary_search() {
        for w in WIDE_RANGES.windows(2) {
            assert!(w[0].1 < w[1].0, "{:?} not before {:?}", w[0], w[1]);
        }
    }
}
