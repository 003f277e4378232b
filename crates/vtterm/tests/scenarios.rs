use pretty_assertions::assert_eq;
use vtcolor::Color;
use vtsurface::{Cell, NullSurface};
use vtterm::Terminal;

fn feed(term: &mut Terminal<NullSurface>, s: &str) {
    let chars: Vec<char> = s.chars().collect();
    term.write(&chars);
}

fn row(term: &Terminal<NullSurface>, width: i32, y: i32) -> Vec<Cell> {
    (0..width).map(|x| term.console().cell(x, y)).collect()
}

fn row_text(term: &Terminal<NullSurface>, width: i32, y: i32) -> String {
    row(term, width, y)
        .into_iter()
        .map(|c| if c.ch == '\0' { '.' } else { c.ch })
        .collect()
}

#[test]
fn wrap_splits_onto_the_next_row() {
    let mut term = Terminal::<NullSurface>::new(4, 2, 0);
    feed(&mut term, "ABCDE");
    assert_eq!(row_text(&term, 4, 0), "ABCD");
    assert_eq!(row_text(&term, 4, 1), "E...");
    assert_eq!(term.console().cursor(), (1, 1));
}

#[test]
fn sgr_and_color_apply_then_reset() {
    let mut term = Terminal::<NullSurface>::new(10, 2, 0);
    feed(&mut term, "\x1b[31;44mX\x1b[0mY");
    let cells = row(&term, 10, 0);
    assert_eq!(cells[0].ch, 'X');
    assert_eq!(cells[0].attr.fg, Color::ansi(1));
    assert_eq!(cells[0].attr.bg, Color::ansi(4));
    assert_eq!(cells[1].ch, 'Y');
    assert_eq!(cells[1].attr.fg, Color::DEFAULT);
    assert_eq!(cells[1].attr.bg, Color::DEFAULT);
}

#[test]
fn erase_from_cursor_to_end_of_line() {
    // height=1 so the requested row (2, 1-based) clamps back down to
    // the only viewport row, landing the cursor at (2, 0).
    let mut term = Terminal::<NullSurface>::new(4, 1, 0);
    feed(&mut term, "ABCD");
    feed(&mut term, "\x1b[2;3H");
    assert_eq!(term.console().cursor(), (2, 0));
    feed(&mut term, "\x1b[K");
    assert_eq!(row_text(&term, 4, 0), "AB..");
}

#[test]
fn scroll_region_pins_cursor_and_spares_outer_rows() {
    let mut term = Terminal::<NullSurface>::new(4, 4, 0);
    feed(&mut term, "\x1b[2;3r");
    feed(&mut term, "\n\n\n");
    assert_eq!(term.console().cursor().1, 2);
    assert_eq!(row_text(&term, 4, 0), "....");
    assert_eq!(row_text(&term, 4, 3), "....");
}

#[test]
fn double_width_glyph_occupies_two_cells() {
    let mut term = Terminal::<NullSurface>::new(4, 2, 0);
    feed(&mut term, "\u{3042}");
    let cells = row(&term, 4, 0);
    assert_eq!(cells[0].ch, '\u{3042}');
    assert!(cells[0].attr.is_wide());
    assert_eq!(cells[1].ch, '\0');
    assert!(cells[1].attr.is_no_char());
    assert_eq!(term.console().cursor(), (2, 0));
}

#[test]
fn scrollback_retains_every_written_row() {
    // width=1 means every character past the first already overflows
    // the line on its own, so three separate single-character writes
    // auto-wrap exactly once each with no explicit line feed needed.
    let mut term = Terminal::<NullSurface>::new(1, 1, 2);
    feed(&mut term, "A");
    feed(&mut term, "B");
    feed(&mut term, "C");
    assert_eq!(row_text(&term, 1, 0), "C");
    assert_eq!(term.console().cell(0, 0).ch, 'A');
    assert_eq!(term.console().cell(0, 1).ch, 'B');
    assert_eq!(term.console().cell(0, 2).ch, 'C');
}
