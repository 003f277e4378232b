/// An inclusive selection range in virtual coordinates.
///
/// Always normalized so that `(y1, x1) <= (y2, x2)` in reading order;
/// [`crate::console::Console::set_selection`] collapses an
/// inverted or zero-width request to `None` rather than storing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Selection {
    #[must_use]
    pub fn contains_row(self, y: i32) -> bool {
        y >= self.y1 && y <= self.y2
    }
}
