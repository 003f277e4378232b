use vtcolor::Color;

use crate::cell::Cell;

/// Which cursor a `move_cursor` call repositions. A surface that
/// renders a selection highlight uses the two selection variants to
/// place its endpoints independently of the editing caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Current,
    SelectionStart,
    SelectionEnd,
}

/// A terminal mode whose on/off state a surface may want to reflect
/// (e.g. swapping mouse-pointer shape, or drawing a distinct caret
/// when the application has taken over the numeric keypad).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeId {
    ShowCursor,
    Echo,
    MetaSendsEscape,
    ApplicationKeypad,
    ApplicationCursorKeys,
    Insert,
    MouseTracking,
}

/// Capability interface implemented by a rendering backend: pixel,
/// GPU, curses-like, or (for tests) nothing at all.
///
/// `begin`/`end` bracket a paint batch; a backend that has no notion
/// of batching can make `PaintHandle = ()` and do its work eagerly in
/// `begin`. A `None` from `begin` means "skip this repaint" — the
/// caller must tolerate it (e.g. the surface is mid-resize).
pub trait Surface {
    type PaintHandle;

    fn begin(&mut self) -> Option<Self::PaintHandle>;
    fn end(&mut self, handle: Self::PaintHandle);

    fn draw_text(&mut self, handle: &Self::PaintHandle, x: i32, y: i32, cells: &[Cell]);

    fn clear_rect(
        &mut self,
        handle: &Self::PaintHandle,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        bg: Color,
    );

    /// Scroll the region `[y1, y2)` by `count` rows (positive scrolls
    /// content up). `y1 == -1 && y2 == -1` means "the whole viewport".
    fn scroll(&mut self, y1: i32, y2: i32, count: i32);

    fn move_cursor(&mut self, kind: CursorKind, x: i32, y: i32);

    fn beep(&mut self);

    fn get_size(&self) -> (i32, i32);
    fn resize(&mut self, w: i32, h: i32);

    fn set_title(&mut self, title: &str);
    fn set_scroll_info(&mut self, top: i32, bottom: i32);
    fn set_mode(&mut self, mode: ModeId, value: bool);
}

/// A `Surface` that discards every call. Used by tests that only care
/// about grid state, and by a `Console` while no real backend is
/// attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface {
    width: i32,
    height: i32,
}

impl NullSurface {
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        NullSurface { width, height }
    }
}

impl Surface for NullSurface {
    type PaintHandle = ();

    fn begin(&mut self) -> Option<Self::PaintHandle> {
        Some(())
    }

    fn end(&mut self, (): Self::PaintHandle) {}

    fn draw_text(&mut self, (): &Self::PaintHandle, _x: i32, _y: i32, _cells: &[Cell]) {}

    fn clear_rect(
        &mut self,
        (): &Self::PaintHandle,
        _x1: i32,
        _y1: i32,
        _x2: i32,
        _y2: i32,
        _bg: Color,
    ) {
    }

    fn scroll(&mut self, _y1: i32, _y2: i32, _count: i32) {}

    fn move_cursor(&mut self, _kind: CursorKind, _x: i32, _y: i32) {}

    fn beep(&mut self) {}

    fn get_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn resize(&mut self, w: i32, h: i32) {
        self.width = w;
        self.height = h;
    }

    fn set_title(&mut self, _title: &str) {}
    fn set_scroll_info(&mut self, _top: i32, _bottom: i32) {}
    fn set_mode(&mut self, _mode: ModeId, _value: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_surface_reports_resized_geometry() {
        let mut s = NullSurface::new(80, 24);
        assert_eq!(s.get_size(), (80, 24));
        s.resize(132, 43);
        assert_eq!(s.get_size(), (132, 43));
    }

    #[test]
    fn null_surface_always_yields_a_paint_handle() {
        let mut s = NullSurface::new(10, 10);
        let h = s.begin().expect("NullSurface never refuses a paint batch");
        s.draw_text(&h, 0, 0, &[Cell::default()]);
        s.end(h);
    }
}
