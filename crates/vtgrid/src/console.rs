use std::collections::VecDeque;

use vtcolor::char_width;
use vtsurface::{Attr, AttrFlags, Cell, CursorKind, Surface};

use crate::error::GridError;
use crate::selection::Selection;

/// A scrollback-backed character grid.
///
/// Coordinates come in two flavors throughout this API: *virtual*
/// coordinates address the full ring including scrollback (row 0 is
/// the oldest retained line), *physical* coordinates are relative to
/// the current viewport (`physical_y = virtual_y - top`). Methods say
/// which one they take.
pub struct Console<S: Surface = vtsurface::NullSurface> {
    width: i32,
    height: i32,
    save_height: i32,
    virtual_height: i32,
    text_buffer: Vec<char>,
    attribute_buffer: Vec<Attr>,
    offset: i32,
    top: i32,
    cursor_x: i32,
    cursor_y: i32,
    save_cursor_x: i32,
    save_cursor_y: i32,
    attribute: Attr,
    scroll_y1: Option<i32>,
    scroll_y2: Option<i32>,
    selection: Option<Selection>,
    title: String,
    input_buffer: VecDeque<char>,
    show_cursor: bool,
    surface: Option<S>,
    gc: Option<S::PaintHandle>,
}

impl<S: Surface> Console<S> {
    #[must_use]
    pub fn new(width: i32, height: i32, save_height: i32) -> Self {
        let virtual_height = height + save_height;
        let size = (width * virtual_height).max(0) as usize;
        Console {
            width,
            height,
            save_height,
            virtual_height,
            text_buffer: vec!['\0'; size],
            attribute_buffer: vec![Attr::default(); size],
            offset: 0,
            top: 0,
            cursor_x: 0,
            cursor_y: 0,
            save_cursor_x: 0,
            save_cursor_y: 0,
            attribute: Attr::default(),
            scroll_y1: None,
            scroll_y2: None,
            selection: None,
            title: String::new(),
            input_buffer: VecDeque::new(),
            show_cursor: true,
            surface: None,
            gc: None,
        }
    }

    /// Attach a rendering surface, querying its true geometry and
    /// resizing to match if it differs from ours.
    pub fn attach(&mut self, mut surface: S) {
        let (w, h) = surface.get_size();
        self.surface = Some(surface);
        if w != self.width || h != self.height {
            let _ = self.resize0(w, h, h + self.save_height);
        }
        if let Some(s) = self.surface.as_mut() {
            s.move_cursor(CursorKind::Current, self.cursor_x, self.cursor_y);
            s.set_scroll_info(self.top, self.top + self.height);
            s.set_title(&self.title);
        }
    }

    pub fn detach(&mut self) -> Option<S> {
        self.gc = None;
        self.surface.take()
    }

    #[must_use]
    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn cursor(&self) -> (i32, i32) {
        (self.cursor_x, self.cursor_y - self.top)
    }

    /// Read the glyph and attribute at virtual `(x, y)`. The paint
    /// path reads the backing buffers directly; this is for tests and
    /// introspection.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Cell {
        let off = self.phys_offset(y);
        Cell {
            ch: self.text_buffer[(off + x) as usize],
            attr: self.attribute_buffer[(off + x) as usize],
        }
    }

    #[must_use]
    pub fn show_cursor(&self) -> bool {
        self.show_cursor
    }

    pub fn set_show_cursor(&mut self, show: bool) {
        self.show_cursor = show;
        if let Some(s) = self.surface.as_mut() {
            s.set_mode(vtsurface::ModeId::ShowCursor, show);
        }
    }

    /// Forward a mode change that the console itself has no state
    /// for (insert mode, mouse tracking, and the like) to the
    /// attached surface, if any.
    pub fn notify_mode(&mut self, mode: vtsurface::ModeId, value: bool) {
        if let Some(s) = self.surface.as_mut() {
            s.set_mode(mode, value);
        }
    }

    #[must_use]
    pub fn attribute(&self) -> Attr {
        self.attribute
    }

    pub fn set_attribute(&mut self, attribute: Attr) {
        self.attribute = attribute;
    }

    fn phys_offset(&self, virtual_y: i32) -> i32 {
        (virtual_y + self.offset).rem_euclid(self.virtual_height) * self.width
    }

    /// True width (1 or 2) of the glyph whose leading cell is at
    /// virtual `(x, y)`, with `x` snapped back to that leading cell if
    /// it landed on the trailing half of a double-width pair.
    fn adjust_to_char(&self, mut x: i32, y: i32) -> (i32, i32) {
        let off = self.phys_offset(y);
        if x == self.width {
            x -= 1;
        }
        if self.attribute_buffer[(off + x) as usize].is_no_char() && x > 0 {
            x -= 1;
        }
        let width = if self.attribute_buffer[(off + x) as usize].is_wide() {
            2
        } else {
            1
        };
        (x, width)
    }

    /// Snap a selection endpoint to a glyph boundary.
    ///
    /// `align` biases the snap: negative pulls the point backward (into
    /// the glyph under it), positive pushes it forward (past the glyph
    /// under it), zero leaves a point already on a boundary alone.
    /// `end` marks this as the inclusive-end endpoint rather than the
    /// start: after aligning, it is stepped back by one cell (wrapping
    /// to the previous row's last column at the start of a row), where
    /// the start endpoint instead wraps forward onto the next row when
    /// it lands past the last column.
    fn adjust_point_to_char(&self, end: bool, mut x: i32, mut y: i32, align: i32) -> (i32, i32) {
        let off = self.phys_offset(y);
        if align != 0 {
            if self.attribute_buffer[(off + x) as usize].is_no_char() {
                x += 1;
                while x < self.width {
                    if !self.attribute_buffer[(off + x) as usize].is_no_char() {
                        break;
                    }
                    x += 1;
                }
            } else if !self.attribute_buffer[(off + x) as usize].is_wide() {
                if align > 0 {
                    x += 1;
                }
                // A run of NUL padding just before `x` is either trailing
                // fill at the end of the line (keep the forward bias) or
                // a gap followed by more real text (undo the bias).
                if x > 0
                    && self.text_buffer[(off + x - 1) as usize] == '\0'
                    && !self.attribute_buffer[(off + x - 1) as usize].is_no_char()
                {
                    let mut t = x;
                    while t < self.width {
                        if self.text_buffer[(off + t) as usize] != '\0' {
                            t = x;
                            break;
                        }
                        t += 1;
                    }
                    x = t;
                }
            }
            if end {
                if x > 0 {
                    x -= 1;
                } else if y > 0 {
                    x = self.width - 1;
                    y -= 1;
                }
            } else if x >= self.width && y < self.top + self.height - 1 {
                x = 0;
                y += 1;
            }
        }
        (x, y)
    }

    pub fn begin(&mut self) {
        self.gc = self.surface.as_mut().and_then(Surface::begin);
        if self.show_cursor && self.surface.is_some() {
            let (x, w) = self.adjust_to_char(self.cursor_x, self.cursor_y);
            let y = self.cursor_y;
            if let Some(s) = self.surface.as_mut() {
                s.move_cursor(CursorKind::Current, -1, -1);
            }
            self.paint(x, y, x + w - 1, y);
        }
    }

    pub fn end(&mut self) {
        if self.show_cursor && self.surface.is_some() {
            let (x, w) = self.adjust_to_char(self.cursor_x, self.cursor_y);
            let y = self.cursor_y;
            if let Some(s) = self.surface.as_mut() {
                s.move_cursor(CursorKind::Current, x, y);
            }
            self.paint(x, y, x + w - 1, y);
        }
        if let (Some(handle), Some(s)) = (self.gc.take(), self.surface.as_mut()) {
            s.end(handle);
        }
    }

    fn paint(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        if self.gc.is_none() || self.surface.is_none() {
            return;
        }
        let width = (x2 - x1 + 1) as usize;
        let mut row = Vec::with_capacity(width);
        let mut y = y1;
        while y <= y2 {
            let off = self.phys_offset(y);
            row.clear();
            for x in x1..=x2 {
                let idx = (off + x) as usize;
                row.push(Cell {
                    ch: self.text_buffer[idx],
                    attr: self.attribute_buffer[idx],
                });
            }
            if let (Some(handle), Some(s)) = (self.gc.as_ref(), self.surface.as_mut()) {
                s.draw_text(handle, x1, y, &row);
            }
            y += 1;
        }
    }

    pub fn repaint(&mut self) {
        if self.surface.is_none() {
            return;
        }
        let handle = self.surface.as_mut().and_then(Surface::begin);
        let Some(handle) = handle else { return };
        self.gc = Some(handle);
        self.paint(0, self.top, self.width - 1, self.top + self.height - 1);
        if let (Some(handle), Some(s)) = (self.gc.take(), self.surface.as_mut()) {
            s.end(handle);
            s.set_scroll_info(self.top, self.top + self.height);
        }
    }

    /// Move the cursor to physical (viewport-relative) `(x, y)`.
    /// `-1` for either coordinate leaves it unchanged.
    pub fn move_cursor(&mut self, x: i32, y: i32) {
        if x >= 0 {
            self.cursor_x = x;
        }
        if y >= 0 {
            self.cursor_y = y + self.top;
        }
        self.clamp_cursor();
    }

    pub fn move_cursor_relative(&mut self, dx: i32, dy: i32) {
        self.cursor_x += dx;
        self.cursor_y += dy;
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        self.cursor_x = self.cursor_x.clamp(0, self.width - 1);
        self.cursor_y = self.cursor_y.clamp(self.top, self.top + self.height - 1);
    }

    pub fn save_cursor(&mut self) {
        self.save_cursor_x = self.cursor_x;
        self.save_cursor_y = self.cursor_y - self.top;
    }

    pub fn restore_cursor(&mut self) {
        self.cursor_x = self.save_cursor_x.min(self.width - 1);
        self.cursor_y = (self.save_cursor_y + self.top).min(self.top + self.height - 1);
    }

    pub fn forward_tabstops(&mut self, n: i32) {
        self.cursor_x = ((self.cursor_x + 8 * n) & !7).min(self.width - 1);
    }

    pub fn carriage_return(&mut self) {
        self.cursor_x = 0;
    }

    pub fn write(&mut self, text: &[char]) {
        let mut rest = text;
        while !rest.is_empty() {
            if let Some(sel) = self.selection {
                if sel.contains_row(self.cursor_y) {
                    self.clear_selection();
                }
            }
            let n = self.write0(rest);
            rest = &rest[n..];
            if !rest.is_empty() {
                tracing::trace!("console write wrapped to next line");
                self.carriage_return();
                self.line_feed();
            }
        }
    }

    fn write0(&mut self, text: &[char]) -> usize {
        let off = self.phys_offset(self.cursor_y);
        let mut new_x = self.cursor_x;
        let mut consumed = 0;

        // Writing into the trailing half of a double-width pair strands
        // its leading half without a partner; drop the pairing so the
        // leading cell doesn't keep claiming a width nothing backs.
        let start_idx = (off + new_x) as usize;
        if new_x > 0 && self.attribute_buffer[start_idx].is_no_char() {
            self.attribute_buffer[start_idx - 1] = self.attribute_buffer[start_idx - 1].without_width_flags();
        }

        for &wc in text {
            let cw = match char_width(wc) {
                0 => 1,
                w => i32::from(w),
            };
            if new_x + cw > self.width {
                break;
            }
            let idx = (off + new_x) as usize;
            self.text_buffer[idx] = wc;
            let mut attr = self.attribute;
            if cw > 1 {
                attr.flags.insert(AttrFlags::WIDE);
            }
            self.attribute_buffer[idx] = attr;
            if cw > 1 {
                let idx2 = idx + 1;
                self.text_buffer[idx2] = '\0';
                let mut attr2 = self.attribute;
                attr2.flags.insert(AttrFlags::NO_CHAR);
                self.attribute_buffer[idx2] = attr2;
            }
            new_x += cw;
            consumed += 1;
        }
        // Symmetrically, if the write stopped partway through what used
        // to be a pair, the orphaned trailing half must give up its
        // no-char flag so it paints and selects like any other cell.
        let end_idx = (off + new_x) as usize;
        if new_x < self.width && self.attribute_buffer[end_idx].is_no_char() {
            self.attribute_buffer[end_idx] = self.attribute_buffer[end_idx].without_width_flags();
        }

        if new_x > self.cursor_x {
            let y = self.cursor_y;
            self.paint(self.cursor_x, y, new_x - 1, y);
        }
        self.cursor_x = new_x;
        consumed
    }

    pub fn line_feed(&mut self) {
        if Some(self.cursor_y) == self.scroll_y2 {
            let y1 = self.scroll_y1;
            let y2 = self.scroll_y2;
            self.scroll(y1, y2, -1);
            return;
        }
        if self.cursor_y < self.top + self.height - 1 {
            self.cursor_y += 1;
            return;
        }
        if self.scroll_y1.is_some() {
            return;
        }
        if self.top + self.height < self.virtual_height {
            self.top += 1;
            self.cursor_y += 1;
            if let Some(s) = self.surface.as_mut() {
                s.set_scroll_info(self.top, self.top + self.height);
            }
            return;
        }
        self.offset += 1;
        if self.offset >= self.virtual_height {
            self.offset = 0;
        }
        let off = self.phys_offset(self.cursor_y);
        self.clear_buffer(off, self.width);
        if let Some(sel) = self.selection {
            if sel.y1 == 0 {
                self.selection = None;
            } else {
                self.selection = Some(Selection {
                    y1: sel.y1 - 1,
                    y2: sel.y2 - 1,
                    ..sel
                });
            }
        }
        if let Some(s) = self.surface.as_mut() {
            s.scroll(-1, -1, -1);
        }
    }

    pub fn reverse_index(&mut self) {
        if let Some(y1) = self.scroll_y1 {
            if self.cursor_y > y1 {
                self.cursor_y -= 1;
                return;
            }
        }
        let y1 = self.scroll_y1;
        let y2 = self.scroll_y2;
        self.scroll(y1, y2, 1);
    }

    pub fn erase_display(&mut self, mode: i32) {
        match mode {
            0 => {
                let y = self.cursor_y;
                self.erase_line0(self.cursor_x, self.width - 1, y);
                self.erase_display0(y + 1, self.top + self.height - 1);
            }
            1 => {
                let y = self.cursor_y;
                self.erase_display0(self.top, y);
                self.erase_line0(0, self.cursor_x, y);
            }
            2 => {
                self.erase_display0(self.top, self.top + self.height - 1);
            }
            _ => {}
        }
    }

    pub fn erase_line(&mut self, mode: i32) {
        let y = self.cursor_y;
        match mode {
            0 => self.erase_line0(self.cursor_x, self.width - 1, y),
            1 => self.erase_line0(0, self.cursor_x, y),
            2 => self.erase_line0(0, self.width - 1, y),
            _ => {}
        }
    }

    pub fn erase_chars(&mut self, n: i32) {
        let start = self.cursor_x;
        let end = (start + n - 1).max(start);
        let y = self.cursor_y;
        self.erase_line0(start, end, y);
    }

    fn erase_display0(&mut self, y1: i32, y2: i32) {
        if y2 < y1 {
            return;
        }
        let width = self.width;
        for y in y1..=y2 {
            let off = self.phys_offset(y);
            self.clear_buffer(off, width);
        }
        let bg = self.attribute.bg;
        if let (Some(_), Some(s)) = (self.gc.as_ref(), self.surface.as_mut()) {
            s.clear_rect(self.gc.as_ref().expect("checked above"), 0, y1, width - 1, y2, bg);
        }
    }

    fn erase_line0(&mut self, x1: i32, x2: i32, y: i32) {
        let off = self.phys_offset(y);
        let (x1, _) = self.adjust_to_char(x1, y);
        let (x2_snap, w2) = self.adjust_to_char(x2, y);
        let x2 = x2_snap + w2 - 1;
        self.clear_buffer(off + x1, x2 - x1 + 1);
        let bg = self.attribute.bg;
        if let (Some(_), Some(s)) = (self.gc.as_ref(), self.surface.as_mut()) {
            s.clear_rect(self.gc.as_ref().expect("checked above"), x1, y, x2, y, bg);
        }
    }

    pub fn delete_lines(&mut self, count: i32) {
        let start = self.cursor_y.max(self.scroll_y1.unwrap_or(self.cursor_y));
        let end = self.scroll_y2.unwrap_or(self.virtual_height - 1);
        self.scroll(Some(start), Some(end), -count);
    }

    pub fn insert_lines(&mut self, count: i32) {
        self.delete_lines(-count);
    }

    pub fn insert_chars(&mut self, count: i32) {
        let (x, y) = (self.cursor_x, self.cursor_y);
        self.move_chars(x, self.width - 1, y, count);
        if self.selection.is_some_and(|sel| sel.contains_row(y)) {
            self.clear_selection();
        }
    }

    pub fn delete_chars(&mut self, count: i32) {
        let (x, y) = (self.cursor_x, self.cursor_y);
        self.move_chars(x, self.width - 1, y, -count);
        if self.selection.is_some_and(|sel| sel.contains_row(y)) {
            self.clear_selection();
        }
    }

    fn move_chars(&mut self, x1: i32, x2: i32, y: i32, count: i32) {
        let off = self.phys_offset(y);
        let bg = self.attribute.bg;
        if count > 0 {
            if x2 - x1 - count + 1 > 0 {
                self.copy_buffer(off + x1 + count, off + x1, x2 - x1 - count + 1);
                self.clear_buffer(off + x1, count);
                self.paint(x1 + count, y, x2, y);
                if let (Some(_), Some(s)) = (self.gc.as_ref(), self.surface.as_mut()) {
                    s.clear_rect(self.gc.as_ref().expect("checked above"), x1, y, x1 + count - 1, y, bg);
                }
            } else {
                self.clear_buffer(off + x1, x2 - x1 + 1);
                if let (Some(_), Some(s)) = (self.gc.as_ref(), self.surface.as_mut()) {
                    s.clear_rect(self.gc.as_ref().expect("checked above"), x1, y, x2, y, bg);
                }
            }
        } else if x2 - x1 + count + 1 > 0 {
            self.copy_buffer(off + x1, off + x1 - count, x2 - x1 + count + 1);
            self.clear_buffer(off + x2 + count + 1, -count);
            self.paint(x1, y, x2 + count, y);
            if let (Some(_), Some(s)) = (self.gc.as_ref(), self.surface.as_mut()) {
                s.clear_rect(self.gc.as_ref().expect("checked above"), x2 + count + 1, y, x2, y, bg);
            }
        } else {
            self.clear_buffer(off + x1, x2 - x1 + 1);
            if let (Some(_), Some(s)) = (self.gc.as_ref(), self.surface.as_mut()) {
                s.clear_rect(self.gc.as_ref().expect("checked above"), x1, y, x2, y, bg);
            }
        }
    }

    /// Scroll `[y1, y2]` (virtual, inclusive) by `count` rows; `None`
    /// bounds mean "the viewport" / "the bottom of the ring".
    fn scroll(&mut self, y1: Option<i32>, y2: Option<i32>, count: i32) {
        if count == 0 {
            return;
        }
        let y1 = y1.unwrap_or(self.top);
        let y2 = y2.unwrap_or(self.virtual_height - 1);

        let mut scroll_height = y2 - y1 + 1;
        scroll_height -= count.abs();

        for i in 0..scroll_height.max(0) {
            let (src, dst) = if count > 0 {
                (
                    self.phys_offset(y2 - i - count),
                    self.phys_offset(y2 - i),
                )
            } else {
                (
                    self.phys_offset(y1 + i - count),
                    self.phys_offset(y1 + i),
                )
            };
            let width = self.width;
            self.copy_buffer(dst, src, width);
        }

        let clear_height = count.abs();
        let j = if count > 0 { y1 } else { y2 - clear_height + 1 };
        for i in 0..clear_height {
            let off = self.phys_offset(i + j);
            self.clear_buffer(off, self.width);
        }

        if self.surface.is_none() {
            return;
        }
        if scroll_height > 0 {
            if y1 == 0 && y2 == self.height {
                if let Some(s) = self.surface.as_mut() {
                    s.scroll(-1, -1, count);
                }
            } else if let Some(s) = self.surface.as_mut() {
                s.scroll(y1, y2, count);
            }
        }
        if clear_height <= 0 {
            return;
        }
        let width = self.width;
        let bg = self.attribute.bg;
        let handle = self.surface.as_mut().and_then(Surface::begin);
        if let Some(handle) = handle {
            if let Some(s) = self.surface.as_mut() {
                s.clear_rect(&handle, 0, j, width - 1, j + clear_height - 1, bg);
                s.end(handle);
            }
        }
    }

    fn clear_buffer(&mut self, offset: i32, count: i32) {
        let attr = self.attribute;
        for i in offset..offset + count {
            self.text_buffer[i as usize] = '\0';
            self.attribute_buffer[i as usize] = attr;
        }
    }

    fn copy_buffer(&mut self, dst_offset: i32, src_offset: i32, count: i32) {
        if dst_offset == src_offset || count <= 0 {
            return;
        }
        let dst = dst_offset as usize;
        let src = src_offset as usize;
        let count = count as usize;
        self.text_buffer.copy_within(src..src + count, dst);
        self.attribute_buffer.copy_within(src..src + count, dst);
    }

    pub fn set_save_height(&mut self, save_height: i32) -> Result<(), GridError> {
        self.resize0(self.width, self.height, self.height + save_height)?;
        self.save_height = save_height;
        Ok(())
    }

    /// Resize to a surface-reported `(width, height)`, keeping
    /// `save_height` scrollback rows.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<(), GridError> {
        let old_cursor_x = self.cursor_x.min(width - 1);
        let old_cursor_y = (self.cursor_y - self.top).min(height - 1);
        self.resize0(width, height, height + self.save_height)?;
        if let Some(s) = self.surface.as_mut() {
            s.move_cursor(CursorKind::Current, old_cursor_x, old_cursor_y + self.top);
            s.set_scroll_info(self.top, self.top + self.height);
        }
        Ok(())
    }

    fn resize0(&mut self, width: i32, height: i32, virtual_height: i32) -> Result<(), GridError> {
        let size = (width * virtual_height).max(0) as usize;
        let mut new_text: Vec<char> = Vec::new();
        new_text
            .try_reserve_exact(size)
            .map_err(|_| GridError::Alloc)?;
        new_text.resize(size, '\0');
        let mut new_attr: Vec<Attr> = Vec::new();
        new_attr
            .try_reserve_exact(size)
            .map_err(|_| GridError::Alloc)?;
        new_attr.resize(size, self.attribute);

        let had_old = !self.text_buffer.is_empty();
        let mut new_top = 0;
        let mut new_cursor_y = 0;
        if had_old {
            new_top = self.top;
            new_cursor_y = self.cursor_y;
            let mut copy_width = self.width.min(width);
            let mut copy_height = self.top + self.height;
            let mut copy_start = 0;

            if height > self.height {
                new_top -= height - self.height;
                if new_top < 0 {
                    new_top = 0;
                }
            }
            if new_cursor_y >= new_top + height {
                copy_height = self.cursor_y + 1;
                new_top = copy_height - height;
            }
            if copy_height > virtual_height {
                copy_start = copy_height - virtual_height;
                new_top = virtual_height - height;
                new_cursor_y -= copy_height - virtual_height;
                copy_height = virtual_height;
            }
            copy_width = copy_width.max(0);
            for y in 0..copy_height {
                let off = self.phys_offset(y + copy_start) as usize;
                let dst = (y * width) as usize;
                new_text[dst..dst + copy_width as usize]
                    .copy_from_slice(&self.text_buffer[off..off + copy_width as usize]);
                new_attr[dst..dst + copy_width as usize]
                    .copy_from_slice(&self.attribute_buffer[off..off + copy_width as usize]);
            }
            self.cursor_x = self.cursor_x.min(width - 1);
        } else {
            self.cursor_x = 0;
        }

        self.scroll_y1 = None;
        self.scroll_y2 = None;
        self.cursor_y = new_cursor_y;
        self.text_buffer = new_text;
        self.attribute_buffer = new_attr;
        self.top = new_top;
        self.offset = 0;
        self.width = width;
        self.height = height;
        self.virtual_height = virtual_height;
        Ok(())
    }

    /// Set the DEC scroll region from physical (viewport-relative)
    /// bounds. `None` resets to "no region" (the whole viewport).
    pub fn set_scroll_region(&mut self, bounds: Option<(i32, i32)>) {
        match bounds {
            None => {
                self.scroll_y1 = None;
                self.scroll_y2 = None;
            }
            Some((y1, y2)) => {
                if y1 > y2 || y1 > self.virtual_height - 1 || y2 > self.virtual_height - 1 {
                    return;
                }
                self.scroll_y1 = Some(self.top + y1);
                self.scroll_y2 = Some(self.top + y2);
            }
        }
        self.cursor_x = 0;
        self.cursor_y = self.top;
    }

    pub fn full_reset(&mut self) {
        self.set_scroll_region(None);
        self.attribute = Attr::default();
        let total = self.width * self.virtual_height;
        self.clear_buffer(0, total);
        self.top = 0;
        self.cursor_x = 0;
        self.cursor_y = 0;
        if let Some(s) = self.surface.as_mut() {
            s.move_cursor(CursorKind::Current, 0, 0);
            s.set_scroll_info(self.top, self.top + self.height);
        }
        let bg = self.attribute.bg;
        let (width, height) = (self.width, self.height);
        let handle = self.surface.as_mut().and_then(Surface::begin);
        if let Some(handle) = handle {
            if let Some(s) = self.surface.as_mut() {
                s.clear_rect(&handle, 0, self.top, width - 1, self.top + height - 1, bg);
                s.end(handle);
            }
        }
    }

    pub fn append_input(&mut self, text: &[char]) {
        self.input_buffer.extend(text.iter().copied());
    }

    pub fn read_input(&mut self, out: &mut [char]) -> usize {
        let mut n = 0;
        while n < out.len() {
            let Some(c) = self.input_buffer.pop_front() else {
                break;
            };
            out[n] = c;
            n += 1;
        }
        n
    }

    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    #[must_use]
    pub fn has_input(&self) -> bool {
        !self.input_buffer.is_empty()
    }

    fn clear_selection(&mut self) {
        if let Some(sel) = self.selection.take() {
            if let Some(s) = self.surface.as_mut() {
                s.move_cursor(CursorKind::SelectionStart, -1, -1);
                s.move_cursor(CursorKind::SelectionEnd, -1, -1);
            }
            self.paint(0, sel.y1, self.width - 1, sel.y2);
        }
    }

    /// Set the selection from two endpoints in virtual coordinates,
    /// clamped into the grid, snapped to glyph boundaries (`a1`/`a2`
    /// bias the snap the same way as [`Self::adjust_point_to_char`]),
    /// and normalized to reading order. A collapsed or inverted range
    /// clears the selection.
    pub fn set_selection(&mut self, mut x1: i32, mut y1: i32, mut a1: i32, mut x2: i32, mut y2: i32, mut a2: i32) {
        if x1 < 0 {
            x1 = 0;
            if a1 > 0 {
                a1 = -1;
            }
        }
        if x1 >= self.width {
            x1 = self.width - 1;
            if a1 < 0 {
                a1 = 1;
            }
        }
        if y1 < 0 {
            y1 = 0;
            x1 = 0;
            if a1 > 0 {
                a1 = -1;
            }
        }
        if y1 >= self.virtual_height {
            x1 = self.width - 1;
            y1 = self.virtual_height - 1;
            if a1 < 0 {
                a1 = 1;
            }
        }
        if x2 < 0 {
            x2 = 0;
            if a2 > 0 {
                a2 = -1;
            }
        }
        if x2 >= self.width {
            x2 = self.width - 1;
            if a2 < 0 {
                a2 = 1;
            }
        }
        if y2 < 0 {
            y2 = 0;
            x2 = 0;
            if a2 > 0 {
                a2 = -1;
            }
        }
        if y2 >= self.top + self.height {
            x2 = self.width - 1;
            y2 = self.top + self.height - 1;
            if a2 < 0 {
                a2 = 1;
            }
        }

        (x1, y1) = self.adjust_point_to_char(false, x1, y1, a1);
        (x2, y2) = self.adjust_point_to_char(true, x2, y2, a2);

        let old = self.selection;
        self.selection = if y1 > y2 || (y1 == y2 && x1 >= x2) {
            None
        } else {
            Some(Selection { x1, y1, x2, y2 })
        };

        let Some((update_y1, update_y2)) = (match (old, self.selection) {
            (Some(o), Some(n)) => Some((o.y1.min(n.y1), o.y2.max(n.y2))),
            (Some(o), None) => Some((o.y1, o.y2)),
            (None, Some(n)) => Some((n.y1, n.y2)),
            (None, None) => None,
        }) else {
            return;
        };

        if let Some(s) = self.surface.as_mut() {
            let (sx1, sy1, sx2, sy2) = self
                .selection
                .map_or((-1, -1, -1, -1), |sel| (sel.x1, sel.y1, sel.x2, sel.y2));
            s.move_cursor(CursorKind::SelectionStart, sx1, sy1);
            s.move_cursor(CursorKind::SelectionEnd, sx2, sy2);
        }
        self.paint(0, update_y1, self.width - 1, update_y2);
    }

    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Extract the selected text. Trailing halves of double-width
    /// glyphs are skipped and control characters (code point < 0x20,
    /// including the NUL fill of an empty cell) become spaces.
    ///
    /// A row whose real content stops short of the last column gets a
    /// line break after it (`\r\n` rather than `\n` when `nl` is set);
    /// a row whose content reaches the last column is treated as a
    /// soft-wrapped continuation and flows straight into the next row
    /// with no break. The last row of the selection never gets a
    /// trailing break.
    #[must_use]
    pub fn copy_selection(&self, nl: bool) -> String {
        let Some(sel) = self.selection else {
            return String::new();
        };
        let mut out = String::new();
        let mut y = sel.y1;
        while y <= sel.y2 {
            let off = self.phys_offset(y);
            let row_start = if y == sel.y1 { sel.x1 } else { 0 };
            let row_end = if y == sel.y2 { sel.x2 } else { self.width - 1 };

            let mut last_char_x = row_start - 1;
            let mut x = row_start;
            while x <= row_end {
                let idx = (off + x) as usize;
                if !self.attribute_buffer[idx].is_no_char() && self.text_buffer[idx] != '\0' {
                    last_char_x = x;
                }
                x += 1;
            }
            let end_x = last_char_x;

            let mut x = row_start;
            while x <= end_x {
                let idx = (off + x) as usize;
                if self.attribute_buffer[idx].is_no_char() {
                    x += 1;
                    continue;
                }
                let ch = self.text_buffer[idx];
                out.push(if ch < ' ' { ' ' } else { ch });
                x += 1;
            }

            if end_x != self.width - 1 && y != sel.y2 {
                if nl {
                    out.push('\r');
                }
                out.push('\n');
            }
            y += 1;
        }
        out
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        if let Some(s) = self.surface.as_mut() {
            s.set_title(&self.title);
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn beep(&mut self) {
        if let Some(s) = self.surface.as_mut() {
            s.beep();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vtsurface::NullSurface;

    fn text(c: &Console<NullSurface>, row: i32) -> String {
        let off = c.phys_offset(c.top + row);
        (0..c.width)
            .map(|x| c.text_buffer[(off + x) as usize])
            .map(|ch| if ch == '\0' { ' ' } else { ch })
            .collect()
    }

    #[test]
    fn write_advances_cursor_and_stores_glyphs() {
        let mut c: Console<NullSurface> = Console::new(10, 3, 0);
        c.write(&['h', 'i']);
        assert_eq!(c.cursor(), (2, 0));
        assert_eq!(&text(&c, 0)[..2], "hi");
    }

    #[test]
    fn write_wraps_to_next_line_at_width() {
        let mut c: Console<NullSurface> = Console::new(3, 3, 0);
        c.write(&['a', 'b', 'c', 'd']);
        assert_eq!(&text(&c, 0), "abc");
        assert_eq!(&text(&c, 1)[..1], "d");
        assert_eq!(c.cursor(), (1, 1));
    }

    #[test]
    fn line_feed_scrolls_scrollback_once_full() {
        let mut c: Console<NullSurface> = Console::new(2, 2, 1);
        c.write(&['a', 'a']);
        c.carriage_return();
        c.line_feed();
        c.write(&['b', 'b']);
        c.carriage_return();
        c.line_feed();
        c.write(&['c', 'c']);
        // three lines written into a 2-row viewport with 1 row of
        // scrollback; the oldest line ("aa") must have scrolled into
        // the save buffer, and the viewport now shows "bb"/"cc".
        assert_eq!(&text(&c, 0), "bb");
        assert_eq!(&text(&c, 1), "cc");
    }

    #[test]
    fn double_width_glyph_occupies_two_cells() {
        let mut c: Console<NullSurface> = Console::new(10, 2, 0);
        c.write(&['\u{4e2d}']); // CJK ideograph, width 2
        assert_eq!(c.cursor(), (2, 0));
        let off = c.phys_offset(c.top);
        assert!(c.attribute_buffer[off as usize].is_wide());
        assert!(c.attribute_buffer[(off + 1) as usize].is_no_char());
    }

    #[test]
    fn erase_line_mode_2_clears_whole_row() {
        let mut c: Console<NullSurface> = Console::new(5, 2, 0);
        c.write(&['x', 'x', 'x']);
        c.erase_line(2);
        assert_eq!(&text(&c, 0), "     ");
    }

    #[test]
    fn insert_chars_shifts_existing_content_right() {
        let mut c: Console<NullSurface> = Console::new(5, 1, 0);
        c.write(&['a', 'b', 'c']);
        c.move_cursor(1, -1);
        c.insert_chars(1);
        assert_eq!(&text(&c, 0), "a bc ");
    }

    #[test]
    fn resize_preserves_viewport_content() {
        let mut c: Console<NullSurface> = Console::new(4, 2, 0);
        c.write(&['h', 'i']);
        c.resize(6, 3).unwrap();
        assert_eq!(c.size(), (6, 3));
        assert_eq!(&text(&c, 0)[..2], "hi");
    }

    #[test]
    fn scroll_region_constrains_line_feed_scroll() {
        let mut c: Console<NullSurface> = Console::new(3, 4, 0);
        c.set_scroll_region(Some((0, 1)));
        c.write(&['a']);
        c.line_feed();
        c.write(&['b']);
        c.line_feed();
        // scrolling happened inside rows 0..=1; row 2 never touched.
        assert_eq!(&text(&c, 2), "   ");
    }

    #[test]
    fn set_selection_clamps_and_normalizes() {
        let mut c: Console<NullSurface> = Console::new(10, 5, 0);
        c.set_selection(2, 1, 0, 5, 1, 0);
        assert!(c.has_selection());
        c.set_selection(5, 1, 0, 2, 1, 0);
        assert!(!c.has_selection());
    }

    #[test]
    fn set_selection_forward_align_past_the_last_column_wraps_to_next_row() {
        let mut c: Console<NullSurface> = Console::new(5, 2, 0);
        c.write(&['a', 'b']);
        // the start endpoint sits on blank fill at the last column with
        // a forward bias; it should carry onto the start of the next row
        // rather than landing past the edge of this one.
        c.set_selection(4, 0, 1, 4, 1, -1);
        let sel = c.selection().expect("selection expected");
        assert_eq!((sel.x1, sel.y1), (0, 1));
    }

    #[test]
    fn copy_selection_skips_no_char_halves_and_converts_controls() {
        let mut c: Console<NullSurface> = Console::new(10, 2, 0);
        c.write(&['\u{4e2d}', 'y']);
        c.carriage_return();
        c.line_feed();
        c.write(&['z']);
        c.set_selection(0, 0, -1, 1, 1, 1);
        assert_eq!(c.copy_selection(false), "中y\nz");
    }

    #[test]
    fn input_buffer_is_fifo() {
        let mut c: Console<NullSurface> = Console::new(10, 2, 0);
        c.append_input(&['a', 'b']);
        c.append_input(&['c']);
        let mut out = ['\0'; 2];
        assert_eq!(c.read_input(&mut out), 2);
        assert_eq!(out, ['a', 'b']);
        let mut out = ['\0'; 2];
        assert_eq!(c.read_input(&mut out), 1);
        assert_eq!(out[0], 'c');
    }
}
