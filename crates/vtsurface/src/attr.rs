use vtcolor::Color;

bitflags::bitflags! {
    /// Single-bit rendering attributes of a [`crate::Cell`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AttrFlags: u8 {
        /// Leading half of a double-width glyph.
        const WIDE        = 1 << 0;
        /// Trailing half of a double-width glyph; the cell's code point
        /// is conventionally zero and must never be painted on its own.
        const NO_CHAR     = 1 << 1;
        const BRIGHT      = 1 << 2;
        const DIM         = 1 << 3;
        const UNDERSCORE  = 1 << 4;
        const BLINK       = 1 << 5;
        const REVERSE     = 1 << 6;
        const HIDDEN      = 1 << 7;
    }
}

/// The rendering attributes attached to every grid cell: colors plus
/// single-bit flags. Cheap to copy; cleared cells use [`Attr::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
}

impl Default for Attr {
    fn default() -> Self {
        Attr {
            fg: Color::DEFAULT,
            bg: Color::DEFAULT,
            flags: AttrFlags::empty(),
        }
    }
}

impl Attr {
    #[must_use]
    pub fn is_wide(self) -> bool {
        self.flags.contains(AttrFlags::WIDE)
    }

    #[must_use]
    pub fn is_no_char(self) -> bool {
        self.flags.contains(AttrFlags::NO_CHAR)
    }

    /// An attribute identical to this one but with the wide/no-char
    /// pairing bits cleared, used when a cell stops being part of a
    /// double-width pair (e.g. overwritten by a narrow glyph).
    #[must_use]
    pub fn without_width_flags(mut self) -> Self {
        self.flags.remove(AttrFlags::WIDE | AttrFlags::NO_CHAR);
        self
    }
}
