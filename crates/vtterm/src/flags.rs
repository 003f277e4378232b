use bitflags::bitflags;

bitflags! {
    /// Terminal-level mode flags, distinct from the console's own
    /// cursor-visibility bit. Defaults to `META` alone, matching a
    /// freshly reset terminal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TerminalFlags: u8 {
        const ECHO        = 1 << 0;
        const META        = 1 << 1;
        const APPNUMPAD   = 1 << 2;
        /// Set when DECCKM (application cursor keys) is on, despite
        /// the name — mirrors the original driver's bit exactly.
        const NORMCURSOR  = 1 << 3;
        const INSERTMODE  = 1 << 4;
        const VT200MOUSE  = 1 << 5;
    }
}

impl Default for TerminalFlags {
    fn default() -> Self {
        TerminalFlags::META
    }
}
