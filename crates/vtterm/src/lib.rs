#![warn(clippy::pedantic)]

mod flags;
mod state;
mod terminal;

pub use crate::flags::TerminalFlags;
pub use crate::state::ParserState;
pub use crate::terminal::{Key, Terminal};

pub use vtgrid::{Attr, AttrFlags, Console, GridError};
pub use vtkeys::KeyCode;
pub use vtsurface::{CursorKind, ModeId, NullSurface, Surface};
