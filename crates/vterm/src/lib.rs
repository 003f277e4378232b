#![warn(clippy::pedantic)]

pub use vtcolor::Color;
pub use vtgrid::{Attr, AttrFlags, Console, GridError};
pub use vtsurface::{Cell, CursorKind, ModeId, NullSurface, Surface};
pub use vtterm::{Key, KeyCode, ParserState, Terminal, TerminalFlags};
pub use vtworker::{Worker, WorkerError, WorkerEvent};
