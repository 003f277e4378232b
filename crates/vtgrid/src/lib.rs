#![warn(clippy::pedantic)]

mod console;
mod error;
mod selection;

pub use crate::console::Console;
pub use crate::error::GridError;
pub use crate::selection::Selection;

pub use vtsurface::{Attr, AttrFlags, Cell, CursorKind, ModeId, NullSurface, Surface};
