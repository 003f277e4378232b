#![warn(clippy::pedantic)]

mod attr;
mod cell;
mod surface;

pub use crate::attr::{Attr, AttrFlags};
pub use crate::cell::Cell;
pub use crate::surface::{CursorKind, ModeId, NullSurface, Surface};
