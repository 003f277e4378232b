#![warn(clippy::pedantic)]

mod encode;
mod keycode;

pub use crate::encode::encode_key;
pub use crate::keycode::KeyCode;
