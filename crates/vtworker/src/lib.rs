#![warn(clippy::pedantic)]

mod codec;
mod error;
mod event;
mod request;
mod worker;

pub use crate::codec::Utf8Decoder;
pub use crate::error::WorkerError;
pub use crate::event::WorkerEvent;
pub use crate::worker::Worker;

pub use vtterm::Key;
