use derive_more::{Display, Error};

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[display("failed to allocate grid storage")]
    Alloc,
}
