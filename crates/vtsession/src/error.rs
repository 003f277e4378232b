use derive_more::{Display, Error, From};

#[derive(Debug, Display, Error, From)]
pub enum SessionError {
    #[display("end of stream")]
    Eof,
    #[display("io error: {_0}")]
    Io(std::io::Error),
    #[display("malformed option string at byte {pos}")]
    #[from(ignore)]
    BadOption { pos: usize },
}
