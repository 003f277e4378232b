use derive_more::{Display, Error, From};

#[derive(Debug, Display, Error, From)]
pub enum WorkerError {
    #[display("session stack is already {max} deep")]
    #[from(ignore)]
    SessionStackFull { max: usize },
    #[display("no session has been opened yet")]
    NoSession,
    #[display("session error: {_0}")]
    Session(vtsession::SessionError),
    #[display("grid error: {_0}")]
    Grid(vtgrid::GridError),
}
