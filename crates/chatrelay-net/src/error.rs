use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("peer closed the connection")]
    Closed,
    #[error("declared frame length {declared} exceeds the {max} byte sanity cap")]
    Oversized { declared: usize, max: usize },
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}
