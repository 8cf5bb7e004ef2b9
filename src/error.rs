use thiserror::Error;

use crate::point::Point;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("position {0} is out of bounds")]
    OutOfBounds(Point),
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("grid expansion is locked")]
    ExpansionLocked,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unexpected group of {0} points at one height")]
    UnexpectedGroupSize(usize),
}

pub type Result<T, E = GridError> = std::result::Result<T, E>;
