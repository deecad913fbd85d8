use std::io;
use thiserror::Error;

pub mod formatting;
pub mod queues;
pub mod table;
pub mod ticker;
pub mod watch;

pub use formatting::*;
pub use queues::*;
pub use table::*;
pub use ticker::*;
pub use watch::*;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse vmstat value: {0}")]
    ParseError(String),
    #[error("vmstat field not found: {0}")]
    FieldNotFound(String),
    #[error("Unknown column key: {0}")]
    UnknownColumn(String),
    #[error("Invalid column group: {0}")]
    InvalidGroup(String),
}

pub type Result<T> = std::result::Result<T, WatchError>;
