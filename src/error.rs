//! Library error types.

use thiserror::Error;

use crate::models::FullMsgId;

#[derive(Debug, Error)]
pub enum ListError {
    #[error("memento id {0:?} does not belong to this conversation")]
    ForeignMemento(FullMsgId),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ListError>;
