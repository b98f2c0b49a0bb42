use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    StorageRead,
    StorageWrite,
    Decode,
    Config,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct BlockerError {
    pub code: ErrorCode,
    pub message: String,
}

impl BlockerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn storage_read(err: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::StorageRead, err.to_string())
    }

    pub fn storage_write(err: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::StorageWrite, err.to_string())
    }

    pub fn is_storage(&self) -> bool {
        matches!(self.code, ErrorCode::StorageRead | ErrorCode::StorageWrite)
    }
}

impl From<serde_json::Error> for BlockerError {
    fn from(value: serde_json::Error) -> Self {
        Self::new(ErrorCode::Decode, value.to_string())
    }
}
