//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while reading or writing vertex tables
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Write error: {message}")]
    WriteError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for meshcloud_core::Error {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Io(io) => meshcloud_core::Error::Io(io),
            IoError::FileNotFound { path } => meshcloud_core::Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found: {path}"),
            )),
            other => meshcloud_core::Error::InvalidData(other.to_string()),
        }
    }
}
