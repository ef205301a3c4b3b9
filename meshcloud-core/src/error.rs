//! Error types for meshcloud

use thiserror::Error;

/// Main error type for meshcloud operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Object not found in scene: {0}")]
    ObjectNotFound(String),

    #[error("Texture '{texture}' not found for object '{object}'")]
    TextureNotFound { object: String, texture: String },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Visualization error: {0}")]
    Visualization(String),
}

/// Result type alias for meshcloud operations
pub type Result<T> = std::result::Result<T, Error>;
