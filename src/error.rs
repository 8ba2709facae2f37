//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("Malformed image payload: {0}")]
    MalformedImage(String),

    #[error("Generation backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Generation backend rejected request (status {status}): {message}")]
    BackendRejected { status: u16, message: String },

    #[error("Generation produced no usable output: {0}")]
    EmptyGeneration(String),

    #[error("Scene reference fetch failed: {0}")]
    SceneFetch(String),

    #[error("Asset upload failed: {0}")]
    Upload(String),

    #[error("Record store error: {0}")]
    Record(String),
}

pub type Result<T> = std::result::Result<T, Error>;
