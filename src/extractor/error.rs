use std::io;

use thiserror::Error;

/// Errors that stop the extraction stage as a whole.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The results page could not be fetched: connection failure, timeout or non-success status.
    #[error("Failed to fetch search results page: {0}")]
    ConnectionError(#[from] reqwest::Error),

    #[error("Invalid metadata selector \"{selector}\": {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("No search engine named \"{name}\"")]
    UnknownEngine { name: String },

    #[error("Failed to read engine definitions from {path}: {source}")]
    EngineConfigRead { path: String, source: io::Error },

    #[error("Failed to parse engine definitions: {0}")]
    EngineConfigParse(#[from] toml::de::Error),
}

/// Failure to decode the metadata of a single element.
///
/// These never leave the extractor: the element is logged and skipped.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed metadata payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Metadata payload is not an object")]
    NotAnObject,

    #[error("Metadata is missing the \"{field}\" field")]
    MissingField { field: String },
}
