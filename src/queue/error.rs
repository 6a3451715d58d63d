use std::io;

use thiserror::Error;

use crate::candidate::error::CandidateError;
use crate::extractor::error::ExtractorError;

use super::summary::RunSummary;

/// Conditions that abort a run.
#[allow(clippy::enum_variant_names)]
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("The search query has no keywords")]
    EmptyQuery,

    #[error("Failed to create destination directory {path}. error: {message}")]
    DirCreationError { path: String, message: String },

    #[error("Destination {path} exists and is not a directory")]
    NotADirectory { path: String },

    #[error("Failed to access {path}: {source}")]
    Filesystem { path: String, source: io::Error },

    #[error("Failed to save image from {url}: {source}")]
    DestinationWriteFail { url: String, source: CandidateError },

    #[error("Failed to build download client: {0}")]
    ClientBuildError(#[from] reqwest::Error),

    #[error(transparent)]
    ExtractorError(#[from] ExtractorError),
}

/// A fatal [`QueueError`] together with everything the run achieved before it.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct RunFailure {
    pub partial: RunSummary,
    #[source]
    pub error: QueueError,
}
