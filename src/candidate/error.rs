use std::io;

use thiserror::Error;

/// Failure while downloading a single candidate.
#[derive(Error, Debug)]
pub enum CandidateError {
    #[error("Failed to connect to download URL: {source}")]
    ConnectionFail {
        #[from]
        source: reqwest::Error,
    },

    #[error("Image host returned status {status}")]
    RemoteStatus { status: u16 },

    #[error("Error while fetching chunk: {message}")]
    ChunkDownloadFail { message: String },

    #[error("Failed to access file: {source}")]
    FileIOError {
        #[from]
        source: io::Error,
    },
}

impl CandidateError {
    /// Whether the failure comes from the local destination rather than the remote host.
    #[inline]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::FileIOError { .. })
    }
}
