//! # Image Search Downloader
//!
//! image_search_downloader fetches the results page of an image search, pulls the full
//! resolution image URLs out of the metadata embedded in it and saves a bounded number of them
//! to a local directory under sequential, collision-free file names.
//!
//! Downloads can run concurrently while keeping the numbering identical to a one-at-a-time run.
pub mod candidate;
pub mod cli;
pub mod engine;
pub mod extractor;
pub mod logging;
pub mod progress;
pub mod progress_bars;
pub mod query;
pub mod queue;
pub mod shutdown;

// Export the main stages
pub use engine::SearchEngine;
pub use extractor::Extractor;
pub use query::SearchQuery;

// Export main worker queue
pub use queue::{OutputDir, Queue, QueueOpts};

pub use candidate::extension::AllowedExtensions;
pub use candidate::{ImageCandidate, NamePattern};

pub use queue::error::{QueueError, RunFailure};
pub use queue::summary::{DownloadRecord, Outcome, RunSummary};

pub use shutdown::{SharedShutdown, Shutdown};
