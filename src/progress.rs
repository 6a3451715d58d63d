use std::fmt::Debug;
use std::sync::Arc;

/// Type of log event, used for styling messages in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    /// General informational message.
    Info,
    /// A candidate was downloaded and saved.
    Success,
    /// A candidate failed but the run goes on.
    Warning,
    /// The run itself hit a fatal condition.
    Error,
}

/// Trait for reporting progress over the candidates of one run.
/// All methods should be thread-safe.
pub trait ProgressListener: Send + Sync + Debug {
    /// Sets the total number of candidates the run may look at.
    fn set_main_total(&self, total: u64);
    /// Signals that one candidate reached its final outcome.
    fn main_tick(&self);
    /// Signals that the run is over.
    fn main_done(&self);

    /// Adds a byte progress task for a single download.
    fn add_download_task(
        &self,
        name: String,
        total_size: Option<u64>,
    ) -> Box<dyn DownloadProgressUpdater>;

    /// Logs a categorized event message to be displayed in the progress UI.
    fn log_event(&self, log_type: LogType, target: &str, message: &str);
}

/// Trait for updating the progress of an individual download.
pub trait DownloadProgressUpdater: Send + Sync + Debug {
    /// Sets the current number of bytes downloaded for this task.
    fn set_progress(&self, bytes_downloaded: u64);
    /// Signals that this download task is finished (successfully or not).
    fn finish(&self);
}

/// Default listener for library consumers that don't display anything.
#[derive(Debug, Clone)]
pub struct NoOpProgressListener;

impl ProgressListener for NoOpProgressListener {
    fn set_main_total(&self, _total: u64) {}
    fn main_tick(&self) {}
    fn main_done(&self) {}
    fn add_download_task(
        &self,
        _name: String,
        _total_size: Option<u64>,
    ) -> Box<dyn DownloadProgressUpdater> {
        Box::new(NoOpDownloadProgressUpdater)
    }
    fn log_event(&self, _log_type: LogType, _target: &str, _message: &str) {}
}

#[derive(Debug, Clone)]
pub struct NoOpDownloadProgressUpdater;

impl DownloadProgressUpdater for NoOpDownloadProgressUpdater {
    fn set_progress(&self, _bytes_downloaded: u64) {}
    fn finish(&self) {}
}

pub type SharedProgressListener = Arc<dyn ProgressListener>;

pub fn no_op_progress_listener() -> SharedProgressListener {
    Arc::new(NoOpProgressListener)
}
