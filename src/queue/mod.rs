//! # Download queue
//!
//! The [`Queue`] drives one run from query to files on disk:
//!
//! 1. resolve and create the output directory,
//! 2. seed the sequence counter with the number of entries already in it,
//! 3. fetch the results page and extract its candidates,
//! 4. walk the candidates in document order, filtering, downloading and naming them until the
//!    download limit is reached or the candidates run out,
//! 5. report how many files were saved and how long it took.
//!
//! Downloads run through a bounded pool of `sim_downloads` workers. Every in-flight download
//! holds a reservation against the limit, and results are committed in document order, so the
//! numbering is the same whatever the pool size: the n-th successful candidate on the page gets
//! the n-th free sequence number.
//!
//! # Example usage
//!
//! ```no_run
//! use image_search_downloader::*;
//! use std::path::Path;
//!
//! async fn download() {
//!     let timeout = QueueOpts::default().timeout;
//!     let extractor = Extractor::new(SearchEngine::default(), timeout).unwrap();
//!
//!     let opts = QueueOpts {
//!         limit: 20,
//!         prefix: String::from("rocket"),
//!         ..Default::default()
//!     };
//!
//!     let qw = Queue::new(extractor, opts, None).unwrap();
//!     let query = SearchQuery::new("spacex wallpaper");
//!
//!     match qw.download(&query, Path::new("./"), None).await {
//!         Ok(summary) => println!("{} files downloaded", summary.downloaded()),
//!         Err(failure) => println!("{} ({} files saved)", failure, failure.partial.downloaded()),
//!     }
//! }
//! ```
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::FuturesOrdered;
use futures::StreamExt;
use log::{debug, error, info, warn};
use reqwest::Client;
use tokio::fs::{create_dir_all, metadata, read_dir, remove_file};
use tokio::time::Instant;

use crate::candidate::error::CandidateError;
use crate::candidate::extension::AllowedExtensions;
use crate::candidate::{ImageCandidate, NamePattern};
use crate::extractor::Extractor;
use crate::progress::{no_op_progress_listener, LogType, SharedProgressListener};
use crate::query::SearchQuery;
use crate::shutdown::SharedShutdown;

use self::error::{QueueError, RunFailure};
use self::folder::StagingFile;
use self::summary::{DownloadRecord, Outcome, RunSummary};

pub mod error;
mod folder;
pub mod summary;

pub const DEFAULT_LIMIT: u32 = 100;

/// Options for one [`Queue`].
#[derive(Debug, Clone)]
pub struct QueueOpts {
    /// Max number of successful downloads per run.
    pub limit: u32,
    /// Number of concurrent downloads.
    pub sim_downloads: u8,
    /// Connect and read timeout for image downloads.
    pub timeout: Duration,
    pub prefix: String,
    pub suffix: String,
    pub allowed_extensions: AllowedExtensions,
}

impl Default for QueueOpts {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            sim_downloads: 5,
            timeout: Duration::from_secs(30),
            prefix: String::new(),
            suffix: String::new(),
            allowed_extensions: AllowedExtensions::default(),
        }
    }
}

/// Output directory of a run, with the number of entries it held before the run started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir {
    pub path: PathBuf,
    pub existing: u64,
    /// The directory did not exist and was created by [`Queue::prepare_output`].
    pub created: bool,
}

impl OutputDir {
    /// Logs where the run saves its files.
    ///
    /// Useful once a logger is installed that was not there while the directory was prepared.
    pub fn log_state(&self) {
        if self.created {
            info!("\"{}\" directory created", self.path.display());
        } else {
            info!("The directory \"{}\" already exists.", self.path.display());
        }
        info!(
            "{} entries already in {}",
            self.existing,
            self.path.display()
        );
    }
}

/// Per-run mutable state. Owned by [`Queue::run`] and nothing else.
#[derive(Debug)]
struct RunContext {
    output_dir: PathBuf,
    /// Highest sequence number in use.
    counter: u64,
    downloaded: u64,
    records: Vec<DownloadRecord>,
    cancelled: bool,
}

impl RunContext {
    fn new(output: &OutputDir) -> Self {
        Self {
            output_dir: output.path.clone(),
            counter: output.existing,
            downloaded: 0,
            records: Vec::new(),
            cancelled: false,
        }
    }

    fn record(&mut self, candidate: ImageCandidate, outcome: Outcome) {
        self.records.push(DownloadRecord {
            document_order: candidate.document_order,
            source_url: candidate.url,
            outcome,
        });
    }

    fn finish(mut self, start: Instant) -> RunSummary {
        self.records.sort_by_key(|r| r.document_order);
        RunSummary {
            output_dir: self.output_dir,
            records: self.records,
            elapsed: start.elapsed(),
            cancelled: self.cancelled,
        }
    }
}

/// A download that left the pool, tagged with what it was for.
struct Fetched {
    candidate: ImageCandidate,
    extension: String,
    result: Result<StagingFile, CandidateError>,
}

pub struct Queue {
    extractor: Extractor,
    /// Image client. Certificate validation is off: image hosts often serve broken chains.
    client: Client,
    limit: u32,
    sim_downloads: u8,
    names: NamePattern,
    allowed_extensions: AllowedExtensions,
    progress_listener: SharedProgressListener,
    shutdown: Option<SharedShutdown>,
}

impl Queue {
    /// Set up the queue for download
    pub fn new(
        extractor: Extractor,
        options: QueueOpts,
        progress_listener: Option<SharedProgressListener>,
    ) -> Result<Self, QueueError> {
        let client = Client::builder()
            .user_agent(&extractor.engine().user_agent)
            .danger_accept_invalid_certs(true)
            .connect_timeout(options.timeout)
            .read_timeout(options.timeout)
            .build()?;

        let limit = options.limit.max(1);

        Ok(Self {
            extractor,
            client,
            limit,
            sim_downloads: options.sim_downloads.max(1),
            names: NamePattern::new(&options.prefix, &options.suffix, limit),
            allowed_extensions: options.allowed_extensions,
            progress_listener: progress_listener.unwrap_or_else(no_op_progress_listener),
            shutdown: None,
        })
    }

    /// Lets `shutdown` stop runs of this queue early.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    #[inline]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// `precise` when given, otherwise `base` joined with the query's directory name.
    pub fn resolve_output_dir(query: &SearchQuery, base: &Path, precise: Option<&Path>) -> PathBuf {
        match precise {
            Some(dir) => dir.to_path_buf(),
            None => query.output_dir(base),
        }
    }

    /// Creates `dir` if needed and counts what is already inside it.
    ///
    /// Staging files left behind by an interrupted run are removed and not counted.
    pub async fn prepare_output(dir: PathBuf) -> Result<OutputDir, QueueError> {
        let created = Self::create_out(&dir).await?;
        let existing = Self::count_entries(&dir).await?;
        debug!("{} entries already in {}", existing, dir.display());

        Ok(OutputDir {
            path: dir,
            existing,
            created,
        })
    }

    /// Resolves and prepares the output directory, then [`run`](Self::run)s.
    pub async fn download(
        &self,
        query: &SearchQuery,
        base: &Path,
        precise: Option<&Path>,
    ) -> Result<RunSummary, RunFailure> {
        let dir = Self::resolve_output_dir(query, base, precise);

        let prepared = if query.is_empty() {
            Err(QueueError::EmptyQuery)
        } else {
            Self::prepare_output(dir.clone()).await
        };

        match prepared {
            Ok(output) => self.run(query, &output).await,
            Err(error) => {
                error!("{}", error);
                Err(RunFailure {
                    partial: RunSummary {
                        output_dir: dir,
                        ..Default::default()
                    },
                    error,
                })
            }
        }
    }

    /// Runs the fetch, extract and download stages into an already prepared directory.
    pub async fn run(
        &self,
        query: &SearchQuery,
        output: &OutputDir,
    ) -> Result<RunSummary, RunFailure> {
        let mut ctx = RunContext::new(output);
        let start = Instant::now();

        let result = self.run_stages(query, &mut ctx).await;
        self.progress_listener.main_done();
        let summary = ctx.finish(start);

        match result {
            Ok(()) => {
                info!(
                    "{} images downloaded in {:.2} seconds",
                    summary.downloaded(),
                    summary.elapsed_secs()
                );
                Ok(summary)
            }
            Err(error) => {
                error!("{}", error);
                self.progress_listener
                    .log_event(LogType::Error, &query.dir_name(), &error.to_string());
                Err(RunFailure {
                    partial: summary,
                    error,
                })
            }
        }
    }

    async fn run_stages(
        &self,
        query: &SearchQuery,
        ctx: &mut RunContext,
    ) -> Result<(), QueueError> {
        if query.is_empty() {
            return Err(QueueError::EmptyQuery);
        }

        let document = tokio::select! {
            biased;
            _ = self.cancelled() => {
                ctx.cancelled = true;
                return Ok(());
            }
            doc = self.extractor.fetch_document(query) => doc?,
        };

        let candidates = self.extractor.extract(&document);
        if candidates.is_empty() {
            info!("No image candidates found for \"{}\"", query.keywords().join(" "));
            return Ok(());
        }

        self.progress_listener.set_main_total(candidates.len() as u64);
        self.download_candidates(candidates, ctx).await
    }

    async fn download_candidates(
        &self,
        candidates: Vec<ImageCandidate>,
        ctx: &mut RunContext,
    ) -> Result<(), QueueError> {
        let output_dir = ctx.output_dir.clone();
        let mut pending = candidates.into_iter();
        let mut in_flight = FuturesOrdered::new();

        loop {
            // Reservations never exceed what is left of the limit.
            while in_flight.len() < self.sim_downloads as usize
                && ctx.downloaded + (in_flight.len() as u64) < u64::from(self.limit)
            {
                let Some(candidate) = pending.next() else {
                    break;
                };

                match self.allowed_extensions.accept(&candidate.url) {
                    Some(extension) => {
                        in_flight.push_back(self.fetch(candidate, extension, &output_dir))
                    }
                    None => {
                        self.progress_listener.main_tick();
                        ctx.record(candidate, Outcome::Rejected);
                    }
                }
            }

            let next = tokio::select! {
                biased;
                _ = self.cancelled() => {
                    warn!("Run cancelled, dropping {} in-flight downloads", in_flight.len());
                    ctx.cancelled = true;
                    return Ok(());
                }
                next = in_flight.next() => next,
            };

            let Some(fetched) = next else {
                break;
            };
            self.progress_listener.main_tick();
            self.settle(fetched, ctx).await?;
        }

        debug!(
            "Finished with {} downloads, {} candidates left unvisited",
            ctx.downloaded,
            pending.len()
        );
        Ok(())
    }

    async fn fetch(
        &self,
        candidate: ImageCandidate,
        extension: String,
        output_dir: &Path,
    ) -> Fetched {
        let result =
            folder::fetch(&self.client, &candidate, output_dir, &self.progress_listener).await;
        Fetched {
            candidate,
            extension,
            result,
        }
    }

    /// Commits or records one finished download. Called in document order.
    async fn settle(&self, fetched: Fetched, ctx: &mut RunContext) -> Result<(), QueueError> {
        let Fetched {
            candidate,
            extension,
            result,
        } = fetched;

        let staging = match result {
            Ok(staging) => staging,
            Err(source) if source.is_local() => {
                ctx.record(
                    candidate.clone(),
                    Outcome::Failed {
                        reason: source.to_string(),
                    },
                );
                return Err(QueueError::DestinationWriteFail {
                    url: candidate.url,
                    source,
                });
            }
            Err(err) => {
                warn!("Failed to download {}: {}", candidate.url, err);
                self.progress_listener
                    .log_event(LogType::Warning, &candidate.url, &err.to_string());
                ctx.record(
                    candidate,
                    Outcome::Failed {
                        reason: err.to_string(),
                    },
                );
                return Ok(());
            }
        };

        let (sequence, dest) = folder::free_destination(&ctx.output_dir, ctx.counter + 1, |seq| {
            self.names.file_name(seq, &extension)
        })
        .await
        .map_err(|source| QueueError::Filesystem {
            path: ctx.output_dir.display().to_string(),
            source,
        })?;

        staging
            .commit(&dest)
            .await
            .map_err(|source| QueueError::Filesystem {
                path: dest.display().to_string(),
                source,
            })?;

        ctx.counter = sequence;
        ctx.downloaded += 1;

        info!(
            "\"{}\" image downloaded from \"{}\"",
            dest.display(),
            candidate.url
        );
        if let Some(name) = dest.file_name() {
            self.progress_listener
                .log_event(LogType::Success, &name.to_string_lossy(), "downloaded");
        }
        ctx.record(
            candidate,
            Outcome::Success {
                sequence,
                path: dest,
            },
        );
        Ok(())
    }

    /// Resolves when this queue's shutdown handle fires. Never resolves without one.
    async fn cancelled(&self) {
        match &self.shutdown {
            Some(shutdown) => shutdown.wait().await,
            None => std::future::pending().await,
        }
    }

    /// Creates the output directory and tells whether it had to. An existing directory is
    /// fine, anything else is fatal.
    async fn create_out(dir: &Path) -> Result<bool, QueueError> {
        match metadata(dir).await {
            Ok(meta) if meta.is_dir() => {
                debug!("Target dir {} already exists", dir.display());
                return Ok(false);
            }
            Ok(_) => {
                return Err(QueueError::NotADirectory {
                    path: dir.display().to_string(),
                })
            }
            Err(error) if error.kind() == ErrorKind::NotFound => (),
            Err(error) => {
                return Err(QueueError::DirCreationError {
                    path: dir.display().to_string(),
                    message: error.to_string(),
                })
            }
        }

        match create_dir_all(dir).await {
            Ok(()) => {
                info!("\"{}\" directory created", dir.display());
                Ok(true)
            }
            // Created concurrently between the check and the call.
            Err(error) if error.kind() == ErrorKind::AlreadyExists && dir.is_dir() => {
                info!("The directory \"{}\" already exists.", dir.display());
                Ok(false)
            }
            Err(error) => Err(QueueError::DirCreationError {
                path: dir.display().to_string(),
                message: error.to_string(),
            }),
        }
    }

    async fn count_entries(dir: &Path) -> Result<u64, QueueError> {
        let to_error = |source| QueueError::Filesystem {
            path: dir.display().to_string(),
            source,
        };

        let mut entries = read_dir(dir).await.map_err(to_error)?;
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await.map_err(to_error)? {
            let name = entry.file_name();
            if StagingFile::is_staging_name(&name.to_string_lossy()) {
                match remove_file(entry.path()).await {
                    Ok(()) => warn!(
                        "Removed leftover partial download {}",
                        entry.path().display()
                    ),
                    Err(error) => warn!(
                        "Failed to remove leftover partial download {}: {}",
                        entry.path().display(),
                        error
                    ),
                }
                continue;
            }
            count += 1;
        }
        Ok(count)
    }
}
