//! Streaming a single candidate into the output directory.
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use futures::StreamExt;
use log::{debug, warn};
use reqwest::Client;
use tokio::fs::{rename, try_exists, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::candidate::error::CandidateError;
use crate::candidate::ImageCandidate;
use crate::progress::SharedProgressListener;

/// Capacity of the write buffer in front of the destination file.
const CHUNK_SIZE: usize = 1024;

const STAGING_PREFIX: &str = ".isdl-";
const STAGING_SUFFIX: &str = ".part";

/// Partially written download living under a hidden name in the output directory.
///
/// Dropping it without [`commit`](Self::commit) deletes the file, so every exit path of a
/// download that did not finish (errors, early returns, a cancelled future) cleans up after
/// itself.
#[derive(Debug)]
pub(crate) struct StagingFile {
    path: PathBuf,
    committed: bool,
}

impl StagingFile {
    pub(crate) fn path_for(output_dir: &Path, candidate: &ImageCandidate) -> PathBuf {
        output_dir.join(format!(
            "{}{}-{}{}",
            STAGING_PREFIX,
            process::id(),
            candidate.document_order,
            STAGING_SUFFIX
        ))
    }

    /// Whether `name` looks like a staging file, possibly left behind by a killed run.
    pub(crate) fn is_staging_name(name: &str) -> bool {
        name.len() > STAGING_PREFIX.len() + STAGING_SUFFIX.len()
            && name.starts_with(STAGING_PREFIX)
            && name.ends_with(STAGING_SUFFIX)
    }

    /// Creates the file, failing if something already sits at `path`.
    async fn create(path: PathBuf) -> io::Result<(Self, File)> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        Ok((
            Self {
                path,
                committed: false,
            },
            file,
        ))
    }

    /// Moves the finished download to `dest`.
    pub(crate) async fn commit(mut self, dest: &Path) -> io::Result<()> {
        rename(&self.path, dest).await?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed partial download {}", self.path.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => (),
            Err(err) => debug!(
                "Failed to remove partial download {}: {}",
                self.path.display(),
                err
            ),
        }
    }
}

/// Downloads `candidate` into a staging file inside `output_dir`.
///
/// The body is written chunk by chunk as it arrives and is never held in memory as a whole.
pub(crate) async fn fetch(
    client: &Client,
    candidate: &ImageCandidate,
    output_dir: &Path,
    progress_listener: &SharedProgressListener,
) -> Result<StagingFile, CandidateError> {
    debug!("Fetching {}", candidate);

    let res = client.get(&candidate.url).send().await?;

    if !res.status().is_success() {
        debug!(
            "Image source {} returned status {}",
            candidate.url,
            res.status().as_str()
        );
        return Err(CandidateError::RemoteStatus {
            status: res.status().as_u16(),
        });
    }

    let (staging, file) = StagingFile::create(StagingFile::path_for(output_dir, candidate)).await?;
    debug!("Writing to staging file {}", staging.path.display());

    let dl_updater =
        progress_listener.add_download_task(candidate.url.clone(), res.content_length());

    let written = async {
        let mut bw = BufWriter::with_capacity(CHUNK_SIZE, file);
        let mut downloaded_bytes = 0;
        let mut stream = res.bytes_stream();

        while let Some(item) = stream.next().await {
            let mut chunk = item.map_err(|e| CandidateError::ChunkDownloadFail {
                message: e.to_string(),
            })?;
            downloaded_bytes += chunk.len() as u64;
            dl_updater.set_progress(downloaded_bytes);

            bw.write_all_buf(&mut chunk).await?;
        }

        bw.flush().await?;
        debug!("Fetched {} bytes from {}", downloaded_bytes, candidate.url);
        Ok::<(), CandidateError>(())
    }
    .await;

    dl_updater.finish();
    written.map(|()| staging)
}

/// First sequence number at or after `from` whose file name is not taken yet.
pub(crate) async fn free_destination<F>(
    output_dir: &Path,
    from: u64,
    name_for: F,
) -> io::Result<(u64, PathBuf)>
where
    F: Fn(u64) -> String,
{
    let mut seq = from;
    loop {
        let dest = output_dir.join(name_for(seq));
        if !try_exists(&dest).await? {
            return Ok((seq, dest));
        }
        warn!("{} already exists, trying the next number", dest.display());
        seq += 1;
    }
}
