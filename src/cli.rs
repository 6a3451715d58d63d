use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use directories::UserDirs;

use crate::candidate::extension::AllowedExtensions;
use crate::queue::{QueueOpts, DEFAULT_LIMIT};
use crate::query::SearchQuery;

#[derive(Parser, Debug)]
#[clap(name = "Image Search Downloader", author, version, about, long_about = None)]
pub struct Cli {
    /// Keywords to search, separated by spaces or commas
    #[clap(value_parser, required = true)]
    pub query: Vec<String>,

    /// Max number of images to download
    #[clap(
        short,
        long,
        value_name = "NUMBER",
        value_parser(clap::value_parser!(u32).range(1..)),
        default_value_t = DEFAULT_LIMIT,
        help_heading = "DOWNLOAD"
    )]
    pub limit: u32,

    /// Directory where a folder named after the query will be created [default: home directory]
    #[clap(
        short,
        long,
        value_name = "PATH",
        help_heading = "SAVE",
        conflicts_with("precise_output")
    )]
    pub output: Option<PathBuf>,

    /// Save images directly into this directory without creating additional dirs
    #[clap(
        short = 'O',
        value_name = "PATH",
        help_heading = "SAVE",
        conflicts_with("output")
    )]
    pub precise_output: Option<PathBuf>,

    /// Allowed extensions to download, separated by commas
    #[clap(
        short,
        long,
        value_name = "EXTS",
        value_delimiter = ',',
        default_value = "jpg,jpeg,png,bmp",
        help_heading = "DOWNLOAD"
    )]
    pub extensions: Vec<String>,

    /// Prefix for image filenames
    #[clap(short, long, default_value = "", help_heading = "SAVE")]
    pub prefix: String,

    /// Suffix for image filenames
    #[clap(short, long, default_value = "", help_heading = "SAVE")]
    pub suffix: String,

    /// Write a log file into the output directory
    #[clap(short = 'L', long, action, help_heading = "GENERAL")]
    pub logger: bool,

    /// Number of simultaneous downloads
    ///
    /// [max: 20]
    #[clap(
        short = 'd',
        value_name = "NUMBER",
        value_parser(clap::value_parser!(u8).range(1..=20)),
        default_value_t = 5,
        help_heading = "DOWNLOAD"
    )]
    pub simultaneous_downloads: u8,

    /// Connection timeout in seconds
    #[clap(
        short,
        long,
        value_name = "SECONDS",
        default_value_t = 30,
        help_heading = "DOWNLOAD"
    )]
    pub timeout: u64,

    /// Search engine to query
    #[clap(long, default_value = "google", help_heading = "GENERAL")]
    pub engine: String,

    /// TOML file with additional search engine definitions
    #[clap(long, value_name = "PATH", help_heading = "GENERAL")]
    pub engine_config: Option<PathBuf>,
}

impl Cli {
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery::new(&self.query.join(" "))
    }

    /// Base directory for the query folder.
    pub fn base_dir(&self) -> Result<PathBuf, io::Error> {
        if let Some(path) = &self.output {
            return Ok(path.to_owned());
        }

        UserDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "home directory not found"))
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn queue_opts(&self) -> QueueOpts {
        QueueOpts {
            limit: self.limit,
            sim_downloads: self.simultaneous_downloads,
            timeout: self.timeout(),
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            allowed_extensions: AllowedExtensions::new(&self.extensions),
        }
    }
}
