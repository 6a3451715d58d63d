//! # Candidates
//!
//! An [`ImageCandidate`] is an image URL found on the results page that was not yet filtered or
//! downloaded. Candidates are ordered by their position on the page, which is also the order in
//! which they are downloaded and numbered.
//!
//! [`NamePattern`] turns a sequence number into the local file name of a downloaded candidate.
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub mod error;
pub mod extension;

/// Image URL discovered on the results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub url: String,
    /// Position of the candidate among the extracted candidates, starting at 0.
    pub document_order: usize,
}

impl Display for ImageCandidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.document_order, self.url)
    }
}

/// Deterministic naming scheme for downloaded files.
///
/// Names look like `<prefix>-<seq><-suffix>.<ext>`, where `seq` is zero padded to the number of
/// decimal digits of the download limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    prefix: String,
    suffix: String,
    width: usize,
}

impl NamePattern {
    pub fn new(prefix: &str, suffix: &str, limit: u32) -> Self {
        let prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{}-", prefix)
        };
        let suffix = if suffix.is_empty() {
            String::new()
        } else {
            format!("-{}", suffix)
        };

        Self {
            prefix,
            suffix,
            width: limit.to_string().len(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn file_name(&self, sequence: u64, extension: &str) -> String {
        format!(
            "{}{:0width$}{}.{}",
            self.prefix,
            sequence,
            self.suffix,
            extension,
            width = self.width
        )
    }
}
