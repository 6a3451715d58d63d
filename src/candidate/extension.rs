//! # Extension filtering
//!
//! [`AllowedExtensions`] decides whether a candidate is worth downloading, based only on the
//! extension found at the end of its URL path. Matching is case-insensitive.
use ahash::AHashSet;
use log::debug;
use reqwest::Url;

pub const DEFAULT_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedExtensions {
    set: AHashSet<String>,
}

impl Default for AllowedExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl AllowedExtensions {
    /// Lower-cases every entry and drops leading dots and blank entries.
    pub fn new<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = exts
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self { set }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Returns the extension, as written in the URL, when it belongs to the allow-set.
    pub fn accept(&self, url: &str) -> Option<String> {
        let Some(ext) = url_extension(url) else {
            debug!("No extension found in {}", url);
            return None;
        };

        if self.set.contains(&ext.to_lowercase()) {
            Some(ext)
        } else {
            debug!("Extension \"{}\" not allowed for {}", ext, url);
            None
        }
    }
}

/// Text after the last `.` of the final path segment, if any.
pub fn url_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;

    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_string()),
        _ => None,
    }
}
