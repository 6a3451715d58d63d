//! Keyword query representation and request target encoding.
use std::path::{Path, PathBuf};

use crate::engine::SearchEngine;

/// Encoded form of the whitespace between two keywords.
const ENCODED_SPACE: &str = "%20";

/// Free text keywords, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keywords: Vec<String>,
}

impl SearchQuery {
    /// Splits `raw` on whitespace and commas.
    pub fn new(raw: &str) -> Self {
        let keywords = raw
            .replace(',', " ")
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Self { keywords }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    #[inline]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Keywords joined by single `%20` tokens.
    pub fn encoded(&self) -> String {
        self.keywords
            .iter()
            .map(|kw| urlencoding::encode(kw).into_owned())
            .collect::<Vec<_>>()
            .join(ENCODED_SPACE)
    }

    /// Full request target for `engine`: endpoint, image mode parameter and encoded keywords.
    pub fn request_target(&self, engine: &SearchEngine) -> String {
        let (mode_key, mode_value) = &engine.mode_param;
        format!(
            "{}?{}={}&{}={}",
            engine.base_url,
            mode_key,
            mode_value,
            engine.query_param,
            self.encoded()
        )
    }

    /// Directory name derived from the query, keywords joined with underscores.
    pub fn dir_name(&self) -> String {
        self.keywords.join("_")
    }

    /// `base` joined with [`dir_name`](Self::dir_name).
    pub fn output_dir(&self, base: &Path) -> PathBuf {
        base.join(self.dir_name())
    }
}
