//! # Search engine definitions
//!
//! A [`SearchEngine`] holds every engine-specific detail the downloader relies on: where the
//! results page lives, which parameters select image mode, which user agent gets the full
//! page instead of a reduced one, and how the inline image metadata is marked up.
//!
//! The built-in definitions live in [`DEFAULT_ENGINES`]. Extra definitions can be loaded from a
//! TOML file with [`SearchEngine::load_table`].
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::extractor::error::ExtractorError;

/// Desktop browser identification. The results page degrades for unknown clients.
pub(crate) const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/63.0.3239.108 Safari/537.36";

pub static DEFAULT_ENGINES: Lazy<HashMap<String, SearchEngine>> = Lazy::new(|| {
    let mut hmap = HashMap::with_capacity(1);
    hmap.insert(String::from("google"), SearchEngine::default());
    hmap
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEngine {
    pub name: String,
    /// Endpoint of the results page, without query string.
    pub base_url: String,
    /// Fixed `(key, value)` pair that switches the engine to image results.
    pub mode_param: (String, String),
    /// Name of the parameter carrying the encoded keywords.
    pub query_param: String,
    pub user_agent: String,
    /// CSS selector matching every element that carries one image's metadata.
    pub metadata_selector: String,
    /// Key of the full resolution image URL inside the decoded metadata.
    pub url_field: String,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self {
            name: String::from("google"),
            base_url: String::from("https://www.google.com/search"),
            mode_param: (String::from("tbm"), String::from("isch")),
            query_param: String::from("q"),
            user_agent: DESKTOP_UA.to_string(),
            metadata_selector: String::from("div.rg_meta"),
            url_field: String::from("ou"),
        }
    }
}

impl Display for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Deserialize)]
struct EngineTable {
    #[serde(default)]
    engine: Vec<SearchEngine>,
}

impl SearchEngine {
    /// Looks up `name` first in `extra` and then in [`DEFAULT_ENGINES`].
    pub fn resolve(name: &str, extra: &[SearchEngine]) -> Result<Self, ExtractorError> {
        if let Some(engine) = extra.iter().find(|e| e.name == name) {
            return Ok(engine.clone());
        }

        DEFAULT_ENGINES
            .get(name)
            .cloned()
            .ok_or_else(|| ExtractorError::UnknownEngine {
                name: name.to_string(),
            })
    }

    /// Parses a list of `[[engine]]` tables.
    pub fn parse_table(raw: &str) -> Result<Vec<Self>, ExtractorError> {
        let table: EngineTable = toml::from_str(raw)?;
        Ok(table.engine)
    }

    pub async fn load_table(path: &Path) -> Result<Vec<Self>, ExtractorError> {
        debug!("Reading engine definitions from {}", path.display());
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ExtractorError::EngineConfigRead {
                path: path.display().to_string(),
                source,
            })?;

        Self::parse_table(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_engine_is_registered() {
        let engine = SearchEngine::resolve("google", &[]).unwrap();
        assert_eq!(engine, SearchEngine::default());
        assert_eq!(engine.metadata_selector, "div.rg_meta");
        assert_eq!(engine.url_field, "ou");
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let res = SearchEngine::resolve("altavista", &[]);
        assert!(matches!(res, Err(ExtractorError::UnknownEngine { .. })));
    }

    #[test]
    fn table_entries_take_precedence() {
        let raw = r#"
            [[engine]]
            name = "google"
            base_url = "http://127.0.0.1:8080/search"
            mode_param = ["tbm", "isch"]
            query_param = "q"
            user_agent = "test"
            metadata_selector = "div.meta"
            url_field = "src"
        "#;

        let extra = SearchEngine::parse_table(raw).unwrap();
        let engine = SearchEngine::resolve("google", &extra).unwrap();

        assert_eq!(engine.base_url, "http://127.0.0.1:8080/search");
        assert_eq!(engine.url_field, "src");
    }
}
