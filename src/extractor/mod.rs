//! # Results page extraction
//!
//! The [`Extractor`] fetches the single results page of a [`SearchQuery`] and turns the inline
//! metadata it carries into an ordered list of [`ImageCandidate`]s.
//!
//! Each element matched by the engine's metadata selector holds a small JSON object as its text.
//! The object is decoded and the configured URL field is read from it. Elements that fail to
//! decode are skipped one by one, so a single broken entry never costs the rest of the page.
//!
//! ```no_run
//! use image_search_downloader::{Extractor, SearchEngine, SearchQuery};
//! use std::time::Duration;
//!
//! async fn list_candidates() {
//!     let ext = Extractor::new(SearchEngine::default(), Duration::from_secs(30)).unwrap();
//!     let query = SearchQuery::new("spacex wallpaper");
//!
//!     let page = ext.fetch_document(&query).await.unwrap();
//!     for candidate in ext.extract(&page) {
//!         println!("{} {}", candidate.document_order, candidate.url);
//!     }
//! }
//! ```
use std::time::Duration;

use ahash::AHashSet;
use log::{debug, warn};
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::candidate::ImageCandidate;
use crate::engine::SearchEngine;
use crate::query::SearchQuery;

use self::error::{ExtractorError, ParseError};

pub mod error;

#[derive(Debug, Clone)]
pub struct Extractor {
    engine: SearchEngine,
    selector: Selector,
    client: Client,
}

impl Extractor {
    /// Builds the page client and compiles the engine's metadata selector.
    ///
    /// The page client keeps TLS certificate validation enabled.
    pub fn new(engine: SearchEngine, timeout: Duration) -> Result<Self, ExtractorError> {
        let selector = compile_selector(&engine.metadata_selector)?;

        let client = Client::builder()
            .user_agent(&engine.user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            engine,
            selector,
            client,
        })
    }

    #[inline]
    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// Performs exactly one GET for the results page and returns the raw body.
    pub async fn fetch_document(&self, query: &SearchQuery) -> Result<Vec<u8>, ExtractorError> {
        let target = query.request_target(&self.engine);
        debug!("Fetching results page {}", target);

        let res = self.client.get(&target).send().await?.error_for_status()?;
        let body = res.bytes().await?;

        debug!("Results page is {} bytes long", body.len());
        Ok(body.to_vec())
    }

    /// Extracts candidates in document order.
    ///
    /// Duplicate URLs keep only their first occurrence. A page with no metadata elements yields
    /// an empty list.
    pub fn extract(&self, document: &[u8]) -> Vec<ImageCandidate> {
        let html = Html::parse_document(&String::from_utf8_lossy(document));

        let mut seen = AHashSet::new();
        let mut candidates = Vec::new();
        let mut skipped = 0;

        for (idx, element) in html.select(&self.selector).enumerate() {
            let payload: String = element.text().collect();

            match decode_metadata(&payload, &self.engine.url_field) {
                Ok(url) => {
                    if !seen.insert(url.clone()) {
                        debug!("Duplicate image URL {} at element {}", url, idx);
                        continue;
                    }
                    candidates.push(ImageCandidate {
                        url,
                        document_order: candidates.len(),
                    });
                }
                Err(error) => {
                    skipped += 1;
                    warn!("Skipping metadata element {}: {}", idx, error);
                }
            }
        }

        debug!(
            "Extracted {} candidates ({} elements skipped)",
            candidates.len(),
            skipped
        );
        candidates
    }

    /// [`fetch_document`](Self::fetch_document) followed by [`extract`](Self::extract).
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<ImageCandidate>, ExtractorError> {
        let document = self.fetch_document(query).await?;
        Ok(self.extract(&document))
    }
}

pub(crate) fn compile_selector(raw: &str) -> Result<Selector, ExtractorError> {
    Selector::parse(raw).map_err(|err| ExtractorError::InvalidSelector {
        selector: raw.to_string(),
        message: format!("{:?}", err),
    })
}

/// Decodes one inline payload and reads `field` from it.
pub fn decode_metadata(payload: &str, field: &str) -> Result<String, ParseError> {
    let value: Value = serde_json::from_str(payload.trim())?;

    let Some(object) = value.as_object() else {
        return Err(ParseError::NotAnObject);
    };

    match object.get(field).and_then(Value::as_str) {
        Some(url) if !url.trim().is_empty() => Ok(url.trim().to_string()),
        _ => Err(ParseError::MissingField {
            field: field.to_string(),
        }),
    }
}
