//! Transcript data loader
//!
//! Fetches `/assets/data/transcripts/{id}.json` once per page session and
//! keeps the parsed record for reuse. Concurrent loads of the same id share
//! one in-flight request.
//!
//! Failures never escape: a bad status, a network error or a malformed record
//! is logged and reported as `None`, and nothing is cached for that id.
//!
//! ```
//! use futures::executor::block_on;
//! use futures::future::{FutureExt, LocalBoxFuture};
//! use transcript_explorer::error::LoadError;
//! use transcript_explorer::loader::{Fetch, FetchResponse, TranscriptLoader};
//!
//! struct Static;
//!
//! impl Fetch for Static {
//!     fn get(&self, _url: &str) -> LocalBoxFuture<'static, Result<FetchResponse, LoadError>> {
//!         let body = r#"{"title": "Spring", "segments": [{"index": 0, "words": "hello"}]}"#;
//!         async move { Ok(FetchResponse { status: 200, body: body.to_string() }) }.boxed_local()
//!     }
//! }
//!
//! let loader = TranscriptLoader::new(Static, "");
//! let record = block_on(loader.load("int01")).unwrap();
//! assert_eq!(record.segments[0].words, "hello");
//! ```

use crate::dom::{Document, Query};
use crate::error::LoadError;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Characters of a segment quoted in a mark's link label.
const LABEL_PREVIEW_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub words: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

impl Segment {
    /// Tooltip for the segment's timeline mark.
    pub fn tooltip(&self) -> String {
        if self.tags.is_empty() {
            self.words.clone()
        } else {
            format!("{} (Subjects: {})", self.words, self.tags.join(", "))
        }
    }

    /// Accessible label for the link wrapping the segment's mark.
    pub fn jump_label(&self) -> String {
        let opening: String = self.words.chars().take(LABEL_PREVIEW_CHARS).collect();
        format!(
            "Jump to this line (starting with '{}...') in the webpage for this transcript",
            opening
        )
    }
}

/// One transcript as published by the site build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interviewee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub segments: Vec<Segment>,
}

impl TranscriptRecord {
    /// Interviewee name, falling back to the title. Empty strings count as
    /// missing.
    pub fn display_name(&self) -> Option<&str> {
        fn present(name: &Option<String>) -> Option<&str> {
            name.as_deref().filter(|n| !n.is_empty())
        }
        present(&self.interviewee).or_else(|| present(&self.title))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP GET seam; the browser shell implements it with `window.fetch`.
pub trait Fetch {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse, LoadError>>;
}

type PendingLoad = Shared<LocalBoxFuture<'static, Option<Rc<TranscriptRecord>>>>;

pub struct TranscriptLoader<F> {
    fetch: F,
    base_url: String,
    cache: RefCell<HashMap<String, Rc<TranscriptRecord>>>,
    pending: RefCell<HashMap<String, PendingLoad>>,
}

impl<F: Fetch> TranscriptLoader<F> {
    /// `base_url` is the document's `<base href>`, or empty.
    pub fn new(fetch: F, base_url: &str) -> Self {
        Self {
            fetch,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: RefCell::new(HashMap::new()),
            pending: RefCell::new(HashMap::new()),
        }
    }

    pub fn url_for(&self, id: &str) -> String {
        format!("{}/assets/data/transcripts/{}.json", self.base_url, id)
    }

    pub fn cached(&self, id: &str) -> Option<Rc<TranscriptRecord>> {
        self.cache.borrow().get(id).cloned()
    }

    /// The cached record for `id`, fetching it first if needed.
    pub async fn load(&self, id: &str) -> Option<Rc<TranscriptRecord>> {
        if let Some(hit) = self.cached(id) {
            tracing::trace!(transcript = id, "transcript cache hit");
            return Some(hit);
        }

        let request = {
            let mut pending = self.pending.borrow_mut();
            pending
                .entry(id.to_string())
                .or_insert_with(|| self.request(id))
                .clone()
        };
        let record = request.await;

        self.pending.borrow_mut().remove(id);
        if let Some(record) = &record {
            self.cache.borrow_mut().insert(id.to_string(), Rc::clone(record));
        }
        record
    }

    /// Load every id in order, one request at a time.
    pub async fn load_all(&self, ids: &[String]) {
        if ids.is_empty() {
            tracing::error!("No available transcripts defined.");
            return;
        }
        for id in ids {
            self.load(id).await;
        }
        tracing::info!(requested = ids.len(), cached = self.cache.borrow().len(), "transcripts loaded");
    }

    /// Rewrite mark tooltips and link labels from cached records.
    ///
    /// Charts name their transcript in `data-transcript-id`; marks name their
    /// segment position in `data-segment-index`. Anything unresolvable is
    /// skipped.
    pub fn refresh_tooltips<D: Document>(&self, doc: &mut D) {
        for chart in doc.query_all(None, &Query::tag_class("svg", crate::page::classes::CHART)) {
            let Some(id) = doc.attribute(&chart, "data-transcript-id") else { continue };
            let Some(record) = self.cached(&id) else { continue };

            for mark in doc.query_all(Some(&chart), &Query::tag("rect")) {
                let Some(segment) = doc
                    .attribute(&mark, "data-segment-index")
                    .and_then(|raw| raw.trim().parse::<usize>().ok())
                    .and_then(|i| record.segments.get(i))
                else {
                    continue;
                };
                doc.set_attribute(&mark, "title", &segment.tooltip());
                if let Some(link) = doc.closest(&mark, &Query::tag("a")) {
                    doc.set_attribute(&link, "aria-label", &segment.jump_label());
                }
            }
        }
    }

    fn request(&self, id: &str) -> PendingLoad {
        let url = self.url_for(id);
        let id = id.to_string();
        let response = self.fetch.get(&url);
        async move {
            match read_record(response.await) {
                Ok(record) => {
                    tracing::info!(transcript = %id, segments = record.segments.len(), "loaded transcript");
                    Some(Rc::new(record))
                }
                Err(e) => {
                    tracing::error!(transcript = %id, url = %url, error = %e, "error loading transcript");
                    None
                }
            }
        }
        .boxed_local()
        .shared()
    }
}

fn read_record(response: Result<FetchResponse, LoadError>) -> Result<TranscriptRecord, LoadError> {
    let response = response?;
    if !response.is_success() {
        return Err(LoadError::Status(response.status));
    }
    Ok(serde_json::from_str(&response.body)?)
}
