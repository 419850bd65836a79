//! URL state store
//!
//! Filter, search and scroll state is mirrored into the query string so a
//! view can be shared or restored with back/forward. Every mutation replaces
//! the current history entry; nothing is ever pushed.
//!
//! ```
//! use transcript_explorer::url::{MemoryHistory, Param, UrlStore};
//!
//! let mut url = UrlStore::new(MemoryHistory::new("/items/int01.html?filter=q1"));
//! assert_eq!(url.get(Param::Filter), Some("q1"));
//!
//! url.set(Param::Query, Some("river"));
//! url.set(Param::Filter, None);
//! assert_eq!(url.history().current(), "/items/int01.html?q=river");
//! ```

use std::fmt;

/// The query parameters the controllers read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// Free-text search term
    Query,
    /// Active tag class
    Filter,
    /// Active interview / transcript id
    Id,
    /// Line element id to scroll to on load
    Line,
}

impl Param {
    pub fn as_str(self) -> &'static str {
        match self {
            Param::Query => "q",
            Param::Filter => "filter",
            Param::Id => "id",
            Param::Line => "line",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The browser location/history seam.
pub trait History {
    fn pathname(&self) -> String;

    /// Query string, with or without the leading `?`.
    fn search(&self) -> String;

    /// Fragment, with or without the leading `#`.
    fn hash(&self) -> String;

    /// Replace the current entry's URL without navigating.
    fn replace_state(&mut self, url: &str);
}

/// History double that records every replaced URL.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    pathname: String,
    search: String,
    hash: String,
    replaced: Vec<String>,
}

impl MemoryHistory {
    /// Start from a relative URL such as `/items/a.html?q=x#line3`.
    pub fn new(url: &str) -> Self {
        let (rest, hash) = match url.split_once('#') {
            Some((rest, hash)) => (rest, hash.to_string()),
            None => (url, String::new()),
        };
        let (pathname, search) = match rest.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (rest.to_string(), String::new()),
        };
        Self { pathname, search, hash, replaced: Vec::new() }
    }

    /// Every URL passed to `replace_state`, oldest first.
    pub fn replaced(&self) -> &[String] {
        &self.replaced
    }

    /// Path plus query string as the address bar would show it.
    pub fn current(&self) -> String {
        if self.search.is_empty() {
            self.pathname.clone()
        } else {
            format!("{}?{}", self.pathname, self.search)
        }
    }
}

impl History for MemoryHistory {
    fn pathname(&self) -> String {
        self.pathname.clone()
    }

    fn search(&self) -> String {
        self.search.clone()
    }

    fn hash(&self) -> String {
        self.hash.clone()
    }

    fn replace_state(&mut self, url: &str) {
        let without_hash = url.split('#').next().unwrap_or_default();
        let (path, query) = without_hash.split_once('?').unwrap_or((without_hash, ""));
        self.pathname = path.to_string();
        self.search = query.to_string();
        self.replaced.push(url.to_string());
    }
}

/// Ordered view of the query string, written back on every change.
#[derive(Debug)]
pub struct UrlStore<H> {
    history: H,
    params: Vec<(String, String)>,
}

impl<H: History> UrlStore<H> {
    pub fn new(history: H) -> Self {
        let search = history.search();
        let params = match serde_urlencoded::from_str::<Vec<(String, String)>>(
            search.trim_start_matches('?'),
        ) {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!(error = %e, search = %search, "ignoring unparseable query string");
                Vec::new()
            }
        };
        Self { history, params }
    }

    pub fn get(&self, key: Param) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key.as_str())
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Set or clear `key`. `None` and empty values remove it.
    pub fn set(&mut self, key: Param, value: Option<&str>) {
        match value.filter(|v| !v.is_empty()) {
            Some(value) => {
                let name = key.as_str();
                match self.params.iter().position(|(k, _)| k == name) {
                    Some(first) => {
                        self.params[first].1 = value.to_string();
                        let mut seen = 0usize;
                        self.params.retain(|(k, _)| {
                            if k != name {
                                return true;
                            }
                            seen += 1;
                            seen == 1
                        });
                    }
                    None => self.params.push((name.to_string(), value.to_string())),
                }
            }
            None => self.params.retain(|(k, _)| k != key.as_str()),
        }
        self.commit();
    }

    pub fn remove(&mut self, key: Param) {
        self.set(key, None);
    }

    /// Percent-decoded fragment without `#`, if any.
    ///
    /// Decoded like `decodeURIComponent`: `+` and `&` stay literal. A
    /// fragment that decodes to nothing reads as `None`.
    pub fn hash(&self) -> Option<String> {
        let raw = self.history.hash();
        let raw = raw.trim_start_matches('#');
        let decoded = match urlencoding::decode(raw) {
            Ok(decoded) => decoded.into_owned(),
            Err(e) => {
                tracing::warn!(error = %e, fragment = raw, "fragment is not valid UTF-8 once decoded");
                raw.to_string()
            }
        };
        Some(decoded).filter(|fragment| !fragment.is_empty())
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    fn commit(&mut self) {
        let query = match serde_urlencoded::to_string(&self.params) {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!(error = %e, "could not encode query string");
                return;
            }
        };
        let path = self.history.pathname();
        let url = if query.is_empty() { path } else { format!("{}?{}", path, query) };
        self.history.replace_state(&url);
    }
}
