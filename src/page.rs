//! Page context shared by every controller
//!
//! A [`Page`] owns the document, the URL store and the site configuration.
//! Controllers receive it explicitly instead of reaching for globals, which
//! is what lets them run against [`MemoryDocument`](crate::dom::MemoryDocument)
//! in tests.
//!
//! Work the browser would do "a moment later" (focus after layout settles, a
//! second announcement) is returned as [`Scheduled`] effects. The shell
//! decides when to run them and calls [`Page::apply`].

use crate::config::SiteConfig;
use crate::dom::Document;
use crate::url::{History, UrlStore};

/// Fixed element ids the page templates provide.
pub mod ids {
    pub const CONTENTS_CONTAINER: &str = "contents-container";
    pub const FILTERS: &str = "filters";
    pub const QUICKSEARCH: &str = "quicksearch";
    pub const SEARCH_RESULTS: &str = "searchResults";
    pub const NUMBER_OF: &str = "numberof";
    pub const LINE_COUNT: &str = "linecount";
    pub const FILTERSEARCH_DROPDOWN: &str = "filtersearch-dropdown";
    pub const FILTER_STATUS: &str = "filter-status";
    pub const SEARCH_STATUS: &str = "search-status-announcer";
    pub const TRANSCRIPT_CONTENTS: &str = "transcript-contents";
    pub const RESET: &str = "reset";
    pub const SCROLLY: &str = "scrolly";
    pub const UPPER_CONTENT: &str = "upper-content";
    pub const FILTER_TAB: &str = "filter-tab";
    pub const FILTERS_SEARCH: &str = "filters-search";
    pub const STEP0: &str = "step0";
    pub const COLOR_VIZ: &str = "colorViz";
    pub const GO_BUTTON: &str = "goButton";
    pub const SCROLL_TO_TOP: &str = "scroll-to-top";
    pub const TRANSCRIPT_CONTENT_CONTAINER: &str = "transcript-content-container";
}

/// Class names the controllers read or toggle.
pub mod classes {
    pub const LINE: &str = "line";
    pub const WORDS: &str = "words";
    pub const LEGEND: &str = "legend";
    pub const TOGGLE_INT: &str = "toggle_int";
    pub const CHART: &str = "chart";
    pub const CONTENTS_DIV: &str = "contentsdiv";
    pub const VIZ_DIV: &str = "vizdiv";

    pub const FEATURED: &str = "featured";
    pub const BORDER_FEATURED: &str = "border-featured";
    pub const MUTED: &str = "text-muted";
    pub const SMALL: &str = "small";
    pub const EMPHASIS: &str = "text-danger";
    pub const TRUNCATE: &str = "text-truncate";
    pub const D_NONE: &str = "d-none";
    pub const HIDDEN: &str = "hidden";
    pub const RETRACTED: &str = "retracted";
    pub const MEDIA_PINNED: &str = "media-scroll-wrapper";

    /// Mark highlighted because its line matched a search.
    pub const HILITE: &str = "hilite";
    /// Prefix of the per-tag "selected" mark variant, e.g. `primary-q1`.
    pub const SELECTED_PREFIX: &str = "primary-";
    /// Dimmed marks on overview pages.
    pub const DIM_OVERVIEW: &str = "black";
    /// Dimmed marks on transcript pages.
    pub const DIM_TRANSCRIPT: &str = "dark";
}

pub const FOCUS_DELAY_MS: u32 = 100;
pub const UNPIN_DELAY_MS: u32 = 200;
pub const RETRACT_DELAY_MS: u32 = 300;
pub const RESET_CONFIRM_DELAY_MS: u32 = 1000;

/// Work to run after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Move keyboard focus to the first visible result row.
    FocusFirstVisibleRow,
    /// Second status message after a visualization reset.
    AnnounceResetComplete,
    /// Collapse the filter panel.
    RetractFilters,
    /// Drop the pinned-media layout.
    UnpinMedia,
}

impl Deferred {
    pub fn after(self, delay_ms: u32) -> Scheduled {
        Scheduled { delay_ms, effect: self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub delay_ms: u32,
    pub effect: Deferred,
}

pub struct Page<D, H> {
    pub doc: D,
    pub url: UrlStore<H>,
    pub config: SiteConfig,
}

impl<D: Document, H: History> Page<D, H> {
    pub fn new(doc: D, history: H, config: SiteConfig) -> Self {
        Self { doc, url: UrlStore::new(history), config }
    }

    /// Optional region lookup.
    pub fn element(&self, id: &str) -> Option<D::Node> {
        self.doc.element_by_id(id)
    }

    /// Write `message` into a live region for assistive technology.
    pub fn announce(&mut self, announcer_id: &str, message: &str) {
        if let Some(announcer) = self.element(announcer_id) {
            self.doc.set_text_content(&announcer, message);
        }
    }

    pub fn add_class_to(&mut self, id: &str, class: &str) {
        if let Some(node) = self.element(id) {
            self.doc.add_class(&node, class);
        }
    }

    pub fn remove_class_from(&mut self, id: &str, class: &str) {
        if let Some(node) = self.element(id) {
            self.doc.remove_class(&node, class);
        }
    }

    pub fn element_has_class(&self, id: &str, class: &str) -> bool {
        self.element(id).is_some_and(|node| self.doc.has_class(&node, class))
    }

    pub fn set_value_of(&mut self, id: &str, value: &str) {
        if let Some(node) = self.element(id) {
            self.doc.set_value(&node, value);
        }
    }

    pub fn reset_selection_of(&mut self, id: &str) {
        if let Some(node) = self.element(id) {
            self.doc.reset_selection(&node);
        }
    }

    pub fn scroll_to(&mut self, id: &str) {
        if let Some(node) = self.element(id) {
            self.doc.scroll_into_view(&node, crate::dom::ScrollAlign::Start);
        }
    }

    /// Run a deferred effect now.
    pub fn apply(&mut self, effect: Deferred) {
        tracing::trace!(?effect, "applying deferred effect");
        match effect {
            Deferred::FocusFirstVisibleRow => crate::visualization::focus_first_visible_row(self),
            Deferred::AnnounceResetComplete => {
                self.announce(ids::FILTER_STATUS, crate::visualization::RESET_COMPLETE_MESSAGE)
            }
            Deferred::RetractFilters => self.add_class_to(ids::FILTERS_SEARCH, classes::RETRACTED),
            Deferred::UnpinMedia => self.remove_class_from(ids::UPPER_CONTENT, classes::MEDIA_PINNED),
        }
    }

    /// Apply every effect in order, ignoring delays.
    pub fn apply_all(&mut self, scheduled: &[Scheduled]) {
        for s in scheduled {
            self.apply(s.effect);
        }
    }
}
