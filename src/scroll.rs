//! Scroll-step observer
//!
//! Transcript pages have two scroll anchors inside `#scrolly`: step 0 at the
//! top of the page and step 1 once the reader has scrolled into the
//! transcript. Crossing them toggles the sticky filter tab and the pinned
//! media layout.

use crate::dom::{Document, Query};
use crate::page::{classes, ids, Page};
use crate::url::History;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSettings {
    /// Selector for the step elements, handed to the tracker as-is.
    #[serde(rename = "step")]
    pub step_selector: String,
    /// Trigger line as a fraction of viewport height from the top.
    pub offset: f64,
    pub debug: bool,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self { step_selector: "#scrolly article .step".to_string(), offset: 0.24, debug: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StepEvent {
    pub index: usize,
    pub direction: Direction,
}

/// The scroll-progress library seam.
pub trait StepTracker {
    fn setup(&mut self, settings: &StepSettings);
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollStepObserver {
    settings: StepSettings,
}

impl ScrollStepObserver {
    /// Install `tracker` when the page has `#scrolly` with an `article`
    /// holding at least one `.step`.
    pub fn setup<D: Document, H: History, T: StepTracker>(
        page: &Page<D, H>,
        tracker: &mut T,
    ) -> Option<Self> {
        let scrolly = page.element(ids::SCROLLY)?;
        let article = page.doc.query_first(Some(&scrolly), &Query::tag("article"))?;
        let steps = page.doc.query_all(Some(&article), &Query::class("step"));
        if steps.is_empty() {
            return None;
        }

        let settings = StepSettings::default();
        tracker.setup(&settings);
        tracing::debug!(steps = steps.len(), offset = settings.offset, "scroll steps installed");
        Some(Self { settings })
    }

    pub fn settings(&self) -> &StepSettings {
        &self.settings
    }

    pub fn on_step_enter<D: Document, H: History>(&self, page: &mut Page<D, H>, event: StepEvent) {
        tracing::trace!(index = event.index, direction = ?event.direction, "step enter");
        let theme = page.config.theme;
        match event.index {
            0 => {
                page.add_class_to(ids::FILTER_TAB, classes::D_NONE);
                page.remove_class_from(ids::UPPER_CONTENT, classes::MEDIA_PINNED);
                page.remove_class_from(ids::FILTERS_SEARCH, classes::RETRACTED);
            }
            1 => {
                if theme.sticky_filters() {
                    page.remove_class_from(ids::FILTER_TAB, classes::D_NONE);
                }
                if theme.media_scroll {
                    page.add_class_to(ids::UPPER_CONTENT, classes::MEDIA_PINNED);
                }
            }
            _ => {}
        }
    }

    /// Exit events currently change nothing.
    pub fn on_step_exit<D: Document, H: History>(&self, _page: &mut Page<D, H>, event: StepEvent) {
        tracing::trace!(index = event.index, direction = ?event.direction, "step exit");
    }
}
