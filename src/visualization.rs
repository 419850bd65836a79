//! Visualization filter controller
//!
//! Drives the SVG timeline marks (`rect` / `circle`, one per line, carrying
//! the line's tag classes) and the companion results tables. One controller
//! serves both page kinds; they differ only in the class used to dim marks.
//!
//! Tag filtering and interview filtering are independent. Each only adds or
//! removes its own `hidden` classes, and the stylesheet combines them.

use crate::dom::{attribute_is, remove_classes_with_prefix, Document, Query};
use crate::page::{classes, ids, Deferred, Page, Scheduled, FOCUS_DELAY_MS, RESET_CONFIRM_DELAY_MS};
use crate::url::{History, Param};

pub const RESET_MESSAGE: &str = "All filters have been reset. Showing all content.";
pub const RESET_COMPLETE_MESSAGE: &str = "View reset. All transcript segments are now visible.";

/// Tag that clears every filter instead of matching.
pub const ALL_TAGS: &str = "all";

/// Elements a full reset touches.
const RESET_TAGS: &[&str] = &["rect", "circle", "tr", "table", "svg", "h3", "div", "section"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualizationController {
    dim_class: &'static str,
}

impl VisualizationController {
    /// Controller for the all-transcripts overview page.
    pub const fn overview() -> Self {
        Self { dim_class: classes::DIM_OVERVIEW }
    }

    /// Controller for the timeline on a single transcript page.
    pub const fn transcript() -> Self {
        Self { dim_class: classes::DIM_TRANSCRIPT }
    }

    pub fn dim_class(&self) -> &'static str {
        self.dim_class
    }

    /// Show only content tagged `tag` and announce the result.
    ///
    /// Returns the deferred focus move so the shell can run it once layout
    /// has settled.
    pub fn filter_by_tag<D: Document, H: History>(
        &self,
        page: &mut Page<D, H>,
        tag: &str,
    ) -> Vec<Scheduled> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Vec::new();
        }
        if tag == ALL_TAGS {
            return self.reset(page);
        }
        if tag == classes::HILITE {
            self.highlight(page);
            return Vec::new();
        }
        tracing::debug!(tag, dim = self.dim_class, "filtering visualization by tag");

        let doc = &mut page.doc;
        let selected = format!("{}{}", classes::SELECTED_PREFIX, tag);

        // ======================================================================
        // Baseline: every mark dimmed, every row and section hidden
        // ======================================================================
        for rect in doc.query_all(None, &Query::tag("rect")) {
            remove_classes_with_prefix(doc, &rect, classes::SELECTED_PREFIX);
            doc.add_class(&rect, self.dim_class);
        }
        unpress_all(doc);
        for circle in doc.query_all(None, &Query::tag("circle")) {
            doc.add_class(&circle, self.dim_class);
        }
        for row in doc.query_all(None, &Query::tag("tr")) {
            if let Some(link) = first_link_with_tabindex(doc, &row, "0") {
                doc.set_attribute(&link, "tabindex", "-1");
            }
            doc.add_class(&row, classes::HIDDEN);
            doc.remove_attribute(&row, "aria-hidden");
        }
        for section_class in [classes::CONTENTS_DIV, classes::VIZ_DIV] {
            for section in doc.query_all(None, &Query::tag_class("section", section_class)) {
                doc.add_class(&section, classes::HIDDEN);
                doc.remove_attribute(&section, "aria-hidden");
            }
        }

        // ======================================================================
        // Reveal what carries the tag
        // ======================================================================
        for rect in doc.query_all(None, &Query::tag_class("rect", tag)) {
            doc.remove_class(&rect, self.dim_class);
            doc.add_class(&rect, &selected);
        }
        for circle in doc.query_all(None, &Query::tag_class("circle", tag)) {
            doc.remove_class(&circle, self.dim_class);
            if let Some(svg) = doc.closest(&circle, &Query::tag("svg")) {
                doc.set_attribute(&svg, "aria-pressed", "true");
            }
        }
        let matching_rows = doc.query_all(None, &Query::tag_class("tr", tag));
        for row in &matching_rows {
            doc.remove_class(row, classes::HIDDEN);
            doc.set_attribute(row, "aria-hidden", "false");
        }
        for row in visible_rows(doc) {
            if let Some(section) = doc.closest(&row, &Query::tag_class("section", classes::CONTENTS_DIV)) {
                doc.remove_class(&section, classes::HIDDEN);
                doc.set_attribute(&section, "aria-hidden", "false");
            }
            if let Some(link) = first_link_with_tabindex(doc, &row, "-1") {
                doc.set_attribute(&link, "tabindex", "0");
            }
        }
        for rect in doc.query_all(None, &Query::tag("rect")) {
            if doc.has_class(&rect, self.dim_class) {
                continue;
            }
            if let Some(section) = doc.closest(&rect, &Query::tag_class("section", classes::VIZ_DIV)) {
                doc.remove_class(&section, classes::HIDDEN);
            }
        }

        let name = tag_display_name(doc, tag);
        page.url.set(Param::Filter, Some(tag));
        let message = format!(
            "Content filtered by {}. {} matching segments found.",
            name,
            matching_rows.len()
        );
        page.announce(ids::FILTER_STATUS, &message);

        vec![Deferred::FocusFirstVisibleRow.after(FOCUS_DELAY_MS)]
    }

    /// Dim every mark except those tagged `tag`, which get the selected
    /// variant. Rows, sections and the URL are left alone.
    pub fn filter_marks<D: Document, H: History>(&self, page: &mut Page<D, H>, tag: &str) {
        let doc = &mut page.doc;
        let selected = format!("{}{}", classes::SELECTED_PREFIX, tag);
        for rect in doc.query_all(None, &Query::tag("rect")) {
            doc.add_class(&rect, self.dim_class);
            remove_classes_with_prefix(doc, &rect, classes::SELECTED_PREFIX);
            if doc.has_class(&rect, tag) {
                doc.remove_class(&rect, self.dim_class);
                doc.add_class(&rect, &selected);
            }
        }
    }

    /// Emphasise the marks whose lines matched a search.
    ///
    /// Marks are flagged with `hilite` beforehand by the search pass. This
    /// never changes the URL, so the active `filter` survives.
    pub fn highlight<D: Document, H: History>(&self, page: &mut Page<D, H>) {
        self.filter_marks(page, classes::HILITE);
    }

    /// Hide every table, chart and heading that does not belong to
    /// `interview`.
    pub fn filter_by_interview<D: Document, H: History>(&self, page: &mut Page<D, H>, interview: &str) {
        let interview = interview.trim();
        if interview.is_empty() {
            return;
        }
        tracing::debug!(interview, "filtering visualization by interview");

        let doc = &mut page.doc;
        for tag in ["table", "svg", "h3"] {
            for node in doc.query_all(None, &Query::tag(tag)) {
                doc.remove_class(&node, classes::HIDDEN);
                doc.remove_attribute(&node, "aria-hidden");
            }
        }
        for query in [Query::tag("table"), Query::tag_class("svg", classes::CHART), Query::tag("h3")] {
            for node in doc.query_all(None, &query) {
                if !doc.has_class(&node, interview) {
                    doc.add_class(&node, classes::HIDDEN);
                    doc.remove_attribute(&node, "aria-hidden");
                }
            }
        }
        page.url.set(Param::Id, Some(interview));
    }

    /// Clear both filters everywhere and return focus to the reset button.
    pub fn reset<D: Document, H: History>(&self, page: &mut Page<D, H>) -> Vec<Scheduled> {
        tracing::debug!("resetting visualization filters");
        let doc = &mut page.doc;
        for tag in RESET_TAGS {
            for node in doc.query_all(None, &Query::tag(tag)) {
                for class in [classes::DIM_OVERVIEW, classes::HIDDEN, classes::DIM_TRANSCRIPT] {
                    doc.remove_class(&node, class);
                }
                remove_classes_with_prefix(doc, &node, classes::SELECTED_PREFIX);
                doc.remove_attribute(&node, "aria-hidden");
            }
        }
        for link in doc.query_all(None, &Query::tag("a")) {
            if attribute_is(doc, &link, "tabindex", "0")
                && doc.query_first(Some(&link), &Query::tag("rect")).is_some()
            {
                doc.set_attribute(&link, "tabindex", "-1");
            }
        }
        unpress_all(doc);

        page.url.remove(Param::Id);
        page.url.remove(Param::Filter);
        page.announce(ids::FILTER_STATUS, RESET_MESSAGE);

        if let Some(contents) = page.element(ids::TRANSCRIPT_CONTENTS) {
            page.doc.set_attribute(&contents, "tabindex", "-1");
        }
        if let Some(button) = page.element(ids::RESET) {
            page.doc.focus(&button);
        }

        vec![Deferred::AnnounceResetComplete.after(RESET_CONFIRM_DELAY_MS)]
    }

    /// Re-apply the filters named in the query string after content loads.
    pub fn init_from_url<D: Document, H: History>(&self, page: &mut Page<D, H>) -> Vec<Scheduled> {
        let tag = page.url.get(Param::Filter).map(str::to_owned);
        let interview = page.url.get(Param::Id).map(str::to_owned);

        let mut scheduled = Vec::new();
        if let Some(tag) = tag {
            scheduled.extend(self.filter_by_tag(page, &tag));
        }
        if let Some(interview) = interview {
            self.filter_by_interview(page, &interview);
        }
        scheduled
    }

    /// A `.legend` entry was activated.
    pub fn activate_legend<D: Document, H: History>(
        &self,
        page: &mut Page<D, H>,
        legend: &D::Node,
    ) -> Vec<Scheduled> {
        match page.doc.attribute(legend, "data-id") {
            Some(tag) => self.filter_by_tag(page, &tag),
            None => Vec::new(),
        }
    }

    /// An `h3.toggle_int` heading was activated.
    pub fn activate_interview_toggle<D: Document, H: History>(
        &self,
        page: &mut Page<D, H>,
        heading: &D::Node,
    ) {
        if let Some(interview) = page.doc.attribute(heading, "data-id") {
            self.filter_by_interview(page, &interview);
        }
    }
}

/// Focus the first visible result row for keyboard users.
///
/// Falls back to the row itself when it has no link, and to the content area
/// when nothing is visible, so assistive technology still gets a focus event.
pub fn focus_first_visible_row<D: Document, H: History>(page: &mut Page<D, H>) {
    let doc = &mut page.doc;
    match visible_rows(doc).into_iter().next() {
        Some(row) => match doc.query_first(Some(&row), &Query::tag("a")) {
            Some(link) => doc.focus(&link),
            None => {
                doc.set_attribute(&row, "tabindex", "0");
                doc.focus(&row);
            }
        },
        None => {
            if let Some(contents) = doc.element_by_id(ids::TRANSCRIPT_CONTENTS) {
                doc.set_attribute(&contents, "tabindex", "-1");
                doc.focus(&contents);
            }
        }
    }
}

fn visible_rows<D: Document>(doc: &D) -> Vec<D::Node> {
    doc.query_all(None, &Query::tag("tr"))
        .into_iter()
        .filter(|row| !doc.has_class(row, classes::HIDDEN))
        .collect()
}

fn first_link_with_tabindex<D: Document>(doc: &D, row: &D::Node, tabindex: &str) -> Option<D::Node> {
    doc.query_all(Some(row), &Query::tag("a"))
        .into_iter()
        .find(|link| attribute_is(doc, link, "tabindex", tabindex))
}

fn unpress_all<D: Document>(doc: &mut D) {
    for svg in doc.query_all(None, &Query::tag("svg")) {
        if attribute_is(doc, &svg, "aria-pressed", "true") {
            doc.set_attribute(&svg, "aria-pressed", "false");
        }
    }
}

/// Human label for a tag: the `<text>` inside its legend graphic, if any.
fn tag_display_name<D: Document>(doc: &D, tag: &str) -> String {
    doc.query_all(None, &Query::tag("svg"))
        .into_iter()
        .find(|svg| attribute_is(doc, svg, "data-id", tag))
        .and_then(|svg| doc.query_first(Some(&svg), &Query::tag("text")))
        .map(|label| doc.text_content(&label))
        .unwrap_or_else(|| tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::dom::{ElementSpec, Markup, MemoryDocument, NodeId};
    use crate::url::MemoryHistory;

    type TestPage = Page<MemoryDocument, MemoryHistory>;

    fn legend(tag: &str, label: &str) -> ElementSpec {
        ElementSpec::new("svg")
            .class("legend")
            .attr("role", "button")
            .attr("data-id", tag)
            .attr("aria-pressed", "false")
            .child(ElementSpec::new("circle").class(tag))
            .child(ElementSpec::new("text").text(label))
    }

    fn mark(id: &str, tags: &str) -> ElementSpec {
        ElementSpec::new("a")
            .attr("tabindex", "-1")
            .child(ElementSpec::new("rect").id(id).class(tags))
    }

    fn row(id: &str, tags: &str) -> ElementSpec {
        ElementSpec::new("tr").id(id).class(tags).child(
            ElementSpec::new("td").child(ElementSpec::new("a").attr("tabindex", "-1").text("Line")),
        )
    }

    /// Two interviews, each with a chart and a results table.
    fn overview(url: &str) -> TestPage {
        let body: Vec<Markup> = vec![
            ElementSpec::new("div").id(ids::FILTER_STATUS).into(),
            ElementSpec::new("button").id(ids::RESET).text("Reset").into(),
            ElementSpec::new("div").children([legend("q1", "Farming"), legend("q2", "Weather")]).into(),
            ElementSpec::new("h3").class("toggle_int int01").attr("data-id", "int01").text("One").into(),
            ElementSpec::new("h3").class("toggle_int int02").attr("data-id", "int02").text("Two").into(),
            ElementSpec::new("section")
                .class("vizdiv")
                .id("viz01")
                .child(
                    ElementSpec::new("svg")
                        .class("chart int01")
                        .children([mark("a0", "q1"), mark("a1", "q2")]),
                )
                .into(),
            ElementSpec::new("section")
                .class("vizdiv")
                .id("viz02")
                .child(ElementSpec::new("svg").class("chart int02").children([mark("b0", "q2")]))
                .into(),
            ElementSpec::new("div")
                .id(ids::TRANSCRIPT_CONTENTS)
                .child(
                    ElementSpec::new("section").class("contentsdiv").id("c01").child(
                        ElementSpec::new("table")
                            .class("int01")
                            .children([row("int01row0", "q1"), row("int01row1", "q2")]),
                    ),
                )
                .child(
                    ElementSpec::new("section")
                        .class("contentsdiv")
                        .id("c02")
                        .child(ElementSpec::new("table").class("int02").children([row("int02row0", "q2")])),
                )
                .into(),
        ];
        Page::new(MemoryDocument::from_markup(&body), MemoryHistory::new(url), SiteConfig::default())
    }

    fn el(page: &TestPage, id: &str) -> NodeId {
        page.element(id).unwrap_or_else(|| panic!("missing #{id}"))
    }

    fn has(page: &TestPage, id: &str, class: &str) -> bool {
        page.doc.has_class(&el(page, id), class)
    }

    fn status(page: &TestPage) -> String {
        page.doc.text_content(&el(page, ids::FILTER_STATUS))
    }

    // ==========================================================================
    // Tag filter
    // ==========================================================================

    #[test]
    fn test_tag_filter_dims_and_hides_non_matching() {
        let mut page = overview("/viz.html");
        let viz = VisualizationController::overview();
        let scheduled = viz.filter_by_tag(&mut page, "q1");

        assert!(!has(&page, "a0", "black"));
        assert!(has(&page, "a0", "primary-q1"));
        assert!(has(&page, "a1", "black"));
        assert!(has(&page, "b0", "black"));

        assert!(!has(&page, "int01row0", "hidden"));
        assert!(has(&page, "int01row1", "hidden"));
        assert!(has(&page, "int02row0", "hidden"));

        assert!(!has(&page, "c01", "hidden"));
        assert!(has(&page, "c02", "hidden"));
        assert!(!has(&page, "viz01", "hidden"));
        assert!(has(&page, "viz02", "hidden"));

        assert_eq!(page.url.history().current(), "/viz.html?filter=q1");
        assert_eq!(scheduled, vec![Deferred::FocusFirstVisibleRow.after(100)]);
    }

    #[test]
    fn test_tag_filter_announces_legend_label_and_count() {
        let mut page = overview("/viz.html");
        VisualizationController::overview().filter_by_tag(&mut page, "q2");
        assert_eq!(status(&page), "Content filtered by Weather. 2 matching segments found.");
    }

    #[test]
    fn test_unknown_tag_falls_back_to_raw_name() {
        let mut page = overview("/viz.html");
        VisualizationController::overview().filter_by_tag(&mut page, "q9");
        assert_eq!(status(&page), "Content filtered by q9. 0 matching segments found.");
    }

    #[test]
    fn test_tag_filter_updates_pressed_state_and_tabindex() {
        let mut page = overview("/viz.html");
        let viz = VisualizationController::overview();
        viz.filter_by_tag(&mut page, "q1");
        viz.filter_by_tag(&mut page, "q2");

        let legends = page.doc.query_all(None, &Query::tag_class("svg", "legend"));
        let pressed: Vec<_> =
            legends.iter().map(|svg| page.doc.attribute(svg, "aria-pressed").unwrap_or_default()).collect();
        assert_eq!(pressed, vec!["false", "true"]);

        let row = el(&page, "int01row0");
        let link = page.doc.query_first(Some(&row), &Query::tag("a")).expect("link");
        assert_eq!(page.doc.attribute(&link, "tabindex").as_deref(), Some("-1"));
        let row = el(&page, "int02row0");
        let link = page.doc.query_first(Some(&row), &Query::tag("a")).expect("link");
        assert_eq!(page.doc.attribute(&link, "tabindex").as_deref(), Some("0"));
    }

    #[test]
    fn test_deferred_focus_lands_on_first_visible_link() {
        let mut page = overview("/viz.html");
        let scheduled = VisualizationController::overview().filter_by_tag(&mut page, "q2");
        page.apply_all(&scheduled);

        let row = el(&page, "int01row1");
        let link = page.doc.query_first(Some(&row), &Query::tag("a"));
        assert_eq!(page.doc.focused(), link);
    }

    #[test]
    fn test_deferred_focus_without_results_goes_to_contents() {
        let mut page = overview("/viz.html");
        let scheduled = VisualizationController::overview().filter_by_tag(&mut page, "q9");
        page.apply_all(&scheduled);

        let contents = el(&page, ids::TRANSCRIPT_CONTENTS);
        assert_eq!(page.doc.focused(), Some(contents));
        assert_eq!(page.doc.attribute(&contents, "tabindex").as_deref(), Some("-1"));
    }

    #[test]
    fn test_transcript_pages_dim_with_dark() {
        let mut page = overview("/items/int01.html");
        VisualizationController::transcript().filter_by_tag(&mut page, "q1");
        assert!(has(&page, "a1", "dark"));
        assert!(!has(&page, "a1", "black"));
    }

    // ==========================================================================
    // Highlight
    // ==========================================================================

    #[test]
    fn test_highlight_keeps_filter_param() {
        let mut page = overview("/items/int01.html?filter=q1");
        page.doc.add_class(&el(&page, "a1"), classes::HILITE);

        let viz = VisualizationController::transcript();
        let scheduled = viz.filter_by_tag(&mut page, "hilite");

        assert!(scheduled.is_empty());
        assert!(has(&page, "a1", "primary-hilite"));
        assert!(!has(&page, "a1", "dark"));
        assert!(has(&page, "a0", "dark"));
        assert_eq!(page.url.get(Param::Filter), Some("q1"));
        assert!(page.url.history().replaced().is_empty());
    }

    // ==========================================================================
    // Interview filter
    // ==========================================================================

    #[test]
    fn test_interview_filter_hides_other_interviews() {
        let mut page = overview("/viz.html");
        let viz = VisualizationController::overview();
        let heading = page.doc.query_all(None, &Query::tag_class("h3", "toggle_int"))[1];
        viz.activate_interview_toggle(&mut page, &heading);

        let tables = page.doc.query_all(None, &Query::tag("table"));
        assert!(page.doc.has_class(&tables[0], "hidden"));
        assert!(!page.doc.has_class(&tables[1], "hidden"));
        let charts = page.doc.query_all(None, &Query::tag_class("svg", "chart"));
        assert!(page.doc.has_class(&charts[0], "hidden"));
        assert!(!page.doc.has_class(&charts[1], "hidden"));
        assert_eq!(page.url.get(Param::Id), Some("int02"));
    }

    #[test]
    fn test_interview_filter_switches_cleanly() {
        let mut page = overview("/viz.html");
        let viz = VisualizationController::overview();
        viz.filter_by_interview(&mut page, "int02");
        viz.filter_by_interview(&mut page, "int01");

        let headings = page.doc.query_all(None, &Query::tag("h3"));
        assert!(!page.doc.has_class(&headings[0], "hidden"));
        assert!(page.doc.has_class(&headings[1], "hidden"));
    }

    #[test]
    fn test_tag_and_interview_filters_combine() {
        let mut page = overview("/viz.html?filter=q2&id=int01");
        let scheduled = VisualizationController::overview().init_from_url(&mut page);

        assert_eq!(scheduled.len(), 1);
        assert!(!has(&page, "int01row1", "hidden"));
        let tables = page.doc.query_all(None, &Query::tag("table"));
        assert!(page.doc.has_class(&tables[1], "hidden"));
        assert_eq!(page.url.history().current(), "/viz.html?filter=q2&id=int01");
    }

    // ==========================================================================
    // Reset
    // ==========================================================================

    #[test]
    fn test_reset_restores_everything() {
        let mut page = overview("/viz.html?filter=q1&id=int01");
        let viz = VisualizationController::overview();
        viz.init_from_url(&mut page);
        let scheduled = viz.reset(&mut page);

        for id in ["a0", "a1", "b0", "int01row0", "int01row1", "int02row0", "c01", "c02", "viz02"] {
            assert!(!has(&page, id, "hidden"), "{id} still hidden");
            assert!(!has(&page, id, "black"), "{id} still dimmed");
        }
        assert!(!has(&page, "a0", "primary-q1"));
        assert_eq!(page.url.history().current(), "/viz.html");
        assert_eq!(status(&page), RESET_MESSAGE);
        assert_eq!(page.doc.focused(), page.element(ids::RESET));

        page.apply_all(&scheduled);
        assert_eq!(status(&page), RESET_COMPLETE_MESSAGE);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut page = overview("/viz.html?filter=q1");
        let viz = VisualizationController::overview();
        viz.init_from_url(&mut page);
        viz.reset(&mut page);
        let once = page.doc.inner_html(&el(&page, ids::TRANSCRIPT_CONTENTS));
        viz.reset(&mut page);
        let twice = page.doc.inner_html(&el(&page, ids::TRANSCRIPT_CONTENTS));
        assert_eq!(once, twice);
        assert_eq!(page.url.history().current(), "/viz.html");
    }

    #[test]
    fn test_all_tag_resets() {
        let mut page = overview("/viz.html");
        let viz = VisualizationController::overview();
        viz.filter_by_tag(&mut page, "q1");
        viz.filter_by_tag(&mut page, ALL_TAGS);
        assert!(!has(&page, "a1", "black"));
        assert_eq!(page.url.get(Param::Filter), None);
    }

    #[test]
    fn test_legend_activation_uses_data_id() {
        let mut page = overview("/viz.html");
        let legends = page.doc.query_all(None, &Query::tag_class("svg", "legend"));
        let viz = VisualizationController::overview();
        viz.activate_legend(&mut page, &legends[0]);
        assert_eq!(page.url.get(Param::Filter), Some("q1"));
    }
}
