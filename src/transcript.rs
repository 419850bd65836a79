//! Transcript filter and search controller
//!
//! A transcript page renders its lines inside `#contents-container`; each
//! `.line` carries its tag classes and holds one `.words` element. The
//! controller moves the page between three modes:
//!
//! - unfiltered (the baseline restored by [`TranscriptController::reset`]),
//! - tag-filtered, via [`TranscriptController::filter_by_tag`],
//! - searched, via [`TranscriptController::search`].
//!
//! Entering a mode always resets first, so at most one is ever visible. The
//! active mode is mirrored into the `filter` or `q` query parameter.

use crate::dom::{remove_classes_with_prefix, Document, ElementSpec, Markup, Query, ScrollAlign};
use crate::page::{classes, ids, Deferred, Page, Scheduled, RETRACT_DELAY_MS, UNPIN_DELAY_MS};
use crate::url::{History, Param};
use crate::visualization::{VisualizationController, ALL_TAGS};

/// Characters of line text shown in a dropdown entry.
pub const PREVIEW_CHARS: usize = 125;

pub const DROPDOWN_PLACEHOLDER: &str = "Select and scroll to a matching line";

/// Classes stripped from every line and words element on reset.
const MODE_CLASSES: &[&str] = &[classes::MUTED, classes::FEATURED, classes::BORDER_FEATURED, classes::SMALL];

/// One navigation option in the results dropdown.
///
/// A tag filter emits one entry per contiguous run of tagged lines; a search
/// emits one entry per matching line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownEntry {
    pub start: usize,
    pub end: usize,
    /// Element id of the first line, passed back to `scroll_to_line`.
    pub target: String,
    pub preview: Option<String>,
}

impl DropdownEntry {
    /// A run of tagged lines. Runs of one line are labelled by number only.
    pub fn run(start: usize, end: usize, target: String, preview: String) -> Self {
        let preview = (start != end).then_some(preview);
        Self { start, end, target, preview }
    }

    /// A single line matched by a search.
    pub fn search_match(index: usize, target: String, preview: String) -> Self {
        Self { start: index, end: index, target, preview: Some(preview) }
    }

    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn label(&self) -> String {
        let lines = if self.start == self.end {
            format!("Line {}", self.start)
        } else {
            format!("Line {} to Line {} ({} lines total)", self.start, self.end, self.line_count())
        };
        match &self.preview {
            Some(preview) => format!("{} -- {}...", lines, preview),
            None => lines,
        }
    }

    fn to_option(&self) -> Markup {
        ElementSpec::new("option")
            .class(classes::TRUNCATE)
            .attr("style", "max-width: 250px;")
            .attr("value", self.target.as_str())
            .text(self.label())
            .into()
    }
}

/// Collapse tag membership into inclusive `(start, end)` runs.
///
/// A line opens a run when it is first or its predecessor is untagged, and
/// closes one when it is last or its successor is untagged. A line that does
/// both is a run of one.
pub fn tagged_runs(tagged: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut open = None;
    for (i, &is_tagged) in tagged.iter().enumerate() {
        if !is_tagged {
            continue;
        }
        let starts = i == 0 || !tagged[i - 1];
        let ends = i + 1 == tagged.len() || !tagged[i + 1];
        if starts {
            open = Some(i);
        }
        if ends {
            runs.push((open.unwrap_or(i), i));
            open = None;
        }
    }
    runs
}

/// First `PREVIEW_CHARS` characters of `text`.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// "1 section" / "N sections".
fn sections_phrase(count: usize) -> String {
    if count == 1 {
        "1 section".to_string()
    } else {
        format!("{} sections", count)
    }
}

struct LineNodes<N> {
    line: N,
    words: Option<N>,
    target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptController {
    marks: VisualizationController,
}

impl Default for TranscriptController {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptController {
    pub const fn new() -> Self {
        Self { marks: VisualizationController::transcript() }
    }

    /// Feature every line tagged `tag`, mute the rest and list the tagged
    /// runs in the results dropdown.
    ///
    /// Returns the number of dropdown sections, or `None` when the page has
    /// no line container or the call was a reset.
    pub fn filter_by_tag<D: Document, H: History>(
        &self,
        page: &mut Page<D, H>,
        tag: &str,
    ) -> Option<usize> {
        let tag = tag.trim();
        if tag == classes::HILITE {
            self.marks.highlight(page);
            return None;
        }
        self.reset(page);
        if tag.is_empty() || tag == ALL_TAGS {
            return None;
        }
        let lines = collect_lines(page)?;
        tracing::debug!(tag, lines = lines.len(), "filtering transcript by tag");

        self.marks.filter_marks(page, tag);
        page.url.set(Param::Filter, Some(tag));
        page.set_value_of(ids::FILTERS, tag);

        let tagged: Vec<bool> = lines.iter().map(|l| page.doc.has_class(&l.line, tag)).collect();
        for (nodes, &is_tagged) in lines.iter().zip(&tagged) {
            let Some(words) = &nodes.words else { continue };
            if is_tagged {
                page.doc.add_class(&nodes.line, classes::FEATURED);
            } else {
                page.doc.add_class(words, classes::SMALL);
                page.doc.add_class(words, classes::MUTED);
            }
        }

        let entries: Vec<DropdownEntry> = tagged_runs(&tagged)
            .into_iter()
            .map(|(start, end)| {
                let text = lines[start].words.as_ref().map(|w| page.doc.text_content(w)).unwrap_or_default();
                DropdownEntry::run(start, end, lines[start].target.clone(), preview(&text))
            })
            .collect();

        page.set_value_of(ids::QUICKSEARCH, "");
        fill_results(page, &entries);
        show_results(page);
        self.count_for_filter(page, tag, entries.len());
        Some(entries.len())
    }

    /// Write "<S> sections (<M> lines) are tagged as related to <tag>" into
    /// `#numberof`, where M counts every element carrying the tag.
    pub fn count_for_filter<D: Document, H: History>(&self, page: &mut Page<D, H>, tag: &str, sections: usize) {
        let matches = page.doc.query_all(None, &Query::class(tag)).len();
        let message = format!(
            "{} ({} lines) are tagged as related to {}",
            sections_phrase(sections),
            matches,
            tag
        );
        if let Some(counter) = page.element(ids::NUMBER_OF) {
            page.doc.set_text_content(&counter, &message);
        }
    }

    /// Case-insensitive search over line text.
    ///
    /// Matching lines are featured and get their first literal occurrence of
    /// `query` emphasised; the rest are muted. Returns the match count, or
    /// `None` when nothing was searched.
    pub fn search<D: Document, H: History>(&self, page: &mut Page<D, H>, query: &str) -> Option<usize> {
        self.reset(page);
        if query.trim().is_empty() {
            return None;
        }
        let lines = collect_lines(page)?;
        page.url.set(Param::Query, Some(query));
        page.set_value_of(ids::QUICKSEARCH, query);

        let needle = query.to_lowercase();
        let mut entries = Vec::new();
        let mut marked = false;
        for (i, nodes) in lines.iter().enumerate() {
            let Some(words) = &nodes.words else { continue };
            let text = page.doc.text_content(words);
            if !text.to_lowercase().contains(&needle) {
                page.doc.add_class(words, classes::SMALL);
                page.doc.add_class(words, classes::MUTED);
                continue;
            }
            page.doc.add_class(&nodes.line, classes::FEATURED);
            entries.push(DropdownEntry::search_match(i, nodes.target.clone(), preview(&text)));
            emphasise_first(&mut page.doc, words, query);
            if let Some(mark) = page.element(&format!("rect{}", i)) {
                page.doc.add_class(&mark, classes::HILITE);
                marked = true;
            }
        }
        if marked {
            self.marks.highlight(page);
        }

        let count = entries.len();
        tracing::debug!(query, matches = count, "searched transcript");
        page.reset_selection_of(ids::FILTERS);
        page.announce(ids::SEARCH_STATUS, &format!("{} lines match your query: {}", count, query));
        if let Some(counter) = page.element(ids::NUMBER_OF) {
            let summary = [
                Markup::text(format!("{} lines match your query: ", count)),
                ElementSpec::new("i").text(query).into(),
            ];
            if let Err(e) = page.doc.replace_children(&counter, &summary) {
                tracing::warn!(error = %e, "could not update match summary");
            }
        }
        fill_results(page, &entries);
        show_results(page);
        Some(count)
    }

    /// Return the page to its unfiltered baseline. Idempotent.
    pub fn reset<D: Document, H: History>(&self, page: &mut Page<D, H>) {
        page.url.remove(Param::Query);
        page.url.remove(Param::Filter);
        page.url.remove(Param::Line);

        page.add_class_to(ids::LINE_COUNT, classes::D_NONE);
        page.add_class_to(ids::FILTERSEARCH_DROPDOWN, classes::D_NONE);
        page.set_value_of(ids::QUICKSEARCH, "");
        page.reset_selection_of(ids::FILTERS);

        let doc = &mut page.doc;
        for words in doc.query_all(None, &Query::class(classes::WORDS)) {
            for class in MODE_CLASSES {
                doc.remove_class(&words, class);
            }
            for emphasis in doc.query_all(Some(&words), &Query::tag_class("span", classes::EMPHASIS)) {
                // Flatten the emphasised span back into its parent's text
                if let Some(parent) = doc.parent(&emphasis) {
                    let text = doc.text_content(&parent);
                    doc.set_text_content(&parent, &text);
                }
            }
        }
        for line in doc.query_all(None, &Query::class(classes::LINE)) {
            for class in MODE_CLASSES {
                doc.remove_class(&line, class);
            }
        }
        if let Some(viz) = doc.element_by_id(ids::COLOR_VIZ) {
            for rect in doc.query_all(Some(&viz), &Query::tag("rect")) {
                doc.remove_class(&rect, self.marks.dim_class());
                doc.remove_class(&rect, classes::HILITE);
                remove_classes_with_prefix(doc, &rect, classes::SELECTED_PREFIX);
            }
        }
    }

    /// Center the line with element id `line_id`, feature it and give it
    /// keyboard focus. Unknown ids do nothing beyond panel housekeeping.
    pub fn scroll_to_line<D: Document, H: History>(&self, page: &mut Page<D, H>, line_id: &str) -> Vec<Scheduled> {
        if page.config.theme.media_scroll {
            page.add_class_to(ids::UPPER_CONTENT, classes::MEDIA_PINNED);
        }

        if let Some(target) = page.element(line_id) {
            let number: String = line_id.chars().filter(char::is_ascii_digit).collect();
            page.announce(ids::SEARCH_STATUS, &format!("Navigated to line {}", number));
            page.doc.add_class(&target, classes::BORDER_FEATURED);
            page.doc.set_attribute(&target, "tabindex", "0");
            page.doc.scroll_into_view(&target, ScrollAlign::Center);
            page.doc.focus(&target);
        } else {
            tracing::debug!(line_id, "no line to scroll to");
        }

        let panel_open = page
            .element(ids::FILTERS_SEARCH)
            .is_some_and(|panel| !page.doc.has_class(&panel, classes::RETRACTED));
        if panel_open {
            vec![Deferred::RetractFilters.after(RETRACT_DELAY_MS)]
        } else {
            Vec::new()
        }
    }

    /// Restore the state named in the query string or fragment.
    ///
    /// Only the first of `q`, `filter`, the fragment and `line` applies, and
    /// the others are cleared so the URL never describes two modes.
    pub fn init_from_url<D: Document, H: History>(&self, page: &mut Page<D, H>) -> Vec<Scheduled> {
        let query = page.url.get(Param::Query).map(str::to_owned);
        let tag = page.url.get(Param::Filter).map(str::to_owned);
        let line = page.url.get(Param::Line).map(str::to_owned);
        let hash = page.url.hash();

        if let Some(query) = query {
            self.search(page, &query);
            page.url.remove(Param::Filter);
            page.scroll_to(ids::QUICKSEARCH);
        } else if let Some(tag) = tag {
            self.filter_by_tag(page, &tag);
            page.scroll_to(ids::COLOR_VIZ);
            page.url.remove(Param::Query);
            page.set_value_of(ids::FILTERS, &tag);
        } else if let Some(hash) = hash {
            page.add_class_to(&hash, classes::FEATURED);
            page.url.remove(Param::Query);
            page.url.remove(Param::Filter);
        } else if let Some(line) = line {
            page.url.remove(Param::Query);
            page.url.remove(Param::Filter);
            return self.scroll_to_line(page, &line);
        }
        Vec::new()
    }

    /// Key released in `#quicksearch`; only Enter searches.
    pub fn on_search_key<D: Document, H: History>(
        &self,
        page: &mut Page<D, H>,
        key: &str,
        value: &str,
    ) -> Option<usize> {
        if key == "Enter" {
            self.search(page, value)
        } else {
            None
        }
    }

    /// `#filter-tab` click. Returns whether the panel is now retracted.
    pub fn toggle_filter_panel<D: Document, H: History>(&self, page: &mut Page<D, H>) -> bool {
        match page.element(ids::FILTERS_SEARCH) {
            Some(panel) => page.doc.toggle_class(&panel, classes::RETRACTED),
            None => false,
        }
    }

    /// `#scroll-to-top` click: reopen the panel and unpin the media shortly
    /// after.
    pub fn scroll_to_top<D: Document, H: History>(&self, page: &mut Page<D, H>) -> Vec<Scheduled> {
        page.remove_class_from(ids::FILTERS_SEARCH, classes::RETRACTED);
        if page.element_has_class(ids::UPPER_CONTENT, classes::MEDIA_PINNED) {
            vec![Deferred::UnpinMedia.after(UNPIN_DELAY_MS)]
        } else {
            Vec::new()
        }
    }
}

fn collect_lines<D: Document, H: History>(page: &Page<D, H>) -> Option<Vec<LineNodes<D::Node>>> {
    let Some(container) = page.element(ids::CONTENTS_CONTAINER) else {
        tracing::debug!("no line container on this page");
        return None;
    };
    let lines = page
        .doc
        .query_all(Some(&container), &Query::class(classes::LINE))
        .into_iter()
        .enumerate()
        .map(|(i, line)| LineNodes {
            words: page.doc.query_first(Some(&line), &Query::class(classes::WORDS)),
            target: page.doc.attribute(&line, "id").unwrap_or_else(|| i.to_string()),
            line,
        })
        .collect();
    Some(lines)
}

fn fill_results<D: Document, H: History>(page: &mut Page<D, H>, entries: &[DropdownEntry]) {
    let Some(results) = page.element(ids::SEARCH_RESULTS) else { return };
    let mut options: Vec<Markup> = Vec::with_capacity(entries.len() + 1);
    options.push(ElementSpec::new("option").text(DROPDOWN_PLACEHOLDER).into());
    options.extend(entries.iter().map(DropdownEntry::to_option));
    if let Err(e) = page.doc.replace_children(&results, &options) {
        tracing::warn!(error = %e, "could not fill results dropdown");
    }
}

fn show_results<D: Document, H: History>(page: &mut Page<D, H>) {
    page.remove_class_from(ids::LINE_COUNT, classes::D_NONE);
    page.remove_class_from(ids::FILTERSEARCH_DROPDOWN, classes::D_NONE);
}

/// Wrap the first case-sensitive occurrence of `needle` in an emphasis span.
///
/// The innermost element holding the occurrence is rewritten, so wrappers
/// such as a speaker `div` survive.
fn emphasise_first<D: Document>(doc: &mut D, words: &D::Node, needle: &str) {
    let mut candidates = vec![words.clone()];
    candidates.extend(doc.query_all(Some(words), &Query::ANY));
    let leaf = candidates.into_iter().find(|node| {
        doc.query_first(Some(node), &Query::ANY).is_none() && doc.text_content(node).contains(needle)
    });
    let Some(leaf) = leaf else { return };

    let text = doc.text_content(&leaf);
    let Some(at) = text.find(needle) else { return };
    let (before, rest) = text.split_at(at);
    let after = &rest[needle.len()..];

    let mut parts = Vec::with_capacity(3);
    if !before.is_empty() {
        parts.push(Markup::text(before));
    }
    parts.push(ElementSpec::new("span").class(classes::EMPHASIS).text(needle).into());
    if !after.is_empty() {
        parts.push(Markup::text(after));
    }
    if let Err(e) = doc.replace_children(&leaf, &parts) {
        tracing::warn!(error = %e, "could not emphasise match");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SiteConfig, ThemeConfig};
    use crate::dom::{MemoryDocument, NodeId};
    use crate::url::MemoryHistory;
    use pretty_assertions::assert_eq;

    type TestPage = Page<MemoryDocument, MemoryHistory>;

    fn chrome() -> Vec<Markup> {
        vec![
            ElementSpec::new("div").id(ids::SEARCH_STATUS).into(),
            ElementSpec::new("div")
                .id(ids::FILTERS_SEARCH)
                .child(ElementSpec::new("input").id(ids::QUICKSEARCH))
                .child(
                    ElementSpec::new("select")
                        .id(ids::FILTERS)
                        .child(ElementSpec::new("option").attr("value", "").text("Filter"))
                        .child(ElementSpec::new("option").attr("value", "x").text("X")),
                )
                .child(
                    ElementSpec::new("div")
                        .id(ids::LINE_COUNT)
                        .class("d-none")
                        .child(ElementSpec::new("span").id(ids::NUMBER_OF)),
                )
                .child(
                    ElementSpec::new("div")
                        .id(ids::FILTERSEARCH_DROPDOWN)
                        .class("d-none")
                        .child(ElementSpec::new("select").id(ids::SEARCH_RESULTS)),
                )
                .into(),
            ElementSpec::new("div").id(ids::UPPER_CONTENT).into(),
        ]
    }

    /// A transcript page whose lines are `(words, tags)` pairs, with one
    /// timeline mark per line.
    fn transcript(url: &str, lines: &[(&str, &str)]) -> TestPage {
        let mut body = chrome();
        body.push(
            ElementSpec::new("svg")
                .id(ids::COLOR_VIZ)
                .children(lines.iter().enumerate().map(|(i, (_, tags))| {
                    ElementSpec::new("rect").id(format!("rect{}", i)).class(tags)
                }))
                .into(),
        );
        body.push(
            ElementSpec::new("div")
                .id(ids::CONTENTS_CONTAINER)
                .children(lines.iter().enumerate().map(|(i, (words, tags))| {
                    ElementSpec::new("div")
                        .id(format!("int01{}", i))
                        .class("line")
                        .class(tags)
                        .child(ElementSpec::new("p").class("words").text(*words))
                }))
                .into(),
        );
        Page::new(MemoryDocument::from_markup(&body), MemoryHistory::new(url), SiteConfig::default())
    }

    fn el(page: &TestPage, id: &str) -> NodeId {
        page.element(id).unwrap_or_else(|| panic!("missing #{id}"))
    }

    fn line(page: &TestPage, i: usize) -> NodeId {
        el(page, &format!("int01{}", i))
    }

    fn words(page: &TestPage, i: usize) -> NodeId {
        page.doc.query_first(Some(&line(page, i)), &Query::class("words")).expect("words")
    }

    fn featured(page: &TestPage) -> Vec<usize> {
        let lines = page.doc.query_all(None, &Query::class("line"));
        (0..lines.len()).filter(|&i| page.doc.has_class(&line(page, i), "featured")).collect()
    }

    fn muted(page: &TestPage) -> Vec<usize> {
        let lines = page.doc.query_all(None, &Query::class("line"));
        (0..lines.len()).filter(|&i| page.doc.has_class(&words(page, i), "text-muted")).collect()
    }

    fn options(page: &TestPage) -> Vec<String> {
        let results = el(page, ids::SEARCH_RESULTS);
        page.doc
            .query_all(Some(&results), &Query::tag("option"))
            .iter()
            .map(|o| page.doc.text_content(o))
            .collect()
    }

    fn text_of(page: &TestPage, id: &str) -> String {
        page.doc.text_content(&el(page, id))
    }

    // ==========================================================================
    // Run-length encoding
    // ==========================================================================

    #[test]
    fn test_runs_split_on_gaps() {
        let tagged = [false, false, true, true, true, false, false, true, false];
        assert_eq!(tagged_runs(&tagged), vec![(2, 4), (7, 7)]);
    }

    #[test]
    fn test_runs_touching_both_ends() {
        assert_eq!(tagged_runs(&[true, true, false, true]), vec![(0, 1), (3, 3)]);
        assert_eq!(tagged_runs(&[true]), vec![(0, 0)]);
        assert!(tagged_runs(&[false, false]).is_empty());
        assert!(tagged_runs(&[]).is_empty());
    }

    #[test]
    fn test_entry_labels() {
        let span = DropdownEntry::run(2, 4, "int012".into(), "well".into());
        assert_eq!(span.label(), "Line 2 to Line 4 (3 lines total) -- well...");
        let single = DropdownEntry::run(7, 7, "int017".into(), "so".into());
        assert_eq!(single.label(), "Line 7");
        let matched = DropdownEntry::search_match(7, "int017".into(), "so".into());
        assert_eq!(matched.label(), "Line 7 -- so...");
    }

    #[test]
    fn test_preview_counts_characters() {
        let text = "é".repeat(200);
        assert_eq!(preview(&text).chars().count(), PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }

    // ==========================================================================
    // Tag filter
    // ==========================================================================

    #[test]
    fn test_filter_partitions_lines() {
        let mut page = transcript(
            "/items/int01.html",
            &[("alpha", "x"), ("beta", "y"), ("gamma", "x")],
        );
        let sections = TranscriptController::new().filter_by_tag(&mut page, "x");

        assert_eq!(sections, Some(2));
        assert_eq!(featured(&page), vec![0, 2]);
        assert_eq!(muted(&page), vec![1]);
        assert_eq!(
            options(&page),
            vec![DROPDOWN_PLACEHOLDER, "Line 0", "Line 2"]
        );
        assert_eq!(page.url.history().current(), "/items/int01.html?filter=x");
    }

    #[test]
    fn test_filter_dropdown_merges_contiguous_runs() {
        let tags = ["", "", "q1", "q1 q2", "q1", "", "", "q1", ""];
        let lines: Vec<(&str, &str)> = tags.iter().map(|t| ("words here", *t)).collect();
        let mut page = transcript("/items/int01.html", &lines);
        TranscriptController::new().filter_by_tag(&mut page, "q1");

        assert_eq!(
            options(&page),
            vec![
                DROPDOWN_PLACEHOLDER,
                "Line 2 to Line 4 (3 lines total) -- words here...",
                "Line 7",
            ]
        );
        let results = el(&page, ids::SEARCH_RESULTS);
        let values: Vec<_> = page
            .doc
            .query_all(Some(&results), &Query::tag("option"))
            .iter()
            .filter_map(|o| page.doc.attribute(o, "value"))
            .collect();
        assert_eq!(values, vec!["int012", "int017"]);
    }

    #[test]
    fn test_filter_counts_sections_and_tagged_elements() {
        let mut page = transcript("/items/int01.html", &[("a", "x"), ("b", "x"), ("c", "")]);
        TranscriptController::new().filter_by_tag(&mut page, "x");
        // Two lines plus their two marks carry the tag
        assert_eq!(text_of(&page, ids::NUMBER_OF), "1 section (4 lines) are tagged as related to x");
        assert!(!page.element_has_class(ids::LINE_COUNT, "d-none"));
        assert!(!page.element_has_class(ids::FILTERSEARCH_DROPDOWN, "d-none"));
    }

    #[test]
    fn test_filter_counts_plural_sections() {
        let mut page = transcript("/items/int01.html", &[("a", "x"), ("b", ""), ("c", "x")]);
        TranscriptController::new().filter_by_tag(&mut page, "x");
        assert_eq!(text_of(&page, ids::NUMBER_OF), "2 sections (4 lines) are tagged as related to x");
    }

    #[test]
    fn test_filter_marks_timeline() {
        let mut page = transcript("/items/int01.html", &[("a", "x"), ("b", "y")]);
        TranscriptController::new().filter_by_tag(&mut page, "x");
        assert!(page.element_has_class("rect0", "primary-x"));
        assert!(!page.element_has_class("rect0", "dark"));
        assert!(page.element_has_class("rect1", "dark"));
    }

    #[test]
    fn test_filter_replaces_previous_search() {
        let mut page = transcript("/items/int01.html", &[("red river", "x"), ("blue", "")]);
        let transcript = TranscriptController::new();
        transcript.search(&mut page, "blue");
        page.set_value_of(ids::QUICKSEARCH, "blue");
        transcript.filter_by_tag(&mut page, "x");

        assert_eq!(featured(&page), vec![0]);
        assert_eq!(page.doc.value(&el(&page, ids::QUICKSEARCH)), "");
        assert_eq!(page.doc.value(&el(&page, ids::FILTERS)), "x");
        assert_eq!(page.url.history().current(), "/items/int01.html?filter=x");
    }

    #[test]
    fn test_all_resets() {
        let mut page = transcript("/items/int01.html", &[("a", "x"), ("b", "y")]);
        let transcript = TranscriptController::new();
        transcript.filter_by_tag(&mut page, "x");
        assert_eq!(transcript.filter_by_tag(&mut page, "all"), None);

        assert!(featured(&page).is_empty());
        assert!(muted(&page).is_empty());
        assert_eq!(page.url.get(Param::Filter), None);
        assert!(page.element_has_class(ids::LINE_COUNT, "d-none"));
    }

    #[test]
    fn test_missing_container_is_a_noop() {
        let mut page = Page::new(
            MemoryDocument::from_markup(&chrome()),
            MemoryHistory::new("/items/int01.html"),
            SiteConfig::default(),
        );
        assert_eq!(TranscriptController::new().filter_by_tag(&mut page, "x"), None);
        assert_eq!(page.url.get(Param::Filter), None);
    }

    // ==========================================================================
    // Search
    // ==========================================================================

    #[test]
    fn test_search_single_match() {
        let mut page = transcript(
            "/items/int01.html",
            &[("We farmed corn", ""), ("The River rose", ""), ("Dry summer", "")],
        );
        let count = TranscriptController::new().search(&mut page, "river");

        assert_eq!(count, Some(1));
        assert_eq!(featured(&page), vec![1]);
        assert_eq!(muted(&page), vec![0, 2]);
        assert_eq!(page.url.get(Param::Query), Some("river"));
        assert_eq!(text_of(&page, ids::SEARCH_STATUS), "1 lines match your query: river");
        assert_eq!(options(&page), vec![DROPDOWN_PLACEHOLDER, "Line 1 -- The River rose..."]);
    }

    #[test]
    fn test_search_emphasises_first_exact_occurrence() {
        let mut page = transcript("/items/int01.html", &[("the cow and the calf", "")]);
        TranscriptController::new().search(&mut page, "the");
        assert_eq!(
            page.doc.inner_html(&words(&page, 0)),
            r#"<span class="text-danger">the</span> cow and the calf"#
        );
    }

    #[test]
    fn test_search_case_mismatch_features_without_emphasis() {
        let mut page = transcript("/items/int01.html", &[("The barn", "")]);
        TranscriptController::new().search(&mut page, "the");
        assert_eq!(featured(&page), vec![0]);
        assert_eq!(page.doc.inner_html(&words(&page, 0)), "The barn");
    }

    #[test]
    fn test_search_highlights_marks_without_touching_filter() {
        let mut page = transcript("/items/int01.html", &[("hay", "x"), ("straw", "x")]);
        TranscriptController::new().search(&mut page, "straw");
        assert!(page.element_has_class("rect1", "hilite"));
        assert!(page.element_has_class("rect1", "primary-hilite"));
        assert!(page.element_has_class("rect0", "dark"));
        assert_eq!(page.url.history().current(), "/items/int01.html?q=straw");
    }

    #[test]
    fn test_search_resets_filter_select() {
        let mut page = transcript("/items/int01.html", &[("hay", "x")]);
        let transcript = TranscriptController::new();
        transcript.filter_by_tag(&mut page, "x");
        transcript.search(&mut page, "hay");
        assert_eq!(page.doc.value(&el(&page, ids::FILTERS)), "");
        assert_eq!(page.url.get(Param::Filter), None);
    }

    #[test]
    fn test_blank_search_only_resets() {
        let mut page = transcript("/items/int01.html?q=old", &[("hay", "")]);
        assert_eq!(TranscriptController::new().search(&mut page, "   "), None);
        assert_eq!(page.url.history().current(), "/items/int01.html");
        assert!(featured(&page).is_empty());
    }

    #[test]
    fn test_enter_key_searches() {
        let mut page = transcript("/items/int01.html", &[("hay", "")]);
        let transcript = TranscriptController::new();
        assert_eq!(transcript.on_search_key(&mut page, "h", "hay"), None);
        assert_eq!(transcript.on_search_key(&mut page, "Enter", "hay"), Some(1));
    }

    // ==========================================================================
    // Reset
    // ==========================================================================

    #[test]
    fn test_reset_restores_baseline_and_is_idempotent() {
        let mut page = transcript("/items/int01.html?line=int011", &[("the hay", "x"), ("straw", "")]);
        let transcript = TranscriptController::new();
        transcript.search(&mut page, "hay");
        transcript.reset(&mut page);
        let once = page.doc.inner_html(&el(&page, ids::CONTENTS_CONTAINER));
        let url_once = page.url.history().current();
        transcript.reset(&mut page);

        assert_eq!(page.doc.inner_html(&el(&page, ids::CONTENTS_CONTAINER)), once);
        assert_eq!(page.url.history().current(), url_once);
        assert_eq!(url_once, "/items/int01.html");
        assert_eq!(page.doc.inner_html(&words(&page, 0)), "the hay");
        assert!(featured(&page).is_empty());
        assert!(muted(&page).is_empty());
        for rect in ["rect0", "rect1"] {
            assert!(!page.element_has_class(rect, "dark"));
            assert!(!page.element_has_class(rect, "hilite"));
            assert!(!page.element_has_class(rect, "primary-hilite"));
        }
    }

    // ==========================================================================
    // Navigation
    // ==========================================================================

    #[test]
    fn test_scroll_to_line_focuses_and_announces() {
        let mut page = transcript("/items/int01.html", &[("a", ""), ("b", ""), ("c", "")]);
        let scheduled = TranscriptController::new().scroll_to_line(&mut page, "int012");

        let target = line(&page, 2);
        assert_eq!(page.doc.focused(), Some(target));
        assert_eq!(page.doc.last_scrolled(), Some((target, ScrollAlign::Center)));
        assert!(page.doc.has_class(&target, "border-featured"));
        assert_eq!(page.doc.attribute(&target, "tabindex").as_deref(), Some("0"));
        assert_eq!(text_of(&page, ids::SEARCH_STATUS), "Navigated to line 012");
        assert!(page.element_has_class(ids::UPPER_CONTENT, "media-scroll-wrapper"));

        assert_eq!(scheduled, vec![Deferred::RetractFilters.after(300)]);
        page.apply_all(&scheduled);
        assert!(page.element_has_class(ids::FILTERS_SEARCH, "retracted"));
    }

    #[test]
    fn test_scroll_to_unknown_line_is_silent() {
        let mut page = transcript("/items/int01.html", &[("a", "")]);
        page.config = SiteConfig { theme: ThemeConfig { media_scroll: false, ..ThemeConfig::default() } };
        page.add_class_to(ids::FILTERS_SEARCH, "retracted");
        let scheduled = TranscriptController::new().scroll_to_line(&mut page, "nope");

        assert!(scheduled.is_empty());
        assert_eq!(page.doc.focused(), None);
        assert_eq!(text_of(&page, ids::SEARCH_STATUS), "");
        assert!(!page.element_has_class(ids::UPPER_CONTENT, "media-scroll-wrapper"));
    }

    #[test]
    fn test_panel_toggle_and_scroll_to_top() {
        let mut page = transcript("/items/int01.html", &[("a", "")]);
        let transcript = TranscriptController::new();
        assert!(transcript.toggle_filter_panel(&mut page));
        assert!(!transcript.toggle_filter_panel(&mut page));

        transcript.toggle_filter_panel(&mut page);
        page.add_class_to(ids::UPPER_CONTENT, "media-scroll-wrapper");
        let scheduled = transcript.scroll_to_top(&mut page);
        assert!(!page.element_has_class(ids::FILTERS_SEARCH, "retracted"));
        assert_eq!(scheduled, vec![Deferred::UnpinMedia.after(200)]);
        page.apply_all(&scheduled);
        assert!(!page.element_has_class(ids::UPPER_CONTENT, "media-scroll-wrapper"));
    }

    // ==========================================================================
    // URL restore
    // ==========================================================================

    #[test]
    fn test_init_prefers_query_over_filter() {
        let mut page = transcript("/items/int01.html?filter=x&q=hay", &[("hay", "x"), ("straw", "")]);
        TranscriptController::new().init_from_url(&mut page);

        assert_eq!(page.url.history().current(), "/items/int01.html?q=hay");
        assert_eq!(page.doc.value(&el(&page, ids::QUICKSEARCH)), "hay");
        assert_eq!(featured(&page), vec![0]);
        assert_eq!(page.doc.last_scrolled().map(|(n, _)| n), page.element(ids::QUICKSEARCH));
    }

    #[test]
    fn test_init_applies_filter() {
        let mut page = transcript("/items/int01.html?filter=x", &[("hay", "x"), ("straw", "")]);
        TranscriptController::new().init_from_url(&mut page);

        assert_eq!(featured(&page), vec![0]);
        assert_eq!(page.doc.value(&el(&page, ids::FILTERS)), "x");
        assert_eq!(page.doc.last_scrolled().map(|(n, _)| n), page.element(ids::COLOR_VIZ));
        assert_eq!(page.url.history().current(), "/items/int01.html?filter=x");
    }

    #[test]
    fn test_init_features_fragment_target() {
        let mut page = transcript("/items/int01.html?line=int010#int011", &[("a", ""), ("b", "")]);
        let scheduled = TranscriptController::new().init_from_url(&mut page);

        assert!(scheduled.is_empty());
        assert_eq!(featured(&page), vec![1]);
        assert_eq!(page.doc.focused(), None);
    }

    #[test]
    fn test_init_scrolls_to_line() {
        let mut page = transcript("/items/int01.html?line=int011", &[("a", ""), ("b", "")]);
        let scheduled = TranscriptController::new().init_from_url(&mut page);

        assert_eq!(page.doc.focused(), Some(line(&page, 1)));
        assert_eq!(scheduled.len(), 1);
        assert_eq!(page.url.get(Param::Line), Some("int011"));
    }

    #[test]
    fn test_init_empty_fragment_falls_through_to_line() {
        let mut page = transcript("/items/int01.html?line=int011#", &[("a", ""), ("b", "")]);
        let scheduled = TranscriptController::new().init_from_url(&mut page);

        assert_eq!(page.doc.focused(), Some(line(&page, 1)));
        assert_eq!(scheduled.len(), 1);
    }
}
