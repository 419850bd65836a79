//! Transcript content rendering and the visualization page bootstrap
//!
//! Builds one `section.contentsdiv` per loaded transcript and swaps it into
//! `#transcript-content-container` wholesale. Rendering is idempotent but not
//! incremental: whatever was in the container before is discarded.

use crate::dom::{Document, ElementSpec, Markup};
use crate::error::DomError;
use crate::loader::{Fetch, Segment, TranscriptLoader, TranscriptRecord};
use crate::page::{classes, ids, Page, Scheduled};
use crate::url::History;
use crate::visualization::VisualizationController;

pub const LOAD_ERROR_MESSAGE: &str = "Error loading transcript data. Please try refreshing the page.";

/// Tag label to CSS class: trimmed, lower-cased, whitespace runs to `-`.
pub fn normalize_tag(tag: &str) -> String {
    tag.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join("-")
}

/// Words cell text, prefixed by the speaker with its first `:` dropped.
fn spoken_text(segment: &Segment) -> String {
    match &segment.speaker {
        Some(speaker) => format!("{}: {}", speaker.replacen(':', "", 1), segment.words),
        None => segment.words.clone(),
    }
}

fn segment_row(id: &str, segment: &Segment) -> ElementSpec {
    let tags: Vec<String> = segment.tags.iter().map(|t| normalize_tag(t)).collect();
    let line_link = ElementSpec::new("a")
        .attr("href", format!("/items/{}.html?line={}", id, segment.index))
        .attr(
            "aria-label",
            format!("jump to Line {} from {}'s interview, opens in new tab", segment.index, id),
        )
        .class("small btn-link text-dark")
        .attr("tabindex", "-1")
        .text(format!("Line {}", segment.index));

    ElementSpec::new("tr")
        .id(format!("{}row{}", id, segment.index))
        .class(&tags.join(" "))
        .child(
            ElementSpec::new("td")
                .class("p-2")
                .attr("style", "width:10%;vertical-align:top")
                .child(line_link),
        )
        .child(
            ElementSpec::new("td")
                .class(classes::WORDS)
                .class("p-2")
                .child(ElementSpec::new("div").class("spoken").text(spoken_text(segment))),
        )
}

/// Heading plus results table for one transcript.
pub fn transcript_section(id: &str, record: &TranscriptRecord) -> Markup {
    let heading = ElementSpec::new("h3").class("my-4").class(id).child(
        ElementSpec::new("a")
            .attr("href", format!("/items/{}.html", id))
            .text(record.display_name().unwrap_or(id)),
    );
    let table = ElementSpec::new("table")
        .class("my-4 p-2 border bg-light")
        .class(id)
        .children(record.segments.iter().map(|s| segment_row(id, s)));

    ElementSpec::new("section")
        .class(classes::CONTENTS_DIV)
        .child(heading)
        .child(table)
        .into()
}

/// Replace the content container with every cached transcript in `ids`
/// order. Returns `false` when the page has no container.
pub fn render_transcript_content<D: Document, F: Fetch>(
    doc: &mut D,
    loader: &TranscriptLoader<F>,
    transcript_ids: &[String],
) -> Result<bool, DomError> {
    let Some(container) = doc.element_by_id(ids::TRANSCRIPT_CONTENT_CONTAINER) else {
        return Ok(false);
    };
    let sections: Vec<Markup> = transcript_ids
        .iter()
        .filter_map(|id| loader.cached(id).map(|record| transcript_section(id, &record)))
        .collect();
    tracing::debug!(sections = sections.len(), "rendering transcript content");
    doc.replace_children(&container, &sections)?;
    Ok(true)
}

/// Swap the content container for the load-failure banner.
pub fn show_error_banner<D: Document>(doc: &mut D) {
    let Some(container) = doc.element_by_id(ids::TRANSCRIPT_CONTENT_CONTAINER) else { return };
    let banner: Markup = ElementSpec::new("div").class("alert alert-danger").text(LOAD_ERROR_MESSAGE).into();
    if let Err(e) = doc.replace_children(&container, &[banner]) {
        tracing::error!(error = %e, "could not show load error banner");
    }
}

/// Everything the visualization page does once
/// [`TranscriptLoader::load_all`] has finished: tooltips, content, then the
/// filters named in the URL.
///
/// A render failure replaces the content with the error banner and skips the
/// URL filters.
pub fn populate<D: Document, H: History, F: Fetch>(
    page: &mut Page<D, H>,
    loader: &TranscriptLoader<F>,
    transcript_ids: &[String],
    viz: &VisualizationController,
) -> Vec<Scheduled> {
    loader.refresh_tooltips(&mut page.doc);
    match render_transcript_content(&mut page.doc, loader, transcript_ids) {
        Ok(_) => {
            tracing::info!("transcript data loaded successfully");
            viz.init_from_url(page)
        }
        Err(e) => {
            tracing::error!(error = %e, "error initializing transcript visualization");
            show_error_banner(&mut page.doc);
            Vec::new()
        }
    }
}
