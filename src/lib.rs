//! Transcript Explorer - filter, search and cross-highlight oral history transcripts
//!
//! The interaction layer for a static transcript site. A transcript page
//! renders its lines next to a timeline of coloured marks; an overview page
//! shows every transcript's timeline with a table of results.
//!
//! # Overview
//!
//! Visitors narrow what they see in two ways:
//!
//! 1. **Tag filters**: every line, mark and result row carries its subject
//!    tags as CSS classes. Filtering by a tag features matching lines and dims
//!    everything else.
//!
//! 2. **Search**: a case-insensitive text match over line text. Matching lines
//!    are featured and their marks on the timeline are highlighted.
//!
//! The active filter or query is mirrored into the URL (`filter`, `q`, `id`,
//! `line`) with `history.replaceState`, so a view can be shared and restored.
//! State changes are announced through live regions for screen readers.
//!
//! # Quick Start
//!
//! ```
//! use transcript_explorer::dom::{ElementSpec, MemoryDocument};
//! use transcript_explorer::url::{MemoryHistory, Param};
//! use transcript_explorer::{Page, SiteConfig, TranscriptController};
//!
//! let doc = MemoryDocument::from_markup(&[ElementSpec::new("div")
//!     .id("contents-container")
//!     .child(ElementSpec::new("div").id("int010").class("line q1")
//!         .child(ElementSpec::new("p").class("words").text("We kept bees")))
//!     .child(ElementSpec::new("div").id("int011").class("line")
//!         .child(ElementSpec::new("p").class("words").text("It rained")))
//!     .into()]);
//!
//! let mut page = Page::new(doc, MemoryHistory::new("/items/int01.html"), SiteConfig::default());
//! let transcript = TranscriptController::new();
//!
//! assert_eq!(transcript.search(&mut page, "bees"), Some(1));
//! assert_eq!(page.url.get(Param::Query), Some("bees"));
//!
//! transcript.reset(&mut page);
//! assert_eq!(page.url.history().current(), "/items/int01.html");
//! ```
//!
//! # Delayed Effects
//!
//! Some reactions only make sense once the browser has laid the page out
//! (moving focus to the first result, retracting the filter panel).
//! Operations return these as [`Scheduled`] values; the browser shell runs
//! them with `setTimeout` and tests apply them immediately with
//! [`Page::apply`].
//!
//! # Modules
//!
//! - [`dom`]: The document seam plus an in-memory implementation
//! - [`url`]: Query-string state store
//! - [`page`]: Page context, announcements and deferred effects
//! - [`transcript`]: Transcript filter and search controller
//! - [`visualization`]: Timeline and results-table filter controller
//! - [`scroll`]: Sticky chrome driven by scroll steps
//! - [`loader`]: Transcript JSON loading and caching
//! - [`render`]: Transcript content rendering and page bootstrap
//! - [`config`]: Theme flags

pub mod config;
pub mod dom;
pub mod error;
pub mod loader;
pub mod page;
pub mod render;
pub mod scroll;
pub mod transcript;
pub mod url;
pub mod visualization;

pub use config::{SiteConfig, ThemeConfig};
pub use error::{ConfigError, DomError, LoadError};
pub use loader::{Fetch, FetchResponse, Segment, TranscriptLoader, TranscriptRecord};
pub use page::{Deferred, Page, Scheduled};
pub use scroll::{ScrollStepObserver, StepEvent, StepTracker};
pub use transcript::TranscriptController;
pub use visualization::VisualizationController;
