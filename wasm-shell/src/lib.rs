//! Browser shell for Transcript Explorer.
//!
//! Implements the document, history and fetch seams of `transcript-explorer`
//! over `web-sys` and exports two page handles to JavaScript:
//!
//! ```js
//! import init, { TranscriptPage, VisualizationPage } from "./transcript_explorer_wasm.js";
//!
//! await init();
//! const page = new TranscriptPage();
//! page.filterLines("q1");
//! ```
//!
//! Browser modules are only compiled on `wasm32` targets; [`events`] holds the
//! pieces that can be tested natively.

pub mod events;

#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(target_arch = "wasm32")]
mod console;
#[cfg(target_arch = "wasm32")]
mod document;
#[cfg(target_arch = "wasm32")]
mod pages;

#[cfg(target_arch = "wasm32")]
pub use pages::{TranscriptPage, VisualizationPage};
