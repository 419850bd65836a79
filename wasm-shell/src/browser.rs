//! History, fetch and page globals for the browser.
//!
//! Only compiled on `wasm32` targets.

use futures::future::{FutureExt, LocalBoxFuture};
use js_sys::Reflect;
use transcript_explorer::loader::{Fetch, FetchResponse};
use transcript_explorer::scroll::{StepSettings, StepTracker};
use transcript_explorer::url::History;
use transcript_explorer::{LoadError, SiteConfig, ThemeConfig};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlBaseElement, Response, Window};

use crate::document::WebDocument;

pub struct BrowserHistory {
    window: Window,
}

impl BrowserHistory {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl History for BrowserHistory {
    fn pathname(&self) -> String {
        self.window.location().pathname().unwrap_or_default()
    }

    fn search(&self) -> String {
        self.window.location().search().unwrap_or_default()
    }

    fn hash(&self) -> String {
        self.window.location().hash().unwrap_or_default()
    }

    fn replace_state(&mut self, url: &str) {
        let result = self
            .window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(url)));
        if let Err(e) = result {
            tracing::warn!(url, error = ?e, "history.replaceState failed");
        }
    }
}

pub struct BrowserFetch {
    window: Window,
}

impl BrowserFetch {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

fn network_error(err: JsValue) -> LoadError {
    LoadError::Network(format!("{:?}", err))
}

impl Fetch for BrowserFetch {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse, LoadError>> {
        let request = self.window.fetch_with_str(url);
        async move {
            let response: Response = JsFuture::from(request)
                .await
                .map_err(network_error)?
                .dyn_into()
                .map_err(network_error)?;
            let status = response.status();
            let text = response.text().map_err(network_error)?;
            let body = JsFuture::from(text).await.map_err(network_error)?.as_string().unwrap_or_default();
            Ok(FetchResponse { status, body })
        }
        .boxed_local()
    }
}

/// Resolved `<base href>`, or empty when the page has none.
pub fn base_url(document: &WebDocument) -> String {
    document
        .select_all("base")
        .into_iter()
        .next()
        .and_then(|base| base.dyn_into::<HtmlBaseElement>().ok())
        .map(|base| base.href())
        .unwrap_or_default()
}

fn global_path(window: &Window, path: &[&str]) -> Option<JsValue> {
    let mut value: JsValue = window.clone().into();
    for key in path {
        value = Reflect::get(&value, &JsValue::from_str(key)).ok()?;
        if value.is_undefined() || value.is_null() {
            return None;
        }
    }
    Some(value)
}

/// Theme flags from `window.site.data.theme`, defaulting when absent.
pub fn site_config(window: &Window) -> SiteConfig {
    let theme = global_path(window, &["site", "data", "theme"])
        .and_then(|value| match serde_wasm_bindgen::from_value::<ThemeConfig>(value) {
            Ok(theme) => Some(theme),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed site theme");
                None
            }
        })
        .unwrap_or_default();
    SiteConfig { theme }
}

/// Transcript ids listed in `window.availableTranscripts`.
pub fn available_transcripts(window: &Window) -> Vec<String> {
    global_path(window, &["availableTranscripts"])
        .and_then(|value| serde_wasm_bindgen::from_value(value).ok())
        .unwrap_or_default()
}

#[wasm_bindgen]
extern "C" {
    type Scroller;

    #[wasm_bindgen(catch, js_name = scrollama)]
    fn scrollama() -> Result<Scroller, JsValue>;

    #[wasm_bindgen(method)]
    fn setup(this: &Scroller, options: &JsValue) -> Scroller;

    #[wasm_bindgen(method, js_name = onStepEnter)]
    fn on_step_enter(this: &Scroller, handler: &js_sys::Function) -> Scroller;

    #[wasm_bindgen(method, js_name = onStepExit)]
    fn on_step_exit(this: &Scroller, handler: &js_sys::Function) -> Scroller;
}

/// The global `scrollama()` step tracker.
#[derive(Default)]
pub struct ScrollamaTracker {
    scroller: Option<Scroller>,
}

impl ScrollamaTracker {
    /// Register step callbacks on an installed scroller.
    pub fn listen(&self, enter: &js_sys::Function, exit: &js_sys::Function) {
        if let Some(scroller) = &self.scroller {
            scroller.on_step_enter(enter);
            scroller.on_step_exit(exit);
        }
    }
}

impl StepTracker for ScrollamaTracker {
    fn setup(&mut self, settings: &StepSettings) {
        let scroller = match scrollama() {
            Ok(scroller) => scroller,
            Err(e) => {
                tracing::warn!(error = ?e, "scrollama is not loaded");
                return;
            }
        };
        match serde_wasm_bindgen::to_value(settings) {
            Ok(options) => {
                scroller.setup(&options);
                self.scroller = Some(scroller);
            }
            Err(e) => tracing::warn!(error = %e, "could not encode step settings"),
        }
    }
}

