//! Page handles exported to JavaScript.
//!
//! Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::rc::Rc;

use transcript_explorer::dom::Document as _;
use transcript_explorer::page::{classes, ids};
use transcript_explorer::render;
use transcript_explorer::{
    Page, Scheduled, ScrollStepObserver, StepEvent, TranscriptController, TranscriptLoader,
    VisualizationController,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventInit, EventTarget, HtmlElement, KeyboardEvent, Window};

use crate::browser::{self, BrowserFetch, BrowserHistory, ScrollamaTracker};
use crate::console;
use crate::document::WebDocument;
use crate::events;

type ShellPage = Page<WebDocument, BrowserHistory>;
type SharedPage = Rc<RefCell<ShellPage>>;

const TRANSCRIPT: TranscriptController = TranscriptController::new();
const OVERVIEW: VisualizationController = VisualizationController::overview();

fn open_page() -> Result<(Window, SharedPage), JsValue> {
    console::init();
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let config = browser::site_config(&window);
    let page = Page::new(WebDocument::new(document), BrowserHistory::new(window.clone()), config);
    Ok((window, Rc::new(RefCell::new(page))))
}

/// Run `f` against the page unless a handler further up the stack holds it.
fn with_page<R>(page: &SharedPage, f: impl FnOnce(&mut ShellPage) -> R) -> Option<R> {
    match page.try_borrow_mut() {
        Ok(mut page) => Some(f(&mut page)),
        Err(_) => {
            tracing::warn!("page is busy, dropping event");
            None
        }
    }
}

/// Hand each effect to `setTimeout`.
fn schedule(page: &SharedPage, scheduled: Vec<Scheduled>) {
    let Some(window) = web_sys::window() else { return };
    for Scheduled { delay_ms, effect } in scheduled {
        let target = Rc::clone(page);
        let callback = Closure::once_into_js(move || {
            with_page(&target, |page| page.apply(effect));
        });
        let result = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            events::timeout_ms(delay_ms),
        );
        if let Err(e) = result {
            tracing::warn!(?effect, error = ?e, "setTimeout failed");
        }
    }
}

/// Run a page operation and schedule whatever it defers.
fn dispatch(page: &SharedPage, f: impl FnOnce(&mut ShellPage) -> Vec<Scheduled>) {
    if let Some(scheduled) = with_page(page, f) {
        schedule(page, scheduled);
    }
}

fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    if let Err(e) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
        tracing::warn!(event, error = ?e, "addEventListener failed");
    }
    closure.forget();
}

fn listen_by_id(page: &SharedPage, id: &str, event: &str, handler: impl FnMut(Event) + 'static) {
    let element = page.borrow().doc.element_by_id(id);
    if let Some(element) = element {
        listen(&element, event, handler);
    }
}

fn key_of(event: &Event) -> Option<String> {
    event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key)
}

fn count(found: Option<usize>) -> Option<u32> {
    found.and_then(|n| u32::try_from(n).ok())
}

/// Keep step 0 at least as tall as the header it scrolls past.
fn size_first_step(doc: &WebDocument) {
    let html = |id| doc.element_by_id(id).and_then(|el| el.dyn_into::<HtmlElement>().ok());
    let (Some(upper), Some(step)) = (html(ids::UPPER_CONTENT), html(ids::STEP0)) else { return };
    let height = events::step_min_height(upper.offset_height());
    if let Err(e) = step.style().set_property("min-height", &height) {
        tracing::warn!(error = ?e, "could not size first scroll step");
    }
}

fn step_handler(page: &SharedPage, observer: &Rc<ScrollStepObserver>, enter: bool) -> Closure<dyn FnMut(JsValue)> {
    let page = Rc::clone(page);
    let observer = Rc::clone(observer);
    Closure::new(move |response: JsValue| {
        let event: StepEvent = match serde_wasm_bindgen::from_value(response) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable step event");
                return;
            }
        };
        with_page(&page, |page| {
            if enter {
                observer.on_step_enter(page, event);
            } else {
                observer.on_step_exit(page, event);
            }
        });
    })
}

/// A single transcript page: line filters, search and the sticky chrome.
#[wasm_bindgen]
pub struct TranscriptPage {
    page: SharedPage,
}

#[wasm_bindgen]
impl TranscriptPage {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<TranscriptPage, JsValue> {
        let (_, page) = open_page()?;

        let target = Rc::clone(&page);
        listen_by_id(&page, ids::QUICKSEARCH, "keyup", move |event| {
            let Some(key) = key_of(&event) else { return };
            with_page(&target, |page| {
                let value = page.doc.value_of(ids::QUICKSEARCH).unwrap_or_default();
                TRANSCRIPT.on_search_key(page, &key, &value);
            });
        });

        let target = Rc::clone(&page);
        listen_by_id(&page, ids::GO_BUTTON, "click", move |_| {
            with_page(&target, |page| {
                let value = page.doc.value_of(ids::QUICKSEARCH).unwrap_or_default();
                TRANSCRIPT.search(page, &value);
            });
        });

        let target = Rc::clone(&page);
        listen_by_id(&page, ids::FILTERS, "change", move |_| {
            with_page(&target, |page| {
                let tag = page.doc.value_of(ids::FILTERS).unwrap_or_default();
                TRANSCRIPT.filter_by_tag(page, &tag);
            });
        });

        let target = Rc::clone(&page);
        listen_by_id(&page, ids::SEARCH_RESULTS, "change", move |_| {
            dispatch(&target, |page| {
                let line = page.doc.value_of(ids::SEARCH_RESULTS).unwrap_or_default();
                TRANSCRIPT.scroll_to_line(page, &line)
            });
        });

        let target = Rc::clone(&page);
        listen_by_id(&page, ids::FILTER_TAB, "click", move |_| {
            with_page(&target, |page| TRANSCRIPT.toggle_filter_panel(page));
        });

        let target = Rc::clone(&page);
        listen_by_id(&page, ids::SCROLL_TO_TOP, "click", move |_| {
            dispatch(&target, |page| TRANSCRIPT.scroll_to_top(page));
        });

        dispatch(&page, |page| TRANSCRIPT.init_from_url(page));
        size_first_step(&page.borrow().doc);

        let mut tracker = ScrollamaTracker::default();
        let observer = ScrollStepObserver::setup(&*page.borrow(), &mut tracker);
        if let Some(observer) = observer.map(Rc::new) {
            let enter = step_handler(&page, &observer, true);
            let exit = step_handler(&page, &observer, false);
            tracker.listen(enter.as_ref().unchecked_ref(), exit.as_ref().unchecked_ref());
            enter.forget();
            exit.forget();
        }

        tracing::info!("transcript page ready");
        Ok(TranscriptPage { page })
    }

    /// Filter lines by tag. Returns the number of dropdown sections.
    #[wasm_bindgen(js_name = filterLines)]
    pub fn filter_lines(&self, tag: &str) -> Option<u32> {
        count(with_page(&self.page, |page| TRANSCRIPT.filter_by_tag(page, tag)).flatten())
    }

    /// Search line text. Returns the number of matching lines.
    #[wasm_bindgen(js_name = searchLines)]
    pub fn search_lines(&self, query: &str) -> Option<u32> {
        count(with_page(&self.page, |page| TRANSCRIPT.search(page, query)).flatten())
    }

    #[wasm_bindgen(js_name = scrollToLine)]
    pub fn scroll_to_line(&self, line_id: &str) {
        dispatch(&self.page, |page| TRANSCRIPT.scroll_to_line(page, line_id));
    }

    #[wasm_bindgen(js_name = resetFiltersAndSearch)]
    pub fn reset_filters_and_search(&self) {
        with_page(&self.page, |page| TRANSCRIPT.reset(page));
    }
}

/// The overview page: every transcript's timeline plus the results table.
#[wasm_bindgen]
pub struct VisualizationPage {
    page: SharedPage,
}

#[wasm_bindgen]
impl VisualizationPage {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<VisualizationPage, JsValue> {
        let (window, page) = open_page()?;
        let selectors = {
            let shell = page.borrow();
            (
                shell.doc.select_all(&format!(".{}", classes::LEGEND)),
                shell.doc.select_all(&format!("h3.{}", classes::TOGGLE_INT)),
                shell.doc.select_all("svg[role=\"button\"]"),
            )
        };
        let (legends, toggles, buttons) = selectors;

        for legend in legends {
            let target = Rc::clone(&page);
            let node = legend.clone();
            listen(&legend, "click", move |_| {
                dispatch(&target, |page| OVERVIEW.activate_legend(page, &node));
            });
        }

        for heading in toggles {
            let target = Rc::clone(&page);
            let node = heading.clone();
            listen(&heading, "click", move |_| {
                with_page(&target, |page| OVERVIEW.activate_interview_toggle(page, &node));
            });
        }

        let target = Rc::clone(&page);
        listen_by_id(&page, ids::RESET, "click", move |_| {
            dispatch(&target, |page| OVERVIEW.reset(page));
        });

        for button in buttons {
            let node: Element = button.clone();
            listen(&button, "keydown", move |event| {
                if !key_of(&event).is_some_and(|key| events::is_activation_key(&key)) {
                    return;
                }
                event.prevent_default();
                let init = EventInit::new();
                init.set_bubbles(true);
                let dispatched = Event::new_with_event_init_dict("click", &init)
                    .and_then(|click| node.dispatch_event(&click));
                if let Err(e) = dispatched {
                    tracing::warn!(error = ?e, "synthetic click failed");
                }
            });
        }

        let base_url = browser::base_url(&page.borrow().doc);
        let loader = TranscriptLoader::new(BrowserFetch::new(window.clone()), &base_url);
        let transcript_ids = browser::available_transcripts(&window);
        let target = Rc::clone(&page);
        wasm_bindgen_futures::spawn_local(async move {
            tracing::info!(transcripts = transcript_ids.len(), "initializing transcript visualization");
            loader.load_all(&transcript_ids).await;
            dispatch(&target, |page| render::populate(page, &loader, &transcript_ids, &OVERVIEW));
        });

        tracing::info!("visualization page ready");
        Ok(VisualizationPage { page })
    }

    #[wasm_bindgen(js_name = filterByTag)]
    pub fn filter_by_tag(&self, tag: &str) {
        dispatch(&self.page, |page| OVERVIEW.filter_by_tag(page, tag));
    }

    #[wasm_bindgen(js_name = filterByInterview)]
    pub fn filter_by_interview(&self, interview: &str) {
        with_page(&self.page, |page| OVERVIEW.filter_by_interview(page, interview));
    }

    pub fn reset(&self) {
        dispatch(&self.page, |page| OVERVIEW.reset(page));
    }
}
