//! `Document` over the live browser DOM.
//!
//! Only compiled on `wasm32` targets.

use transcript_explorer::dom::{class_tokens, Document, Markup, Query, ScrollAlign};
use transcript_explorer::DomError;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Element, HtmlCollection, HtmlElement, HtmlInputElement, HtmlSelectElement, ScrollBehavior,
    ScrollIntoViewOptions, ScrollLogicalPosition, SvgElement,
};

fn dom_error(context: &str, err: JsValue) -> DomError {
    DomError::Operation(format!("{}: {:?}", context, err))
}

fn collect(collection: HtmlCollection) -> Vec<Element> {
    (0..collection.length()).filter_map(|i| collection.item(i)).collect()
}

pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    /// Current value of an `<input>` or `<select>`, by element id.
    pub fn value_of(&self, id: &str) -> Option<String> {
        let element = self.document.get_element_by_id(id)?;
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            return Some(input.value());
        }
        element.dyn_ref::<HtmlSelectElement>().map(HtmlSelectElement::value)
    }

    /// Every element matching a CSS selector, for one-off wiring.
    pub fn select_all(&self, selector: &str) -> Vec<Element> {
        let Ok(nodes) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn matches(element: &Element, query: &Query<'_>) -> bool {
        query.matches(&element.local_name(), |class| element.class_list().contains(class))
    }

    fn build(&self, markup: &Markup) -> Result<web_sys::Node, DomError> {
        match markup {
            Markup::Text(text) => Ok(self.document.create_text_node(text).into()),
            Markup::Element(spec) => {
                let element = self
                    .document
                    .create_element(&spec.tag)
                    .map_err(|e| dom_error("create element", e))?;
                for (name, value) in &spec.attrs {
                    element.set_attribute(name, value).map_err(|e| dom_error("set attribute", e))?;
                }
                for child in &spec.children {
                    let child = self.build(child)?;
                    element.append_child(&child).map_err(|e| dom_error("append child", e))?;
                }
                Ok(element.into())
            }
        }
    }
}

impl Document for WebDocument {
    type Node = Element;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query_all(&self, scope: Option<&Element>, query: &Query<'_>) -> Vec<Element> {
        let candidates = match (scope, query.class, query.tag) {
            (Some(scope), Some(class), _) => scope.get_elements_by_class_name(class),
            (Some(scope), None, Some(tag)) => scope.get_elements_by_tag_name(tag),
            (Some(scope), None, None) => scope.get_elements_by_tag_name("*"),
            (None, Some(class), _) => self.document.get_elements_by_class_name(class),
            (None, None, Some(tag)) => self.document.get_elements_by_tag_name(tag),
            (None, None, None) => self.document.get_elements_by_tag_name("*"),
        };
        collect(candidates).into_iter().filter(|el| Self::matches(el, query)).collect()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn closest(&self, node: &Element, query: &Query<'_>) -> Option<Element> {
        let mut cursor = Some(node.clone());
        while let Some(current) = cursor {
            if Self::matches(&current, query) {
                return Some(current);
            }
            cursor = current.parent_element();
        }
        None
    }

    fn classes(&self, node: &Element) -> Vec<String> {
        class_tokens(node.get_attribute("class").as_deref())
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().add_1(class) {
            tracing::warn!(class, error = ?e, "classList.add failed");
        }
    }

    fn remove_class(&mut self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().remove_1(class) {
            tracing::warn!(class, error = ?e, "classList.remove failed");
        }
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) {
        if let Err(e) = node.set_attribute(name, value) {
            tracing::warn!(name, error = ?e, "setAttribute failed");
        }
    }

    fn remove_attribute(&mut self, node: &Element, name: &str) {
        if let Err(e) = node.remove_attribute(name) {
            tracing::warn!(name, error = ?e, "removeAttribute failed");
        }
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn replace_children(&mut self, node: &Element, children: &[Markup]) -> Result<(), DomError> {
        let built = children.iter().map(|child| self.build(child)).collect::<Result<Vec<_>, _>>()?;
        while let Some(old) = node.first_child() {
            node.remove_child(&old).map_err(|e| dom_error("remove child", e))?;
        }
        for child in built {
            node.append_child(&child).map_err(|e| dom_error("append child", e))?;
        }
        Ok(())
    }

    fn set_value(&mut self, node: &Element, value: &str) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        }
    }

    fn reset_selection(&mut self, node: &Element) {
        if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.set_selected_index(0);
        }
    }

    fn focus(&mut self, node: &Element) {
        let result = if let Some(html) = node.dyn_ref::<HtmlElement>() {
            html.focus()
        } else if let Some(svg) = node.dyn_ref::<SvgElement>() {
            svg.focus()
        } else {
            Ok(())
        };
        if let Err(e) = result {
            tracing::warn!(error = ?e, "focus failed");
        }
    }

    fn scroll_into_view(&mut self, node: &Element, align: ScrollAlign) {
        let options = ScrollIntoViewOptions::new();
        match align {
            ScrollAlign::Center => {
                options.set_behavior(ScrollBehavior::Smooth);
                options.set_block(ScrollLogicalPosition::Center);
            }
            ScrollAlign::Start => options.set_block(ScrollLogicalPosition::Start),
        }
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }
}
