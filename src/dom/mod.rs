//! Document abstraction
//!
//! Controllers never touch a browser directly. They talk to a [`Document`],
//! which the browser shell implements over `web-sys` and which
//! [`MemoryDocument`] implements as a plain arena for tests and pre-rendering.
//!
//! Lookups return `Option` / `Vec` rather than erroring: a missing optional
//! region is an ordinary outcome and callers pattern-match on it.

pub mod markup;
pub mod memory;

pub use markup::{ElementSpec, Markup};
pub use memory::{MemoryDocument, NodeId};

use crate::error::DomError;
use std::fmt;

/// Where to place an element when scrolling it into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAlign {
    Start,
    Center,
}

/// A tag name and/or a single class name, matched in document order.
///
/// `Query::tag_class("section", "contentsdiv")` is the equivalent of the CSS
/// selector `section.contentsdiv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query<'a> {
    pub tag: Option<&'a str>,
    pub class: Option<&'a str>,
}

impl<'a> Query<'a> {
    /// Matches every element.
    pub const ANY: Query<'static> = Query { tag: None, class: None };

    pub const fn tag(tag: &'a str) -> Self {
        Self { tag: Some(tag), class: None }
    }

    pub const fn class(class: &'a str) -> Self {
        Self { tag: None, class: Some(class) }
    }

    pub const fn tag_class(tag: &'a str, class: &'a str) -> Self {
        Self { tag: Some(tag), class: Some(class) }
    }

    /// Check a candidate element. Tag names compare case-insensitively.
    pub fn matches(&self, tag_name: &str, has_class: impl Fn(&str) -> bool) -> bool {
        if let Some(tag) = self.tag {
            if !tag.eq_ignore_ascii_case(tag_name) {
                return false;
            }
        }
        match self.class {
            Some(class) => has_class(class),
            None => true,
        }
    }
}

/// The DOM operations the controllers need.
///
/// `Node` is an opaque element handle. Every mutation takes `&mut self` so an
/// implementation can track state (focus, scroll position) without interior
/// mutability.
pub trait Document {
    type Node: Clone + fmt::Debug;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// All elements matching `query`, in document order. With a `scope`, only
    /// descendants of that element are considered.
    fn query_all(&self, scope: Option<&Self::Node>, query: &Query<'_>) -> Vec<Self::Node>;

    fn query_first(&self, scope: Option<&Self::Node>, query: &Query<'_>) -> Option<Self::Node> {
        self.query_all(scope, query).into_iter().next()
    }

    /// Parent element, if `node` is attached below another element.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Nearest inclusive ancestor matching `query`.
    fn closest(&self, node: &Self::Node, query: &Query<'_>) -> Option<Self::Node>;

    fn classes(&self, node: &Self::Node) -> Vec<String>;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool {
        self.classes(node).iter().any(|c| c == class)
    }

    fn add_class(&mut self, node: &Self::Node, class: &str);

    fn remove_class(&mut self, node: &Self::Node, class: &str);

    /// Returns whether the class is present afterwards.
    fn toggle_class(&mut self, node: &Self::Node, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            true
        }
    }

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    fn text_content(&self, node: &Self::Node) -> String;

    fn set_text_content(&mut self, node: &Self::Node, text: &str);

    /// Replace every child of `node` with freshly built `children`.
    fn replace_children(&mut self, node: &Self::Node, children: &[Markup]) -> Result<(), DomError>;

    /// Set the current value of a form control.
    fn set_value(&mut self, node: &Self::Node, value: &str);

    /// Select the first option of a `<select>`.
    fn reset_selection(&mut self, node: &Self::Node);

    fn focus(&mut self, node: &Self::Node);

    fn scroll_into_view(&mut self, node: &Self::Node, align: ScrollAlign);
}

/// Remove every class on `node` that starts with `prefix`.
pub fn remove_classes_with_prefix<D: Document>(doc: &mut D, node: &D::Node, prefix: &str) {
    for class in doc.classes(node) {
        if class.starts_with(prefix) {
            doc.remove_class(node, &class);
        }
    }
}

/// Whether `node` carries attribute `name` with exactly `value`.
pub fn attribute_is<D: Document>(doc: &D, node: &D::Node, name: &str, value: &str) -> bool {
    doc.attribute(node, name).as_deref() == Some(value)
}

/// Split a `class` attribute into its tokens.
pub fn class_tokens(attr: Option<&str>) -> Vec<String> {
    attr.map(|value| value.split_whitespace().map(ToOwned::to_owned).collect())
        .unwrap_or_default()
}
