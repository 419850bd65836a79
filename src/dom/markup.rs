//! Detached markup trees
//!
//! Controllers and the renderer describe new content as [`Markup`] rather
//! than raw HTML strings. A [`Document`](super::Document) materialises it,
//! and [`Markup::to_html`] serialises it with escaping when a string is
//! needed (pre-rendering, debugging).

use std::fmt::{self, Write};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    Element(ElementSpec),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Markup>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self { tag: tag.to_ascii_lowercase(), attrs: Vec::new(), children: Vec::new() }
    }

    /// Set an attribute, replacing any earlier value.
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
        self
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Append class tokens. Blank input is ignored.
    pub fn class(mut self, classes: &str) -> Self {
        let classes = classes.trim();
        if classes.is_empty() {
            return self;
        }
        match self.attrs.iter_mut().find(|(n, _)| n == "class") {
            Some(slot) if !slot.1.is_empty() => {
                slot.1.push(' ');
                slot.1.push_str(classes);
            }
            Some(slot) => slot.1 = classes.to_string(),
            None => self.attrs.push(("class".to_string(), classes.to_string())),
        }
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Markup::Text(text.into()));
        self
    }

    pub fn child(mut self, child: impl Into<Markup>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Markup>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }
}

impl From<ElementSpec> for Markup {
    fn from(spec: ElementSpec) -> Self {
        Markup::Element(spec)
    }
}

impl Markup {
    pub fn text(text: impl Into<String>) -> Self {
        Markup::Text(text.into())
    }

    pub fn write_html<W: Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Markup::Text(text) => out.write_str(&escape_text(text)),
            Markup::Element(el) => {
                write!(out, "<{}", el.tag)?;
                for (name, value) in &el.attrs {
                    write!(out, " {}=\"{}\"", name, escape_attr(value))?;
                }
                out.write_char('>')?;
                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    return Ok(());
                }
                for child in &el.children {
                    child.write_html(out)?;
                }
                write!(out, "</{}>", el.tag)
            }
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_html(&mut out);
        out
    }
}

/// Serialise a sequence of sibling nodes.
pub fn to_html(nodes: &[Markup]) -> String {
    let mut out = String::new();
    for node in nodes {
        let _ = node.write_html(&mut out);
    }
    out
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
