//! Arena-backed in-memory document
//!
//! Nodes live in a `Vec` and are addressed by [`NodeId`]. Removed subtrees
//! stay in the arena but are unreachable from the root, so lookups never see
//! them. Focus and scroll requests are recorded for assertions.

use super::{class_tokens, Document, ElementSpec, Markup, Query, ScrollAlign};
use crate::error::DomError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Root,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        value: String,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<NodeData>,
    root: NodeId,
    focused: Option<NodeId>,
    scrolled: Vec<(NodeId, ScrollAlign)>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        let root = NodeData { parent: None, children: Vec::new(), kind: NodeKind::Root };
        Self { nodes: vec![root], root: NodeId(0), focused: None, scrolled: Vec::new() }
    }

    /// Build a document whose body is `markup`.
    pub fn from_markup(markup: &[Markup]) -> Self {
        let mut doc = Self::new();
        for node in markup {
            doc.append(None, node);
        }
        doc
    }

    /// Append `markup` under `parent` (or the root) and return the new node.
    pub fn append(&mut self, parent: Option<NodeId>, markup: &Markup) -> NodeId {
        let parent = parent.unwrap_or(self.root);
        let kind = match markup {
            Markup::Text(text) => NodeKind::Text(text.clone()),
            Markup::Element(ElementSpec { tag, attrs, .. }) => {
                let value = attrs
                    .iter()
                    .find(|(n, _)| n == "value")
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                NodeKind::Element { tag: tag.clone(), attrs: attrs.clone(), value }
            }
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData { parent: Some(parent), children: Vec::new(), kind });
        self.nodes[parent.0].children.push(id);
        if let Markup::Element(spec) = markup {
            for child in &spec.children {
                self.append(Some(id), child);
            }
        }
        id
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn last_scrolled(&self) -> Option<(NodeId, ScrollAlign)> {
        self.scrolled.last().copied()
    }

    /// Current value of a form control.
    pub fn value(&self, node: &NodeId) -> &str {
        match &self.nodes[node.0].kind {
            NodeKind::Element { value, .. } => value,
            _ => "",
        }
    }

    /// Rebuild the subtree under `node` as markup.
    pub fn to_markup(&self, node: &NodeId) -> Markup {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => Markup::Text(text.clone()),
            NodeKind::Root => ElementSpec::new("body")
                .children(self.nodes[node.0].children.iter().map(|c| self.to_markup(c)))
                .into(),
            NodeKind::Element { tag, attrs, .. } => Markup::Element(ElementSpec {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: self.nodes[node.0].children.iter().map(|c| self.to_markup(c)).collect(),
            }),
        }
    }

    pub fn inner_html(&self, node: &NodeId) -> String {
        let children: Vec<Markup> =
            self.nodes[node.0].children.iter().map(|c| self.to_markup(c)).collect();
        super::markup::to_html(&children)
    }

    fn element_tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    fn attrs(&self, node: NodeId) -> Option<&Vec<(String, String)>> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    fn attrs_mut(&mut self, node: NodeId) -> Option<&mut Vec<(String, String)>> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    fn matches(&self, node: NodeId, query: &Query<'_>) -> bool {
        match self.element_tag(node) {
            Some(tag) => query.matches(tag, |class| self.has_class(&node, class)),
            None => false,
        }
    }

    /// Pre-order walk of the descendants of `from`.
    fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[from.0].children.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
        }
        out
    }

    fn detach_children(&mut self, node: NodeId) {
        let old = std::mem::take(&mut self.nodes[node.0].children);
        for child in old {
            self.nodes[child.0].parent = None;
        }
    }

    fn write_classes(&mut self, node: NodeId, classes: Vec<String>) {
        if let Some(attrs) = self.attrs_mut(node) {
            attrs.retain(|(n, _)| n != "class");
            if !classes.is_empty() {
                attrs.push(("class".to_string(), classes.join(" ")));
            }
        }
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root).into_iter().find(|n| {
            self.attrs(*n)
                .is_some_and(|attrs| attrs.iter().any(|(name, v)| name == "id" && v == id))
        })
    }

    fn query_all(&self, scope: Option<&NodeId>, query: &Query<'_>) -> Vec<NodeId> {
        let from = scope.copied().unwrap_or(self.root);
        self.descendants(from).into_iter().filter(|n| self.matches(*n, query)).collect()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent.filter(|p| self.element_tag(*p).is_some())
    }

    fn closest(&self, node: &NodeId, query: &Query<'_>) -> Option<NodeId> {
        let mut cursor = Some(*node);
        while let Some(current) = cursor {
            if self.matches(current, query) {
                return Some(current);
            }
            cursor = self.nodes[current.0].parent;
        }
        None
    }

    fn classes(&self, node: &NodeId) -> Vec<String> {
        class_tokens(self.attribute(node, "class").as_deref())
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        let mut classes = self.classes(node);
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            self.write_classes(*node, classes);
        }
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) {
        let mut classes = self.classes(node);
        let before = classes.len();
        classes.retain(|c| c != class);
        if classes.len() != before {
            self.write_classes(*node, classes);
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.attrs(*node)?.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone())
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if let Some(attrs) = self.attrs_mut(*node) {
            match attrs.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        if let Some(attrs) = self.attrs_mut(*node) {
            attrs.retain(|(n, _)| n != name);
        }
    }

    fn text_content(&self, node: &NodeId) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => text.clone(),
            _ => self.nodes[node.0].children.iter().map(|c| self.text_content(c)).collect(),
        }
    }

    fn set_text_content(&mut self, node: &NodeId, text: &str) {
        self.detach_children(*node);
        if !text.is_empty() {
            self.append(Some(*node), &Markup::text(text));
        }
    }

    fn replace_children(&mut self, node: &NodeId, children: &[Markup]) -> Result<(), DomError> {
        if matches!(self.nodes[node.0].kind, NodeKind::Text(_)) {
            return Err(DomError::Operation("cannot append children to a text node".into()));
        }
        self.detach_children(*node);
        for child in children {
            self.append(Some(*node), child);
        }
        Ok(())
    }

    fn set_value(&mut self, node: &NodeId, new_value: &str) {
        if let NodeKind::Element { value, .. } = &mut self.nodes[node.0].kind {
            *value = new_value.to_string();
        }
    }

    fn reset_selection(&mut self, node: &NodeId) {
        let first = self.query_first(Some(node), &Query::tag("option"));
        let value = first
            .map(|opt| self.attribute(&opt, "value").unwrap_or_else(|| self.text_content(&opt)))
            .unwrap_or_default();
        self.set_value(node, &value);
    }

    fn focus(&mut self, node: &NodeId) {
        self.focused = Some(*node);
    }

    fn scroll_into_view(&mut self, node: &NodeId, align: ScrollAlign) {
        self.scrolled.push((*node, align));
    }
}
