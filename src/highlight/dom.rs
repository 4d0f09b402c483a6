//! Arena DOM for rendered page content.
//!
//! Nodes live in one vector and link to each other by index. The highlight
//! engine needs cheap sibling surgery (insert a fragment before a text node,
//! detach the original) and stable handles across those edits, which an
//! index arena gives without reference counting.

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, QualName, ns};

use super::tree_sink::DomSink;

/// Index of a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_some(self) -> bool {
        self != Self::NONE
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
    Doctype(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// An attribute in no namespace.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Arena-allocated HTML tree.
///
/// Detached nodes stay in the arena; they are simply unreachable from the
/// document root.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        dom.document = dom.alloc(NodeData::Document);
        dom
    }

    /// Parse an HTML document or fragment. Malformed markup is repaired the
    /// way browsers repair it.
    pub fn parse(html: &str) -> Self {
        parse_document(DomSink::new(), ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes())
            .into_dom()
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The `<body>` element, or the document when there is none.
    pub fn body(&self) -> NodeId {
        self.find_by_tag("body").unwrap_or(self.document)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(NodeData::Element { name, attrs })
    }

    /// Create an element in the HTML namespace.
    pub fn create_html_element(&mut self, tag: &str, attrs: Vec<Attribute>) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(tag));
        self.create_element(name, attrs)
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(text.into()))
    }

    pub fn create_doctype(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Doctype(name.into()))
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last = self.get(parent).map_or(NodeId::NONE, |n| n.last_child);

        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            node.prev_sibling = last;
        }
        if let Some(node) = self.get_mut(last) {
            node.next_sibling = child;
        }
        if let Some(node) = self.get_mut(parent) {
            if node.first_child.is_none() {
                node.first_child = child;
            }
            node.last_child = child;
        }
    }

    /// Insert `new_node` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        self.detach(new_node);
        let Some((parent, prev)) = self.get(sibling).map(|n| (n.parent, n.prev_sibling)) else {
            return;
        };

        if let Some(node) = self.get_mut(new_node) {
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = sibling;
        }
        if let Some(node) = self.get_mut(sibling) {
            node.prev_sibling = new_node;
        }
        if prev.is_some() {
            if let Some(node) = self.get_mut(prev) {
                node.next_sibling = new_node;
            }
        } else if let Some(node) = self.get_mut(parent) {
            node.first_child = new_node;
        }
    }

    /// Append text to `parent`, extending its last child when that is text.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last = self.get(parent).map_or(NodeId::NONE, |n| n.last_child);
        if let Some(Node {
            data: NodeData::Text(existing),
            ..
        }) = self.get_mut(last)
        {
            existing.push_str(text);
            return;
        }
        let node = self.create_text(text);
        self.append(parent, node);
    }

    /// Unlink a node from its parent and siblings. Its subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        let Some((parent, prev, next)) = self
            .get(id)
            .map(|n| (n.parent, n.prev_sibling, n.next_sibling))
        else {
            return;
        };

        if prev.is_some() {
            if let Some(node) = self.get_mut(prev) {
                node.next_sibling = next;
            }
        } else if let Some(node) = self.get_mut(parent) {
            node.first_child = next;
        }

        if next.is_some() {
            if let Some(node) = self.get_mut(next) {
                node.prev_sibling = prev;
            }
        } else if let Some(node) = self.get_mut(parent) {
            node.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    pub fn children(&self, parent: NodeId) -> Children<'_> {
        Children {
            dom: self,
            next: self.get(parent).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Every node below `root` in document order, `root` excluded.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children: Vec<NodeId> = self.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// First element with the given tag in document order.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.document)
            .into_iter()
            .find(|&id| self.tag_name(id) == Some(tag))
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, attr: &str) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    /// Whether the element's `class` attribute lists `class`.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|value| value.split_whitespace().any(|c| c == class))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of every text node below `root`.
    pub fn text_content(&self, root: NodeId) -> String {
        if let Some(text) = self.text(root) {
            return text.to_string();
        }
        self.descendants(root)
            .into_iter()
            .filter_map(|id| self.text(id))
            .collect()
    }

    /// Merge adjacent text nodes and drop empty ones below `root`.
    pub fn normalize_text(&mut self, root: NodeId) {
        let mut parents = vec![root];
        parents.extend(
            self.descendants(root)
                .into_iter()
                .filter(|&id| matches!(self.get(id).map(|n| &n.data), Some(NodeData::Element { .. }))),
        );

        for parent in parents {
            let children: Vec<NodeId> = self.children(parent).collect();
            let mut run_head = NodeId::NONE;
            for child in children {
                let Some(text) = self.text(child).map(str::to_owned) else {
                    run_head = NodeId::NONE;
                    continue;
                };
                if text.is_empty() {
                    self.detach(child);
                } else if let Some(Node {
                    data: NodeData::Text(head),
                    ..
                }) = self.get_mut(run_head)
                {
                    head.push_str(&text);
                    self.detach(child);
                } else {
                    run_head = child;
                }
            }
        }
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    dom: &'a Dom,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next;
        let node = self.dom.get(current)?;
        self.next = node.next_sibling;
        Some(current)
    }
}
