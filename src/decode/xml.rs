//! A tiny owned-arena XML DOM, built once from `quick_xml` events.
//!
//! The GPIF schema is relational rather than tree-shaped: entities in flat
//! collections (`Tracks`, `Bars`, `Voices`, `Beats`, `Notes`, `Rhythms`) are
//! referenced by string IDs carried as attributes or as link-element text.
//! A streaming SAX walk can't resolve those references without re-reading
//! the document, so here the whole tree is buffered once into an arena and
//! indexed by `(local tag name, id attribute)` in a single pass.
//!
//! The root element's default namespace (if any) is stripped from every
//! tag comparison so namespaced and non-namespaced documents parse
//! identically.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::errors::DecodeError;

pub type NodeId = usize;

#[derive(Debug, Default)]
pub struct Node {
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub children: Vec<NodeId>,
}

/// An owned XML tree plus a local-tag-name → id → node index, built in one
/// traversal.
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    index: HashMap<String, HashMap<String, NodeId>>,
}

fn strip_ns(qualified: &str) -> &str {
    match qualified.rsplit_once(':') {
        Some((_, local)) => local,
        None => qualified,
    }
}

fn node_from_start(e: &BytesStart) -> Node {
    let qualified = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let tag = strip_ns(&qualified).to_string();
    let mut attrs = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let key = strip_ns(&key).to_string();
        let value = attr
            .unescape_value()
            .map(|v| v.to_string())
            .unwrap_or_default();
        attrs.insert(key, value);
    }
    Node {
        tag,
        attrs,
        text: String::new(),
        children: Vec::new(),
    }
}

impl Dom {
    pub fn parse(xml: &str) -> Result<Self, DecodeError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let node = node_from_start(&e);
                    let id = nodes.len();
                    nodes.push(node);
                    if let Some(&parent) = stack.last() {
                        nodes[parent].children.push(id);
                    } else {
                        root = Some(id);
                    }
                    stack.push(id);
                }
                Ok(Event::Empty(e)) => {
                    let node = node_from_start(&e);
                    let id = nodes.len();
                    nodes.push(node);
                    if let Some(&parent) = stack.last() {
                        nodes[parent].children.push(id);
                    } else {
                        root = Some(id);
                    }
                }
                Ok(Event::Text(t)) => {
                    if let Some(&current) = stack.last() {
                        let text = t.unescape().unwrap_or_default();
                        nodes[current].text.push_str(&text);
                    }
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(DecodeError::InvalidXml(e)),
                _ => {}
            }
            buf.clear();
        }

        let root = root.ok_or_else(|| {
            DecodeError::InvalidContainer("GPIF document has no root element".to_string())
        })?;

        let mut dom = Self {
            nodes,
            root,
            index: HashMap::new(),
        };
        dom.build_index();
        Ok(dom)
    }

    fn build_index(&mut self) {
        let mut index: HashMap<String, HashMap<String, NodeId>> = HashMap::new();
        for (id, node) in self.nodes.iter().enumerate() {
            if let Some(eid) = node.attrs.get("id") {
                index
                    .entry(node.tag.clone())
                    .or_default()
                    .insert(eid.clone(), id);
            }
        }
        self.index = index;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Resolve an element by local tag name and id attribute. Returns
    /// `None` for a dangling reference — the caller is responsible for
    /// recording a `DecodeWarning::DanglingReference` and skipping.
    pub fn by_id(&self, tag: &str, id: &str) -> Option<NodeId> {
        self.index.get(tag)?.get(id).copied()
    }

    /// First direct child with the given local tag name.
    pub fn child(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].tag == tag)
    }

    /// All direct children with the given local tag name, in document order.
    pub fn children(&self, parent: NodeId, tag: &str) -> Vec<NodeId> {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .filter(|&c| self.nodes[c].tag == tag)
            .collect()
    }

    /// Trimmed text content of the first direct child with the given tag.
    pub fn child_text(&self, parent: NodeId, tag: &str) -> Option<&str> {
        let child = self.child(parent, tag)?;
        Some(self.nodes[child].text.trim())
    }

    pub fn text(&self, id: NodeId) -> &str {
        self.nodes[id].text.trim()
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id].attrs.get(name).map(|s| s.as_str())
    }

    /// Whitespace-separated tokens of a direct child's text, e.g. the
    /// `<Bars>100 101</Bars>` link-list pattern.
    pub fn child_ref_list(&self, parent: NodeId, tag: &str) -> Vec<String> {
        self.child_text(parent, tag)
            .map(|t| t.split_whitespace().map(|s| s.to_string()).collect())
            .unwrap_or_default()
    }
}
