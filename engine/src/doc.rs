//! Scene model: the element tree the engine manipulates.
//!
//! The host mirrors the rendered document into a [`Scene`]: one [`Node`] per
//! element that matters (slides, containers, manipulable elements), in
//! document order, with parent links. Each node carries two declaration
//! stores: `style` (what is rendered, including intermediate drag frames)
//! and `shadow` (the committed snapshot used for delta computation).
//!
//! Layout (rects, margins, hit-testing) is not stored here; it is queried
//! through [`crate::layout::Layout`].

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Declarations, Field};

/// Host-assigned identifier of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of box a node renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A generic element that is itself the positioned box.
    #[default]
    Block,
    /// A replaced element with an intrinsic content box (images).
    Image,
    /// A slide grouping; only the present slide's proxies are shown.
    Slide,
}

impl NodeKind {
    /// Whether the rendered content box can differ from the positioned box
    /// (margins, late decode), so the proxy must be placed independently.
    #[must_use]
    pub fn has_intrinsic_content(self) -> bool {
        matches!(self, Self::Image)
    }
}

/// One element of the rendered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub kind: NodeKind,
    /// Eligible for direct manipulation.
    #[serde(default)]
    pub manipulable: bool,
    /// Document-source index used when talking to the service.
    #[serde(default)]
    pub md_index: Option<u32>,
    #[serde(default)]
    pub classes: Vec<String>,
    /// Live inline style.
    #[serde(default)]
    pub style: Declarations,
    /// Committed geometry snapshot.
    #[serde(default)]
    pub shadow: Declarations,
    /// For slides: currently presented.
    #[serde(default)]
    pub present: bool,
    /// A commit for this element is in flight.
    #[serde(skip)]
    pub updating: bool,
}

impl Node {
    /// A plain block with no declarations.
    #[must_use]
    pub fn new(id: NodeId, parent: Option<NodeId>, kind: NodeKind) -> Self {
        Self {
            id,
            parent,
            kind,
            manipulable: false,
            md_index: None,
            classes: Vec::new(),
            style: Declarations::new(),
            shadow: Declarations::new(),
            present: false,
            updating: false,
        }
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Copy explicitly set style values into the shadow store, without
    /// overwriting shadow values that already exist.
    pub fn seed_shadow(&mut self) {
        for field in Field::ALL {
            if self.shadow.is_set(field) {
                continue;
            }
            if let Some(value) = self.style.get(field) {
                let value = value.to_owned();
                self.shadow.set(field, value);
            }
        }
    }
}

/// In-memory element tree, in document order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all nodes. The input order is taken as document order.
    pub fn load_snapshot(&mut self, nodes: Vec<Node>) {
        self.nodes.clear();
        self.order.clear();
        for node in nodes {
            self.insert(node);
        }
    }

    /// Insert or replace a node. New nodes are appended to document order.
    pub fn insert(&mut self, node: Node) {
        if !self.nodes.contains_key(&node.id) {
            self.order.push(node.id);
        }
        self.nodes.insert(node.id, node);
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Strict ancestors of `id`, nearest first. Bounded by the node count so
    /// a malformed parent cycle cannot loop forever.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        let mut next = self.nodes.get(&id).and_then(|n| n.parent);
        let mut remaining = self.nodes.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let node = self.nodes.get(&next?)?;
            next = node.parent;
            Some(node)
        })
    }

    /// Number of manipulable ancestors.
    #[must_use]
    pub fn manipulable_depth(&self, id: NodeId) -> usize {
        self.ancestors(id).filter(|n| n.manipulable).count()
    }

    /// Nearest manipulable strict ancestor.
    #[must_use]
    pub fn manipulable_ancestor(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|n| n.manipulable).map(|n| n.id)
    }

    /// `id` itself when manipulable, otherwise its nearest manipulable ancestor.
    #[must_use]
    pub fn nearest_manipulable(&self, id: NodeId) -> Option<NodeId> {
        match self.nodes.get(&id) {
            Some(node) if node.manipulable => Some(id),
            Some(_) => self.manipulable_ancestor(id),
            None => None,
        }
    }

    /// The slide grouping enclosing `id`, if any.
    #[must_use]
    pub fn enclosing_slide(&self, id: NodeId) -> Option<&Node> {
        self.ancestors(id).find(|n| n.kind == NodeKind::Slide)
    }

    /// Mark `slide` as the presented slide and every other slide as not.
    /// Returns false when `slide` is not a slide node.
    pub fn set_present_slide(&mut self, slide: NodeId) -> bool {
        if self.nodes.get(&slide).map(|n| n.kind) != Some(NodeKind::Slide) {
            return false;
        }
        for node in self.nodes.values_mut() {
            if node.kind == NodeKind::Slide {
                node.present = node.id == slide;
            }
        }
        true
    }

    /// Manipulable nodes in document order.
    #[must_use]
    pub fn manipulable_ids(&self) -> Vec<NodeId> {
        self.iter().filter(|n| n.manipulable).map(|n| n.id).collect()
    }

    /// Class list sent to the service: all classes but the positioning marker.
    #[must_use]
    pub fn wire_classes(&self, id: NodeId) -> Vec<String> {
        self.nodes
            .get(&id)
            .map(|n| {
                n.classes
                    .iter()
                    .filter(|c| c.as_str() != protocol::POSITIONING_CLASS)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
