//! Layout capability: how the engine reaches the host's UI toolkit.
//!
//! The engine never measures or hit-tests on its own. The host implements
//! [`Layout`] over whatever toolkit renders the document; tests and the
//! replay command use [`StaticLayout`], a fixed in-memory snapshot.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use serde::{Deserialize, Serialize};

use crate::doc::NodeId;
use crate::geometry::{Margins, Point, Rect};

/// What a hit-test probe found under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// The proxy of the given manipulable element.
    Proxy(NodeId),
    /// A document node; the engine resolves it to its nearest manipulable
    /// ancestor.
    Node(NodeId),
}

/// Measurement and hit-testing queries against the rendered document.
pub trait Layout {
    /// Border box of `node` in client pixels, if rendered.
    fn rect(&self, node: NodeId) -> Option<Rect>;

    /// Computed margins of `node`.
    fn margins(&self, node: NodeId) -> Margins;

    /// The node `node` is positioned against, if the toolkit reports one.
    fn offset_parent(&self, node: NodeId) -> Option<NodeId>;

    /// Frame used when nothing closer contains an element.
    fn root_rect(&self) -> Rect;

    /// Resolve the deepest interactive target at `point`, treating the proxy
    /// of `skip` as pointer-transparent for the duration of the probe.
    fn target_at(&self, point: Point, skip: NodeId) -> Option<HitTarget>;
}

/// Layout facts about one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub id: NodeId,
    pub rect: Rect,
    #[serde(default)]
    pub margins: Margins,
    #[serde(default)]
    pub offset_parent: Option<NodeId>,
}

/// Fixed layout snapshot.
///
/// Entries are kept in paint order: when several rects contain a point, the
/// last one wins. Proxies are not modelled, so probes only ever return
/// [`HitTarget::Node`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticLayout {
    pub root: Rect,
    #[serde(default)]
    pub entries: Vec<LayoutEntry>,
}

impl StaticLayout {
    #[must_use]
    pub fn new(root: Rect) -> Self {
        Self { root, entries: Vec::new() }
    }

    /// Add or replace a node's rect, keeping its paint position on replace.
    pub fn place(&mut self, id: NodeId, rect: Rect) -> &mut LayoutEntry {
        let index = match self.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entries[index].rect = rect;
                index
            }
            None => {
                self.entries.push(LayoutEntry { id, rect, margins: Margins::default(), offset_parent: None });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    fn entry(&self, id: NodeId) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

impl Layout for StaticLayout {
    fn rect(&self, node: NodeId) -> Option<Rect> {
        self.entry(node).map(|e| e.rect)
    }

    fn margins(&self, node: NodeId) -> Margins {
        self.entry(node).map(|e| e.margins).unwrap_or_default()
    }

    fn offset_parent(&self, node: NodeId) -> Option<NodeId> {
        self.entry(node).and_then(|e| e.offset_parent)
    }

    fn root_rect(&self) -> Rect {
        self.root
    }

    fn target_at(&self, point: Point, _skip: NodeId) -> Option<HitTarget> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.rect.contains(point))
            .map(|e| HitTarget::Node(e.id))
    }
}
