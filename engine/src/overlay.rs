//! Overlay registry: one invisible proxy per manipulable element.
//!
//! SYSTEM CONTEXT
//! ==============
//! Proxies capture pointer events on behalf of their elements. Block
//! elements get a proxy that simply covers them ([`ProxyStrategy::Cover`]).
//! Elements with an intrinsic content box (images) get an independently
//! positioned proxy whose frame is measured and margin-compensated against
//! the element's position parent ([`ProxyStrategy::MarginCompensated`]).
//!
//! Stacking increases with manipulable depth so that an inner proxy always
//! sits above its container's proxy. Because an outer proxy still covers the
//! inner element's area, hover and pointer-down are redirected to the
//! deepest proxy under the pointer.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::consts::{REMEASURE_DELAYS, Z_BASE, Z_DEPTH_STEP};
use crate::doc::{NodeId, NodeKind, Scene};
use crate::geometry::{Placement, Point, margin_compensated};
use crate::layout::{HitTarget, Layout};

/// How a proxy's frame is derived from its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyStrategy {
    /// The element is itself the positioned box; the proxy covers it.
    Cover,
    /// The rendered box is offset by margins; the proxy is measured and
    /// placed against the element's position parent.
    MarginCompensated,
}

impl ProxyStrategy {
    #[must_use]
    pub fn for_kind(kind: NodeKind) -> Self {
        if kind.has_intrinsic_content() { Self::MarginCompensated } else { Self::Cover }
    }
}

/// Fixed-delay retry schedule for degenerate measurements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { delays: REMEASURE_DELAYS.to_vec() }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based), or `None` once the
    /// schedule is exhausted.
    #[must_use]
    pub fn delay(&self, attempt: usize) -> Option<Duration> {
        self.delays.get(attempt).copied()
    }

    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.delays.len()
    }
}

/// Result of measuring a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measurement {
    /// The frame is up to date.
    Ready,
    /// Measure again after the given delay.
    Retry(Duration),
    /// Still degenerate after the last scheduled retry.
    Exhausted,
}

/// Pointer-capture region for one manipulable element.
#[derive(Debug, Clone, PartialEq)]
pub struct Proxy {
    pub element: NodeId,
    /// Stable registration order.
    pub ordinal: usize,
    /// Number of manipulable ancestors.
    pub depth: usize,
    pub z_index: i64,
    pub strategy: ProxyStrategy,
    /// Node the element is positioned against; `None` means the root frame.
    pub parent: Option<NodeId>,
    /// Last good frame, in percent of `parent`. Only margin-compensated
    /// proxies carry one.
    pub frame: Option<Placement>,
    /// Shown and pointer-active.
    pub visible: bool,
    attempts: usize,
}

impl Proxy {
    #[must_use]
    pub fn z_index_for(depth: usize, ordinal: usize) -> i64 {
        let depth = i64::try_from(depth).unwrap_or(i64::MAX / Z_DEPTH_STEP);
        let ordinal = i64::try_from(ordinal).unwrap_or(0);
        Z_BASE.saturating_add(depth.saturating_mul(Z_DEPTH_STEP)).saturating_add(ordinal)
    }
}

/// The position parent of `element`: its offset parent, else the nearest
/// manipulable ancestor marked with the positioning class, else the slide it
/// lives on.
#[must_use]
pub fn position_parent(scene: &Scene, layout: &impl Layout, element: NodeId) -> Option<NodeId> {
    if let Some(parent) = layout.offset_parent(element) {
        return Some(parent);
    }
    scene
        .ancestors(element)
        .find(|n| n.manipulable && n.has_class(protocol::POSITIONING_CLASS))
        .or_else(|| scene.enclosing_slide(element))
        .map(|n| n.id)
}

/// The frame a proxy's element moves within. Images use their position
/// parent; blocks use their nearest manipulable ancestor, else the offset
/// parent.
fn frame_parent(scene: &Scene, layout: &impl Layout, element: NodeId, strategy: ProxyStrategy) -> Option<NodeId> {
    match strategy {
        ProxyStrategy::MarginCompensated => position_parent(scene, layout, element),
        ProxyStrategy::Cover => scene.manipulable_ancestor(element).or_else(|| layout.offset_parent(element)),
    }
}

/// All registered proxies plus the single active (highlighted) one.
#[derive(Debug, Clone, Default)]
pub struct OverlayRegistry {
    proxies: HashMap<NodeId, Proxy>,
    active: Option<NodeId>,
}

impl OverlayRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every manipulable element, shallowest first, ties broken by
    /// document order. Returns the elements whose proxies need measuring.
    pub fn register_all(&mut self, scene: &Scene, layout: &impl Layout) -> Vec<NodeId> {
        let mut candidates: Vec<(usize, usize, NodeId)> = scene
            .iter()
            .enumerate()
            .filter(|(_, n)| n.manipulable)
            .map(|(index, n)| (scene.manipulable_depth(n.id), index, n.id))
            .collect();
        candidates.sort_unstable();

        let mut to_measure = Vec::new();
        for (_, _, id) in candidates {
            if let Some(proxy) = self.register(scene, layout, id) {
                if proxy.strategy == ProxyStrategy::MarginCompensated {
                    to_measure.push(id);
                }
            }
        }
        to_measure
    }

    /// Register `element`, or refresh an existing registration.
    ///
    /// Idempotent: re-registering keeps the ordinal and the last frame.
    /// Returns `None` when the element is not manipulable, or when it needs a
    /// positioned proxy but has no position parent.
    pub fn register(&mut self, scene: &Scene, layout: &impl Layout, element: NodeId) -> Option<&Proxy> {
        let node = scene.get(element).filter(|n| n.manipulable)?;
        let strategy = ProxyStrategy::for_kind(node.kind);
        let parent = frame_parent(scene, layout, element, strategy);
        if strategy == ProxyStrategy::MarginCompensated && parent.is_none() {
            debug!(%element, "no position parent; proxy skipped");
            return None;
        }
        let depth = scene.manipulable_depth(element);
        let next_ordinal = self.proxies.len();

        let proxy = self.proxies.entry(element).or_insert_with(|| Proxy {
            element,
            ordinal: next_ordinal,
            depth,
            z_index: Proxy::z_index_for(depth, next_ordinal),
            strategy,
            parent,
            frame: None,
            visible: false,
            attempts: 0,
        });
        proxy.depth = depth;
        proxy.z_index = Proxy::z_index_for(depth, proxy.ordinal);
        proxy.strategy = strategy;
        proxy.parent = parent;
        Some(proxy)
    }

    #[must_use]
    pub fn get(&self, element: NodeId) -> Option<&Proxy> {
        self.proxies.get(&element)
    }

    pub fn get_mut(&mut self, element: NodeId) -> Option<&mut Proxy> {
        self.proxies.get_mut(&element)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Proxies in registration order.
    #[must_use]
    pub fn in_order(&self) -> Vec<&Proxy> {
        let mut proxies: Vec<&Proxy> = self.proxies.values().collect();
        proxies.sort_by_key(|p| p.ordinal);
        proxies
    }

    /// Elements with margin-compensated proxies.
    #[must_use]
    pub fn positioned(&self) -> Vec<NodeId> {
        self.in_order()
            .into_iter()
            .filter(|p| p.strategy == ProxyStrategy::MarginCompensated)
            .map(|p| p.element)
            .collect()
    }

    // --- Visibility ---

    /// Recompute visibility: shown only in edit mode, and only outside any
    /// slide or on the present slide. Returns the margin-compensated proxies
    /// that just became visible.
    pub fn update_visibility(&mut self, scene: &Scene, edit_mode: bool) -> Vec<NodeId> {
        let mut revealed = Vec::new();
        for proxy in self.proxies.values_mut() {
            let on_stage = scene
                .enclosing_slide(proxy.element)
                .is_none_or(|slide| slide.present);
            let visible = edit_mode && on_stage;
            if visible && !proxy.visible && proxy.strategy == ProxyStrategy::MarginCompensated {
                revealed.push(proxy.element);
            }
            proxy.visible = visible;
        }
        if self.active.is_some_and(|a| !self.is_visible(a)) {
            self.active = None;
        }
        revealed.sort_unstable();
        revealed
    }

    #[must_use]
    pub fn is_visible(&self, element: NodeId) -> bool {
        self.proxies.get(&element).is_some_and(|p| p.visible)
    }

    // --- Hit-test redirection ---

    /// The proxy that should handle an event delivered to `from`'s proxy at
    /// `point`: a strictly deeper visible proxy under the pointer, else `from`.
    #[must_use]
    pub fn redirect(&self, scene: &Scene, layout: &impl Layout, from: NodeId, point: Point) -> NodeId {
        let Some(current) = self.proxies.get(&from) else {
            return from;
        };
        let resolved = match layout.target_at(point, from) {
            Some(HitTarget::Proxy(element)) => Some(element),
            Some(HitTarget::Node(node)) => scene.nearest_manipulable(node),
            None => None,
        };
        match resolved.and_then(|id| self.proxies.get(&id)) {
            Some(deeper) if deeper.visible && deeper.depth > current.depth => {
                debug!(from = %from, to = %deeper.element, "redirected to deeper proxy");
                deeper.element
            }
            _ => from,
        }
    }

    // --- Active highlight ---

    #[must_use]
    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    /// Mark `element` as the highlighted proxy. Hidden proxies are ignored.
    pub fn set_active(&mut self, element: NodeId) -> bool {
        if !self.is_visible(element) || self.active == Some(element) {
            return false;
        }
        self.active = Some(element);
        true
    }

    /// Clear the highlight if `element` holds it.
    pub fn leave(&mut self, element: NodeId) -> bool {
        if self.active == Some(element) {
            self.active = None;
            return true;
        }
        false
    }

    pub fn clear_active(&mut self) -> bool {
        self.active.take().is_some()
    }

    // --- Measurement ---

    /// Start a fresh re-measurement cycle for `element`.
    pub fn begin_measure(&mut self, layout: &impl Layout, element: NodeId, policy: &RetryPolicy) -> Measurement {
        if let Some(proxy) = self.proxies.get_mut(&element) {
            proxy.attempts = 0;
        }
        self.measure(layout, element, policy)
    }

    /// Measure `element`'s proxy once, scheduling the next retry while the
    /// measurement is degenerate.
    pub fn measure(&mut self, layout: &impl Layout, element: NodeId, policy: &RetryPolicy) -> Measurement {
        let Some(proxy) = self.proxies.get_mut(&element) else {
            return Measurement::Ready;
        };
        if proxy.strategy == ProxyStrategy::Cover {
            return Measurement::Ready;
        }
        let parent_rect = match proxy.parent {
            Some(parent) => layout.rect(parent),
            None => Some(layout.root_rect()),
        };
        let frame = layout
            .rect(element)
            .zip(parent_rect)
            .and_then(|(rect, parent)| margin_compensated(rect, parent, layout.margins(element)));

        if let Some(frame) = frame {
            proxy.frame = Some(frame);
            proxy.attempts = 0;
            return Measurement::Ready;
        }
        match policy.delay(proxy.attempts) {
            Some(delay) => {
                proxy.attempts += 1;
                debug!(%element, attempt = proxy.attempts, ?delay, "degenerate measurement; retrying");
                Measurement::Retry(delay)
            }
            None => {
                warn!(%element, attempts = policy.max_attempts(), "measurement still degenerate; giving up");
                proxy.attempts = 0;
                Measurement::Exhausted
            }
        }
    }

    /// Shift a positioned proxy's frame by the change between two live
    /// placements of its element, keeping the margin offsets intact.
    pub fn follow(&mut self, element: NodeId, from: Placement, to: Placement) {
        let Some(proxy) = self.proxies.get_mut(&element) else {
            return;
        };
        if let Some(frame) = proxy.frame.as_mut() {
            frame.top += to.top - from.top;
            frame.left += to.left - from.left;
            frame.width += to.width - from.width;
            frame.height += to.height - from.height;
        }
    }
}
