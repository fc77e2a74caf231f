//! Input model: pointer buttons, resize handles, and the session state machine.
//!
//! `InteractionState` is the single gesture in progress, engine-wide. Each
//! session carries everything needed to update the live style on every
//! pointer-move and to either commit or roll back on pointer-up: the parent
//! frame snapshot, the rounded starting placement, which attributes were
//! originally set, and a verbatim copy of the starting style.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::doc::NodeId;
use crate::geometry::{Declarations, Field, Geometry, Placement, Point, Rect, round_tenth, to_percent};
use crate::history::EntryKind;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button.
    Middle,
    /// Right mouse button.
    Secondary,
}

/// Corner resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Handle {
    /// Whether dragging this handle moves the top edge.
    #[must_use]
    pub fn moves_top(self) -> bool {
        matches!(self, Self::Nw | Self::Ne)
    }

    /// Whether dragging this handle moves the left edge.
    #[must_use]
    pub fn moves_left(self) -> bool {
        matches!(self, Self::Nw | Self::Sw)
    }

    /// Apply a pointer delta (in percent) to `start`.
    ///
    /// `n` moves top and height opposingly, `s` moves height, `w` moves left
    /// and width opposingly, `e` moves width. Width and height never go below
    /// `min`; when a leading edge is involved the opposite edge stays put.
    #[must_use]
    pub fn apply(self, start: Placement, dx: f64, dy: f64, min: f64) -> Placement {
        let mut p = start;
        if self.moves_top() {
            p.height = (start.height - dy).max(min);
            p.top = start.top + start.height - p.height;
        } else {
            p.height = (start.height + dy).max(min);
        }
        if self.moves_left() {
            p.width = (start.width - dx).max(min);
            p.left = start.left + start.width - p.width;
        } else {
            p.width = (start.width + dx).max(min);
        }
        p
    }
}

/// Which of the six attributes were set when a session started.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetFields {
    pub top: bool,
    pub left: bool,
    pub bottom: bool,
    pub right: bool,
    pub width: bool,
    pub height: bool,
}

impl SetFields {
    #[must_use]
    pub fn of(declarations: &Declarations) -> Self {
        Self {
            top: declarations.is_set(Field::Top),
            left: declarations.is_set(Field::Left),
            bottom: declarations.is_set(Field::Bottom),
            right: declarations.is_set(Field::Right),
            width: declarations.is_set(Field::Width),
            height: declarations.is_set(Field::Height),
        }
    }

    /// Post-transition edge set for a committed placement.
    ///
    /// Per axis: an element anchored only by its trailing edge stays anchored
    /// by it (`bottom = 100 - top - height`); otherwise the leading edge is
    /// written, and a trailing edge that was also set is recomputed. Fields
    /// that were never set stay `None`. Size entries always carry width and
    /// height; position entries carry them unchanged when they were set.
    #[must_use]
    pub fn commit(&self, placement: &Placement, kind: EntryKind) -> Geometry {
        let (top, bottom) = axis(self.top, self.bottom, placement.top, placement.bottom());
        let (left, right) = axis(self.left, self.right, placement.left, placement.right());
        let (width, height) = match kind {
            EntryKind::Position => (self.width.then_some(placement.width), self.height.then_some(placement.height)),
            EntryKind::Size => (Some(placement.width), Some(placement.height)),
        };
        Geometry { top, left, bottom, right, width, height }
    }
}

fn axis(had_leading: bool, had_trailing: bool, leading: f64, trailing: f64) -> (Option<f64>, Option<f64>) {
    let trailing = round_tenth(trailing);
    if had_trailing && !had_leading {
        (None, Some(trailing))
    } else if had_trailing {
        (Some(leading), Some(trailing))
    } else {
        (Some(leading), None)
    }
}

/// State shared by drag and resize sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionBase {
    pub element: NodeId,
    /// Parent frame at session start, in client pixels.
    pub parent: Rect,
    /// Starting placement, rounded to one decimal percent.
    pub start: Placement,
    /// Latest live placement.
    pub current: Placement,
    /// Attributes set at session start.
    pub had: SetFields,
    /// Live style at session start, restored verbatim on rollback.
    pub original_style: Declarations,
}

impl SessionBase {
    #[must_use]
    pub fn new(element: NodeId, parent: Rect, start: Placement, style: &Declarations, shadow: &Declarations) -> Self {
        let start = start.rounded();
        Self {
            element,
            parent,
            start,
            current: start,
            had: SetFields::of(shadow),
            original_style: style.clone(),
        }
    }

    /// Pointer position in percent of the parent frame.
    #[must_use]
    pub fn to_parent_percent(&self, point: Point) -> (f64, f64) {
        (
            to_percent(point.x - self.parent.x, self.parent.width),
            to_percent(point.y - self.parent.y, self.parent.height),
        )
    }
}

/// A drag in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub base: SessionBase,
    /// Pointer-to-element offset, in percent (x, y).
    pub offset: (f64, f64),
}

impl DragSession {
    #[must_use]
    pub fn start(base: SessionBase, pointer: Point) -> Self {
        let (px, py) = base.to_parent_percent(pointer);
        let offset = (px - base.start.left, py - base.start.top);
        Self { base, offset }
    }

    /// Placement for the pointer at `pointer`.
    #[must_use]
    pub fn placement_at(&self, pointer: Point) -> Placement {
        let (px, py) = self.base.to_parent_percent(pointer);
        Placement { top: py - self.offset.1, left: px - self.offset.0, ..self.base.start }
    }
}

/// A corner resize in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub base: SessionBase,
    pub handle: Handle,
    /// Pointer position at session start.
    pub start_pointer: Point,
}

impl ResizeSession {
    #[must_use]
    pub fn start(base: SessionBase, handle: Handle, pointer: Point) -> Self {
        Self { base, handle, start_pointer: pointer }
    }

    /// Placement for the pointer at `pointer`, clamped to `min`.
    #[must_use]
    pub fn placement_at(&self, pointer: Point, min: f64) -> Placement {
        let dx = to_percent(pointer.x - self.start_pointer.x, self.base.parent.width);
        let dy = to_percent(pointer.y - self.start_pointer.y, self.base.parent.height);
        self.handle.apply(self.base.start, dx, dy, min)
    }
}

/// The engine-wide gesture state. At most one session exists at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    /// No gesture in progress.
    #[default]
    Idle,
    Dragging(DragSession),
    Resizing(ResizeSession),
}

impl InteractionState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The element under manipulation, if any.
    #[must_use]
    pub fn element(&self) -> Option<NodeId> {
        self.base().map(|b| b.element)
    }

    #[must_use]
    pub fn base(&self) -> Option<&SessionBase> {
        match self {
            Self::Idle => None,
            Self::Dragging(s) => Some(&s.base),
            Self::Resizing(s) => Some(&s.base),
        }
    }
}
