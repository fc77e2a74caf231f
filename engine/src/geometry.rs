//! Geometry model: percentage-of-parent placement and its CSS declarations.
//!
//! Every manipulable element is described in percent of its parent frame.
//! Two representations coexist:
//!
//! - [`Geometry`] is the *edge set*: whichever of top/left/bottom/right/
//!   width/height are explicitly set, `None` meaning "absent" (never zero).
//!   This is what history records and what the service is told about.
//! - [`Placement`] is the resolved top/left/width/height frame a gesture
//!   works in, derived from the edge set plus live measurement.
//!
//! [`Declarations`] holds raw CSS-like strings (`"12.5%"`) for one of the two
//! per-element stores: the live style and the shadow attributes.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A point in client (CSS pixel) space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A measured layout rectangle in client (CSS pixel) space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// True when either dimension is under one device pixel, as reported by
    /// images that have not finished decoding.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width < 1.0 || self.height < 1.0
    }
}

/// Computed CSS margins of an element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// One positional or size attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Top,
    Left,
    Bottom,
    Right,
    Width,
    Height,
}

impl Field {
    /// All fields, in the order they are reported to the user.
    pub const ALL: [Self; 6] = [Self::Top, Self::Left, Self::Width, Self::Height, Self::Bottom, Self::Right];

    /// The four positioning edges.
    pub const EDGES: [Self; 4] = [Self::Top, Self::Left, Self::Bottom, Self::Right];

    /// CSS property name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Left => "left",
            Self::Bottom => "bottom",
            Self::Right => "right",
            Self::Width => "width",
            Self::Height => "height",
        }
    }
}

/// Edge set of one element, in percent of the parent. `None` means the
/// attribute is absent from the source markup.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub top: Option<f64>,
    pub left: Option<f64>,
    pub bottom: Option<f64>,
    pub right: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Geometry {
    #[must_use]
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Top => self.top,
            Field::Left => self.left,
            Field::Bottom => self.bottom,
            Field::Right => self.right,
            Field::Width => self.width,
            Field::Height => self.height,
        }
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        let slot = match field {
            Field::Top => &mut self.top,
            Field::Left => &mut self.left,
            Field::Bottom => &mut self.bottom,
            Field::Right => &mut self.right,
            Field::Width => &mut self.width,
            Field::Height => &mut self.height,
        };
        *slot = value;
    }

    /// Whether any of the four positioning edges is set.
    #[must_use]
    pub fn has_position(&self) -> bool {
        Field::EDGES.iter().any(|f| self.get(*f).is_some())
    }

    /// Whether every set value is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        Field::ALL
            .iter()
            .filter_map(|f| self.get(*f))
            .all(f64::is_finite)
    }
}

/// Resolved top/left/width/height frame, in percent of the parent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Every coordinate rounded to one decimal percent.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            top: round_tenth(self.top),
            left: round_tenth(self.left),
            width: round_tenth(self.width),
            height: round_tenth(self.height),
        }
    }

    /// Whether all four coordinates moved by less than `threshold`.
    #[must_use]
    pub fn within(&self, other: &Self, threshold: f64) -> bool {
        (self.top - other.top).abs() < threshold
            && (self.left - other.left).abs() < threshold
            && (self.width - other.width).abs() < threshold
            && (self.height - other.height).abs() < threshold
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.top.is_finite() && self.left.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// The `bottom` companion of this frame.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        100.0 - self.top - self.height
    }

    /// The `right` companion of this frame.
    #[must_use]
    pub fn right(&self) -> f64 {
        100.0 - self.left - self.width
    }
}

/// Convert a pixel distance to percent of a parent extent. Never clamped.
#[must_use]
pub fn to_percent(pixel_delta: f64, parent_extent: f64) -> f64 {
    pixel_delta / parent_extent * 100.0
}

/// Round to one decimal percent.
#[must_use]
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Leading edge derived from the trailing one: `100 - opposite - size`.
///
/// Recomputed on every call; `own_size` may change between gestures.
#[must_use]
pub fn derive_missing_edge(opposite: f64, own_size: f64, parent_size: f64) -> f64 {
    100.0 - opposite - to_percent(own_size, parent_size)
}

/// Whether a raw attribute value is acceptable: empty or a percentage.
#[must_use]
pub fn is_percentage(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw.ends_with('%')
}

/// Parse a `"12.5%"` value. Values in any other unit yield `None`.
#[must_use]
pub fn parse_percent(raw: &str) -> Option<f64> {
    let number = raw.trim().strip_suffix('%')?;
    match number.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}

/// Render a percentage as CSS.
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{value}%")
}

/// Resolve the frame of an element.
///
/// Set shadow attributes win; a missing leading edge is derived from its
/// trailing companion, and anything else falls back to the measured rect.
#[must_use]
pub fn resolve_placement(shadow: &Declarations, rect: Rect, parent: Rect) -> Placement {
    let measured_top = to_percent(rect.y - parent.y, parent.height);
    let measured_left = to_percent(rect.x - parent.x, parent.width);

    let top = match (shadow.percent(Field::Top), shadow.percent(Field::Bottom)) {
        (Some(top), _) => top,
        (None, Some(bottom)) => derive_missing_edge(bottom, rect.height, parent.height),
        (None, None) => measured_top,
    };
    let left = match (shadow.percent(Field::Left), shadow.percent(Field::Right)) {
        (Some(left), _) => left,
        (None, Some(right)) => derive_missing_edge(right, rect.width, parent.width),
        (None, None) => measured_left,
    };
    let width = shadow
        .percent(Field::Width)
        .unwrap_or_else(|| to_percent(rect.width, parent.width));
    let height = shadow
        .percent(Field::Height)
        .unwrap_or_else(|| to_percent(rect.height, parent.height));

    Placement { top, left, width, height }
}

/// Proxy frame for an element whose rendered box is offset by margins.
///
/// The measured rect excludes margins, so the proxy starts `margin` earlier
/// on the leading edges and grows by both margins on each axis. Returns
/// `None` while the measurement is degenerate.
#[must_use]
pub fn margin_compensated(rect: Rect, parent: Rect, margins: Margins) -> Option<Placement> {
    if rect.is_degenerate() || parent.is_degenerate() {
        return None;
    }
    let top = to_percent(rect.y - parent.y, parent.height) - to_percent(margins.top, parent.height);
    let left = to_percent(rect.x - parent.x, parent.width) - to_percent(margins.left, parent.width);
    let width = to_percent(rect.width + margins.left + margins.right, parent.width);
    let height = to_percent(rect.height + margins.top + margins.bottom, parent.height);
    Some(Placement { top, left, width, height })
}

/// Raw declarations for one store (live style or shadow attributes).
///
/// Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Declarations(BTreeMap<Field, String>);

impl Declarations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value, if set and non-empty.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0
            .get(&field)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    #[must_use]
    pub fn is_set(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    pub fn set_percent(&mut self, field: Field, value: f64) {
        self.set(field, format_percent(value));
    }

    pub fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }

    /// Parsed percentage, if set in percent.
    #[must_use]
    pub fn percent(&self, field: Field) -> Option<f64> {
        self.get(field).and_then(parse_percent)
    }

    /// Whether any positioning edge is set.
    #[must_use]
    pub fn has_position(&self) -> bool {
        Field::EDGES.iter().any(|f| self.is_set(*f))
    }

    /// Set attributes that use a unit other than percent, formatted
    /// `name="value"` for the user.
    #[must_use]
    pub fn unsupported_units(&self) -> Vec<String> {
        Field::ALL
            .iter()
            .filter_map(|f| self.get(*f).map(|v| (*f, v)))
            .filter(|(_, v)| !is_percentage(v))
            .map(|(f, v)| format!("{}=\"{v}\"", f.name()))
            .collect()
    }

    /// The edge set these declarations describe.
    #[must_use]
    pub fn geometry(&self) -> Geometry {
        let mut geometry = Geometry::default();
        for field in Field::ALL {
            geometry.set(field, self.percent(field));
        }
        geometry
    }

    /// Write `fields` of `geometry`, removing the ones it records as absent.
    pub fn apply(&mut self, geometry: &Geometry, fields: &[Field]) {
        for field in fields {
            match geometry.get(*field) {
                Some(value) => self.set_percent(*field, value),
                None => self.remove(*field),
            }
        }
    }
}

impl<const N: usize> From<[(Field, &str); N]> for Declarations {
    fn from(pairs: [(Field, &str); N]) -> Self {
        Self(pairs.into_iter().map(|(f, v)| (f, v.to_owned())).collect())
    }
}
