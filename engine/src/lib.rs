//! Direct-manipulation engine for free-form positioned document elements.
//!
//! Invisible proxies layered over manipulable elements turn pointer input
//! into drag and resize sessions that work in percent of the parent frame.
//! Accepted changes are confirmed with the document-editing service before
//! they are recorded, and undo/redo stays in lockstep with the service's own
//! history. The host owns the UI toolkit: it feeds pointer events and
//! layout queries in (through [`layout::Layout`]) and applies the returned
//! [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Testable [`engine::EngineCore`] and the async [`engine::Editor`] |
//! | [`doc`] | Scene model: element tree, live style, shadow attributes |
//! | [`geometry`] | Percent-of-parent geometry, placements, declarations |
//! | [`overlay`] | Proxy registry: stacking, visibility, redirection, re-measurement |
//! | [`input`] | Buttons, resize handles, and the session state machine |
//! | [`history`] | Bounded linear undo/redo history |
//! | [`sync`] | Service trait and request building for the editing service |
//! | [`layout`] | Layout capability trait and an in-memory implementation |
//! | [`error`] | Edit errors and user-facing notices |
//! | [`consts`] | Shared numeric constants (threshold, minimum size, delays) |

pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod layout;
pub mod overlay;
pub mod sync;
