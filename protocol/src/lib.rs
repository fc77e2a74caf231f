//! Wire model for the document-editing service.
//!
//! This crate owns the JSON request bodies the editor sends to the local
//! document-editing service and the interpretation of its replies. It is
//! shared by the `engine` crate (which builds requests from committed
//! geometry) and the host binary (which moves them over HTTP).
//!
//! Percentages travel as bare numbers with the unit stripped. Absent fields
//! are serialized as `null`, never omitted and never defaulted to zero.


use serde::{Deserialize, Serialize};

/// Fixed local endpoint of the document-editing service.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:37842";

/// Extension of the rendered document the editor runs inside.
pub const RENDERED_EXTENSION: &str = ".html";

/// Extension of the source document the service edits.
pub const SOURCE_EXTENSION: &str = ".qmd";

/// Class that marks an element as absolutely positioned; never sent on the wire.
pub const POSITIONING_CLASS: &str = "absolute";

/// Error returned by [`derive_file_name`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The document identifier ends without a file segment.
    #[error("could not derive a source file name from `{0}`")]
    NoFileName(String),
}

/// Service operation, one per HTTP route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    UpdatePosition,
    UpdateSize,
    Undo,
    Redo,
    Health,
}

impl Endpoint {
    /// Route path relative to the service base URL.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::UpdatePosition => "/update-position",
            Self::UpdateSize => "/update-size",
            Self::Undo => "/undo",
            Self::Redo => "/redo",
            Self::Health => "/health",
        }
    }
}

/// Body of `update-position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePosition {
    /// Source document file name, see [`derive_file_name`].
    pub file_name: String,
    /// Document-source index of the element being edited.
    pub md_index: u32,
    /// New top, in percent of the parent.
    pub top: f64,
    /// New left, in percent of the parent.
    pub left: f64,
    pub current_top: Option<f64>,
    pub current_left: Option<f64>,
    pub current_bottom: Option<f64>,
    pub current_right: Option<f64>,
    /// Element classes, minus [`POSITIONING_CLASS`].
    pub class_list: Vec<String>,
}

/// Body of `update-size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSize {
    pub file_name: String,
    pub md_index: u32,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub current_top: Option<f64>,
    pub current_left: Option<f64>,
    pub current_width: Option<f64>,
    pub current_height: Option<f64>,
    pub current_bottom: Option<f64>,
    pub current_right: Option<f64>,
    pub class_list: Vec<String>,
}

/// Body of `undo` and `redo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequest {
    pub file_name: String,
}

/// A request to the document-editing service.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    UpdatePosition(UpdatePosition),
    UpdateSize(UpdateSize),
    Undo(FileRequest),
    Redo(FileRequest),
}

impl Request {
    /// The route this request is posted to.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::UpdatePosition(_) => Endpoint::UpdatePosition,
            Self::UpdateSize(_) => Endpoint::UpdateSize,
            Self::Undo(_) => Endpoint::Undo,
            Self::Redo(_) => Endpoint::Redo,
        }
    }

    /// JSON body for this request.
    ///
    /// Non-finite numbers become `null`; callers reject them before building a request.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a body cannot be represented as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::UpdatePosition(body) => serde_json::to_value(body),
            Self::UpdateSize(body) => serde_json::to_value(body),
            Self::Undo(body) | Self::Redo(body) => serde_json::to_value(body),
        }
    }
}

/// Error body returned by the service on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Application-level outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Accepted,
    Rejected { message: String },
}

impl Reply {
    /// Interpret a raw HTTP exchange.
    ///
    /// A success status is accepted regardless of body. A failure status is
    /// rejected with the service's `error` message, or the raw body when it
    /// does not parse as an [`ErrorBody`].
    #[must_use]
    pub fn from_http(success: bool, body: &str) -> Self {
        if success {
            return Self::Accepted;
        }
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error: Some(message) }) => message,
            Ok(ErrorBody { error: None }) => "unknown error".to_owned(),
            Err(_) if body.trim().is_empty() => "unknown error".to_owned(),
            Err(_) => body.trim().to_owned(),
        };
        Self::Rejected { message }
    }
}

/// A rejection message mentioning "not found" means the element index no
/// longer matches the source document.
#[must_use]
pub fn is_stale_message(message: &str) -> bool {
    message.contains("not found")
}

/// Derive the source file name from the rendered document's identifier.
///
/// Takes the last `/`-separated segment and swaps a trailing
/// [`RENDERED_EXTENSION`] for [`SOURCE_EXTENSION`]. Segments without the
/// rendered extension are returned unchanged.
///
/// # Errors
///
/// Returns [`ProtocolError::NoFileName`] when the last segment is empty.
pub fn derive_file_name(document: &str) -> Result<String, ProtocolError> {
    let segment = document.rsplit('/').next().unwrap_or_default();
    if segment.is_empty() {
        return Err(ProtocolError::NoFileName(document.to_owned()));
    }
    match segment.strip_suffix(RENDERED_EXTENSION) {
        Some(stem) => Ok(format!("{stem}{SOURCE_EXTENSION}")),
        None => Ok(segment.to_owned()),
    }
}
