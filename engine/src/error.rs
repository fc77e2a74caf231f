//! Edit errors and user-facing notices.
//!
//! Every rejection is recovered locally: the session has already restored
//! its starting geometry by the time an [`EditError`] is returned. The
//! display string is the notice text shown to the user.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::sync::SyncError;

/// Why an edit, undo, or redo did not happen.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("Element has no position attribute; edit a positioned ancestor instead")]
    NoPositionTarget,

    #[error("Only percentage values are supported: {}", attributes.join(", "))]
    UnsupportedUnit { attributes: Vec<String> },

    #[error("Element is still being updated")]
    ElementBusy,

    #[error("Another edit is in progress")]
    SessionActive,

    #[error("An undo or redo is in progress")]
    HistoryBusy,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Computed geometry is not a finite number")]
    InvalidGeometry,

    #[error("Element has no overlay")]
    UnknownOverlay,

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl EditError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoPositionTarget => "E_NO_POSITION_TARGET",
            Self::UnsupportedUnit { .. } => "E_UNSUPPORTED_UNIT",
            Self::ElementBusy => "E_ELEMENT_BUSY",
            Self::SessionActive => "E_SESSION_ACTIVE",
            Self::HistoryBusy => "E_HISTORY_BUSY",
            Self::NothingToUndo => "E_NOTHING_TO_UNDO",
            Self::NothingToRedo => "E_NOTHING_TO_REDO",
            Self::InvalidGeometry => "E_INVALID_GEOMETRY",
            Self::UnknownOverlay => "E_UNKNOWN_OVERLAY",
            Self::Sync(e) => e.error_code(),
        }
    }

    /// Severity of the notice for this error.
    #[must_use]
    pub fn level(&self) -> NoticeLevel {
        match self {
            Self::NothingToUndo | Self::NothingToRedo => NoticeLevel::Info,
            _ => NoticeLevel::Error,
        }
    }

    /// The transient notice to show for this error.
    #[must_use]
    pub fn notice(&self) -> Notice {
        Notice { level: self.level(), message: self.to_string() }
    }
}

/// Severity of a transient status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient, dismissible status message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }
}
