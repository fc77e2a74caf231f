//! Sync gateway: turns committed geometry into service requests.
//!
//! The engine does not move bytes. A host supplies an [`EditService`] that
//! carries [`protocol::Request`]s to the document-editing service and
//! reports the [`protocol::Reply`]. The gateway builds requests for the
//! current document and classifies failures:
//!
//! - transport failure: [`SyncError::Unreachable`]
//! - rejection mentioning "not found": [`SyncError::StaleDocument`]
//! - any other rejection: [`SyncError::Rejected`], message verbatim

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use protocol::{FileRequest, ProtocolError, Reply, Request, UpdatePosition, UpdateSize};
use tracing::{debug, info, warn};

use crate::geometry::{Geometry, Placement};
use crate::history::EntryKind;

/// Network-level failure reaching the service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Carries requests to the document-editing service.
#[async_trait::async_trait(?Send)]
pub trait EditService {
    /// Post one request and interpret the response.
    async fn send(&self, request: &Request) -> Result<Reply, TransportError>;

    /// Reachability probe.
    async fn health(&self) -> Result<(), TransportError>;
}

/// Failure of one service round trip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("Editing service unreachable: {0}")]
    Unreachable(#[source] TransportError),

    #[error("Document is out of date ({message}); reload the page")]
    StaleDocument { message: String },

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    FileName(#[from] ProtocolError),
}

impl SyncError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "E_SERVICE_UNREACHABLE",
            Self::StaleDocument { .. } => "E_STALE_DOCUMENT",
            Self::Rejected(_) => "E_SERVICE_REJECTED",
            Self::FileName(_) => "E_FILE_NAME",
        }
    }

    /// Classify a rejection message.
    #[must_use]
    pub fn from_rejection(message: String) -> Self {
        if protocol::is_stale_message(&message) {
            Self::StaleDocument { message }
        } else {
            Self::Rejected(message)
        }
    }
}

/// Request builder and dispatcher for one document.
pub struct SyncGateway<S> {
    service: S,
    file_name: String,
}

impl<S: EditService> SyncGateway<S> {
    /// Gateway for the rendered document identified by `document`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::FileName`] when no source file name can be derived.
    pub fn new(service: S, document: &str) -> Result<Self, SyncError> {
        let file_name = protocol::derive_file_name(document)?;
        Ok(Self { service, file_name })
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Request for a committed transition. `before` supplies the `current*`
    /// fields; absent attributes travel as `null`.
    #[must_use]
    pub fn commit_request(
        &self,
        kind: EntryKind,
        md_index: u32,
        placement: &Placement,
        before: &Geometry,
        class_list: Vec<String>,
    ) -> Request {
        match kind {
            EntryKind::Position => Request::UpdatePosition(UpdatePosition {
                file_name: self.file_name.clone(),
                md_index,
                top: placement.top,
                left: placement.left,
                current_top: before.top,
                current_left: before.left,
                current_bottom: before.bottom,
                current_right: before.right,
                class_list,
            }),
            EntryKind::Size => Request::UpdateSize(UpdateSize {
                file_name: self.file_name.clone(),
                md_index,
                top: placement.top,
                left: placement.left,
                width: placement.width,
                height: placement.height,
                current_top: before.top,
                current_left: before.left,
                current_width: before.width,
                current_height: before.height,
                current_bottom: before.bottom,
                current_right: before.right,
                class_list,
            }),
        }
    }

    #[must_use]
    pub fn undo_request(&self) -> Request {
        Request::Undo(FileRequest { file_name: self.file_name.clone() })
    }

    #[must_use]
    pub fn redo_request(&self) -> Request {
        Request::Redo(FileRequest { file_name: self.file_name.clone() })
    }

    /// Send `request` and wait for the service's verdict.
    ///
    /// # Errors
    ///
    /// Returns the classified [`SyncError`] on transport failure or rejection.
    pub async fn submit(&self, request: &Request) -> Result<(), SyncError> {
        let path = request.endpoint().path();
        debug!(path, file = %self.file_name, "sending edit request");
        match self.service.send(request).await {
            Ok(Reply::Accepted) => Ok(()),
            Ok(Reply::Rejected { message }) => {
                warn!(path, %message, "edit request rejected");
                Err(SyncError::from_rejection(message))
            }
            Err(e) => {
                warn!(path, error = %e, "editing service unreachable");
                Err(SyncError::Unreachable(e))
            }
        }
    }

    /// Health probe; the result is logged and returned, never enforced.
    pub async fn probe(&self) -> bool {
        match self.service.health().await {
            Ok(()) => {
                info!("editing service reachable");
                true
            }
            Err(e) => {
                warn!(error = %e, "editing service health check failed");
                false
            }
        }
    }
}
