use super::*;

#[test]
fn unsupported_unit_lists_attributes() {
    let err = EditError::UnsupportedUnit {
        attributes: vec!["left=\"40px\"".to_owned(), "width=\"3em\"".to_owned()],
    };
    assert_eq!(
        err.to_string(),
        "Only percentage values are supported: left=\"40px\", width=\"3em\""
    );
    assert_eq!(err.error_code(), "E_UNSUPPORTED_UNIT");
}

#[test]
fn empty_history_is_informational() {
    assert_eq!(EditError::NothingToUndo.level(), NoticeLevel::Info);
    assert_eq!(EditError::NothingToRedo.level(), NoticeLevel::Info);
    assert_eq!(EditError::NoPositionTarget.level(), NoticeLevel::Error);
}

#[test]
fn sync_errors_keep_their_own_codes() {
    let err = EditError::from(SyncError::StaleDocument { message: "Element 3 not found".to_owned() });
    assert_eq!(err.error_code(), "E_STALE_DOCUMENT");
    assert!(err.to_string().contains("Element 3 not found"));
}

#[test]
fn rejected_message_is_verbatim() {
    let err = EditError::from(SyncError::Rejected("file locked".to_owned()));
    assert_eq!(err.to_string(), "file locked");
    assert_eq!(err.notice(), Notice { level: NoticeLevel::Error, message: "file locked".to_owned() });
}

#[test]
fn success_notice() {
    let notice = Notice::success("Undo successful");
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Undo successful");
}

#[test]
fn codes_are_distinct() {
    let errors = [
        EditError::NoPositionTarget,
        EditError::UnsupportedUnit { attributes: Vec::new() },
        EditError::ElementBusy,
        EditError::SessionActive,
        EditError::HistoryBusy,
        EditError::NothingToUndo,
        EditError::NothingToRedo,
        EditError::InvalidGeometry,
        EditError::UnknownOverlay,
    ];
    let mut codes: Vec<&str> = errors.iter().map(EditError::error_code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}
