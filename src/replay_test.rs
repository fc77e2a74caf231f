#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::collections::VecDeque;

use engine::sync::TransportError;
use protocol::{Reply, Request};

use super::*;

// =============================================================
// Helpers
// =============================================================

#[derive(Default)]
struct ScriptedService {
    replies: RefCell<VecDeque<Reply>>,
}

#[async_trait::async_trait(?Send)]
impl EditService for ScriptedService {
    async fn send(&self, _request: &Request) -> Result<Reply, TransportError> {
        Ok(self.replies.borrow_mut().pop_front().unwrap_or(Reply::Accepted))
    }

    async fn health(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

const SCENE: &str = r#"{
    "layout": {
        "root": { "x": 0, "y": 0, "width": 1000, "height": 500 },
        "entries": [
            { "id": 1, "rect": { "x": 100, "y": 50, "width": 200, "height": 100 } },
            { "id": 2, "rect": { "x": 400, "y": 50, "width": 300, "height": 100 } }
        ]
    },
    "nodes": [
        { "id": 1, "manipulable": true, "md_index": 0, "classes": ["absolute", "note"],
          "style": { "top": "10%", "left": "10%", "width": "20%", "height": "20%" } },
        { "id": 2, "manipulable": true, "md_index": 1, "style": { "width": "30%" } }
    ]
}"#;

fn script(gestures: &str) -> Script {
    let mut script: Script = serde_json::from_str(SCENE).expect("scene");
    script.gestures = serde_json::from_str(gestures).expect("gestures");
    script
}

async fn replay(script: Script, replies: Vec<Reply>) -> Report {
    let service = ScriptedService { replies: RefCell::new(replies.into()) };
    let gateway = SyncGateway::new(service, "/talks/deck.html").expect("gateway");
    run(script, gateway, EngineConfig::default()).await
}

// =============================================================
// Parsing
// =============================================================

#[test]
fn gestures_parse_from_tagged_json() {
    let gestures: Vec<Gesture> = serde_json::from_str(
        r#"[
            { "kind": "resize", "proxy": 1, "handle": "nw", "from": { "x": 1, "y": 2 }, "to": { "x": 3, "y": 4 } },
            { "kind": "edit_mode", "on": false },
            { "kind": "redo" }
        ]"#,
    )
    .expect("gestures");
    assert_eq!(
        gestures[0],
        Gesture::Resize { proxy: NodeId(1), handle: Handle::Nw, from: Point::new(1.0, 2.0), to: Point::new(3.0, 4.0) }
    );
    assert_eq!(gestures[1], Gesture::EditMode { on: false });
    assert_eq!(gestures[2], Gesture::Redo);
}

#[test]
fn unknown_gesture_is_rejected() {
    assert!(serde_json::from_str::<Gesture>(r#"{ "kind": "rotate" }"#).is_err());
}

// =============================================================
// Replay
// =============================================================

#[tokio::test]
async fn replay_reports_steps_geometry_and_history() {
    let script = script(
        r#"[
            { "kind": "drag", "proxy": 1, "from": { "x": 150, "y": 75 }, "to": { "x": 200, "y": 90 } },
            { "kind": "resize", "proxy": 1, "handle": "se", "from": { "x": 300, "y": 150 }, "to": { "x": 200, "y": 100 } },
            { "kind": "drag", "proxy": 2, "from": { "x": 450, "y": 75 }, "to": { "x": 500, "y": 100 } },
            { "kind": "undo" },
            { "kind": "drag", "proxy": 1, "from": { "x": 150, "y": 75 }, "to": { "x": 150.2, "y": 75.1 } },
            { "kind": "redo" }
        ]"#,
    );
    let report = replay(script, Vec::new()).await;

    let messages: Vec<&str> = report.steps.iter().map(|s| s.message.as_str()).collect();
    assert_eq!(messages[0], "Position updated (MD Index: 0)");
    assert_eq!(messages[1], "Size updated (MD Index: 0)");
    assert_eq!(report.steps[2].code, Some("E_NO_POSITION_TARGET"));
    assert_eq!(report.steps[2].level, NoticeLevel::Error);
    assert_eq!(messages[3], "Undo successful");
    assert_eq!(messages[4], "No change");
    assert_eq!(messages[5], "Redo successful");

    let one = report.geometry[&NodeId(1)];
    assert_eq!((one.top, one.left), (Some(13.0), Some(15.0)));
    assert_eq!((one.width, one.height), (Some(10.0), Some(10.0)));
    let two = report.geometry[&NodeId(2)];
    assert_eq!((two.top, two.width), (None, Some(30.0)));

    assert_eq!(report.file_name, "deck.qmd");
    assert_eq!(report.history.summary, "2/2");
    assert!(report.history.can_undo);
    assert!(!report.history.can_redo);
}

#[tokio::test]
async fn rejected_commit_is_reported_and_not_recorded() {
    let script = script(
        r#"[{ "kind": "drag", "proxy": 1, "from": { "x": 150, "y": 75 }, "to": { "x": 200, "y": 90 } }]"#,
    );
    let report = replay(script, vec![Reply::Rejected { message: "file locked".to_owned() }]).await;
    assert_eq!(report.steps[0].code, Some("E_SERVICE_REJECTED"));
    assert_eq!(report.steps[0].message, "file locked");
    assert_eq!(report.history.summary, "0/0");
    assert_eq!(report.geometry[&NodeId(1)].top, Some(10.0));
}

#[tokio::test]
async fn edit_mode_off_ignores_gestures() {
    let script = script(
        r#"[
            { "kind": "edit_mode", "on": false },
            { "kind": "drag", "proxy": 1, "from": { "x": 150, "y": 75 }, "to": { "x": 200, "y": 90 } },
            { "kind": "undo" }
        ]"#,
    );
    let report = replay(script, Vec::new()).await;
    assert_eq!(report.steps[0].message, "Edit mode off");
    assert_eq!(report.steps[1].message, "Pointer-down ignored");
    assert_eq!(report.steps[2].code, Some("E_NOTHING_TO_UNDO"));
    assert_eq!(report.steps[2].level, NoticeLevel::Info);
}

#[tokio::test]
async fn report_serializes_with_string_keys() {
    let report = replay(script("[]"), Vec::new()).await;
    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["geometry"]["1"]["top"], 10.0);
    assert!(json["geometry"]["2"]["top"].is_null());
    assert_eq!(json["history"]["summary"], "0/0");
}
