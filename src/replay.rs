//! Scripted gesture replay.
//!
//! A script carries a scene snapshot, a fixed layout, and a list of gestures.
//! Each gesture is driven through the [`Editor`] against the configured
//! service exactly as live pointer input would be, and the resulting
//! geometry and history are reported as JSON.
//!
//! ```json
//! {
//!   "layout": { "root": { "x": 0, "y": 0, "width": 1000, "height": 500 },
//!               "entries": [{ "id": 1, "rect": { "x": 100, "y": 50, "width": 200, "height": 100 } }] },
//!   "nodes": [{ "id": 1, "manipulable": true, "md_index": 0,
//!               "style": { "top": "10%", "left": "10%", "width": "20%", "height": "20%" } }],
//!   "gestures": [
//!     { "kind": "drag", "proxy": 1, "from": { "x": 150, "y": 75 }, "to": { "x": 200, "y": 90 } },
//!     { "kind": "undo" }
//!   ]
//! }
//! ```

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use std::collections::{BTreeMap, VecDeque};

use engine::doc::{Node, NodeId};
use engine::engine::{Action, Editor, EngineConfig, EngineCore, Outcome};
use engine::error::{EditError, Notice, NoticeLevel};
use engine::geometry::{Geometry, Point};
use engine::history::HistoryEntry;
use engine::input::{Button, Handle};
use engine::layout::StaticLayout;
use engine::sync::{EditService, SyncGateway};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub layout: StaticLayout,
    pub nodes: Vec<Node>,
    /// Slide to present before the first gesture.
    #[serde(default)]
    pub present_slide: Option<NodeId>,
    #[serde(default)]
    pub gestures: Vec<Gesture>,
}

/// One scripted user action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gesture {
    /// Press on `proxy` at `from`, move to `to`, release.
    Drag { proxy: NodeId, from: Point, to: Point },
    /// Same, starting on a corner handle.
    Resize { proxy: NodeId, handle: Handle, from: Point, to: Point },
    Undo,
    Redo,
    EditMode { on: bool },
    PresentSlide { slide: NodeId },
}

/// Result of one gesture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub gesture: usize,
    pub level: NoticeLevel,
    /// Error code for rejected gestures.
    pub code: Option<&'static str>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryReport {
    pub summary: String,
    pub can_undo: bool,
    pub can_redo: bool,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub file_name: String,
    pub steps: Vec<StepReport>,
    /// Committed geometry of every manipulable element.
    pub geometry: BTreeMap<NodeId, Geometry>,
    pub history: HistoryReport,
}

/// Replay `script` through a fresh editor.
pub async fn run<S: EditService>(script: Script, gateway: SyncGateway<S>, config: EngineConfig) -> Report {
    let Script { layout, nodes, present_slide, gestures } = script;
    let mut core = EngineCore::new(config);
    core.load_snapshot(nodes);
    let mut actions = core.initialize(&layout);
    if let Some(slide) = present_slide {
        actions.extend(core.present_slide(slide, &layout));
    }
    let editor = Editor::new(core, gateway);
    editor.probe().await;
    settle(&editor, &layout, actions).await;

    let mut steps = Vec::with_capacity(gestures.len());
    for (index, gesture) in gestures.into_iter().enumerate() {
        debug!(index, ?gesture, "replaying gesture");
        let step = match perform(&editor, &layout, gesture).await {
            Ok(notice) => StepReport { gesture: index, level: notice.level, code: None, message: notice.message },
            Err(e) => StepReport { gesture: index, level: e.level(), code: Some(e.error_code()), message: e.to_string() },
        };
        steps.push(step);
    }

    let core = editor.core();
    let geometry = core
        .scene
        .manipulable_ids()
        .into_iter()
        .filter_map(|id| core.geometry(id).map(|g| (id, g)))
        .collect();
    let history = HistoryReport {
        summary: core.history.summary(),
        can_undo: core.history.can_undo(),
        can_redo: core.history.can_redo(),
        entries: core.history.entries().cloned().collect(),
    };
    info!(steps = steps.len(), history = %history.summary, "replay finished");
    Report { file_name: editor.gateway().file_name().to_owned(), steps, geometry, history }
}

async fn perform<S: EditService>(
    editor: &Editor<S>,
    layout: &StaticLayout,
    gesture: Gesture,
) -> Result<Notice, EditError> {
    match gesture {
        Gesture::Drag { proxy, from, to } => press(editor, layout, proxy, None, from, to).await,
        Gesture::Resize { proxy, handle, from, to } => press(editor, layout, proxy, Some(handle), from, to).await,
        Gesture::Undo => finish(editor, layout, editor.undo().await?).await,
        Gesture::Redo => finish(editor, layout, editor.redo().await?).await,
        Gesture::EditMode { on } => {
            let actions = editor.core_mut().set_edit_mode(on, layout);
            settle(editor, layout, actions).await;
            Ok(info_notice(if on { "Edit mode on" } else { "Edit mode off" }))
        }
        Gesture::PresentSlide { slide } => {
            let actions = editor.core_mut().present_slide(slide, layout);
            settle(editor, layout, actions).await;
            Ok(info_notice(format!("Presenting slide {slide}")))
        }
    }
}

async fn press<S: EditService>(
    editor: &Editor<S>,
    layout: &StaticLayout,
    proxy: NodeId,
    handle: Option<Handle>,
    from: Point,
    to: Point,
) -> Result<Notice, EditError> {
    let started = editor.pointer_down(proxy, handle, from, Button::Primary, layout)?;
    if started.is_empty() {
        return Ok(info_notice("Pointer-down ignored"));
    }
    editor.pointer_move(to);
    match editor.pointer_up(to).await? {
        Some(outcome) => finish(editor, layout, outcome).await,
        None => Ok(info_notice("No change")),
    }
}

async fn finish<S: EditService>(
    editor: &Editor<S>,
    layout: &StaticLayout,
    outcome: Outcome,
) -> Result<Notice, EditError> {
    settle(editor, layout, outcome.actions).await;
    Ok(outcome.notice)
}

/// Process host actions until none are left, honouring re-measure delays.
async fn settle<S: EditService>(editor: &Editor<S>, layout: &StaticLayout, actions: Vec<Action>) {
    let mut queue: VecDeque<Action> = actions.into();
    while let Some(action) = queue.pop_front() {
        if let Action::ScheduleRemeasure { element, delay } = action {
            tokio::time::sleep(delay).await;
            queue.extend(editor.core_mut().remeasure(element, layout));
        }
    }
}

fn info_notice(message: impl Into<String>) -> Notice {
    Notice { level: NoticeLevel::Info, message: message.into() }
}
