use std::cell::{Ref, RefCell, RefMut};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::consts::{DRAG_THRESHOLD, HISTORY_CAPACITY, MIN_SIZE};
use crate::doc::{Node, NodeId, Scene};
use crate::error::{EditError, Notice};
use crate::geometry::{Declarations, Field, Geometry, Placement, Point, Rect, resolve_placement};
use crate::history::{EntryKind, History, HistoryEntry};
use crate::input::{Button, DragSession, Handle, InteractionState, ResizeSession, SessionBase};
use crate::layout::Layout;
use crate::overlay::{Measurement, OverlayRegistry, ProxyStrategy, RetryPolicy};
use crate::sync::{EditService, SyncError, SyncGateway};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Tunables for one engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Minimum change, in percentage points, for a gesture to be recorded.
    pub drag_threshold: f64,
    /// Minimum width and height, in percent.
    pub min_size: f64,
    pub history_capacity: usize,
    pub remeasure: RetryPolicy,
    /// Initial edit mode.
    pub edit_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drag_threshold: DRAG_THRESHOLD,
            min_size: MIN_SIZE,
            history_capacity: HISTORY_CAPACITY,
            remeasure: RetryPolicy::default(),
            edit_mode: true,
        }
    }
}

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    RenderNeeded,
    /// Call [`EngineCore::remeasure`] for `element` after `delay`.
    ScheduleRemeasure { element: NodeId, delay: Duration },
}

/// Result of a pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub enum Release {
    /// No session was active.
    Idle,
    /// The gesture moved less than the threshold and was reverted.
    BelowThreshold,
    /// The gesture must be confirmed by the service, then passed to
    /// [`EngineCore::finish_commit`].
    Commit(PendingCommit),
}

/// A validated transition awaiting the service's verdict. The element is
/// marked as updating until it is finished.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    pub kind: EntryKind,
    pub element: NodeId,
    pub md_index: u32,
    /// Final rounded placement.
    pub placement: Placement,
    pub before: Geometry,
    pub after: Geometry,
    pub class_list: Vec<String>,
    start: Placement,
    original_style: Declarations,
}

/// Direction of a history round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Undo,
    Redo,
}

/// An undo or redo awaiting the service's verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingStep {
    pub step: Step,
    pub entry: HistoryEntry,
}

/// What a completed commit, undo, or redo produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub notice: Notice,
    pub actions: Vec<Action>,
}

/// Core engine state: everything that does not await the service.
///
/// Separated from [`Editor`] so it can be driven synchronously in tests.
#[derive(Debug)]
pub struct EngineCore {
    pub scene: Scene,
    pub overlays: OverlayRegistry,
    pub history: History,
    pub state: InteractionState,
    pub config: EngineConfig,
    edit_mode: bool,
    history_busy: bool,
    /// Element whose released gesture awaits the service's verdict.
    commit_in_flight: Option<NodeId>,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scene: Scene::new(),
            overlays: OverlayRegistry::new(),
            history: History::with_capacity(config.history_capacity),
            state: InteractionState::Idle,
            edit_mode: config.edit_mode,
            history_busy: false,
            commit_in_flight: None,
            config,
        }
    }

    // --- Data inputs ---

    /// Replace the scene. Proxies, history, and any session are dropped.
    pub fn load_snapshot(&mut self, nodes: Vec<Node>) {
        self.scene.load_snapshot(nodes);
        self.overlays = OverlayRegistry::new();
        self.history = History::with_capacity(self.config.history_capacity);
        self.state = InteractionState::Idle;
        self.history_busy = false;
        self.commit_in_flight = None;
    }

    /// Seed shadow attributes from style, register proxies, and measure the
    /// positioned ones.
    pub fn initialize(&mut self, layout: &impl Layout) -> Vec<Action> {
        for id in self.scene.manipulable_ids() {
            if let Some(node) = self.scene.get_mut(id) {
                node.seed_shadow();
            }
        }
        let to_measure = self.overlays.register_all(&self.scene, layout);
        self.overlays.update_visibility(&self.scene, self.edit_mode);
        info!(proxies = self.overlays.len(), "overlays initialized");

        let mut actions = vec![Action::RenderNeeded];
        for element in to_measure {
            actions.extend(self.start_measure(element, layout));
        }
        actions
    }

    // --- Host signals ---

    #[must_use]
    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Show or hide all proxies. The highlight is always cleared.
    pub fn set_edit_mode(&mut self, on: bool, layout: &impl Layout) -> Vec<Action> {
        self.edit_mode = on;
        self.overlays.clear_active();
        info!(edit_mode = on, "edit mode changed");
        self.refresh_visibility(layout)
    }

    pub fn toggle_edit_mode(&mut self, layout: &impl Layout) -> Vec<Action> {
        self.set_edit_mode(!self.edit_mode, layout)
    }

    /// Slide-change signal.
    pub fn present_slide(&mut self, slide: NodeId, layout: &impl Layout) -> Vec<Action> {
        if !self.scene.set_present_slide(slide) {
            debug!(%slide, "slide change for unknown slide ignored");
            return Vec::new();
        }
        self.refresh_visibility(layout)
    }

    /// An image finished loading.
    pub fn image_loaded(&mut self, element: NodeId, layout: &impl Layout) -> Vec<Action> {
        self.start_measure(element, layout)
    }

    /// Layout settled after fonts, images, or a resize; re-measure every
    /// positioned proxy.
    pub fn layout_settled(&mut self, layout: &impl Layout) -> Vec<Action> {
        let mut actions = Vec::new();
        for element in self.overlays.positioned() {
            actions.extend(self.start_measure(element, layout));
        }
        actions
    }

    /// A scheduled re-measurement fired.
    pub fn remeasure(&mut self, element: NodeId, layout: &impl Layout) -> Vec<Action> {
        let outcome = self.overlays.measure(layout, element, &self.config.remeasure);
        measured(element, outcome)
    }

    fn start_measure(&mut self, element: NodeId, layout: &impl Layout) -> Vec<Action> {
        let outcome = self.overlays.begin_measure(layout, element, &self.config.remeasure);
        measured(element, outcome)
    }

    fn refresh_visibility(&mut self, layout: &impl Layout) -> Vec<Action> {
        let revealed = self.overlays.update_visibility(&self.scene, self.edit_mode);
        let mut actions = vec![Action::RenderNeeded];
        for element in revealed {
            actions.extend(self.start_measure(element, layout));
        }
        actions
    }

    /// Positioned proxies re-measure after their element moved.
    fn remeasure_after_edit(&self, element: NodeId) -> Vec<Action> {
        let positioned = self
            .overlays
            .get(element)
            .is_some_and(|p| p.strategy == ProxyStrategy::MarginCompensated);
        if positioned { vec![Action::ScheduleRemeasure { element, delay: Duration::ZERO }] } else { Vec::new() }
    }

    // --- Pointer input ---

    /// Pointer entered or moved over `proxy` while idle: highlight the
    /// deepest proxy under the pointer.
    pub fn on_hover(&mut self, proxy: NodeId, point: Point, layout: &impl Layout) -> Vec<Action> {
        if !self.state.is_idle() {
            return Vec::new();
        }
        let target = self.overlays.redirect(&self.scene, layout, proxy, point);
        if self.overlays.set_active(target) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    /// Pointer left `proxy` while idle.
    pub fn on_pointer_leave(&mut self, proxy: NodeId) -> Vec<Action> {
        if !self.state.is_idle() {
            return Vec::new();
        }
        if self.overlays.leave(proxy) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    /// Open a drag session (no handle) or a resize session (corner handle).
    ///
    /// Ignored for non-primary buttons, hidden proxies, and while another
    /// session is alive.
    ///
    /// # Errors
    ///
    /// Refuses any session while a commit or an undo/redo round trip is
    /// pending: [`EditError::ElementBusy`] for the committing element,
    /// [`EditError::SessionActive`] for the others.
    pub fn on_pointer_down(
        &mut self,
        proxy: NodeId,
        handle: Option<Handle>,
        point: Point,
        button: Button,
        layout: &impl Layout,
    ) -> Result<Vec<Action>, EditError> {
        if button != Button::Primary || !self.overlays.is_visible(proxy) {
            return Ok(Vec::new());
        }
        if let Some(active) = self.state.element() {
            debug!(%active, %proxy, "session already active; pointer-down ignored");
            return Ok(Vec::new());
        }
        if self.history_busy {
            return Err(EditError::HistoryBusy);
        }

        let element = match handle {
            Some(_) => proxy,
            None => self.overlays.redirect(&self.scene, layout, proxy, point),
        };
        let node = self.scene.get(element).ok_or(EditError::UnknownOverlay)?;
        if node.updating {
            return Err(EditError::ElementBusy);
        }
        if let Some(committing) = self.commit_in_flight {
            debug!(%committing, %element, "commit in flight; pointer-down refused");
            return Err(EditError::SessionActive);
        }
        let rect = layout.rect(element).ok_or(EditError::UnknownOverlay)?;
        let parent = self.parent_rect(element, layout);
        let start = resolve_placement(&node.shadow, rect, parent);
        let base = SessionBase::new(element, parent, start, &node.style, &node.shadow);

        self.state = match handle {
            Some(handle) => InteractionState::Resizing(ResizeSession::start(base, handle, point)),
            None => InteractionState::Dragging(DragSession::start(base, point)),
        };
        self.overlays.set_active(element);
        debug!(%element, ?handle, "session started");
        Ok(vec![Action::RenderNeeded])
    }

    /// Update the live style for the current session.
    pub fn on_pointer_move(&mut self, point: Point) -> Vec<Action> {
        let min = self.config.min_size;
        let (element, previous, next, resizing) = match &mut self.state {
            InteractionState::Idle => return Vec::new(),
            InteractionState::Dragging(session) => {
                let next = session.placement_at(point);
                let previous = std::mem::replace(&mut session.base.current, next);
                (session.base.element, previous, next, false)
            }
            InteractionState::Resizing(session) => {
                let next = session.placement_at(point, min);
                let previous = std::mem::replace(&mut session.base.current, next);
                (session.base.element, previous, next, true)
            }
        };
        if let Some(node) = self.scene.get_mut(element) {
            node.style.set_percent(Field::Top, next.top);
            node.style.set_percent(Field::Left, next.left);
            if resizing {
                node.style.set_percent(Field::Width, next.width);
                node.style.set_percent(Field::Height, next.height);
            }
        }
        self.overlays.follow(element, previous, next);
        vec![Action::RenderNeeded]
    }

    /// End the current session.
    ///
    /// Guards run in order: missing position, unsupported units, non-finite
    /// geometry, threshold. Any rejection restores the starting style.
    ///
    /// # Errors
    ///
    /// Returns the guard that rejected the gesture.
    pub fn on_pointer_up(&mut self, point: Point) -> Result<Release, EditError> {
        let (base, placement, kind) = match std::mem::take(&mut self.state) {
            InteractionState::Idle => return Ok(Release::Idle),
            InteractionState::Dragging(session) => {
                let placement = session.placement_at(point);
                (session.base, placement, EntryKind::Position)
            }
            InteractionState::Resizing(session) => {
                let placement = session.placement_at(point, self.config.min_size);
                (session.base, placement, EntryKind::Size)
            }
        };
        let element = base.element;

        match self.validate(&base, placement, kind) {
            Ok(Some(pending)) => {
                if let Some(node) = self.scene.get_mut(element) {
                    node.updating = true;
                }
                self.commit_in_flight = Some(element);
                self.overlays.follow(element, base.current, pending.placement);
                debug!(%element, kind = kind.label(), "commit pending");
                Ok(Release::Commit(pending))
            }
            Ok(None) => {
                self.rollback(&base);
                debug!(%element, "below threshold; reverted");
                Ok(Release::BelowThreshold)
            }
            Err(e) => {
                self.rollback(&base);
                warn!(%element, code = e.error_code(), "gesture rejected: {e}");
                Err(e)
            }
        }
    }

    fn validate(&self, base: &SessionBase, placement: Placement, kind: EntryKind) -> Result<Option<PendingCommit>, EditError> {
        let node = self.scene.get(base.element).ok_or(EditError::UnknownOverlay)?;
        if !node.shadow.has_position() {
            return Err(EditError::NoPositionTarget);
        }
        let attributes = node.shadow.unsupported_units();
        if !attributes.is_empty() {
            return Err(EditError::UnsupportedUnit { attributes });
        }
        let placement = placement.rounded();
        if !placement.is_finite() {
            return Err(EditError::InvalidGeometry);
        }
        if placement.within(&base.start, self.config.drag_threshold) {
            return Ok(None);
        }
        let md_index = node.md_index.ok_or(EditError::UnknownOverlay)?;
        Ok(Some(PendingCommit {
            kind,
            element: base.element,
            md_index,
            placement,
            before: node.shadow.geometry(),
            after: base.had.commit(&placement, kind),
            class_list: self.scene.wire_classes(base.element),
            start: base.start,
            original_style: base.original_style.clone(),
        }))
    }

    fn rollback(&mut self, base: &SessionBase) {
        if let Some(node) = self.scene.get_mut(base.element) {
            node.style = base.original_style.clone();
        }
        self.overlays.follow(base.element, base.current, base.start);
    }

    /// Finalize a commit once the service has answered.
    ///
    /// On success the entry is recorded and the new geometry written to both
    /// shadow and style. On failure the starting style is restored and
    /// nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns the service failure, or [`EditError::UnknownOverlay`] if the
    /// element vanished meanwhile.
    pub fn finish_commit(&mut self, pending: PendingCommit, result: Result<(), SyncError>) -> Result<Outcome, EditError> {
        let PendingCommit { kind, element, md_index, placement, before, after, start, original_style, .. } = pending;
        self.commit_in_flight = None;
        let node = self.scene.get_mut(element).ok_or(EditError::UnknownOverlay)?;
        node.updating = false;

        if let Err(e) = result {
            node.style = original_style;
            self.overlays.follow(element, placement, start);
            warn!(%element, md_index, code = e.error_code(), "commit failed; reverted");
            return Err(e.into());
        }

        node.shadow.apply(&after, kind.fields());
        node.style = original_style;
        node.style.apply(&after, kind.fields());
        self.history.commit(HistoryEntry { kind, element, md_index, before, after });
        info!(%element, md_index, kind = kind.label(), history = %self.history.summary(), "edit committed");

        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.remeasure_after_edit(element));
        Ok(Outcome {
            notice: Notice::success(format!("{} updated (MD Index: {md_index})", kind.label())),
            actions,
        })
    }

    // --- History ---

    /// Reserve the entry an undo would revert.
    ///
    /// # Errors
    ///
    /// [`EditError::NothingToUndo`] on an empty history, or a busy error
    /// while a session, a pending commit, or another round trip is alive.
    pub fn begin_undo(&mut self) -> Result<PendingStep, EditError> {
        self.begin_step(Step::Undo)
    }

    /// Reserve the entry a redo would re-apply.
    ///
    /// # Errors
    ///
    /// [`EditError::NothingToRedo`] at the tail, or a busy error while a
    /// session, a pending commit, or another round trip is alive.
    pub fn begin_redo(&mut self) -> Result<PendingStep, EditError> {
        self.begin_step(Step::Redo)
    }

    fn begin_step(&mut self, step: Step) -> Result<PendingStep, EditError> {
        if !self.state.is_idle() || self.commit_in_flight.is_some() {
            return Err(EditError::SessionActive);
        }
        if self.history_busy {
            return Err(EditError::HistoryBusy);
        }
        let entry = match step {
            Step::Undo => self.history.next_undo().ok_or(EditError::NothingToUndo)?,
            Step::Redo => self.history.next_redo().ok_or(EditError::NothingToRedo)?,
        }
        .clone();
        self.history_busy = true;
        Ok(PendingStep { step, entry })
    }

    /// Apply an undo or redo once the service has accepted it. The cursor
    /// only moves on success.
    ///
    /// # Errors
    ///
    /// Returns the service failure; nothing is applied in that case.
    pub fn finish_step(&mut self, pending: PendingStep, result: Result<(), SyncError>) -> Result<Outcome, EditError> {
        self.history_busy = false;
        let PendingStep { step, entry } = pending;
        if let Err(e) = result {
            warn!(?step, md_index = entry.md_index, code = e.error_code(), "history step failed");
            return Err(e.into());
        }

        let geometry = match step {
            Step::Undo => &entry.before,
            Step::Redo => &entry.after,
        };
        match self.scene.get_mut(entry.element) {
            Some(node) => {
                node.shadow.apply(geometry, entry.kind.fields());
                node.style.apply(geometry, entry.kind.fields());
            }
            None => warn!(element = %entry.element, "history entry for missing element"),
        }
        let message = match step {
            Step::Undo => {
                self.history.step_back();
                "Undo successful"
            }
            Step::Redo => {
                self.history.step_forward();
                "Redo successful"
            }
        };
        info!(?step, md_index = entry.md_index, history = %self.history.summary(), "history step applied");

        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.remeasure_after_edit(entry.element));
        Ok(Outcome { notice: Notice::success(message), actions })
    }

    // --- Queries ---

    /// Committed edge set of `element`.
    #[must_use]
    pub fn geometry(&self, element: NodeId) -> Option<Geometry> {
        self.scene.get(element).map(|n| n.shadow.geometry())
    }

    #[must_use]
    pub fn active_overlay(&self) -> Option<NodeId> {
        self.overlays.active()
    }

    #[must_use]
    pub fn history_busy(&self) -> bool {
        self.history_busy
    }

    fn parent_rect(&self, element: NodeId, layout: &impl Layout) -> Rect {
        self.overlays
            .get(element)
            .and_then(|p| p.parent)
            .and_then(|parent| layout.rect(parent))
            .unwrap_or_else(|| layout.root_rect())
    }
}

fn measured(element: NodeId, outcome: Measurement) -> Vec<Action> {
    match outcome {
        Measurement::Ready => vec![Action::RenderNeeded],
        Measurement::Retry(delay) => vec![Action::ScheduleRemeasure { element, delay }],
        Measurement::Exhausted => Vec::new(),
    }
}

/// Async front end: drives [`EngineCore`] and awaits the service in between.
///
/// The core is borrowed only between awaits, so hover and edit-mode signals
/// keep working while a round trip is in flight. New sessions and history
/// steps are refused until it completes.
pub struct Editor<S> {
    core: RefCell<EngineCore>,
    gateway: SyncGateway<S>,
}

impl<S: EditService> Editor<S> {
    #[must_use]
    pub fn new(core: EngineCore, gateway: SyncGateway<S>) -> Self {
        Self { core: RefCell::new(core), gateway }
    }

    pub fn core(&self) -> Ref<'_, EngineCore> {
        self.core.borrow()
    }

    pub fn core_mut(&self) -> RefMut<'_, EngineCore> {
        self.core.borrow_mut()
    }

    #[must_use]
    pub fn gateway(&self) -> &SyncGateway<S> {
        &self.gateway
    }

    /// Startup health probe; logged only.
    pub async fn probe(&self) -> bool {
        self.gateway.probe().await
    }

    /// See [`EngineCore::on_pointer_down`].
    ///
    /// # Errors
    ///
    /// Propagates the core's refusal.
    pub fn pointer_down(
        &self,
        proxy: NodeId,
        handle: Option<Handle>,
        point: Point,
        button: Button,
        layout: &impl Layout,
    ) -> Result<Vec<Action>, EditError> {
        self.core.borrow_mut().on_pointer_down(proxy, handle, point, button, layout)
    }

    pub fn pointer_move(&self, point: Point) -> Vec<Action> {
        self.core.borrow_mut().on_pointer_move(point)
    }

    /// End the session and, when it produced a change, confirm it with the
    /// service before recording it. Returns `None` for no-op gestures.
    ///
    /// # Errors
    ///
    /// Returns the guard or service failure; the geometry is already reverted.
    pub async fn pointer_up(&self, point: Point) -> Result<Option<Outcome>, EditError> {
        let release = self.core.borrow_mut().on_pointer_up(point)?;
        let Release::Commit(pending) = release else {
            return Ok(None);
        };
        let request = self.gateway.commit_request(
            pending.kind,
            pending.md_index,
            &pending.placement,
            &pending.before,
            pending.class_list.clone(),
        );
        let result = self.gateway.submit(&request).await;
        self.core.borrow_mut().finish_commit(pending, result).map(Some)
    }

    /// Undo the last applied entry, service first.
    ///
    /// # Errors
    ///
    /// [`EditError::NothingToUndo`] without a service call on an empty
    /// history; otherwise the service failure, with nothing applied.
    pub async fn undo(&self) -> Result<Outcome, EditError> {
        let pending = self.core.borrow_mut().begin_undo()?;
        let result = self.gateway.submit(&self.gateway.undo_request()).await;
        self.core.borrow_mut().finish_step(pending, result)
    }

    /// Redo the next undone entry, service first.
    ///
    /// # Errors
    ///
    /// [`EditError::NothingToRedo`] without a service call at the tail;
    /// otherwise the service failure, with nothing applied.
    pub async fn redo(&self) -> Result<Outcome, EditError> {
        let pending = self.core.borrow_mut().begin_redo()?;
        let result = self.gateway.submit(&self.gateway.redo_request()).await;
        self.core.borrow_mut().finish_step(pending, result)
    }
}
