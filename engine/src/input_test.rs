#![allow(clippy::float_cmp)]

use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn frame() -> Placement {
    Placement { top: 10.0, left: 10.0, width: 20.0, height: 20.0 }
}

fn parent() -> Rect {
    Rect::new(0.0, 0.0, 1000.0, 500.0)
}

fn base(shadow: &Declarations) -> SessionBase {
    SessionBase::new(NodeId(1), parent(), frame(), shadow, shadow)
}

fn tlwh() -> Declarations {
    Declarations::from([
        (Field::Top, "10%"),
        (Field::Left, "10%"),
        (Field::Width, "20%"),
        (Field::Height, "20%"),
    ])
}

// =============================================================
// Handles
// =============================================================

#[test]
fn se_handle_moves_only_size() {
    let p = Handle::Se.apply(frame(), -10.0, -10.0, 1.0);
    assert_eq!(p, Placement { top: 10.0, left: 10.0, width: 10.0, height: 10.0 });
}

#[test]
fn nw_handle_moves_leading_edges_opposite_to_size() {
    let p = Handle::Nw.apply(frame(), 5.0, 4.0, 1.0);
    assert!(approx(p.top, 14.0));
    assert!(approx(p.height, 16.0));
    assert!(approx(p.left, 15.0));
    assert!(approx(p.width, 15.0));
}

#[test]
fn ne_and_sw_mix_axes() {
    let ne = Handle::Ne.apply(frame(), 5.0, 5.0, 1.0);
    assert!(approx(ne.top, 15.0));
    assert!(approx(ne.width, 25.0));
    assert_eq!(ne.left, 10.0);

    let sw = Handle::Sw.apply(frame(), 5.0, 5.0, 1.0);
    assert_eq!(sw.top, 10.0);
    assert!(approx(sw.height, 25.0));
    assert!(approx(sw.left, 15.0));
    assert!(approx(sw.width, 15.0));
}

#[test]
fn resize_clamps_to_minimum() {
    let p = Handle::Se.apply(frame(), -50.0, -30.0, 1.0);
    assert_eq!(p.width, 1.0);
    assert_eq!(p.height, 1.0);
}

#[test]
fn clamped_north_west_keeps_opposite_edges() {
    let p = Handle::Nw.apply(frame(), 40.0, 40.0, 1.0);
    assert_eq!(p.width, 1.0);
    assert_eq!(p.height, 1.0);
    assert!(approx(p.top + p.height, 30.0));
    assert!(approx(p.left + p.width, 30.0));
}

#[test]
fn handle_serde_names() {
    let json = serde_json::to_string(&Handle::Nw).expect("serialize");
    assert_eq!(json, "\"nw\"");
    let back: Handle = serde_json::from_str("\"se\"").expect("deserialize");
    assert_eq!(back, Handle::Se);
}

// =============================================================
// Commit geometry
// =============================================================

#[test]
fn commit_writes_leading_edges_by_default() {
    let had = SetFields::of(&tlwh());
    let after = had.commit(&Placement { top: 13.0, left: 15.0, width: 20.0, height: 20.0 }, EntryKind::Position);
    assert_eq!(after.top, Some(13.0));
    assert_eq!(after.left, Some(15.0));
    assert_eq!(after.bottom, None);
    assert_eq!(after.right, None);
    assert_eq!((after.width, after.height), (Some(20.0), Some(20.0)), "size carried unchanged");
}

#[test]
fn commit_never_invents_trailing_edges() {
    let had = SetFields::of(&tlwh());
    let after = had.commit(&Placement { top: 10.0, left: 10.0, width: 10.0, height: 10.0 }, EntryKind::Size);
    assert_eq!(after.bottom, None);
    assert_eq!(after.right, None);
    assert_eq!(after.width, Some(10.0));
    assert_eq!(after.height, Some(10.0));
}

#[test]
fn commit_keeps_trailing_anchor() {
    let shadow = Declarations::from([(Field::Bottom, "10%"), (Field::Right, "5%"), (Field::Width, "20%")]);
    let after = SetFields::of(&shadow).commit(
        &Placement { top: 60.0, left: 70.0, width: 20.0, height: 25.0 },
        EntryKind::Size,
    );
    assert_eq!(after.top, None);
    assert_eq!(after.left, None);
    assert_eq!(after.bottom, Some(15.0));
    assert_eq!(after.right, Some(10.0));
}

#[test]
fn commit_recomputes_both_edges_when_both_set() {
    let shadow = Declarations::from([(Field::Top, "10%"), (Field::Bottom, "70%")]);
    let after = SetFields::of(&shadow).commit(
        &Placement { top: 12.0, left: 0.0, width: 50.0, height: 20.0 },
        EntryKind::Position,
    );
    assert_eq!(after.top, Some(12.0));
    assert_eq!(after.bottom, Some(68.0));
    assert_eq!(after.left, Some(0.0));
    assert_eq!(after.right, None);
    assert_eq!((after.width, after.height), (None, None), "unset size stays absent");
}

#[test]
fn trailing_edges_are_rounded() {
    let shadow = Declarations::from([(Field::Bottom, "10%")]);
    let after = SetFields::of(&shadow).commit(
        &Placement { top: 33.3, left: 0.0, width: 10.0, height: 33.3 },
        EntryKind::Position,
    );
    assert_eq!(after.bottom, Some(33.4));
}

// =============================================================
// Sessions
// =============================================================

#[test]
fn session_base_rounds_start() {
    let b = SessionBase::new(
        NodeId(1),
        parent(),
        Placement { top: 10.04, left: 9.96, width: 20.0, height: 20.0 },
        &tlwh(),
        &tlwh(),
    );
    assert_eq!(b.start.top, 10.0);
    assert_eq!(b.start.left, 10.0);
    assert_eq!(b.current, b.start);
    assert!(b.had.top && b.had.width && !b.had.bottom);
}

#[test]
fn drag_keeps_pointer_offset() {
    let drag = DragSession::start(base(&tlwh()), Point::new(150.0, 75.0));
    assert_eq!(drag.offset, (5.0, 5.0));
    let p = drag.placement_at(Point::new(200.0, 90.0));
    assert_eq!(p.left, 15.0);
    assert_eq!(p.top, 13.0);
    assert_eq!(p.width, 20.0);
}

#[test]
fn drag_is_relative_to_parent_origin() {
    let mut b = base(&tlwh());
    b.parent = Rect::new(100.0, 100.0, 1000.0, 500.0);
    let drag = DragSession::start(b, Point::new(250.0, 175.0));
    let p = drag.placement_at(Point::new(250.0, 175.0));
    assert!(approx(p.left, 10.0));
    assert!(approx(p.top, 10.0));
}

#[test]
fn resize_uses_pointer_delta() {
    let resize = ResizeSession::start(base(&tlwh()), Handle::Se, Point::new(300.0, 150.0));
    let p = resize.placement_at(Point::new(200.0, 100.0), 1.0);
    assert_eq!(p, Placement { top: 10.0, left: 10.0, width: 10.0, height: 10.0 });
}

#[test]
fn interaction_state_reports_session() {
    assert!(InteractionState::default().is_idle());
    let state = InteractionState::Resizing(ResizeSession::start(base(&tlwh()), Handle::Ne, Point::default()));
    assert!(!state.is_idle());
    assert_eq!(state.element(), Some(NodeId(1)));
    let drag = InteractionState::Dragging(DragSession::start(base(&tlwh()), Point::default()));
    assert_eq!(drag.base().map(|b| b.element), Some(NodeId(1)));
}
