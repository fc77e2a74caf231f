#![allow(clippy::float_cmp)]

use super::*;

fn parent() -> Rect {
    Rect::new(0.0, 0.0, 1000.0, 500.0)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// =============================================================
// Conversions
// =============================================================

#[test]
fn to_percent_is_plain_division() {
    assert_eq!(to_percent(250.0, 1000.0), 25.0);
    assert_eq!(to_percent(-50.0, 500.0), -10.0);
    assert_eq!(to_percent(1500.0, 1000.0), 150.0, "never clamped");
}

#[test]
fn round_tenth_keeps_one_decimal() {
    assert_eq!(round_tenth(12.34), 12.3);
    assert_eq!(round_tenth(12.36), 12.4);
    assert_eq!(round_tenth(12.999_999_999_999_996), 13.0);
    assert_eq!(round_tenth(-3.04), -3.0);
}

#[test]
fn derive_missing_edge_uses_current_size() {
    // bottom 10%, element 100px of a 500px parent (20%) -> top 70%
    assert!(approx(derive_missing_edge(10.0, 100.0, 500.0), 70.0));
    // same bottom, element grew to 200px -> top moves, nothing is cached
    assert!(approx(derive_missing_edge(10.0, 200.0, 500.0), 50.0));
}

#[test]
fn percentage_detection() {
    assert!(is_percentage("10%"));
    assert!(is_percentage(" 10.5% "));
    assert!(is_percentage(""));
    assert!(!is_percentage("120px"));
    assert!(!is_percentage("2em"));
}

#[test]
fn parse_percent_rejects_other_units() {
    assert_eq!(parse_percent("12.5%"), Some(12.5));
    assert_eq!(parse_percent(" -3% "), Some(-3.0));
    assert_eq!(parse_percent("12px"), None);
    assert_eq!(parse_percent("abc%"), None);
    assert_eq!(parse_percent("NaN%"), None);
}

#[test]
fn format_percent_drops_trailing_zero() {
    assert_eq!(format_percent(13.0), "13%");
    assert_eq!(format_percent(12.5), "12.5%");
}

// =============================================================
// Placement
// =============================================================

#[test]
fn placement_companions() {
    let p = Placement { top: 10.0, left: 20.0, width: 30.0, height: 40.0 };
    assert_eq!(p.bottom(), 50.0);
    assert_eq!(p.right(), 50.0);
}

#[test]
fn placement_within_threshold_requires_every_axis() {
    let a = Placement { top: 10.0, left: 10.0, width: 20.0, height: 20.0 };
    let nudge = Placement { top: 10.05, ..a };
    let moved = Placement { width: 20.5, ..a };
    assert!(a.within(&nudge, 0.1));
    assert!(!a.within(&moved, 0.1));
}

#[test]
fn placement_rounded() {
    let p = Placement { top: 10.04, left: 9.96, width: 20.26, height: 0.04 }.rounded();
    assert_eq!(p, Placement { top: 10.0, left: 10.0, width: 20.3, height: 0.0 });
}

// =============================================================
// resolve_placement
// =============================================================

#[test]
fn resolve_prefers_shadow_attributes() {
    let shadow = Declarations::from([
        (Field::Top, "10%"),
        (Field::Left, "12%"),
        (Field::Width, "20%"),
        (Field::Height, "30%"),
    ]);
    // Live rect disagrees; shadow wins.
    let rect = Rect::new(500.0, 250.0, 10.0, 10.0);
    let p = resolve_placement(&shadow, rect, parent());
    assert_eq!(p, Placement { top: 10.0, left: 12.0, width: 20.0, height: 30.0 });
}

#[test]
fn resolve_falls_back_to_measurement() {
    let rect = Rect::new(100.0, 50.0, 200.0, 100.0);
    let p = resolve_placement(&Declarations::new(), rect, parent());
    assert!(approx(p.top, 10.0));
    assert!(approx(p.left, 10.0));
    assert!(approx(p.width, 20.0));
    assert!(approx(p.height, 20.0));
}

#[test]
fn resolve_derives_leading_edges_from_trailing() {
    let shadow = Declarations::from([(Field::Bottom, "10%"), (Field::Right, "5%")]);
    let rect = Rect::new(0.0, 0.0, 200.0, 100.0);
    let p = resolve_placement(&shadow, rect, parent());
    assert!(approx(p.top, 70.0));
    assert!(approx(p.left, 75.0));
}

#[test]
fn resolve_is_relative_to_parent_origin() {
    let parent = Rect::new(100.0, 100.0, 1000.0, 500.0);
    let rect = Rect::new(200.0, 150.0, 100.0, 50.0);
    let p = resolve_placement(&Declarations::new(), rect, parent);
    assert!(approx(p.top, 10.0));
    assert!(approx(p.left, 10.0));
}

// =============================================================
// margin_compensated
// =============================================================

#[test]
fn margins_shift_leading_edges_and_grow_size() {
    let rect = Rect::new(110.0, 60.0, 200.0, 100.0);
    let margins = Margins { top: 10.0, right: 10.0, bottom: 10.0, left: 10.0 };
    let p = margin_compensated(rect, parent(), margins).expect("measurable");
    assert!(approx(p.top, 10.0));
    assert!(approx(p.left, 10.0));
    assert!(approx(p.width, 22.0));
    assert!(approx(p.height, 24.0));
}

#[test]
fn margin_compensation_is_stable_across_remeasure() {
    let rect = Rect::new(110.0, 60.0, 200.0, 100.0);
    let margins = Margins { top: 10.0, right: 0.0, bottom: 0.0, left: 10.0 };
    let first = margin_compensated(rect, parent(), margins).expect("measurable");
    let second = margin_compensated(rect, parent(), margins).expect("measurable");
    assert_eq!(first, second);
}

#[test]
fn degenerate_measurement_is_rejected() {
    let zero = Rect::new(100.0, 100.0, 0.0, 0.0);
    assert!(margin_compensated(zero, parent(), Margins::default()).is_none());
    let thin = Rect::new(100.0, 100.0, 50.0, 0.5);
    assert!(margin_compensated(thin, parent(), Margins::default()).is_none());
}

// =============================================================
// Declarations
// =============================================================

#[test]
fn empty_values_count_as_unset() {
    let d = Declarations::from([(Field::Top, ""), (Field::Left, "  ")]);
    assert!(!d.is_set(Field::Top));
    assert!(!d.has_position());
}

#[test]
fn unsupported_units_lists_offenders() {
    let d = Declarations::from([
        (Field::Top, "10%"),
        (Field::Left, "40px"),
        (Field::Width, "3em"),
        (Field::Height, ""),
    ]);
    assert_eq!(d.unsupported_units(), vec!["left=\"40px\"".to_owned(), "width=\"3em\"".to_owned()]);
}

#[test]
fn geometry_marks_absent_as_none() {
    let d = Declarations::from([(Field::Top, "10%"), (Field::Width, "20%")]);
    let g = d.geometry();
    assert_eq!(g.top, Some(10.0));
    assert_eq!(g.width, Some(20.0));
    assert_eq!(g.left, None);
    assert_eq!(g.bottom, None);
    assert!(g.has_position());
}

#[test]
fn apply_sets_and_removes() {
    let mut d = Declarations::from([(Field::Top, "10%"), (Field::Bottom, "5%")]);
    let g = Geometry { top: Some(12.5), bottom: None, ..Geometry::default() };
    d.apply(&g, &[Field::Top, Field::Bottom]);
    assert_eq!(d.get(Field::Top), Some("12.5%"));
    assert!(!d.is_set(Field::Bottom));
}

#[test]
fn apply_leaves_unlisted_fields_alone() {
    let mut d = Declarations::from([(Field::Width, "20%")]);
    d.apply(&Geometry::default(), &[Field::Top]);
    assert_eq!(d.get(Field::Width), Some("20%"));
}

#[test]
fn declarations_serialize_as_css_keys() {
    let d = Declarations::from([(Field::Top, "10%")]);
    let json = serde_json::to_value(&d).expect("serialize");
    assert_eq!(json, serde_json::json!({ "top": "10%" }));
    let back: Declarations = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, d);
}
