use mobility::prelude::*;
use mobility::{Axis, TInstant};

fn ts(secs: i64) -> Timestamp {
    Timestamp::from_secs(secs)
}

fn inst(v: f64, secs: i64) -> TInstant {
    TInstant::new(Value::Float(v), ts(secs)).unwrap()
}

/// Test 1: Duplicate and decreasing timestamps
#[test]
fn test_non_increasing_timestamps() {
    let duplicate = TInstantSet::new(vec![inst(1.0, 0), inst(2.0, 0)]).unwrap_err();
    assert!(matches!(duplicate, MobilityError::NonIncreasingTimestamps { .. }));

    let decreasing = TSequence::new(
        vec![inst(1.0, 10), inst(2.0, 0)],
        true,
        true,
        Interpolation::Linear,
    )
    .unwrap_err();
    match decreasing {
        MobilityError::NonIncreasingTimestamps { previous, next } => {
            assert_eq!(previous, ts(10));
            assert_eq!(next, ts(0));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

/// Test 2: Empty collections
#[test]
fn test_empty_collections_rejected() {
    assert!(TInstantSet::new(Vec::new()).is_err());
    assert!(TSequence::new(Vec::new(), true, true, Interpolation::Step).is_err());
    assert!(TSequenceSet::new(Vec::new()).is_err());
}

/// Test 3: Bound inclusivity rules
#[test]
fn test_bound_rules() {
    // A single instant needs both bounds inclusive.
    let open = TSequence::new(vec![inst(1.0, 0)], false, true, Interpolation::Linear).unwrap_err();
    assert!(matches!(open, MobilityError::InvalidBounds(_)));

    // A step sequence never reaches an excluded last value.
    let held = Temporal::parse(
        "Interp=Step;[1@2024-01-01T00:00:00Z, 2@2024-01-01T00:00:10Z)",
        ValueKind::Float,
    )
    .unwrap();
    assert_eq!(held.end_value(), &Value::Float(1.0));
    assert_eq!(held.max_value(), Some(1.0));
    assert_eq!(
        held.to_string(),
        "Interp=Step;[1@2024-01-01T00:00:00Z, 1@2024-01-01T00:00:10Z)"
    );
}

/// Test 4: Non-finite values
#[test]
fn test_non_finite_values() {
    assert!(matches!(
        TInstant::new(Value::Float(f64::NAN), ts(0)),
        Err(MobilityError::InvalidInput(_))
    ));
    assert!(TInstant::new(Value::GeomPoint(GeoPoint::new(0.0, f64::INFINITY)), ts(0)).is_err());
    assert!(TInstant::new(Value::GeogPoint(GeoPoint::new(181.0, 0.0)), ts(0)).is_err());
}

/// Test 5: Mixed frames inside one container
#[test]
fn test_mixed_frames_rejected() {
    let flat = TInstant::new(Value::GeomPoint(GeoPoint::new(0.0, 0.0)), ts(0)).unwrap();
    let tall = TInstant::new(Value::GeomPoint(GeoPoint::new_3d(1.0, 1.0, 1.0)), ts(10)).unwrap();
    let err = TInstantSet::new(vec![flat, tall]).unwrap_err();
    assert!(matches!(err, MobilityError::DimensionalityMismatch { .. }));

    let number = inst(1.0, 20);
    let point = TInstant::new(Value::GeomPoint(GeoPoint::new(0.0, 0.0)), ts(30)).unwrap();
    assert!(TInstantSet::new(vec![number, point]).is_err());
}

/// Test 6: Sequence sets mixing interpolations
#[test]
fn test_sequence_set_interpolation_must_agree() {
    let step = TSequence::new(vec![inst(1.0, 0), inst(1.0, 5)], true, true, Interpolation::Step).unwrap();
    let linear =
        TSequence::new(vec![inst(1.0, 10), inst(2.0, 15)], true, true, Interpolation::Linear).unwrap();
    assert!(TSequenceSet::new(vec![step, linear]).is_err());
}

/// Test 7: Queries outside the time extent return nothing rather than fail
#[test]
fn test_absence_is_not_an_error() {
    let temp = Temporal::parse("[1@2024-01-01T00:00:00Z, 2@2024-01-01T00:00:10Z)", ValueKind::Float).unwrap();
    let before: Timestamp = "2023-12-31T23:59:59Z".parse().unwrap();
    assert_eq!(temp.value_at(before), None);
    assert_eq!(temp.at_timestamp(before).unwrap(), None);

    let elsewhere = Period::closed("2025-01-01T00:00:00Z".parse().unwrap(), "2025-01-02T00:00:00Z".parse().unwrap());
    assert!(temp.at_period(&elsewhere).unwrap().is_none());
    let rest = temp.minus_period(&elsewhere).unwrap().unwrap();
    assert_eq!(rest.sequences(), temp.sequences());
    assert!(temp.at_value(&Value::Float(42.0)).unwrap().is_none());
}

/// Test 8: Instants and instant sets only hold values at their timestamps
#[test]
fn test_discrete_values() {
    let set = Temporal::parse("{1@2024-01-01T00:00:00Z, 3@2024-01-01T00:00:10Z}", ValueKind::Float).unwrap();
    assert_eq!(set.value_at("2024-01-01T00:00:05Z".parse().unwrap()), None);
    assert_eq!(set.value_at("2024-01-01T00:00:10Z".parse().unwrap()), Some(Value::Float(3.0)));
    assert_eq!(set.duration_micros(), 0);
    assert_eq!(set.values(), vec![Value::Float(1.0), Value::Float(3.0)]);
    assert!(set.interpolation().is_none());
}

/// Test 9: Degenerate and extreme boxes in the index
#[test]
fn test_index_extremes() {
    let boxes: Vec<(usize, BoundingBox)> = (0..200)
        .map(|i| {
            let v = if i % 2 == 0 { -1e300 } else { 1e300 };
            (i, BoundingBox::new().with_xy(v, v, v, v))
        })
        .collect();
    let tree = BoxOctree::build(boxes, &Default::default()).unwrap();
    let stats = tree.stats();
    // Two distinct boxes, each repeated: one split, two leaves.
    assert_eq!(stats.inner_nodes, 1);
    assert_eq!(stats.leaves, 2);

    let everything = BoundingBox::new().with_xy(f64::MIN, f64::MIN, f64::MAX, f64::MAX);
    assert_eq!(tree.search(Relation::ContainedBy, &everything).unwrap().len(), 200);
}

/// Test 10: Three-dimensional points carry a z axis through the box
#[test]
fn test_z_axis_boxes() {
    let temp = Temporal::parse(
        "[POINT Z(0 0 100)@2024-01-01T00:00:00Z, POINT Z(10 0 300)@2024-01-01T00:00:10Z]",
        ValueKind::GeomPoint,
    )
    .unwrap();
    assert_eq!(temp.bbox().range(Axis::Z), Some((100.0, 300.0)));
    let below = BoundingBox::new().with_z(400.0, 500.0);
    assert!(Relation::Front.holds(temp.bbox(), &below));
    assert!(!Relation::Back.holds(temp.bbox(), &below));
}
