use geo::line_string;
use mobility::prelude::*;
use mobility::{Axis, InMemoryNetwork};
use std::sync::Arc;

fn ts(text: &str) -> Timestamp {
    text.parse().expect("timestamp literal")
}

fn network(with_branch: bool) -> InMemoryNetwork {
    let trunk = InMemoryNetwork::new(0)
        .with_route(1, line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)])
        .expect("valid trunk");
    if !with_branch {
        return trunk;
    }
    trunk
        .with_route(7, line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 50.0)])
        .expect("valid branch")
}

/// Runs alone in this binary: it swaps the process-wide network.
#[test]
fn test_derived_values_need_their_route() {
    let _ = env_logger::builder().is_test(true).try_init();
    Catalog::global().set_network(Arc::new(network(true)));

    let trip = Temporal::parse(
        "[NPoint(7,0.2)@2024-01-01T00:00:00Z, NPoint(7,0.8)@2024-01-01T00:00:10Z]",
        ValueKind::NetworkPoint,
    )
    .unwrap();
    let later = TInstant::new(
        Value::NetworkPoint(NetworkPosition::new(7, 1.0)),
        ts("2024-01-01T00:00:20Z"),
    )
    .unwrap();
    let window = Period::closed(ts("2024-01-01T00:00:02Z"), ts("2024-01-01T00:00:08Z"));

    let part = trip.at_period(&window).unwrap().unwrap();
    assert_eq!(part.bbox().range(Axis::X), Some((0.0, 0.0)));
    let (ymin, ymax) = part.bbox().range(Axis::Y).unwrap();
    assert!((ymin - 16.0).abs() < 1e-9 && (ymax - 34.0).abs() < 1e-9);

    Catalog::global().set_network(Arc::new(network(false)));

    // Stored values stay readable; anything needing route 7's geometry fails.
    assert!(trip.value_at(ts("2024-01-01T00:00:05Z")).is_some());
    assert!(matches!(trip.at_period(&window), Err(MobilityError::UnknownRoute(7))));
    assert!(matches!(
        trip.at_timestamp(ts("2024-01-01T00:00:05Z")),
        Err(MobilityError::UnknownRoute(7))
    ));
    assert!(matches!(trip.minus_period(&window), Err(MobilityError::UnknownRoute(7))));
    assert!(matches!(synchronize(&trip, &trip, false), Err(MobilityError::UnknownRoute(7))));

    let mut grown = trip.clone();
    assert!(matches!(grown.append(later.clone()), Err(MobilityError::UnknownRoute(7))));
    assert_eq!(grown, trip);

    Catalog::global().set_network(Arc::new(network(true)));
    grown.append(later).unwrap();
    assert_eq!(grown.bbox().range(Axis::Y), Some((10.0, 50.0)));
}
