//! Bounding volumes of values, segments and instant runs.
//!
//! Boxes are folded in instant order with `min`/`max`, so the same instants
//! always produce the same box regardless of how a container was built.

use crate::catalog::Catalog;
use crate::engine::engine_for;
use crate::error::{MobilityError, Result};
use crate::network::sub_route_box;
use crate::temporal::{Interpolation, TInstant};
use mobility_types::bbox::BoundingBox;
use mobility_types::network::NetworkPosition;
use mobility_types::time::Timestamp;
use mobility_types::value::Value;

fn network_box(from: &NetworkPosition, to: &NetworkPosition) -> Result<BoundingBox> {
    let network = Catalog::global()
        .network()
        .ok_or(MobilityError::UnknownRoute(from.route))?;
    let line = network
        .route_geometry(from.route)
        .ok_or(MobilityError::UnknownRoute(from.route))?;
    sub_route_box(&line, from.fraction, to.fraction, network.srid())
        .ok_or(MobilityError::UnknownRoute(from.route))
}

/// Box of a single value, without a time extent.
pub fn value_box(value: &Value) -> Result<BoundingBox> {
    match value {
        Value::Float(v) => Ok(BoundingBox::new().with_m(*v, *v)),
        Value::GeomPoint(p) | Value::GeogPoint(p) => {
            Ok(engine_for(value.kind()).bounding_box(p))
        }
        Value::NetworkPoint(np) => network_box(np, np),
    }
}

/// Box of every value a linear segment between `from` and `to` passes through.
pub fn segment_box(from: &Value, to: &Value) -> Result<BoundingBox> {
    match (from, to) {
        (Value::Float(a), Value::Float(b)) => Ok(BoundingBox::new().with_m(a.min(*b), a.max(*b))),
        (Value::GeomPoint(a), Value::GeomPoint(b)) | (Value::GeogPoint(a), Value::GeogPoint(b)) => {
            Ok(engine_for(from.kind()).segment_box(a, b))
        }
        (Value::NetworkPoint(a), Value::NetworkPoint(b)) if a.same_route(b) => network_box(a, b),
        _ => {
            let mut bbox = value_box(from)?;
            bbox.expand(&value_box(to)?);
            Ok(bbox)
        }
    }
}

/// Box of one instant: the value box plus a degenerate time range.
pub fn instant_box(value: &Value, t: Timestamp) -> Result<BoundingBox> {
    Ok(value_box(value)?.with_t(t, t))
}

/// Box of a discrete instant run: the union of the instant boxes.
pub fn instants_box(instants: &[TInstant]) -> Option<BoundingBox> {
    merge_boxes(instants.iter().map(TInstant::bbox))
}

/// Box of a sequence run.
///
/// Step sequences cover their instants; linear sequences also cover
/// everything each segment passes through. Fails when a network segment's
/// route can no longer be resolved.
pub fn sequence_box(instants: &[TInstant], interpolation: Interpolation) -> Result<Option<BoundingBox>> {
    if interpolation == Interpolation::Step || instants.len() < 2 {
        return Ok(instants_box(instants));
    }
    let mut bbox = *instants[0].bbox();
    for pair in instants.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        bbox.expand(&segment_box(from.value(), to.value())?.with_t(from.timestamp(), to.timestamp()));
    }
    Ok(Some(bbox))
}

/// Union of several boxes in order.
pub fn merge_boxes<'a>(boxes: impl IntoIterator<Item = &'a BoundingBox>) -> Option<BoundingBox> {
    let mut iter = boxes.into_iter();
    let mut out = *iter.next()?;
    for bbox in iter {
        out.expand(bbox);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobility_types::bbox::Axis;
    use mobility_types::point::GeoPoint;

    fn float(v: f64, secs: i64) -> TInstant {
        TInstant::new(Value::Float(v), Timestamp::from_secs(secs)).unwrap()
    }

    #[test]
    fn test_float_run_box() {
        let run = [float(3.0, 0), float(-1.0, 10), float(2.0, 20)];
        let bbox = sequence_box(&run, Interpolation::Linear).unwrap().unwrap();
        assert_eq!(bbox.range(Axis::M), Some((-1.0, 3.0)));
        assert_eq!(bbox.tmin, Timestamp::from_secs(0));
        assert_eq!(bbox.tmax, Timestamp::from_secs(20));
        assert!(!bbox.has(Axis::X));
    }

    #[test]
    fn test_discrete_and_linear_agree_for_planar_points() {
        let a = TInstant::new(Value::GeomPoint(GeoPoint::new(0.0, 0.0)), Timestamp::from_secs(0)).unwrap();
        let b = TInstant::new(Value::GeomPoint(GeoPoint::new(4.0, 2.0)), Timestamp::from_secs(5)).unwrap();
        let run = [a, b];
        assert_eq!(
            instants_box(&run),
            sequence_box(&run, Interpolation::Linear).unwrap()
        );
    }

    #[test]
    fn test_linear_geodetic_box_covers_arc() {
        let a = TInstant::new(
            Value::GeogPoint(GeoPoint::new(-74.0, 40.7).with_srid(4326)),
            Timestamp::from_secs(0),
        )
        .unwrap();
        let b = TInstant::new(
            Value::GeogPoint(GeoPoint::new(2.35, 48.85).with_srid(4326)),
            Timestamp::from_secs(3600),
        )
        .unwrap();
        let run = [a, b];
        let linear = sequence_box(&run, Interpolation::Linear).unwrap().unwrap();
        let step = sequence_box(&run, Interpolation::Step).unwrap().unwrap();
        assert!(linear.ymax > step.ymax);
        assert!(linear.geodetic);
    }

    #[test]
    fn test_merge_boxes() {
        let a = BoundingBox::new().with_m(0.0, 1.0);
        let b = BoundingBox::new().with_m(5.0, 6.0);
        let merged = merge_boxes([&a, &b]).unwrap();
        assert_eq!(merged.range(Axis::M), Some((0.0, 6.0)));
        assert!(merge_boxes(std::iter::empty()).is_none());
    }
}
