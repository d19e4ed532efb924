//! Interpolation between consecutive instants.
//!
//! Step interpolation holds the earlier value until the next instant. Linear
//! interpolation blends values by the elapsed time fraction: numbers and
//! network fractions are mixed arithmetically, planar points along straight
//! lines and geodetic points along great circles.

use crate::engine::{GeometryEngine, engine_for};
use crate::temporal::{Interpolation, TInstant};
use mobility_types::point::GeoPoint;
use mobility_types::time::Timestamp;
use mobility_types::value::{Value, ValueKind};

const LOCATE_TOLERANCE: f64 = 1e-10;
const GOLDEN_SECTION_STEPS: usize = 100;

fn lerp(a: f64, b: f64, fraction: f64) -> f64 {
    a + (b - a) * fraction
}

/// Value at `fraction` of the way from `from` to `to` under linear interpolation.
///
/// Values of different kinds, or network positions on different routes,
/// cannot be blended; the earlier value is returned.
pub fn blend(from: &Value, to: &Value, fraction: f64) -> Value {
    if fraction <= 0.0 {
        return *from;
    }
    if fraction >= 1.0 {
        return *to;
    }
    match (from, to) {
        (Value::Float(a), Value::Float(b)) => Value::Float(lerp(*a, *b, fraction)),
        (Value::GeomPoint(a), Value::GeomPoint(b)) => {
            Value::GeomPoint(engine_for(from.kind()).interpolate(a, b, fraction))
        }
        (Value::GeogPoint(a), Value::GeogPoint(b)) => {
            Value::GeogPoint(engine_for(from.kind()).interpolate(a, b, fraction))
        }
        (Value::NetworkPoint(a), Value::NetworkPoint(b)) if a.same_route(b) => {
            let mut position = *a;
            position.fraction = lerp(a.fraction, b.fraction, fraction);
            Value::NetworkPoint(position)
        }
        _ => *from,
    }
}

/// Value between two instants at `t`, which must lie within their span.
pub fn between(from: &TInstant, to: &TInstant, t: Timestamp, interpolation: Interpolation) -> Value {
    if t <= from.timestamp() {
        return *from.value();
    }
    if t >= to.timestamp() {
        return *to.value();
    }
    match interpolation {
        Interpolation::Step => *from.value(),
        Interpolation::Linear => {
            let fraction = t.fraction_between(from.timestamp(), to.timestamp());
            blend(from.value(), to.value(), fraction)
        }
    }
}

/// Value of an instant run at `t`, treating the run as closed at both ends.
///
/// `None` when `t` lies outside `[first, last]`.
pub fn value_in_run(instants: &[TInstant], t: Timestamp, interpolation: Interpolation) -> Option<Value> {
    let first = instants.first()?;
    let last = instants.last()?;
    if t < first.timestamp() || t > last.timestamp() {
        return None;
    }
    let idx = instants.partition_point(|inst| inst.timestamp() <= t);
    // `idx >= 1` since `first.timestamp() <= t`.
    let before = &instants[idx - 1];
    if before.timestamp() == t {
        return Some(*before.value());
    }
    instants
        .get(idx)
        .map(|after| between(before, after, t, interpolation))
}

/// Value approached from the left at `t`.
///
/// Equal to [`value_in_run`] for linear runs; for step runs it is the value
/// held just before `t`.
pub fn left_limit(instants: &[TInstant], t: Timestamp, interpolation: Interpolation) -> Option<Value> {
    match interpolation {
        Interpolation::Linear => value_in_run(instants, t, interpolation),
        Interpolation::Step => {
            let first = instants.first()?;
            if t <= first.timestamp() {
                return (t == first.timestamp()).then(|| *first.value());
            }
            let idx = instants.partition_point(|inst| inst.timestamp() < t);
            Some(*instants[idx - 1].value())
        }
    }
}

fn planar_parameter(a: &GeoPoint, b: &GeoPoint, p: &GeoPoint) -> Option<f64> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let dz = match (a.z, b.z) {
        (Some(za), Some(zb)) => zb - za,
        _ => 0.0,
    };
    let len2 = dx * dx + dy * dy + dz * dz;
    if len2 == 0.0 {
        return (a == p).then_some(0.0);
    }
    let pz = match (a.z, p.z) {
        (Some(za), Some(zp)) => zp - za,
        _ => 0.0,
    };
    let f = ((p.x - a.x) * dx + (p.y - a.y) * dy + pz * dz) / len2;
    if !(0.0..=1.0).contains(&f) {
        return None;
    }
    Some(f)
}

/// Fraction along a great-circle arc, taken as the share of its length
/// already travelled.
fn arc_parameter(engine: &dyn GeometryEngine, a: &GeoPoint, b: &GeoPoint, p: &GeoPoint) -> Option<f64> {
    let length = engine.distance(a, b);
    if length == 0.0 {
        return (a == p).then_some(0.0);
    }
    let f = engine.distance(a, p) / length;
    (0.0..=1.0).contains(&f).then_some(f)
}

/// Fraction in `[0, 1]` at which the linear segment `from -> to` takes the
/// value `target`, if it does.
pub fn locate(from: &Value, to: &Value, target: &Value) -> Option<f64> {
    if from == target {
        return Some(0.0);
    }
    if to == target {
        return Some(1.0);
    }
    match (from, to, target) {
        (Value::Float(a), Value::Float(b), Value::Float(v)) => {
            if a == b || (v - a) * (v - b) > 0.0 {
                return None;
            }
            Some(((v - a) / (b - a)).clamp(0.0, 1.0))
        }
        (Value::GeomPoint(a), Value::GeomPoint(b), Value::GeomPoint(p))
        | (Value::GeogPoint(a), Value::GeogPoint(b), Value::GeogPoint(p)) => {
            let engine = engine_for(from.kind());
            let f = match from {
                Value::GeogPoint(_) => arc_parameter(engine, a, b, p)?,
                _ => planar_parameter(a, b, p)?,
            };
            let on_path = engine.interpolate(a, b, f);
            let tolerance = LOCATE_TOLERANCE * (1.0 + engine.distance(a, b));
            (engine.distance(&on_path, p) <= tolerance).then_some(f)
        }
        (Value::NetworkPoint(a), Value::NetworkPoint(b), Value::NetworkPoint(p))
            if a.same_route(b) && a.same_route(p) =>
        {
            locate(
                &Value::Float(a.fraction),
                &Value::Float(b.fraction),
                &Value::Float(p.fraction),
            )
        }
        _ => None,
    }
}

fn float_crossing(a0: f64, a1: f64, b0: f64, b1: f64) -> Option<f64> {
    let d0 = a0 - b0;
    let d1 = a1 - b1;
    if d0 * d1 < 0.0 {
        Some(d0 / (d0 - d1))
    } else {
        None
    }
}

/// Root of the derivative of the squared distance between two moving points.
fn point_crossing(a0: &GeoPoint, a1: &GeoPoint, b0: &GeoPoint, b1: &GeoPoint) -> Option<f64> {
    let z = |p: &GeoPoint| p.z.unwrap_or(0.0);
    let p = [a0.x - b0.x, a0.y - b0.y, z(a0) - z(b0)];
    let dv = [
        (a1.x - a0.x) - (b1.x - b0.x),
        (a1.y - a0.y) - (b1.y - b0.y),
        (z(a1) - z(a0)) - (z(b1) - z(b0)),
    ];
    let dv2 = dv[0] * dv[0] + dv[1] * dv[1] + dv[2] * dv[2];
    if dv2 == 0.0 {
        return None;
    }
    let f = -(p[0] * dv[0] + p[1] * dv[1] + p[2] * dv[2]) / dv2;
    Some(f)
}

/// Closest approach of two points moving along great circles.
///
/// The distance between them is searched by golden section, which assumes a
/// single minimum over the span. That holds for segments shorter than a
/// quarter of the globe.
fn arc_crossing(a0: &GeoPoint, a1: &GeoPoint, b0: &GeoPoint, b1: &GeoPoint) -> Option<f64> {
    let engine = engine_for(ValueKind::GeogPoint);
    let gap = |f: f64| engine.distance(&engine.interpolate(a0, a1, f), &engine.interpolate(b0, b1, f));
    let ratio = (5f64.sqrt() - 1.0) / 2.0;
    let (mut low, mut high) = (0.0f64, 1.0f64);
    for _ in 0..GOLDEN_SECTION_STEPS {
        if high - low <= f64::EPSILON {
            break;
        }
        let left = high - ratio * (high - low);
        let right = low + ratio * (high - low);
        if gap(left) <= gap(right) {
            high = right;
        } else {
            low = left;
        }
    }
    let f = (low + high) / 2.0;
    let ends = gap(0.0).min(gap(1.0));
    (gap(f) + LOCATE_TOLERANCE * (1.0 + ends) < ends).then_some(f)
}

/// Fraction strictly inside `(0, 1)` at which two linear segments running
/// over the same time span cross.
///
/// Numbers and same-route network positions cross where their difference
/// changes sign. Points cross where their distance reaches its minimum:
/// planar points in closed form, geodetic points by searching the
/// great-circle distance.
pub fn crossing(a_from: &Value, a_to: &Value, b_from: &Value, b_to: &Value) -> Option<f64> {
    let fraction = match (a_from, a_to, b_from, b_to) {
        (Value::Float(a0), Value::Float(a1), Value::Float(b0), Value::Float(b1)) => {
            float_crossing(*a0, *a1, *b0, *b1)
        }
        (Value::GeomPoint(a0), Value::GeomPoint(a1), Value::GeomPoint(b0), Value::GeomPoint(b1)) => {
            point_crossing(a0, a1, b0, b1)
        }
        (Value::GeogPoint(a0), Value::GeogPoint(a1), Value::GeogPoint(b0), Value::GeogPoint(b1)) => {
            arc_crossing(a0, a1, b0, b1)
        }
        (
            Value::NetworkPoint(a0),
            Value::NetworkPoint(a1),
            Value::NetworkPoint(b0),
            Value::NetworkPoint(b1),
        ) if a0.same_route(a1) && a0.same_route(b0) && b0.same_route(b1) => {
            float_crossing(a0.fraction, a1.fraction, b0.fraction, b1.fraction)
        }
        _ => None,
    }?;
    (fraction > 0.0 && fraction < 1.0).then_some(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(v: f64, secs: i64) -> TInstant {
        TInstant::new(Value::Float(v), Timestamp::from_secs(secs)).unwrap()
    }

    #[test]
    fn test_step_and_linear_midpoint() {
        let run = [inst(0.0, 0), inst(10.0, 10)];
        let mid = Timestamp::from_secs(5);
        assert_eq!(value_in_run(&run, mid, Interpolation::Linear), Some(Value::Float(5.0)));
        assert_eq!(value_in_run(&run, mid, Interpolation::Step), Some(Value::Float(0.0)));
        assert_eq!(value_in_run(&run, Timestamp::from_secs(11), Interpolation::Linear), None);
    }

    #[test]
    fn test_exact_instants_return_stored_values() {
        let run = [inst(1.0, 0), inst(7.0, 3), inst(2.0, 9)];
        for i in &run {
            assert_eq!(
                value_in_run(&run, i.timestamp(), Interpolation::Linear),
                Some(*i.value())
            );
        }
    }

    #[test]
    fn test_left_limit_for_step() {
        let run = [inst(1.0, 0), inst(5.0, 10)];
        let t = Timestamp::from_secs(10);
        assert_eq!(left_limit(&run, t, Interpolation::Step), Some(Value::Float(1.0)));
        assert_eq!(left_limit(&run, t, Interpolation::Linear), Some(Value::Float(5.0)));
    }

    #[test]
    fn test_planar_point_blend() {
        let a = Value::GeomPoint(GeoPoint::new(0.0, 0.0));
        let b = Value::GeomPoint(GeoPoint::new(10.0, 20.0));
        assert_eq!(blend(&a, &b, 0.5), Value::GeomPoint(GeoPoint::new(5.0, 10.0)));
    }

    #[test]
    fn test_locate() {
        let a = Value::Float(0.0);
        let b = Value::Float(10.0);
        assert_eq!(locate(&a, &b, &Value::Float(2.5)), Some(0.25));
        assert_eq!(locate(&a, &b, &Value::Float(11.0)), None);

        let p = Value::GeomPoint(GeoPoint::new(0.0, 0.0));
        let q = Value::GeomPoint(GeoPoint::new(4.0, 4.0));
        assert_eq!(locate(&p, &q, &Value::GeomPoint(GeoPoint::new(1.0, 1.0))), Some(0.25));
        assert_eq!(locate(&p, &q, &Value::GeomPoint(GeoPoint::new(1.0, 2.0))), None);
    }

    #[test]
    fn test_float_crossing_is_symmetric() {
        let (a0, a1, b0, b1) = (Value::Float(0.0), Value::Float(10.0), Value::Float(10.0), Value::Float(0.0));
        assert_eq!(crossing(&a0, &a1, &b0, &b1), Some(0.5));
        assert_eq!(crossing(&b0, &b1, &a0, &a1), Some(0.5));
        // Touching at an endpoint is not a crossing.
        assert_eq!(crossing(&a0, &a1, &a0, &Value::Float(5.0)), None);
    }

    #[test]
    fn test_point_closest_approach() {
        let a0 = Value::GeomPoint(GeoPoint::new(0.0, 0.0));
        let a1 = Value::GeomPoint(GeoPoint::new(10.0, 0.0));
        let b0 = Value::GeomPoint(GeoPoint::new(0.0, 4.0));
        let b1 = Value::GeomPoint(GeoPoint::new(2.0, 4.0));
        // Relative motion is 8 units along x starting 4 units behind: closest at 0.5.
        let p = Value::GeomPoint(GeoPoint::new(-4.0, 0.0));
        let q = Value::GeomPoint(GeoPoint::new(4.0, 0.0));
        let origin = Value::GeomPoint(GeoPoint::new(0.0, 0.0));
        assert_eq!(crossing(&p, &q, &origin, &origin), Some(0.5));
        assert!(crossing(&a0, &a1, &b0, &b1).is_none());
    }

    #[test]
    fn test_locate_on_great_circle() {
        let a = Value::GeogPoint(GeoPoint::new(-74.0, 40.7));
        let b = Value::GeogPoint(GeoPoint::new(2.35, 48.85));
        for fraction in [0.1, 0.5, 0.9] {
            let on_arc = blend(&a, &b, fraction);
            let found = locate(&a, &b, &on_arc).unwrap();
            assert!((found - fraction).abs() < 1e-9, "{} vs {}", found, fraction);
        }
        // The planar midpoint is far off the great circle.
        let chord = Value::GeogPoint(GeoPoint::new(-35.825, 44.775));
        assert_eq!(locate(&a, &b, &chord), None);
    }

    #[test]
    fn test_geodetic_closest_approach() {
        // Two travellers pass each other along the equator.
        let a0 = Value::GeogPoint(GeoPoint::new(0.0, 0.0));
        let a1 = Value::GeogPoint(GeoPoint::new(10.0, 0.0));
        let b0 = Value::GeogPoint(GeoPoint::new(10.0, 0.0));
        let b1 = Value::GeogPoint(GeoPoint::new(0.0, 0.0));
        let f = crossing(&a0, &a1, &b0, &b1).unwrap();
        assert!((f - 0.5).abs() < 1e-6);
        let swapped = crossing(&b0, &b1, &a0, &a1).unwrap();
        assert!((swapped - f).abs() < 1e-9);

        // Parallel motion keeps the gap from shrinking inside the span.
        let c0 = Value::GeogPoint(GeoPoint::new(0.0, 1.0));
        let c1 = Value::GeogPoint(GeoPoint::new(10.0, 1.0));
        let d0 = Value::GeogPoint(GeoPoint::new(0.0, 5.0));
        let d1 = Value::GeogPoint(GeoPoint::new(10.0, 20.0));
        assert!(crossing(&c0, &c1, &d0, &d1).is_none());
    }
}
