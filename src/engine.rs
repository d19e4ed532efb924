//! Geometry engine: blending, distances, extents and the opaque point codec.
//!
//! Two engines exist, chosen by value kind: planar coordinates use straight
//! lines, geodetic (longitude/latitude) coordinates follow great circles.

use crate::error::{MobilityError, Result};
use geo::{Distance, Euclidean, Haversine, InterpolatePoint};
use mobility_types::bbox::BoundingBox;
use mobility_types::point::GeoPoint;
use mobility_types::value::ValueKind;

/// Operations the temporal core needs from a geometry implementation.
pub trait GeometryEngine: Send + Sync {
    /// Point at `fraction` of the way from `from` to `to`.
    fn interpolate(&self, from: &GeoPoint, to: &GeoPoint, fraction: f64) -> GeoPoint;

    /// Distance between two points (coordinate units for planar, meters for geodetic).
    fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64;

    /// Box of a single point.
    fn bounding_box(&self, point: &GeoPoint) -> BoundingBox;

    /// Box of every point `interpolate` can return for this pair.
    fn segment_box(&self, from: &GeoPoint, to: &GeoPoint) -> BoundingBox;

    fn serialize(&self, point: &GeoPoint) -> Result<Vec<u8>> {
        Ok(bincode::serialize(point)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<GeoPoint> {
        let point: GeoPoint = bincode::deserialize(bytes)?;
        if !point.is_finite() {
            return Err(MobilityError::MalformedWire(
                "point blob holds non-finite coordinates".to_string(),
            ));
        }
        Ok(point)
    }
}

fn lerp(a: f64, b: f64, fraction: f64) -> f64 {
    a + (b - a) * fraction
}

fn lerp_z(from: &GeoPoint, to: &GeoPoint, fraction: f64) -> Option<f64> {
    match (from.z, to.z) {
        (Some(a), Some(b)) => Some(lerp(a, b, fraction)),
        _ => None,
    }
}

fn endpoint_box(from: &GeoPoint, to: &GeoPoint, geodetic: bool) -> BoundingBox {
    let mut bbox = BoundingBox::from_point(from, geodetic);
    bbox.expand(&BoundingBox::from_point(to, geodetic));
    bbox
}

/// Straight-line engine for projected coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarEngine;

impl GeometryEngine for PlanarEngine {
    fn interpolate(&self, from: &GeoPoint, to: &GeoPoint, fraction: f64) -> GeoPoint {
        GeoPoint {
            x: lerp(from.x, to.x, fraction),
            y: lerp(from.y, to.y, fraction),
            z: lerp_z(from, to, fraction),
            srid: from.srid,
        }
    }

    fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        match (a.z, b.z) {
            (Some(_), Some(_)) => a.euclidean_distance(b),
            _ => Euclidean.distance(a.to_geo(), b.to_geo()),
        }
    }

    fn bounding_box(&self, point: &GeoPoint) -> BoundingBox {
        BoundingBox::from_point(point, false)
    }

    fn segment_box(&self, from: &GeoPoint, to: &GeoPoint) -> BoundingBox {
        endpoint_box(from, to, false)
    }
}

/// Great-circle engine for longitude/latitude coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeodeticEngine;

impl GeometryEngine for GeodeticEngine {
    fn interpolate(&self, from: &GeoPoint, to: &GeoPoint, fraction: f64) -> GeoPoint {
        if fraction <= 0.0 {
            return *from;
        }
        if fraction >= 1.0 {
            return *to;
        }
        let point = Haversine.point_at_ratio_between(from.to_geo(), to.to_geo(), fraction);
        GeoPoint::from_geo(point, lerp_z(from, to, fraction), from.srid)
    }

    fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        match (a.z, b.z) {
            (Some(_), Some(_)) => a.haversine_3d(b),
            _ => Haversine.distance(a.to_geo(), b.to_geo()),
        }
    }

    fn bounding_box(&self, point: &GeoPoint) -> BoundingBox {
        BoundingBox::from_point(point, true)
    }

    fn segment_box(&self, from: &GeoPoint, to: &GeoPoint) -> BoundingBox {
        let mut bbox = endpoint_box(from, to, true);
        if (to.x - from.x).abs() > 180.0 {
            // The arc crosses the antimeridian.
            bbox.xmin = -180.0;
            bbox.xmax = 180.0;
        }
        let (lat_min, lat_max) = great_circle_latitudes(from, to);
        bbox.ymin = bbox.ymin.min(lat_min);
        bbox.ymax = bbox.ymax.max(lat_max);
        bbox
    }
}

type Vec3 = [f64; 3];

fn to_unit_vector(point: &GeoPoint) -> Vec3 {
    let (lon, lat) = (point.x.to_radians(), point.y.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Latitude range of the minor great-circle arc between two points, in degrees.
///
/// The arc bulges poleward of its endpoints when the great circle's vertex
/// lies between them.
fn great_circle_latitudes(from: &GeoPoint, to: &GeoPoint) -> (f64, f64) {
    let mut lat_min = from.y.min(to.y);
    let mut lat_max = from.y.max(to.y);

    let a = to_unit_vector(from);
    let b = to_unit_vector(to);
    let n = cross(a, b);
    let n_len = dot(n, n).sqrt();
    if n_len < 1e-12 {
        return (lat_min, lat_max);
    }
    let n_hat = [n[0] / n_len, n[1] / n_len, n[2] / n_len];

    // Northernmost point of the full great circle.
    let pole = [0.0, 0.0, 1.0];
    let k = dot(pole, n_hat);
    let v = [-k * n_hat[0], -k * n_hat[1], 1.0 - k * n_hat[2]];
    let v_len = dot(v, v).sqrt();
    if v_len < 1e-12 {
        return (lat_min, lat_max);
    }
    let north = [v[0] / v_len, v[1] / v_len, v[2] / v_len];
    let south = [-north[0], -north[1], -north[2]];

    let on_arc = |p: Vec3| dot(cross(a, p), n) >= 0.0 && dot(cross(p, b), n) >= 0.0;
    if on_arc(north) {
        lat_max = lat_max.max(north[2].clamp(-1.0, 1.0).asin().to_degrees());
    }
    if on_arc(south) {
        lat_min = lat_min.min(south[2].clamp(-1.0, 1.0).asin().to_degrees());
    }
    (lat_min, lat_max)
}

static PLANAR: PlanarEngine = PlanarEngine;
static GEODETIC: GeodeticEngine = GeodeticEngine;

/// Engine responsible for points of the given kind.
pub fn engine_for(kind: ValueKind) -> &'static dyn GeometryEngine {
    match kind {
        ValueKind::GeogPoint => &GEODETIC,
        ValueKind::Float | ValueKind::GeomPoint | ValueKind::NetworkPoint => &PLANAR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobility_types::bbox::Axis;

    #[test]
    fn test_planar_midpoint() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(10.0, 0.0);
        assert_eq!(PlanarEngine.interpolate(&a, &b, 0.5), GeoPoint::new(5.0, 0.0));
        assert_eq!(PlanarEngine.distance(&a, &b), 10.0);
    }

    #[test]
    fn test_planar_3d_interpolation() {
        let a = GeoPoint::new_3d(0.0, 0.0, 0.0).with_srid(3857);
        let b = GeoPoint::new_3d(4.0, 8.0, 100.0).with_srid(3857);
        let mid = PlanarEngine.interpolate(&a, &b, 0.25);
        assert_eq!(mid, GeoPoint::new_3d(1.0, 2.0, 25.0).with_srid(3857));
    }

    #[test]
    fn test_geodetic_endpoints_are_exact() {
        let a = GeoPoint::new(-74.0, 40.7).with_srid(4326);
        let b = GeoPoint::new(2.35, 48.85).with_srid(4326);
        assert_eq!(GeodeticEngine.interpolate(&a, &b, 0.0), a);
        assert_eq!(GeodeticEngine.interpolate(&a, &b, 1.0), b);
    }

    #[test]
    fn test_geodetic_segment_box_covers_arc() {
        // New York to Paris bulges north of both endpoints.
        let a = GeoPoint::new(-74.0, 40.7).with_srid(4326);
        let b = GeoPoint::new(2.35, 48.85).with_srid(4326);
        let bbox = GeodeticEngine.segment_box(&a, &b);
        assert!(bbox.ymax > 48.85);
        assert!(bbox.geodetic);

        for step in 1..20 {
            let p = GeodeticEngine.interpolate(&a, &b, step as f64 / 20.0);
            let (ymin, ymax) = bbox.range(Axis::Y).unwrap();
            assert!(p.y >= ymin - 1e-9 && p.y <= ymax + 1e-9);
        }
    }

    #[test]
    fn test_equator_arc_has_no_bulge() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(10.0, 0.0);
        let bbox = GeodeticEngine.segment_box(&a, &b);
        assert!(bbox.ymax.abs() < 1e-9);
        assert!(bbox.ymin.abs() < 1e-9);
    }

    #[test]
    fn test_codec_round_trip() {
        let p = GeoPoint::new_3d(1.5, -2.25, 7.0).with_srid(4326);
        let blob = PlanarEngine.serialize(&p).unwrap();
        assert_eq!(PlanarEngine.deserialize(&blob).unwrap(), p);
        assert!(PlanarEngine.deserialize(&blob[..3]).is_err());
    }
}
