use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A 2D or 3D point tagged with its spatial reference identifier.
///
/// Whether the coordinates are planar or geodetic (longitude/latitude) is
/// decided by the value kind that carries the point, not by the point itself.
///
/// # Examples
///
/// ```
/// use mobility_types::point::GeoPoint;
///
/// let drone = GeoPoint::new_3d(-74.0060, 40.7128, 100.0).with_srid(4326);
/// assert_eq!(drone.z(), Some(100.0));
/// assert!(drone.has_z());
///
/// let other = GeoPoint::new_3d(-74.0070, 40.7138, 150.0).with_srid(4326);
/// let distance = drone.haversine_3d(&other);
/// assert!(distance > 50.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub srid: i32,
}

impl GeoPoint {
    /// Create a 2D point with SRID 0.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            srid: 0,
        }
    }

    /// Create a 3D point with SRID 0.
    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            srid: 0,
        }
    }

    pub fn with_srid(mut self, srid: i32) -> Self {
        self.srid = srid;
        self
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> Option<f64> {
        self.z
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    pub fn srid(&self) -> i32 {
        self.srid
    }

    /// True when every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_none_or(f64::is_finite)
    }

    /// Project to a `geo::Point`, discarding z.
    pub fn to_geo(&self) -> geo::Point<f64> {
        geo::Point::new(self.x, self.y)
    }

    /// Build from a `geo::Point` with an explicit z and SRID.
    pub fn from_geo(point: geo::Point<f64>, z: Option<f64>, srid: i32) -> Self {
        Self {
            x: point.x(),
            y: point.y(),
            z,
            srid,
        }
    }

    /// Straight-line distance, including z when both points carry it.
    pub fn euclidean_distance(&self, other: &GeoPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = match (self.z, other.z) {
            (Some(a), Some(b)) => a - b,
            _ => 0.0,
        };
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Great-circle distance on the 2D plane (ignoring altitude), in meters.
    #[inline]
    pub fn haversine_2d(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.y.to_radians();
        let lat2 = other.y.to_radians();
        let delta_lat = (other.y - self.y).to_radians();
        let delta_lon = (other.x - self.x).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }

    /// Haversine distance combined with the altitude difference.
    #[inline]
    pub fn haversine_3d(&self, other: &GeoPoint) -> f64 {
        let horizontal = self.haversine_2d(other);
        let vertical = match (self.z, other.z) {
            (Some(a), Some(b)) => (a - b).abs(),
            _ => 0.0,
        };
        (horizontal * horizontal + vertical * vertical).sqrt()
    }
}
