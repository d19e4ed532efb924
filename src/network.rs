//! Network topology: route lengths and geometries for network positions.

use crate::error::{MobilityError, Result};
use geo::{BoundingRect, Coord, Distance, Euclidean, LineString, Point};
use mobility_types::bbox::BoundingBox;
use rustc_hash::FxHashMap;

/// Route lookup consumed by the network-position domain.
pub trait NetworkTopology: Send + Sync {
    fn route_length(&self, route: u64) -> Option<f64>;

    fn route_geometry(&self, route: u64) -> Option<LineString<f64>>;

    /// Spatial reference of every route geometry.
    fn srid(&self) -> i32 {
        0
    }
}

/// Route table held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNetwork {
    routes: FxHashMap<u64, LineString<f64>>,
    srid: i32,
}

impl InMemoryNetwork {
    pub fn new(srid: i32) -> Self {
        Self {
            routes: FxHashMap::default(),
            srid,
        }
    }

    /// Add or replace a route. Routes need at least two vertices and a
    /// positive length.
    pub fn insert_route(&mut self, route: u64, geometry: LineString<f64>) -> Result<()> {
        if geometry.0.len() < 2 || line_length(&geometry) <= 0.0 {
            return Err(MobilityError::InvalidInput(format!(
                "route {} must have at least two distinct vertices",
                route
            )));
        }
        if geometry.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(MobilityError::InvalidInput(format!(
                "route {} has non-finite coordinates",
                route
            )));
        }
        self.routes.insert(route, geometry);
        Ok(())
    }

    pub fn with_route(mut self, route: u64, geometry: LineString<f64>) -> Result<Self> {
        self.insert_route(route, geometry)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl NetworkTopology for InMemoryNetwork {
    fn route_length(&self, route: u64) -> Option<f64> {
        self.routes.get(&route).map(line_length)
    }

    fn route_geometry(&self, route: u64) -> Option<LineString<f64>> {
        self.routes.get(&route).cloned()
    }

    fn srid(&self) -> i32 {
        self.srid
    }
}

fn segment_lengths(line: &LineString<f64>) -> Vec<f64> {
    line.lines()
        .map(|segment| Euclidean.distance(segment.start_point(), segment.end_point()))
        .collect()
}

pub(crate) fn line_length(line: &LineString<f64>) -> f64 {
    segment_lengths(line).iter().sum()
}

/// Route vertices with their fraction along the route.
pub(crate) fn vertex_fractions(line: &LineString<f64>) -> Vec<(f64, Coord<f64>)> {
    let lengths = segment_lengths(line);
    let total: f64 = lengths.iter().sum();
    let mut walked = 0.0;
    let mut out = Vec::with_capacity(line.0.len());
    for (i, coord) in line.coords().enumerate() {
        let fraction = if i == 0 {
            0.0
        } else if i == line.0.len() - 1 {
            1.0
        } else {
            walked / total
        };
        out.push((fraction, *coord));
        if let Some(len) = lengths.get(i) {
            walked += len;
        }
    }
    out
}

/// Point located at `fraction` of the route length.
pub(crate) fn point_at_fraction(line: &LineString<f64>, fraction: f64) -> Option<Point<f64>> {
    let vertices = vertex_fractions(line);
    let first = vertices.first()?;
    if fraction <= 0.0 {
        return Some(Point::from(first.1));
    }
    for pair in vertices.windows(2) {
        let ((f0, c0), (f1, c1)) = (pair[0], pair[1]);
        if fraction <= f1 {
            let local = if f1 > f0 { (fraction - f0) / (f1 - f0) } else { 0.0 };
            return Some(Point::new(
                c0.x + (c1.x - c0.x) * local,
                c0.y + (c1.y - c0.y) * local,
            ));
        }
    }
    vertices.last().map(|(_, c)| Point::from(*c))
}

/// Spatial box of the part of the route between two fractions.
pub(crate) fn sub_route_box(
    line: &LineString<f64>,
    from: f64,
    to: f64,
    srid: i32,
) -> Option<BoundingBox> {
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    if lo <= 0.0 && hi >= 1.0 {
        let rect = line.bounding_rect()?;
        return Some(
            BoundingBox::new()
                .with_xy(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
                .with_srid(srid),
        );
    }
    let start = point_at_fraction(line, lo)?;
    let end = point_at_fraction(line, hi)?;
    let mut bbox = BoundingBox::new()
        .with_xy(
            start.x().min(end.x()),
            start.y().min(end.y()),
            start.x().max(end.x()),
            start.y().max(end.y()),
        )
        .with_srid(srid);
    for (fraction, coord) in vertex_fractions(line) {
        if fraction > lo && fraction < hi {
            bbox.xmin = bbox.xmin.min(coord.x);
            bbox.xmax = bbox.xmax.max(coord.x);
            bbox.ymin = bbox.ymin.min(coord.y);
            bbox.ymax = bbox.ymax.max(coord.y);
        }
    }
    Some(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;
    use mobility_types::bbox::Axis;

    fn l_shaped() -> LineString<f64> {
        line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0)]
    }

    #[test]
    fn test_route_length_and_lookup() {
        let network = InMemoryNetwork::new(3857).with_route(1, l_shaped()).unwrap();
        assert_eq!(network.route_length(1), Some(20.0));
        assert!(network.route_geometry(2).is_none());
        assert_eq!(network.srid(), 3857);
    }

    #[test]
    fn test_degenerate_route_rejected() {
        let mut network = InMemoryNetwork::new(0);
        let single = line_string![(x: 1.0, y: 1.0), (x: 1.0, y: 1.0)];
        assert!(network.insert_route(7, single).is_err());
        assert!(network.is_empty());
    }

    #[test]
    fn test_point_at_fraction() {
        let line = l_shaped();
        assert_eq!(point_at_fraction(&line, 0.0), Some(Point::new(0.0, 0.0)));
        assert_eq!(point_at_fraction(&line, 0.25), Some(Point::new(5.0, 0.0)));
        assert_eq!(point_at_fraction(&line, 0.75), Some(Point::new(10.0, 5.0)));
        assert_eq!(point_at_fraction(&line, 1.0), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_sub_route_box_includes_corner() {
        let line = l_shaped();
        let bbox = sub_route_box(&line, 0.25, 0.75, 0).unwrap();
        assert_eq!(bbox.range(Axis::X), Some((5.0, 10.0)));
        assert_eq!(bbox.range(Axis::Y), Some((0.0, 5.0)));

        let whole = sub_route_box(&line, 0.0, 1.0, 0).unwrap();
        assert_eq!(whole.range(Axis::Y), Some((0.0, 10.0)));
    }
}
