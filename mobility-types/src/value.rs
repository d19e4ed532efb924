use crate::network::NetworkPosition;
use crate::point::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The domain a temporal value ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Float,
    GeomPoint,
    GeogPoint,
    NetworkPoint,
}

impl ValueKind {
    pub const ALL: [ValueKind; 4] = [
        ValueKind::Float,
        ValueKind::GeomPoint,
        ValueKind::GeogPoint,
        ValueKind::NetworkPoint,
    ];

    /// Tag used by the binary wire format.
    pub fn tag(self) -> u8 {
        match self {
            ValueKind::Float => 1,
            ValueKind::GeomPoint => 2,
            ValueKind::GeogPoint => 3,
            ValueKind::NetworkPoint => 4,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(ValueKind::Float),
            2 => Some(ValueKind::GeomPoint),
            3 => Some(ValueKind::GeogPoint),
            4 => Some(ValueKind::NetworkPoint),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Float => "tfloat",
            ValueKind::GeomPoint => "tgeompoint",
            ValueKind::GeogPoint => "tgeogpoint",
            ValueKind::NetworkPoint => "tnpoint",
        }
    }

    /// Kinds whose values have a spatial extent.
    pub fn is_spatial(self) -> bool {
        !matches!(self, ValueKind::Float)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference frame shared by every value of one temporal container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    pub kind: ValueKind,
    pub srid: i32,
    pub has_z: bool,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (srid {}, {})",
            self.kind,
            self.srid,
            if self.has_z { "3D" } else { "2D" }
        )
    }
}

/// A single domain value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Float(f64),
    GeomPoint(GeoPoint),
    GeogPoint(GeoPoint),
    NetworkPoint(NetworkPosition),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::GeomPoint(_) => ValueKind::GeomPoint,
            Value::GeogPoint(_) => ValueKind::GeogPoint,
            Value::NetworkPoint(_) => ValueKind::NetworkPoint,
        }
    }

    pub fn frame(&self) -> Frame {
        match self {
            Value::Float(_) | Value::NetworkPoint(_) => Frame {
                kind: self.kind(),
                srid: 0,
                has_z: false,
            },
            Value::GeomPoint(p) | Value::GeogPoint(p) => Frame {
                kind: self.kind(),
                srid: p.srid,
                has_z: p.has_z(),
            },
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<&GeoPoint> {
        match self {
            Value::GeomPoint(p) | Value::GeogPoint(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_network(&self) -> Option<&NetworkPosition> {
        match self {
            Value::NetworkPoint(np) => Some(np),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<NetworkPosition> for Value {
    fn from(np: NetworkPosition) -> Self {
        Value::NetworkPoint(np)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_round_trip() {
        for kind in ValueKind::ALL {
            assert_eq!(ValueKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ValueKind::from_tag(0), None);
    }

    #[test]
    fn test_frame_of_points() {
        let v = Value::GeomPoint(GeoPoint::new_3d(1.0, 2.0, 3.0).with_srid(3857));
        let frame = v.frame();
        assert_eq!(frame.kind, ValueKind::GeomPoint);
        assert_eq!(frame.srid, 3857);
        assert!(frame.has_z);
        assert_ne!(frame, Value::GeomPoint(GeoPoint::new(1.0, 2.0)).frame());
    }
}
