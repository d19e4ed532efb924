//! # mobility-types
//!
//! Core value, time and bounding box types for the `mobility` crate.
//!
//! - **Time**: `Timestamp` (microseconds since the epoch), `Period`
//! - **Domain values**: `GeoPoint`, `NetworkPosition`, and the `Value` enum
//!   tying them to a `ValueKind`
//! - **Bounding boxes**: `BoundingBox` over the x, y, z, m and t axes
//!
//! All types are serializable with Serde; points convert to and from the
//! `geo` crate's primitives.
//!
//! ## Examples
//!
//! ```rust
//! use mobility_types::bbox::BoundingBox;
//! use mobility_types::point::GeoPoint;
//!
//! let depot = GeoPoint::new(-74.0060, 40.7128).with_srid(4326);
//! let manhattan = BoundingBox::new().with_xy(-74.0479, 40.6829, -73.9067, 40.8820);
//! assert!(manhattan.contains(&BoundingBox::from_point(&depot, true)));
//! ```

pub mod bbox;
pub mod network;
pub mod point;
pub mod time;
pub mod value;
