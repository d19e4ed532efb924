//! Temporal values over numbers, points and network positions, with step and
//! linear interpolation, synchronization, bounding volumes and a box octree.
//!
//! ```rust
//! use mobility::index::Relation;
//! use mobility::{BoundingBox, Temporal, Timestamp, Value, ValueKind};
//!
//! let trip = Temporal::parse(
//!     "[POINT(0 0)@2024-01-01T00:00:00Z, POINT(10 0)@2024-01-01T00:01:00Z)",
//!     ValueKind::GeomPoint,
//! )?;
//! let midway = trip.value_at("2024-01-01T00:00:30Z".parse::<Timestamp>().unwrap());
//! assert_eq!(midway.and_then(|v| v.as_point().map(|p| p.x)), Some(5.0));
//!
//! let east = BoundingBox::new().with_x(20.0, 30.0);
//! assert!(Relation::Left.holds(trip.bbox(), &east));
//! # Ok::<(), mobility::MobilityError>(())
//! ```

pub mod builder;
pub mod catalog;
pub mod codec;
pub mod compute;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod network;
pub mod stats;
pub mod temporal;

pub use builder::IndexBuilder;
pub use catalog::{Catalog, TypeEntry};
pub use config::{Config, IndexConfig, SyncConfig};
pub use engine::{GeodeticEngine, GeometryEngine, PlanarEngine, engine_for};
pub use error::{MobilityError, Result};
pub use index::{BoxOctree, IndexStats, Match, Predicate, Relation};
pub use network::{InMemoryNetwork, NetworkTopology};
pub use stats::TemporalStats;
pub use temporal::{
    DurationKind, Interpolation, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal,
};

pub use mobility_types::bbox::{Axis, AxisSet, BoundingBox};
pub use mobility_types::network::NetworkPosition;
pub use mobility_types::point::GeoPoint;
pub use mobility_types::time::{Period, Timestamp};
pub use mobility_types::value::{Frame, Value, ValueKind};

pub use compute::sync::{Synchronized, synchronize, synchronize_with};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{MobilityError, Result};

    pub use crate::{
        DurationKind, Interpolation, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal,
    };

    pub use crate::{BoundingBox, GeoPoint, NetworkPosition, Period, Timestamp, Value, ValueKind};

    pub use crate::{BoxOctree, IndexBuilder, Predicate, Relation};

    pub use crate::{Catalog, Config, synchronize};
}
