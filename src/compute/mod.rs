//! Algorithms shared by every temporal shape.
//!
//! - `bbox`: bounding volumes of values, segments and instant runs
//! - `interpolate`: value reconstruction and crossing detection
//! - `sync`: alignment of two temporal values on one timeline
//! - `validation`: checks run by the validating constructors

pub mod bbox;
pub mod interpolate;
pub mod sync;
pub mod validation;
