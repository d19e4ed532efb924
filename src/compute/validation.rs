//! Validation of domain values, instant sequences and periods.

use crate::catalog::Catalog;
use crate::error::{MobilityError, Result};
use crate::temporal::TInstant;
use mobility_types::time::Period;
use mobility_types::value::{Frame, Value};

/// Validates a single domain value.
///
/// Numbers and coordinates must be finite; network fractions must lie in
/// `[0, 1]` and refer to a route the registered network knows.
///
/// # Examples
///
/// ```
/// use mobility::compute::validation::validate_value;
/// use mobility::{GeoPoint, NetworkPosition, Value};
///
/// assert!(validate_value(&Value::Float(1.5)).is_ok());
/// assert!(validate_value(&Value::Float(f64::NAN)).is_err());
/// assert!(validate_value(&Value::GeomPoint(GeoPoint::new(f64::INFINITY, 0.0))).is_err());
///
/// // Fraction outside [0, 1]
/// let off_route = Value::NetworkPoint(NetworkPosition::new(1, 1.5));
/// assert!(validate_value(&off_route).is_err());
/// ```
pub fn validate_value(value: &Value) -> Result<()> {
    match value {
        Value::Float(v) => {
            if !v.is_finite() {
                return Err(MobilityError::InvalidInput(format!(
                    "Number must be finite, got: {}",
                    v
                )));
            }
        }
        Value::GeomPoint(p) | Value::GeogPoint(p) => {
            if !p.is_finite() {
                return Err(MobilityError::InvalidInput(format!(
                    "Coordinates must be finite, got: ({}, {}, {:?})",
                    p.x, p.y, p.z
                )));
            }
            if matches!(value, Value::GeogPoint(_))
                && (!(-180.0..=180.0).contains(&p.x) || !(-90.0..=90.0).contains(&p.y))
            {
                return Err(MobilityError::InvalidInput(format!(
                    "Geodetic coordinates out of range: ({}, {})",
                    p.x, p.y
                )));
            }
        }
        Value::NetworkPoint(np) => {
            if !(0.0..=1.0).contains(&np.fraction) {
                return Err(MobilityError::InvalidBounds(format!(
                    "Network fraction must be within [0, 1], got: {}",
                    np.fraction
                )));
            }
            let network = Catalog::global()
                .network()
                .ok_or(MobilityError::UnknownRoute(np.route))?;
            if network.route_geometry(np.route).is_none() {
                return Err(MobilityError::UnknownRoute(np.route));
            }
        }
    }
    Ok(())
}

/// Fails with `DimensionalityMismatch` unless both frames are identical.
pub fn validate_frame(expected: Frame, found: Frame) -> Result<()> {
    if expected != found {
        return Err(MobilityError::DimensionalityMismatch { expected, found });
    }
    Ok(())
}

/// Binary operations compare frames only when both sides are spatial.
pub fn validate_binary_frames(left: Frame, right: Frame) -> Result<()> {
    if left.kind.is_spatial() && right.kind.is_spatial() {
        validate_frame(left, right)?;
    }
    Ok(())
}

/// Validates an instant run: non-empty, one frame, strictly increasing.
pub fn validate_instants(instants: &[TInstant]) -> Result<()> {
    let first = instants
        .first()
        .ok_or_else(|| MobilityError::InvalidInput("At least one instant is required".into()))?;
    let frame = first.value().frame();
    for pair in instants.windows(2) {
        validate_frame(frame, pair[1].value().frame())?;
        if pair[1].timestamp() <= pair[0].timestamp() {
            return Err(MobilityError::NonIncreasingTimestamps {
                previous: pair[0].timestamp(),
                next: pair[1].timestamp(),
            });
        }
    }
    Ok(())
}

/// Validates that a period contains at least one timestamp.
pub fn validate_period(period: &Period) -> Result<()> {
    if period.lower > period.upper {
        return Err(MobilityError::InvalidBounds(format!(
            "Lower bound {} is after upper bound {}",
            period.lower, period.upper
        )));
    }
    if !period.is_valid() {
        return Err(MobilityError::InvalidBounds(format!(
            "Instant period {} must include both bounds",
            period
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobility_types::point::GeoPoint;
    use mobility_types::time::Timestamp;

    fn inst(v: f64, secs: i64) -> TInstant {
        TInstant::new(Value::Float(v), Timestamp::from_secs(secs)).unwrap()
    }

    #[test]
    fn test_valid_values() {
        assert!(validate_value(&Value::Float(0.0)).is_ok());
        assert!(validate_value(&Value::GeomPoint(GeoPoint::new(1e9, -1e9))).is_ok());
        assert!(validate_value(&Value::GeogPoint(GeoPoint::new(180.0, -90.0))).is_ok());
    }

    #[test]
    fn test_geodetic_range() {
        let err = validate_value(&Value::GeogPoint(GeoPoint::new(200.0, 0.0))).unwrap_err();
        assert!(matches!(err, MobilityError::InvalidInput(_)));
    }

    #[test]
    fn test_increasing_instants() {
        assert!(validate_instants(&[inst(1.0, 0), inst(2.0, 1)]).is_ok());

        let err = validate_instants(&[inst(1.0, 1), inst(2.0, 1)]).unwrap_err();
        assert!(matches!(err, MobilityError::NonIncreasingTimestamps { .. }));

        let err = validate_instants(&[inst(1.0, 2), inst(2.0, 1)]).unwrap_err();
        assert!(matches!(err, MobilityError::NonIncreasingTimestamps { .. }));

        assert!(validate_instants(&[]).is_err());
    }

    #[test]
    fn test_mixed_frames_rejected() {
        let planar = TInstant::new(
            Value::GeomPoint(GeoPoint::new(0.0, 0.0)),
            Timestamp::from_secs(0),
        )
        .unwrap();
        let projected = TInstant::new(
            Value::GeomPoint(GeoPoint::new(0.0, 0.0).with_srid(3857)),
            Timestamp::from_secs(1),
        )
        .unwrap();
        let err = validate_instants(&[planar, projected]).unwrap_err();
        assert!(err.is_dimensionality_mismatch());
    }

    #[test]
    fn test_period_validation() {
        let t0 = Timestamp::from_secs(0);
        let t1 = Timestamp::from_secs(1);
        assert!(validate_period(&Period::closed(t0, t1)).is_ok());
        assert!(validate_period(&Period::closed(t1, t0)).is_err());
        assert!(validate_period(&Period::new(t0, t0, true, false)).is_err());
        assert!(validate_period(&Period::instant(t0)).is_ok());
    }
}
