use crate::compute::bbox::instant_box;
use crate::compute::validation::validate_value;
use crate::error::{MobilityError, Result};
use mobility_types::bbox::BoundingBox;
use mobility_types::time::{Period, Timestamp};
use mobility_types::value::Value;

/// A single value at a single timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TInstant {
    value: Value,
    t: Timestamp,
    bbox: BoundingBox,
}

impl TInstant {
    /// Validate `value` and build the instant.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobility::{TInstant, Timestamp, Value};
    ///
    /// let reading = TInstant::new(Value::Float(21.5), Timestamp::from_secs(60)).unwrap();
    /// assert_eq!(reading.value(), &Value::Float(21.5));
    /// assert!(TInstant::new(Value::Float(f64::NAN), Timestamp::from_secs(0)).is_err());
    /// ```
    pub fn new(value: Value, t: Timestamp) -> Result<Self> {
        validate_value(&value)?;
        if !t.is_representable() {
            return Err(MobilityError::InvalidInput(format!(
                "timestamp {}us is outside the supported calendar range",
                t.as_micros()
            )));
        }
        let bbox = instant_box(&value, t)?;
        Ok(Self { value, t, bbox })
    }

    /// Instant derived from already validated values.
    ///
    /// Only the box is computed, which fails for a network position whose
    /// route is no longer registered.
    pub(crate) fn derived(value: Value, t: Timestamp) -> Result<Self> {
        let bbox = instant_box(&value, t)?;
        Ok(Self { value, t, bbox })
    }

    /// Same value and box, moved to `t`.
    pub(crate) fn retimed(&self, t: Timestamp) -> Self {
        Self {
            value: self.value,
            t,
            bbox: self.bbox.with_t(t, t),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn timestamp(&self) -> Timestamp {
        self.t
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn period(&self) -> Period {
        Period::instant(self.t)
    }

    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        (t == self.t).then_some(self.value)
    }

    pub fn at_period(&self, period: &Period) -> Option<TInstant> {
        period.contains(self.t).then(|| self.clone())
    }

    pub fn minus_period(&self, period: &Period) -> Option<TInstant> {
        (!period.contains(self.t)).then(|| self.clone())
    }

    pub(crate) fn with_value(&self, value: Value) -> Result<TInstant> {
        TInstant::new(value, self.t)
    }
}
