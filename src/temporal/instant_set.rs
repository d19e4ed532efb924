use super::TInstant;
use crate::compute::bbox::instants_box;
use crate::compute::validation::validate_instants;
use crate::error::{MobilityError, Result};
use mobility_types::bbox::BoundingBox;
use mobility_types::time::{Period, Timestamp};
use mobility_types::value::Value;

/// Instants at strictly increasing timestamps with no value in between.
#[derive(Debug, Clone, PartialEq)]
pub struct TInstantSet {
    instants: Vec<TInstant>,
    bbox: BoundingBox,
}

impl TInstantSet {
    pub fn new(instants: Vec<TInstant>) -> Result<Self> {
        validate_instants(&instants)?;
        Self::from_valid(instants)
            .ok_or_else(|| MobilityError::InvalidInput("At least one instant is required".into()))
    }

    /// Build from instants already known to be ordered and consistent.
    pub(crate) fn from_valid(instants: Vec<TInstant>) -> Option<Self> {
        let bbox = instants_box(&instants)?;
        Some(Self { instants, bbox })
    }

    pub fn instants(&self) -> &[TInstant] {
        &self.instants
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Span from the first to the last instant.
    pub fn period(&self) -> Period {
        Period::closed(self.first().timestamp(), self.last().timestamp())
    }

    pub fn first(&self) -> &TInstant {
        &self.instants[0]
    }

    pub fn last(&self) -> &TInstant {
        &self.instants[self.instants.len() - 1]
    }

    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        self.instants
            .binary_search_by_key(&t, TInstant::timestamp)
            .ok()
            .map(|idx| *self.instants[idx].value())
    }

    pub fn at_period(&self, period: &Period) -> Option<TInstantSet> {
        let kept: Vec<TInstant> = self
            .instants
            .iter()
            .filter(|inst| period.contains(inst.timestamp()))
            .cloned()
            .collect();
        Self::from_valid(kept)
    }

    pub fn minus_period(&self, period: &Period) -> Option<TInstantSet> {
        let kept: Vec<TInstant> = self
            .instants
            .iter()
            .filter(|inst| !period.contains(inst.timestamp()))
            .cloned()
            .collect();
        Self::from_valid(kept)
    }

    pub fn at_value(&self, value: &Value) -> Option<TInstantSet> {
        let kept: Vec<TInstant> = self
            .instants
            .iter()
            .filter(|inst| inst.value() == value)
            .cloned()
            .collect();
        Self::from_valid(kept)
    }

    /// Add an instant after the last one.
    ///
    /// Nothing changes when validation fails.
    pub fn append(&mut self, instant: TInstant) -> Result<()> {
        validate_instants(&[self.last().clone(), instant.clone()])?;
        self.bbox.expand(instant.bbox());
        self.instants.push(instant);
        Ok(())
    }
}
