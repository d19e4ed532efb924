//! Error types for temporal values, codecs and the box index.

use mobility_types::time::Timestamp;
use mobility_types::value::{Frame, ValueKind};
use thiserror::Error;

/// Errors raised by constructors, codecs and binary operations.
///
/// Absence (no value at a timestamp, empty restriction, no time overlap) is
/// never an error; those operations return `Option`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MobilityError {
    /// Text literal could not be parsed.
    #[error("malformed literal at byte {position}: {message}")]
    MalformedLiteral { message: String, position: usize },

    /// Binary payload could not be decoded.
    #[error("malformed wire payload: {0}")]
    MalformedWire(String),

    /// Network fraction outside [0, 1], inverted period or invalid inclusivity.
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    /// Duplicate or out-of-order instants.
    #[error("timestamps must be strictly increasing: {next} does not follow {previous}")]
    NonIncreasingTimestamps {
        previous: Timestamp,
        next: Timestamp,
    },

    /// Inconsistent reference frame or dimensionality.
    #[error("dimensionality mismatch: {expected} vs {found}")]
    DimensionalityMismatch { expected: Frame, found: Frame },

    /// Linear network sequence leaves its route, or similar frame-level misuse.
    #[error("dimensionality mismatch: {0}")]
    FrameViolation(String),

    /// Network position refers to a route the topology does not know.
    #[error("unknown route {0}")]
    UnknownRoute(u64),

    /// The catalog has no entry for this value kind and duration.
    #[error("type {kind} {duration} is not registered")]
    UnregisteredType { kind: ValueKind, duration: String },

    /// Non-finite coordinates, empty collections and other invalid arguments.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MobilityError {
    pub(crate) fn literal(message: impl Into<String>, position: usize) -> Self {
        MobilityError::MalformedLiteral {
            message: message.into(),
            position,
        }
    }

    /// True for both dimensionality variants.
    pub fn is_dimensionality_mismatch(&self) -> bool {
        matches!(
            self,
            MobilityError::DimensionalityMismatch { .. } | MobilityError::FrameViolation(_)
        )
    }
}

impl From<bincode::Error> for MobilityError {
    fn from(e: bincode::Error) -> Self {
        MobilityError::MalformedWire(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MobilityError>;
