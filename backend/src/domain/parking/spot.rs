//! Individual parking spots.

use std::fmt;

use super::LotId;

uuid_identifier!(
    /// Stable identifier of a parking spot.
    SpotId,
    "spot"
);

/// Raised when a spot number is not positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("spot number must be a positive integer, got {0}")]
pub struct SpotNumberError(pub i64);

/// Human-facing spot number, unique within its lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpotNumber(i32);

impl SpotNumber {
    /// Validate a spot number; it must fit a positive 32-bit integer.
    pub fn new(raw: i64) -> Result<Self, SpotNumberError> {
        match i32::try_from(raw) {
            Ok(value) if value > 0 => Ok(Self(value)),
            _ => Err(SpotNumberError(raw)),
        }
    }

    /// Numeric value.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for SpotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A spot inside a lot. `occupied` is the single source of truth for
/// whether a new reservation may claim it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkingSpot {
    pub id: SpotId,
    pub lot_id: LotId,
    pub number: SpotNumber,
    pub occupied: bool,
}

impl ParkingSpot {
    /// A fresh, unoccupied spot.
    pub fn vacant(lot_id: LotId, number: SpotNumber) -> Self {
        Self {
            id: SpotId::random(),
            lot_id,
            number,
            occupied: false,
        }
    }
}
