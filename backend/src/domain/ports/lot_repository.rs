//! Port for parking lot and spot persistence.
//!
//! Adapters keep each lot's spots consistent with their occupancy flags and
//! guard deletions inside the same transaction that checks occupancy, so a
//! concurrent claim can never strand a reservation on a deleted spot.

use async_trait::async_trait;

use crate::domain::{LotId, LotWithSpots, ParkingLot, ParkingSpot, SpotId, SpotNumber};

use super::define_port_error;

define_port_error! {
    /// Errors raised by lot repository adapters.
    pub enum LotPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "lot repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "lot repository query failed: {message}",
        /// The lot already has a spot with this number.
        DuplicateSpotNumber { number: i32 } =>
            "spot number {number} already exists in this lot",
    }
}

/// Result of a guarded delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The row (and any dependants) were removed.
    Removed,
    /// Nothing matched the identifiers.
    NotFound,
    /// The lot or spot is occupied and was left untouched.
    Occupied,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LotRepository: Send + Sync {
    /// Persist a new lot with its initial spots in one transaction.
    async fn create(&self, lot: &LotWithSpots) -> Result<(), LotPersistenceError>;

    /// Fetch lot metadata.
    async fn find_lot(&self, id: &LotId) -> Result<Option<ParkingLot>, LotPersistenceError>;

    /// Fetch a lot with its spots ordered by number.
    async fn find_with_spots(
        &self,
        id: &LotId,
    ) -> Result<Option<LotWithSpots>, LotPersistenceError>;

    /// Every lot with its spots, ordered by lot name.
    async fn list_with_spots(&self) -> Result<Vec<LotWithSpots>, LotPersistenceError>;

    /// Overwrite lot metadata. Returns `false` when the lot is gone.
    async fn update(&self, lot: &ParkingLot) -> Result<bool, LotPersistenceError>;

    /// Delete a lot and its spots unless any spot is occupied.
    async fn delete_if_vacant(&self, id: &LotId) -> Result<RemovalOutcome, LotPersistenceError>;

    /// Insert a spot into an existing lot.
    async fn add_spot(&self, spot: &ParkingSpot) -> Result<(), LotPersistenceError>;

    /// Change a spot's number. Returns `None` when the spot is not in the lot.
    async fn renumber_spot(
        &self,
        lot_id: &LotId,
        spot_id: &SpotId,
        number: SpotNumber,
    ) -> Result<Option<ParkingSpot>, LotPersistenceError>;

    /// Delete an unoccupied spot from a lot.
    async fn delete_spot_if_vacant(
        &self,
        lot_id: &LotId,
        spot_id: &SpotId,
    ) -> Result<RemovalOutcome, LotPersistenceError>;
}
