//! Driving port for lot and spot administration.

use async_trait::async_trait;

use crate::domain::{
    Error, Identity, LotChanges, LotDraft, LotId, LotWithSpots, Money, ParkingLot, ParkingSpot,
    Reservation, SpotId, SpotNumber,
};

/// An occupied spot with the reservation holding it.
#[derive(Debug, Clone)]
pub struct SpotDetail {
    pub lot: ParkingLot,
    pub spot: ParkingSpot,
    pub reservation: Reservation,
    /// Cost so far at the lot's current price; zero while only held.
    pub estimated_cost: Money,
}

/// Lot administration. Every mutation is limited to lots the calling admin
/// created; other lots report `NotFound`.
#[async_trait]
pub trait LotRegistry: Send + Sync {
    /// Create a lot with spots numbered `1..=N`.
    async fn create_lot(&self, admin: &Identity, draft: LotDraft) -> Result<LotWithSpots, Error>;

    /// Update lot metadata without resizing.
    async fn update_lot(
        &self,
        admin: &Identity,
        lot_id: &LotId,
        changes: LotChanges,
    ) -> Result<ParkingLot, Error>;

    /// Delete a lot and its spots; `Conflict` while any spot is occupied.
    async fn delete_lot(&self, admin: &Identity, lot_id: &LotId) -> Result<(), Error>;

    /// Add a spot; `Conflict` on a duplicate number.
    async fn add_spot(
        &self,
        admin: &Identity,
        lot_id: &LotId,
        number: SpotNumber,
    ) -> Result<ParkingSpot, Error>;

    /// Renumber a spot; `Conflict` on a duplicate number.
    async fn renumber_spot(
        &self,
        admin: &Identity,
        lot_id: &LotId,
        spot_id: &SpotId,
        number: SpotNumber,
    ) -> Result<ParkingSpot, Error>;

    /// Remove an unoccupied spot.
    async fn remove_spot(
        &self,
        admin: &Identity,
        lot_id: &LotId,
        spot_id: &SpotId,
    ) -> Result<(), Error>;

    /// The reservation currently holding a spot.
    async fn spot_detail(
        &self,
        admin: &Identity,
        lot_id: &LotId,
        spot_id: &SpotId,
    ) -> Result<SpotDetail, Error>;

    /// Every lot with its spots, for browsing.
    async fn list_lots(&self) -> Result<Vec<LotWithSpots>, Error>;
}
