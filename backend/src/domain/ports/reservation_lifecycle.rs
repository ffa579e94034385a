//! Driving port for the reservation lifecycle.

use async_trait::async_trait;

use crate::domain::{Error, Identity, LotId, Reservation, ReservationId, VehicleNumber};

#[async_trait]
pub trait ReservationLifecycle: Send + Sync {
    /// Claim the lowest-numbered free spot in a lot as a Held reservation.
    async fn assign(&self, caller: &Identity, lot_id: &LotId) -> Result<Reservation, Error>;

    /// Attach a vehicle and start billing; repeated calls keep the start time.
    async fn confirm(
        &self,
        caller: &Identity,
        reservation_id: &ReservationId,
        vehicle: VehicleNumber,
    ) -> Result<Reservation, Error>;

    /// Close the reservation, bill it, and free the spot.
    async fn release(
        &self,
        caller: &Identity,
        reservation_id: &ReservationId,
    ) -> Result<Reservation, Error>;
}
