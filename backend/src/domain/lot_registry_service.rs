//! Lot and spot administration.
//!
//! Implements the [`LotRegistry`] driving port. Ownership is checked here:
//! an admin only ever sees their own lots through mutations, and a lot
//! owned by someone else is indistinguishable from a missing one.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    LotPersistenceError, LotRegistry, LotRepository, RemovalOutcome, ReservationPersistenceError,
    ReservationRepository, SpotDetail,
};
use crate::domain::{
    Error, HoldPolicy, Identity, LotChanges, LotDraft, LotId, LotWithSpots, Money, ParkingLot,
    ParkingSpot, SpotId, SpotNumber,
};

const LOT_NOT_FOUND: &str = "parking lot not found";
const SPOT_NOT_FOUND: &str = "parking spot not found";

/// Lot registry service implementing the [`LotRegistry`] driving port.
#[derive(Clone)]
pub struct LotRegistryService<L, R> {
    lots: Arc<L>,
    reservations: Arc<R>,
    clock: Arc<dyn Clock>,
    hold_policy: HoldPolicy,
}

impl<L, R> LotRegistryService<L, R> {
    /// Create a new service with the given repositories and clock.
    pub fn new(lots: Arc<L>, reservations: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            lots,
            reservations,
            clock,
            hold_policy: HoldPolicy::default(),
        }
    }

    /// Use `policy` to decide which holds have lapsed before removals.
    pub fn with_hold_policy(mut self, policy: HoldPolicy) -> Self {
        self.hold_policy = policy;
        self
    }
}

impl<L, R> LotRegistryService<L, R>
where
    L: LotRepository,
    R: ReservationRepository,
{
    fn map_lot_error(error: LotPersistenceError) -> Error {
        match error {
            LotPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("lot repository unavailable: {message}"))
            }
            LotPersistenceError::Query { message } => {
                Error::internal(format!("lot repository error: {message}"))
            }
            LotPersistenceError::DuplicateSpotNumber { number } => {
                Error::conflict(format!("spot number {number} already exists in this lot"))
                    .with_details(json!({ "field": "number", "code": "duplicate_spot_number" }))
            }
        }
    }

    fn map_reservation_error(error: ReservationPersistenceError) -> Error {
        match error {
            ReservationPersistenceError::Connection { message } => Error::service_unavailable(
                format!("reservation repository unavailable: {message}"),
            ),
            ReservationPersistenceError::Query { message } => {
                Error::internal(format!("reservation repository error: {message}"))
            }
        }
    }

    fn occupied(message: &str) -> Error {
        Error::conflict(message).with_details(json!({ "code": "spot_occupied" }))
    }

    /// Load a lot the admin owns, reporting anything else as missing.
    async fn owned_lot(&self, admin: &Identity, lot_id: &LotId) -> Result<ParkingLot, Error> {
        admin.require_admin()?;
        match self
            .lots
            .find_lot(lot_id)
            .await
            .map_err(Self::map_lot_error)?
        {
            Some(lot) if lot.owner == admin.user_id() => Ok(lot),
            _ => Err(Error::not_found(LOT_NOT_FOUND)),
        }
    }

    /// Close lapsed holds so they do not count as occupied spots.
    async fn reap_lapsed_holds(&self, lot_id: &LotId) -> Result<(), Error> {
        let now = self.clock.utc();
        let reaped = self
            .reservations
            .reap_stale_holds(lot_id, self.hold_policy.stale_before(now), now)
            .await
            .map_err(Self::map_reservation_error)?;
        if reaped > 0 {
            debug!(lot_id = %lot_id, reaped, "closed lapsed holds before removal");
        }
        Ok(())
    }
}

#[async_trait]
impl<L, R> LotRegistry for LotRegistryService<L, R>
where
    L: LotRepository,
    R: ReservationRepository,
{
    async fn create_lot(&self, admin: &Identity, draft: LotDraft) -> Result<LotWithSpots, Error> {
        admin.require_admin()?;
        let lot = draft.into_lot_with_spots(admin.user_id());
        self.lots.create(&lot).await.map_err(Self::map_lot_error)?;
        info!(
            lot_id = %lot.lot.id,
            spots = lot.total_spots(),
            owner = %admin.user_id(),
            "created parking lot"
        );
        Ok(lot)
    }

    async fn update_lot(
        &self,
        admin: &Identity,
        lot_id: &LotId,
        changes: LotChanges,
    ) -> Result<ParkingLot, Error> {
        let current = self.owned_lot(admin, lot_id).await?;
        if changes.is_empty() {
            return Ok(current);
        }
        let updated = changes.apply_to(current);
        if !self
            .lots
            .update(&updated)
            .await
            .map_err(Self::map_lot_error)?
        {
            return Err(Error::not_found(LOT_NOT_FOUND));
        }
        info!(lot_id = %updated.id, "updated parking lot");
        Ok(updated)
    }

    async fn delete_lot(&self, admin: &Identity, lot_id: &LotId) -> Result<(), Error> {
        self.owned_lot(admin, lot_id).await?;
        self.reap_lapsed_holds(lot_id).await?;
        match self
            .lots
            .delete_if_vacant(lot_id)
            .await
            .map_err(Self::map_lot_error)?
        {
            RemovalOutcome::Removed => {
                info!(lot_id = %lot_id, "deleted parking lot");
                Ok(())
            }
            RemovalOutcome::NotFound => Err(Error::not_found(LOT_NOT_FOUND)),
            RemovalOutcome::Occupied => {
                Err(Self::occupied("cannot delete a lot with occupied spots"))
            }
        }
    }

    async fn add_spot(
        &self,
        admin: &Identity,
        lot_id: &LotId,
        number: SpotNumber,
    ) -> Result<ParkingSpot, Error> {
        let lot = self.owned_lot(admin, lot_id).await?;
        let spot = ParkingSpot::vacant(lot.id, number);
        self.lots
            .add_spot(&spot)
            .await
            .map_err(Self::map_lot_error)?;
        info!(lot_id = %lot.id, spot_number = %number, "added parking spot");
        Ok(spot)
    }

    async fn renumber_spot(
        &self,
        admin: &Identity,
        lot_id: &LotId,
        spot_id: &SpotId,
        number: SpotNumber,
    ) -> Result<ParkingSpot, Error> {
        self.owned_lot(admin, lot_id).await?;
        self.lots
            .renumber_spot(lot_id, spot_id, number)
            .await
            .map_err(Self::map_lot_error)?
            .ok_or_else(|| Error::not_found(SPOT_NOT_FOUND))
    }

    async fn remove_spot(
        &self,
        admin: &Identity,
        lot_id: &LotId,
        spot_id: &SpotId,
    ) -> Result<(), Error> {
        self.owned_lot(admin, lot_id).await?;
        self.reap_lapsed_holds(lot_id).await?;
        match self
            .lots
            .delete_spot_if_vacant(lot_id, spot_id)
            .await
            .map_err(Self::map_lot_error)?
        {
            RemovalOutcome::Removed => {
                info!(lot_id = %lot_id, spot_id = %spot_id, "removed parking spot");
                Ok(())
            }
            RemovalOutcome::NotFound => Err(Error::not_found(SPOT_NOT_FOUND)),
            RemovalOutcome::Occupied => Err(Self::occupied("cannot delete an occupied spot")),
        }
    }

    async fn spot_detail(
        &self,
        admin: &Identity,
        lot_id: &LotId,
        spot_id: &SpotId,
    ) -> Result<SpotDetail, Error> {
        let lot = self.owned_lot(admin, lot_id).await?;
        let spot = self
            .lots
            .find_with_spots(lot_id)
            .await
            .map_err(Self::map_lot_error)?
            .and_then(|entry| entry.spots.into_iter().find(|spot| spot.id == *spot_id))
            .ok_or_else(|| Error::not_found(SPOT_NOT_FOUND))?;
        if !spot.occupied {
            return Err(Error::not_found("spot is available"));
        }
        let reservation = self
            .reservations
            .find_open_for_spot(spot_id)
            .await
            .map_err(Self::map_reservation_error)?
            .ok_or_else(|| Error::not_found("no open reservation for this spot"))?;
        let estimated_cost = reservation
            .live_estimate(self.clock.utc(), lot.price_per_hour)
            .unwrap_or(Money::ZERO);

        Ok(SpotDetail {
            lot,
            spot,
            reservation,
            estimated_cost,
        })
    }

    async fn list_lots(&self) -> Result<Vec<LotWithSpots>, Error> {
        self.lots
            .list_with_spots()
            .await
            .map_err(Self::map_lot_error)
    }
}

#[cfg(test)]
#[path = "lot_registry_service_tests.rs"]
mod tests;
