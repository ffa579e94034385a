//! In-process parking store implementing every persistence port.
//!
//! Used when no database is configured and throughout the test suites. One
//! mutex guards the whole state, so every port call is a serialised,
//! all-or-nothing transaction and the occupancy invariant holds trivially:
//! a spot is occupied exactly when one open reservation points at it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    ClaimOutcome, ClaimRequest, LotPersistenceError, LotRepository, RemovalOutcome,
    ReservationPersistenceError, ReservationRepository, StoredCredentials, UserPersistenceError,
    UserRepository,
};
use crate::domain::{
    EmailAddress, LotId, LotWithSpots, ParkingLot, ParkingSpot, PasswordHash, Reservation,
    ReservationId, ReservationState, Role, SpotId, SpotNumber, User, UserId,
};

#[derive(Default)]
struct StoreState {
    users: HashMap<UserId, StoredCredentials>,
    lots: HashMap<LotId, ParkingLot>,
    spots: HashMap<SpotId, ParkingSpot>,
    reservations: HashMap<ReservationId, Reservation>,
}

impl StoreState {
    fn spots_of(&self, lot_id: &LotId) -> Vec<ParkingSpot> {
        let mut spots: Vec<ParkingSpot> = self
            .spots
            .values()
            .filter(|spot| spot.lot_id == *lot_id)
            .cloned()
            .collect();
        spots.sort_by_key(|spot| spot.number);
        spots
    }

    fn with_spots(&self, lot: &ParkingLot) -> LotWithSpots {
        LotWithSpots {
            lot: lot.clone(),
            spots: self.spots_of(&lot.id),
        }
    }

    fn number_taken(&self, lot_id: &LotId, number: SpotNumber, except: Option<&SpotId>) -> bool {
        self.spots.values().any(|spot| {
            spot.lot_id == *lot_id && spot.number == number && Some(&spot.id) != except
        })
    }

    fn set_occupied(&mut self, spot_id: Option<SpotId>, occupied: bool) {
        if let Some(spot) = spot_id.and_then(|id| self.spots.get_mut(&id)) {
            spot.occupied = occupied;
        }
    }

    /// Detach history from removed spots, keeping the snapshots.
    fn detach_spot(&mut self, spot_id: &SpotId) {
        for reservation in self.reservations.values_mut() {
            if reservation.spot_id() == Some(*spot_id) {
                let mut record = reservation.record().clone();
                record.spot_id = None;
                *reservation = Reservation::from(record);
            }
        }
    }

    fn detach_lot(&mut self, lot_id: &LotId) {
        for reservation in self.reservations.values_mut() {
            if reservation.lot_id() == Some(*lot_id) {
                let mut record = reservation.record().clone();
                record.lot_id = None;
                record.spot_id = None;
                *reservation = Reservation::from(record);
            }
        }
    }

    fn reap_stale_holds(
        &mut self,
        lot_id: &LotId,
        stale_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> usize {
        let stale: Vec<ReservationId> = self
            .reservations
            .values()
            .filter(|r| {
                r.lot_id() == Some(*lot_id)
                    && r.state() == ReservationState::Held
                    && r.held_at() < stale_before
            })
            .map(Reservation::id)
            .collect();
        let reaped = stale.len();
        for id in stale {
            if let Some(expired) = self.reservations.get(&id).map(|r| r.expire(now)) {
                self.set_occupied(expired.spot_id(), false);
                self.reservations.insert(id, expired);
            }
        }
        reaped
    }
}

/// Mutex-guarded store implementing the user, lot, and reservation ports.
#[derive(Default)]
pub struct InMemoryParkingStore {
    state: Mutex<StoreState>,
}

impl InMemoryParkingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, String> {
        self.state
            .lock()
            .map_err(|_| "in-memory store lock poisoned".to_owned())
    }
}

#[async_trait]
impl UserRepository for InMemoryParkingStore {
    async fn insert(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        let mut state = self.lock().map_err(UserPersistenceError::query)?;
        if state
            .users
            .values()
            .any(|stored| stored.user.email() == user.email())
        {
            return Err(UserPersistenceError::duplicate_email(user.email().as_ref()));
        }
        state.users.insert(
            user.id(),
            StoredCredentials {
                user: user.clone(),
                password_hash: password_hash.clone(),
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let state = self.lock().map_err(UserPersistenceError::query)?;
        Ok(state.users.get(id).map(|stored| stored.user.clone()))
    }

    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let state = self.lock().map_err(UserPersistenceError::query)?;
        Ok(state
            .users
            .values()
            .find(|stored| stored.user.email() == email)
            .cloned())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>, UserPersistenceError> {
        let state = self.lock().map_err(UserPersistenceError::query)?;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|stored| stored.user.role() == role)
            .map(|stored| stored.user.clone())
            .collect();
        users.sort_by(|a, b| a.full_name().as_ref().cmp(b.full_name().as_ref()));
        Ok(users)
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &PasswordHash,
    ) -> Result<bool, UserPersistenceError> {
        let mut state = self.lock().map_err(UserPersistenceError::query)?;
        Ok(match state.users.get_mut(id) {
            Some(stored) => {
                stored.password_hash = password_hash.clone();
                true
            }
            None => false,
        })
    }

    async fn role_exists(&self, role: Role) -> Result<bool, UserPersistenceError> {
        let state = self.lock().map_err(UserPersistenceError::query)?;
        Ok(state.users.values().any(|stored| stored.user.role() == role))
    }
}

#[async_trait]
impl LotRepository for InMemoryParkingStore {
    async fn create(&self, lot: &LotWithSpots) -> Result<(), LotPersistenceError> {
        let mut state = self.lock().map_err(LotPersistenceError::query)?;
        state.lots.insert(lot.lot.id, lot.lot.clone());
        for spot in &lot.spots {
            state.spots.insert(spot.id, spot.clone());
        }
        Ok(())
    }

    async fn find_lot(&self, id: &LotId) -> Result<Option<ParkingLot>, LotPersistenceError> {
        let state = self.lock().map_err(LotPersistenceError::query)?;
        Ok(state.lots.get(id).cloned())
    }

    async fn find_with_spots(
        &self,
        id: &LotId,
    ) -> Result<Option<LotWithSpots>, LotPersistenceError> {
        let state = self.lock().map_err(LotPersistenceError::query)?;
        Ok(state.lots.get(id).map(|lot| state.with_spots(lot)))
    }

    async fn list_with_spots(&self) -> Result<Vec<LotWithSpots>, LotPersistenceError> {
        let state = self.lock().map_err(LotPersistenceError::query)?;
        let mut lots: Vec<LotWithSpots> =
            state.lots.values().map(|lot| state.with_spots(lot)).collect();
        lots.sort_by(|a, b| {
            a.lot
                .name
                .as_ref()
                .cmp(b.lot.name.as_ref())
                .then_with(|| a.lot.id.cmp(&b.lot.id))
        });
        Ok(lots)
    }

    async fn update(&self, lot: &ParkingLot) -> Result<bool, LotPersistenceError> {
        let mut state = self.lock().map_err(LotPersistenceError::query)?;
        Ok(match state.lots.get_mut(&lot.id) {
            Some(existing) => {
                *existing = lot.clone();
                true
            }
            None => false,
        })
    }

    async fn delete_if_vacant(&self, id: &LotId) -> Result<RemovalOutcome, LotPersistenceError> {
        let mut state = self.lock().map_err(LotPersistenceError::query)?;
        if !state.lots.contains_key(id) {
            return Ok(RemovalOutcome::NotFound);
        }
        if state
            .spots
            .values()
            .any(|spot| spot.lot_id == *id && spot.occupied)
        {
            return Ok(RemovalOutcome::Occupied);
        }
        state.spots.retain(|_, spot| spot.lot_id != *id);
        state.lots.remove(id);
        state.detach_lot(id);
        Ok(RemovalOutcome::Removed)
    }

    async fn add_spot(&self, spot: &ParkingSpot) -> Result<(), LotPersistenceError> {
        let mut state = self.lock().map_err(LotPersistenceError::query)?;
        if !state.lots.contains_key(&spot.lot_id) {
            return Err(LotPersistenceError::query("parking lot does not exist"));
        }
        if state.number_taken(&spot.lot_id, spot.number, None) {
            return Err(LotPersistenceError::duplicate_spot_number(spot.number.get()));
        }
        state.spots.insert(spot.id, spot.clone());
        Ok(())
    }

    async fn renumber_spot(
        &self,
        lot_id: &LotId,
        spot_id: &SpotId,
        number: SpotNumber,
    ) -> Result<Option<ParkingSpot>, LotPersistenceError> {
        let mut state = self.lock().map_err(LotPersistenceError::query)?;
        match state.spots.get(spot_id) {
            Some(spot) if spot.lot_id == *lot_id => {}
            _ => return Ok(None),
        }
        if state.number_taken(lot_id, number, Some(spot_id)) {
            return Err(LotPersistenceError::duplicate_spot_number(number.get()));
        }
        Ok(state.spots.get_mut(spot_id).map(|spot| {
            spot.number = number;
            spot.clone()
        }))
    }

    async fn delete_spot_if_vacant(
        &self,
        lot_id: &LotId,
        spot_id: &SpotId,
    ) -> Result<RemovalOutcome, LotPersistenceError> {
        let mut state = self.lock().map_err(LotPersistenceError::query)?;
        let occupied = state
            .spots
            .get(spot_id)
            .filter(|spot| spot.lot_id == *lot_id)
            .map(|spot| spot.occupied);
        match occupied {
            None => Ok(RemovalOutcome::NotFound),
            Some(true) => Ok(RemovalOutcome::Occupied),
            Some(false) => {
                state.spots.remove(spot_id);
                state.detach_spot(spot_id);
                Ok(RemovalOutcome::Removed)
            }
        }
    }
}

#[async_trait]
impl ReservationRepository for InMemoryParkingStore {
    async fn claim_spot(
        &self,
        request: &ClaimRequest,
    ) -> Result<ClaimOutcome, ReservationPersistenceError> {
        let mut state = self.lock().map_err(ReservationPersistenceError::query)?;
        let Some(lot) = state.lots.get(&request.lot_id).cloned() else {
            return Ok(ClaimOutcome::LotNotFound);
        };
        state.reap_stale_holds(&request.lot_id, request.stale_before, request.held_at);

        let Some(spot) = state
            .spots_of(&request.lot_id)
            .into_iter()
            .find(|spot| !spot.occupied)
        else {
            return Ok(ClaimOutcome::NoCapacity);
        };

        let reservation = Reservation::hold(
            request.reservation_id,
            request.user_id,
            &lot,
            &spot,
            request.held_at,
        );
        state.set_occupied(Some(spot.id), true);
        state
            .reservations
            .insert(reservation.id(), reservation.clone());
        Ok(ClaimOutcome::Claimed(reservation))
    }

    async fn reap_stale_holds(
        &self,
        lot_id: &LotId,
        stale_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<usize, ReservationPersistenceError> {
        let mut state = self.lock().map_err(ReservationPersistenceError::query)?;
        Ok(state.reap_stale_holds(lot_id, stale_before, now))
    }

    async fn find_for_user(
        &self,
        id: &ReservationId,
        user_id: &UserId,
    ) -> Result<Option<Reservation>, ReservationPersistenceError> {
        let state = self.lock().map_err(ReservationPersistenceError::query)?;
        Ok(state
            .reservations
            .get(id)
            .filter(|r| r.user_id() == *user_id)
            .cloned())
    }

    async fn save_confirmation(
        &self,
        confirmed: &Reservation,
        observed_start: Option<DateTime<Utc>>,
    ) -> Result<bool, ReservationPersistenceError> {
        let mut state = self.lock().map_err(ReservationPersistenceError::query)?;
        match state.reservations.get_mut(&confirmed.id()) {
            Some(stored) if stored.is_open() && stored.start_time() == observed_start => {
                *stored = confirmed.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn close(&self, closed: &Reservation) -> Result<bool, ReservationPersistenceError> {
        let mut state = self.lock().map_err(ReservationPersistenceError::query)?;
        let spot_id = match state.reservations.get_mut(&closed.id()) {
            Some(stored) if stored.is_open() && stored.start_time() == closed.start_time() => {
                *stored = closed.clone();
                stored.spot_id()
            }
            _ => return Ok(false),
        };
        state.set_occupied(spot_id, false);
        Ok(true)
    }

    async fn find_open_for_spot(
        &self,
        spot_id: &SpotId,
    ) -> Result<Option<Reservation>, ReservationPersistenceError> {
        let state = self.lock().map_err(ReservationPersistenceError::query)?;
        Ok(state
            .reservations
            .values()
            .find(|r| r.spot_id() == Some(*spot_id) && r.is_open())
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Reservation>, ReservationPersistenceError> {
        let state = self.lock().map_err(ReservationPersistenceError::query)?;
        let mut reservations: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| r.user_id() == *user_id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.held_at().cmp(&a.held_at()));
        Ok(reservations)
    }

    async fn list_active(&self) -> Result<Vec<Reservation>, ReservationPersistenceError> {
        let state = self.lock().map_err(ReservationPersistenceError::query)?;
        Ok(state
            .reservations
            .values()
            .filter(|r| r.state() == ReservationState::Active)
            .cloned()
            .collect())
    }

    async fn list_released_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, ReservationPersistenceError> {
        let state = self.lock().map_err(ReservationPersistenceError::query)?;
        Ok(state
            .reservations
            .values()
            .filter(|r| {
                r.user_id() == *user_id
                    && r.end_time().is_some()
                    && r.start_time().is_some_and(|start| start >= since)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests;
