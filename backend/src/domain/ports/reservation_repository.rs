//! Port for reservation persistence and atomic spot claiming.
//!
//! Every method that changes whether a reservation is open also changes the
//! matching spot's `occupied` flag in the same transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{LotId, Reservation, ReservationId, SpotId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reservation repository adapters.
    pub enum ReservationPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "reservation repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "reservation repository query failed: {message}",
    }
}

/// Inputs for claiming the lowest-numbered free spot in a lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    pub reservation_id: ReservationId,
    pub user_id: UserId,
    pub lot_id: LotId,
    pub held_at: DateTime<Utc>,
    /// Unconfirmed holds in this lot taken before this instant are closed
    /// at zero cost, and their spots freed, before a spot is picked.
    pub stale_before: DateTime<Utc>,
}

/// Result of a claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// A spot was marked occupied and a Held reservation recorded.
    Claimed(Reservation),
    /// The lot does not exist.
    LotNotFound,
    /// Every spot in the lot is occupied.
    NoCapacity,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Atomically claim a free spot and record a Held reservation.
    ///
    /// Concurrent claims against the same lot never receive the same spot.
    async fn claim_spot(
        &self,
        request: &ClaimRequest,
    ) -> Result<ClaimOutcome, ReservationPersistenceError>;

    /// Close unconfirmed holds in `lot_id` taken before `stale_before`.
    ///
    /// Closed holds cost nothing and free their spots. Returns how many
    /// holds were closed.
    async fn reap_stale_holds(
        &self,
        lot_id: &LotId,
        stale_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<usize, ReservationPersistenceError>;

    /// Fetch a reservation only if `user_id` owns it.
    async fn find_for_user(
        &self,
        id: &ReservationId,
        user_id: &UserId,
    ) -> Result<Option<Reservation>, ReservationPersistenceError>;

    /// Persist the vehicle and start time of a confirmed reservation.
    ///
    /// Applies only while the stored row is still open and its start time
    /// equals `observed_start`; returns `false` otherwise.
    async fn save_confirmation(
        &self,
        confirmed: &Reservation,
        observed_start: Option<DateTime<Utc>>,
    ) -> Result<bool, ReservationPersistenceError>;

    /// Record the end time, cost, and billed rate of a closed reservation
    /// and free its spot.
    ///
    /// Applies only while the stored row is open with the same start time as
    /// `closed`; returns `false` when it was closed or confirmed meanwhile.
    async fn close(&self, closed: &Reservation) -> Result<bool, ReservationPersistenceError>;

    /// The open reservation holding a spot, if any.
    async fn find_open_for_spot(
        &self,
        spot_id: &SpotId,
    ) -> Result<Option<Reservation>, ReservationPersistenceError>;

    /// All of a user's reservations, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Reservation>, ReservationPersistenceError>;

    /// Every open reservation with a running billing clock.
    async fn list_active(&self) -> Result<Vec<Reservation>, ReservationPersistenceError>;

    /// A user's closed reservations that started at or after `since`.
    async fn list_released_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, ReservationPersistenceError>;
}
