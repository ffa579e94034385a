//! Reservation lifecycle orchestration.
//!
//! Implements the [`ReservationLifecycle`] driving port. The transitions
//! themselves live on [`Reservation`]; this service loads state, applies a
//! transition, and persists it with a conditional write. When the write
//! loses a race the reservation is re-read and the transition re-applied,
//! so concurrent confirms converge and a concurrent release is reported as
//! a conflict rather than silently overwritten.
//!
//! Notifications are sent after the write commits and never fail the call.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    ClaimOutcome, ClaimRequest, LotPersistenceError, LotRepository, Notification,
    NotificationKind, Notifier, ReservationLifecycle, ReservationPersistenceError,
    ReservationRepository, UserRepository,
};
use crate::domain::{
    EmailAddress, Error, HoldPolicy, Identity, LotId, Money, Reservation, ReservationId, TraceId,
    TransitionError, VehicleNumber,
};

const RESERVATION_NOT_FOUND: &str = "reservation not found";
const WRITE_ATTEMPTS: usize = 3;

/// Driven ports used by [`ReservationService`].
pub struct ReservationPorts<L, R, U, N> {
    pub lots: Arc<L>,
    pub reservations: Arc<R>,
    pub users: Arc<U>,
    pub notifier: Arc<N>,
}

/// Reservation service implementing the [`ReservationLifecycle`] port.
#[derive(Clone)]
pub struct ReservationService<L, R, U, N> {
    lots: Arc<L>,
    reservations: Arc<R>,
    users: Arc<U>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    hold_policy: HoldPolicy,
}

impl<L, R, U, N> ReservationService<L, R, U, N> {
    /// Create a new service.
    pub fn new(
        ports: ReservationPorts<L, R, U, N>,
        clock: Arc<dyn Clock>,
        hold_policy: HoldPolicy,
    ) -> Self {
        Self {
            lots: ports.lots,
            reservations: ports.reservations,
            users: ports.users,
            notifier: ports.notifier,
            clock,
            hold_policy,
        }
    }
}

impl<L, R, U, N> ReservationService<L, R, U, N>
where
    L: LotRepository,
    R: ReservationRepository,
    U: UserRepository,
    N: Notifier,
{
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

    fn map_lot_error(error: LotPersistenceError) -> Error {
        match error {
            LotPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("lot repository unavailable: {message}"))
            }
            other => Error::internal(format!("lot repository error: {other}")),
        }
    }

    fn map_transition_error(error: TransitionError) -> Error {
        let code = match error {
            TransitionError::AlreadyCompleted => "already_completed",
            TransitionError::HoldExpired => "hold_expired",
        };
        Error::conflict(error.to_string()).with_details(json!({ "code": code }))
    }

    fn contended() -> Error {
        Error::conflict("reservation changed concurrently; retry the request")
            .with_details(json!({ "code": "concurrent_update" }))
    }

    async fn load_owned(
        &self,
        caller: &Identity,
        reservation_id: &ReservationId,
    ) -> Result<Reservation, Error> {
        self.reservations
            .find_for_user(reservation_id, &caller.user_id())
            .await
            .map_err(Self::map_reservation_error)?
            .ok_or_else(|| Error::not_found(RESERVATION_NOT_FOUND))
    }

    /// Current hourly price of the reservation's lot.
    async fn current_rate(&self, reservation: &Reservation) -> Result<Money, Error> {
        let Some(lot_id) = reservation.lot_id() else {
            return Err(Error::internal("open reservation has no parking lot"));
        };
        self.lots
            .find_lot(&lot_id)
            .await
            .map_err(Self::map_lot_error)?
            .map(|lot| lot.price_per_hour)
            .ok_or_else(|| Error::internal("open reservation references a missing parking lot"))
    }

    /// Best-effort notification to the reservation owner.
    async fn notify(&self, kind: NotificationKind, reservation: &Reservation) {
        let recipient = match self.users.find_by_id(&reservation.user_id()).await {
            Ok(Some(user)) => user.email().clone(),
            Ok(None) => {
                warn!(
                    reservation_id = %reservation.id(),
                    kind = %kind,
                    "notification skipped: reservation owner not found"
                );
                return;
            }
            Err(error) => {
                warn!(
                    reservation_id = %reservation.id(),
                    kind = %kind,
                    error = %error,
                    "notification skipped: owner lookup failed"
                );
                return;
            }
        };

        let notification = compose(kind, reservation, recipient);
        if let Err(error) = self.notifier.notify(notification) {
            warn!(
                reservation_id = %reservation.id(),
                kind = %kind,
                error = %error,
                "notification dropped"
            );
        }
    }
}

fn compose(
    kind: NotificationKind,
    reservation: &Reservation,
    recipient: EmailAddress,
) -> Notification {
    let vehicle = reservation
        .vehicle()
        .map_or_else(String::new, |v| v.to_string());
    let (subject, body) = match kind {
        NotificationKind::BookingConfirmed => (
            format!("Booking confirmed at {}", reservation.lot_name()),
            format!(
                "Spot {} at {} ({}) is booked for vehicle {}.",
                reservation.spot_number(),
                reservation.lot_name(),
                reservation.lot_address(),
                vehicle,
            ),
        ),
        NotificationKind::SpotReleased => (
            format!("Spot released at {}", reservation.lot_name()),
            format!(
                "Spot {} at {} has been released. Total cost: {:.2}.",
                reservation.spot_number(),
                reservation.lot_name(),
                reservation.cost().unwrap_or(Money::ZERO).as_major_units(),
            ),
        ),
    };
    Notification {
        kind,
        recipient,
        subject,
        body,
        trace_id: TraceId::current(),
    }
}

#[async_trait]
impl<L, R, U, N> ReservationLifecycle for ReservationService<L, R, U, N>
where
    L: LotRepository,
    R: ReservationRepository,
    U: UserRepository,
    N: Notifier,
{
    async fn assign(&self, caller: &Identity, lot_id: &LotId) -> Result<Reservation, Error> {
        let now = self.clock.utc();
        let request = ClaimRequest {
            reservation_id: ReservationId::random(),
            user_id: caller.user_id(),
            lot_id: *lot_id,
            held_at: now,
            stale_before: self.hold_policy.stale_before(now),
        };

        match self
            .reservations
            .claim_spot(&request)
            .await
            .map_err(Self::map_reservation_error)?
        {
            ClaimOutcome::Claimed(reservation) => {
                info!(
                    reservation_id = %reservation.id(),
                    lot_id = %lot_id,
                    spot_number = %reservation.spot_number(),
                    user_id = %caller.user_id(),
                    "spot assigned"
                );
                Ok(reservation)
            }
            ClaimOutcome::LotNotFound => Err(Error::not_found("parking lot not found")),
            ClaimOutcome::NoCapacity => {
                Err(Error::no_capacity("no spots available in this lot"))
            }
        }
    }

    async fn confirm(
        &self,
        caller: &Identity,
        reservation_id: &ReservationId,
        vehicle: VehicleNumber,
    ) -> Result<Reservation, Error> {
        for _ in 0..WRITE_ATTEMPTS {
            let current = self.load_owned(caller, reservation_id).await?;
            let confirmed = current
                .confirm(vehicle.clone(), self.clock.utc(), self.hold_policy)
                .map_err(Self::map_transition_error)?;
            let saved = self
                .reservations
                .save_confirmation(&confirmed, current.start_time())
                .await
                .map_err(Self::map_reservation_error)?;
            if saved {
                info!(
                    reservation_id = %confirmed.id(),
                    spot_number = %confirmed.spot_number(),
                    vehicle = %vehicle,
                    "booking confirmed"
                );
                self.notify(NotificationKind::BookingConfirmed, &confirmed)
                    .await;
                return Ok(confirmed);
            }
        }
        Err(Self::contended())
    }

    async fn release(
        &self,
        caller: &Identity,
        reservation_id: &ReservationId,
    ) -> Result<Reservation, Error> {
        for _ in 0..WRITE_ATTEMPTS {
            let current = self.load_owned(caller, reservation_id).await?;
            if !current.is_open() {
                return Err(Self::map_transition_error(TransitionError::AlreadyCompleted));
            }
            let rate = self.current_rate(&current).await?;
            let released = current
                .release(self.clock.utc(), rate)
                .map_err(Self::map_transition_error)?;
            let closed = self
                .reservations
                .close(&released)
                .await
                .map_err(Self::map_reservation_error)?;
            if closed {
                info!(
                    reservation_id = %released.id(),
                    spot_number = %released.spot_number(),
                    cost_cents = released.cost().map_or(0, Money::minor_units),
                    "spot released"
                );
                self.notify(NotificationKind::SpotReleased, &released).await;
                return Ok(released);
            }
        }
        Err(Self::contended())
    }
}

#[cfg(test)]
#[path = "reservation_service_tests.rs"]
mod tests;
