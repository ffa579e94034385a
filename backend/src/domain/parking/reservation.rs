//! Reservation records and the Held → Active → Released lifecycle.
//!
//! ```text
//!   assign            confirm               release
//! ─────────▶ Held ─────────────▶ Active ─────────────▶ Released
//!             │  (vehicle set,     │ (vehicle may       ▲
//!             │   clock starts)    │  change, clock     │
//!             │                    │  never restarts)   │
//!             └──────── release / hold timeout ─────────┘  (billed zero)
//! ```
//!
//! The spot's `occupied` flag mirrors "has an open reservation"; adapters
//! flip it in the same transaction as every transition recorded here.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;

use crate::domain::{Address, UserId};

use super::{LotId, LotName, Money, ParkingLot, ParkingSpot, SpotId, SpotNumber};

/// Maximum length of a vehicle registration.
pub const VEHICLE_NUMBER_MAX: usize = 16;

uuid_identifier!(
    /// Stable identifier of a reservation.
    ReservationId,
    "reservation"
);

/// Raised when a vehicle registration is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VehicleNumberError {
    /// Blank input.
    #[error("vehicle number must not be empty")]
    Empty,
    /// Longer than [`VEHICLE_NUMBER_MAX`].
    #[error("vehicle number must be at most {max} characters")]
    TooLong { max: usize },
    /// Characters other than letters, digits, spaces, or hyphens.
    #[error("vehicle number may only contain letters, digits, spaces, or hyphens")]
    InvalidCharacters,
}

static VEHICLE_RE: OnceLock<Regex> = OnceLock::new();

fn vehicle_regex() -> &'static Regex {
    VEHICLE_RE.get_or_init(|| {
        Regex::new("^[A-Z0-9][A-Z0-9 -]*$")
            .unwrap_or_else(|error| panic!("vehicle regex failed to compile: {error}"))
    })
}

/// Vehicle registration, trimmed and upper-cased.
///
/// # Examples
/// ```
/// use parking_backend::domain::VehicleNumber;
///
/// let plate = VehicleNumber::new(" ka-01 ab 1234 ").unwrap();
/// assert_eq!(plate.as_ref(), "KA-01 AB 1234");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleNumber(String);

impl VehicleNumber {
    /// Validate and normalise a registration.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, VehicleNumberError> {
        let normalised = raw.as_ref().trim().to_uppercase();
        if normalised.is_empty() {
            return Err(VehicleNumberError::Empty);
        }
        if normalised.chars().count() > VEHICLE_NUMBER_MAX {
            return Err(VehicleNumberError::TooLong {
                max: VEHICLE_NUMBER_MAX,
            });
        }
        if !vehicle_regex().is_match(&normalised) {
            return Err(VehicleNumberError::InvalidCharacters);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for VehicleNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for VehicleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How long a claimed spot may stay unconfirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldPolicy {
    timeout: TimeDelta,
}

impl HoldPolicy {
    /// Default hold timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 900;

    /// Build a policy; timeouts beyond `TimeDelta`'s range saturate.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: TimeDelta::from_std(timeout).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Configured timeout.
    pub fn timeout(&self) -> TimeDelta {
        self.timeout
    }

    /// Holds taken before this instant are stale at `now`.
    pub fn stale_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.timeout)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for HoldPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS))
    }
}

/// Lifecycle state derived from the reservation timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationState {
    /// Spot claimed; vehicle not yet confirmed.
    Held,
    /// Vehicle confirmed; billing clock running.
    Active,
    /// Closed with a final cost.
    Released,
}

impl ReservationState {
    /// Stable lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Held => "held",
            Self::Active => "active",
            Self::Released => "released",
        }
    }
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Illegal transition attempted on a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The reservation was already released.
    #[error("reservation already completed")]
    AlreadyCompleted,
    /// The unconfirmed hold outlived the hold timeout.
    #[error("reservation hold has expired")]
    HoldExpired,
}

/// Flat persistence shape of a reservation.
///
/// `lot_id` and `spot_id` become `None` when the lot or spot is deleted
/// later; the name, address, and number snapshots keep history readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRecord {
    pub id: ReservationId,
    pub user_id: UserId,
    pub lot_id: Option<LotId>,
    pub spot_id: Option<SpotId>,
    pub lot_name: LotName,
    pub lot_address: Address,
    pub spot_number: SpotNumber,
    pub vehicle: Option<VehicleNumber>,
    pub held_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub cost: Option<Money>,
    pub billed_rate: Option<Money>,
}

/// A user's claim on a spot, open until released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation(ReservationRecord);

impl From<ReservationRecord> for Reservation {
    fn from(record: ReservationRecord) -> Self {
        Self(record)
    }
}

impl Reservation {
    /// Open a Held reservation for `spot` in `lot`.
    pub fn hold(
        id: ReservationId,
        user_id: UserId,
        lot: &ParkingLot,
        spot: &ParkingSpot,
        held_at: DateTime<Utc>,
    ) -> Self {
        Self(ReservationRecord {
            id,
            user_id,
            lot_id: Some(lot.id),
            spot_id: Some(spot.id),
            lot_name: lot.name.clone(),
            lot_address: lot.address.clone(),
            spot_number: spot.number,
            vehicle: None,
            held_at,
            start_time: None,
            end_time: None,
            cost: None,
            billed_rate: None,
        })
    }

    /// Persistence view of the reservation.
    pub fn record(&self) -> &ReservationRecord {
        &self.0
    }

    /// Identifier.
    pub fn id(&self) -> ReservationId {
        self.0.id
    }

    /// Owning user.
    pub fn user_id(&self) -> UserId {
        self.0.user_id
    }

    /// Lot, unless it has since been deleted.
    pub fn lot_id(&self) -> Option<LotId> {
        self.0.lot_id
    }

    /// Spot, unless it has since been deleted.
    pub fn spot_id(&self) -> Option<SpotId> {
        self.0.spot_id
    }

    /// Spot number at the time of the claim.
    pub fn spot_number(&self) -> SpotNumber {
        self.0.spot_number
    }

    /// Lot name at the time of the claim.
    pub fn lot_name(&self) -> &LotName {
        &self.0.lot_name
    }

    /// Lot address at the time of the claim.
    pub fn lot_address(&self) -> &Address {
        &self.0.lot_address
    }

    /// Confirmed vehicle, if any.
    pub fn vehicle(&self) -> Option<&VehicleNumber> {
        self.0.vehicle.as_ref()
    }

    /// When the spot was claimed.
    pub fn held_at(&self) -> DateTime<Utc> {
        self.0.held_at
    }

    /// When billing started.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.0.start_time
    }

    /// When the reservation closed.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.0.end_time
    }

    /// Final cost once released.
    pub fn cost(&self) -> Option<Money> {
        self.0.cost
    }

    /// Hourly rate applied at release.
    pub fn billed_rate(&self) -> Option<Money> {
        self.0.billed_rate
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ReservationState {
        match (self.0.end_time, self.0.start_time) {
            (Some(_), _) => ReservationState::Released,
            (None, Some(_)) => ReservationState::Active,
            (None, None) => ReservationState::Held,
        }
    }

    /// Whether the reservation still occupies its spot.
    pub fn is_open(&self) -> bool {
        self.0.end_time.is_none()
    }

    /// Whether this is an unconfirmed hold older than the policy allows.
    pub fn hold_expired(&self, now: DateTime<Utc>, policy: HoldPolicy) -> bool {
        self.state() == ReservationState::Held && self.0.held_at < policy.stale_before(now)
    }

    /// Attach the vehicle and start the billing clock if it is not running.
    ///
    /// Confirming an Active reservation again only replaces the vehicle.
    pub fn confirm(
        &self,
        vehicle: VehicleNumber,
        now: DateTime<Utc>,
        policy: HoldPolicy,
    ) -> Result<Self, TransitionError> {
        if !self.is_open() {
            return Err(TransitionError::AlreadyCompleted);
        }
        if self.hold_expired(now, policy) {
            return Err(TransitionError::HoldExpired);
        }
        Ok(Self(ReservationRecord {
            vehicle: Some(vehicle),
            start_time: self.0.start_time.or(Some(now)),
            ..self.0.clone()
        }))
    }

    /// Close the reservation, billing elapsed time at `rate`.
    ///
    /// A hold that never started its clock closes at zero cost.
    pub fn release(&self, now: DateTime<Utc>, rate: Money) -> Result<Self, TransitionError> {
        if !self.is_open() {
            return Err(TransitionError::AlreadyCompleted);
        }
        let cost = self
            .0
            .start_time
            .map_or(Money::ZERO, |start| rate.charge_for(now - start));
        Ok(Self(ReservationRecord {
            end_time: Some(now),
            cost: Some(cost),
            billed_rate: Some(rate),
            ..self.0.clone()
        }))
    }

    /// Close a stale hold without charge.
    pub fn expire(&self, now: DateTime<Utc>) -> Self {
        Self(ReservationRecord {
            end_time: Some(now),
            cost: Some(Money::ZERO),
            billed_rate: Some(Money::ZERO),
            ..self.0.clone()
        })
    }

    /// Cost so far for an Active reservation, without mutating it.
    pub fn live_estimate(&self, now: DateTime<Utc>, rate: Money) -> Option<Money> {
        match self.state() {
            ReservationState::Active => self.0.start_time.map(|start| rate.charge_for(now - start)),
            ReservationState::Held | ReservationState::Released => None,
        }
    }

    /// Billed duration of a released reservation that was confirmed.
    pub fn billed_duration(&self) -> Option<TimeDelta> {
        match (self.0.start_time, self.0.end_time) {
            (Some(start), Some(end)) => Some((end - start).max(TimeDelta::zero())),
            _ => None,
        }
    }
}
