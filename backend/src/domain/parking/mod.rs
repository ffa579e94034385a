//! Parking lots, spots, reservations, and the arithmetic that bills them.
//!
//! Everything here is pure: state transitions return new values and never
//! touch storage. Services in the parent module orchestrate persistence and
//! notifications around these types.

/// Raised when an identifier is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} id must be a valid UUID")]
pub struct InvalidIdentifier {
    kind: &'static str,
}

// Child modules see this through textual scope; keep it above their `mod` items.
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Parse an identifier from its textual form.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, $crate::domain::parking::InvalidIdentifier> {
                ::uuid::Uuid::parse_str(raw.as_ref())
                    .map(Self)
                    .map_err(|_| $crate::domain::parking::InvalidIdentifier { kind: $kind })
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

mod lot;
mod money;
mod reservation;
mod spot;

pub use lot::{
    LOT_NAME_MAX, LotChanges, LotDraft, LotId, LotName, LotValidationError, LotWithSpots,
    ParkingLot, SPOT_COUNT_MAX, SpotCount,
};
pub use money::{Accrual, MONEY_MAJOR_MAX, Money, MoneyError};
pub use reservation::{
    HoldPolicy, Reservation, ReservationId, ReservationRecord, ReservationState,
    TransitionError, VEHICLE_NUMBER_MAX, VehicleNumber, VehicleNumberError,
};
pub use spot::{ParkingSpot, SpotId, SpotNumber, SpotNumberError};
