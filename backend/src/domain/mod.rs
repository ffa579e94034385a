//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed parking entities used by the API and
//! persistence layers, and the services that orchestrate them through the
//! ports in [`ports`]. Types stay immutable; transitions return new values.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User, Identity, Role: accounts and the verified caller.
//! - ParkingLot, ParkingSpot, Reservation: the parking aggregate.
//! - AccountService, LotRegistryService, ReservationService,
//!   BillingService: driving-port implementations.

pub mod account_service;
pub mod auth;
pub mod billing;
pub mod billing_service;
pub mod error;
pub mod location;
pub mod lot_registry_service;
pub mod parking;
pub mod ports;
pub mod reservation_service;
pub mod trace_id;
pub mod user;

pub use self::account_service::{AccountService, AdminSeed, AdminSeedOutcome};
pub use self::auth::{
    CredentialValidationError, Identity, LoginCredentials, PASSWORD_MAX, Password, PasswordHash,
    Registration, RegistrationParts, RegistrationValidationError, Role, UnknownRole,
};
pub use self::billing::{
    AdminDashboard, LotRevenue, MonthlyLotUsage, UserDashboard, live_revenue, month_start,
    summarise_month,
};
pub use self::billing_service::BillingService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::location::{ADDRESS_MAX, Address, LocationValidationError, Pincode};
pub use self::lot_registry_service::LotRegistryService;
pub use self::parking::{
    Accrual, HoldPolicy, InvalidIdentifier, LOT_NAME_MAX, LotChanges, LotDraft, LotId, LotName,
    LotValidationError, LotWithSpots, MONEY_MAJOR_MAX, Money, MoneyError, ParkingLot, ParkingSpot,
    Reservation, ReservationId, ReservationRecord, ReservationState, SPOT_COUNT_MAX, SpotCount,
    SpotId, SpotNumber, SpotNumberError, TransitionError, VEHICLE_NUMBER_MAX, VehicleNumber,
    VehicleNumberError,
};
pub use self::reservation_service::{ReservationPorts, ReservationService};
pub use self::trace_id::TraceId;
pub use self::user::{
    EMAIL_MAX, EmailAddress, FULL_NAME_MAX, FullName, User, UserDraft, UserId, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use parking_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
