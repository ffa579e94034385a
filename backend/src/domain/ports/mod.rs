//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, notifier, tokens, hashing) describe what the
//! domain needs from infrastructure; each exposes a typed error generated by
//! [`define_port_error!`]. Driving ports (accounts, lot registry, reservation
//! lifecycle, billing reports) are what inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod access_tokens;
mod accounts;
mod billing_reports;
mod lot_registry;
mod lot_repository;
mod notifier;
mod password_hasher;
mod reservation_lifecycle;
mod reservation_repository;
mod user_repository;

#[cfg(test)]
pub use access_tokens::MockAccessTokens;
pub use access_tokens::{AccessTokenError, AccessTokens, IssuedToken};
pub use accounts::{Accounts, AuthSession};
pub use billing_reports::BillingReports;
pub use lot_registry::{LotRegistry, SpotDetail};
#[cfg(test)]
pub use lot_repository::MockLotRepository;
pub use lot_repository::{LotPersistenceError, LotRepository, RemovalOutcome};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{NoOpNotifier, Notification, NotificationKind, Notifier, NotifierError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHashingError};
pub use reservation_lifecycle::ReservationLifecycle;
#[cfg(test)]
pub use reservation_repository::MockReservationRepository;
pub use reservation_repository::{
    ClaimOutcome, ClaimRequest, ReservationPersistenceError, ReservationRepository,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserPersistenceError, UserRepository};
