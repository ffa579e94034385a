//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the user, lot, and
//! reservation repository ports backed by PostgreSQL via Diesel with async
//! support through `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. Pricing and state transitions stay in
//!   the domain.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leave this module.
//! - **Row locks for occupancy**: claims, releases, and deletions take row
//!   locks inside one transaction so a spot's `occupied` flag always matches
//!   its open reservation.
//!
//! # Example
//!
//! ```ignore
//! use parking_backend::outbound::persistence::{DbPool, PoolConfig, DieselLotRepository};
//!
//! let config = PoolConfig::new("postgres://localhost/parking");
//! let pool = DbPool::new(config).await?;
//! let lots = DieselLotRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_lot_repository;
mod diesel_reservation_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_lot_repository::DieselLotRepository;
pub use diesel_reservation_repository::DieselReservationRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_MAX_SIZE, DEFAULT_MIN_IDLE, DbPool, PoolConfig, PoolError,
};
