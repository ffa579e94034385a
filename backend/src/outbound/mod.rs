//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: a mutex-guarded store used without a database and in tests
//! - **security**: Argon2 password hashing and JWT access tokens
//! - **notifications**: a bounded queue drained by a background worker
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod memory;
pub mod notifications;
pub mod persistence;
pub mod security;
