//! Driving port for account use-cases.
//!
//! Inbound adapters call this port to register, authenticate, and manage
//! accounts without importing persistence, hashing, or token concerns.

use async_trait::async_trait;

use crate::domain::{Error, Identity, LoginCredentials, Password, Registration, User};

use super::IssuedToken;

/// A signed-in account with its bearer token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: IssuedToken,
}

#[async_trait]
pub trait Accounts: Send + Sync {
    /// Create a `user` account and sign it in.
    async fn register(&self, registration: Registration) -> Result<AuthSession, Error>;

    /// Verify credentials and sign the account in.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, Error>;

    /// Replace the caller's password. Admin only.
    async fn change_password(&self, caller: &Identity, password: &Password) -> Result<(), Error>;

    /// Non-admin accounts. Admin only.
    async fn list_customers(&self, caller: &Identity) -> Result<Vec<User>, Error>;
}
