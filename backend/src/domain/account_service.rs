//! Account registration, sign-in, and admin seeding.
//!
//! Implements the [`Accounts`] driving port on top of the user repository,
//! the password hasher, and the token issuer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    AccessTokenError, AccessTokens, Accounts, AuthSession, PasswordHasher, PasswordHashingError,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    Address, EmailAddress, Error, FullName, Identity, LoginCredentials, Password, Pincode,
    Registration, Role, User, UserDraft, UserId,
};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Credentials and profile for the bootstrap admin account.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub full_name: FullName,
    pub email: EmailAddress,
    pub password: Password,
    pub address: Address,
    pub pincode: Pincode,
}

/// What [`AccountService::ensure_admin`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSeedOutcome {
    /// An admin already existed; nothing was written.
    AlreadyPresent,
    /// The seed admin was created.
    Created(UserId),
}

/// Account service implementing the [`Accounts`] driving port.
#[derive(Clone)]
pub struct AccountService<U, H, T> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<T>,
}

impl<U, H, T> AccountService<U, H, T> {
    /// Create a new service with the given adapters.
    pub fn new(users: Arc<U>, hasher: Arc<H>, tokens: Arc<T>) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }
}

impl<U, H, T> AccountService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher,
    T: AccessTokens,
{
    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateEmail { .. } => Error::conflict("email already registered")
                .with_details(json!({ "field": "email", "code": "duplicate_email" })),
        }
    }

    fn map_hashing_error(error: PasswordHashingError) -> Error {
        Error::internal(error.to_string())
    }

    fn map_token_error(error: AccessTokenError) -> Error {
        Error::internal(error.to_string())
    }

    fn sign_in(&self, user: User) -> Result<AuthSession, Error> {
        let token = self
            .tokens
            .issue(&Identity::new(user.id(), user.role()))
            .map_err(Self::map_token_error)?;
        Ok(AuthSession { user, token })
    }

    /// Make sure at least one admin account exists.
    ///
    /// Safe to run on every start and from several processes at once: an
    /// existing admin, or a concurrent insert of the same seed email, both
    /// count as already present.
    pub async fn ensure_admin(&self, seed: AdminSeed) -> Result<AdminSeedOutcome, Error> {
        if self
            .users
            .role_exists(Role::Admin)
            .await
            .map_err(Self::map_user_error)?
        {
            return Ok(AdminSeedOutcome::AlreadyPresent);
        }

        let hash = self
            .hasher
            .hash(&seed.password)
            .map_err(Self::map_hashing_error)?;
        let admin = User::new(UserDraft {
            id: UserId::random(),
            full_name: seed.full_name,
            email: seed.email,
            address: seed.address,
            pincode: seed.pincode,
            role: Role::Admin,
        });

        match self.users.insert(&admin, &hash).await {
            Ok(()) => {
                info!(user_id = %admin.id(), email = %admin.email(), "seeded admin account");
                Ok(AdminSeedOutcome::Created(admin.id()))
            }
            Err(UserPersistenceError::DuplicateEmail { .. }) => Ok(AdminSeedOutcome::AlreadyPresent),
            Err(error) => Err(Self::map_user_error(error)),
        }
    }
}

#[async_trait]
impl<U, H, T> Accounts for AccountService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher,
    T: AccessTokens,
{
    async fn register(&self, registration: Registration) -> Result<AuthSession, Error> {
        let Registration {
            full_name,
            email,
            password,
            address,
            pincode,
        } = registration;
        let hash = self
            .hasher
            .hash(&password)
            .map_err(Self::map_hashing_error)?;
        let user = User::new(UserDraft {
            id: UserId::random(),
            full_name,
            email,
            address,
            pincode,
            role: Role::User,
        });

        self.users
            .insert(&user, &hash)
            .await
            .map_err(Self::map_user_error)?;
        info!(user_id = %user.id(), "registered account");
        self.sign_in(user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, Error> {
        let Some(stored) = self
            .users
            .find_credentials(credentials.email())
            .await
            .map_err(Self::map_user_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let matches = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
            .map_err(Self::map_hashing_error)?;
        if !matches {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        self.sign_in(stored.user)
    }

    async fn change_password(&self, caller: &Identity, password: &Password) -> Result<(), Error> {
        caller.require_admin()?;
        let hash = self
            .hasher
            .hash(password)
            .map_err(Self::map_hashing_error)?;
        let updated = self
            .users
            .update_password_hash(&caller.user_id(), &hash)
            .await
            .map_err(Self::map_user_error)?;
        if !updated {
            return Err(Error::not_found("account not found"));
        }
        info!(user_id = %caller.user_id(), "admin password changed");
        Ok(())
    }

    async fn list_customers(&self, caller: &Identity) -> Result<Vec<User>, Error> {
        caller.require_admin()?;
        self.users
            .list_by_role(Role::User)
            .await
            .map_err(Self::map_user_error)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
