//! Authentication primitives: roles, verified identities, and credentials.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;
use std::str::FromStr;

use zeroize::Zeroizing;

use crate::domain::{
    Address, EmailAddress, Error, FullName, LocationValidationError, Pincode, UserId,
    UserValidationError,
};

/// Maximum accepted password length, bounding hashing cost.
pub const PASSWORD_MAX: usize = 128;

/// Account role. Admins manage lots; users reserve spots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Lot operator.
    Admin,
    /// Parking customer.
    User,
}

impl Role {
    /// Stable lower-case name used in tokens and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or presented role name is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// Verified caller identity resolved from a bearer credential.
///
/// # Examples
/// ```
/// use parking_backend::domain::{Identity, Role, UserId};
///
/// let admin = Identity::new(UserId::random(), Role::Admin);
/// assert!(admin.require_admin().is_ok());
/// let user = Identity::new(UserId::random(), Role::User);
/// assert!(user.require_admin().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    user_id: UserId,
    role: Role,
}

impl Identity {
    /// Pair a user id with its role.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Authenticated user id.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Authenticated role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Succeed only for admins; everyone else gets `403 Forbidden`.
    pub fn require_admin(&self) -> Result<(), Error> {
        match self.role {
            Role::Admin => Ok(()),
            Role::User => Err(Error::forbidden("admin role required")),
        }
    }

    /// Reject admins; parking and personal reports are for drivers.
    pub fn require_user(&self) -> Result<(), Error> {
        match self.role {
            Role::User => Ok(()),
            Role::Admin => Err(Error::forbidden("user role required")),
        }
    }
}

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialValidationError {
    /// The email was malformed.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// The password was empty.
    #[error("password must not be empty")]
    EmptyPassword,
    /// The password exceeded [`PASSWORD_MAX`] characters.
    #[error("password must be at most {max} characters")]
    PasswordTooLong { max: usize },
}

/// Plain-text password held in zeroizing memory.
///
/// Whitespace is preserved so credential comparisons are not surprising.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate a password.
    pub fn new(raw: &str) -> Result<Self, CredentialValidationError> {
        if raw.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        if raw.chars().count() > PASSWORD_MAX {
            return Err(CredentialValidationError::PasswordTooLong { max: PASSWORD_MAX });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Expose the password for hashing or verification.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(..)")
    }
}

/// Encoded password hash as produced by a [`crate::domain::ports::PasswordHasher`].
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash (PHC string format for argon2).
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Validated login credentials used by authentication services.
///
/// # Examples
/// ```
/// use parking_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Admin@Example.com", "admin123").unwrap();
/// assert_eq!(creds.email().as_ref(), "admin@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Password,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        let email = EmailAddress::new(email).map_err(|_| CredentialValidationError::InvalidEmail)?;
        let password = Password::new(password)?;
        Ok(Self { email, password })
    }

    /// Normalised email used for the account lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password supplied by the caller.
    pub fn password(&self) -> &Password {
        &self.password
    }
}

/// Field-level failure while validating a registration payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationValidationError {
    /// Name, email, or id problem.
    #[error(transparent)]
    User(#[from] UserValidationError),
    /// Address or pincode problem.
    #[error(transparent)]
    Location(#[from] LocationValidationError),
    /// Password problem.
    #[error(transparent)]
    Credentials(#[from] CredentialValidationError),
}

impl RegistrationValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::User(UserValidationError::InvalidEmail) => "email",
            Self::User(_) => "fullname",
            Self::Location(LocationValidationError::InvalidPincode) => "pincode",
            Self::Location(_) => "address",
            Self::Credentials(CredentialValidationError::InvalidEmail) => "email",
            Self::Credentials(_) => "password",
        }
    }
}

/// Validated self-service registration request. New accounts are always
/// plain users; admins only come from startup seeding.
#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: FullName,
    pub email: EmailAddress,
    pub password: Password,
    pub address: Address,
    pub pincode: Pincode,
}

/// Raw registration fields as received by an inbound adapter.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationParts<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub address: &'a str,
    pub pincode: &'a str,
}

impl Registration {
    /// Validate every field, reporting the first failure.
    pub fn try_from_parts(parts: RegistrationParts<'_>) -> Result<Self, RegistrationValidationError> {
        Ok(Self {
            full_name: FullName::new(parts.full_name)?,
            email: EmailAddress::new(parts.email)?,
            password: Password::new(parts.password)?,
            address: Address::new(parts.address)?,
            pincode: Pincode::new(parts.pincode)?,
        })
    }
}
