//! User accounts and their validated profile fields.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

use crate::domain::{Address, Pincode, Role};

/// Maximum length of a full name.
pub const FULL_NAME_MAX: usize = 100;
/// Maximum length of an email address.
pub const EMAIL_MAX: usize = 254;

/// Validation errors returned by user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The identifier was blank.
    #[error("user id must not be empty")]
    EmptyId,
    /// The identifier was not a UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// The full name was blank.
    #[error("full name must not be empty")]
    EmptyFullName,
    /// The full name exceeded [`FULL_NAME_MAX`] characters.
    #[error("full name must be at most {max} characters")]
    FullNameTooLong { max: usize },
    /// The email address was malformed.
    #[error("email must be a valid address")]
    InvalidEmail,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from its textual form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Deliberately loose: one `@`, no whitespace, a dot in the domain.
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Normalised email address used as the login identifier.
///
/// ## Invariants
/// - Trimmed and lower-cased, so lookups are case-insensitive.
/// - At most [`EMAIL_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    ///
    /// # Examples
    /// ```
    /// use parking_backend::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new("  Ada@Example.COM ").unwrap();
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.chars().count() > EMAIL_MAX || !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human readable full name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    /// Validate and construct a [`FullName`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyFullName);
        }
        if trimmed.chars().count() > FULL_NAME_MAX {
            return Err(UserValidationError::FullNameTooLong { max: FULL_NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for FullName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application user.
///
/// The password hash is deliberately absent; it only travels between the
/// account service and the user repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    full_name: FullName,
    email: EmailAddress,
    address: Address,
    pincode: Pincode,
    role: Role,
}

/// Field bundle used to construct a [`User`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub id: UserId,
    pub full_name: FullName,
    pub email: EmailAddress,
    pub address: Address,
    pub pincode: Pincode,
    pub role: Role,
}

impl User {
    /// Build a user from validated parts.
    pub fn new(draft: UserDraft) -> Self {
        let UserDraft {
            id,
            full_name,
            email,
            address,
            pincode,
            role,
        } = draft;
        Self {
            id,
            full_name,
            email,
            address,
            pincode,
            role,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Full name as entered at registration.
    pub fn full_name(&self) -> &FullName {
        &self.full_name
    }

    /// Login email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Postal address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Postal code.
    pub fn pincode(&self) -> &Pincode {
        &self.pincode
    }

    /// Account role.
    pub fn role(&self) -> Role {
        self.role
    }
}
