//! Postal address primitives shared by user profiles and parking lots.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Maximum length of a street address.
pub const ADDRESS_MAX: usize = 200;

/// Validation errors for address components.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationValidationError {
    /// The address was blank.
    #[error("address must not be empty")]
    EmptyAddress,
    /// The address exceeded [`ADDRESS_MAX`] characters.
    #[error("address must be at most {max} characters")]
    AddressTooLong { max: usize },
    /// The pincode was not 3 to 10 letters, digits, spaces or hyphens.
    #[error("pincode must be 3 to 10 letters, digits, spaces, or hyphens")]
    InvalidPincode,
}

/// Free-form street address, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address(String);

impl Address {
    /// Validate and construct an address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, LocationValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(LocationValidationError::EmptyAddress);
        }
        if trimmed.chars().count() > ADDRESS_MAX {
            return Err(LocationValidationError::AddressTooLong { max: ADDRESS_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static PINCODE_RE: OnceLock<Regex> = OnceLock::new();

fn pincode_regex() -> &'static Regex {
    PINCODE_RE.get_or_init(|| {
        Regex::new("^[A-Za-z0-9][A-Za-z0-9 -]{1,8}[A-Za-z0-9]$")
            .unwrap_or_else(|error| panic!("pincode regex failed to compile: {error}"))
    })
}

/// Postal code attached to an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pincode(String);

impl Pincode {
    /// Validate and construct a pincode.
    ///
    /// # Examples
    /// ```
    /// use parking_backend::domain::Pincode;
    ///
    /// assert!(Pincode::new("560001").is_ok());
    /// assert!(Pincode::new("!!").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, LocationValidationError> {
        let trimmed = raw.as_ref().trim();
        if !pincode_regex().is_match(trimmed) {
            return Err(LocationValidationError::InvalidPincode);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Pincode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
