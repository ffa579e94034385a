//! Port for issuing and verifying bearer access tokens.

use crate::domain::Identity;

use super::define_port_error;

define_port_error! {
    /// Errors raised by token adapters.
    pub enum AccessTokenError {
        /// The token is malformed, tampered with, or names an unknown role.
        Invalid { message: String } => "access token rejected: {message}",
        /// The token is past its expiry.
        Expired => "access token has expired",
        /// Signing a new token failed.
        Issue { message: String } => "failed to issue access token: {message}",
    }
}

/// A freshly signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in_secs: u64,
}

#[cfg_attr(test, mockall::automock)]
pub trait AccessTokens: Send + Sync {
    /// Sign a token carrying `identity`.
    fn issue(&self, identity: &Identity) -> Result<IssuedToken, AccessTokenError>;

    /// Verify a token and recover the identity it carries.
    fn verify(&self, token: &str) -> Result<Identity, AccessTokenError>;
}
