//! Credential adapters: bearer tokens and password hashing.

mod argon2_hasher;
mod jwt_tokens;

pub use argon2_hasher::Argon2PasswordHasher;
pub use jwt_tokens::{DEFAULT_TOKEN_TTL_SECS, JwtAccessTokens};
