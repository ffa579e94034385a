//! HS256 bearer tokens backed by `jsonwebtoken`.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::{AccessTokenError, AccessTokens, IssuedToken};
use crate::domain::{Identity, Role, UserId};

/// Default token lifetime in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
    jti: String,
}

/// Signs and verifies access tokens with a shared secret.
pub struct JwtAccessTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtAccessTokens {
    /// Build a token service for `secret` issuing tokens valid for `ttl`.
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        // Expiry is checked against the injected clock in `verify`.
        validation.validate_exp = false;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            clock,
        }
    }
}

impl AccessTokens for JwtAccessTokens {
    fn issue(&self, identity: &Identity) -> Result<IssuedToken, AccessTokenError> {
        let issued_at = self.clock.utc().timestamp();
        let ttl_secs = i64::try_from(self.ttl.as_secs())
            .map_err(|_| AccessTokenError::issue("token lifetime out of range"))?;
        let claims = Claims {
            sub: identity.user_id().to_string(),
            role: identity.role().as_str().to_owned(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|error| AccessTokenError::issue(error.to_string()))?;
        Ok(IssuedToken {
            token,
            expires_in_secs: self.ttl.as_secs(),
        })
    }

    fn verify(&self, token: &str) -> Result<Identity, AccessTokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|error| {
            match error.kind() {
                ErrorKind::ExpiredSignature => AccessTokenError::expired(),
                _ => AccessTokenError::invalid(error.to_string()),
            }
        })?;
        if data.claims.exp <= self.clock.utc().timestamp() {
            return Err(AccessTokenError::expired());
        }
        let user_id = UserId::new(&data.claims.sub)
            .map_err(|error| AccessTokenError::invalid(error.to_string()))?;
        let role = data
            .claims
            .role
            .parse::<Role>()
            .map_err(|error| AccessTokenError::invalid(error.to_string()))?;
        Ok(Identity::new(user_id, role))
    }
}
