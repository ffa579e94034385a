//! Bearer-token extractors resolving the caller's verified identity.
//!
//! Handlers name the role they need in their signature: [`UserIdentity`]
//! for driver endpoints, [`AdminIdentity`] for lot administration. A valid
//! token with the wrong role is `forbidden`.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::ports::AccessTokenError;
use crate::domain::{Error, Identity};
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// A verified caller holding the user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIdentity(pub Identity);

/// A verified caller holding the admin role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminIdentity(pub Identity);

fn bearer_token(req: &HttpRequest) -> Result<&str, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("authorization header must use the Bearer scheme"))
}

fn resolve_identity(req: &HttpRequest) -> Result<Identity, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))?;
    let token = bearer_token(req)?;
    state.tokens.verify(token).map_err(|error| {
        debug!(%error, "bearer token rejected");
        match error {
            AccessTokenError::Expired => Error::unauthorized("token has expired"),
            _ => Error::unauthorized("invalid token"),
        }
    })
}

impl FromRequest for UserIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve_identity(req).and_then(|identity| {
            identity.require_user()?;
            Ok(Self(identity))
        }))
    }
}

impl FromRequest for AdminIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve_identity(req).and_then(|identity| {
            identity.require_admin()?;
            Ok(Self(identity))
        }))
    }
}
