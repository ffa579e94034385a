//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use serde_json::Value;

use crate::domain::Identity;
use crate::domain::ports::{AccessTokenError, AccessTokens, IssuedToken};
use crate::inbound::http::configure;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::test_support::{MemoryStack, march};

/// Token verifier that maps every token to one fixed identity.
pub struct StubTokens {
    identity: Option<Identity>,
}

impl StubTokens {
    /// Accept any token as `identity`, or reject all tokens when `None`.
    pub fn accepting(identity: Option<Identity>) -> Self {
        Self { identity }
    }
}

impl AccessTokens for StubTokens {
    fn issue(&self, _identity: &Identity) -> Result<IssuedToken, AccessTokenError> {
        Err(AccessTokenError::issue("stub tokens cannot sign"))
    }

    fn verify(&self, _token: &str) -> Result<Identity, AccessTokenError> {
        self.identity
            .ok_or_else(|| AccessTokenError::invalid("stub rejects every token"))
    }
}

/// In-memory HTTP state whose token verification is replaced by `tokens`.
pub fn state_with_tokens(tokens: impl AccessTokens + 'static) -> HttpState {
    let stack = MemoryStack::new(march(14, 9, 0));
    let HttpState {
        accounts,
        lots,
        reservations,
        reports,
        tokens: _,
    } = stack.state;
    HttpState::new(HttpStatePorts {
        accounts,
        lots,
        reservations,
        reports,
        tokens: Arc::new(tokens),
    })
}

/// Application exposing every API route over `state`.
pub fn stack_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .configure(configure)
}

/// `Authorization` header value for `token`.
pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (
        actix_web::http::header::AUTHORIZATION,
        format!("Bearer {token}"),
    )
}

/// Send one request through a fresh app over `stack` and decode the JSON body.
///
/// An empty body decodes to `Value::Null`.
pub async fn send(stack: &MemoryStack, request: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(stack_app(stack.state.clone())).await;
    let response = actix_test::call_service(&app, request.to_request()).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    if body.is_empty() {
        return (status, Value::Null);
    }
    let value = serde_json::from_slice(&body).expect("response body is JSON");
    (status, value)
}
