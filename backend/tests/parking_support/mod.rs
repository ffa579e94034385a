//! Helpers shared by the parking integration suites.

use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, HeaderName};
use actix_web::{App, test, web};
use serde_json::Value;

use parking_backend::Trace;
use parking_backend::domain::TRACE_ID_HEADER;
use parking_backend::inbound::http::configure;
use parking_backend::test_support::MemoryStack;

/// Authorisation header carrying `token`.
pub fn bearer(token: &str) -> (HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// Run one request against a fresh app over the stack's shared state.
///
/// Returns the status, the decoded body (`Null` when empty), and whether
/// the trace middleware stamped the response.
pub async fn call(stack: &MemoryStack, request: test::TestRequest) -> (StatusCode, Value, bool) {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(stack.state.clone()))
            .wrap(Trace)
            .configure(configure),
    )
    .await;
    let response = test::call_service(&app, request.to_request()).await;
    let status = response.status();
    let traced = response.headers().contains_key(TRACE_ID_HEADER);
    let bytes = test::read_body(response).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is JSON")
    };
    (status, body, traced)
}

