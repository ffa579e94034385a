//! Registration and sign-in handlers.
//!
//! ```text
//! POST /register {"full_name":"Ada","email":"ada@example.com","password":"pw","address":"1 Main St","pincode":"560001"}
//! POST /login {"email":"ada@example.com","password":"pw"}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::AuthSession;
use crate::domain::{Error, LoginCredentials, Registration, RegistrationParts};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{credentials_error, registration_error};

/// Registration request body for `POST /register`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[serde(alias = "fullname")]
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub pincode: String,
}

/// Login request body for `POST /login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Bearer token issued on registration or login.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionResponse {
    #[schema(example = "Login successful")]
    pub message: String,
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    pub expires_in: u64,
    pub email: String,
    #[schema(example = "user")]
    pub role: String,
}

impl SessionResponse {
    fn new(message: &str, session: AuthSession) -> Self {
        Self {
            message: message.to_owned(),
            access_token: session.token.token,
            token_type: "Bearer".to_owned(),
            expires_in: session.token.expires_in_secs,
            email: session.user.email().to_string(),
            role: session.user.role().to_string(),
        }
    }
}

/// Create a `user` account and sign it in.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let registration = Registration::try_from_parts(RegistrationParts {
        full_name: &payload.full_name,
        email: &payload.email,
        password: &payload.password,
        address: &payload.address,
        pincode: &payload.pincode,
    })
    .map_err(registration_error)?;
    let session = state.accounts.register(registration).await?;
    Ok(HttpResponse::Created().json(SessionResponse::new("User registered successfully", session)))
}

/// Verify credentials and issue a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = SessionResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<SessionResponse>> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(credentials_error)?;
    let session = state.accounts.login(&credentials).await?;
    Ok(web::Json(SessionResponse::new("Login successful", session)))
}
