//! Admin dashboard, customer listing, and profile handlers.
//!
//! ```text
//! GET /admin/dashboard
//! GET /admin/users
//! PUT /admin/profile {"password":"new-secret"}
//! ```

use actix_web::{get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AdminDashboard, Error, LotRevenue, Password};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::AdminIdentity;
use crate::inbound::http::parking_dto::{LotWithSpotsView, MessageResponse, UserView};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::credentials_error;

/// Running revenue of one lot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotRevenueView {
    pub lot_id: String,
    pub lot_name: String,
    #[schema(example = 120.5)]
    pub revenue: f64,
}

impl From<&LotRevenue> for LotRevenueView {
    fn from(entry: &LotRevenue) -> Self {
        Self {
            lot_id: entry.lot_id.to_string(),
            lot_name: entry.lot_name.to_string(),
            revenue: entry.revenue.as_major_units(),
        }
    }
}

/// Body of `GET /admin/dashboard`.
///
/// Spot totals and `lots` cover the caller's own lots; `revenue` covers
/// every lot in the system.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminDashboardResponse {
    pub admin: UserView,
    pub total_lots: usize,
    pub total_spots: usize,
    pub available_spots: usize,
    pub reserved_spots: usize,
    pub lots: Vec<LotWithSpotsView>,
    pub revenue: Vec<LotRevenueView>,
}

impl From<&AdminDashboard> for AdminDashboardResponse {
    fn from(view: &AdminDashboard) -> Self {
        Self {
            admin: UserView::from(&view.admin),
            total_lots: view.total_lots(),
            total_spots: view.total_spots(),
            available_spots: view.available_spots(),
            reserved_spots: view.reserved_spots(),
            lots: view.lots.iter().map(LotWithSpotsView::from).collect(),
            revenue: view.revenue.iter().map(LotRevenueView::from).collect(),
        }
    }
}

/// Body of `GET /admin/users`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<UserView>,
}

/// Request body for `PUT /admin/profile`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub password: String,
}

/// Occupancy of the caller's lots and live revenue across all lots.
#[utoipa::path(
    get,
    path = "/admin/dashboard",
    responses(
        (status = 200, description = "Admin dashboard", body = AdminDashboardResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminDashboard"
)]
#[get("/admin/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    AdminIdentity(admin): AdminIdentity,
) -> ApiResult<web::Json<AdminDashboardResponse>> {
    let overview = state.reports.admin_dashboard(&admin).await?;
    Ok(web::Json(AdminDashboardResponse::from(&overview)))
}

/// Every non-admin account.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "Registered drivers", body = UsersResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["admin"],
    operation_id = "listCustomers"
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    AdminIdentity(admin): AdminIdentity,
) -> ApiResult<web::Json<UsersResponse>> {
    let users = state.accounts.list_customers(&admin).await?;
    Ok(web::Json(UsersResponse {
        users: users.iter().map(UserView::from).collect(),
    }))
}

/// Replace the calling admin's password.
#[utoipa::path(
    put,
    path = "/admin/profile",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["admin"],
    operation_id = "changeAdminPassword"
)]
#[put("/admin/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    AdminIdentity(admin): AdminIdentity,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let password = Password::new(&payload.password).map_err(credentials_error)?;
    state.accounts.change_password(&admin, &password).await?;
    Ok(web::Json(MessageResponse::new("Password updated")))
}
