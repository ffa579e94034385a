//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer (accounts, lot
//!   administration, parking, reports, health)
//! - **Schemas**: request and response bodies plus the domain [`Error`]
//! - **Security**: bearer token authentication scheme
//!
//! The generated document is served by Swagger UI in debug builds.
//!
//! [`Error`]: crate::domain::Error

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::{accounts, admin, admin_lots, parking_dto, user_parking, user_reports};

/// Name of the bearer security scheme in the generated document.
pub const BEARER_SCHEME: &str = "BearerAuth";

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let scheme = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .description(Some("Access token issued by POST /register or POST /login."))
            .build();
        components.add_security_scheme(BEARER_SCHEME, SecurityScheme::Http(scheme));
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Parking backend API",
        description = "Parking lot administration, spot reservations, and billing reports.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::admin_lots::create_lot,
        crate::inbound::http::admin_lots::update_lot,
        crate::inbound::http::admin_lots::delete_lot,
        crate::inbound::http::admin_lots::add_spot,
        crate::inbound::http::admin_lots::spot_detail,
        crate::inbound::http::admin_lots::renumber_spot,
        crate::inbound::http::admin_lots::remove_spot,
        crate::inbound::http::admin::dashboard,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::admin::update_profile,
        crate::inbound::http::user_parking::list_lots,
        crate::inbound::http::user_parking::assign,
        crate::inbound::http::user_parking::confirm,
        crate::inbound::http::user_parking::release,
        crate::inbound::http::user_reports::dashboard,
        crate::inbound::http::user_reports::summary,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        accounts::RegisterRequest,
        accounts::LoginRequest,
        accounts::SessionResponse,
        admin_lots::CreateLotRequest,
        admin_lots::UpdateLotRequest,
        admin_lots::SpotNumberRequest,
        admin_lots::LotCreatedResponse,
        admin_lots::LotUpdatedResponse,
        admin_lots::SpotResponse,
        admin_lots::SpotDetailResponse,
        admin::AdminDashboardResponse,
        admin::LotRevenueView,
        admin::UsersResponse,
        admin::ChangePasswordRequest,
        parking_dto::MessageResponse,
        parking_dto::LotView,
        parking_dto::SpotView,
        parking_dto::LotWithSpotsView,
        parking_dto::LotAvailabilityView,
        parking_dto::ReservationView,
        parking_dto::UserView,
        user_parking::AssignRequest,
        user_parking::ConfirmRequest,
        user_parking::ReleaseRequest,
        user_parking::ReservationResponse,
        user_parking::ReleaseResponse,
        user_reports::UserDashboardResponse,
        user_reports::MonthlyUsageView,
    )),
    tags(
        (name = "accounts", description = "Registration and sign-in"),
        (name = "admin", description = "Lot administration and admin reports"),
        (name = "parking", description = "Browsing lots and managing reservations"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
