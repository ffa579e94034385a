//! Driver-facing lot browsing and the reservation lifecycle.
//!
//! ```text
//! GET  /user/lots
//! POST /user/assign  {"lot_id":"..."}
//! POST /user/reserve {"reservation_id":"...","vehicle_number":"KA01AB1234"}
//! POST /user/release {"reservation_id":"..."}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Reservation, VehicleNumber};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::UserIdentity;
use crate::inbound::http::parking_dto::{LotAvailabilityView, ReservationView};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_lot_id, parse_reservation_id, vehicle_number_error,
};

const LOT_ID: FieldName = FieldName::new("lot_id");
const RESERVATION_ID: FieldName = FieldName::new("reservation_id");

/// Request body for `POST /user/assign`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AssignRequest {
    pub lot_id: String,
}

/// Request body for `POST /user/reserve`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ConfirmRequest {
    pub reservation_id: String,
    #[serde(alias = "vehicle_no")]
    #[schema(example = "KA01AB1234")]
    pub vehicle_number: String,
}

/// Request body for `POST /user/release`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReleaseRequest {
    pub reservation_id: String,
}

/// A reservation after an assign or confirm.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationResponse {
    pub message: String,
    pub reservation: ReservationView,
}

impl ReservationResponse {
    fn new(message: &str, reservation: &Reservation) -> Self {
        Self {
            message: message.to_owned(),
            reservation: ReservationView::from(reservation),
        }
    }
}

/// A released reservation with its billed duration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReleaseResponse {
    pub message: String,
    pub reservation: ReservationView,
    #[schema(example = 90.0)]
    pub duration_minutes: f64,
    #[schema(example = 30.0)]
    pub cost: f64,
}

impl From<&Reservation> for ReleaseResponse {
    fn from(reservation: &Reservation) -> Self {
        let duration_minutes = reservation
            .billed_duration()
            .map(|elapsed| elapsed.num_seconds() as f64 / 60.0)
            .unwrap_or_default();
        Self {
            message: "Spot released".to_owned(),
            reservation: ReservationView::from(reservation),
            duration_minutes,
            cost: reservation
                .cost()
                .map(|cost| cost.as_major_units())
                .unwrap_or_default(),
        }
    }
}

/// Browse every lot with its availability.
#[utoipa::path(
    get,
    path = "/user/lots",
    responses(
        (status = 200, description = "Lots with availability", body = [LotAvailabilityView]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["parking"],
    operation_id = "listLots"
)]
#[get("/user/lots")]
pub async fn list_lots(
    state: web::Data<HttpState>,
    _caller: UserIdentity,
) -> ApiResult<web::Json<Vec<LotAvailabilityView>>> {
    let lots = state.lots.list_lots().await?;
    Ok(web::Json(
        lots.iter().map(LotAvailabilityView::from).collect(),
    ))
}

/// Hold the lowest-numbered free spot in a lot.
#[utoipa::path(
    post,
    path = "/user/assign",
    request_body = AssignRequest,
    responses(
        (status = 201, description = "Spot held", body = ReservationResponse),
        (status = 400, description = "Invalid request or lot full", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Lot not found", body = Error)
    ),
    tags = ["parking"],
    operation_id = "assignSpot"
)]
#[post("/user/assign")]
pub async fn assign(
    state: web::Data<HttpState>,
    UserIdentity(caller): UserIdentity,
    payload: web::Json<AssignRequest>,
) -> ApiResult<HttpResponse> {
    let lot_id = parse_lot_id(LOT_ID, &payload.lot_id)?;
    let reservation = state.reservations.assign(&caller, &lot_id).await?;
    Ok(HttpResponse::Created().json(ReservationResponse::new("Spot assigned", &reservation)))
}

/// Attach a vehicle to a held spot and start billing.
#[utoipa::path(
    post,
    path = "/user/reserve",
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Booking confirmed", body = ReservationResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Reservation not found", body = Error),
        (status = 409, description = "Reservation completed or hold expired", body = Error)
    ),
    tags = ["parking"],
    operation_id = "confirmReservation"
)]
#[post("/user/reserve")]
pub async fn confirm(
    state: web::Data<HttpState>,
    UserIdentity(caller): UserIdentity,
    payload: web::Json<ConfirmRequest>,
) -> ApiResult<web::Json<ReservationResponse>> {
    let reservation_id = parse_reservation_id(RESERVATION_ID, &payload.reservation_id)?;
    let vehicle = VehicleNumber::new(&payload.vehicle_number).map_err(vehicle_number_error)?;
    let reservation = state
        .reservations
        .confirm(&caller, &reservation_id, vehicle)
        .await?;
    Ok(web::Json(ReservationResponse::new(
        "Booking confirmed",
        &reservation,
    )))
}

/// Release a spot and bill the stay.
#[utoipa::path(
    post,
    path = "/user/release",
    request_body = ReleaseRequest,
    responses(
        (status = 200, description = "Spot released", body = ReleaseResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Reservation not found", body = Error),
        (status = 409, description = "Reservation already completed", body = Error)
    ),
    tags = ["parking"],
    operation_id = "releaseReservation"
)]
#[post("/user/release")]
pub async fn release(
    state: web::Data<HttpState>,
    UserIdentity(caller): UserIdentity,
    payload: web::Json<ReleaseRequest>,
) -> ApiResult<web::Json<ReleaseResponse>> {
    let reservation_id = parse_reservation_id(RESERVATION_ID, &payload.reservation_id)?;
    let reservation = state.reservations.release(&caller, &reservation_id).await?;
    Ok(web::Json(ReleaseResponse::from(&reservation)))
}

#[cfg(test)]
#[path = "user_parking_tests.rs"]
mod tests;
