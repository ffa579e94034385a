//! Lot and spot administration handlers.
//!
//! ```text
//! POST   /admin/lots {"name":"Central","address":"1 Main St","pincode":"560001","price_per_hour":20.0,"max_spots":10}
//! PUT    /admin/lots/{lot_id} {"price_per_hour":25.0}
//! DELETE /admin/lots/{lot_id}
//! POST   /admin/lots/{lot_id}/spots {"number":11}
//! GET    /admin/lots/{lot_id}/spots/{spot_id}
//! PUT    /admin/lots/{lot_id}/spots/{spot_id} {"number":12}
//! DELETE /admin/lots/{lot_id}/spots/{spot_id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::SpotDetail;
use crate::domain::{
    Address, Error, LotChanges, LotDraft, LotId, LotName, LotValidationError, Money, Pincode,
    SpotCount, SpotId, SpotNumber,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::AdminIdentity;
use crate::inbound::http::parking_dto::{LotView, LotWithSpotsView, MessageResponse, SpotView};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, empty_update_error, lot_error, parse_lot_id, parse_spot_id, spot_number_error,
};

const LOT_ID: FieldName = FieldName::new("lot_id");
const SPOT_ID: FieldName = FieldName::new("spot_id");

/// Request body for `POST /admin/lots`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateLotRequest {
    pub name: String,
    #[serde(alias = "location")]
    pub address: String,
    pub pincode: String,
    #[serde(alias = "price")]
    #[schema(example = 20.0)]
    pub price_per_hour: f64,
    #[serde(alias = "maxSpots")]
    #[schema(example = 10)]
    pub max_spots: i64,
}

impl TryFrom<CreateLotRequest> for LotDraft {
    type Error = LotValidationError;

    fn try_from(value: CreateLotRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: LotName::new(&value.name)?,
            address: Address::new(&value.address)?,
            pincode: Pincode::new(&value.pincode)?,
            price_per_hour: Money::from_major_units(value.price_per_hour)?,
            spot_count: SpotCount::new(value.max_spots)?,
        })
    }
}

/// Request body for `PUT /admin/lots/{lot_id}`. Omitted fields are kept.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateLotRequest {
    pub name: Option<String>,
    #[serde(alias = "location")]
    pub address: Option<String>,
    pub pincode: Option<String>,
    #[serde(alias = "price")]
    pub price_per_hour: Option<f64>,
}

impl TryFrom<UpdateLotRequest> for LotChanges {
    type Error = LotValidationError;

    fn try_from(value: UpdateLotRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value.name.map(LotName::new).transpose()?,
            address: value.address.map(Address::new).transpose()?,
            pincode: value.pincode.map(Pincode::new).transpose()?,
            price_per_hour: value
                .price_per_hour
                .map(Money::from_major_units)
                .transpose()?,
        })
    }
}

/// Request body carrying a spot number.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SpotNumberRequest {
    #[schema(example = 11)]
    pub number: i64,
}

impl SpotNumberRequest {
    fn spot_number(&self) -> Result<SpotNumber, Error> {
        SpotNumber::new(self.number).map_err(spot_number_error)
    }
}

/// Body of `POST /admin/lots`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotCreatedResponse {
    #[schema(example = "Lot created")]
    pub message: String,
    pub lot_id: String,
    pub lot: LotWithSpotsView,
}

/// Body of `PUT /admin/lots/{lot_id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotUpdatedResponse {
    pub message: String,
    pub lot: LotView,
}

/// Body of spot creation and renumbering.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpotResponse {
    pub message: String,
    pub spot: SpotView,
}

/// The reservation occupying a spot, with the running cost estimate.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpotDetailResponse {
    pub reservation_id: String,
    pub spot_id: String,
    pub spot_number: i32,
    pub customer_id: String,
    pub vehicle_number: Option<String>,
    pub held_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    #[schema(example = 40.0)]
    pub estimated_cost: f64,
}

impl From<SpotDetail> for SpotDetailResponse {
    fn from(detail: SpotDetail) -> Self {
        let SpotDetail {
            spot,
            reservation,
            estimated_cost,
            ..
        } = detail;
        Self {
            reservation_id: reservation.id().to_string(),
            spot_id: spot.id.to_string(),
            spot_number: spot.number.get(),
            customer_id: reservation.user_id().to_string(),
            vehicle_number: reservation.vehicle().map(ToString::to_string),
            held_at: reservation.held_at(),
            start_time: reservation.start_time(),
            estimated_cost: estimated_cost.as_major_units(),
        }
    }
}

fn lot_path(raw: &str) -> Result<LotId, Error> {
    parse_lot_id(LOT_ID, raw)
}

fn spot_path(path: &(String, String)) -> Result<(LotId, SpotId), Error> {
    Ok((parse_lot_id(LOT_ID, &path.0)?, parse_spot_id(SPOT_ID, &path.1)?))
}

/// Create a lot with spots numbered `1..=max_spots`.
#[utoipa::path(
    post,
    path = "/admin/lots",
    request_body = CreateLotRequest,
    responses(
        (status = 201, description = "Lot created", body = LotCreatedResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["admin"],
    operation_id = "createLot"
)]
#[post("/admin/lots")]
pub async fn create_lot(
    state: web::Data<HttpState>,
    AdminIdentity(admin): AdminIdentity,
    payload: web::Json<CreateLotRequest>,
) -> ApiResult<HttpResponse> {
    let draft = LotDraft::try_from(payload.into_inner()).map_err(lot_error)?;
    let created = state.lots.create_lot(&admin, draft).await?;
    Ok(HttpResponse::Created().json(LotCreatedResponse {
        message: "Lot created".to_owned(),
        lot_id: created.lot.id.to_string(),
        lot: LotWithSpotsView::from(&created),
    }))
}

/// Update lot metadata. Resizing is done spot by spot.
#[utoipa::path(
    put,
    path = "/admin/lots/{lot_id}",
    params(("lot_id" = String, Path, description = "Lot identifier")),
    request_body = UpdateLotRequest,
    responses(
        (status = 200, description = "Lot updated", body = LotUpdatedResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Lot not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["admin"],
    operation_id = "updateLot"
)]
#[put("/admin/lots/{lot_id}")]
pub async fn update_lot(
    state: web::Data<HttpState>,
    AdminIdentity(admin): AdminIdentity,
    path: web::Path<String>,
    payload: web::Json<UpdateLotRequest>,
) -> ApiResult<web::Json<LotUpdatedResponse>> {
    let lot_id = lot_path(&path)?;
    let changes = LotChanges::try_from(payload.into_inner()).map_err(lot_error)?;
    if changes.is_empty() {
        return Err(empty_update_error());
    }
    let lot = state.lots.update_lot(&admin, &lot_id, changes).await?;
    Ok(web::Json(LotUpdatedResponse {
        message: "Lot updated".to_owned(),
        lot: LotView::from(&lot),
    }))
}

/// Delete a lot and its spots; refused while any spot is occupied.
#[utoipa::path(
    delete,
    path = "/admin/lots/{lot_id}",
    params(("lot_id" = String, Path, description = "Lot identifier")),
    responses(
        (status = 200, description = "Lot deleted", body = MessageResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Lot not found", body = Error),
        (status = 409, description = "Lot has occupied spots", body = Error)
    ),
    tags = ["admin"],
    operation_id = "deleteLot"
)]
#[delete("/admin/lots/{lot_id}")]
pub async fn delete_lot(
    state: web::Data<HttpState>,
    AdminIdentity(admin): AdminIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let lot_id = lot_path(&path)?;
    state.lots.delete_lot(&admin, &lot_id).await?;
    Ok(web::Json(MessageResponse::new("Lot deleted")))
}

/// Add a spot with an explicit number.
#[utoipa::path(
    post,
    path = "/admin/lots/{lot_id}/spots",
    params(("lot_id" = String, Path, description = "Lot identifier")),
    request_body = SpotNumberRequest,
    responses(
        (status = 201, description = "Spot created", body = SpotResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Lot not found", body = Error),
        (status = 409, description = "Spot number taken", body = Error)
    ),
    tags = ["admin"],
    operation_id = "addSpot"
)]
#[post("/admin/lots/{lot_id}/spots")]
pub async fn add_spot(
    state: web::Data<HttpState>,
    AdminIdentity(admin): AdminIdentity,
    path: web::Path<String>,
    payload: web::Json<SpotNumberRequest>,
) -> ApiResult<HttpResponse> {
    let lot_id = lot_path(&path)?;
    let number = payload.spot_number()?;
    let spot = state.lots.add_spot(&admin, &lot_id, number).await?;
    Ok(HttpResponse::Created().json(SpotResponse {
        message: "Parking spot created".to_owned(),
        spot: SpotView::from(&spot),
    }))
}

/// Show the reservation occupying a spot.
#[utoipa::path(
    get,
    path = "/admin/lots/{lot_id}/spots/{spot_id}",
    params(
        ("lot_id" = String, Path, description = "Lot identifier"),
        ("spot_id" = String, Path, description = "Spot identifier")
    ),
    responses(
        (status = 200, description = "Occupying reservation", body = SpotDetailResponse),
        (status = 404, description = "Spot not found or available", body = Error)
    ),
    tags = ["admin"],
    operation_id = "spotDetail"
)]
#[get("/admin/lots/{lot_id}/spots/{spot_id}")]
pub async fn spot_detail(
    state: web::Data<HttpState>,
    AdminIdentity(admin): AdminIdentity,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<SpotDetailResponse>> {
    let (lot_id, spot_id) = spot_path(&path)?;
    let detail = state.lots.spot_detail(&admin, &lot_id, &spot_id).await?;
    Ok(web::Json(SpotDetailResponse::from(detail)))
}

/// Give a spot a new number.
#[utoipa::path(
    put,
    path = "/admin/lots/{lot_id}/spots/{spot_id}",
    params(
        ("lot_id" = String, Path, description = "Lot identifier"),
        ("spot_id" = String, Path, description = "Spot identifier")
    ),
    request_body = SpotNumberRequest,
    responses(
        (status = 200, description = "Spot renumbered", body = SpotResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Spot not found", body = Error),
        (status = 409, description = "Spot number taken", body = Error)
    ),
    tags = ["admin"],
    operation_id = "renumberSpot"
)]
#[put("/admin/lots/{lot_id}/spots/{spot_id}")]
pub async fn renumber_spot(
    state: web::Data<HttpState>,
    AdminIdentity(admin): AdminIdentity,
    path: web::Path<(String, String)>,
    payload: web::Json<SpotNumberRequest>,
) -> ApiResult<web::Json<SpotResponse>> {
    let (lot_id, spot_id) = spot_path(&path)?;
    let number = payload.spot_number()?;
    let spot = state
        .lots
        .renumber_spot(&admin, &lot_id, &spot_id, number)
        .await?;
    Ok(web::Json(SpotResponse {
        message: "Parking spot updated".to_owned(),
        spot: SpotView::from(&spot),
    }))
}

/// Remove an unoccupied spot.
#[utoipa::path(
    delete,
    path = "/admin/lots/{lot_id}/spots/{spot_id}",
    params(
        ("lot_id" = String, Path, description = "Lot identifier"),
        ("spot_id" = String, Path, description = "Spot identifier")
    ),
    responses(
        (status = 200, description = "Spot removed", body = MessageResponse),
        (status = 404, description = "Spot not found", body = Error),
        (status = 409, description = "Spot is occupied", body = Error)
    ),
    tags = ["admin"],
    operation_id = "removeSpot"
)]
#[delete("/admin/lots/{lot_id}/spots/{spot_id}")]
pub async fn remove_spot(
    state: web::Data<HttpState>,
    AdminIdentity(admin): AdminIdentity,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<MessageResponse>> {
    let (lot_id, spot_id) = spot_path(&path)?;
    state.lots.remove_spot(&admin, &lot_id, &spot_id).await?;
    Ok(web::Json(MessageResponse::new("Parking spot deleted")))
}

#[cfg(test)]
#[path = "admin_lots_tests.rs"]
mod tests;
