//! Response bodies shared by the lot, reservation, and report handlers.
//!
//! Domain aggregates are not serialisable; these views decide what leaves
//! the process. Money is rendered in major units with two decimals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{LotWithSpots, ParkingLot, ParkingSpot, Reservation, User};

/// Plain acknowledgement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Lot deleted")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A spot and whether it can be claimed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpotView {
    pub id: String,
    pub number: i32,
    pub is_available: bool,
}

impl From<&ParkingSpot> for SpotView {
    fn from(spot: &ParkingSpot) -> Self {
        Self {
            id: spot.id.to_string(),
            number: spot.number.get(),
            is_available: !spot.occupied,
        }
    }
}

/// Lot metadata.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotView {
    pub id: String,
    pub name: String,
    pub address: String,
    pub pincode: String,
    #[schema(example = 20.0)]
    pub price_per_hour: f64,
}

impl From<&ParkingLot> for LotView {
    fn from(lot: &ParkingLot) -> Self {
        Self {
            id: lot.id.to_string(),
            name: lot.name.to_string(),
            address: lot.address.to_string(),
            pincode: lot.pincode.to_string(),
            price_per_hour: lot.price_per_hour.as_major_units(),
        }
    }
}

/// Lot metadata with its spots ordered by number.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotWithSpotsView {
    #[serde(flatten)]
    pub lot: LotView,
    pub spots: Vec<SpotView>,
}

impl From<&LotWithSpots> for LotWithSpotsView {
    fn from(entry: &LotWithSpots) -> Self {
        Self {
            lot: LotView::from(&entry.lot),
            spots: entry.spots.iter().map(SpotView::from).collect(),
        }
    }
}

/// Lot listing for drivers choosing where to park.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotAvailabilityView {
    #[serde(flatten)]
    pub lot: LotView,
    pub total_spots: usize,
    pub available_spots: usize,
}

impl From<&LotWithSpots> for LotAvailabilityView {
    fn from(entry: &LotWithSpots) -> Self {
        Self {
            lot: LotView::from(&entry.lot),
            total_spots: entry.total_spots(),
            available_spots: entry.available_spots(),
        }
    }
}

/// A reservation as shown to its owner.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationView {
    pub reservation_id: String,
    #[schema(example = "held")]
    pub state: String,
    pub lot_id: Option<String>,
    pub lot_name: String,
    pub lot_address: String,
    pub spot_number: i32,
    pub vehicle_number: Option<String>,
    pub held_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub cost: Option<f64>,
}

impl From<&Reservation> for ReservationView {
    fn from(reservation: &Reservation) -> Self {
        Self {
            reservation_id: reservation.id().to_string(),
            state: reservation.state().to_string(),
            lot_id: reservation.lot_id().map(|id| id.to_string()),
            lot_name: reservation.lot_name().to_string(),
            lot_address: reservation.lot_address().to_string(),
            spot_number: reservation.spot_number().get(),
            vehicle_number: reservation.vehicle().map(ToString::to_string),
            held_at: reservation.held_at(),
            start_time: reservation.start_time(),
            end_time: reservation.end_time(),
            cost: reservation.cost().map(|cost| cost.as_major_units()),
        }
    }
}

/// Account profile without credentials.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub pincode: String,
    #[schema(example = "user")]
    pub role: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            full_name: user.full_name().to_string(),
            email: user.email().to_string(),
            address: user.address().to_string(),
            pincode: user.pincode().to_string(),
            role: user.role().to_string(),
        }
    }
}
