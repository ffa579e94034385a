//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions back into domain types
//! re-validate every column and report failures as plain messages, which the
//! repositories wrap in their own query errors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Address, LotId, LotName, Money, ParkingLot, ParkingSpot, Pincode, Reservation, ReservationId,
    ReservationRecord, SpotId, SpotNumber, UserId, VehicleNumber,
};

use super::schema::{parking_lots, parking_spots, reservations, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub address: String,
    pub pincode: String,
    pub role: String,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub address: &'a str,
    pub pincode: &'a str,
    pub role: &'a str,
}

/// Row struct for reading from and inserting into the parking_lots table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = parking_lots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LotRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub address: String,
    pub pincode: String,
    pub price_per_hour_cents: i64,
}

/// Changeset for lot metadata updates.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = parking_lots)]
pub(crate) struct LotUpdate<'a> {
    pub name: &'a str,
    pub address: &'a str,
    pub pincode: &'a str,
    pub price_per_hour_cents: i64,
}

/// Row struct for reading from and inserting into the parking_spots table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = parking_spots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SpotRow {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub number: i32,
    pub occupied: bool,
}

/// Row struct for reading from and inserting into the reservations table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = reservations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReservationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lot_id: Option<Uuid>,
    pub spot_id: Option<Uuid>,
    pub lot_name: String,
    pub lot_address: String,
    pub spot_number: i32,
    pub vehicle_number: Option<String>,
    pub held_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub cost_cents: Option<i64>,
    pub billed_rate_cents: Option<i64>,
}

fn money(cents: i64) -> Result<Money, String> {
    Money::from_minor_units(cents).map_err(|err| format!("invalid amount in database: {err}"))
}

impl LotRow {
    pub(crate) fn from_domain(lot: &ParkingLot) -> Self {
        Self {
            id: *lot.id.as_uuid(),
            owner_id: *lot.owner.as_uuid(),
            name: lot.name.as_ref().to_owned(),
            address: lot.address.as_ref().to_owned(),
            pincode: lot.pincode.as_ref().to_owned(),
            price_per_hour_cents: lot.price_per_hour.minor_units(),
        }
    }

    pub(crate) fn into_domain(self) -> Result<ParkingLot, String> {
        Ok(ParkingLot {
            id: LotId::from_uuid(self.id),
            owner: UserId::from_uuid(self.owner_id),
            name: LotName::new(&self.name)
                .map_err(|err| format!("invalid lot name in database: {err}"))?,
            address: Address::new(&self.address)
                .map_err(|err| format!("invalid lot address in database: {err}"))?,
            pincode: Pincode::new(&self.pincode)
                .map_err(|err| format!("invalid lot pincode in database: {err}"))?,
            price_per_hour: money(self.price_per_hour_cents)?,
        })
    }
}

impl SpotRow {
    pub(crate) fn from_domain(spot: &ParkingSpot) -> Self {
        Self {
            id: *spot.id.as_uuid(),
            lot_id: *spot.lot_id.as_uuid(),
            number: spot.number.get(),
            occupied: spot.occupied,
        }
    }

    pub(crate) fn into_domain(self) -> Result<ParkingSpot, String> {
        Ok(ParkingSpot {
            id: SpotId::from_uuid(self.id),
            lot_id: LotId::from_uuid(self.lot_id),
            number: SpotNumber::new(i64::from(self.number))
                .map_err(|err| format!("invalid spot number in database: {err}"))?,
            occupied: self.occupied,
        })
    }
}

impl ReservationRow {
    pub(crate) fn from_domain(reservation: &Reservation) -> Self {
        let record = reservation.record();
        Self {
            id: *record.id.as_uuid(),
            user_id: *record.user_id.as_uuid(),
            lot_id: record.lot_id.map(|id| *id.as_uuid()),
            spot_id: record.spot_id.map(|id| *id.as_uuid()),
            lot_name: record.lot_name.as_ref().to_owned(),
            lot_address: record.lot_address.as_ref().to_owned(),
            spot_number: record.spot_number.get(),
            vehicle_number: record.vehicle.as_ref().map(|v| v.as_ref().to_owned()),
            held_at: record.held_at,
            start_time: record.start_time,
            end_time: record.end_time,
            cost_cents: record.cost.map(Money::minor_units),
            billed_rate_cents: record.billed_rate.map(Money::minor_units),
        }
    }

    pub(crate) fn into_domain(self) -> Result<Reservation, String> {
        let vehicle = self
            .vehicle_number
            .map(VehicleNumber::new)
            .transpose()
            .map_err(|err| format!("invalid vehicle number in database: {err}"))?;
        Ok(Reservation::from(ReservationRecord {
            id: ReservationId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            lot_id: self.lot_id.map(LotId::from_uuid),
            spot_id: self.spot_id.map(SpotId::from_uuid),
            lot_name: LotName::new(&self.lot_name)
                .map_err(|err| format!("invalid lot name in database: {err}"))?,
            lot_address: Address::new(&self.lot_address)
                .map_err(|err| format!("invalid lot address in database: {err}"))?,
            spot_number: SpotNumber::new(i64::from(self.spot_number))
                .map_err(|err| format!("invalid spot number in database: {err}"))?,
            vehicle,
            held_at: self.held_at,
            start_time: self.start_time,
            end_time: self.end_time,
            cost: self.cost_cents.map(money).transpose()?,
            billed_rate: self.billed_rate_cents.map(money).transpose()?,
        }))
    }
}

/// Convert a batch of rows, failing on the first invalid one.
pub(crate) fn collect_rows<R, T>(
    rows: Vec<R>,
    convert: impl Fn(R) -> Result<T, String>,
) -> Result<Vec<T>, String> {
    rows.into_iter().map(convert).collect()
}
