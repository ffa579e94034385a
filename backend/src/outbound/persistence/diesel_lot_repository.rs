//! PostgreSQL-backed `LotRepository` implementation using Diesel ORM.
//!
//! Lot and spot deletions lock the affected spot rows first so a concurrent
//! claim cannot slip in between the vacancy check and the delete.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{LotPersistenceError, LotRepository, RemovalOutcome};
use crate::domain::{LotId, LotWithSpots, ParkingLot, ParkingSpot, SpotId, SpotNumber};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{LotRow, LotUpdate, SpotRow, collect_rows};
use super::pool::{DbPool, PoolError};
use super::schema::{parking_lots, parking_spots};

const SPOT_NUMBER_CONSTRAINT: &str = "parking_spots_lot_id_number_key";

/// Diesel-backed implementation of the `LotRepository` port.
#[derive(Clone)]
pub struct DieselLotRepository {
    pool: DbPool,
}

impl DieselLotRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LotPersistenceError {
    map_basic_pool_error(error, LotPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LotPersistenceError {
    map_basic_diesel_error(
        error,
        LotPersistenceError::query,
        LotPersistenceError::connection,
    )
}

fn map_spot_write_error(error: diesel::result::Error, number: SpotNumber) -> LotPersistenceError {
    if is_unique_violation(&error, SPOT_NUMBER_CONSTRAINT) {
        LotPersistenceError::duplicate_spot_number(number.get())
    } else {
        map_diesel_error(error)
    }
}

/// Pair lots with their spots, keeping the lot order and sorting spots.
fn assemble(
    lot_rows: Vec<LotRow>,
    spot_rows: Vec<SpotRow>,
) -> Result<Vec<LotWithSpots>, LotPersistenceError> {
    let mut spots_by_lot: HashMap<Uuid, Vec<ParkingSpot>> = HashMap::new();
    for spot in collect_rows(spot_rows, SpotRow::into_domain).map_err(LotPersistenceError::query)? {
        spots_by_lot
            .entry(*spot.lot_id.as_uuid())
            .or_default()
            .push(spot);
    }
    lot_rows
        .into_iter()
        .map(|row| {
            let mut spots = spots_by_lot.remove(&row.id).unwrap_or_default();
            spots.sort_by_key(|spot| spot.number);
            let lot = row.into_domain().map_err(LotPersistenceError::query)?;
            Ok(LotWithSpots { lot, spots })
        })
        .collect()
}

#[async_trait]
impl LotRepository for DieselLotRepository {
    async fn create(&self, lot: &LotWithSpots) -> Result<(), LotPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lot_row = LotRow::from_domain(&lot.lot);
        let spot_rows: Vec<SpotRow> = lot.spots.iter().map(SpotRow::from_domain).collect();

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(parking_lots::table)
                    .values(&lot_row)
                    .execute(conn)
                    .await?;
                if !spot_rows.is_empty() {
                    diesel::insert_into(parking_spots::table)
                        .values(&spot_rows)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find_lot(&self, id: &LotId) -> Result<Option<ParkingLot>, LotPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<LotRow> = parking_lots::table
            .filter(parking_lots::id.eq(id.as_uuid()))
            .select(LotRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(LotRow::into_domain)
            .transpose()
            .map_err(LotPersistenceError::query)
    }

    async fn find_with_spots(
        &self,
        id: &LotId,
    ) -> Result<Option<LotWithSpots>, LotPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lot_id = *id.as_uuid();
        let (lot_rows, spot_rows) = conn
            .transaction(|conn| {
                async move {
                    let lots: Vec<LotRow> = parking_lots::table
                        .filter(parking_lots::id.eq(lot_id))
                        .select(LotRow::as_select())
                        .load(conn)
                        .await?;
                    let spots: Vec<SpotRow> = parking_spots::table
                        .filter(parking_spots::lot_id.eq(lot_id))
                        .select(SpotRow::as_select())
                        .load(conn)
                        .await?;
                    Ok((lots, spots))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(assemble(lot_rows, spot_rows)?.into_iter().next())
    }

    async fn list_with_spots(&self) -> Result<Vec<LotWithSpots>, LotPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // One transaction so lots and spots come from the same snapshot.
        let (lot_rows, spot_rows) = conn
            .transaction(|conn| {
                async move {
                    let lots: Vec<LotRow> = parking_lots::table
                        .order_by((parking_lots::name, parking_lots::id))
                        .select(LotRow::as_select())
                        .load(conn)
                        .await?;
                    let spots: Vec<SpotRow> = parking_spots::table
                        .select(SpotRow::as_select())
                        .load(conn)
                        .await?;
                    Ok((lots, spots))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        assemble(lot_rows, spot_rows)
    }

    async fn update(&self, lot: &ParkingLot) -> Result<bool, LotPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = LotUpdate {
            name: lot.name.as_ref(),
            address: lot.address.as_ref(),
            pincode: lot.pincode.as_ref(),
            price_per_hour_cents: lot.price_per_hour.minor_units(),
        };
        let updated = diesel::update(parking_lots::table.filter(parking_lots::id.eq(lot.id.as_uuid())))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn delete_if_vacant(&self, id: &LotId) -> Result<RemovalOutcome, LotPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lot_id = *id.as_uuid();
        conn.transaction(|conn| {
            async move {
                let locked: Option<Uuid> = parking_lots::table
                    .filter(parking_lots::id.eq(lot_id))
                    .select(parking_lots::id)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if locked.is_none() {
                    return Ok(RemovalOutcome::NotFound);
                }
                let occupied: Vec<Uuid> = parking_spots::table
                    .filter(parking_spots::lot_id.eq(lot_id))
                    .filter(parking_spots::occupied.eq(true))
                    .select(parking_spots::id)
                    .for_update()
                    .load(conn)
                    .await?;
                if !occupied.is_empty() {
                    return Ok(RemovalOutcome::Occupied);
                }
                // Spots cascade; reservation history keeps its snapshots.
                diesel::delete(parking_lots::table.filter(parking_lots::id.eq(lot_id)))
                    .execute(conn)
                    .await?;
                Ok(RemovalOutcome::Removed)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn add_spot(&self, spot: &ParkingSpot) -> Result<(), LotPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(parking_spots::table)
            .values(&SpotRow::from_domain(spot))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| map_spot_write_error(error, spot.number))
    }

    async fn renumber_spot(
        &self,
        lot_id: &LotId,
        spot_id: &SpotId,
        number: SpotNumber,
    ) -> Result<Option<ParkingSpot>, LotPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SpotRow> = diesel::update(
            parking_spots::table
                .filter(parking_spots::id.eq(spot_id.as_uuid()))
                .filter(parking_spots::lot_id.eq(lot_id.as_uuid())),
        )
        .set(parking_spots::number.eq(number.get()))
        .returning(SpotRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(|error| map_spot_write_error(error, number))?;
        row.map(SpotRow::into_domain)
            .transpose()
            .map_err(LotPersistenceError::query)
    }

    async fn delete_spot_if_vacant(
        &self,
        lot_id: &LotId,
        spot_id: &SpotId,
    ) -> Result<RemovalOutcome, LotPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lot_id = *lot_id.as_uuid();
        let spot_id = *spot_id.as_uuid();
        conn.transaction(|conn| {
            async move {
                let occupied: Option<bool> = parking_spots::table
                    .filter(parking_spots::id.eq(spot_id))
                    .filter(parking_spots::lot_id.eq(lot_id))
                    .select(parking_spots::occupied)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                match occupied {
                    None => Ok(RemovalOutcome::NotFound),
                    Some(true) => Ok(RemovalOutcome::Occupied),
                    Some(false) => {
                        diesel::delete(parking_spots::table.filter(parking_spots::id.eq(spot_id)))
                            .execute(conn)
                            .await?;
                        Ok(RemovalOutcome::Removed)
                    }
                }
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
