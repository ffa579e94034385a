//! PostgreSQL-backed `ReservationRepository` implementation using Diesel ORM.
//!
//! Claims run in one transaction: the lot row is share-locked, stale holds
//! are closed, and the lowest free spot is taken with `FOR UPDATE SKIP
//! LOCKED`, so two concurrent claims never receive the same spot. The
//! partial unique index `reservations_open_spot_idx` backs this up.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    ClaimOutcome, ClaimRequest, ReservationPersistenceError, ReservationRepository,
};
use crate::domain::{LotId, Reservation, ReservationId, SpotId, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{LotRow, ReservationRow, SpotRow, collect_rows};
use super::pool::{DbPool, PoolError};
use super::schema::{parking_lots, parking_spots, reservations};

/// Diesel-backed implementation of the `ReservationRepository` port.
#[derive(Clone)]
pub struct DieselReservationRepository {
    pool: DbPool,
}

impl DieselReservationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReservationPersistenceError {
    map_basic_pool_error(error, ReservationPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ReservationPersistenceError {
    map_basic_diesel_error(
        error,
        ReservationPersistenceError::query,
        ReservationPersistenceError::connection,
    )
}

fn into_reservation(row: ReservationRow) -> Result<Reservation, ReservationPersistenceError> {
    row.into_domain().map_err(ReservationPersistenceError::query)
}

fn into_reservations(
    rows: Vec<ReservationRow>,
) -> Result<Vec<Reservation>, ReservationPersistenceError> {
    collect_rows(rows, ReservationRow::into_domain).map_err(ReservationPersistenceError::query)
}

/// Row-level outcome of the claim transaction.
enum ClaimRows {
    Claimed(ReservationRow),
    LotNotFound,
    NoCapacity,
}

/// Build the Held row for a claimed spot, snapshotting lot details.
fn held_row(request: &ClaimRequest, lot: &LotRow, spot: &SpotRow) -> ReservationRow {
    ReservationRow {
        id: *request.reservation_id.as_uuid(),
        user_id: *request.user_id.as_uuid(),
        lot_id: Some(lot.id),
        spot_id: Some(spot.id),
        lot_name: lot.name.clone(),
        lot_address: lot.address.clone(),
        spot_number: spot.number,
        vehicle_number: None,
        held_at: request.held_at,
        start_time: None,
        end_time: None,
        cost_cents: None,
        billed_rate_cents: None,
    }
}

/// Close holds in `lot_id` taken before `stale_before` and free their spots.
///
/// Rows locked by a concurrent transaction are skipped.
async fn close_stale_holds(
    conn: &mut AsyncPgConnection,
    lot_id: Uuid,
    stale_before: DateTime<Utc>,
    closed_at: DateTime<Utc>,
) -> QueryResult<usize> {
    let stale: Vec<(Uuid, Option<Uuid>)> = reservations::table
        .filter(reservations::lot_id.eq(lot_id))
        .filter(reservations::start_time.is_null())
        .filter(reservations::end_time.is_null())
        .filter(reservations::held_at.lt(stale_before))
        .select((reservations::id, reservations::spot_id))
        .for_update()
        .skip_locked()
        .load(conn)
        .await?;
    if stale.is_empty() {
        return Ok(0);
    }
    let (ids, spot_ids): (Vec<Uuid>, Vec<Option<Uuid>>) = stale.into_iter().unzip();
    let spot_ids: Vec<Uuid> = spot_ids.into_iter().flatten().collect();
    diesel::update(reservations::table.filter(reservations::id.eq_any(&ids)))
        .set((
            reservations::end_time.eq(Some(closed_at)),
            reservations::cost_cents.eq(Some(0_i64)),
            reservations::billed_rate_cents.eq(Some(0_i64)),
        ))
        .execute(conn)
        .await?;
    diesel::update(parking_spots::table.filter(parking_spots::id.eq_any(&spot_ids)))
        .set(parking_spots::occupied.eq(false))
        .execute(conn)
        .await?;
    debug!(reaped = ids.len(), %lot_id, "closed stale holds");
    Ok(ids.len())
}

#[async_trait]
impl ReservationRepository for DieselReservationRepository {
    async fn claim_spot(
        &self,
        request: &ClaimRequest,
    ) -> Result<ClaimOutcome, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let request = request.clone();

        let outcome = conn
            .transaction(|conn| {
                async move {
                    let lot_id = *request.lot_id.as_uuid();

                    // Share lock keeps the lot alive without serialising claims.
                    let lot: Option<LotRow> = parking_lots::table
                        .filter(parking_lots::id.eq(lot_id))
                        .select(LotRow::as_select())
                        .for_share()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(lot) = lot else {
                        return Ok(ClaimRows::LotNotFound);
                    };

                    close_stale_holds(conn, lot_id, request.stale_before, request.held_at)
                        .await?;

                    let spot: Option<SpotRow> = parking_spots::table
                        .filter(parking_spots::lot_id.eq(lot_id))
                        .filter(parking_spots::occupied.eq(false))
                        .order_by(parking_spots::number)
                        .select(SpotRow::as_select())
                        .for_update()
                        .skip_locked()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(spot) = spot else {
                        return Ok(ClaimRows::NoCapacity);
                    };

                    let marked = diesel::update(
                        parking_spots::table
                            .filter(parking_spots::id.eq(spot.id))
                            .filter(parking_spots::occupied.eq(false)),
                    )
                    .set(parking_spots::occupied.eq(true))
                    .execute(conn)
                    .await?;
                    if marked != 1 {
                        return Ok(ClaimRows::NoCapacity);
                    }

                    let row = held_row(&request, &lot, &spot);
                    diesel::insert_into(reservations::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    Ok(ClaimRows::Claimed(row))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        match outcome {
            ClaimRows::Claimed(row) => into_reservation(row).map(ClaimOutcome::Claimed),
            ClaimRows::LotNotFound => Ok(ClaimOutcome::LotNotFound),
            ClaimRows::NoCapacity => Ok(ClaimOutcome::NoCapacity),
        }
    }

    async fn reap_stale_holds(
        &self,
        lot_id: &LotId,
        stale_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<usize, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lot_id = *lot_id.as_uuid();
        conn.transaction(|conn| {
            async move { close_stale_holds(conn, lot_id, stale_before, now).await }.scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find_for_user(
        &self,
        id: &ReservationId,
        user_id: &UserId,
    ) -> Result<Option<Reservation>, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ReservationRow> = reservations::table
            .filter(reservations::id.eq(id.as_uuid()))
            .filter(reservations::user_id.eq(user_id.as_uuid()))
            .select(ReservationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(into_reservation).transpose()
    }

    async fn save_confirmation(
        &self,
        confirmed: &Reservation,
        observed_start: Option<DateTime<Utc>>,
    ) -> Result<bool, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let vehicle = confirmed.vehicle().map(|v| v.as_ref().to_owned());
        let updated = diesel::update(
            reservations::table
                .filter(reservations::id.eq(confirmed.id().as_uuid()))
                .filter(reservations::end_time.is_null())
                .filter(reservations::start_time.is_not_distinct_from(observed_start)),
        )
        .set((
            reservations::vehicle_number.eq(vehicle),
            reservations::start_time.eq(confirmed.start_time()),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated == 1)
    }

    async fn close(&self, closed: &Reservation) -> Result<bool, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = *closed.id().as_uuid();
        let start_time = closed.start_time();
        let end_time = closed.end_time();
        let cost = closed.cost().map(|m| m.minor_units());
        let billed_rate = closed.billed_rate().map(|m| m.minor_units());

        conn.transaction(|conn| {
            async move {
                let freed: Option<Option<Uuid>> = diesel::update(
                    reservations::table
                        .filter(reservations::id.eq(id))
                        .filter(reservations::end_time.is_null())
                        .filter(reservations::start_time.is_not_distinct_from(start_time)),
                )
                .set((
                    reservations::end_time.eq(end_time),
                    reservations::cost_cents.eq(cost),
                    reservations::billed_rate_cents.eq(billed_rate),
                ))
                .returning(reservations::spot_id)
                .get_result(conn)
                .await
                .optional()?;
                let Some(spot_id) = freed else {
                    return Ok(false);
                };
                if let Some(spot_id) = spot_id {
                    diesel::update(parking_spots::table.filter(parking_spots::id.eq(spot_id)))
                        .set(parking_spots::occupied.eq(false))
                        .execute(conn)
                        .await?;
                }
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find_open_for_spot(
        &self,
        spot_id: &SpotId,
    ) -> Result<Option<Reservation>, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ReservationRow> = reservations::table
            .filter(reservations::spot_id.eq(spot_id.as_uuid()))
            .filter(reservations::end_time.is_null())
            .select(ReservationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(into_reservation).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Reservation>, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ReservationRow> = reservations::table
            .filter(reservations::user_id.eq(user_id.as_uuid()))
            .order_by((reservations::held_at.desc(), reservations::id))
            .select(ReservationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_reservations(rows)
    }

    async fn list_active(&self) -> Result<Vec<Reservation>, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ReservationRow> = reservations::table
            .filter(reservations::start_time.is_not_null())
            .filter(reservations::end_time.is_null())
            .order_by(reservations::start_time)
            .select(ReservationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_reservations(rows)
    }

    async fn list_released_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, ReservationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ReservationRow> = reservations::table
            .filter(reservations::user_id.eq(user_id.as_uuid()))
            .filter(reservations::end_time.is_not_null())
            .filter(reservations::start_time.ge(since))
            .order_by(reservations::start_time)
            .select(ReservationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_reservations(rows)
    }
}
