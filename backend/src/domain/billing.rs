//! Usage and revenue aggregation over reservation history.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Utc};

use crate::domain::{
    Accrual, LotId, LotName, LotWithSpots, Money, Reservation, ReservationState, User,
};

/// First instant of the UTC calendar month containing `now`.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// A user's parking in one lot over the current month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyLotUsage {
    pub lot_id: Option<LotId>,
    pub lot_name: LotName,
    pub times_parked: u32,
    pub total_time: TimeDelta,
    pub total_cost: Money,
}

impl MonthlyLotUsage {
    /// Total parked time in minutes, for presentation.
    pub fn total_time_minutes(&self) -> f64 {
        self.total_time.num_milliseconds() as f64 / 60_000.0
    }
}

#[derive(Default)]
struct UsageAccumulator {
    lot_id: Option<LotId>,
    lot_name: Option<LotName>,
    times_parked: u32,
    total_time: TimeDelta,
    accrual: Accrual,
}

/// Group released, confirmed reservations that started at or after `since`
/// by lot, totalling elapsed time and cost at each reservation's billed rate.
///
/// Output is ordered by lot name.
pub fn summarise_month(reservations: &[Reservation], since: DateTime<Utc>) -> Vec<MonthlyLotUsage> {
    let mut groups: BTreeMap<(String, Option<LotId>), UsageAccumulator> = BTreeMap::new();

    for reservation in reservations {
        if reservation.state() != ReservationState::Released {
            continue;
        }
        let Some(start) = reservation.start_time() else {
            continue;
        };
        if start < since {
            continue;
        }
        let Some(duration) = reservation.billed_duration() else {
            continue;
        };
        let rate = reservation.billed_rate().unwrap_or(Money::ZERO);

        let key = (reservation.lot_name().to_string(), reservation.lot_id());
        let entry = groups.entry(key).or_default();
        entry.lot_id = reservation.lot_id();
        entry.lot_name = Some(reservation.lot_name().clone());
        entry.times_parked = entry.times_parked.saturating_add(1);
        entry.total_time += duration;
        entry.accrual = entry.accrual + rate.accrue_hourly(duration);
    }

    groups
        .into_values()
        .filter_map(|acc| {
            Some(MonthlyLotUsage {
                lot_id: acc.lot_id,
                lot_name: acc.lot_name?,
                times_parked: acc.times_parked,
                total_time: acc.total_time,
                total_cost: acc.accrual.total(),
            })
        })
        .collect()
}

/// Live revenue of one lot from its currently active reservations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotRevenue {
    pub lot_id: LotId,
    pub lot_name: LotName,
    pub revenue: Money,
}

/// Estimate running revenue for every lot at its current price.
///
/// Lots without active reservations report zero. Output follows the order
/// of `lots`.
pub fn live_revenue(
    lots: &[LotWithSpots],
    active: &[Reservation],
    now: DateTime<Utc>,
) -> Vec<LotRevenue> {
    lots.iter()
        .map(|entry| {
            let lot = &entry.lot;
            let accrual: Accrual = active
                .iter()
                .filter(|reservation| reservation.lot_id() == Some(lot.id))
                .filter(|reservation| reservation.state() == ReservationState::Active)
                .filter_map(Reservation::start_time)
                .map(|start| lot.price_per_hour.accrue_hourly(now - start))
                .sum();
            LotRevenue {
                lot_id: lot.id,
                lot_name: lot.name.clone(),
                revenue: accrual.total(),
            }
        })
        .collect()
}

/// Spot totals and listings for an admin's own lots plus system-wide revenue.
#[derive(Debug, Clone)]
pub struct AdminDashboard {
    pub admin: User,
    pub lots: Vec<LotWithSpots>,
    pub revenue: Vec<LotRevenue>,
}

impl AdminDashboard {
    /// Number of owned lots.
    pub fn total_lots(&self) -> usize {
        self.lots.len()
    }

    /// Spots across owned lots.
    pub fn total_spots(&self) -> usize {
        self.lots.iter().map(LotWithSpots::total_spots).sum()
    }

    /// Free spots across owned lots.
    pub fn available_spots(&self) -> usize {
        self.lots.iter().map(LotWithSpots::available_spots).sum()
    }

    /// Occupied spots across owned lots.
    pub fn reserved_spots(&self) -> usize {
        self.lots.iter().map(LotWithSpots::occupied_spots).sum()
    }
}

/// A user's profile with their full reservation history.
#[derive(Debug, Clone)]
pub struct UserDashboard {
    pub user: User,
    pub reservations: Vec<Reservation>,
}
