//! Usage summaries and dashboards.
//!
//! Implements the [`BillingReports`] driving port. Aggregation itself is in
//! [`crate::domain::billing`]; this service only gathers the inputs.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    BillingReports, LotPersistenceError, LotRepository, ReservationPersistenceError,
    ReservationRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{
    AdminDashboard, Error, Identity, MonthlyLotUsage, User, UserDashboard, live_revenue,
    month_start, summarise_month,
};

/// Billing service implementing the [`BillingReports`] driving port.
#[derive(Clone)]
pub struct BillingService<L, R, U> {
    lots: Arc<L>,
    reservations: Arc<R>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<L, R, U> BillingService<L, R, U> {
    /// Create a new service.
    pub fn new(lots: Arc<L>, reservations: Arc<R>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            lots,
            reservations,
            users,
            clock,
        }
    }
}

impl<L, R, U> BillingService<L, R, U>
where
    L: LotRepository,
    R: ReservationRepository,
    U: UserRepository,
{
    fn map_lot_error(error: LotPersistenceError) -> Error {
        match error {
            LotPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("lot repository unavailable: {message}"))
            }
            other => Error::internal(format!("lot repository error: {other}")),
        }
    }

    fn map_reservation_error(error: ReservationPersistenceError) -> Error {
        match error {
            ReservationPersistenceError::Connection { message } => Error::service_unavailable(
                format!("reservation repository unavailable: {message}"),
            ),
            ReservationPersistenceError::Query { message } => {
                Error::internal(format!("reservation repository error: {message}"))
            }
        }
    }

    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            other => Error::internal(format!("user repository error: {other}")),
        }
    }

    /// Load the caller's profile; a token for a deleted account is stale.
    async fn profile(&self, caller: &Identity) -> Result<User, Error> {
        self.users
            .find_by_id(&caller.user_id())
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| Error::unauthorized("account no longer exists"))
    }
}

#[async_trait]
impl<L, R, U> BillingReports for BillingService<L, R, U>
where
    L: LotRepository,
    R: ReservationRepository,
    U: UserRepository,
{
    async fn monthly_summary(&self, caller: &Identity) -> Result<Vec<MonthlyLotUsage>, Error> {
        let since = month_start(self.clock.utc());
        let released = self
            .reservations
            .list_released_since(&caller.user_id(), since)
            .await
            .map_err(Self::map_reservation_error)?;
        Ok(summarise_month(&released, since))
    }

    async fn user_dashboard(&self, caller: &Identity) -> Result<UserDashboard, Error> {
        let user = self.profile(caller).await?;
        let reservations = self
            .reservations
            .list_for_user(&caller.user_id())
            .await
            .map_err(Self::map_reservation_error)?;
        Ok(UserDashboard { user, reservations })
    }

    async fn admin_dashboard(&self, caller: &Identity) -> Result<AdminDashboard, Error> {
        caller.require_admin()?;
        let admin = self.profile(caller).await?;
        let all_lots = self
            .lots
            .list_with_spots()
            .await
            .map_err(Self::map_lot_error)?;
        let active = self
            .reservations
            .list_active()
            .await
            .map_err(Self::map_reservation_error)?;
        let revenue = live_revenue(&all_lots, &active, self.clock.utc());
        let lots = all_lots
            .into_iter()
            .filter(|entry| entry.lot.owner == caller.user_id())
            .collect();

        Ok(AdminDashboard {
            admin,
            lots,
            revenue,
        })
    }
}

#[cfg(test)]
#[path = "billing_service_tests.rs"]
mod tests;
