//! Driving port for dashboards and billing summaries.

use async_trait::async_trait;

use crate::domain::{AdminDashboard, Error, Identity, MonthlyLotUsage, UserDashboard};

#[async_trait]
pub trait BillingReports: Send + Sync {
    /// The caller's released parking this UTC month, grouped by lot.
    async fn monthly_summary(&self, caller: &Identity) -> Result<Vec<MonthlyLotUsage>, Error>;

    /// The caller's profile and reservation history.
    async fn user_dashboard(&self, caller: &Identity) -> Result<UserDashboard, Error>;

    /// Owned-lot occupancy plus system-wide live revenue. Admin only.
    async fn admin_dashboard(&self, caller: &Identity) -> Result<AdminDashboard, Error>;
}
