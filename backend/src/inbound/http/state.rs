//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on driving ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccessTokens, Accounts, BillingReports, LotRegistry, ReservationLifecycle};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn Accounts>,
    pub lots: Arc<dyn LotRegistry>,
    pub reservations: Arc<dyn ReservationLifecycle>,
    pub reports: Arc<dyn BillingReports>,
    /// Verifies bearer tokens for the identity extractors.
    pub tokens: Arc<dyn AccessTokens>,
}

/// Parameter object for [`HttpState::new`].
pub struct HttpStatePorts {
    pub accounts: Arc<dyn Accounts>,
    pub lots: Arc<dyn LotRegistry>,
    pub reservations: Arc<dyn ReservationLifecycle>,
    pub reports: Arc<dyn BillingReports>,
    pub tokens: Arc<dyn AccessTokens>,
}

impl HttpState {
    /// Construct state from a ports bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            lots,
            reservations,
            reports,
            tokens,
        } = ports;
        Self {
            accounts,
            lots,
            reservations,
            reports,
            tokens,
        }
    }
}
