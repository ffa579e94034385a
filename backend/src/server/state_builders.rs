//! Builders wiring domain services over the memory or Diesel adapters.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::info;

use parking_backend::domain::ports::{LotRepository, ReservationRepository, UserRepository};
use parking_backend::domain::{
    AccountService, AdminSeed, AdminSeedOutcome, BillingService, Error, LotRegistryService,
    ReservationPorts, ReservationService,
};
use parking_backend::inbound::http::state::{HttpState, HttpStatePorts};
use parking_backend::outbound::memory::InMemoryParkingStore;
use parking_backend::outbound::persistence::{
    DieselLotRepository, DieselReservationRepository, DieselUserRepository,
};
use parking_backend::outbound::security::{Argon2PasswordHasher, JwtAccessTokens};

use super::ServerConfig;

/// Repository adapters shared by every service.
struct Repositories<U, L, R> {
    users: Arc<U>,
    lots: Arc<L>,
    reservations: Arc<R>,
}

/// Build the HTTP state and make sure an admin account exists.
///
/// Uses the Diesel repositories when a pool is configured, otherwise a
/// single in-memory store backs every port.
///
/// # Errors
/// Returns the domain error raised while seeding the admin account.
pub(super) async fn build_http_state(
    config: &ServerConfig,
    admin_seed: AdminSeed,
) -> Result<HttpState, Error> {
    match &config.db_pool {
        Some(pool) => {
            let repositories = Repositories {
                users: Arc::new(DieselUserRepository::new(pool.clone())),
                lots: Arc::new(DieselLotRepository::new(pool.clone())),
                reservations: Arc::new(DieselReservationRepository::new(pool.clone())),
            };
            wire_services(config, repositories, admin_seed).await
        }
        None => {
            let store = Arc::new(InMemoryParkingStore::new());
            let repositories = Repositories {
                users: store.clone(),
                lots: store.clone(),
                reservations: store,
            };
            wire_services(config, repositories, admin_seed).await
        }
    }
}

async fn wire_services<U, L, R>(
    config: &ServerConfig,
    repositories: Repositories<U, L, R>,
    admin_seed: AdminSeed,
) -> Result<HttpState, Error>
where
    U: UserRepository + 'static,
    L: LotRepository + 'static,
    R: ReservationRepository + 'static,
{
    let Repositories {
        users,
        lots,
        reservations,
    } = repositories;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let tokens = Arc::new(JwtAccessTokens::new(
        &config.signing_secret,
        config.token_ttl,
        clock.clone(),
    ));

    let accounts = Arc::new(AccountService::new(
        users.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        tokens.clone(),
    ));
    match accounts.ensure_admin(admin_seed).await? {
        AdminSeedOutcome::Created(user_id) => info!(%user_id, "created bootstrap admin"),
        AdminSeedOutcome::AlreadyPresent => info!("admin account already present"),
    }

    let registry = Arc::new(
        LotRegistryService::new(lots.clone(), reservations.clone(), clock.clone())
            .with_hold_policy(config.hold_policy),
    );
    let lifecycle = Arc::new(ReservationService::new(
        ReservationPorts {
            lots: lots.clone(),
            reservations: reservations.clone(),
            users: users.clone(),
            notifier: Arc::new(config.notifier.clone()),
        },
        clock.clone(),
        config.hold_policy,
    ));
    let reports = Arc::new(BillingService::new(lots, reservations, users, clock));

    Ok(HttpState::new(HttpStatePorts {
        accounts,
        lots: registry,
        reservations: lifecycle,
        reports,
        tokens,
    }))
}
