//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and behind the `test-support` feature.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{
    AccessTokens, Accounts, Notification, Notifier, NotifierError, PasswordHasher,
    PasswordHashingError,
};
use crate::domain::{
    AccountService, Address, AdminSeed, BillingService, EmailAddress, FullName, HoldPolicy,
    Identity, LoginCredentials, LotRegistryService, Password, PasswordHash, Pincode, Registration,
    RegistrationParts, ReservationPorts, ReservationService,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::memory::InMemoryParkingStore;
use crate::outbound::security::{DEFAULT_TOKEN_TTL_SECS, JwtAccessTokens};

/// Clock whose current instant only moves when a test advances it.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}",)
            }
        };
        *self.lock_clock() += delta;
    }

    pub fn advance_minutes(&self, minutes: i64) {
        *self.lock_clock() += TimeDelta::minutes(minutes);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// A fixed UTC instant in March 2026, for readable test timelines.
///
/// # Examples
/// ```
/// use parking_backend::test_support::march;
///
/// assert_eq!(march(14, 9, 30).to_rfc3339(), "2026-03-14T09:30:00+00:00");
/// ```
pub fn march(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0).single() {
        Some(instant) => instant,
        None => panic!("invalid March 2026 timestamp: {day} {hour}:{minute}"),
    }
}

/// Password hasher that stores the password verbatim behind a marker.
///
/// Argon2 is deliberately slow; handler and integration tests use this
/// instead so suites stay fast.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextHasher;

const PLAIN_PREFIX: &str = "plain$";

impl PasswordHasher for PlainTextHasher {
    fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHashingError> {
        Ok(PasswordHash::new(format!("{PLAIN_PREFIX}{}", password.expose())))
    }

    fn verify(
        &self,
        password: &Password,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHashingError> {
        hash.as_ref()
            .strip_prefix(PLAIN_PREFIX)
            .map(|stored| stored == password.expose())
            .ok_or_else(|| PasswordHashingError::malformed("missing plain-text marker"))
    }
}

/// Notifier that keeps every notification for later inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier(Mutex<Vec<Notification>>);

impl RecordingNotifier {
    /// Notifications handed over so far, oldest first.
    pub fn sent(&self) -> Vec<Notification> {
        match self.0.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => panic!("notifier mutex"),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifierError> {
        match self.0.lock() {
            Ok(mut guard) => guard.push(notification),
            Err(_) => panic!("notifier mutex"),
        }
        Ok(())
    }
}

/// Email of the admin seeded by [`MemoryStack::seed_admin`].
pub const ADMIN_EMAIL: &str = "admin@example.com";
/// Password of the admin seeded by [`MemoryStack::seed_admin`].
pub const ADMIN_PASSWORD: &str = "admin123";
/// Signing secret used by [`MemoryStack`] tokens.
pub const TEST_JWT_SECRET: &[u8] = b"test-signing-secret";

/// Default admin seed used across tests.
pub fn admin_seed() -> AdminSeed {
    let seed = || -> Result<AdminSeed, String> {
        Ok(AdminSeed {
            full_name: FullName::new("Admin User").map_err(|e| e.to_string())?,
            email: EmailAddress::new(ADMIN_EMAIL).map_err(|e| e.to_string())?,
            password: Password::new(ADMIN_PASSWORD).map_err(|e| e.to_string())?,
            address: Address::new("Admin HQ, 1 Infinite Loop").map_err(|e| e.to_string())?,
            pincode: Pincode::new("000000").map_err(|e| e.to_string())?,
        })
    };
    match seed() {
        Ok(seed) => seed,
        Err(error) => panic!("invalid admin seed: {error}"),
    }
}

type MemoryAccounts = AccountService<InMemoryParkingStore, PlainTextHasher, JwtAccessTokens>;

/// Every service wired over one [`InMemoryParkingStore`], a controllable
/// clock, and a recording notifier.
pub struct MemoryStack {
    pub store: Arc<InMemoryParkingStore>,
    pub clock: Arc<MutableClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub tokens: Arc<JwtAccessTokens>,
    pub accounts: Arc<MemoryAccounts>,
    pub state: HttpState,
}

impl MemoryStack {
    /// Wire a stack starting at `now` with the default hold policy.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_hold_policy(now, HoldPolicy::default())
    }

    /// Wire a stack starting at `now` with a custom hold policy.
    pub fn with_hold_policy(now: DateTime<Utc>, hold_policy: HoldPolicy) -> Self {
        let store = Arc::new(InMemoryParkingStore::new());
        let clock = Arc::new(MutableClock::new(now));
        let notifier = Arc::new(RecordingNotifier::default());
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let tokens = Arc::new(JwtAccessTokens::new(
            TEST_JWT_SECRET,
            Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            dyn_clock.clone(),
        ));
        let accounts = Arc::new(AccountService::new(
            store.clone(),
            Arc::new(PlainTextHasher),
            tokens.clone(),
        ));
        let lots = Arc::new(
            LotRegistryService::new(store.clone(), store.clone(), dyn_clock.clone())
                .with_hold_policy(hold_policy),
        );
        let reservations = Arc::new(ReservationService::new(
            ReservationPorts {
                lots: store.clone(),
                reservations: store.clone(),
                users: store.clone(),
                notifier: notifier.clone(),
            },
            dyn_clock.clone(),
            hold_policy,
        ));
        let reports = Arc::new(BillingService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            dyn_clock,
        ));
        let state = HttpState::new(HttpStatePorts {
            accounts: accounts.clone(),
            lots,
            reservations,
            reports,
            tokens: tokens.clone(),
        });
        Self {
            store,
            clock,
            notifier,
            tokens,
            accounts,
            state,
        }
    }

    /// Seed the default admin and return its bearer token.
    pub async fn seed_admin(&self) -> String {
        if let Err(error) = self.accounts.ensure_admin(admin_seed()).await {
            panic!("admin seeding failed: {error}");
        }
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Register a user account and return its bearer token.
    pub async fn register_user(&self, email: &str) -> String {
        let parts = RegistrationParts {
            full_name: "Test Driver",
            email,
            password: "secret-pass",
            address: "12 Test Street",
            pincode: "560001",
        };
        let registration = match Registration::try_from_parts(parts) {
            Ok(registration) => registration,
            Err(error) => panic!("invalid registration for {email}: {error}"),
        };
        match self.accounts.register(registration).await {
            Ok(session) => session.token.token,
            Err(error) => panic!("registration failed for {email}: {error}"),
        }
    }

    /// Sign in and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let credentials = match LoginCredentials::try_from_parts(email, password) {
            Ok(credentials) => credentials,
            Err(error) => panic!("invalid credentials for {email}: {error}"),
        };
        match self.accounts.login(&credentials).await {
            Ok(session) => session.token.token,
            Err(error) => panic!("login failed for {email}: {error}"),
        }
    }

    /// Identity carried by a token this stack issued.
    pub fn identity(&self, token: &str) -> Identity {
        match self.tokens.verify(token) {
            Ok(identity) => identity,
            Err(error) => panic!("token rejected: {error}"),
        }
    }
}
