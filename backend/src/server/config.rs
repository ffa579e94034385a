//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration;

use parking_backend::domain::HoldPolicy;
use parking_backend::outbound::notifications::QueuedNotifier;
use parking_backend::outbound::persistence::DbPool;
use parking_backend::outbound::security::DEFAULT_TOKEN_TTL_SECS;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) signing_secret: Vec<u8>,
    pub(crate) token_ttl: Duration,
    pub(crate) hold_policy: HoldPolicy,
    pub(crate) notifier: QueuedNotifier,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration with the default token lifetime
    /// and hold policy, backed by the in-memory store.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, signing_secret: Vec<u8>, notifier: QueuedNotifier) -> Self {
        Self {
            bind_addr,
            signing_secret,
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            hold_policy: HoldPolicy::default(),
            notifier,
            db_pool: None,
        }
    }

    /// Attach a database connection pool for the persistence adapters.
    ///
    /// Without a pool every repository port is served by the in-memory
    /// store, which loses its contents on restart.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_hold_policy(mut self, policy: HoldPolicy) -> Self {
        self.hold_policy = policy;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
