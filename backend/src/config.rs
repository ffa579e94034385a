//! Application settings loaded via OrthoConfig.
//!
//! Three groups share the `PARKING` prefix:
//!
//! - [`AppSettings`] (`PARKING_*`): listener, storage, tokens, holds, and
//!   the notification queue. Also accepted as CLI flags.
//! - [`DatabaseSettings`] (`PARKING_DB_*`): connection pool tuning.
//! - [`AdminSettings`] (`PARKING_ADMIN_*`): the bootstrap admin account.
//!
//! Pool and admin settings come from the environment or a configuration
//! file only. Unset fields fall back to the defaults applied by the
//! accessors below.

use std::ffi::OsString;
use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{Address, AdminSeed, EmailAddress, FullName, HoldPolicy, Password, Pincode};
use crate::outbound::notifications::DEFAULT_QUEUE_CAPACITY;
use crate::outbound::persistence::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_MAX_SIZE, DEFAULT_MIN_IDLE, PoolConfig,
};
use crate::outbound::security::DEFAULT_TOKEN_TTL_SECS;

const PROGRAM_NAME: &str = "parking-backend";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_ADMIN_FULL_NAME: &str = "Admin User";
const ADMIN_ADDRESS: &str = "Admin HQ, 1 Infinite Loop";
const ADMIN_PINCODE: &str = "000000";

/// Shortest accepted signing secret, in bytes.
pub const JWT_SECRET_MIN_LEN: usize = 32;

/// Problems found while loading or interpreting settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load {group} settings: {message}")]
    Load { group: &'static str, message: String },
    #[error("bind_addr {value:?} is not a socket address: {message}")]
    InvalidBindAddr { value: String, message: String },
    #[error("admin {field} is invalid: {message}")]
    InvalidAdminSeed { field: &'static str, message: String },
    #[error("jwt_secret must be at least {min} bytes")]
    JwtSecretTooShort { min: usize },
    #[error("jwt_secret is required; set PARKING_JWT_SECRET or allow an ephemeral secret")]
    MissingJwtSecret,
    #[error(
        "admin password is required; set PARKING_ADMIN_PASSWORD or PARKING_ADMIN_ALLOW_DEFAULT_PASSWORD"
    )]
    MissingAdminPassword,
}

/// Key material for signing access tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningSecret {
    /// Supplied by configuration; tokens survive restarts.
    Configured(Vec<u8>),
    /// Generated at startup; every restart invalidates issued tokens.
    Ephemeral(Vec<u8>),
}

impl SigningSecret {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Configured(bytes) | Self::Ephemeral(bytes) => bytes,
        }
    }
}

/// Core runtime configuration.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PARKING")]
pub struct AppSettings {
    /// Socket address the HTTP server listens on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without it the in-memory store is used.
    pub database_url: Option<String>,
    /// HS256 signing secret for access tokens.
    pub jwt_secret: Option<String>,
    /// Generate a throwaway signing secret when none is configured.
    #[ortho_config(default = false)]
    pub allow_ephemeral_secret: bool,
    /// Access token lifetime in seconds.
    pub token_ttl_secs: Option<u64>,
    /// How long an unconfirmed hold keeps its spot, in seconds.
    pub hold_timeout_secs: Option<u64>,
    /// Notifications buffered ahead of the delivery worker.
    pub notification_queue_capacity: Option<usize>,
}

impl AppSettings {
    /// Listening address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse()
            .map_err(|err: std::net::AddrParseError| ConfigError::InvalidBindAddr {
                value: raw.to_owned(),
                message: err.to_string(),
            })
    }

    /// Database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }

    /// Token signing secret.
    ///
    /// Debug builds, or `allow_ephemeral_secret`, fall back to a random
    /// secret when none is configured.
    pub fn signing_secret(&self) -> Result<SigningSecret, ConfigError> {
        match self.jwt_secret.as_deref() {
            Some(secret) if secret.len() < JWT_SECRET_MIN_LEN => {
                Err(ConfigError::JwtSecretTooShort {
                    min: JWT_SECRET_MIN_LEN,
                })
            }
            Some(secret) => Ok(SigningSecret::Configured(secret.as_bytes().to_vec())),
            None if self.allow_ephemeral_secret || cfg!(debug_assertions) => {
                let mut bytes = Uuid::new_v4().as_bytes().to_vec();
                bytes.extend_from_slice(Uuid::new_v4().as_bytes());
                Ok(SigningSecret::Ephemeral(bytes))
            }
            None => Err(ConfigError::MissingJwtSecret),
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS))
    }

    pub fn hold_policy(&self) -> HoldPolicy {
        HoldPolicy::new(Duration::from_secs(
            self.hold_timeout_secs
                .unwrap_or(HoldPolicy::DEFAULT_TIMEOUT_SECS),
        ))
    }

    /// Notification queue capacity; at least one slot.
    pub fn notification_queue_capacity(&self) -> usize {
        self.notification_queue_capacity
            .unwrap_or(DEFAULT_QUEUE_CAPACITY)
            .max(1)
    }
}

/// Connection pool tuning.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PARKING_DB")]
pub struct DatabaseSettings {
    /// Cap on open connections.
    pub max_connections: Option<u32>,
    /// Connections kept open while idle.
    pub idle_connections: Option<u32>,
    /// Checkout timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
}

impl DatabaseSettings {
    /// Pool configuration for `database_url`.
    pub fn pool_config(&self, database_url: &str) -> PoolConfig {
        PoolConfig::new(database_url)
            .with_max_size(self.max_connections.unwrap_or(DEFAULT_MAX_SIZE))
            .with_min_idle(Some(self.idle_connections.unwrap_or(DEFAULT_MIN_IDLE)))
            .with_connection_timeout(
                self.connect_timeout_secs
                    .map_or(DEFAULT_CONNECTION_TIMEOUT, Duration::from_secs),
            )
    }
}

/// Bootstrap admin account, created at startup when no admin exists.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PARKING_ADMIN")]
pub struct AdminSettings {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    /// Seed the well-known default password when none is configured.
    #[ortho_config(default = false)]
    pub allow_default_password: bool,
}

impl AdminSettings {
    /// Validated admin seed.
    ///
    /// Release builds refuse the default password unless
    /// `allow_default_password` is set.
    pub fn admin_seed(&self) -> Result<AdminSeed, ConfigError> {
        self.seed(cfg!(debug_assertions))
    }

    /// True when the seed falls back to the default password.
    pub fn uses_default_password(&self) -> bool {
        self.password.is_none()
    }

    fn seed(&self, development: bool) -> Result<AdminSeed, ConfigError> {
        if self.uses_default_password() && !(development || self.allow_default_password) {
            return Err(ConfigError::MissingAdminPassword);
        }
        let value = |field: &Option<String>, default: &str| {
            field.clone().unwrap_or_else(|| default.to_owned())
        };

        Ok(AdminSeed {
            full_name: seed_field(
                "full_name",
                FullName::new(value(&self.full_name, DEFAULT_ADMIN_FULL_NAME)),
            )?,
            email: seed_field(
                "email",
                EmailAddress::new(value(&self.email, DEFAULT_ADMIN_EMAIL)),
            )?,
            password: seed_field(
                "password",
                Password::new(&value(&self.password, DEFAULT_ADMIN_PASSWORD)),
            )?,
            address: seed_field("address", Address::new(ADMIN_ADDRESS))?,
            pincode: seed_field("pincode", Pincode::new(ADMIN_PINCODE))?,
        })
    }
}

fn seed_field<T, E: std::fmt::Display>(
    field: &'static str,
    result: Result<T, E>,
) -> Result<T, ConfigError> {
    result.map_err(|err| ConfigError::InvalidAdminSeed {
        field,
        message: err.to_string(),
    })
}

/// Every settings group, loaded together at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub admin: AdminSettings,
}

impl Settings {
    /// Load from the process arguments, environment, and config files.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args_os())
    }

    /// Load with explicit CLI arguments; the first is the program name.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let app = AppSettings::load_from_iter(args).map_err(|err| ConfigError::Load {
            group: "app",
            message: err.to_string(),
        })?;
        let database = DatabaseSettings::load_from_iter([OsString::from(PROGRAM_NAME)])
            .map_err(|err| ConfigError::Load {
                group: "database",
                message: err.to_string(),
            })?;
        let admin = AdminSettings::load_from_iter([OsString::from(PROGRAM_NAME)]).map_err(
            |err| ConfigError::Load {
                group: "admin",
                message: err.to_string(),
            },
        )?;
        Ok(Self {
            app,
            database,
            admin,
        })
    }

    /// Pool configuration, or `None` when no database is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.app
            .database_url()
            .map(|url| self.database.pool_config(url))
    }
}
