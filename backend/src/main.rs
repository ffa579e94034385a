//! Backend entry-point: loads settings, prepares storage, and serves the
//! parking REST API.

mod server;

use std::time::Duration;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use parking_backend::config::{Settings, SigningSecret};
use parking_backend::inbound::http::health::HealthState;
use parking_backend::outbound::notifications::{LogNotificationSink, QueuedNotifier};
use parking_backend::outbound::persistence::{DbPool, run_pending_migrations};

use server::{ServerConfig, create_server};

/// How long queued notifications may take to drain after shutdown.
const NOTIFICATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        Settings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let bind_addr = settings.app.bind_addr()?;
    let admin_seed = settings.admin.admin_seed()?;
    if settings.admin.uses_default_password() {
        warn!("seeding the admin account with the default password");
    }
    let signing_secret = match settings.app.signing_secret()? {
        SigningSecret::Configured(bytes) => bytes,
        SigningSecret::Ephemeral(bytes) => {
            warn!("using temporary token signing secret (dev only)");
            bytes
        }
    };

    let (notifier, worker) = QueuedNotifier::spawn(
        settings.app.notification_queue_capacity(),
        LogNotificationSink,
    );
    let mut config = ServerConfig::new(bind_addr, signing_secret, notifier)
        .with_token_ttl(settings.app.token_ttl())
        .with_hold_policy(settings.app.hold_policy());

    match settings.pool_config() {
        Some(pool_config) => {
            run_pending_migrations(pool_config.database_url())
                .await
                .wrap_err("failed to apply database migrations")?;
            let pool = DbPool::new(pool_config)
                .await
                .wrap_err("failed to connect to the database")?;
            config = config.with_db_pool(pool);
        }
        None => warn!("no database configured; using the in-memory store"),
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config, admin_seed)
        .await
        .wrap_err("failed to start HTTP server")?;
    info!(%bind_addr, "listening");
    server.await.wrap_err("HTTP server stopped with an error")?;
    health_state.mark_unhealthy();

    if tokio::time::timeout(NOTIFICATION_DRAIN_TIMEOUT, worker)
        .await
        .is_err()
    {
        warn!("notification queue did not drain before shutdown");
    }
    Ok(())
}
