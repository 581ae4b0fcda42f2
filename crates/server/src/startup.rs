use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use configs::AppConfig;
use migration::MigratorTrait;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use service::emoji::domain::DatabaseInfo;
use service::emoji::repository::{IconRepository, SeaOrmIconRepository};
use service::emoji::EmojiService;

use crate::dispatcher::Dispatcher;
use crate::errors::StartupError;
use crate::{routes, transport};

/// Load `config.toml` (or `CONFIG_PATH`) plus env overrides, validated.
pub fn load_config() -> Result<AppConfig, StartupError> {
    AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(format!("{e:#}")))
}

async fn bind(addr: String) -> Result<TcpListener, StartupError> {
    TcpListener::bind(&addr).await.map_err(|source| StartupError::Bind { addr, source })
}

/// Connect storage, run migrations when enabled, and build the shared dispatcher.
pub async fn build_dispatcher(cfg: &AppConfig) -> anyhow::Result<Arc<Dispatcher>> {
    let db = models::db::connect_with_config(&cfg.database)
        .await
        .context("connect database")?;
    if cfg.database.run_migrations {
        migration::Migrator::up(&db, None).await.context("run migrations")?;
        info!(service = "server", event = "migrated", "database migrations applied");
    }

    let database = DatabaseInfo::from_config(&cfg.database);
    if database.is_none() {
        warn!("database name or backend unknown; database_name will answer NOT FOUND");
    }
    let repo: Arc<dyn IconRepository> = Arc::new(SeaOrmIconRepository::new(db));
    Ok(Arc::new(Dispatcher::new(Arc::new(EmojiService::new(repo, database)))))
}

/// Resolves once `rx` observes `true` or its sender is gone.
async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Serve HTTP and the message transport until `shutdown` resolves or either listener fails.
pub async fn run_until<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let dispatcher = build_dispatcher(&cfg).await?;

    let http_listener = bind(cfg.server.bind_addr()).await?;
    let transport_listener = bind(cfg.transport.bind_addr()).await?;
    info!(
        service = "server",
        http = %cfg.server.bind_addr(),
        transport = %cfg.transport.bind_addr(),
        "starting emoji service"
    );

    // one signal fans out to both listeners
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown.await;
        let _ = stop_tx.send(true);
    });

    let app = routes::build_router(Arc::clone(&dispatcher));
    let http = {
        let rx = stop_rx.clone();
        async move {
            axum::serve(http_listener, app)
                .with_graceful_shutdown(stopped(rx))
                .await
                .context("http server")
        }
    };
    let tcp = async move {
        transport::serve_with_shutdown(transport_listener, dispatcher, stopped(stop_rx))
            .await
            .context("message transport")
    };

    tokio::try_join!(http, tcp)?;
    info!(service = "server", event = "drained", "listeners closed");
    Ok(())
}

/// Serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    run_until(cfg, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(service = "server", event = "shutdown_signal", "received Ctrl+C, shutting down");
        }
    })
    .await
}
