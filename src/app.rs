use crate::api;
use crate::config::Config;
use crate::db::{self, Connection, ConnectionPool, MigrationError};
use crate::filesystem::Directory;
use axum::ServiceExt;
use axum::extract::Request;
use diesel::r2d2::PoolError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::layer::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Could not load configuration. Details:\n{0}")]
    Config(#[from] ::config::ConfigError),
    #[error("Could not create data directory. Details:\n{0}")]
    DataDirectory(#[from] std::io::Error),
    #[error("Could not build HTTP client. Details:\n{0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("Could not run migrations. Details:\n{0}")]
    Migration(MigrationError),
    #[error("Could not connect to the database. Details:\n{0}")]
    Pool(#[from] PoolError),
}

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub connection_pool: ConnectionPool,
    pub config: Arc<Config>,
    pub http_client: reqwest::Client,
    /// Serializes read-modify-write cycles of the JSON gallery file.
    pub gallery_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, InitializationError> {
        let connection_pool = db::create_connection_pool(&config)?;
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("ArtBuddy/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            connection_pool,
            config: Arc::new(config),
            http_client,
            gallery_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Returns a connection to the database from the connection pool.
    pub fn get_connection(&self) -> Result<Connection, PoolError> {
        self.connection_pool.get()
    }
}

pub fn enable_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug,tower_http=debug,axum=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Loads configuration, creates the data directories, and brings the database schema up to date.
pub fn initialize() -> Result<AppState, InitializationError> {
    let config = Config::load()?;
    prepare(config)
}

/// Sets up a state from an already loaded `config`.
pub fn prepare(config: Config) -> Result<AppState, InitializationError> {
    std::fs::create_dir_all(config.path(Directory::Images))?;
    if let Some(database_directory) = std::path::Path::new(&config.database_url).parent() {
        std::fs::create_dir_all(database_directory)?;
    }

    let state = AppState::new(config)?;
    let mut conn = state.get_connection()?;
    db::run_migrations(&mut conn).map_err(InitializationError::Migration)?;
    Ok(state)
}

pub async fn run(state: AppState) -> std::io::Result<()> {
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = NormalizePathLayer::trim_trailing_slash().layer(api::routes(state));

    let listener = TcpListener::bind(address).await?;
    info!("ArtBuddy API listening on {}", listener.local_addr()?);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler. Details:\n{err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install signal handler. Details:\n{err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Stopping server...");
}
