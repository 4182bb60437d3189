use crate::config::Config;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::time::Duration;

pub type ConnectionPool = Pool<ConnectionManager<SqliteConnection>>;
pub type Connection = PooledConnection<ConnectionManager<SqliteConnection>>;
pub type MigrationError = Box<dyn std::error::Error + Send + Sync>;

/// Builds a pool of connections to the SQLite database at `config.database_url`.
/// The database file is created if it doesn't exist.
pub fn create_connection_pool(config: &Config) -> Result<ConnectionPool, PoolError> {
    let num_threads = tokio::runtime::Handle::try_current()
        .map(|handle| handle.metrics().num_workers())
        .unwrap_or(1);
    let manager = ConnectionManager::new(&config.database_url);
    Pool::builder()
        .max_size(num_threads.max(4) as u32)
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout: BUSY_TIMEOUT,
        }))
        .test_on_check_out(true)
        .build(manager)
}

/// Runs embedded migrations on the database. Used to create the schema on first start.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), MigrationError> {
    conn.run_pending_migrations(MIGRATIONS).map(|_| ())
}

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-connection settings. SQLite forgets pragmas between connections.
/// Foreign keys stay unenforced, so deletes leave dependent rows in place.
#[derive(Debug)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        let pragmas = format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL;",
            self.busy_timeout.as_millis()
        );
        conn.batch_execute(&pragmas).map_err(diesel::r2d2::Error::QueryError)
    }
}
