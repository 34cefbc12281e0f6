use diesel::mysql::MysqlConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use std::time::Duration;
use thiserror::Error;

use crate::config::{ConfigError, DbConfig};

pub type DbPool = Pool<ConnectionManager<MysqlConnection>>;

const MAX_OPEN_CONNECTIONS: u32 = 25;
const MIN_IDLE_CONNECTIONS: u32 = 5;
const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Bound on the diagnostic connection test, covering the open phase.
const TEST_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("error opening database: {0}")]
    Open(String),

    #[error("error connecting to database: {0}")]
    Ping(String),
}

/// Builds the shared connection pool used by the article store.
pub fn create_pool(config: &DbConfig) -> Result<DbPool, ConnectError> {
    let dsn = config.dsn()?;
    let manager = ConnectionManager::<MysqlConnection>::new(dsn);

    Pool::builder()
        .max_size(MAX_OPEN_CONNECTIONS)
        .min_idle(Some(MIN_IDLE_CONNECTIONS))
        .max_lifetime(Some(MAX_CONNECTION_LIFETIME))
        .build(manager)
        .map_err(|err| ConnectError::Open(err.to_string()))
}

/// Opens a single short-lived connection and issues a liveness check.
///
/// The connection comes from a throwaway one-slot pool so the checkout
/// timeout bounds the open phase; everything is released when the pool
/// drops, on every exit path. The error distinguishes open-time failures
/// from liveness-check failures.
pub fn test_connection(config: &DbConfig) -> Result<(), ConnectError> {
    let dsn = config.dsn()?;
    let manager = ConnectionManager::<MysqlConnection>::new(dsn);

    let pool = Pool::builder()
        .max_size(1)
        .connection_timeout(TEST_CONNECTION_TIMEOUT)
        .build_unchecked(manager);

    let mut conn = pool
        .get()
        .map_err(|err| ConnectError::Open(err.to_string()))?;

    diesel::sql_query("SELECT 1")
        .execute(&mut conn)
        .map_err(|err| ConnectError::Ping(err.to_string()))?;

    Ok(())
}

/// Establishes the dedicated connection used for startup migrations.
pub fn establish_connection(config: &DbConfig) -> Result<MysqlConnection, ConnectError> {
    let dsn = config.dsn()?;
    MysqlConnection::establish(&dsn).map_err(|err| ConnectError::Open(err.to_string()))
}
