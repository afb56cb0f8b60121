use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sql_types::Integer;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{error, info};

use crate::errors::{CustomResult, Error};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// sqlite only enforces foreign keys when asked to, per connection.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// # create the connection pool
///
/// ## Arguments
/// * `database_url` - path of the sqlite database file
/// * `size` - maximum amount of pooled connections
///
/// ## Returns
/// * `DbPool` - the pool, with every connection enforcing foreign keys
pub fn init_pool(database_url: &str, size: u32) -> CustomResult<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);

    Pool::builder()
        .max_size(size.max(1))
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout: Duration::from_secs(5),
        }))
        .build(manager)
        .map_err(|error| {
            error!(target: "models/general:init_pool", "Error creating pool for {}: {}", database_url, error);
            Error::PoolError { source: error }
        })
}

/// apply every embedded migration that has not run yet
pub fn run_migrations(pool: &DbPool) -> CustomResult<()> {
    let mut pooled = pool.get()?;
    let conn: &mut SqliteConnection = &mut pooled;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|error| Error::MigrationError {
            reason: error.to_string(),
        })?;

    for version in applied {
        info!(target: "models/general:run_migrations", "applied migration {}", version);
    }

    Ok(())
}

#[derive(QueryableByName)]
struct Ping {
    #[diesel(sql_type = Integer)]
    alive: i32,
}

/// # check that the database answers
/// runs `SELECT 1` on the given connection
pub fn ping(conn: &mut SqliteConnection) -> QueryResult<()> {
    let ping = diesel::sql_query("SELECT 1 AS alive").get_result::<Ping>(conn)?;

    if ping.alive == 1 {
        Ok(())
    } else {
        Err(diesel::result::Error::NotFound)
    }
}

#[cfg(test)]
pub mod test_helpers {
    use tempfile::TempDir;

    use super::*;

    /// a migrated pool on a fresh database file. keep the dir alive for the
    /// duration of the test.
    pub fn test_pool() -> (TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = init_pool(path.to_str().unwrap(), 2).unwrap();
        run_migrations(&pool).unwrap();

        (dir, pool)
    }
}
