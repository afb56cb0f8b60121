use log::{error, info};

use laptime_logger::build_rocket;
use laptime_logger::config::Config;
use laptime_logger::errors::{CustomResult, Error};
use laptime_logger::modules::helpers::logging::setup_logging;
use laptime_logger::modules::models::general::{init_pool, run_migrations};

#[rocket::main]
async fn main() -> CustomResult<()> {
    let config = Config::load()?;
    setup_logging(&config).map_err(|error| Error::LoggingError {
        reason: error.to_string(),
    })?;
    config.log_loaded();

    let pool = init_pool(&config.database_url, config.database_pool_size)?;
    run_migrations(&pool)?;
    info!(target: "main", "database ready at {}", config.database_url);

    // start the webserver
    if let Err(error) = build_rocket(&config, pool).launch().await {
        error!(target: "main", "server stopped: {}", error);
        return Err(Error::LaunchError {
            reason: error.to_string(),
        });
    }

    Ok(())
}
