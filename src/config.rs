use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use log::info;

use crate::errors::{CustomResult, Error};

/// tokens live at most a year
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// settings read from the environment (or a `.env` file).
/// the listener itself is configured through rocket's `ROCKET_*` variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_pool_size: u32,
    pub logging_level: String,
    pub log_file: String,
    pub token_ttl_hours: i64,
    pub diagnostic_interval_secs: u64,
    pub background_jobs: bool,
    /// keys that were not set and fell back to their default
    pub defaults_used: Vec<String>,
}

impl Config {
    /// # load the configuration
    /// nothing is logged here, logging is set up from the result. call
    /// `log_loaded` once it is.
    ///
    /// ## Returns
    /// * `Config` - The parsed and range checked configuration
    pub fn load() -> CustomResult<Config> {
        dotenv().ok();
        let mut defaults_used = Vec::new();
        let defaults = &mut defaults_used;

        let config = Config {
            database_url: try_load("DATABASE_URL", "laptimes.db", defaults)?,
            database_pool_size: try_load("DATABASE_POOL_SIZE", "8", defaults)?,
            logging_level: try_load("LOGGING_LEVEL", "INFO", defaults)?,
            log_file: try_load("LOG_FILE", "logs/app.log", defaults)?,
            token_ttl_hours: try_load("TOKEN_TTL_HOURS", "24", defaults)?,
            diagnostic_interval_secs: try_load("DIAGNOSTIC_INTERVAL_SECS", "300", defaults)?,
            background_jobs: try_load("BACKGROUND_JOBS", "true", defaults)?,
            defaults_used,
        };

        config.validate()?;
        Ok(config)
    }

    /// # check the ranges of the parsed values
    /// a ttl outside `1..=MAX_TOKEN_TTL_HOURS` would hand out expired tokens
    /// or overflow the expiry timestamp.
    pub fn validate(&self) -> CustomResult<()> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(Error::ConfigError {
                key: "TOKEN_TTL_HOURS".to_string(),
                reason: format!("must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {}", self.token_ttl_hours),
            });
        }

        if self.diagnostic_interval_secs == 0 {
            return Err(Error::ConfigError {
                key: "DIAGNOSTIC_INTERVAL_SECS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.database_pool_size == 0 {
            return Err(Error::ConfigError {
                key: "DATABASE_POOL_SIZE".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// logs the values in use, to be called after `setup_logging`
    pub fn log_loaded(&self) {
        for key in &self.defaults_used {
            info!(target: "config", "{key} not set, using its default");
        }

        info!(
            target: "config",
            "database {} (pool {}), tokens valid {}h, diagnostic every {}s, background jobs {}",
            self.database_url,
            self.database_pool_size,
            self.token_ttl_hours,
            self.diagnostic_interval_secs,
            if self.background_jobs { "on" } else { "off" }
        );
    }

    pub fn diagnostic_interval(&self) -> Duration {
        Duration::from_secs(self.diagnostic_interval_secs)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "laptimes.db".to_string(),
            database_pool_size: 8,
            logging_level: "INFO".to_string(),
            log_file: "logs/app.log".to_string(),
            token_ttl_hours: 24,
            diagnostic_interval_secs: 300,
            background_jobs: true,
            defaults_used: Vec::new(),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str, defaults_used: &mut Vec<String>) -> CustomResult<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        defaults_used.push(key.to_string());
        default.to_string()
    });

    raw.trim().parse::<T>().map_err(|error| Error::ConfigError {
        key: key.to_string(),
        reason: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_values_and_falls_back_to_defaults() {
        let mut defaults = Vec::new();

        env::set_var("LAPTIME_TEST_POOL", " 4 ");
        let size: u32 = try_load("LAPTIME_TEST_POOL", "8", &mut defaults).unwrap();
        assert_eq!(size, 4);

        let interval: u64 = try_load("LAPTIME_TEST_UNSET_INTERVAL", "300", &mut defaults).unwrap();
        assert_eq!(interval, 300);
        assert_eq!(defaults, vec!["LAPTIME_TEST_UNSET_INTERVAL".to_string()]);
    }

    #[test]
    fn rejects_unparsable_values() {
        env::set_var("LAPTIME_TEST_BAD_BOOL", "sometimes");
        let result: CustomResult<bool> = try_load("LAPTIME_TEST_BAD_BOOL", "true", &mut Vec::new());
        assert!(matches!(result, Err(Error::ConfigError { .. })));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(Config::default().validate().is_ok());

        for token_ttl_hours in [0, -5, MAX_TOKEN_TTL_HOURS + 1, i64::MAX] {
            let config = Config {
                token_ttl_hours,
                ..Config::default()
            };
            assert!(
                matches!(config.validate(), Err(Error::ConfigError { ref key, .. }) if key == "TOKEN_TTL_HOURS"),
                "ttl {token_ttl_hours} accepted"
            );
        }

        let config = Config {
            diagnostic_interval_secs: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError { ref key, .. }) if key == "DIAGNOSTIC_INTERVAL_SECS"));

        let config = Config {
            database_pool_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn longest_ttl_still_yields_a_valid_expiry() {
        let config = Config {
            token_ttl_hours: MAX_TOKEN_TTL_HOURS,
            ..Config::default()
        };
        config.validate().unwrap();

        let expiry = chrono::Utc::now().naive_utc().checked_add_signed(config.token_ttl());
        assert!(expiry.is_some());
    }
}
