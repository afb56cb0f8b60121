use std::fs;
use std::path::Path;

use fern::Dispatch;

use crate::config::Config;

fn level_filter(verbosity: &str) -> log::LevelFilter {
    match verbosity.to_uppercase().as_str() {
        "OFF" => log::LevelFilter::Off,
        "ERROR" => log::LevelFilter::Error,
        "WARN" => log::LevelFilter::Warn,
        "DEBUG" => log::LevelFilter::Debug,
        "TRACE" => log::LevelFilter::Trace,
        // default to info
        _ => log::LevelFilter::Info,
    }
}

/// # setup logging
/// log to stdout and to the configured log file.
/// rocket's own request logging is kept at warn to keep the file readable.
pub fn setup_logging(config: &Config) -> Result<(), fern::InitError> {
    if let Some(parent) = Path::new(&config.log_file).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let base_config = Dispatch::new()
        .level(level_filter(&config.logging_level))
        .level_for("rocket", log::LevelFilter::Warn)
        .level_for("_", log::LevelFilter::Warn)
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        });

    base_config
        .chain(std::io::stdout())
        .chain(fern::log_file(&config.log_file)?)
        .apply()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_levels_default_to_info() {
        assert_eq!(level_filter("loud"), log::LevelFilter::Info);
        assert_eq!(level_filter("debug"), log::LevelFilter::Debug);
        assert_eq!(level_filter("OFF"), log::LevelFilter::Off);
    }
}
