use crate::numerical::error::NumericalError;
use chrono::Local;
use log::info;
use simplelog::*;
use std::fs::File;
use std::path::Path;

/// map textual loglevel ("debug", "info", "warn", "error", "off"/"none") to a filter
pub fn parse_loglevel(level: &str) -> Result<LevelFilter, NumericalError> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::Trace),
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" | "warning" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "off" | "none" => Ok(LevelFilter::Off),
        other => Err(NumericalError::InvalidInput(format!(
            "loglevel must be debug, info, warn, error or off, got '{}'",
            other
        ))),
    }
}

/// name of the log file written into `dir`: log_<date>_<time>.txt
pub fn log_file_name(dir: &Path) -> std::path::PathBuf {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    dir.join(format!("log_{}.txt", date_and_time))
}

/// Install terminal logger (and optionally a file logger in `log_dir`).
/// Returns Ok(false) if a logger was already installed by someone else; that is not an error
pub fn init_logger(loglevel: Option<&str>, log_dir: Option<&Path>) -> Result<bool, NumericalError> {
    let level = match loglevel {
        Some(level) => parse_loglevel(level)?,
        None => LevelFilter::Info,
    };
    if level == LevelFilter::Off {
        return Ok(false);
    }
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));
    if let Some(dir) = log_dir {
        let path = log_file_name(dir);
        let file = File::create(&path).map_err(|e| {
            NumericalError::InvalidInput(format!("cannot create log file {}: {}", path.display(), e))
        })?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }
    match CombinedLogger::init(loggers) {
        Ok(()) => {
            info!("Program started with loglevel: {}", level);
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}
