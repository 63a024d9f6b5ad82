mod init;

pub use init::{init_logging, parse_level, parse_rotation};

use std::path::PathBuf;
use tracing::Level;
use tracing_appender::rolling::Rotation;

/// Log filename inside the log directory.
pub const LOG_FILENAME: &str = "aimgr.log";

/// Default log directory, `~/.aimgr/logs`.
#[must_use]
pub fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".aimgr")
        .join("logs")
}

/// Configuration for the logging system.
///
/// The log file gets everything at `log_level`; the terminal only gets
/// `stderr_level` and above so command output stays readable.
pub struct LogConfig {
    pub log_dir: PathBuf,
    pub log_level: Level,
    pub stderr_level: Level,
    pub json_format: bool,
    pub rotation: Rotation,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            log_level: Level::INFO,
            stderr_level: Level::WARN,
            json_format: false,
            rotation: Rotation::DAILY,
        }
    }
}

#[cfg(test)]
#[path = "../logging_tests.rs"]
mod logging_tests;
