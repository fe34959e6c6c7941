/// Structured logging for the tank monitoring service
///
/// Provides context-rich logging with endpoint and tank identifiers,
/// timestamps, and severity levels. Supports both console output
/// and file-based logging for daemon operations.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use crate::model::ApiError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Which backend resource (or the service itself) a log line is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Tanks,
    TankMaster,
    History,
    Notifications,
    Reports,
    OfflineLog,
    SmsLog,
    Users,
    System,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tanks => write!(f, "TANKS"),
            Endpoint::TankMaster => write!(f, "MASTER"),
            Endpoint::History => write!(f, "HISTORY"),
            Endpoint::Notifications => write!(f, "NOTIFY"),
            Endpoint::Reports => write!(f, "REPORTS"),
            Endpoint::OfflineLog => write!(f, "OFFLINE"),
            Endpoint::SmsLog => write!(f, "SMS"),
            Endpoint::Users => write!(f, "USERS"),
            Endpoint::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// The backend reported the condition itself (`{ok:false}`)
    Expected,
    /// Transport or server failure - the banner shows until the next good poll
    Unexpected,
    /// Response arrived but could not be understood; treated as "no data"
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, source: Endpoint, tank_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = format_entry(
            &Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            level,
            source,
            tank_id,
            message,
        );
        let tank_part = tank_id.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, tank_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, tank_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {}
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// One file-log line: `<ts> <LEVEL> <ENDPOINT>[ [tank]]: <message>`.
fn format_entry(
    timestamp: &str,
    level: LogLevel,
    source: Endpoint,
    tank_id: Option<&str>,
    message: &str,
) -> String {
    let tank_part = tank_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, source, tank_part, message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, source: Endpoint, tank_id: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, source, tank_id, message);
        }
    }
}

/// Log a general informational message
pub fn info(source: Endpoint, tank_id: Option<&str>, message: &str) {
    emit(LogLevel::Info, source, tank_id, message);
}

/// Log a warning message
pub fn warn(source: Endpoint, tank_id: Option<&str>, message: &str) {
    emit(LogLevel::Warning, source, tank_id, message);
}

/// Log an error message
pub fn error(source: Endpoint, tank_id: Option<&str>, message: &str) {
    emit(LogLevel::Error, source, tank_id, message);
}

/// Log a debug message
pub fn debug(source: Endpoint, tank_id: Option<&str>, message: &str) {
    emit(LogLevel::Debug, source, tank_id, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

pub fn classify_api_failure(err: &ApiError) -> FailureType {
    match err {
        ApiError::Network(_) | ApiError::Http { .. } | ApiError::NotJson { .. } => {
            FailureType::Unexpected
        }
        ApiError::Logical(_) => FailureType::Expected,
        ApiError::Shape(_) => FailureType::Unknown,
    }
}

/// Log a backend failure with automatic classification
pub fn log_api_failure(source: Endpoint, operation: &str, err: &ApiError) {
    let failure_type = classify_api_failure(err);

    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(source, None, &message),
        FailureType::Unexpected => error(source, None, &message),
        FailureType::Unknown => warn(source, None, &message),
    }
}

// ---------------------------------------------------------------------------
// Poll Summary Logging
// ---------------------------------------------------------------------------

/// Log one tank poll cycle: how many tanks, how many of them are offline,
/// and how many carry an issue.
pub fn log_poll_summary(source: Endpoint, total: usize, offline: usize, issues: usize) {
    let message = format!(
        "Poll complete: {} tanks, {} online, {} offline, {} issues",
        total,
        total.saturating_sub(offline),
        offline,
        issues
    );

    if total > 0 && offline == total {
        error(source, None, &message);
    } else if offline > 0 || issues > 0 {
        warn(source, None, &message);
    } else {
        info(source, None, &message);
    }
}
