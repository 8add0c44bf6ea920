use log::LevelFilter;
use once_cell::sync::OnceCell;
use simplelog::*;
use std::fs::File;
use std::path::PathBuf;

/// Logging configuration for the Prok client
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Master switch to enable/disable all logging
    pub enabled: bool,
    /// Path to the log file
    pub log_file: PathBuf,
    /// Whether to clear the log file on startup
    pub clear_on_startup: bool,
    /// Feature flags for specific logging categories
    pub features: LogFeatures,
    /// Overall log level
    pub level: LevelFilter,
}

/// Feature flags for specific logging categories
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogFeatures {
    /// Log HTTP requests and failures
    pub api_calls: bool,
    /// Log feed state transitions (resets, appends, likes)
    pub feed: bool,
    /// Log general debug messages
    pub general: bool,
}

static FEATURES: OnceCell<LogFeatures> = OnceCell::new();

/// Feature flags installed by [`init_logging`], or the defaults before that.
pub fn features() -> LogFeatures {
    FEATURES.get().copied().unwrap_or_default()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file: PathBuf::from("prok_debug.log"),
            clear_on_startup: true,
            features: LogFeatures::default(),
            level: LevelFilter::Info,
        }
    }
}

impl Default for LogFeatures {
    fn default() -> Self {
        Self {
            api_calls: true,
            feed: true,
            general: true,
        }
    }
}

impl LogConfig {
    /// Create a new log configuration with all features disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Create a minimal log configuration (only errors and warnings)
    pub fn minimal() -> Self {
        Self {
            enabled: true,
            level: LevelFilter::Warn,
            features: LogFeatures {
                api_calls: false,
                feed: false,
                general: false,
            },
            ..Default::default()
        }
    }

    /// Create a verbose log configuration (all features enabled)
    pub fn verbose() -> Self {
        Self {
            enabled: true,
            level: LevelFilter::Trace,
            features: LogFeatures::default(),
            ..Default::default()
        }
    }
}

/// Initialize the logging system with the given configuration
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let _ = FEATURES.set(if config.enabled {
        config.features
    } else {
        LogFeatures {
            api_calls: false,
            feed: false,
            general: false,
        }
    });

    if !config.enabled {
        let _ = WriteLogger::init(LevelFilter::Off, Config::default(), std::io::sink());
        return Ok(());
    }

    if config.clear_on_startup {
        let _ = File::create(&config.log_file)?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|builder| builder)
        .build();

    WriteLogger::init(config.level, log_config, log_file)?;

    log::info!(
        "Logging initialized: file={}, level={:?}",
        config.log_file.display(),
        config.level
    );
    log::debug!("Log features: {:?}", config.features);

    Ok(())
}

/// Macro for logging API calls
#[macro_export]
macro_rules! log_api_call {
    ($($arg:tt)*) => {
        if $crate::logging::features().api_calls {
            log::debug!(target: "api_calls", $($arg)*);
        }
    };
}

/// Macro for logging feed state transitions
#[macro_export]
macro_rules! log_feed {
    ($($arg:tt)*) => {
        if $crate::logging::features().feed {
            log::debug!(target: "feed", $($arg)*);
        }
    };
}

/// Macro for general debug logging
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::logging::features().general {
            log::debug!(target: "general", $($arg)*);
        }
    };
}
