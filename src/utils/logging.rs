//! Conditional logging macros gated on a module-level `ENABLE_LOGS` const.
//!
//! Modules that want switchable logging define `const ENABLE_LOGS: bool = true;`
//! and use the crate-root macros:
//!
//! ```rust
//! use sensekit::log_info;
//!
//! const ENABLE_LOGS: bool = true;
//!
//! log_info!("capture queued");
//! ```

use log::LevelFilter;

/// Initialize the process-wide logger. Reads `RUST_LOG`, defaults to info.
/// Calling `init` twice is an error in `env_logger`, so this is left to the
/// outermost entry point of the host binary.
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();
}

/// Conditional info logging; the calling module must define `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Conditional warn logging; the calling module must define `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Conditional error logging; the calling module must define `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

/// Conditional debug logging; the calling module must define `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}
