//! Logging macros gated by a per-module `ENABLE_LOGS` switch.
//!
//! Usage:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("chat session {} started", session_id);
//! ```
//!
//! Noisy modules (the telemetry parsers run on every realtime update) can
//! flip their switch off without touching `RUST_LOG`.

/// Info-level log, emitted only when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Debug-level variant of [`log_info!`].
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Warn-level variant of [`log_info!`].
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

const DEFAULT_FILTER: &str = "info";

/// Installs the `env_logger` backend. `RUST_LOG` wins when set; otherwise
/// everything at info and above is logged.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = builder(env_logger::DEFAULT_FILTER_ENV).try_init();
}

fn builder(filter_var: &str) -> env_logger::Builder {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter(filter_var)
            .default_filter_or(DEFAULT_FILTER),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn defaults_to_info_when_unset() {
        let logger = builder("SMART_MUSA_TEST_LOG_UNSET").build();
        assert_eq!(logger.filter(), LevelFilter::Info);
    }

    #[test]
    fn explicit_filter_overrides_default() {
        std::env::set_var("SMART_MUSA_TEST_LOG_DEBUG", "debug");
        let logger = builder("SMART_MUSA_TEST_LOG_DEBUG").build();
        assert_eq!(logger.filter(), LevelFilter::Debug);
    }
}
