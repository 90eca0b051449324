//! Logger setup and module-gated logging macros.
//!
//! Modules that want to silence their own chatter define a flag and use the
//! crate-root macros instead of calling `log` directly:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_debug, log_error};
//!
//! log_debug!("events leg covered for {}", camera);
//! ```

use log::LevelFilter;

/// Install `env_logger`. `RUST_LOG` wins over `default_level`; an
/// unparseable level falls back to `info`. Repeat calls are ignored.
pub fn init_logging(default_level: &str) {
    let level = default_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::Info);

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

/// `log::debug!` behind the calling module's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// `log::info!` behind the calling module's `ENABLE_LOGS` const.
///
/// The caller must have `const ENABLE_LOGS: bool` in scope; the macro does
/// not define one.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// `log::warn!` behind the calling module's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// `log::error!` behind the calling module's `ENABLE_LOGS` const.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    mod quiet {
        const ENABLE_LOGS: bool = false;

        pub fn emit() -> bool {
            crate::log_debug!("suppressed {}", 1);
            crate::log_info!("suppressed");
            crate::log_warn!("suppressed");
            crate::log_error!("suppressed");
            ENABLE_LOGS
        }
    }

    mod chatty {
        const ENABLE_LOGS: bool = true;

        pub fn emit() -> bool {
            crate::log_debug!("emitted {}", 1);
            crate::log_info!("emitted");
            crate::log_warn!("emitted");
            crate::log_error!("emitted");
            ENABLE_LOGS
        }
    }

    #[test]
    fn macros_read_the_callers_flag() {
        super::init_logging("debug");
        super::init_logging("not-a-level");
        assert!(!quiet::emit());
        assert!(chatty::emit());
    }
}
