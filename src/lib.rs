//! Thread-scoped diagnostic logging.
//!
//! Each thread that logs gets its own file in a temporary directory. Lines are
//! timestamped, tagged with the thread name and flushed immediately. Call
//! [`clear`] when the thread is done to close its file.
//!
//! ## Usage
//!
//! ```rust,ignore
//! threadlog::log("starting")?;
//! threadlog::tlog!("processed {} items", 42)?;
//! threadlog::clear()?;
//! ```
//!
//! ## Log Format
//!
//! ```text
//! 2024-05-01 10:22:31,123 America/New_York [worker-1] starting
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod registry;
pub mod timestamp;

#[cfg(test)]
mod test_support;

pub use config::LoggerConfig;
pub use error::{LogError, LogErrorKind, LogResult};
pub use handle::LogHandle;
pub use registry::{ClearGuard, ThreadLogger};

use std::sync::OnceLock;

static GLOBAL: OnceLock<ThreadLogger> = OnceLock::new();

/// The process-wide logger used by [`log`], [`clear`] and [`tlog!`].
///
/// Initialized with [`LoggerConfig::from_env`] unless [`init_global`] ran first.
pub fn global() -> &'static ThreadLogger {
    GLOBAL.get_or_init(|| ThreadLogger::new(LoggerConfig::from_env()))
}

/// Installs the process-wide logger. Returns false if it already exists.
pub fn init_global(config: LoggerConfig) -> bool {
    GLOBAL.set(ThreadLogger::new(config)).is_ok()
}

/// Logs a line to the calling thread's file via the process-wide logger.
pub fn log<'a>(message: impl Into<Option<&'a str>>) -> LogResult<()> {
    global().log(message)
}

/// Closes the calling thread's file in the process-wide logger.
pub fn clear() -> LogResult<()> {
    global().clear()
}

/// Formats a message and logs it via the process-wide logger.
#[macro_export]
macro_rules! tlog {
    ($($arg:tt)*) => {
        $crate::log(::std::format!($($arg)*).as_str())
    };
}

#[cfg(test)]
#[path = "tests/global_tests.rs"]
mod tests;
