//! Shared helpers for unit tests.

use crate::config::LoggerConfig;
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Sets or removes an environment variable, restoring the previous value on drop.
///
/// Tests using this must be `#[serial]`.
pub(crate) struct EnvVarGuard {
    key: &'static str,
    previous: Option<OsString>,
}

impl EnvVarGuard {
    pub(crate) fn set(key: &'static str, value: impl AsRef<OsStr>) -> Self {
        let previous = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, previous }
    }

    pub(crate) fn unset(key: &'static str) -> Self {
        let previous = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, previous }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.previous {
            Some(value) => std::env::set_var(self.key, value),
            None => std::env::remove_var(self.key),
        }
    }
}

/// A config writing into `dir` without printing to stdout.
pub(crate) fn quiet_config(dir: &Path) -> LoggerConfig {
    LoggerConfig::default()
        .with_temp_dir(dir)
        .with_announce(false)
}

/// Matches one complete log line (without the newline).
pub(crate) fn line_regex(thread: &str, message: &str) -> Regex {
    let pattern = format!(
        r"^\d{{4}}-\d{{2}}-\d{{2}} \d{{2}}:\d{{2}}:\d{{2}},\d{{3}} \S+ \[{}\] {}$",
        regex::escape(thread),
        regex::escape(message)
    );
    Regex::new(&pattern).expect("valid line pattern")
}

/// Lines of a log file, without terminators.
pub(crate) fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("log file readable")
        .lines()
        .map(str::to_string)
        .collect()
}

/// Files directly inside `dir`.
pub(crate) fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("dir readable")
        .map(|entry| entry.expect("dir entry").path())
        .collect();
    files.sort();
    files
}

/// A writer whose every write fails.
pub(crate) struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("disk on fire"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A writer that fails a fixed number of times, then accepts and counts writes.
pub(crate) struct FlakyWriter {
    failures_left: usize,
    writes: Arc<AtomicUsize>,
}

impl FlakyWriter {
    pub(crate) fn new(failures: usize) -> (Self, Arc<AtomicUsize>) {
        let writes = Arc::new(AtomicUsize::new(0));
        let writer = Self {
            failures_left: failures,
            writes: Arc::clone(&writes),
        };
        (writer, writes)
    }
}

impl Write for FlakyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(io::Error::other("transient failure"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
