//! An open per-thread log file.

use crate::config::LoggerConfig;
use crate::error::{LogError, LogResult};
use crate::timestamp::{format_line, format_timestamp, thread_display_name, NULL_MESSAGE};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Give up after this many name collisions in a row.
const MAX_CREATE_ATTEMPTS: u32 = 16;

/// One buffered, append-only log stream bound to a file on disk.
///
/// Closing consumes the handle, so a closed handle can never be written to.
pub struct LogHandle {
    path: PathBuf,
    writer: BufWriter<Box<dyn Write + Send>>,
}

impl LogHandle {
    /// Creates a uniquely named file in the configured temp directory and
    /// opens a handle on it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The temp directory cannot be resolved ([`LogError::Config`])
    /// - The file cannot be created ([`LogError::Create`])
    pub fn create(config: &LoggerConfig) -> LogResult<Self> {
        Self::create_announcing(config, &mut std::io::stdout())
    }

    /// Like [`LogHandle::create`], printing the announcement lines to `out`.
    pub(crate) fn create_announcing(config: &LoggerConfig, out: &mut dyn Write) -> LogResult<Self> {
        let dir = config.resolve_temp_dir()?;
        if config.announce {
            let _ = writeln!(out, "Temp directory determined to '{}'", dir.display());
        }

        let (path, file) = create_unique_file(&dir, &config.prefix, &config.suffix)?;
        let thread_name = thread_display_name();
        if config.announce {
            let _ = writeln!(
                out,
                "Thread '{}' will write log to '{}'",
                thread_name,
                path.display()
            );
        }
        tracing::debug!(thread = %thread_name, path = %path.display(), "Opened thread log");

        Ok(Self::from_writer(path, file))
    }

    /// Wraps an arbitrary writer. `path` is only used for reporting.
    pub fn from_writer(path: PathBuf, writer: impl Write + Send + 'static) -> Self {
        Self {
            path,
            writer: BufWriter::new(Box::new(writer)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one formatted line for the calling thread and flushes it.
    pub fn write_line(&mut self, message: Option<&str>) -> LogResult<()> {
        let line = format_line(&format_timestamp(), &thread_display_name(), message);
        self.writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.flush())
            .map_err(|source| LogError::Write {
                path: self.path.clone(),
                message: message.unwrap_or(NULL_MESSAGE).to_string(),
                source,
            })
    }

    /// Flushes and closes the stream. The file stays on disk.
    pub fn close(self) -> LogResult<()> {
        let Self { path, writer } = self;
        match writer.into_inner() {
            Ok(inner) => {
                drop(inner);
                Ok(())
            }
            Err(err) => {
                let (source, writer) = err.into_parts();
                // Dropping a BufWriter flushes it; discard the unwritten bytes
                // so the failed write is not attempted again.
                let _ = writer.into_parts();
                Err(LogError::Close { path, source })
            }
        }
    }
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Creates `<dir>/<prefix><unique><suffix>` without clobbering an existing file.
fn create_unique_file(dir: &Path, prefix: &str, suffix: &str) -> LogResult<(PathBuf, File)> {
    let mut last_collision = None;
    for _ in 0..MAX_CREATE_ATTEMPTS {
        let path = dir.join(format!("{}{}{}", prefix, Uuid::new_v4().simple(), suffix));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => last_collision = Some(e),
            Err(source) => {
                return Err(LogError::Create {
                    dir: dir.to_path_buf(),
                    source,
                })
            }
        }
    }

    Err(LogError::Create {
        dir: dir.to_path_buf(),
        source: last_collision.unwrap_or_else(|| {
            std::io::Error::new(ErrorKind::AlreadyExists, "no unique file name available")
        }),
    })
}

#[cfg(test)]
#[path = "tests/handle_tests.rs"]
mod tests;
