//! Registry mapping each thread to its open log handle.
//!
//! Per-thread lifecycle:
//! ```text
//! Absent --log()--> Open --clear()--> Absent
//! ```
//! A failed handle creation leaves the thread Absent, so the next `log()`
//! retries. A failed write leaves it Open. A thread that exits while Open is
//! cleared on its way out.

use crate::config::LoggerConfig;
use crate::error::LogResult;
use crate::handle::LogHandle;
use crate::timestamp::thread_display_name;
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

type SharedHandle = Arc<Mutex<LogHandle>>;
type HandleMap = Mutex<HashMap<ThreadId, SharedHandle>>;

thread_local! {
    static EXIT_HOOK: RefCell<ThreadExitHook> = RefCell::new(ThreadExitHook::new());
}

/// Thread-scoped file logger.
///
/// Each thread that calls [`ThreadLogger::log`] gets its own file, which
/// stays open until that thread calls [`ThreadLogger::clear`] or exits.
pub struct ThreadLogger {
    config: LoggerConfig,
    handles: Arc<HandleMap>,
}

impl ThreadLogger {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            handles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Appends one line to the calling thread's log, opening it first if needed.
    ///
    /// Passing `None` writes `<null message>`.
    pub fn log<'a>(&self, message: impl Into<Option<&'a str>>) -> LogResult<()> {
        let handle = self.get_or_create()?;
        let mut handle = lock(&handle);
        handle.write_line(message.into())
    }

    /// Closes the calling thread's log and forgets it.
    ///
    /// A no-op when the thread has nothing open. The entry is removed even
    /// if closing fails.
    pub fn clear(&self) -> LogResult<()> {
        let removed = self.entries().remove(&thread::current().id());
        let Some(shared) = removed else {
            return Ok(());
        };

        tracing::debug!(thread = %thread_display_name(), "Clearing thread log");
        close_shared(shared)
    }

    /// Path of the calling thread's open log, if any.
    pub fn current_log_path(&self) -> Option<PathBuf> {
        let handle = self.entries().get(&thread::current().id()).cloned()?;
        let path = lock(&handle).path().to_path_buf();
        Some(path)
    }

    /// Whether the calling thread currently has an open log.
    pub fn is_open(&self) -> bool {
        self.entries().contains_key(&thread::current().id())
    }

    /// Number of threads with an open log.
    pub fn open_handles(&self) -> usize {
        self.entries().len()
    }

    /// Returns a guard that clears the calling thread's log when dropped.
    pub fn scope(&self) -> ClearGuard<'_> {
        ClearGuard {
            logger: self,
            finished: false,
            _thread_bound: PhantomData,
        }
    }

    fn get_or_create(&self) -> LogResult<SharedHandle> {
        let id = thread::current().id();
        if let Some(handle) = self.entries().get(&id) {
            return Ok(Arc::clone(handle));
        }

        // Only this thread inserts under its own id, so the slot is still
        // empty once the file is open. The map lock is not held across I/O.
        let handle = Arc::new(Mutex::new(LogHandle::create(&self.config)?));
        self.entries().insert(id, Arc::clone(&handle));
        self.watch_thread_exit();
        Ok(handle)
    }

    /// Makes the calling thread close its entry in this registry when it exits.
    fn watch_thread_exit(&self) {
        let registry = Arc::downgrade(&self.handles);
        // Fails only while the thread's locals are being torn down.
        let _ = EXIT_HOOK.try_with(|hook| hook.borrow_mut().watch(registry));
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ThreadId, SharedHandle>> {
        lock(&self.handles)
    }

    #[cfg(test)]
    pub(crate) fn install(&self, handle: LogHandle) {
        self.entries()
            .insert(thread::current().id(), Arc::new(Mutex::new(handle)));
    }
}

impl std::fmt::Debug for ThreadLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadLogger")
            .field("config", &self.config)
            .field("open_handles", &self.open_handles())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Closes a handle that has already been removed from its registry.
fn close_shared(shared: SharedHandle) -> LogResult<()> {
    // Clones only live inside calls made by the owning thread, so once the
    // entry is removed the registry held the last reference.
    match Arc::into_inner(shared) {
        Some(handle) => handle
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .close(),
        None => Ok(()),
    }
}

/// Per-thread list of registries holding an entry for this thread.
///
/// Dropped with the thread's locals, closing whatever the thread left open.
struct ThreadExitHook {
    id: ThreadId,
    registries: Vec<Weak<HandleMap>>,
}

impl ThreadExitHook {
    fn new() -> Self {
        Self {
            id: thread::current().id(),
            registries: Vec::new(),
        }
    }

    fn watch(&mut self, registry: Weak<HandleMap>) {
        self.registries.retain(|known| known.strong_count() > 0);
        if !self.registries.iter().any(|known| known.ptr_eq(&registry)) {
            self.registries.push(registry);
        }
    }
}

impl Drop for ThreadExitHook {
    fn drop(&mut self) {
        for registry in self.registries.drain(..) {
            let Some(registry) = registry.upgrade() else {
                continue;
            };
            let removed = lock(&registry).remove(&self.id);
            if let Some(shared) = removed {
                if let Err(e) = close_shared(shared) {
                    tracing::warn!("Failed to close log of exiting thread: {}", e);
                }
            }
        }
    }
}

/// Clears the creating thread's log on drop.
///
/// Not `Send`: clearing always applies to the current thread, so the guard
/// must stay on the thread that created it.
#[must_use = "dropping the guard immediately clears the log"]
pub struct ClearGuard<'a> {
    logger: &'a ThreadLogger,
    finished: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl ClearGuard<'_> {
    /// Clears now and reports the outcome instead of logging it on drop.
    pub fn finish(mut self) -> LogResult<()> {
        self.finished = true;
        self.logger.clear()
    }
}

impl Drop for ClearGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.logger.clear() {
            tracing::warn!("Failed to clear thread log on drop: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
