use std::convert::Infallible;
use std::sync::{Mutex, OnceLock, PoisonError};

/// A value constructed at most once, on first demand.
///
/// Reads go through the `OnceLock` without locking. Construction is
/// serialized by `init_lock` and re-checks the cell under it, so a failed
/// initializer leaves the cell empty for the next caller to retry.
pub struct LazySingleton<T> {
    cell: OnceLock<T>,
    init_lock: Mutex<()>,
}

impl<T> LazySingleton<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        match self.get_or_try_init(|| Ok::<T, Infallible>(init())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        // The lock guards no data, so a panic in another initializer is not fatal here.
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        let value = init()?;
        Ok(self.cell.get_or_init(|| value))
    }
}

impl<T> Default for LazySingleton<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Singleton {
    data: String,
}

impl Singleton {
    pub fn data(&self) -> &str {
        &self.data
    }
}

static INSTANCE: LazySingleton<Singleton> = LazySingleton::new();

/// The instance, if some call has constructed it.
pub fn current() -> Option<&'static Singleton> {
    INSTANCE.get()
}

/// Return the process-wide instance, constructing it from `data` on first use.
///
/// Once the instance exists `data` is ignored. An empty payload only fails the
/// call that would have constructed the instance.
pub fn get_instance(data: &str) -> anyhow::Result<&'static Singleton> {
    INSTANCE.get_or_try_init(|| {
        if data.trim().is_empty() {
            tracing::warn!("rejected empty singleton payload");
            anyhow::bail!("singleton payload must not be empty");
        }
        tracing::info!(data, "constructing singleton");
        Ok(Singleton {
            data: data.to_owned(),
        })
    })
}
