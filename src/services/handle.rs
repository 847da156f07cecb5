use std::sync::{Arc, OnceLock};

/// Shared store handle that is created once and then reused
///
/// Owned by the process entry point and injected into the matcher and the
/// notifier. Initializing again returns the existing handle.
pub struct StoreHandle<S> {
    cell: OnceLock<Arc<S>>,
}

impl<S> StoreHandle<S> {
    pub fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// The store, if it has been initialized
    pub fn get(&self) -> Option<Arc<S>> {
        self.cell.get().cloned()
    }

    pub fn get_or_init(&self, init: impl FnOnce() -> S) -> Arc<S> {
        self.cell.get_or_init(|| Arc::new(init())).clone()
    }

    /// Fallible variant of [`get_or_init`](Self::get_or_init)
    ///
    /// If two callers race, the loser's store is dropped and both get the
    /// winner's handle.
    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<S, E>) -> Result<Arc<S>, E> {
        if let Some(existing) = self.cell.get() {
            return Ok(existing.clone());
        }

        let created = Arc::new(init()?);
        Ok(self.cell.get_or_init(|| created).clone())
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<S> Default for StoreHandle<S> {
    fn default() -> Self {
        Self::new()
    }
}
