//! Process-Wide Singletons
//!
//! Two flavors of process-global value back the component registry and are
//! available to client code:
//!
//! - [`LazyGlobal`] — default-constructed on first touch, then shared for the
//!   process lifetime. Used for values whose construction needs no input
//!   (counters, registries).
//! - [`ProvidedGlobal`] — empty until explicitly injected, typically around a
//!   deserialization pass that needs to point collaborators at a live store.
//!
//! ## Concurrency
//! Both are safe for first-use from multiple threads: `LazyGlobal` goes
//! through `OnceLock`, and access is serialized by a `parking_lot::RwLock`.
//! Writes to a `LazyGlobal` are expected to be rare (once per component type
//! for the registry); reads dominate.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

/// Lazily-initialized process-wide value.
///
/// Declared as a `static` and default-constructed the first time any thread
/// touches it. Access is closure-based so the lock scope is explicit at the
/// call site.
pub struct LazyGlobal<T> {
    cell: OnceLock<RwLock<T>>,
}

impl<T: Default> LazyGlobal<T> {
    /// Creates an empty global. `const` so it can back a `static`.
    pub const fn new() -> Self {
        Self { cell: OnceLock::new() }
    }

    fn storage(&self) -> &RwLock<T> {
        self.cell.get_or_init(|| RwLock::new(T::default()))
    }

    /// Runs `f` with shared access to the value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.storage().read())
    }

    /// Runs `f` with exclusive access to the value.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.storage().write())
    }
}

impl<T: Default> Default for LazyGlobal<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicitly-injected process-wide value.
///
/// Starts empty; a collaborator calls [`ProvidedGlobal::provide`] before
/// dependents read it. The main client is deserialization, where reference
/// fixups need to find "the manager currently being restored".
pub struct ProvidedGlobal<T> {
    cell: RwLock<Option<Arc<T>>>,
}

impl<T> ProvidedGlobal<T> {
    /// Creates an empty injection point. `const` so it can back a `static`.
    pub const fn new() -> Self {
        Self { cell: RwLock::new(None) }
    }

    /// Installs a value, replacing any previous one.
    pub fn provide(&self, value: Arc<T>) {
        *self.cell.write() = Some(value);
    }

    /// Constructs and installs a value in one step.
    pub fn init(&self, value: T) {
        self.provide(Arc::new(value));
    }

    /// Returns the installed value, if any.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.read().clone()
    }

    /// Removes the installed value.
    pub fn destroy(&self) {
        *self.cell.write() = None;
    }
}

impl<T> Default for ProvidedGlobal<T> {
    fn default() -> Self {
        Self::new()
    }
}
