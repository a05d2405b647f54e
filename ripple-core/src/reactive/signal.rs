//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which scopes depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a scope, the signal registers that scope
//!    as a subscriber.
//!
//! 2. When a signal is written, all subscribers are notified: executed right
//!    away, or deferred into the innermost open batch.
//!
//! 3. Writes are unconditional. Setting a value equal to the current one
//!    still notifies.
//!
//! # Ownership
//!
//! The value and the subscriber map are shared between clones of the same
//! signal. Subscribed scopes hold only a weak back-reference to the map.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use crate::error::Result;

use super::context;
use super::subscriber::{ScopeId, SignalId, Subscribers};

/// A reactive signal holding a value of type T.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::Signal;
///
/// let count = Signal::new(0);
///
/// // Read the value
/// assert_eq!(count.get(), 0);
///
/// // Update the value (notifies subscribers)
/// count.set(5)?;
/// assert_eq!(count.get(), 5);
/// # Ok::<(), ripple_core::ReactiveError>(())
/// ```
pub struct Signal<T: 'static> {
    /// The current value.
    value: Rc<RefCell<T>>,

    /// Scopes that read this signal on their last run.
    subscribers: Subscribers,
}

impl<T: 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            subscribers: Subscribers::new(SignalId::new()),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> SignalId {
        self.subscribers.id()
    }

    /// Get the current value.
    ///
    /// If called within a scope, this also registers that scope as a
    /// subscriber.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.track();
        self.value.borrow().clone()
    }

    /// Read the current value by reference, registering the dependency.
    ///
    /// `f` must not write to this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.value.borrow())
    }

    /// Register the running scope as a subscriber without reading the value.
    pub fn track(&self) {
        context::register_dependency(&self.subscribers);
    }

    /// Get the current value without tracking dependencies.
    ///
    /// Use this when you need to read the value without establishing
    /// a reactive dependency.
    pub fn leak(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// Set a new value and notify subscribers.
    ///
    /// Fails with the first error raised by a subscriber; subscribers after
    /// it are not run in this pass.
    pub fn set(&self, value: T) -> Result<()> {
        *self.value.borrow_mut() = value;
        self.notify()
    }

    /// Update the value using a function of the current value.
    ///
    /// The read is untracked.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = f(&self.value.borrow());
        self.set(new_value)
    }

    /// Notify all subscribers that the value has changed.
    ///
    /// The subscriber set is copied first: scopes re-subscribe while they
    /// run, which must not disturb the pass in progress.
    pub fn notify(&self) -> Result<()> {
        let snapshot = self.subscribers.snapshot();
        if snapshot.is_empty() {
            return Ok(());
        }

        if let Some(pending) = context::defer(snapshot) {
            for scope in pending {
                scope.execute()?;
            }
        }

        Ok(())
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Check whether the given scope currently depends on this signal.
    pub fn has_subscriber(&self, scope: ScopeId) -> bool {
        self.subscribers.contains(scope)
    }
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<T: Debug + 'static> Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id())
            .field("value", &*self.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
