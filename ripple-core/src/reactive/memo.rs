//! Memo Implementation
//!
//! A Memo is a cached derived value: a private signal kept up to date by a
//! dedicated scope that recomputes a function.
//!
//! # How Memos Work
//!
//! 1. On construction, the memo runs its computation once and caches the
//!    result in its signal.
//!
//! 2. Reading the memo returns the cached value and subscribes the reader to
//!    the memo's signal.
//!
//! 3. When a signal read by the computation changes, the memo's scope re-runs
//!    (re-tracking its own dependencies) and writes the fresh value, which in
//!    turn notifies the memo's readers.
//!
//! Recomputation is eager: it follows the same discipline as any other scope.
//! No equality check is made on the recomputed value.

use std::fmt::{self, Debug};

use crate::error::Result;

use super::scope::Scope;
use super::signal::Signal;
use super::subscriber::SignalId;

/// A cached derived value that recomputes when its dependencies change.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::{Memo, Signal};
///
/// let count = Signal::new(2);
/// let source = count.clone();
/// let doubled = Memo::new(move || source.get() * 2)?;
/// assert_eq!(doubled.get(), 4);
///
/// count.set(5)?;
/// assert_eq!(doubled.get(), 10);
/// # Ok::<(), ripple_core::ReactiveError>(())
/// ```
pub struct Memo<T: 'static> {
    /// Cached value; `None` only until the first computation has finished.
    signal: Signal<Option<T>>,

    /// The scope that recomputes the value.
    scope: Scope,
}

impl<T: 'static> Memo<T> {
    /// Create a memo and compute its first value.
    pub fn new<F>(compute: F) -> Result<Self>
    where
        F: Fn() -> T + 'static,
    {
        Self::try_new(move || Ok(compute()))
    }

    /// Create a memo from a fallible computation.
    ///
    /// A failure of the first computation is returned from here; later
    /// failures propagate to whoever wrote the upstream signal.
    pub fn try_new<F>(compute: F) -> Result<Self>
    where
        F: Fn() -> Result<T> + 'static,
    {
        let signal = Signal::new(None);

        let target = signal.clone();
        let scope = Scope::new(move || {
            let value = compute()?;
            target.set(Some(value))
        });
        scope.execute()?;

        Ok(Self { signal, scope })
    }

    /// Get the cached value, subscribing the running scope to future
    /// recomputations.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.signal
            .with(Option::clone)
            .expect("memo computes its value during construction")
    }

    /// Subscribe the running scope without reading the value.
    pub fn track(&self) {
        self.signal.track();
    }

    /// Get the cached value without tracking dependencies.
    pub fn leak(&self) -> T
    where
        T: Clone,
    {
        self.signal
            .leak()
            .expect("memo computes its value during construction")
    }

    /// Get the ID of the memo's internal signal.
    pub fn id(&self) -> SignalId {
        self.signal.id()
    }

    /// The scope that recomputes this memo.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Get the number of scopes reading this memo.
    pub fn subscriber_count(&self) -> usize {
        self.signal.subscriber_count()
    }
}

impl<T: 'static> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl<T: Debug + 'static> Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.id())
            .field("value", &self.signal)
            .field("recomputations", &self.scope.run_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactiveError;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn memo_computes_on_construction() {
        let call_count = Rc::new(Cell::new(0));
        let call_count_clone = call_count.clone();

        let memo = Memo::new(move || {
            call_count_clone.set(call_count_clone.get() + 1);
            42
        })
        .unwrap();

        // Computed before the first read
        assert_eq!(call_count.get(), 1);
        assert_eq!(memo.get(), 42);
        assert_eq!(call_count.get(), 1);
    }

    #[test]
    fn memo_caches_value() {
        let call_count = Rc::new(Cell::new(0));
        let call_count_clone = call_count.clone();

        let memo = Memo::new(move || {
            call_count_clone.set(call_count_clone.get() + 1);
            42
        })
        .unwrap();

        assert_eq!(memo.get(), 42);
        assert_eq!(memo.get(), 42);
        assert_eq!(memo.leak(), 42);
        assert_eq!(call_count.get(), 1);
        assert_eq!(memo.scope().run_count(), 1);
    }

    #[test]
    fn memo_recomputes_when_dependency_changes() {
        let source = Signal::new(3);
        let reader = source.clone();
        let memo = Memo::new(move || reader.get() + 1).unwrap();

        assert_eq!(memo.get(), 4);

        source.set(10).unwrap();
        assert_eq!(memo.get(), 11);
        assert_eq!(memo.scope().run_count(), 2);
    }

    #[test]
    fn memo_scope_depends_only_on_what_it_read() {
        let source = Signal::new(1);
        let reader = source.clone();
        let memo = Memo::new(move || reader.get()).unwrap();

        assert_eq!(memo.scope().dependencies(), vec![source.id()]);
        assert!(source.has_subscriber(memo.scope().id()));
    }

    #[test]
    fn first_failure_is_returned_from_constructor() {
        let result = Memo::<i32>::try_new(|| Err(ReactiveError::msg("no input")));
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "no input");
    }

    #[test]
    fn later_failure_propagates_to_writer() {
        let source = Signal::new(1);
        let reader = source.clone();
        let memo = Memo::try_new(move || {
            let value = reader.get();
            if value < 0 {
                return Err(ReactiveError::msg("negative"));
            }
            Ok(value)
        })
        .unwrap();

        let err = source.set(-1).unwrap_err();
        assert_eq!(err.to_string(), "negative");
        // The cache keeps the last good value.
        assert_eq!(memo.leak(), 1);
    }

    #[test]
    fn memo_clone_shares_state() {
        let memo1 = Memo::new(|| 42).unwrap();
        let memo2 = memo1.clone();

        assert_eq!(memo1.id(), memo2.id());
        assert_eq!(memo2.get(), 42);
        assert_eq!(memo2.scope().id(), memo1.scope().id());
    }
}
