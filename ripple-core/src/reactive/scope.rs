//! Scope Implementation
//!
//! A Scope is a reactive computation: a callback that is re-run whenever one
//! of the signals it read on its last run changes.
//!
//! # How Scopes Work
//!
//! Every execution is a full unsubscribe-then-resubscribe cycle:
//!
//! 1. Cleanup: the scope removes itself from every subscriber map recorded in
//!    its dependency set, then clears the set.
//!
//! 2. The scope is pushed onto the execution context, so signals read by the
//!    callback subscribe it.
//!
//! 3. The callback runs.
//!
//! 4. The scope is popped, on every exit path.
//!
//! The dependency set after a run therefore matches exactly the signals read
//! during that run; a branch no longer taken leaves no stale edge behind.
//!
//! # Re-entrancy
//!
//! A scope may trigger its own re-execution through a signal it reads and
//! writes. Nothing guards against unbounded recursion; callers that
//! self-trigger must converge on their own.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::Result;

use super::context::ExecutionContext;
use super::subscriber::{unsubscribe, ScopeId, ScopeMap, SignalId, Subscribers};

type Callback = Box<dyn Fn() -> Result<()>>;

struct ScopeInner {
    id: ScopeId,

    /// The computation, with any bound arguments already attached.
    callback: Callback,

    /// Back-edges into the subscriber maps this scope is registered in.
    dependencies: RefCell<IndexMap<SignalId, Weak<RefCell<ScopeMap>>>>,

    /// Number of times the callback has been invoked.
    run_count: Cell<usize>,
}

/// A reactive computation unit.
///
/// Cloning a `Scope` yields another handle to the same computation.
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::{Scope, Signal};
///
/// let count = Signal::new(1);
/// let reader = count.clone();
/// let scope = Scope::new(move || {
///     println!("count = {}", reader.get());
///     Ok(())
/// });
///
/// scope.execute()?;
/// assert_eq!(scope.dependency_count(), 1);
/// # Ok::<(), ripple_core::ReactiveError>(())
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    /// Create a scope around a callback. The callback does not run until
    /// [`Scope::execute`] is called.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() -> Result<()> + 'static,
    {
        Self {
            inner: Rc::new(ScopeInner {
                id: ScopeId::new(),
                callback: Box::new(callback),
                dependencies: RefCell::new(IndexMap::new()),
                run_count: Cell::new(0),
            }),
        }
    }

    /// Create a scope whose callback receives the same bound arguments on
    /// every run. The arguments themselves are not reactive.
    pub fn with_args<A, F>(args: A, callback: F) -> Self
    where
        A: 'static,
        F: Fn(&A) -> Result<()> + 'static,
    {
        Self::new(move || callback(&args))
    }

    /// Get the scope's unique ID.
    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    /// Run the scope: drop every existing dependency, then invoke the
    /// callback with this scope on top of the execution context.
    ///
    /// The callback's failure is returned unchanged, after the context has
    /// been restored.
    pub fn execute(&self) -> Result<()> {
        self.cleanup();

        let _ctx = ExecutionContext::enter(self.clone());

        let run = self.inner.run_count.get() + 1;
        self.inner.run_count.set(run);
        trace!(
            scope = %self.inner.id,
            run,
            depth = ExecutionContext::depth(),
            "executing scope"
        );

        let result = (self.inner.callback)();

        match &result {
            Ok(()) => trace!(
                scope = %self.inner.id,
                dependencies = self.dependency_count(),
                "scope finished"
            ),
            Err(error) => debug!(scope = %self.inner.id, %error, "scope failed"),
        }

        result
    }

    /// Register this scope in a signal's subscriber map and record the
    /// back-edge.
    pub(crate) fn subscribe(&self, subscribers: &Subscribers) {
        subscribers.insert(self.clone());
        self.inner
            .dependencies
            .borrow_mut()
            .insert(subscribers.id(), subscribers.downgrade());
    }

    /// Remove this scope from every subscriber map it joined.
    fn cleanup(&self) {
        let dependencies = std::mem::take(&mut *self.inner.dependencies.borrow_mut());
        for scopes in dependencies.values() {
            unsubscribe(scopes, self.inner.id);
        }
    }

    /// Get the number of times the callback has been invoked.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Get the number of signals this scope currently depends on.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.borrow().len()
    }

    /// Signals this scope currently depends on, in the order first read.
    pub fn dependencies(&self) -> Vec<SignalId> {
        self.inner.dependencies.borrow().keys().copied().collect()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
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
    use std::cell::RefCell;

    #[test]
    fn scope_does_not_run_on_creation() {
        let scope = Scope::new(|| Ok(()));
        assert_eq!(scope.run_count(), 0);

        scope.execute().unwrap();
        assert_eq!(scope.run_count(), 1);
    }

    #[test]
    fn scope_is_active_while_running() {
        let seen = Rc::new(Cell::new(None));
        let seen_clone = seen.clone();

        let scope = Scope::new(move || {
            seen_clone.set(ExecutionContext::current_scope());
            Ok(())
        });

        scope.execute().unwrap();
        assert_eq!(seen.get(), Some(scope.id()));
        assert_eq!(ExecutionContext::current_scope(), None);
    }

    #[test]
    fn bound_arguments_are_passed_each_run() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();

        let scope = Scope::with_args((3, String::from("x")), move |(n, tag): &(i32, String)| {
            log_clone.borrow_mut().push(format!("{}{}", tag, n));
            Ok(())
        });

        scope.execute().unwrap();
        scope.execute().unwrap();
        assert_eq!(*log.borrow(), vec!["x3".to_string(), "x3".to_string()]);
    }

    #[test]
    fn subscribe_records_both_edges() {
        let subs = Subscribers::new(SignalId::new());
        let scope = Scope::new(|| Ok(()));

        scope.subscribe(&subs);
        scope.subscribe(&subs);

        assert!(subs.contains(scope.id()));
        assert_eq!(subs.len(), 1);
        assert_eq!(scope.dependencies(), vec![subs.id()]);
    }

    #[test]
    fn execute_clears_previous_edges() {
        let subs = Subscribers::new(SignalId::new());
        let scope = Scope::new(|| Ok(()));
        scope.subscribe(&subs);

        // The callback reads nothing, so the old edge must disappear.
        scope.execute().unwrap();

        assert!(!subs.contains(scope.id()));
        assert_eq!(scope.dependency_count(), 0);
    }

    #[test]
    fn failure_pops_context_and_propagates() {
        let scope = Scope::new(|| Err(ReactiveError::msg("nope")));

        let err = scope.execute().unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert_eq!(ExecutionContext::depth(), 0);
        assert_eq!(scope.run_count(), 1);
    }

    #[test]
    fn clone_shares_state() {
        let scope1 = Scope::new(|| Ok(()));
        let scope2 = scope1.clone();

        assert_eq!(scope1.id(), scope2.id());
        scope1.execute().unwrap();
        assert_eq!(scope2.run_count(), 1);
    }
}
