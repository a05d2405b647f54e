//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, scopes (effects),
//! memos and batches.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a running scope, the signal registers that scope as a subscriber.
//! When the signal is written, every subscriber re-runs.
//!
//! ## Scopes and effects
//!
//! A Scope is a computation that re-runs whenever a signal it read on its
//! last run changes. [`effect`] creates a scope and runs it right away.
//! Dependencies are re-collected from scratch on every run, so a scope that
//! branches on state only listens to the signals of the branch it took.
//!
//! ## Memos
//!
//! A Memo is a derived value backed by its own signal and recompute scope.
//! Readers of a memo transitively depend on whatever the memo read.
//!
//! ## Batches
//!
//! A Batch defers notifications until it closes, then runs each affected
//! scope once.
//!
//! # Implementation Notes
//!
//! The system uses a thread-local execution context to detect dependencies
//! automatically: when a signal is read, we check for a running scope and,
//! if there is one, record the edge in both directions. All primitives are
//! single-threaded (`!Send`).
//!
//! There is no cycle detection. A scope that writes a signal it depends on
//! re-runs itself synchronously and must converge on its own.

mod batch;
mod context;
mod memo;
mod scope;
mod signal;
mod subscriber;

pub use batch::{batch, batched, Batch};
pub use context::ExecutionContext;
pub use memo::Memo;
pub use scope::Scope;
pub use signal::Signal;
pub use subscriber::{ScopeId, SignalId};

use crate::error::Result;

/// Create a reactive computation and run it immediately.
///
/// The first run's failure is returned; later runs report to whoever
/// triggered them.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use ripple_core::reactive::{effect, Signal};
///
/// let count = Signal::new(1);
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let (reader, sink) = (count.clone(), log.clone());
/// effect(move || {
///     sink.borrow_mut().push(reader.get());
///     Ok(())
/// })?;
///
/// count.set(2)?;
/// assert_eq!(*log.borrow(), vec![1, 2]);
/// # Ok::<(), ripple_core::ReactiveError>(())
/// ```
pub fn effect<F>(callback: F) -> Result<()>
where
    F: Fn() -> Result<()> + 'static,
{
    Scope::new(callback).execute()
}

/// Like [`effect`], with arguments bound to the callback for every run.
pub fn effect_with<A, F>(args: A, callback: F) -> Result<()>
where
    A: 'static,
    F: Fn(&A) -> Result<()> + 'static,
{
    Scope::with_args(args, callback).execute()
}
