//! Execution Context
//!
//! The execution context tracks which scope is currently running and which
//! batches are open. This enables automatic dependency tracking: when a
//! signal is read, the scope on top of the stack subscribes to it.
//!
//! # Implementation
//!
//! We use a thread-local context holding two stacks:
//!
//! - the scope stack: a scope is pushed when it starts executing and popped
//!   when it finishes, so the depth equals the reactive nesting depth;
//! - the batch stack: each open batch owns one buffer of pending scopes.
//!
//! Pushes are paired with pops through guards, so the stacks stay balanced
//! when a callback returns an error or panics.

use std::cell::RefCell;

use tracing::trace;

use super::scope::Scope;
use super::subscriber::{ScopeId, ScopeMap, Snapshot, Subscribers};

#[derive(Default)]
struct ContextState {
    scopes: Vec<Scope>,
    batches: Vec<ScopeMap>,
}

thread_local! {
    static CONTEXT: RefCell<ContextState> = RefCell::new(ContextState::default());
}

/// Guard that pops the executing scope when dropped.
///
/// Created by [`Scope::execute`]; the associated functions expose the
/// state of the current thread's context.
pub struct ExecutionContext {
    scope_id: ScopeId,
}

impl ExecutionContext {
    /// Push a scope; it stays current until the returned guard is dropped.
    pub(crate) fn enter(scope: Scope) -> Self {
        let scope_id = scope.id();
        CONTEXT.with(|ctx| ctx.borrow_mut().scopes.push(scope));
        Self { scope_id }
    }

    /// Check if a scope is currently executing.
    pub fn is_tracking() -> bool {
        CONTEXT.with(|ctx| !ctx.borrow().scopes.is_empty())
    }

    /// Get the ID of the scope currently executing, if any.
    pub fn current_scope() -> Option<ScopeId> {
        CONTEXT.with(|ctx| ctx.borrow().scopes.last().map(Scope::id))
    }

    /// Number of scopes currently executing on this thread.
    pub fn depth() -> usize {
        CONTEXT.with(|ctx| ctx.borrow().scopes.len())
    }

    /// Check if a batch is open.
    pub fn is_batching() -> bool {
        CONTEXT.with(|ctx| !ctx.borrow().batches.is_empty())
    }

    /// Number of open batches on this thread.
    pub fn batch_depth() -> usize {
        CONTEXT.with(|ctx| ctx.borrow().batches.len())
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        CONTEXT.with(|ctx| {
            let popped = ctx.borrow_mut().scopes.pop();

            if let Some(scope) = popped {
                debug_assert_eq!(
                    scope.id(),
                    self.scope_id,
                    "ExecutionContext mismatch: expected {}, got {}",
                    self.scope_id,
                    scope.id()
                );
            }
        });
    }
}

/// Subscribe the executing scope, if any, to a signal.
///
/// A read outside every scope creates no dependency.
pub(crate) fn register_dependency(subscribers: &Subscribers) {
    // The borrow must end before `subscribe` touches the maps.
    let current = CONTEXT.with(|ctx| ctx.borrow().scopes.last().cloned());
    if let Some(scope) = current {
        trace!(scope = %scope.id(), signal = %subscribers.id(), "dependency registered");
        scope.subscribe(subscribers);
    }
}

/// Route notified scopes into the innermost open batch.
///
/// Returns the scopes back when no batch is open and they must run now.
pub(crate) fn defer(snapshot: Snapshot) -> Option<Snapshot> {
    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        let depth = ctx.batches.len();
        match ctx.batches.last_mut() {
            Some(buffer) => {
                trace!(depth, scopes = snapshot.len(), "notifications deferred");
                for scope in snapshot {
                    buffer.insert(scope.id(), scope);
                }
                None
            }
            None => Some(snapshot),
        }
    })
}

/// Open a new batch buffer. Returns the batch depth after the push.
pub(crate) fn push_batch() -> usize {
    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        ctx.batches.push(ScopeMap::new());
        ctx.batches.len()
    })
}

/// Close the innermost batch buffer and hand back its pending scopes.
pub(crate) fn pop_batch(depth: usize) -> ScopeMap {
    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        debug_assert_eq!(
            ctx.batches.len(),
            depth,
            "batches must be closed in reverse order of opening"
        );
        ctx.batches.pop().unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::subscriber::SignalId;

    #[test]
    fn context_tracks_scope() {
        let scope = Scope::new(|| Ok(()));

        assert!(!ExecutionContext::is_tracking());
        assert!(ExecutionContext::current_scope().is_none());

        {
            let _ctx = ExecutionContext::enter(scope.clone());

            assert!(ExecutionContext::is_tracking());
            assert_eq!(ExecutionContext::current_scope(), Some(scope.id()));
        }

        // Context should be cleaned up after drop
        assert!(!ExecutionContext::is_tracking());
        assert!(ExecutionContext::current_scope().is_none());
    }

    #[test]
    fn nested_contexts() {
        let outer = Scope::new(|| Ok(()));
        let inner = Scope::new(|| Ok(()));

        {
            let _ctx1 = ExecutionContext::enter(outer.clone());
            assert_eq!(ExecutionContext::current_scope(), Some(outer.id()));

            {
                let _ctx2 = ExecutionContext::enter(inner.clone());
                assert_eq!(ExecutionContext::current_scope(), Some(inner.id()));
                assert_eq!(ExecutionContext::depth(), 2);
            }

            // After inner context drops, outer should be current
            assert_eq!(ExecutionContext::current_scope(), Some(outer.id()));
        }

        assert_eq!(ExecutionContext::depth(), 0);
    }

    #[test]
    fn register_dependency_targets_top_scope() {
        let outer = Scope::new(|| Ok(()));
        let inner = Scope::new(|| Ok(()));
        let subs = Subscribers::new(SignalId::new());

        let _ctx1 = ExecutionContext::enter(outer.clone());
        {
            let _ctx2 = ExecutionContext::enter(inner.clone());
            register_dependency(&subs);
        }

        assert!(subs.contains(inner.id()));
        assert!(!subs.contains(outer.id()));
        assert_eq!(inner.dependency_count(), 1);
        assert_eq!(outer.dependency_count(), 0);
    }

    #[test]
    fn register_dependency_without_scope_is_noop() {
        let subs = Subscribers::new(SignalId::new());
        register_dependency(&subs);
        assert_eq!(subs.len(), 0);
    }

    #[test]
    fn defer_merges_into_innermost_batch() {
        let scope = Scope::new(|| Ok(()));
        let snapshot: Snapshot = std::iter::once(scope.clone()).collect();

        assert!(defer(snapshot.clone()).is_some());

        let outer = push_batch();
        let inner = push_batch();
        assert!(defer(snapshot.clone()).is_none());
        assert!(defer(snapshot).is_none());
        assert_eq!(ExecutionContext::batch_depth(), 2);

        let pending = pop_batch(inner);
        assert_eq!(pending.len(), 1);
        assert!(pending.contains_key(&scope.id()));

        assert!(pop_batch(outer).is_empty());
        assert!(!ExecutionContext::is_batching());
    }
}
