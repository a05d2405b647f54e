//! Batches
//!
//! A batch defers every notification issued during its extent and settles
//! them in one pass when it closes. A scope notified several times, by one
//! signal or by many, runs once, in the order of its first notification.
//!
//! Batches nest. Writes always go to the innermost open batch; once it has
//! settled, further writes (including those made by the scopes it settled)
//! go to whichever batch is now innermost, or run immediately.

use std::marker::PhantomData;
use std::rc::Rc;

use tracing::{debug, error, warn};

use crate::error::Result;

use super::context;
use super::subscriber::ScopeMap;

/// An open batch.
///
/// Close it with [`Batch::finish`] to observe settle failures. Dropping an
/// unfinished batch closes and settles it as well, logging any failure.
#[must_use = "dropping a batch settles it immediately"]
pub struct Batch {
    /// Batch depth right after this batch was opened.
    depth: usize,
    open: bool,

    /// The batch belongs to the thread whose context it was pushed on.
    _not_send: PhantomData<Rc<()>>,
}

/// Open a batch on the current thread.
pub fn batch() -> Batch {
    let depth = context::push_batch();
    debug!(depth, "batch opened");
    Batch {
        depth,
        open: true,
        _not_send: PhantomData,
    }
}

/// Run `f` inside a batch.
///
/// The batch is settled even when `f` fails. A settle failure takes the
/// place of the body's result; otherwise the body's result is returned.
pub fn batched<R, F>(f: F) -> Result<R>
where
    F: FnOnce() -> Result<R>,
{
    let batch = batch();
    let outcome = f();
    batch.finish()?;
    outcome
}

impl Batch {
    /// Close the batch and run every deferred scope once.
    ///
    /// Stops at the first failing scope and returns its error.
    pub fn finish(mut self) -> Result<()> {
        self.open = false;
        settle(self.depth, context::pop_batch(self.depth))
    }

    /// Batch depth of this batch (1 for the outermost).
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;

        let pending = context::pop_batch(self.depth);
        if std::thread::panicking() {
            if !pending.is_empty() {
                warn!(
                    depth = self.depth,
                    scopes = pending.len(),
                    "batch dropped while panicking; pending scopes discarded"
                );
            }
            return;
        }

        if let Err(err) = settle(self.depth, pending) {
            error!(depth = self.depth, error = %err, "batch settle failed");
        }
    }
}

fn settle(depth: usize, pending: ScopeMap) -> Result<()> {
    debug!(depth, scopes = pending.len(), "settling batch");
    for scope in pending.into_values() {
        scope.execute()?;
    }
    Ok(())
}
