//! Subscriber bookkeeping for the reactive system.
//!
//! Both halves of a dependency edge are keyed by integer handles rather than
//! by address: a signal's subscriber map is keyed by [`ScopeId`], and a scope's
//! dependency record is keyed by the [`SignalId`] of the map it joined.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::scope::Scope;

/// Unique identifier for a scope.
///
/// Each scope (effect or memo computation) gets a unique ID when created.
/// This ID is the key under which the scope appears in subscriber maps and
/// batch buffers, so repeated notifications collapse to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Generate a new unique scope ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

/// Unique identifier for a signal and, equivalently, for its subscriber map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u64);

impl SignalId {
    /// Generate a new unique signal ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SignalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signal#{}", self.0)
    }
}

/// Insertion-ordered map of scopes, keyed by scope ID.
///
/// Used both as a signal's subscriber set and as a batch buffer.
pub(crate) type ScopeMap = IndexMap<ScopeId, Scope>;

/// Scopes captured from a subscriber map at notification time.
pub(crate) type Snapshot = SmallVec<[Scope; 4]>;

/// The subscriber map owned by a signal.
///
/// The map holds its scopes strongly: a scope created by a fire-and-forget
/// `effect()` stays alive exactly as long as some signal it read still lists
/// it. Scopes point back at the map only through a [`Weak`] handle.
#[derive(Clone)]
pub(crate) struct Subscribers {
    id: SignalId,
    scopes: Rc<RefCell<ScopeMap>>,
}

impl Subscribers {
    pub(crate) fn new(id: SignalId) -> Self {
        Self {
            id,
            scopes: Rc::new(RefCell::new(ScopeMap::new())),
        }
    }

    pub(crate) fn id(&self) -> SignalId {
        self.id
    }

    /// Non-owning handle for a scope's dependency record.
    pub(crate) fn downgrade(&self) -> Weak<RefCell<ScopeMap>> {
        Rc::downgrade(&self.scopes)
    }

    /// Insert a scope. Re-inserting keeps its original position.
    pub(crate) fn insert(&self, scope: Scope) {
        self.scopes.borrow_mut().insert(scope.id(), scope);
    }

    /// Copy the current subscribers out, so the map can be mutated freely
    /// while they run.
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.scopes.borrow().values().cloned().collect()
    }

    pub(crate) fn contains(&self, id: ScopeId) -> bool {
        self.scopes.borrow().contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.scopes.borrow().len()
    }
}

/// Remove a scope from a subscriber map reached through a back-edge.
///
/// `shift_remove` keeps the remaining subscribers in notification order.
pub(crate) fn unsubscribe(scopes: &Weak<RefCell<ScopeMap>>, id: ScopeId) {
    if let Some(scopes) = scopes.upgrade() {
        scopes.borrow_mut().shift_remove(&id);
    }
}
