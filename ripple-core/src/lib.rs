//! Ripple Core
//!
//! This crate provides a minimal fine-grained reactive runtime: the
//! dependency-tracking and notification engine that sits underneath reactive
//! UI and state libraries, independent of any rendering layer.
//! It implements:
//!
//! - Signals: mutable cells whose reads are tracked
//! - Scopes and effects: computations re-run when what they read changes
//! - Memos: cached derived values
//! - Batches: deferral and deduplication of notifications
//!
//! The crate can be used as a native Rust library and, with the `python`
//! feature, as a Python extension module via PyO3.
//!
//! # Architecture
//!
//! - `reactive`: the execution context, scopes, signals, memos and batches
//! - `error`: the error type returned by callbacks and propagated by writes
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use ripple_core::reactive::{batched, effect, Memo, Signal};
//!
//! // Create a signal
//! let count = Signal::new(1);
//!
//! // Create a derived value
//! let source = count.clone();
//! let doubled = Memo::new(move || source.get() * 2)?;
//!
//! // Create an effect
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let (memo, sink) = (doubled.clone(), seen.clone());
//! effect(move || {
//!     sink.borrow_mut().push(memo.get());
//!     Ok(())
//! })?;
//!
//! // Update the signal; the effect re-runs through the memo
//! count.set(5)?;
//!
//! // Two writes in a batch settle once
//! batched(|| {
//!     count.set(6)?;
//!     count.set(7)
//! })?;
//!
//! assert_eq!(*seen.borrow(), vec![2, 10, 14]);
//! # Ok::<(), ripple_core::ReactiveError>(())
//! ```

pub mod error;
pub mod reactive;

#[cfg(feature = "python")]
mod python;

pub use error::{BoxError, ReactiveError, Result};
