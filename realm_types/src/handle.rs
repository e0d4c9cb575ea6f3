//! Explicit asynchronous result handles
//!
//! RealmLink runs without an async runtime: a remote call returns a
//! [`CallHandle`] immediately, and the handle settles later when the
//! correlated response is delivered by the host scheduler. Observers poll
//! [`CallHandle::outcome`]; nothing ever blocks.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Error raised when a call is made against a disconnected subject
///
/// Also used to fail every call still pending at disconnect time; always
/// carries the disconnect reason.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Function belongs to a simulated remote object which has been disconnected: {reason}")]
pub struct DisconnectionError {
    pub reason: String,
}

impl DisconnectionError {
    /// Creates a disconnection error carrying the given reason
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Settled outcome of one remote call
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome<T> {
    /// The remote function returned a value
    Resolved(T),
    /// The remote function faulted; the fault travels as data
    Rejected(T),
    /// The subject disconnected before the response arrived
    Failed(DisconnectionError),
}

/// Shared handle for a call result that settles later
///
/// Cloning the handle shares the same settlement cell. Settlement is
/// one-shot: the first of `resolve`/`reject`/`fail` wins and later attempts
/// are ignored.
pub struct CallHandle<T> {
    cell: Rc<RefCell<Option<CallOutcome<T>>>>,
}

impl<T> Clone for CallHandle<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T> CallHandle<T> {
    /// Creates a handle in the pending state
    pub fn pending() -> Self {
        Self {
            cell: Rc::new(RefCell::new(None)),
        }
    }

    /// Returns whether the handle has not settled yet
    pub fn is_pending(&self) -> bool {
        self.cell.borrow().is_none()
    }

    /// Settles the handle with a resolved value
    pub fn resolve(&self, value: T) {
        self.settle(CallOutcome::Resolved(value));
    }

    /// Settles the handle with a rejection value
    pub fn reject(&self, error: T) {
        self.settle(CallOutcome::Rejected(error));
    }

    /// Settles the handle with a disconnection failure
    pub fn fail(&self, error: DisconnectionError) {
        self.settle(CallOutcome::Failed(error));
    }

    /// Checks whether two handles share the same settlement cell
    pub fn shares_cell(&self, other: &CallHandle<T>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    fn settle(&self, outcome: CallOutcome<T>) {
        let mut cell = self.cell.borrow_mut();
        if cell.is_none() {
            *cell = Some(outcome);
        }
    }
}

impl<T: Clone> CallHandle<T> {
    /// Returns the settled outcome, or `None` while pending
    pub fn outcome(&self) -> Option<CallOutcome<T>> {
        self.cell.borrow().clone()
    }
}

impl<T> fmt::Debug for CallHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_pending() {
            "pending"
        } else {
            "settled"
        };
        write!(f, "CallHandle({})", state)
    }
}
