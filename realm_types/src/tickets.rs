//! Ticket shapes exchanged between realms
//!
//! Tickets are the wire-visible payloads: a [`DefTicket`] names a function,
//! a [`CallArgsTicket`] invokes it, a [`ResponseTicket`] settles exactly one
//! call, and a [`CleanupTicket`] reports that the remote side no longer holds
//! the reference. Field names are camelCase on the wire.

use crate::ids::{CallId, FnId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Handle naming a function owned by one realm
///
/// Unique per (function, binding-parent) pair within one simulator instance,
/// and stable for the life of the underlying function reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefTicket {
    pub fn_id: FnId,
}

impl DefTicket {
    /// Creates a ticket for a function id
    pub fn new(fn_id: FnId) -> Self {
        Self { fn_id }
    }
}

impl fmt::Display for DefTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket({})", self.fn_id.as_str())
    }
}

/// One invocation of a remote function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArgsTicket {
    pub fn_id: FnId,
    pub call_id: CallId,
    pub args: Vec<JsonValue>,
}

impl CallArgsTicket {
    /// Returns the correlation key for this call
    pub fn key(&self) -> CallKey {
        CallKey {
            fn_id: self.fn_id.clone(),
            call_id: self.call_id,
        }
    }
}

/// Correlation key matching a response to its call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallKey {
    pub fn_id: FnId,
    pub call_id: CallId,
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.fn_id.as_str(), self.call_id.as_u64())
    }
}

/// Terminal outcome of exactly one [`CallArgsTicket`]
///
/// Remote-function faults travel here as data; they are never transport
/// failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseTicket {
    Resolve { value: JsonValue },
    Reject { error: JsonValue },
}

/// Notification that a ticket went out of scope on the holding side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupTicket {
    pub fn_id: FnId,
}

/// A namespaced method invocation prior to dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMethodAddress {
    /// Path segments leading to the method's namespace
    pub path: Vec<String>,
    /// Method name (final segment)
    pub name: String,
    /// Call arguments
    pub args: Vec<JsonValue>,
}
