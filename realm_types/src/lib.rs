//! # Realm Types
//!
//! This crate defines the fundamental types shared by all RealmLink crates.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Remote function references are typed tickets,
//!   never raw strings scattered through the code.
//! - **Messages, not shared memory**: Two realms only ever exchange envelopes;
//!   every cross-realm interaction is representable as data in this crate.
//! - **Traceable**: Every envelope carries an id and an optional correlation id
//!   so that call/response pairs can be matched and debugged.
//!
//! ## Key Types
//!
//! - [`FnId`] / [`CallId`]: identity of a remote function and of one call to it
//! - [`DefTicket`], [`CallArgsTicket`], [`ResponseTicket`]: the wire-visible
//!   ticket shapes
//! - [`WireEnvelope`] / [`WireMessage`]: the versioned envelope and its decoded
//!   form
//! - [`CallHandle`]: the explicit asynchronous result handle that replaces
//!   host-scheduler promises

pub mod handle;
pub mod ids;
pub mod tickets;
pub mod wire;

pub use handle::{CallHandle, CallOutcome, DisconnectionError};
pub use ids::{CallId, FnId};
pub use tickets::{
    CallArgsTicket, CallKey, CleanupTicket, DefTicket, HostMethodAddress, ResponseTicket,
};
pub use wire::{
    CodecError, MessageId, MessagePayload, SchemaVersion, WireEnvelope, WireMessage,
    ACTION_BATCH, ACTION_CALL, ACTION_CLEANUP, ACTION_DISCONNECT, ACTION_RESPONSE,
    REALMLINK_SCHEMA,
};
