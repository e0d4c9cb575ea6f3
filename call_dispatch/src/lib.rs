//! # Call Dispatch
//!
//! This crate implements the two halves of remote invocation: the outbound
//! sender stub built for a ticket, and the inbound receiver forwarding calls
//! to a locally owned function.
//!
//! ## Philosophy
//!
//! - **No async runtime**: invoking a sender returns an explicit
//!   [`CallHandle`] that settles when the correlated response arrives.
//! - **Fail-fast, not fail-soft**: after subject disconnect a sender refuses
//!   synchronously and every call pending at that moment fails with the
//!   disconnect reason.
//! - **Faults as data**: a remote function's error is carried inside a
//!   reject response, never as a transport failure.

pub mod receiver;
pub mod sender;

pub use realm_types::{CallHandle, CallOutcome, DisconnectionError};
pub use receiver::receive_calls;
pub use sender::{make_call_sender, CallSender};
