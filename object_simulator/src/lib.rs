//! # Object Simulator
//!
//! This crate is RealmLink's ticket registry: the per-realm authority that
//! turns local functions into transferable tickets and received tickets into
//! callable stubs.
//!
//! ## Philosophy
//!
//! - **Identity-cached**: simulating the same function (with the same
//!   receiver binding) twice yields the same ticket; materializing the same
//!   ticket twice yields the same stub.
//! - **Deterministic reclamation**: a stub holder releases a remote function
//!   explicitly; the out-of-scope cleanup crosses the wire as a message, not
//!   as a host finalizer side effect.
//! - **Late-bound facade**: the subject and the simulator reference each
//!   other through a facade bound after construction, so neither owns the
//!   other.

pub mod facade;
pub mod notifier;
pub mod simulator;

pub use facade::LateFacade;
pub use notifier::ReclaimNotifier;
pub use simulator::ObjectSimulator;
