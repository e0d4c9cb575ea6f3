//! # Remote Subject
//!
//! This crate implements the transport-facing side of RealmLink: the object
//! both the ticket registry and the call dispatcher talk to when anything
//! must cross the realm boundary.
//!
//! ## Philosophy
//!
//! - **Mechanism not policy**: the subject routes envelopes and keeps the
//!   correlation registries; what a call *means* is decided by the dispatcher
//!   and the simulator above it.
//! - **Fail-fast disconnect**: once the channel is declared unusable, every
//!   outstanding call fails at once and new sends are refused synchronously.
//! - **Traceable**: the subject records structured events for test
//!   verification.
//!
//! ## Key Types
//!
//! - [`RemoteSubject`]: send/respond/disconnect/out-of-scope registries and
//!   inbound routing
//! - [`Transport`]: the external collaborator that actually moves envelopes
//! - [`SimulatorFacade`]: late-bound handle to the object simulator, breaking
//!   the construction cycle between subject and simulator
//! - [`LoopbackChannel`]: deterministic in-memory transport pair for tests

pub mod loopback;
pub mod subject;
pub mod trace;

pub use loopback::{LoopbackChannel, LoopbackTransport};
pub use subject::{
    BatchHandler, CallReceiver, CleanupFn, DisconnectHandler, RemoteSubject, RespondHandler,
    ResponseOutcome, SimulatorFacade, SubjectError, Transport,
};
pub use trace::{SubjectEvent, SubjectTrace};
