//! # Namespace Proxy
//!
//! This crate implements lazy, batched method addressing over a remote
//! namespace: property traversal accumulates a path, invocation commits an
//! address into a pending batch, and the batch crosses the boundary in one
//! dispatch when flushed.
//!
//! ## Philosophy
//!
//! - **Traversal is free**: walking `ns.a.b` touches nothing remote; only a
//!   flush talks to the dispatcher.
//! - **Order is the contract**: committed addresses dispatch in commit
//!   order, whether or not their traversals shared cached nodes.
//! - **Fail fast on bad keys**: non-string property keys are a programming
//!   error, reported immediately.

pub mod proxy;

pub use proxy::{BatchInvoker, NamespaceProxy, ProxyError};
