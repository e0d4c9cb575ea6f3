//! # Value Graph
//!
//! This crate defines RealmLink's dynamic value model and the structural
//! simulation/materialization engine over it.
//!
//! ## Philosophy
//!
//! - **Untyped at the boundary, typed underneath**: application values are an
//!   open graph ([`Value`]), but every traversal decision is made by explicit
//!   classifier predicates, never by downcasting surprises.
//! - **Cycle-safe by construction**: the walker consults a per-traversal
//!   visited set before recursing into any composite value.
//! - **Omission over failure**: platform-excluded values vanish from the
//!   output instead of raising.
//!
//! ## Key Pieces
//!
//! - [`Value`] / [`Key`]: the shared, identity-bearing value graph
//! - [`classify`]: pure category predicates and the injectable
//!   [`ExclusionPolicy`]
//! - [`walker`]: `simulate` (functions become tickets) and `materialize`
//!   (tickets become callable stubs)
//! - [`wrapped`]: the reserved-key tagging that keeps reference tickets
//!   distinguishable from application data
//! - [`json`]: conversion between simulated graphs and wire JSON

pub mod classify;
pub mod json;
pub mod value;
pub mod walker;
pub mod wrapped;

pub use classify::{Category, ExclusionPolicy, FRAME_TAG};
pub use json::{from_json, to_json, ValueError};
pub use value::{
    ForeignValue, InstanceObject, Key, LocalFn, MapObject, Prototype, Stub, Value,
};
pub use walker::{materialize, simulate, simulate_graph, RECURSION_SENTINEL};
pub use wrapped::{is_wrapped, unwrap, wrap, REF_KEY};
