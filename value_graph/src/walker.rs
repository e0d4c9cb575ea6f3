//! Structural graph walker: `simulate` and `materialize`
//!
//! `simulate` rewrites a local value graph for transmission, replacing every
//! embedded function with a wrapped ticket via the `on_function` callback.
//! `materialize` is the inverse direction: wrapped tickets become callable
//! stubs via `on_def_message`, everything else is walked structurally.
//!
//! Termination is guaranteed for any finite graph, self-referential ones
//! included, because the visited set is consulted before recursing into any
//! composite value.

use crate::classify::{
    is_function, is_instance, is_iterable, is_plain_map, is_primitive, is_stub, ExclusionPolicy,
};
use crate::value::{Key, LocalFn, MapObject, Value};
use crate::wrapped;
use realm_types::DefTicket;
use std::collections::HashSet;

/// Marker emitted at the second occurrence of a revisited value
pub const RECURSION_SENTINEL: &str = "[[RECURSION]]";

/// Callback converting a discovered function into a wrapped ticket value
pub type OnFunction<'a> = dyn FnMut(&LocalFn, Option<&Value>) -> Value + 'a;

/// Callback converting a wrapped ticket into a locally invocable stub value
pub type OnDefMessage<'a> = dyn FnMut(&DefTicket) -> Value + 'a;

/// Simulates a value graph with a fresh traversal-scoped visited set
///
/// Returns `None` when the top-level value itself is excluded.
pub fn simulate_graph(
    value: &Value,
    on_function: &mut OnFunction<'_>,
    policy: &ExclusionPolicy,
) -> Option<Value> {
    let mut visited = HashSet::new();
    simulate(value, on_function, policy, None, &mut visited)
}

/// Recursively simulates one value
///
/// `parent` is the object a discovered function should bind to; it is set
/// for instance properties and never propagated into iterable elements.
/// `None` means the value is excluded and must be omitted from the output.
pub fn simulate(
    value: &Value,
    on_function: &mut OnFunction<'_>,
    policy: &ExclusionPolicy,
    parent: Option<&Value>,
    visited: &mut HashSet<usize>,
) -> Option<Value> {
    if is_primitive(value) || is_stub(value) {
        return Some(value.clone());
    }
    if is_function(value) {
        let func = match value {
            Value::Func(func) => func,
            _ => unreachable!(),
        };
        return Some(on_function(func, parent));
    }
    if policy.excludes(value) {
        return None;
    }
    if is_iterable(value) {
        let items = match value {
            Value::Seq(items) => items,
            _ => unreachable!(),
        };
        if !mark_visited(value, visited) {
            return Some(Value::str(RECURSION_SENTINEL));
        }
        let mut out = Vec::new();
        for item in items.borrow().iter() {
            // Parent binding does not propagate into iterable elements.
            if let Some(simulated) = simulate(item, on_function, policy, None, visited) {
                out.push(simulated);
            }
        }
        return Some(Value::seq(out));
    }
    if is_plain_map(value) {
        let map = match value {
            Value::Map(map) => map,
            _ => unreachable!(),
        };
        if !mark_visited(value, visited) {
            return Some(Value::str(RECURSION_SENTINEL));
        }
        let mut out = MapObject::new();
        // Every own key, symbol-like keys included.
        let entries: Vec<(Key, Value)> = map.borrow().entries().to_vec();
        for (key, child) in entries {
            if let Some(simulated) = simulate(&child, on_function, policy, None, visited) {
                out.set(key, simulated);
            }
        }
        return Some(Value::map(out));
    }
    if is_instance(value) {
        let instance = match value {
            Value::Instance(instance) => instance,
            _ => unreachable!(),
        };
        if !mark_visited(value, visited) {
            return Some(Value::str(RECURSION_SENTINEL));
        }
        let mut out = MapObject::new();
        for key in instance_keys(value) {
            let child = match instance.borrow().get(&key) {
                Some(child) => child,
                None => continue,
            };
            // The current object is the parent so found methods bind to it.
            if let Some(simulated) = simulate(&child, on_function, policy, Some(value), visited) {
                out.set(key, simulated);
            }
        }
        return Some(Value::map(out));
    }
    // Unclassified platform values pass through untouched; the wire codec
    // refuses them if they ever reach serialization.
    Some(value.clone())
}

/// Recursively materializes a simulated graph
///
/// Wrapped tickets become stubs; prototyped objects are not reconstructed,
/// so the output is always plain data plus callables.
pub fn materialize(value: &Value, on_def_message: &mut OnDefMessage<'_>) -> Value {
    if is_primitive(value) || is_function(value) || is_stub(value) {
        return value.clone();
    }
    if let Some(ticket) = wrapped::unwrap(value) {
        return on_def_message(&ticket);
    }
    match value {
        Value::Seq(items) => {
            let out = items
                .borrow()
                .iter()
                .map(|item| materialize(item, on_def_message))
                .collect();
            Value::seq(out)
        }
        Value::Map(map) => {
            let mut out = MapObject::new();
            for (key, child) in map.borrow().entries() {
                out.set(key.clone(), materialize(child, on_def_message));
            }
            Value::map(out)
        }
        _ => value.clone(),
    }
}

/// Records a composite in the visited set; false means it was already there
fn mark_visited(value: &Value, visited: &mut HashSet<usize>) -> bool {
    match value.identity() {
        Some(identity) => visited.insert(identity),
        None => true,
    }
}

/// Collects instance property keys: own fields first, then the prototype
/// chain, skipping `constructor`, de-duplicated in discovery order
fn instance_keys(value: &Value) -> Vec<Key> {
    let instance = match value {
        Value::Instance(instance) => instance.borrow(),
        _ => return Vec::new(),
    };
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    let mut push = |key: &Key| {
        if key.as_name() == Some("constructor") {
            return;
        }
        if seen.insert(key.clone()) {
            keys.push(key.clone());
        }
    };
    for (key, _) in instance.fields() {
        push(key);
    }
    let mut proto = Some(instance.proto().clone());
    while let Some(current) = proto {
        for (key, _) in current.properties() {
            push(key);
        }
        proto = current.parent().cloned();
    }
    keys
}
