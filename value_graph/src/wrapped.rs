//! Reserved-key tagging for reference tickets
//!
//! A [`DefTicket`] travels inside simulated graphs as a map with exactly one
//! reserved key. `is_wrapped` requires both the reserved key and the
//! single-key shape, so application maps that merely mention the key among
//! other properties never unwrap by accident.

use crate::value::{Key, MapObject, Value};
use realm_types::{DefTicket, FnId};

/// Reserved key marking a wrapped reference ticket
pub const REF_KEY: &str = "[[realmlink.ref]]";

/// Wraps a ticket into its tagged value form
pub fn wrap(ticket: &DefTicket) -> Value {
    let mut map = MapObject::new();
    map.set(Key::name(REF_KEY), Value::str(ticket.fn_id.as_str()));
    Value::map(map)
}

/// Returns whether a value is a wrapped reference ticket
pub fn is_wrapped(value: &Value) -> bool {
    unwrap(value).is_some()
}

/// Unwraps a tagged value back into its ticket
pub fn unwrap(value: &Value) -> Option<DefTicket> {
    let map = match value {
        Value::Map(map) => map.borrow(),
        _ => return None,
    };
    if map.len() != 1 {
        return None;
    }
    match map.get(&Key::name(REF_KEY)) {
        Some(Value::Str(fn_id)) => Some(DefTicket::new(FnId::from_raw(fn_id))),
        _ => None,
    }
}
