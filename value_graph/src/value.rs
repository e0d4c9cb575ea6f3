//! The dynamic value model
//!
//! Values form an open graph: composites (`Seq`, `Map`, `Instance`) share
//! their interiors through `Rc<RefCell<_>>`, which is what makes cycles
//! representable and gives every composite a stable identity
//! (the `Rc` pointer address).

use realm_types::{CallHandle, DisconnectionError, FnId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Property key of a map or instance
///
/// Symbol-like keys exist so the walker can traverse every own key, while
/// surfaces that only speak strings (the namespace proxy) can fail fast on
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Ordinary string-named property
    Name(String),
    /// Symbol-like key, not representable in a call address
    Symbol(String),
}

impl Key {
    /// Creates a string-named key
    pub fn name(name: impl Into<String>) -> Self {
        Key::Name(name.into())
    }

    /// Creates a symbol-like key
    pub fn symbol(name: impl Into<String>) -> Self {
        Key::Symbol(name.into())
    }

    /// Returns the string name if this is a named key
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Symbol(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "{}", name),
            Key::Symbol(name) => write!(f, "@sym:{}", name),
        }
    }
}

type FnImpl = dyn Fn(Option<&Value>, &[Value]) -> Result<Value, String>;

/// A locally owned callable
///
/// The first argument is the bound parent (the owning object for methods),
/// mirroring receiver binding. Faults are returned as data (`Err(String)`),
/// never panics.
#[derive(Clone)]
pub struct LocalFn {
    name: Option<String>,
    f: Rc<FnImpl>,
}

impl LocalFn {
    /// Creates a named function
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(Option<&Value>, &[Value]) -> Result<Value, String> + 'static,
    ) -> Self {
        Self {
            name: Some(name.into()),
            f: Rc::new(f),
        }
    }

    /// Creates an anonymous function
    pub fn anonymous(
        f: impl Fn(Option<&Value>, &[Value]) -> Result<Value, String> + 'static,
    ) -> Self {
        Self {
            name: None,
            f: Rc::new(f),
        }
    }

    /// Returns the function's debug name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Invokes the function
    pub fn call(&self, parent: Option<&Value>, args: &[Value]) -> Result<Value, String> {
        (self.f)(parent, args)
    }

    /// Returns a function with `parent` bound as the receiver
    pub fn bind(&self, parent: Value) -> LocalFn {
        let inner = Rc::clone(&self.f);
        LocalFn {
            name: self.name.clone(),
            f: Rc::new(move |_ignored, args| inner(Some(&parent), args)),
        }
    }

    /// Returns the function's identity (closure pointer address)
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.f) as *const () as usize
    }
}

impl fmt::Debug for LocalFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalFn({})", self.name.as_deref().unwrap_or("<anonymous>"))
    }
}

type StubImpl = dyn Fn(Vec<Value>) -> Result<CallHandle<Value>, DisconnectionError>;

/// A remotely owned callable, materialized from a ticket
///
/// Invoking a stub yields an asynchronous [`CallHandle`]; after the owning
/// subject disconnects the invocation refuses synchronously.
#[derive(Clone)]
pub struct Stub {
    fn_id: FnId,
    invoke: Rc<StubImpl>,
}

impl Stub {
    /// Creates a stub for a remote function
    pub fn new(
        fn_id: FnId,
        invoke: impl Fn(Vec<Value>) -> Result<CallHandle<Value>, DisconnectionError> + 'static,
    ) -> Self {
        Self {
            fn_id,
            invoke: Rc::new(invoke),
        }
    }

    /// Returns the remote function id (the stub's debug name)
    pub fn fn_id(&self) -> &FnId {
        &self.fn_id
    }

    /// Invokes the remote function
    pub fn call(&self, args: Vec<Value>) -> Result<CallHandle<Value>, DisconnectionError> {
        (self.invoke)(args)
    }

    /// Returns the stub's identity (closure pointer address)
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.invoke) as *const () as usize
    }
}

impl fmt::Debug for Stub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stub({})", self.fn_id.as_str())
    }
}

/// Plain data object: ordered own properties, no prototype
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapObject {
    entries: Vec<(Key, Value)>,
}

impl MapObject {
    /// Creates an empty map object
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, replacing any existing entry with the same key
    pub fn set(&mut self, key: Key, value: Value) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Returns a property value
    pub fn get(&self, key: &Key) -> Option<Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Returns all own keys in insertion order
    pub fn keys(&self) -> Vec<Key> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Returns the entries in insertion order
    pub fn entries(&self) -> &[(Key, Value)] {
        &self.entries
    }

    /// Returns the number of own properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the map has no properties
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Named prototype in a chain
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    name: String,
    properties: Vec<(Key, Value)>,
    parent: Option<Rc<Prototype>>,
}

impl Prototype {
    /// Creates a prototype with no properties and no parent
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            parent: None,
        }
    }

    /// Adds a property (typically a method) to the prototype
    pub fn with_property(mut self, key: Key, value: Value) -> Self {
        self.properties.push((key, value));
        self
    }

    /// Sets the parent prototype
    pub fn with_parent(mut self, parent: Rc<Prototype>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Returns the prototype's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the prototype's own properties
    pub fn properties(&self) -> &[(Key, Value)] {
        &self.properties
    }

    /// Returns the parent prototype, if any
    pub fn parent(&self) -> Option<&Rc<Prototype>> {
        self.parent.as_ref()
    }

    /// Looks up a property along the chain starting at this prototype
    pub fn lookup(&self, key: &Key) -> Option<Value> {
        if let Some((_, value)) = self.properties.iter().find(|(k, _)| k == key) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(key))
    }
}

/// Prototyped object: own fields plus a prototype chain
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceObject {
    proto: Rc<Prototype>,
    fields: Vec<(Key, Value)>,
}

impl InstanceObject {
    /// Creates an instance of a prototype
    pub fn new(proto: Rc<Prototype>) -> Self {
        Self {
            proto,
            fields: Vec::new(),
        }
    }

    /// Sets an own field
    pub fn set(&mut self, key: Key, value: Value) {
        if let Some(entry) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    /// Returns the instance's prototype
    pub fn proto(&self) -> &Rc<Prototype> {
        &self.proto
    }

    /// Returns the instance's own fields
    pub fn fields(&self) -> &[(Key, Value)] {
        &self.fields
    }

    /// Looks up a property: own fields first, then the prototype chain
    pub fn get(&self, key: &Key) -> Option<Value> {
        if let Some((_, value)) = self.fields.iter().find(|(k, _)| k == key) {
            return Some(value.clone());
        }
        self.proto.lookup(key)
    }
}

/// Platform value identified only by a structural tag
///
/// The exclusion policy decides whether a given tag is serializable; the
/// concrete host enumeration stays outside the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignValue {
    tag: String,
}

impl ForeignValue {
    /// Creates a foreign value with a structural tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Returns the structural tag
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// An arbitrary application value
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Locally owned callable
    Func(LocalFn),
    /// Remote callable, present only in materialized graphs
    Stub(Stub),
    /// Ordered iterable sequence
    Seq(Rc<RefCell<Vec<Value>>>),
    /// Plain data object
    Map(Rc<RefCell<MapObject>>),
    /// Prototyped object
    Instance(Rc<RefCell<InstanceObject>>),
    /// Platform value subject to the exclusion policy
    Foreign(ForeignValue),
}

impl Value {
    /// Creates a string value
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Creates a shared sequence value
    pub fn seq(items: Vec<Value>) -> Self {
        Value::Seq(Rc::new(RefCell::new(items)))
    }

    /// Creates a shared map value
    pub fn map(map: MapObject) -> Self {
        Value::Map(Rc::new(RefCell::new(map)))
    }

    /// Creates a shared instance value
    pub fn instance(instance: InstanceObject) -> Self {
        Value::Instance(Rc::new(RefCell::new(instance)))
    }

    /// Returns the identity of a composite or callable value
    ///
    /// Primitives have no identity.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Seq(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::Map(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::Instance(rc) => Some(Rc::as_ptr(rc) as usize),
            Value::Func(f) => Some(f.identity()),
            Value::Stub(s) => Some(s.identity()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a.identity() == b.identity(),
            (Value::Stub(a), Value::Stub(b)) => a.identity() == b.identity(),
            (Value::Seq(a), Value::Seq(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Instance(a), Value::Instance(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Foreign(a), Value::Foreign(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_set_get() {
        let mut map = MapObject::new();
        map.set(Key::name("a"), Value::Int(1));
        map.set(Key::name("a"), Value::Int(2));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&Key::name("a")), Some(Value::Int(2)));
        assert_eq!(map.get(&Key::name("missing")), None);
    }

    #[test]
    fn test_local_fn_bind() {
        let mut owner = MapObject::new();
        owner.set(Key::name("greeting"), Value::str("hi"));
        let owner = Value::map(owner);

        let method = LocalFn::new("greet", |parent, _args| {
            let parent = parent.ok_or("no receiver")?;
            match parent {
                Value::Map(map) => map
                    .borrow()
                    .get(&Key::name("greeting"))
                    .ok_or_else(|| "no greeting".to_string()),
                _ => Err("bad receiver".to_string()),
            }
        });

        assert_eq!(method.call(None, &[]), Err("no receiver".to_string()));

        let bound = method.bind(owner);
        assert_eq!(bound.call(None, &[]), Ok(Value::str("hi")));
    }

    #[test]
    fn test_composite_identity() {
        let seq = Value::seq(vec![Value::Int(1)]);
        let alias = seq.clone();
        assert_eq!(seq.identity(), alias.identity());

        let other = Value::seq(vec![Value::Int(1)]);
        assert_ne!(seq.identity(), other.identity());
        // Structural equality still holds across identities.
        assert_eq!(seq, other);
    }

    #[test]
    fn test_prototype_chain_lookup() {
        let base = Rc::new(
            Prototype::new("Base").with_property(Key::name("kind"), Value::str("base")),
        );
        let derived = Rc::new(
            Prototype::new("Derived")
                .with_property(Key::name("extra"), Value::Int(1))
                .with_parent(Rc::clone(&base)),
        );

        let mut instance = InstanceObject::new(derived);
        instance.set(Key::name("own"), Value::Bool(true));

        assert_eq!(instance.get(&Key::name("own")), Some(Value::Bool(true)));
        assert_eq!(instance.get(&Key::name("extra")), Some(Value::Int(1)));
        assert_eq!(instance.get(&Key::name("kind")), Some(Value::str("base")));
        assert_eq!(instance.get(&Key::name("missing")), None);
    }
}
