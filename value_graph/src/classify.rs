//! Value classifier and exclusion policy
//!
//! Pure predicates partition any value into exactly one category, checked in
//! a fixed precedence order. The exclusion check runs before the map and
//! instance branches; what exactly is excluded is host configuration, not
//! core policy.

use crate::value::{Prototype, Value};
use std::rc::Rc;

/// Structural tag marking an embedded frame element
pub const FRAME_TAG: &str = "frame";

/// Category a value classifies into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Null, booleans, numbers, strings
    Primitive,
    /// Locally owned callable
    Function,
    /// Remote callable stub
    RemoteStub,
    /// Ordered sequence
    Iterable,
    /// Plain data object
    PlainMap,
    /// Prototyped object
    Instance,
    /// Platform value carrying only a structural tag
    Foreign,
}

/// Returns true for null, booleans, numbers, and strings
pub fn is_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
    )
}

/// Returns true for locally owned callables
pub fn is_function(value: &Value) -> bool {
    matches!(value, Value::Func(_))
}

/// Returns true for remote callable stubs
pub fn is_stub(value: &Value) -> bool {
    matches!(value, Value::Stub(_))
}

/// Returns true for ordered sequences
pub fn is_iterable(value: &Value) -> bool {
    matches!(value, Value::Seq(_))
}

/// Returns true for plain data objects
pub fn is_plain_map(value: &Value) -> bool {
    matches!(value, Value::Map(_))
}

/// Returns true for prototyped objects
pub fn is_instance(value: &Value) -> bool {
    matches!(value, Value::Instance(_))
}

/// Classifies a value into exactly one category
pub fn classify(value: &Value) -> Category {
    if is_primitive(value) {
        Category::Primitive
    } else if is_function(value) {
        Category::Function
    } else if is_stub(value) {
        Category::RemoteStub
    } else if is_iterable(value) {
        Category::Iterable
    } else if is_plain_map(value) {
        Category::PlainMap
    } else if is_instance(value) {
        Category::Instance
    } else {
        Category::Foreign
    }
}

/// Injectable policy deciding which platform values must be omitted
///
/// Two checks, both configured by the hosting environment:
/// - structural tags (e.g. embedded frame elements);
/// - prototype identity (how a host marks its global-scope or document-root
///   objects).
#[derive(Clone, Default)]
pub struct ExclusionPolicy {
    excluded_tags: Vec<String>,
    excluded_protos: Vec<Rc<Prototype>>,
}

impl ExclusionPolicy {
    /// Creates a policy that excludes nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the standard policy: embedded frame elements are excluded
    pub fn standard() -> Self {
        Self::new().with_tag(FRAME_TAG)
    }

    /// Excludes values carrying the given structural tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.excluded_tags.push(tag.into());
        self
    }

    /// Excludes instances whose prototype chain contains the given prototype
    pub fn with_prototype(mut self, proto: Rc<Prototype>) -> Self {
        self.excluded_protos.push(proto);
        self
    }

    /// Returns whether a value must be omitted from simulation output
    pub fn excludes(&self, value: &Value) -> bool {
        match value {
            Value::Foreign(foreign) => {
                self.excluded_tags.iter().any(|tag| tag == foreign.tag())
            }
            Value::Instance(instance) => {
                let mut proto = Some(Rc::clone(instance.borrow().proto()));
                while let Some(current) = proto {
                    if self
                        .excluded_protos
                        .iter()
                        .any(|p| Rc::ptr_eq(p, &current))
                    {
                        return true;
                    }
                    proto = current.parent().cloned();
                }
                false
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ForeignValue, InstanceObject, Key, LocalFn, MapObject};

    #[test]
    fn test_classification_precedence() {
        assert_eq!(classify(&Value::Null), Category::Primitive);
        assert_eq!(classify(&Value::Int(1)), Category::Primitive);
        assert_eq!(classify(&Value::str("s")), Category::Primitive);
        assert_eq!(
            classify(&Value::Func(LocalFn::new("f", |_, _| Ok(Value::Null)))),
            Category::Function
        );
        assert_eq!(classify(&Value::seq(vec![])), Category::Iterable);
        assert_eq!(classify(&Value::map(MapObject::new())), Category::PlainMap);
        assert_eq!(
            classify(&Value::instance(InstanceObject::new(Rc::new(
                Prototype::new("T")
            )))),
            Category::Instance
        );
        assert_eq!(
            classify(&Value::Foreign(ForeignValue::new(FRAME_TAG))),
            Category::Foreign
        );
    }

    #[test]
    fn test_standard_policy_excludes_frames() {
        let policy = ExclusionPolicy::standard();
        assert!(policy.excludes(&Value::Foreign(ForeignValue::new(FRAME_TAG))));
        assert!(!policy.excludes(&Value::Foreign(ForeignValue::new("canvas"))));
        assert!(!policy.excludes(&Value::Int(1)));
    }

    #[test]
    fn test_prototype_exclusion_walks_chain() {
        let global = Rc::new(Prototype::new("GlobalScope"));
        let derived = Rc::new(Prototype::new("Window").with_parent(Rc::clone(&global)));
        let policy = ExclusionPolicy::new().with_prototype(Rc::clone(&global));

        let direct = Value::instance(InstanceObject::new(Rc::clone(&global)));
        let inherited = Value::instance(InstanceObject::new(derived));
        let unrelated = Value::instance(InstanceObject::new(Rc::new(Prototype::new("Plain"))));

        assert!(policy.excludes(&direct));
        assert!(policy.excludes(&inherited));
        assert!(!policy.excludes(&unrelated));
    }

    #[test]
    fn test_instance_exclusion_uses_identity_not_name() {
        let global = Rc::new(Prototype::new("GlobalScope"));
        let impostor = Rc::new(Prototype::new("GlobalScope"));
        let policy = ExclusionPolicy::new().with_prototype(global);

        let value = Value::instance(InstanceObject::new(impostor));
        assert!(!policy.excludes(&value));
    }

    #[test]
    fn test_instance_with_key() {
        let proto = Rc::new(Prototype::new("T"));
        let mut instance = InstanceObject::new(proto);
        instance.set(Key::name("x"), Value::Int(1));
        assert_eq!(classify(&Value::instance(instance)), Category::Instance);
    }
}
