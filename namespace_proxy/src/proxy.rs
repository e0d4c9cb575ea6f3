//! Path-accumulating proxy nodes over a shared address builder
//!
//! Every node owns its full path and re-arms the shared builder's current
//! path when traversed, so revisiting a cached chain addresses the same
//! namespace again instead of extending a stale path. `then` is reserved:
//! looking it up compiles and flushes the pending batch, which lets a host
//! treat the proxy like an awaitable.

use realm_types::{CallHandle, HostMethodAddress};
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use value_graph::{Key, Value};

/// Dispatches one compiled batch of addresses across the boundary
pub type BatchInvoker = Rc<dyn Fn(Vec<HostMethodAddress>) -> CallHandle<Value>>;

/// Errors from namespace traversal and invocation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// Namespace properties are addressed by string keys only
    #[error("namespace properties must be string-keyed")]
    InvalidProperty,
    /// The namespace root is not itself a method
    #[error("cannot invoke an empty namespace path")]
    EmptyPath,
}

/// Shared builder state: the path being traversed and the pending batch
struct BuilderState {
    current_path: Vec<String>,
    address_cache: Vec<HostMethodAddress>,
}

struct ProxyShared {
    invoker: BatchInvoker,
    builder: RefCell<BuilderState>,
    last_flush: RefCell<Option<CallHandle<Value>>>,
}

/// One node of the lazy namespace proxy
#[derive(Clone)]
pub struct NamespaceProxy {
    shared: Rc<ProxyShared>,
    path: Vec<String>,
    children: Rc<RefCell<HashMap<String, NamespaceProxy>>>,
}

impl std::fmt::Debug for NamespaceProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceProxy")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl NamespaceProxy {
    /// Creates the root node over a batch dispatcher
    pub fn new(invoker: BatchInvoker) -> Self {
        let shared = Rc::new(ProxyShared {
            invoker,
            builder: RefCell::new(BuilderState {
                current_path: Vec::new(),
                address_cache: Vec::new(),
            }),
            last_flush: RefCell::new(None),
        });
        Self::node(shared, Vec::new())
    }

    fn node(shared: Rc<ProxyShared>, path: Vec<String>) -> Self {
        Self {
            shared,
            path,
            children: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Returns this node's path from the namespace root
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Returns the number of committed addresses awaiting a flush
    pub fn pending_addresses(&self) -> usize {
        self.shared.builder.borrow().address_cache.len()
    }

    /// Traverses one property
    ///
    /// `then` is reserved: it flushes the pending batch (handle available
    /// via [`NamespaceProxy::last_flush`]) and yields a fresh root. Any
    /// other name yields the identity-cached child node and re-arms the
    /// builder's current path to the child's path.
    pub fn get(&self, key: &Key) -> Result<NamespaceProxy, ProxyError> {
        let name = match key {
            Key::Name(name) => name.clone(),
            Key::Symbol(_) => return Err(ProxyError::InvalidProperty),
        };
        if name == "then" {
            self.flush();
            return Ok(Self::node(Rc::clone(&self.shared), Vec::new()));
        }

        let mut child_path = self.path.clone();
        child_path.push(name.clone());
        self.shared.builder.borrow_mut().current_path = child_path.clone();

        let mut children = self.children.borrow_mut();
        let child = children
            .entry(name)
            .or_insert_with(|| Self::node(Rc::clone(&self.shared), child_path));
        Ok(child.clone())
    }

    /// Commits this node's path as a method address
    ///
    /// The final path segment is the method name, the rest its namespace.
    /// Returns a fresh root node so chaining can continue.
    pub fn invoke(&self, args: Vec<JsonValue>) -> Result<NamespaceProxy, ProxyError> {
        let (namespace, name) = match self.path.split_last() {
            Some((name, namespace)) => (namespace.to_vec(), name.clone()),
            None => return Err(ProxyError::EmptyPath),
        };
        let mut builder = self.shared.builder.borrow_mut();
        builder.address_cache.push(HostMethodAddress {
            path: namespace,
            name,
            args,
        });
        builder.current_path.clear();
        drop(builder);
        Ok(Self::node(Rc::clone(&self.shared), Vec::new()))
    }

    /// Compiles and dispatches the pending batch
    ///
    /// Returns `None` when nothing was committed since the last flush; the
    /// dispatcher is not invoked for an empty batch.
    pub fn flush(&self) -> Option<CallHandle<Value>> {
        let batch = {
            let mut builder = self.shared.builder.borrow_mut();
            builder.current_path.clear();
            std::mem::take(&mut builder.address_cache)
        };
        if batch.is_empty() {
            return None;
        }
        let handle = (self.shared.invoker)(batch);
        *self.shared.last_flush.borrow_mut() = Some(handle.clone());
        Some(handle)
    }

    /// Returns the handle from the most recent flush
    pub fn last_flush(&self) -> Option<CallHandle<Value>> {
        self.shared.last_flush.borrow().clone()
    }
}
