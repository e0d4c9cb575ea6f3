//! Outbound call sender
//!
//! One [`CallSender`] exists per materialized ticket. Each invocation
//! allocates the next call id, registers a one-shot response handler keyed
//! by the call, sends the call ticket, and returns a pending [`CallHandle`].
//! The sender keeps a pool of still-pending handles so subject disconnect
//! can fail them all with the disconnect reason.

use realm_types::{
    CallArgsTicket, CallHandle, CallId, DefTicket, DisconnectionError, FnId, WireMessage,
};
use remote_subject::{RemoteSubject, ResponseOutcome, SubjectError};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use value_graph::Value;

struct SenderInner {
    fn_id: FnId,
    subject: RefCell<Weak<RefCell<RemoteSubject>>>,
    next_call: Cell<u64>,
    pending: RefCell<Vec<CallHandle<Value>>>,
    disconnected: RefCell<Option<String>>,
    release_hook: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl SenderInner {
    /// Permanently disables the sender and fails everything pending
    fn on_disconnect(&self, reason: &str) {
        *self.disconnected.borrow_mut() = Some(reason.to_string());
        *self.subject.borrow_mut() = Weak::new();
        let pending: Vec<CallHandle<Value>> = self.pending.borrow_mut().drain(..).collect();
        for handle in pending {
            handle.fail(DisconnectionError::new(reason));
        }
    }

    fn forget_pending(&self, handle: &CallHandle<Value>) {
        self.pending.borrow_mut().retain(|h| !h.shares_cell(handle));
    }
}

/// Callable stub bound to one remote function ticket
#[derive(Clone)]
pub struct CallSender {
    inner: Rc<SenderInner>,
}

impl CallSender {
    /// Returns the ticket's function id (the stub's debug name)
    pub fn fn_id(&self) -> &FnId {
        &self.inner.fn_id
    }

    /// Returns whether the sender has been disabled by disconnect
    pub fn is_disconnected(&self) -> bool {
        self.inner.disconnected.borrow().is_some()
    }

    /// Returns the number of calls still awaiting a response
    pub fn pending_calls(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Installs the one-shot hook [`CallSender::release`] runs
    pub fn set_release_hook(&self, hook: Box<dyn FnOnce()>) {
        *self.inner.release_hook.borrow_mut() = Some(hook);
    }

    /// Signals that the caller no longer needs the remote function
    ///
    /// Runs the release hook at most once; further calls are no-ops. The
    /// sender itself stays usable until the remote side tears it down.
    pub fn release(&self) {
        let hook = self.inner.release_hook.borrow_mut().take();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Invokes the remote function
    ///
    /// Returns a pending handle that settles when the response arrives.
    /// After disconnect this refuses synchronously without registering a
    /// response handler.
    pub fn call(&self, args: Vec<Value>) -> Result<CallHandle<Value>, DisconnectionError> {
        if let Some(reason) = self.inner.disconnected.borrow().as_deref() {
            return Err(DisconnectionError::new(reason));
        }
        let subject = self
            .inner
            .subject
            .borrow()
            .upgrade()
            .ok_or_else(|| DisconnectionError::new("remote subject dropped"))?;

        let call_id = self.inner.next_call.get() + 1;
        self.inner.next_call.set(call_id);

        let handle = CallHandle::pending();

        let mut wire_args = Vec::with_capacity(args.len());
        for arg in &args {
            match RemoteSubject::simulate_to_wire(&subject, arg) {
                Ok(wire) => wire_args.push(wire),
                Err(err) => {
                    // A value that cannot cross the boundary is a call
                    // fault, not a transport failure.
                    handle.reject(Value::str(err.to_string()));
                    return Ok(handle);
                }
            }
        }

        let ticket = CallArgsTicket {
            fn_id: self.inner.fn_id.clone(),
            call_id: CallId::from_raw(call_id),
            args: wire_args,
        };

        self.inner.pending.borrow_mut().push(handle.clone());
        let settle = handle.clone();
        let inner = Rc::downgrade(&self.inner);
        subject.borrow_mut().on_respond(
            &ticket,
            Box::new(move |outcome| {
                if let Some(inner) = inner.upgrade() {
                    inner.forget_pending(&settle);
                }
                match outcome {
                    ResponseOutcome::Resolved(value) => settle.resolve(value),
                    ResponseOutcome::Rejected(error) => settle.reject(error),
                }
            }),
        );

        let result = match subject.borrow_mut().send(WireMessage::Call(ticket)) {
            Ok(_) => Ok(handle),
            Err(SubjectError::Disconnected { reason }) => {
                self.inner.forget_pending(&handle);
                Err(DisconnectionError::new(reason))
            }
            Err(err) => {
                self.inner.forget_pending(&handle);
                handle.reject(Value::str(err.to_string()));
                Ok(handle)
            }
        };
        result
    }
}

/// Builds the sender stub for a ticket and wires its disconnect teardown
pub fn make_call_sender(
    ticket: &DefTicket,
    subject: &Rc<RefCell<RemoteSubject>>,
) -> CallSender {
    let inner = Rc::new(SenderInner {
        fn_id: ticket.fn_id.clone(),
        subject: RefCell::new(Rc::downgrade(subject)),
        next_call: Cell::new(0),
        pending: RefCell::new(Vec::new()),
        disconnected: RefCell::new(None),
        release_hook: RefCell::new(None),
    });
    let weak = Rc::downgrade(&inner);
    subject.borrow_mut().on_disconnected(Box::new(move |reason| {
        if let Some(inner) = weak.upgrade() {
            inner.on_disconnect(reason);
        }
    }));
    CallSender { inner }
}
