//! The remote subject: registries, routing, and disconnect
//!
//! Inbound routing and disconnection run as associated functions over
//! `Rc<RefCell<RemoteSubject>>` so that handlers taken out of the registries
//! can re-enter the subject (to send responses, register senders, and so on)
//! without holding a borrow.

use crate::trace::{SubjectEvent, SubjectTrace};
use realm_types::{
    CallArgsTicket, CallKey, CleanupTicket, CodecError, DefTicket, FnId, HostMethodAddress,
    MessageId, ResponseTicket, WireEnvelope, WireMessage,
};
use serde_json::{json, Value as JsonValue};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use value_graph::{from_json, to_json, Value};

/// Errors from subject operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubjectError {
    #[error("Subject is disconnected: {reason}")]
    Disconnected { reason: String },

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Value cannot cross the boundary: {0}")]
    Unserializable(String),
}

impl From<CodecError> for SubjectError {
    fn from(error: CodecError) -> Self {
        SubjectError::Codec(error.to_string())
    }
}

/// External collaborator that physically moves envelopes across the boundary
///
/// `send` is fire-and-forget; delivery happens whenever the host scheduler
/// hands the peer's envelopes to [`RemoteSubject::deliver`].
pub trait Transport {
    fn send(&mut self, envelope: WireEnvelope) -> Result<(), SubjectError>;
}

/// Late-bound handle to the object simulator
///
/// The subject needs the simulator to simulate outbound values and
/// materialize inbound ones, while the simulator owns the subject; this
/// facade breaks the construction cycle.
pub trait SimulatorFacade {
    /// Simulates a value for transmission; `None` means the value is excluded
    fn simulate_value(&self, value: &Value) -> Option<Value>;
    /// Materializes a received value, turning tickets into stubs
    fn materialize_value(&self, value: &Value) -> Value;
}

/// Settled outcome delivered to a one-shot respond handler
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    Resolved(Value),
    Rejected(Value),
}

/// One-shot handler for the response correlated to a call
pub type RespondHandler = Box<dyn FnOnce(ResponseOutcome)>;

/// Inbound call handler registered per function id
///
/// Receives the call ticket and the envelope id to correlate the response to.
pub type CallReceiver = Box<dyn FnMut(CallArgsTicket, MessageId)>;

/// Handler invoked once when the channel becomes permanently unusable
pub type DisconnectHandler = Box<dyn FnOnce(&str)>;

/// Handler for inbound namespace batches
pub type BatchHandler = Box<dyn FnMut(Vec<HostMethodAddress>, MessageId)>;

/// Cleanup procedure stored against a ticket's out-of-scope pathway
pub type CleanupFn = Box<dyn FnOnce()>;

/// The transport-facing contract consumed by registry and dispatcher
pub struct RemoteSubject {
    transport: Box<dyn Transport>,
    facade: Rc<dyn SimulatorFacade>,
    respond_handlers: HashMap<CallKey, RespondHandler>,
    outgoing_calls: HashMap<MessageId, CallKey>,
    call_receivers: HashMap<FnId, CallReceiver>,
    out_of_scope: HashMap<FnId, CleanupFn>,
    disconnect_handlers: Vec<DisconnectHandler>,
    batch_handler: Option<BatchHandler>,
    disconnected: Option<String>,
    trace: SubjectTrace,
}

impl RemoteSubject {
    /// Creates a subject over a transport and a simulator facade
    pub fn new(transport: Box<dyn Transport>, facade: Rc<dyn SimulatorFacade>) -> Self {
        Self {
            transport,
            facade,
            respond_handlers: HashMap::new(),
            outgoing_calls: HashMap::new(),
            call_receivers: HashMap::new(),
            out_of_scope: HashMap::new(),
            disconnect_handlers: Vec::new(),
            batch_handler: None,
            disconnected: None,
            trace: SubjectTrace::new(),
        }
    }

    /// Returns whether the subject is still connected
    pub fn is_connected(&self) -> bool {
        self.disconnected.is_none()
    }

    /// Returns the disconnect reason, if disconnected
    pub fn disconnect_reason(&self) -> Option<&str> {
        self.disconnected.as_deref()
    }

    /// Returns the recorded event trace
    pub fn trace(&self) -> &SubjectTrace {
        &self.trace
    }

    /// Transmits a wire message; fire-and-forget
    ///
    /// Calls are recorded so the inbound response envelope can be correlated
    /// back to the call key.
    pub fn send(&mut self, message: WireMessage) -> Result<MessageId, SubjectError> {
        if let Some(reason) = &self.disconnected {
            return Err(SubjectError::Disconnected {
                reason: reason.clone(),
            });
        }
        let envelope = message.encode()?;
        if let WireMessage::Call(ticket) = &message {
            self.outgoing_calls.insert(envelope.id, ticket.key());
        }
        let id = envelope.id;
        self.trace.record(SubjectEvent::Sent {
            action: envelope.action.clone(),
        });
        self.transport.send(envelope)?;
        Ok(id)
    }

    /// Transmits a response correlated to an inbound envelope
    pub fn send_response(
        &mut self,
        correlation: MessageId,
        ticket: ResponseTicket,
    ) -> Result<(), SubjectError> {
        if let Some(reason) = &self.disconnected {
            return Err(SubjectError::Disconnected {
                reason: reason.clone(),
            });
        }
        let envelope = WireMessage::Response(ticket)
            .encode()?
            .with_correlation(correlation);
        self.trace.record(SubjectEvent::Sent {
            action: envelope.action.clone(),
        });
        self.transport.send(envelope)
    }

    /// Registers a one-shot handler for the response to a call
    pub fn on_respond(&mut self, call: &CallArgsTicket, handler: RespondHandler) {
        self.respond_handlers.insert(call.key(), handler);
    }

    /// Registers a handler fired once when the channel becomes unusable
    ///
    /// If the subject already disconnected, the handler fires immediately.
    pub fn on_disconnected(&mut self, handler: DisconnectHandler) {
        match &self.disconnected {
            Some(reason) => handler(reason),
            None => self.disconnect_handlers.push(handler),
        }
    }

    /// Stores the cleanup run when the remote side releases a ticket
    pub fn on_out_of_scope(&mut self, ticket: &DefTicket, cleanup: CleanupFn) {
        self.out_of_scope.insert(ticket.fn_id.clone(), cleanup);
    }

    /// Transmits an out-of-scope notification for a ticket
    pub fn notify_cleanup(&mut self, ticket: &DefTicket) -> Result<(), SubjectError> {
        self.trace.record(SubjectEvent::CleanupRequested {
            fn_id: ticket.fn_id.clone(),
        });
        self.send(WireMessage::Cleanup(CleanupTicket {
            fn_id: ticket.fn_id.clone(),
        }))?;
        Ok(())
    }

    /// Registers the inbound call handler for a locally owned function
    pub fn register_call_receiver(&mut self, fn_id: FnId, receiver: CallReceiver) {
        self.call_receivers.insert(fn_id, receiver);
    }

    /// Removes the inbound call handler for a function
    pub fn remove_call_receiver(&mut self, fn_id: &FnId) {
        self.call_receivers.remove(fn_id);
    }

    /// Registers the handler for inbound namespace batches
    pub fn on_batch(&mut self, handler: BatchHandler) {
        self.batch_handler = Some(handler);
    }

    /// Simulates a value and encodes it for the wire
    ///
    /// Associated function: simulation may re-enter the subject to register
    /// receivers, so no borrow is held across it. Values the exclusion
    /// policy omits encode as JSON null.
    pub fn simulate_to_wire(
        subject: &Rc<RefCell<RemoteSubject>>,
        value: &Value,
    ) -> Result<JsonValue, SubjectError> {
        let facade = Rc::clone(&subject.borrow().facade);
        match facade.simulate_value(value) {
            Some(simulated) => {
                to_json(&simulated).map_err(|err| SubjectError::Unserializable(err.to_string()))
            }
            None => Ok(JsonValue::Null),
        }
    }

    /// Decodes a wire value and materializes tickets into stubs
    ///
    /// Associated function for the same re-entrancy reason as
    /// [`RemoteSubject::simulate_to_wire`].
    pub fn materialize_from_wire(subject: &Rc<RefCell<RemoteSubject>>, json: &JsonValue) -> Value {
        let facade = Rc::clone(&subject.borrow().facade);
        facade.materialize_value(&from_json(json))
    }

    /// Routes one inbound envelope
    ///
    /// Associated function: handlers run with no outstanding borrow so they
    /// can re-enter the subject.
    pub fn deliver(
        subject: &Rc<RefCell<RemoteSubject>>,
        envelope: &WireEnvelope,
    ) -> Result<(), SubjectError> {
        let message = WireMessage::decode(envelope)?;
        subject.borrow_mut().trace.record(SubjectEvent::Delivered {
            action: envelope.action.clone(),
        });
        match message {
            WireMessage::Call(ticket) => {
                let fn_id = ticket.fn_id.clone();
                let receiver = subject.borrow_mut().call_receivers.remove(&fn_id);
                match receiver {
                    Some(mut receiver) => {
                        receiver(ticket, envelope.id);
                        subject
                            .borrow_mut()
                            .call_receivers
                            .entry(fn_id)
                            .or_insert(receiver);
                    }
                    None => {
                        let mut inner = subject.borrow_mut();
                        inner
                            .trace
                            .record(SubjectEvent::UnknownFunction { fn_id: fn_id.clone() });
                        inner.send_response(
                            envelope.id,
                            ResponseTicket::Reject {
                                error: json!(format!("Unknown function: {}", fn_id.as_str())),
                            },
                        )?;
                    }
                }
            }
            WireMessage::Response(ticket) => {
                let correlation = envelope.correlation_id.ok_or_else(|| {
                    SubjectError::Codec("response envelope without correlation id".to_string())
                })?;
                let (handler, facade) = {
                    let mut inner = subject.borrow_mut();
                    let handler = inner
                        .outgoing_calls
                        .remove(&correlation)
                        .and_then(|key| inner.respond_handlers.remove(&key));
                    (handler, Rc::clone(&inner.facade))
                };
                if let Some(handler) = handler {
                    let outcome = match ticket {
                        ResponseTicket::Resolve { value } => {
                            ResponseOutcome::Resolved(facade.materialize_value(&from_json(&value)))
                        }
                        ResponseTicket::Reject { error } => {
                            ResponseOutcome::Rejected(facade.materialize_value(&from_json(&error)))
                        }
                    };
                    handler(outcome);
                }
            }
            WireMessage::Cleanup(ticket) => {
                let cleanup = subject.borrow_mut().out_of_scope.remove(&ticket.fn_id);
                if let Some(cleanup) = cleanup {
                    cleanup();
                    subject.borrow_mut().trace.record(SubjectEvent::CleanupApplied {
                        fn_id: ticket.fn_id,
                    });
                }
            }
            WireMessage::Batch(addresses) => {
                let handler = subject.borrow_mut().batch_handler.take();
                if let Some(mut handler) = handler {
                    handler(addresses, envelope.id);
                    let mut inner = subject.borrow_mut();
                    if inner.batch_handler.is_none() {
                        inner.batch_handler = Some(handler);
                    }
                }
            }
            WireMessage::Disconnect { reason } => {
                Self::disconnect(subject, &reason);
            }
        }
        Ok(())
    }

    /// Marks the channel permanently unusable and fails everything pending
    ///
    /// Idempotent. Fires every disconnect handler with the reason, runs the
    /// stored out-of-scope cleanups, and clears all registries; afterwards
    /// `send` refuses synchronously.
    pub fn disconnect(subject: &Rc<RefCell<RemoteSubject>>, reason: &str) {
        let (handlers, cleanups) = {
            let mut inner = subject.borrow_mut();
            if inner.disconnected.is_some() {
                return;
            }
            inner.disconnected = Some(reason.to_string());
            inner.trace.record(SubjectEvent::Disconnected {
                reason: reason.to_string(),
            });
            inner.respond_handlers.clear();
            inner.outgoing_calls.clear();
            inner.call_receivers.clear();
            inner.batch_handler = None;
            let handlers: Vec<DisconnectHandler> =
                inner.disconnect_handlers.drain(..).collect();
            let cleanups: Vec<CleanupFn> =
                inner.out_of_scope.drain().map(|(_, cleanup)| cleanup).collect();
            (handlers, cleanups)
        };
        for handler in handlers {
            handler(reason);
        }
        for cleanup in cleanups {
            cleanup();
        }
    }
}
