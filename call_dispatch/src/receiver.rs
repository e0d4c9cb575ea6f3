//! Inbound call receiver
//!
//! Registers a per-ticket handler on the subject that materializes wire
//! arguments, invokes the bound local function, and sends the correlated
//! response ticket back. Faults from the function body become rejections;
//! values that cannot cross the boundary reject the call too.

use realm_types::{CallArgsTicket, DefTicket, MessageId, ResponseTicket};
use remote_subject::{CleanupFn, RemoteSubject};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use value_graph::{LocalFn, Value};

/// Wires `bound_fn` as the receiver for calls addressed to `ticket`
///
/// Returns the cleanup that unregisters the receiver; the registry stores
/// it against the ticket's out-of-scope pathway.
pub fn receive_calls(
    bound_fn: LocalFn,
    ticket: &DefTicket,
    subject: &Rc<RefCell<RemoteSubject>>,
) -> CleanupFn {
    let fn_id = ticket.fn_id.clone();
    let weak = Rc::downgrade(subject);
    let receiver = {
        let weak = weak.clone();
        Box::new(move |call: CallArgsTicket, correlation: MessageId| {
            let subject = match weak.upgrade() {
                Some(subject) => subject,
                None => return,
            };
            let args: Vec<Value> = call
                .args
                .iter()
                .map(|arg| RemoteSubject::materialize_from_wire(&subject, arg))
                .collect();
            let response = match bound_fn.call(None, &args) {
                Ok(result) => match RemoteSubject::simulate_to_wire(&subject, &result) {
                    Ok(value) => ResponseTicket::Resolve { value },
                    Err(err) => ResponseTicket::Reject {
                        error: json!(err.to_string()),
                    },
                },
                Err(fault) => ResponseTicket::Reject {
                    error: json!(fault),
                },
            };
            // The channel may have dropped while the call ran; a failed
            // response send has no one left to observe it.
            let _ = subject.borrow_mut().send_response(correlation, response);
        })
    };
    subject
        .borrow_mut()
        .register_call_receiver(fn_id.clone(), receiver);

    Box::new(move || {
        if let Some(subject) = weak.upgrade() {
            subject.borrow_mut().remove_call_receiver(&fn_id);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use realm_types::{
        CallArgsTicket, CallId, FnId, MessageId, WireEnvelope, WireMessage,
    };
    use remote_subject::{SimulatorFacade, SubjectError, Transport};
    use serde_json::json;
    use std::collections::VecDeque;

    struct CapturingTransport {
        sent: Rc<RefCell<VecDeque<WireEnvelope>>>,
    }

    impl Transport for CapturingTransport {
        fn send(&mut self, envelope: WireEnvelope) -> Result<(), SubjectError> {
            self.sent.borrow_mut().push_back(envelope);
            Ok(())
        }
    }

    struct IdentityFacade;

    impl SimulatorFacade for IdentityFacade {
        fn simulate_value(&self, value: &Value) -> Option<Value> {
            Some(value.clone())
        }
        fn materialize_value(&self, value: &Value) -> Value {
            value.clone()
        }
    }

    fn subject() -> (Rc<RefCell<RemoteSubject>>, Rc<RefCell<VecDeque<WireEnvelope>>>) {
        let sent = Rc::new(RefCell::new(VecDeque::new()));
        let transport = CapturingTransport {
            sent: Rc::clone(&sent),
        };
        let subject = Rc::new(RefCell::new(RemoteSubject::new(
            Box::new(transport),
            Rc::new(IdentityFacade),
        )));
        (subject, sent)
    }

    fn call_envelope(fn_id: &str, args: Vec<serde_json::Value>) -> WireEnvelope {
        WireMessage::Call(CallArgsTicket {
            fn_id: FnId::from_raw(fn_id),
            call_id: CallId::first(),
            args,
        })
        .encode()
        .unwrap()
    }

    fn sent_response(
        sent: &Rc<RefCell<VecDeque<WireEnvelope>>>,
    ) -> (Option<MessageId>, ResponseTicket) {
        let envelope = sent.borrow_mut().pop_front().unwrap();
        let correlation = envelope.correlation_id;
        match WireMessage::decode(&envelope).unwrap() {
            WireMessage::Response(ticket) => (correlation, ticket),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_call_resolves_with_function_result() {
        let (subject, sent) = subject();
        let greet = LocalFn::new("greet", |_parent, args| match args {
            [Value::Str(name)] => Ok(Value::str(format!("hello {}", name))),
            _ => Err("expected one name".to_string()),
        });
        receive_calls(greet, &DefTicket::new(FnId::from_raw("greet_1")), &subject);

        let inbound = call_envelope("greet_1", vec![json!("world")]);
        RemoteSubject::deliver(&subject, &inbound).unwrap();

        let (correlation, ticket) = sent_response(&sent);
        assert_eq!(correlation, Some(inbound.id));
        assert_eq!(
            ticket,
            ResponseTicket::Resolve {
                value: json!("hello world")
            }
        );
    }

    #[test]
    fn test_function_fault_becomes_rejection() {
        let (subject, sent) = subject();
        let greet = LocalFn::new("greet", |_parent, _args| {
            Err("expected one name".to_string())
        });
        receive_calls(greet, &DefTicket::new(FnId::from_raw("greet_1")), &subject);

        RemoteSubject::deliver(&subject, &call_envelope("greet_1", vec![])).unwrap();

        let (_, ticket) = sent_response(&sent);
        assert_eq!(
            ticket,
            ResponseTicket::Reject {
                error: json!("expected one name")
            }
        );
    }

    #[test]
    fn test_unserializable_result_becomes_rejection() {
        let (subject, sent) = subject();
        let make_fn = LocalFn::new("make_fn", |_parent, _args| {
            Ok(Value::Func(LocalFn::anonymous(|_, _| Ok(Value::Null))))
        });
        receive_calls(make_fn, &DefTicket::new(FnId::from_raw("make_fn_1")), &subject);

        RemoteSubject::deliver(&subject, &call_envelope("make_fn_1", vec![])).unwrap();

        let (_, ticket) = sent_response(&sent);
        assert!(matches!(ticket, ResponseTicket::Reject { .. }));
    }

    #[test]
    fn test_cleanup_unregisters_receiver() {
        let (subject, sent) = subject();
        let greet = LocalFn::new("greet", |_parent, _args| Ok(Value::Null));
        let cleanup =
            receive_calls(greet, &DefTicket::new(FnId::from_raw("greet_1")), &subject);
        cleanup();

        RemoteSubject::deliver(&subject, &call_envelope("greet_1", vec![])).unwrap();

        // No receiver left, so the subject answers with the unknown-function
        // rejection instead of running the callback.
        let (_, ticket) = sent_response(&sent);
        assert_eq!(
            ticket,
            ResponseTicket::Reject {
                error: json!("Unknown function: greet_1")
            }
        );
    }

    #[test]
    fn test_receiver_materializes_arguments() {
        let (subject, sent) = subject();
        let sum = LocalFn::new("sum", |_parent, args| {
            let mut total = 0i64;
            for arg in args {
                match arg {
                    Value::Int(n) => total += n,
                    other => return Err(format!("not a number: {:?}", other)),
                }
            }
            Ok(Value::Int(total))
        });
        receive_calls(sum, &DefTicket::new(FnId::from_raw("sum_1")), &subject);

        RemoteSubject::deliver(&subject, &call_envelope("sum_1", vec![json!(2), json!(3)]))
            .unwrap();

        let (_, ticket) = sent_response(&sent);
        assert_eq!(ticket, ResponseTicket::Resolve { value: json!(5) });
    }
}
