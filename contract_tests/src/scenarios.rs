//! End-to-end scenarios across two linked realms
//!
//! Each test stands up two object simulators over a loopback channel and
//! drives a complete conversation: graph handoff, calls, responses,
//! disconnects, releases, and namespace batches.

#[cfg(test)]
mod tests {
    use crate::test_helpers::{linked_realms, pump};
    use namespace_proxy::NamespaceProxy;
    use realm_types::{CallHandle, CallOutcome, HostMethodAddress, WireMessage};
    use remote_subject::{RemoteSubject, SubjectEvent};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use value_graph::{
        from_json, to_json, InstanceObject, Key, LocalFn, MapObject, Prototype, Stub, Value,
    };

    fn greet_fn() -> Value {
        Value::Func(LocalFn::new("greet", |_parent, args| match args {
            [Value::Str(name)] => Ok(Value::str(format!("hello {}", name))),
            _ => Err("expected one name".to_string()),
        }))
    }

    /// Hands a simulated graph to the peer the way a host channel would:
    /// serialized to JSON and parsed back on the other side.
    fn across_the_wire(value: &Value) -> Value {
        from_json(&to_json(value).expect("simulated graph must serialize"))
    }

    fn as_stub(value: Value) -> Stub {
        match value {
            Value::Stub(stub) => stub,
            other => panic!("expected a stub, got {:?}", other),
        }
    }

    #[test]
    fn test_wrapped_ticket_wire_shape() {
        let (_channel, realm_a, _realm_b) = linked_realms();
        let simulated = realm_a.simulate(&greet_fn()).unwrap();
        assert_eq!(
            to_json(&simulated).unwrap(),
            json!({"[[realmlink.ref]]": "greet_1"})
        );
    }

    #[test]
    fn test_greet_conversation() {
        let (channel, realm_a, realm_b) = linked_realms();

        let mut api = MapObject::new();
        api.set(Key::name("greet"), greet_fn());
        let simulated = realm_a.simulate(&Value::map(api)).unwrap();

        let received = realm_b.materialize(&across_the_wire(&simulated));
        let stub = match received {
            Value::Map(map) => as_stub(map.borrow().get(&Key::name("greet")).unwrap()),
            other => panic!("expected a map, got {:?}", other),
        };

        let handle = stub.call(vec![Value::str("world")]).unwrap();
        assert!(handle.is_pending());
        pump(&channel, &realm_a, &realm_b);
        assert_eq!(
            handle.outcome(),
            Some(CallOutcome::Resolved(Value::str("hello world")))
        );
    }

    #[test]
    fn test_method_binds_to_its_instance() {
        let (channel, realm_a, realm_b) = linked_realms();

        let proto = Rc::new(Prototype::new("Document").with_property(
            Key::name("title"),
            Value::Func(LocalFn::new("title", |parent, _args| {
                let parent = parent.ok_or("method called without a receiver")?;
                match parent {
                    Value::Instance(instance) => instance
                        .borrow()
                        .get(&Key::name("name"))
                        .ok_or_else(|| "no name field".to_string()),
                    other => Err(format!("unexpected receiver: {:?}", other)),
                }
            })),
        ));
        let mut doc = InstanceObject::new(proto);
        doc.set(Key::name("name"), Value::str("quarterly report"));

        let simulated = realm_a.simulate(&Value::instance(doc)).unwrap();
        let received = realm_b.materialize(&across_the_wire(&simulated));
        let stub = match received {
            Value::Map(map) => as_stub(map.borrow().get(&Key::name("title")).unwrap()),
            other => panic!("expected a map, got {:?}", other),
        };

        let handle = stub.call(vec![]).unwrap();
        pump(&channel, &realm_a, &realm_b);
        assert_eq!(
            handle.outcome(),
            Some(CallOutcome::Resolved(Value::str("quarterly report")))
        );
    }

    #[test]
    fn test_disconnect_fails_every_pending_call() {
        let (_channel, realm_a, realm_b) = linked_realms();
        let simulated = realm_a.simulate(&greet_fn()).unwrap();
        let stub = as_stub(realm_b.materialize(&across_the_wire(&simulated)));

        let handles: Vec<_> = (0..3)
            .map(|_| stub.call(vec![Value::str("world")]).unwrap())
            .collect();
        RemoteSubject::disconnect(realm_b.subject(), "frame removed");

        for handle in &handles {
            match handle.outcome() {
                Some(CallOutcome::Failed(err)) => assert_eq!(err.reason, "frame removed"),
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        let late = stub.call(vec![Value::str("again")]).unwrap_err();
        assert_eq!(
            late.to_string(),
            "Function belongs to a simulated remote object which has been \
             disconnected: frame removed"
        );
    }

    #[test]
    fn test_disconnect_notice_crosses_the_wire() {
        let (channel, realm_a, realm_b) = linked_realms();
        let simulated = realm_a.simulate(&greet_fn()).unwrap();
        let stub = as_stub(realm_b.materialize(&across_the_wire(&simulated)));

        realm_a
            .subject()
            .borrow_mut()
            .send(WireMessage::Disconnect {
                reason: "host shutting down".to_string(),
            })
            .unwrap();
        pump(&channel, &realm_a, &realm_b);

        let err = stub.call(vec![]).unwrap_err();
        assert_eq!(err.reason, "host shutting down");
    }

    #[test]
    fn test_release_runs_remote_cleanup() {
        let (channel, realm_a, realm_b) = linked_realms();
        let simulated = realm_a.simulate(&greet_fn()).unwrap();
        let stub_value = realm_b.materialize(&across_the_wire(&simulated));

        assert!(realm_b.release(&stub_value));
        pump(&channel, &realm_a, &realm_b);

        assert_eq!(
            realm_b
                .subject()
                .borrow()
                .trace()
                .count(|e| matches!(e, SubjectEvent::CleanupRequested { .. })),
            1
        );
        assert_eq!(
            realm_a
                .subject()
                .borrow()
                .trace()
                .count(|e| matches!(e, SubjectEvent::CleanupApplied { .. })),
            1
        );

        // The receiver is gone; a straggler gets the unknown-function answer.
        let handle = as_stub(stub_value).call(vec![Value::str("world")]).unwrap();
        pump(&channel, &realm_a, &realm_b);
        assert_eq!(
            handle.outcome(),
            Some(CallOutcome::Rejected(Value::str(
                "Unknown function: greet_1"
            )))
        );
    }

    #[test]
    fn test_namespace_batch_crosses_the_wire() {
        let (channel, realm_a, realm_b) = linked_realms();

        let received: Rc<RefCell<Vec<HostMethodAddress>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);
        realm_a
            .subject()
            .borrow_mut()
            .on_batch(Box::new(move |addresses, _correlation| {
                sink.borrow_mut().extend(addresses);
            }));

        let subject = Rc::clone(realm_b.subject());
        let ns = NamespaceProxy::new(Rc::new(move |batch| {
            let handle = CallHandle::pending();
            let _ = subject.borrow_mut().send(WireMessage::Batch(batch));
            handle
        }));

        ns.get(&Key::name("editor"))
            .unwrap()
            .get(&Key::name("selection"))
            .unwrap()
            .get(&Key::name("clear"))
            .unwrap()
            .invoke(vec![json!(true)])
            .unwrap();
        ns.get(&Key::name("editor"))
            .unwrap()
            .get(&Key::name("focus"))
            .unwrap()
            .invoke(vec![])
            .unwrap();
        assert!(received.borrow().is_empty());

        ns.flush().unwrap();
        pump(&channel, &realm_a, &realm_b);

        assert_eq!(
            received.borrow().as_slice(),
            [
                HostMethodAddress {
                    path: vec!["editor".to_string(), "selection".to_string()],
                    name: "clear".to_string(),
                    args: vec![json!(true)],
                },
                HostMethodAddress {
                    path: vec!["editor".to_string()],
                    name: "focus".to_string(),
                    args: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_self_referential_graph_terminates() {
        let (_channel, realm_a, _realm_b) = linked_realms();

        let inner = Value::map(MapObject::new());
        let mut outer = MapObject::new();
        outer.set(Key::name("child"), inner.clone());
        let outer = Value::map(outer);
        if let Value::Map(map) = &inner {
            map.borrow_mut().set(Key::name("parent"), outer.clone());
        }

        let simulated = realm_a.simulate(&outer).unwrap();
        match simulated {
            Value::Map(map) => {
                let child = map.borrow().get(&Key::name("child")).unwrap();
                match child {
                    Value::Map(child) => assert_eq!(
                        child.borrow().get(&Key::name("parent")),
                        Some(Value::str("[[RECURSION]]"))
                    ),
                    other => panic!("expected a map, got {:?}", other),
                }
            }
            other => panic!("expected a map, got {:?}", other),
        }
    }
}
