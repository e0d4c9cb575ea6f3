//! The per-realm ticket registry
//!
//! One [`ObjectSimulator`] exists per connected realm. It owns the subject,
//! mints tickets for local functions discovered during simulation, and
//! builds callable stubs for tickets received during materialization. Both
//! directions are identity-cached so repeated traversals of the same graph
//! reuse the same tickets and stubs.

use crate::facade::LateFacade;
use crate::notifier::ReclaimNotifier;
use call_dispatch::{make_call_sender, receive_calls, CallSender};
use realm_types::{DefTicket, FnId};
use remote_subject::{RemoteSubject, SimulatorFacade, Transport};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use value_graph::{simulate_graph, wrapped, ExclusionPolicy, LocalFn, Stub, Value};

/// Cache key for a minted receiver: function identity plus receiver binding
type ReceiverKey = (usize, Option<usize>);

struct SenderEntry {
    sender: CallSender,
    stub: Value,
}

/// Registry turning local functions into tickets and tickets into stubs
pub struct ObjectSimulator {
    subject: Rc<RefCell<RemoteSubject>>,
    notifier: Rc<ReclaimNotifier>,
    policy: ExclusionPolicy,
    fn_counter: Cell<u64>,
    receiver_tickets: RefCell<HashMap<ReceiverKey, DefTicket>>,
    senders: RefCell<HashMap<FnId, SenderEntry>>,
}

impl ObjectSimulator {
    /// Wires a simulator, its subject, and the reclamation notifier
    ///
    /// The subject gets a [`LateFacade`] bound back to the simulator once it
    /// exists, so the two can reference each other without a construction
    /// cycle.
    pub fn create(transport: Box<dyn Transport>, policy: ExclusionPolicy) -> Rc<Self> {
        let facade = Rc::new(LateFacade::unbound());
        let subject = Rc::new(RefCell::new(RemoteSubject::new(
            transport,
            Rc::clone(&facade) as Rc<dyn SimulatorFacade>,
        )));
        let notifier = Rc::new(ReclaimNotifier::new(Rc::downgrade(&subject)));
        let simulator = Rc::new(Self {
            subject,
            notifier,
            policy,
            fn_counter: Cell::new(0),
            receiver_tickets: RefCell::new(HashMap::new()),
            senders: RefCell::new(HashMap::new()),
        });
        facade.bind(&simulator);
        simulator
    }

    /// Returns the subject this simulator drives
    pub fn subject(&self) -> &Rc<RefCell<RemoteSubject>> {
        &self.subject
    }

    /// Returns the reclamation notifier
    pub fn notifier(&self) -> &Rc<ReclaimNotifier> {
        &self.notifier
    }

    /// Mints (or reuses) the ticket for a local function
    ///
    /// The cache key is the function's identity plus the identity of the
    /// object it binds to, so the same method simulated on two instances
    /// gets two tickets while re-simulating one instance reuses its ticket.
    pub fn make_receiver(&self, func: &LocalFn, parent: Option<&Value>) -> Value {
        let key = (func.identity(), parent.and_then(|p| p.identity()));
        if let Some(ticket) = self.receiver_tickets.borrow().get(&key) {
            return wrapped::wrap(ticket);
        }

        let counter = self.fn_counter.get() + 1;
        self.fn_counter.set(counter);
        let ticket = DefTicket::new(FnId::mint(func.name(), counter));

        let bound = match parent {
            Some(parent) => func.bind(parent.clone()),
            None => func.clone(),
        };
        let cleanup = receive_calls(bound, &ticket, &self.subject);
        self.subject.borrow_mut().on_out_of_scope(&ticket, cleanup);

        self.receiver_tickets.borrow_mut().insert(key, ticket.clone());
        wrapped::wrap(&ticket)
    }

    /// Builds (or reuses) the callable stub for a received ticket
    pub fn make_sender(&self, ticket: &DefTicket) -> Value {
        if let Some(entry) = self.senders.borrow().get(&ticket.fn_id) {
            return entry.stub.clone();
        }

        let sender = make_call_sender(ticket, &self.subject);
        self.notifier.register(ticket.clone());
        let hook_notifier = Rc::clone(&self.notifier);
        let hook_id = ticket.fn_id.clone();
        sender.set_release_hook(Box::new(move || hook_notifier.notify(&hook_id)));

        let call_sender = sender.clone();
        let stub = Value::Stub(Stub::new(ticket.fn_id.clone(), move |args| {
            call_sender.call(args)
        }));
        self.senders.borrow_mut().insert(
            ticket.fn_id.clone(),
            SenderEntry {
                sender,
                stub: stub.clone(),
            },
        );
        stub
    }

    /// Simulates a value graph for transmission
    ///
    /// Returns `None` when the top-level value itself is excluded.
    pub fn simulate(&self, value: &Value) -> Option<Value> {
        let mut on_function =
            |func: &LocalFn, parent: Option<&Value>| self.make_receiver(func, parent);
        simulate_graph(value, &mut on_function, &self.policy)
    }

    /// Materializes a received value graph, turning tickets into stubs
    pub fn materialize(&self, value: &Value) -> Value {
        let mut on_def_message = |ticket: &DefTicket| self.make_sender(ticket);
        value_graph::materialize(value, &mut on_def_message)
    }

    /// Releases a materialized stub, notifying the owning realm
    ///
    /// Returns whether the value was a stub this simulator still held.
    /// Releasing drops the sender cache entry; a later materialization of
    /// the same ticket would build a fresh stub.
    pub fn release(&self, value: &Value) -> bool {
        let stub = match value {
            Value::Stub(stub) => stub,
            _ => return false,
        };
        let entry = self.senders.borrow_mut().remove(stub.fn_id());
        match entry {
            Some(entry) => {
                entry.sender.release();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realm_types::CallOutcome;
    use remote_subject::LoopbackChannel;
    use value_graph::{ForeignValue, Key, MapObject, FRAME_TAG};

    fn linked_simulators() -> (LoopbackChannel, Rc<ObjectSimulator>, Rc<ObjectSimulator>) {
        let channel = LoopbackChannel::new();
        let sim_a = ObjectSimulator::create(
            Box::new(channel.transport_a()),
            ExclusionPolicy::standard(),
        );
        let sim_b = ObjectSimulator::create(
            Box::new(channel.transport_b()),
            ExclusionPolicy::standard(),
        );
        (channel, sim_a, sim_b)
    }

    fn pump(
        channel: &LoopbackChannel,
        sim_a: &Rc<ObjectSimulator>,
        sim_b: &Rc<ObjectSimulator>,
    ) -> usize {
        channel.pump(sim_a.subject(), sim_b.subject()).unwrap()
    }

    fn greet_fn() -> Value {
        Value::Func(LocalFn::new("greet", |_parent, args| match args {
            [Value::Str(name)] => Ok(Value::str(format!("hello {}", name))),
            _ => Err("expected one name".to_string()),
        }))
    }

    #[test]
    fn test_simulate_function_yields_wrapped_ticket() {
        let (_channel, sim_a, _sim_b) = linked_simulators();
        let simulated = sim_a.simulate(&greet_fn()).unwrap();
        let ticket = wrapped::unwrap(&simulated).unwrap();
        assert_eq!(ticket.fn_id.as_str(), "greet_1");
    }

    #[test]
    fn test_repeated_simulation_reuses_ticket() {
        let (_channel, sim_a, _sim_b) = linked_simulators();
        let func = greet_fn();
        let first = sim_a.simulate(&func).unwrap();
        let second = sim_a.simulate(&func).unwrap();
        assert_eq!(
            wrapped::unwrap(&first).unwrap(),
            wrapped::unwrap(&second).unwrap()
        );
    }

    #[test]
    fn test_repeated_materialization_reuses_stub() {
        let (_channel, sim_a, sim_b) = linked_simulators();
        let simulated = sim_a.simulate(&greet_fn()).unwrap();
        let first = sim_b.materialize(&simulated);
        let second = sim_b.materialize(&simulated);
        assert_eq!(first.identity(), second.identity());
    }

    #[test]
    fn test_end_to_end_call_resolves() {
        let (channel, sim_a, sim_b) = linked_simulators();

        let mut api = MapObject::new();
        api.set(Key::name("greet"), greet_fn());
        let simulated = sim_a.simulate(&Value::map(api)).unwrap();

        let materialized = sim_b.materialize(&simulated);
        let stub = match materialized {
            Value::Map(map) => map.borrow().get(&Key::name("greet")).unwrap(),
            other => panic!("unexpected shape: {:?}", other),
        };
        let stub = match stub {
            Value::Stub(stub) => stub,
            other => panic!("unexpected value: {:?}", other),
        };

        let handle = stub.call(vec![Value::str("world")]).unwrap();
        assert!(handle.is_pending());
        pump(&channel, &sim_a, &sim_b);
        assert_eq!(
            handle.outcome(),
            Some(CallOutcome::Resolved(Value::str("hello world")))
        );
    }

    #[test]
    fn test_remote_fault_rejects() {
        let (channel, sim_a, sim_b) = linked_simulators();
        let simulated = sim_a.simulate(&greet_fn()).unwrap();
        let stub = match sim_b.materialize(&simulated) {
            Value::Stub(stub) => stub,
            other => panic!("unexpected value: {:?}", other),
        };

        let handle = stub.call(vec![]).unwrap();
        pump(&channel, &sim_a, &sim_b);
        assert_eq!(
            handle.outcome(),
            Some(CallOutcome::Rejected(Value::str("expected one name")))
        );
    }

    #[test]
    fn test_release_tears_down_remote_receiver() {
        let (channel, sim_a, sim_b) = linked_simulators();
        let simulated = sim_a.simulate(&greet_fn()).unwrap();
        let stub_value = sim_b.materialize(&simulated);

        assert!(sim_b.release(&stub_value));
        assert!(!sim_b.release(&stub_value));
        pump(&channel, &sim_a, &sim_b);

        // The owning realm dropped the receiver, so a straggling call gets
        // the unknown-function rejection.
        let stub = match &stub_value {
            Value::Stub(stub) => stub.clone(),
            other => panic!("unexpected value: {:?}", other),
        };
        let handle = stub.call(vec![Value::str("world")]).unwrap();
        pump(&channel, &sim_a, &sim_b);
        assert_eq!(
            handle.outcome(),
            Some(CallOutcome::Rejected(Value::str(
                "Unknown function: greet_1"
            )))
        );
    }

    #[test]
    fn test_standard_policy_omits_frames() {
        let (_channel, sim_a, _sim_b) = linked_simulators();
        let mut map = MapObject::new();
        map.set(Key::name("el"), Value::Foreign(ForeignValue::new(FRAME_TAG)));
        map.set(Key::name("n"), Value::Int(1));

        let simulated = sim_a.simulate(&Value::map(map)).unwrap();
        match simulated {
            Value::Map(map) => {
                let map = map.borrow();
                assert!(map.get(&Key::name("el")).is_none());
                assert_eq!(map.get(&Key::name("n")), Some(Value::Int(1)));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_disconnect_disables_stub_synchronously() {
        let (_channel, sim_a, sim_b) = linked_simulators();
        let simulated = sim_a.simulate(&greet_fn()).unwrap();
        let stub = match sim_b.materialize(&simulated) {
            Value::Stub(stub) => stub,
            other => panic!("unexpected value: {:?}", other),
        };

        RemoteSubject::disconnect(sim_b.subject(), "frame removed");
        let err = stub.call(vec![]).unwrap_err();
        assert_eq!(err.reason, "frame removed");
    }
}
