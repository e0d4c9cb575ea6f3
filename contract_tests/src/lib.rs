//! # Wire Contract Tests
//!
//! This crate provides "golden" tests for RealmLink's wire contracts to
//! ensure they don't drift accidentally over time, plus end-to-end scenario
//! tests across a loopback channel.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Wire contracts are written as code
//! - **Testability first**: Contract tests fail when the wire shapes change
//! - **Scenarios over units**: The end-to-end module exercises whole
//!   conversations, not individual registries
//!
//! ## Structure
//!
//! - [`wire_contracts`]: envelope structure, action identifiers, schema
//!   version, and payload field contracts
//! - [`scenarios`]: two linked realms exchanging calls, responses,
//!   cleanups, batches, and disconnects

pub mod scenarios;
pub mod wire_contracts;

/// Common test helpers for contract validation
pub mod test_helpers {
    use object_simulator::ObjectSimulator;
    use realm_types::WireEnvelope;
    use remote_subject::LoopbackChannel;
    use std::rc::Rc;
    use value_graph::ExclusionPolicy;

    /// Creates two simulators linked by a loopback channel
    pub fn linked_realms() -> (LoopbackChannel, Rc<ObjectSimulator>, Rc<ObjectSimulator>) {
        let channel = LoopbackChannel::new();
        let realm_a = ObjectSimulator::create(
            Box::new(channel.transport_a()),
            ExclusionPolicy::standard(),
        );
        let realm_b = ObjectSimulator::create(
            Box::new(channel.transport_b()),
            ExclusionPolicy::standard(),
        );
        (channel, realm_a, realm_b)
    }

    /// Delivers everything queued in both directions
    pub fn pump(
        channel: &LoopbackChannel,
        realm_a: &Rc<ObjectSimulator>,
        realm_b: &Rc<ObjectSimulator>,
    ) -> usize {
        channel
            .pump(realm_a.subject(), realm_b.subject())
            .expect("pump failed")
    }

    /// Decodes an envelope's payload as loose JSON for shape assertions
    pub fn payload_json(envelope: &WireEnvelope) -> serde_json::Value {
        serde_json::from_slice(envelope.payload.as_bytes()).expect("payload is not valid JSON")
    }
}
