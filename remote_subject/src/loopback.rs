//! In-memory loopback transport pair
//!
//! Two linked endpoints over shared queues, pumped explicitly. Tests drive
//! `pump` to move envelopes between a pair of subjects deterministically,
//! standing in for the host's real message channel.

use crate::subject::{RemoteSubject, SubjectError, Transport};
use realm_types::WireEnvelope;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Queue = Rc<RefCell<VecDeque<WireEnvelope>>>;

/// One endpoint of a loopback channel
pub struct LoopbackTransport {
    outbox: Queue,
}

impl Transport for LoopbackTransport {
    fn send(&mut self, envelope: WireEnvelope) -> Result<(), SubjectError> {
        self.outbox.borrow_mut().push_back(envelope);
        Ok(())
    }
}

/// A bidirectional in-memory channel between two realms
#[derive(Default)]
pub struct LoopbackChannel {
    a_to_b: Queue,
    b_to_a: Queue,
}

impl LoopbackChannel {
    /// Creates an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the transport for realm A (sends into B's inbox)
    pub fn transport_a(&self) -> LoopbackTransport {
        LoopbackTransport {
            outbox: Rc::clone(&self.a_to_b),
        }
    }

    /// Returns the transport for realm B (sends into A's inbox)
    pub fn transport_b(&self) -> LoopbackTransport {
        LoopbackTransport {
            outbox: Rc::clone(&self.b_to_a),
        }
    }

    /// Returns how many envelopes are queued in both directions
    pub fn queued(&self) -> usize {
        self.a_to_b.borrow().len() + self.b_to_a.borrow().len()
    }

    /// Delivers queued envelopes into both subjects until quiescent
    ///
    /// Handlers may enqueue further envelopes while running; pumping
    /// continues until both directions drain. Returns the number delivered.
    pub fn pump(
        &self,
        subject_a: &Rc<RefCell<RemoteSubject>>,
        subject_b: &Rc<RefCell<RemoteSubject>>,
    ) -> Result<usize, SubjectError> {
        let mut delivered = 0;
        loop {
            let next_to_b = self.a_to_b.borrow_mut().pop_front();
            if let Some(envelope) = next_to_b {
                RemoteSubject::deliver(subject_b, &envelope)?;
                delivered += 1;
                continue;
            }
            let next_to_a = self.b_to_a.borrow_mut().pop_front();
            if let Some(envelope) = next_to_a {
                RemoteSubject::deliver(subject_a, &envelope)?;
                delivered += 1;
                continue;
            }
            return Ok(delivered);
        }
    }
}
