//! Reclamation notifier
//!
//! Tracks the tickets this realm holds stubs for and forwards an
//! out-of-scope notification to the subject when a holder releases one.
//! Each ticket notifies at most once; the registration is consumed.

use realm_types::{DefTicket, FnId};
use remote_subject::RemoteSubject;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;

/// Forwards ticket releases to the subject as cleanup notifications
pub struct ReclaimNotifier {
    subject: Weak<RefCell<RemoteSubject>>,
    registered: RefCell<HashMap<FnId, DefTicket>>,
}

impl ReclaimNotifier {
    /// Creates a notifier bound to a subject
    pub fn new(subject: Weak<RefCell<RemoteSubject>>) -> Self {
        Self {
            subject,
            registered: RefCell::new(HashMap::new()),
        }
    }

    /// Registers a materialized ticket for later release
    pub fn register(&self, ticket: DefTicket) {
        self.registered
            .borrow_mut()
            .insert(ticket.fn_id.clone(), ticket);
    }

    /// Returns whether a ticket is currently registered
    pub fn is_registered(&self, fn_id: &FnId) -> bool {
        self.registered.borrow().contains_key(fn_id)
    }

    /// Consumes a registration and transmits the cleanup notification
    ///
    /// Unknown or already-released ids are ignored, as is a subject that has
    /// gone away or disconnected: release after teardown has no one left to
    /// tell.
    pub fn notify(&self, fn_id: &FnId) {
        let ticket = self.registered.borrow_mut().remove(fn_id);
        if let (Some(ticket), Some(subject)) = (ticket, self.subject.upgrade()) {
            let _ = subject.borrow_mut().notify_cleanup(&ticket);
        }
    }
}
