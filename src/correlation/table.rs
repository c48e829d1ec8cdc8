//! Request-id → waiting client map.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::net::ClientConnection;
use crate::observability::metrics;
use crate::protocol::RequestId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// No client is waiting under this id: it was never registered, or its
    /// response has already been dequeued.
    #[error("no pending request with id {0}")]
    NotFound(RequestId),
}

#[derive(Debug)]
enum Slot<C> {
    /// Registered, response not yet arrived.
    Waiting(C),
    /// Handed to a responder; the id stays reserved until `request_completed`.
    Delivering,
}

/// Shared map from request id to the client connection waiting on it.
///
/// One mutex guards the whole map. It is never held across an `.await`.
#[derive(Debug)]
pub struct CorrelationTable<C = ClientConnection> {
    pending: Mutex<HashMap<RequestId, Slot<C>>>,
}

impl<C> CorrelationTable<C> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Register `client` under a fresh id that is not currently in use.
    pub fn new_request(&self, client: C) -> RequestId {
        let mut pending = self.pending.lock().expect("correlation table mutex poisoned");
        loop {
            let id = RequestId::generate();
            if let Entry::Vacant(slot) = pending.entry(id.clone()) {
                slot.insert(Slot::Waiting(client));
                metrics::set_pending_requests(pending.len());
                return id;
            }
        }
    }

    /// Take the client waiting on `id`. Succeeds at most once per registration.
    pub fn get_client_from_request(&self, id: &RequestId) -> Result<C, TableError> {
        let mut pending = self.pending.lock().expect("correlation table mutex poisoned");
        let Some(slot) = pending.get_mut(id) else {
            return Err(TableError::NotFound(id.clone()));
        };
        match std::mem::replace(slot, Slot::Delivering) {
            Slot::Waiting(client) => Ok(client),
            Slot::Delivering => Err(TableError::NotFound(id.clone())),
        }
    }

    /// Retire `id`, making it available for reuse.
    ///
    /// Retiring an absent id is tolerated and returns `false`.
    pub fn request_completed(&self, id: &RequestId) -> bool {
        let mut pending = self.pending.lock().expect("correlation table mutex poisoned");
        let removed = pending.remove(id).is_some();
        metrics::set_pending_requests(pending.len());
        if !removed {
            tracing::debug!(request_id = %id, "Retired request was not pending");
        }
        removed
    }

    /// Withdraw a registration that will never be answered, returning the
    /// waiting client if no responder has taken it yet.
    pub fn cancel(&self, id: &RequestId) -> Option<C> {
        let mut pending = self.pending.lock().expect("correlation table mutex poisoned");
        let slot = pending.remove(id);
        metrics::set_pending_requests(pending.len());
        match slot {
            Some(Slot::Waiting(client)) => Some(client),
            Some(Slot::Delivering) | None => None,
        }
    }

    /// Number of registered ids, including those being delivered.
    pub fn len(&self) -> usize {
        self.pending.lock().expect("correlation table mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.pending
            .lock()
            .expect("correlation table mutex poisoned")
            .contains_key(id)
    }
}

impl<C> Default for CorrelationTable<C> {
    fn default() -> Self {
        Self::new()
    }
}
