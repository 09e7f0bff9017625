//! Focus tracking.
//!
//! Focus is a lookup-only handle into the registry. It is `None` exactly
//! when the registry is empty.

use crate::registry::{ClientId, ClientRegistry, Removed};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    target: Option<ClientId>,
}

impl Focus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The client that should receive input
    pub fn get(&self) -> Option<ClientId> {
        self.target
    }

    pub fn set(&mut self, id: ClientId) {
        self.target = Some(id);
    }

    /// Advance to the successor, wrapping from the tail to the head.
    pub fn focus_next(&mut self, registry: &ClientRegistry) -> Option<ClientId> {
        let next = match self.current(registry) {
            Some(id) => registry.next_of(id).or_else(|| registry.head()),
            None => registry.head(),
        };
        self.target = next;
        next
    }

    /// Step back to the predecessor, wrapping from the head to the tail.
    pub fn focus_prev(&mut self, registry: &ClientRegistry) -> Option<ClientId> {
        let prev = match self.current(registry) {
            Some(id) => registry.prev_of(id).or_else(|| registry.tail()),
            None => registry.head(),
        };
        self.target = prev;
        prev
    }

    /// Reassign focus after `removed` has been unlinked from `registry`.
    ///
    /// Focus only moves if it pointed at the removed client: to its former
    /// predecessor, or to the new head if it was the head. An empty registry
    /// leaves focus `None`.
    pub fn client_removed(&mut self, removed: &Removed, registry: &ClientRegistry) {
        if self.target != Some(removed.id) {
            return;
        }
        self.target = match removed.prev {
            Some(prev) => Some(prev),
            None => registry.head(),
        };
    }

    fn current(&self, registry: &ClientRegistry) -> Option<ClientId> {
        self.target.filter(|&id| registry.get(id).is_some())
    }
}
