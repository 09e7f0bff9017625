//! Client registry.
//!
//! Managed windows are kept in a singly linked list threaded through a
//! slotmap arena. The head is the most recently mapped client. Lookups
//! return the predecessor alongside the client so removal can unlink
//! without a second scan.

use slotmap::{new_key_type, SlotMap};
use x11rb::protocol::xproto::Window;

new_key_type! {
    /// Stable handle to a managed client
    pub struct ClientId;
}

/// One managed application window and the frame it was reparented into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// The application's own window
    pub window: Window,
    /// The decorative parent window we created for it
    pub frame: Window,
    /// Reserved for a future fullscreen layout mode
    #[allow(dead_code)]
    pub fullscreen: bool,
}

impl Client {
    pub fn new(window: Window, frame: Window) -> Self {
        Self {
            window,
            frame,
            fullscreen: false,
        }
    }
}

#[derive(Debug)]
struct Entry {
    client: Client,
    next: Option<ClientId>,
}

/// Result of a registry lookup: the client and whatever links to it.
///
/// Only valid until the registry is next mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub id: ClientId,
    /// `None` when the client is the head
    pub prev: Option<ClientId>,
}

/// A client that has been unlinked from the registry
#[derive(Debug)]
pub struct Removed {
    pub id: ClientId,
    pub client: Client,
    /// Former predecessor, `None` if the client was the head
    pub prev: Option<ClientId>,
}

/// Ordered collection of managed clients
#[derive(Debug, Default)]
pub struct ClientRegistry {
    entries: SlotMap<ClientId, Entry>,
    head: Option<ClientId>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of managed clients
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recently mapped client
    pub fn head(&self) -> Option<ClientId> {
        self.head
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.entries.get(id).map(|e| &e.client)
    }

    /// Successor of `id` in list order
    pub fn next_of(&self, id: ClientId) -> Option<ClientId> {
        self.entries.get(id).and_then(|e| e.next)
    }

    /// Predecessor of `id` in list order
    pub fn prev_of(&self, id: ClientId) -> Option<ClientId> {
        self.ids().take_while(|&other| other != id).last()
    }

    /// Last client in list order
    pub fn tail(&self) -> Option<ClientId> {
        self.ids().last()
    }

    /// Insert a client at the head of the list.
    ///
    /// Callers must check for duplicates first; the registry does not frame
    /// windows and cannot undo a frame that was created for a duplicate.
    pub fn push_front(&mut self, client: Client) -> ClientId {
        let id = self.entries.insert(Entry {
            client,
            next: self.head,
        });
        self.head = Some(id);
        id
    }

    pub fn find_by_window(&self, window: Window) -> Option<Lookup> {
        self.find(|c| c.window == window)
    }

    pub fn find_by_frame(&self, frame: Window) -> Option<Lookup> {
        self.find(|c| c.frame == frame)
    }

    fn find(&self, matches: impl Fn(&Client) -> bool) -> Option<Lookup> {
        let mut prev = None;
        for (id, client) in self.iter() {
            if matches(client) {
                return Some(Lookup { id, prev });
            }
            prev = Some(id);
        }
        None
    }

    /// Unlink the client located by `lookup`.
    ///
    /// Returns `None` if the lookup is stale, i.e. its predecessor no longer
    /// links to the client.
    pub fn remove(&mut self, lookup: Lookup) -> Option<Removed> {
        let linked = match lookup.prev {
            None => self.head == Some(lookup.id),
            Some(prev) => self.next_of(prev) == Some(lookup.id),
        };
        if !linked {
            return None;
        }

        let entry = self.entries.remove(lookup.id)?;
        match lookup.prev {
            None => self.head = entry.next,
            Some(prev) => {
                if let Some(p) = self.entries.get_mut(prev) {
                    p.next = entry.next;
                }
            }
        }

        Some(Removed {
            id: lookup.id,
            client: entry.client,
            prev: lookup.prev,
        })
    }

    /// Client handles from head to tail
    pub fn ids(&self) -> impl Iterator<Item = ClientId> + '_ {
        std::iter::successors(self.head, move |&id| self.next_of(id))
    }

    /// Clients from head to tail
    pub fn iter(&self) -> impl Iterator<Item = (ClientId, &Client)> + '_ {
        self.ids().filter_map(move |id| self.get(id).map(|c| (id, c)))
    }

    /// Application windows from head to tail
    pub fn windows(&self) -> Vec<Window> {
        self.iter().map(|(_, c)| c.window).collect()
    }

    /// Number of entries reachable from the head.
    ///
    /// Equal to `len()` unless the links are corrupt.
    pub fn linked_len(&self) -> usize {
        self.ids().take(self.entries.len() + 1).count()
    }
}
