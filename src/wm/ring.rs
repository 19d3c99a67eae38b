//! Focus ring - creation-ordered ring of live window ids

use std::collections::HashMap;

use super::window::WindowId;

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: WindowId,
    next: WindowId,
}

/// Intrusive ring of live window ids, doubly linked via ids.
///
/// Ids sit in creation order, oldest first. The successor of the newest live
/// id wraps to the oldest still-live id, so cycling stays structural no
/// matter which windows have been closed in between. Every live id appears
/// exactly once; a single id links to itself.
#[derive(Debug, Default)]
pub struct FocusRing {
    links: HashMap<WindowId, Link>,
    /// Oldest live id
    head: Option<WindowId>,
}

impl FocusRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.links.contains_key(&id)
    }

    /// Oldest still-live id.
    pub fn oldest(&self) -> Option<WindowId> {
        self.head
    }

    /// Ring successor: the next-created live id, wrapping from the newest
    /// back to the oldest.
    pub fn next(&self, id: WindowId) -> Option<WindowId> {
        self.links.get(&id).map(|link| link.next)
    }

    /// Append `id` at the newest end of the ring.
    pub fn insert(&mut self, id: WindowId) {
        if self.links.contains_key(&id) {
            return;
        }
        match self.head {
            None => {
                self.links.insert(id, Link { prev: id, next: id });
                self.head = Some(id);
            }
            Some(head) => {
                let tail = match self.links.get(&head) {
                    Some(link) => link.prev,
                    None => head,
                };
                if let Some(link) = self.links.get_mut(&tail) {
                    link.next = id;
                }
                if let Some(link) = self.links.get_mut(&head) {
                    link.prev = id;
                }
                self.links.insert(id, Link { prev: tail, next: head });
            }
        }
    }

    /// Splice `id` out of the ring.
    pub fn remove(&mut self, id: WindowId) {
        let Some(link) = self.links.remove(&id) else {
            return;
        };
        if link.next == id {
            self.head = None;
            return;
        }
        if let Some(prev) = self.links.get_mut(&link.prev) {
            prev.next = link.next;
        }
        if let Some(next) = self.links.get_mut(&link.next) {
            next.prev = link.prev;
        }
        if self.head == Some(id) {
            self.head = Some(link.next);
        }
    }
}
