//! Event subscription lists.
//!
//! An [`Event`] stores the ids of the handlers subscribed to it, in
//! subscription order. The handlers themselves live in the host's handler
//! table; raising an event hands the host a snapshot of the ids to call.
//!
//! Semantics follow multicast delegates:
//! - subscribing the same handler twice registers it twice
//! - unsubscribing removes the most recent registration, or does nothing
//! - a raise calls the snapshot taken when it started, so handlers may
//!   unsubscribe themselves while being called

/// Identity of a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Subscription list of one event.
#[derive(Debug, Clone, Default)]
pub struct Event {
    handlers: Vec<HandlerId>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`. Duplicates are allowed.
    pub fn subscribe(&mut self, handler: HandlerId) {
        self.handlers.push(handler);
    }

    /// Remove the last registration of `handler`.
    ///
    /// Returns false (and changes nothing) if it was not subscribed.
    pub fn unsubscribe(&mut self, handler: HandlerId) -> bool {
        match self.handlers.iter().rposition(|h| *h == handler) {
            Some(pos) => {
                self.handlers.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Number of registrations of `handler`.
    pub fn count(&self, handler: HandlerId) -> usize {
        self.handlers.iter().filter(|h| **h == handler).count()
    }

    pub fn contains(&self, handler: HandlerId) -> bool {
        self.handlers.contains(&handler)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handlers to call for a raise, in subscription order.
    pub fn snapshot(&self) -> Vec<HandlerId> {
        self.handlers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_allows_duplicates() {
        let mut event = Event::new();
        let h = HandlerId::new(7);

        event.subscribe(h);
        event.subscribe(h);
        assert_eq!(event.count(h), 2);
        assert_eq!(event.len(), 2);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let mut event = Event::new();
        let a = HandlerId::new(1);
        let b = HandlerId::new(2);

        event.subscribe(a);
        event.subscribe(b);

        assert!(event.unsubscribe(a));
        assert!(!event.unsubscribe(a));
        assert!(!event.contains(a));
        assert_eq!(event.snapshot(), vec![b]);
    }

    #[test]
    fn test_unsubscribe_removes_last_registration() {
        let mut event = Event::new();
        let a = HandlerId::new(1);
        let b = HandlerId::new(2);

        event.subscribe(a);
        event.subscribe(b);
        event.subscribe(a);
        event.unsubscribe(a);

        assert_eq!(event.snapshot(), vec![a, b]);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_changes() {
        let mut event = Event::new();
        let a = HandlerId::new(1);
        event.subscribe(a);

        let snapshot = event.snapshot();
        event.unsubscribe(a);

        assert_eq!(snapshot, vec![a]);
        assert!(event.is_empty());
    }
}
