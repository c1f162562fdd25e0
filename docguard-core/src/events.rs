use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscription<E> {
    id: SubscriptionId,
    key: String,
    handler: Box<dyn FnMut(&E)>,
}

/// Owned set of event handlers keyed by name.
///
/// Attaching under a key that is already present swaps the handler in place,
/// so re-binding never delivers an event twice.
pub struct EventRegistry<E> {
    next_id: u64,
    subscriptions: Vec<Subscription<E>>,
}

impl<E> Default for EventRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.subscriptions.iter().map(|s| s.key.as_str()).collect();
        f.debug_struct("EventRegistry").field("keys", &keys).finish()
    }
}

impl<E> EventRegistry<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscriptions: Vec::new(),
        }
    }

    pub fn attach<F>(&mut self, key: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&E) + 'static,
    {
        if let Some(existing) = self.subscriptions.iter_mut().find(|s| s.key == key) {
            existing.handler = Box::new(handler);
            return existing.id;
        }

        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            key: key.to_string(),
            handler: Box::new(handler),
        });
        id
    }

    pub fn detach(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn detach_key(&mut self, key: &str) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.key != key);
        self.subscriptions.len() != before
    }

    /// Deliver to every handler in attach order; returns the number reached
    pub fn emit(&mut self, event: &E) -> usize {
        for subscription in &mut self.subscriptions {
            (subscription.handler)(event);
        }
        self.subscriptions.len()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_reattach_same_key_replaces_handler() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry: EventRegistry<u32> = EventRegistry::new();

        let log = calls.clone();
        let first = registry.attach("preview", move |e| log.borrow_mut().push(("old", *e)));
        let log = calls.clone();
        let second = registry.attach("preview", move |e| log.borrow_mut().push(("new", *e)));

        assert_eq!(first, second);
        assert_eq!(registry.emit(&7), 1);
        assert_eq!(*calls.borrow(), vec![("new", 7)]);
    }

    #[test]
    fn test_detach_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut registry: EventRegistry<()> = EventRegistry::new();

        let c = count.clone();
        let id = registry.attach("a", move |_| *c.borrow_mut() += 1);
        let c = count.clone();
        registry.attach("b", move |_| *c.borrow_mut() += 10);

        registry.emit(&());
        assert!(registry.detach(id));
        assert!(!registry.detach(id));
        registry.emit(&());
        assert!(registry.detach_key("b"));
        registry.emit(&());

        assert_eq!(*count.borrow(), 21);
        assert!(registry.is_empty());
    }
}
