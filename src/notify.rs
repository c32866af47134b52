//! Weak observer lists.
//!
//! Scene, interaction/selection state and views notify their observers
//! synchronously. Observers are held weakly so a notifier never keeps a display
//! manager alive, and dead entries are pruned on the next dispatch.
//!
//! `snapshot` copies the live observers out before anything is called, so an
//! observer may subscribe, unsubscribe or trigger another notification from
//! inside its callback without hitting a `RefCell` borrow conflict.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A list of weakly held observers of type `T` (usually a trait object).
pub struct ObserverList<T: ?Sized> {
    entries: RefCell<Vec<(SubscriptionId, Weak<T>)>>,
    next_id: Cell<u64>,
}

impl<T: ?Sized> ObserverList<T> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Register an observer. The list only keeps a weak reference.
    pub fn subscribe(&self, observer: &Rc<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push((id, Rc::downgrade(observer)));
        id
    }

    /// Remove an observer. Returns false if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Live observers in subscription order.
    pub fn snapshot(&self) -> Vec<Rc<T>> {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|(_, weak)| weak.strong_count() > 0);
        entries.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
    }

    /// Number of live observers.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized> Default for ObserverList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for ObserverList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("observers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Ping {
        fn ping(&self) -> u32;
    }

    struct Counter(Cell<u32>);

    impl Ping for Counter {
        fn ping(&self) -> u32 {
            self.0.set(self.0.get() + 1);
            self.0.get()
        }
    }

    #[test]
    fn test_subscribe_and_dispatch() {
        let list: ObserverList<dyn Ping> = ObserverList::new();
        let counter = Rc::new(Counter(Cell::new(0)));
        let observer: Rc<dyn Ping> = counter.clone();
        list.subscribe(&observer);

        for o in list.snapshot() {
            o.ping();
        }
        assert_eq!(counter.0.get(), 1);
    }

    #[test]
    fn test_dead_observers_pruned() {
        let list: ObserverList<dyn Ping> = ObserverList::new();
        {
            let observer: Rc<dyn Ping> = Rc::new(Counter(Cell::new(0)));
            list.subscribe(&observer);
            assert_eq!(list.len(), 1);
        }
        assert!(list.is_empty());
        assert!(list.snapshot().is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let list: ObserverList<dyn Ping> = ObserverList::new();
        let observer: Rc<dyn Ping> = Rc::new(Counter(Cell::new(0)));
        let id = list.subscribe(&observer);
        assert!(list.unsubscribe(id));
        assert!(!list.unsubscribe(id));
        assert!(list.is_empty());
    }
}
