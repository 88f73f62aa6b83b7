//! The transition store: ordered items waiting to be exchanged.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Bounds every exchanged item must satisfy. Implemented for all such types.
pub trait Payload: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Payload for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Thread-safe FIFO of opaque payload items.
///
/// As the data source the session empties it; as the data sink it appends
/// received items to it.
///
/// # Example
///
/// ```rust
/// use heli_exchange::protocol::TransitionStore;
///
/// let store: TransitionStore<&str> = ["A", "B"].into_iter().collect();
/// assert_eq!(store.pop_front(), Some("A"));
/// store.push("C");
/// assert_eq!(store.with_front(|item| item.len()), Some(1));
/// assert_eq!(store.snapshot(), vec!["B", "C"]);
/// ```
#[derive(Debug)]
pub struct TransitionStore<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> TransitionStore<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, item: T) {
        self.items().push_back(item);
    }

    /// Put an item back at the head, e.g. after a failed send.
    pub fn push_front(&self, item: T) {
        self.items().push_front(item);
    }

    pub fn pop_front(&self) -> Option<T> {
        self.items().pop_front()
    }

    /// Remove and return everything currently queued.
    pub fn drain(&self) -> Vec<T> {
        self.items().drain(..).collect()
    }

    /// Look at the head without removing it.
    pub fn with_front<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.items().front().map(f)
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    /// Copy of the current contents, head first.
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items().iter().cloned().collect()
    }
}

impl<T> Default for TransitionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for TransitionStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn items_come_out_in_order() {
        let store = TransitionStore::new();
        store.push(1);
        store.push(2);
        store.push(3);

        assert_eq!(store.len(), 3);
        assert_eq!(store.pop_front(), Some(1));
        assert_eq!(store.snapshot(), vec![2, 3]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn push_front_requeues_at_head() {
        let store: TransitionStore<_> = vec!["B"].into_iter().collect();
        store.push_front("A");
        assert_eq!(store.snapshot(), vec!["A", "B"]);
    }

    #[test]
    fn with_front_leaves_the_head_in_place() {
        let store: TransitionStore<_> = (0..4).collect();
        assert_eq!(store.with_front(|head| head * 10), Some(0));
        assert_eq!(store.len(), 4);
        assert_eq!(store.pop_front(), Some(0));

        let empty: TransitionStore<u8> = TransitionStore::new();
        assert_eq!(empty.with_front(|_| ()), None);
    }

    #[test]
    fn drain_empties_the_store() {
        let store: TransitionStore<_> = (0..4).collect();
        assert_eq!(store.drain(), vec![0, 1, 2, 3]);
        assert!(store.is_empty());
        assert!(store.drain().is_empty());
    }

    #[test]
    fn store_is_shared_across_threads() {
        let store = Arc::new(TransitionStore::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.push(i))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut items = store.snapshot();
        items.sort();
        assert_eq!(items, vec![0, 1, 2, 3]);
    }
}
