//! Values - request-scoped key/value store.
//!
//! Unlike a TypeMap, entries are keyed by name so independent middleware can
//! agree on a slot ("user", "request_start") without sharing a type. The
//! stored value is type-erased: reading it back is an unchecked downcast, a
//! mismatched type looks exactly like a missing key.

use std::any::Any;
use std::collections::HashMap;

type BoxedValue = Box<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct Values {
    entries: HashMap<String, BoxedValue>,
}

impl Values {
    pub fn new() -> Self {
        Values {
            entries: HashMap::new(),
        }
    }

    /// Stores a value under `key`. Last write wins, whatever the previous type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Box::new(value));
    }

    /// Returns `None` if the key is absent or holds another type.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|boxed| boxed.downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.entries
            .get_mut(key)
            .and_then(|boxed| boxed.downcast_mut())
    }

    /// The erased value, for callers that want to probe the type themselves.
    pub fn get_raw(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.entries.get(key).map(|boxed| &**boxed)
    }

    /// Removes and returns the value if it has type `T`; otherwise the entry is left alone.
    pub fn remove<T: 'static>(&mut self, key: &str) -> Option<T> {
        if !self.get_raw(key).is_some_and(|v| v.is::<T>()) {
            return None;
        }
        self.entries
            .remove(key)
            .and_then(|boxed| boxed.downcast().ok())
            .map(|boxed| *boxed)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry but keeps the allocation for reuse.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for Values {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("Values").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut values = Values::new();
        values.insert("count", 42i32);
        values.insert("user", "alice".to_string());

        assert_eq!(values.get::<i32>("count"), Some(&42));
        assert_eq!(values.get::<String>("user"), Some(&"alice".to_string()));
        assert_eq!(values.get::<i32>("missing"), None);
        // wrong type reads as absent
        assert_eq!(values.get::<u64>("count"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let mut values = Values::new();
        values.insert("k", 1u8);
        values.insert("k", "two");

        assert_eq!(values.get::<u8>("k"), None);
        assert_eq!(values.get::<&str>("k"), Some(&"two"));
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_get_mut_and_remove() {
        let mut values = Values::new();
        values.insert("list", vec![1, 2, 3]);

        if let Some(v) = values.get_mut::<Vec<i32>>("list") {
            v.push(4);
        }
        assert_eq!(values.remove::<String>("list"), None);
        assert!(values.contains("list"));
        assert_eq!(values.remove::<Vec<i32>>("list"), Some(vec![1, 2, 3, 4]));
        assert!(values.is_empty());
    }
}
