//! Insertion-ordered key/value storage backing [`crate::Object`].
//!
//! Objects in the value model are small and their key order is observable
//! (diff output order, resolved code map order), so entries live in a vector
//! and lookups are linear.

use crate::value::{Key, Value};

/// Insertion-ordered map from [`Key`] to [`Value`].
#[derive(Clone, Debug, Default)]
pub struct Map {
    entries: Vec<(Key, Value)>,
}

impl Map {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: ?Sized,
        Key: PartialEq<Q>,
    {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// The value under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&Value>
    where
        Q: ?Sized,
        Key: PartialEq<Q>,
    {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Mutable access to the value under `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut Value>
    where
        Q: ?Sized,
        Key: PartialEq<Q>,
    {
        self.position(key).map(move |i| &mut self.entries[i].1)
    }

    /// Whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized,
        Key: PartialEq<Q>,
    {
        self.position(key).is_some()
    }

    /// Insert or overwrite. An overwritten key keeps its position.
    pub fn insert(&mut self, key: Key, value: Value) -> Option<Value> {
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Value>
    where
        Q: ?Sized,
        Key: PartialEq<Q>,
    {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Own keys in enumeration order: names in insertion order, then symbols
    /// in insertion order.
    pub fn own_keys(&self) -> Vec<Key> {
        let names = self.keys().filter(|k| !k.is_symbol());
        let symbols = self.keys().filter(|k| k.is_symbol());
        names.chain(symbols).cloned().collect()
    }
}

impl FromIterator<(Key, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for Map {
    type Item = (Key, Value);
    type IntoIter = std::vec::IntoIter<(Key, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
