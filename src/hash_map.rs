use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::mem;

use crate::hash_table::Entry;
use crate::hash_table::HashTable;

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        /// Hasher builder used when a [`HashMap`] is created without an
        /// explicit one. Randomly seeded per instance.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else {
        /// Hasher builder used when a [`HashMap`] is created without an
        /// explicit one. Fixed seed; enable the `std` feature for per-map
        /// random seeding.
        pub type DefaultHashBuilder = foldhash::fast::FixedState;
    }
}

/// Slot representation backing [`HashMap`].
///
/// `hash_of` hashes with the crate's fixed default state. The map never
/// relies on it: every operation feeds hashes from the map's own builder
/// through the table's `_hashed` entry points, so a custom builder and
/// `hash_of` cannot disagree about a stored entry.
#[derive(Clone)]
struct MapEntry<K, V> {
    key: K,
    value: V,
    hash: u64,
}

impl<K, V> Entry for MapEntry<K, V>
where
    K: Hash + Eq,
{
    type Key = K;
    type Value = V;

    fn hash_of(key: &K) -> u64 {
        foldhash::fast::FixedState::default().hash_one(key)
    }

    fn new(key: K, value: V, hash: u64) -> Self {
        MapEntry { key, value, hash }
    }

    fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }

    fn key(&self) -> &K {
        &self.key
    }

    fn value(&self) -> &V {
        &self.value
    }

    fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    fn hash(&self) -> u64 {
        self.hash
    }
}

/// A key-value map backed by the linear-probing [`HashTable`].
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement
/// `Hash + Eq`, hashing them with a configurable hasher builder `S`. It
/// supplies the table's entry representation itself and layers standard map
/// semantics on top: in particular, [`insert`](HashMap::insert) updates the
/// value of an existing key in place, so the underlying table never holds
/// two entries for one key.
///
/// # Examples
///
/// ```rust
/// use shift_hash::HashMap;
///
/// let mut map = HashMap::new();
/// map.insert("a", 1);
/// map.insert("b", 2);
///
/// assert_eq!(map.get(&"a"), Some(&1));
/// assert_eq!(map.remove(&"b"), Some(2));
/// assert!(map.is_empty());
/// ```
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<MapEntry<K, V>>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug + Hash + Eq,
    V: Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> HashMap<K, V, DefaultHashBuilder>
where
    K: Hash + Eq,
{
    /// Creates an empty map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shift_hash::HashMap;
    ///
    /// let map: HashMap<i32, i32> = HashMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty map with the given hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: HashTable::new(),
            hash_builder,
        }
    }

    /// Returns the number of key-value pairs in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no pairs.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the slot count of the underlying table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Removes all pairs, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Inserts a key-value pair.
    ///
    /// If the key was already present its value is replaced in place and the
    /// old value returned; otherwise `None` is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_builder.hash_one(&key);
        if let Some(entry) = self.table.find_hashed_mut(hash, &key) {
            return Some(mem::replace(entry.value_mut(), value));
        }
        self.table.insert_hashed(key, value, hash);
        None
    }

    /// Returns a reference to the value for `key`, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find_hashed(hash, key).map(|entry| entry.value())
    }

    /// Returns a mutable reference to the value for `key`, if present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, 10);
    /// if let Some(value) = map.get_mut(&1) {
    ///     *value += 1;
    /// }
    /// assert_eq!(map.get(&1), Some(&11));
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_hashed_mut(hash, key)
            .map(|entry| entry.value_mut())
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key` from the map, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` from the map, returning the stored key and value if it
    /// was present.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table.erase_hashed(hash, key).map(Entry::into_pair)
    }

    /// Iterates over the map's key-value pairs in storage order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shift_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    ///
    /// let mut keys: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
    /// keys.sort_unstable();
    /// assert_eq!(keys, [1, 2]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.table.slots().iter(),
        }
    }

    /// Iterates over the map's keys in storage order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterates over the map's values in storage order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// Iterator over a map's key-value pairs.
///
/// Walks the raw slot range of the underlying table and skips the empty
/// slots.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Option<MapEntry<K, V>>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.slots.next()? {
                return Some((&entry.key, &entry.value));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.slots.len()))
    }
}

/// Iterator over a map's keys.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }
}

/// Iterator over a map's values.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, value)| value)
    }
}
