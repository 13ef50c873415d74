use alloc::boxed::Box;
use core::fmt::Debug;
use core::iter;
use core::mem;
use core::ops::Index;
use core::ops::IndexMut;

/// Capacity installed by the first growth of an empty table.
const INITIAL_CAPACITY: usize = 8;

/// Default fraction of slots that may be occupied before an insert grows the
/// table.
const DEFAULT_MAX_LOAD_FACTOR: f32 = 0.3;

/// Storage contract for a single occupied slot of a [`HashTable`].
///
/// An entry owns a key, a value, and the key's hash as computed at insertion
/// time. The table never recomputes hashes for stored entries: growth and
/// deletion relocate entries using the hash captured by [`new`](Entry::new),
/// so [`hash`](Entry::hash) must return exactly the value the entry was
/// constructed with.
///
/// [`hash_of`](Entry::hash_of) is a function of the key alone, with no hasher
/// state behind it. Two calls with equal keys must produce equal results for
/// the lifetime of any table storing entries of this type.
pub trait Entry: Sized {
    /// The key type stored in an entry.
    type Key: Eq;
    /// The value type stored in an entry.
    type Value;

    /// Hashes a key without reference to any entry instance.
    fn hash_of(key: &Self::Key) -> u64;

    /// Builds an entry from a key, a value, and the key's hash.
    fn new(key: Self::Key, value: Self::Value, hash: u64) -> Self;

    /// Consumes the entry, returning the owned key and value.
    fn into_pair(self) -> (Self::Key, Self::Value);

    /// The stored key.
    fn key(&self) -> &Self::Key;

    /// The stored value.
    fn value(&self) -> &Self::Value;

    /// Mutable access to the stored value.
    fn value_mut(&mut self) -> &mut Self::Value;

    /// The hash captured when the entry was constructed.
    fn hash(&self) -> u64;
}

/// Tests whether `home` lies in the cluster interval `[lb, ub)`.
///
/// `lb` is a slot index. `ub` is unwrapped and may exceed `capacity` when the
/// occupied run wraps past the end of the slot array, so `home` is lifted by
/// `capacity` before comparing whenever it sits numerically below `lb`.
fn home_in_interval(home: usize, lb: usize, ub: usize, capacity: usize) -> bool {
    let mut home = home;
    if home < lb {
        home += capacity;
    }
    home >= lb && home < ub
}

/// An open-addressing hash table using linear probing with backward-shift
/// deletion.
///
/// `HashTable<E>` owns a contiguous array of slots, each either empty or
/// holding one entry of type [`E: Entry`](Entry). Every occupied entry is
/// reachable by scanning forward (wrapping at the end of the array) from its
/// hash's home slot without crossing an empty slot. Insert, growth, and erase
/// all preserve that property, which is what lets a lookup stop at the first
/// empty slot it meets instead of consulting tombstones.
///
/// Erasing shifts later members of the erased entry's cluster backward into
/// the hole whenever their probe sequence would otherwise be broken, so
/// deleted slots become genuinely empty again and the load factor always
/// reflects live entries only.
///
/// ## Semantics to be aware of
///
/// - Inserting a key that is already present does **not** update the existing
///   entry; a second entry is stored alongside it. Lookups keep returning the
///   earliest-inserted duplicate until it is erased. Erase before
///   re-inserting when you want update semantics, or use
///   [`HashMap`](crate::HashMap) which does exactly that.
/// - References returned by [`find`](HashTable::find) and friends do not
///   survive mutation: growth reallocates the slot array and erase relocates
///   entries. The borrow checker enforces this.
/// - Indexing with `table[&key]` panics when the key is absent.
///
/// ## Example
///
/// ```rust
/// # use shift_hash::Entry;
/// # use shift_hash::HashTable;
/// #
/// # struct Pair {
/// #     key: u64,
/// #     value: u32,
/// #     hash: u64,
/// # }
/// #
/// # impl Entry for Pair {
/// #     type Key = u64;
/// #     type Value = u32;
/// #
/// #     fn hash_of(key: &u64) -> u64 {
/// #         *key ^ key.wrapping_mul(4347).wrapping_add(17)
/// #     }
/// #
/// #     fn new(key: u64, value: u32, hash: u64) -> Self {
/// #         Pair { key, value, hash }
/// #     }
/// #
/// #     fn into_pair(self) -> (u64, u32) {
/// #         (self.key, self.value)
/// #     }
/// #
/// #     fn key(&self) -> &u64 {
/// #         &self.key
/// #     }
/// #
/// #     fn value(&self) -> &u32 {
/// #         &self.value
/// #     }
/// #
/// #     fn value_mut(&mut self) -> &mut u32 {
/// #         &mut self.value
/// #     }
/// #
/// #     fn hash(&self) -> u64 {
/// #         self.hash
/// #     }
/// # }
/// #
/// let mut table: HashTable<Pair> = HashTable::new();
/// table.insert(1, 100);
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.capacity(), 8);
///
/// table.erase(&1);
/// assert_eq!(table.len(), 0);
/// assert!(table.find(&1).is_none());
/// ```
#[derive(Clone)]
pub struct HashTable<E> {
    slots: Box<[Option<E>]>,
    len: usize,
    max_load_factor: f32,
}

impl<E: Debug> Debug for HashTable<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .field("slots", &self.slots)
            .finish()
    }
}

impl<E: Entry> Default for HashTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entry> HashTable<E> {
    /// Creates an empty table.
    ///
    /// Nothing is allocated until the first insert, which installs the
    /// initial capacity of 8.
    pub fn new() -> Self {
        Self {
            slots: Box::default(),
            len: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }

    /// Returns the number of live entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the current slot count.
    ///
    /// Capacity starts at 0, becomes 8 on the first insert, and doubles on
    /// every growth after that. It never shrinks.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the load factor at which inserts trigger growth.
    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Sets the load factor at which inserts trigger growth.
    ///
    /// Must be above 0 and at most 1; values of 1 or above leave no empty
    /// slots for probe sequences to terminate on.
    pub fn set_max_load_factor(&mut self, max_load_factor: f32) {
        debug_assert!(max_load_factor > 0.0 && max_load_factor <= 1.0);
        self.max_load_factor = max_load_factor;
    }

    /// Inserts a key-value pair, hashing the key with [`Entry::hash_of`].
    ///
    /// Equivalent to [`insert_hashed`](HashTable::insert_hashed) with the
    /// computed hash. No duplicate-key detection is performed: inserting a
    /// key that is already present stores a second entry, and lookups keep
    /// returning the earliest-inserted one until it is erased.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use shift_hash::Entry;
    /// # use shift_hash::HashTable;
    /// #
    /// # struct Pair {
    /// #     key: u64,
    /// #     value: u32,
    /// #     hash: u64,
    /// # }
    /// #
    /// # impl Entry for Pair {
    /// #     type Key = u64;
    /// #     type Value = u32;
    /// #
    /// #     fn hash_of(key: &u64) -> u64 {
    /// #         *key ^ key.wrapping_mul(4347).wrapping_add(17)
    /// #     }
    /// #
    /// #     fn new(key: u64, value: u32, hash: u64) -> Self {
    /// #         Pair { key, value, hash }
    /// #     }
    /// #
    /// #     fn into_pair(self) -> (u64, u32) {
    /// #         (self.key, self.value)
    /// #     }
    /// #
    /// #     fn key(&self) -> &u64 {
    /// #         &self.key
    /// #     }
    /// #
    /// #     fn value(&self) -> &u32 {
    /// #         &self.value
    /// #     }
    /// #
    /// #     fn value_mut(&mut self) -> &mut u32 {
    /// #         &mut self.value
    /// #     }
    /// #
    /// #     fn hash(&self) -> u64 {
    /// #         self.hash
    /// #     }
    /// # }
    /// #
    /// let mut table: HashTable<Pair> = HashTable::new();
    /// table.insert(7, 700);
    /// assert_eq!(table.find(&7).map(|entry| *entry.value()), Some(700));
    /// ```
    pub fn insert(&mut self, key: E::Key, value: E::Value) {
        let hash = E::hash_of(&key);
        self.insert_hashed(key, value, hash);
    }

    /// Inserts a key-value pair under a precomputed hash.
    ///
    /// `hash` must be the value [`Entry::hash_of`] would produce for `key`
    /// if the plain-key lookup methods are ever going to be used; callers
    /// that stick to the `_hashed` methods may hash however they like, as
    /// long as they do so consistently.
    ///
    /// Grows the table first when `len + 1` reaches
    /// `capacity * max_load_factor`, which is trivially the case on the very
    /// first insert. Growth is the one operation that allocates; an
    /// allocation failure propagates as the global allocator's failure.
    pub fn insert_hashed(&mut self, key: E::Key, value: E::Value, hash: u64) {
        if (self.len + 1) as f32 >= self.slots.len() as f32 * self.max_load_factor {
            self.grow();
        }
        Self::place(&mut self.slots, E::new(key, value, hash));
        self.len += 1;
    }

    /// Places an entry into the first empty slot of its probe sequence.
    ///
    /// `slots` must contain at least one empty slot; the load factor check
    /// in [`insert_hashed`](HashTable::insert_hashed) guarantees it.
    fn place(slots: &mut [Option<E>], entry: E) {
        let capacity = slots.len();
        let mut index = entry.hash() as usize % capacity;
        while slots[index].is_some() {
            index += 1;
            if index == capacity {
                index = 0;
            }
        }
        slots[index] = Some(entry);
    }

    /// Doubles the slot array (8 on the first growth) and re-places every
    /// live entry under the new capacity using its stored hash.
    ///
    /// The old array is dropped only after every entry has moved, so the two
    /// arrays coexist for the duration of the copy.
    fn grow(&mut self) {
        let new_capacity = match self.slots.len() {
            0 => INITIAL_CAPACITY,
            n => n * 2,
        };
        let old = mem::replace(
            &mut self.slots,
            iter::repeat_with(|| None).take(new_capacity).collect(),
        );
        for entry in old.into_vec().into_iter().flatten() {
            Self::place(&mut self.slots, entry);
        }
    }

    /// Looks up the entry for `key`, hashing it with [`Entry::hash_of`].
    ///
    /// Returns `None` if the key is absent. The returned borrow is released
    /// before any further mutation of the table can happen.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use shift_hash::Entry;
    /// # use shift_hash::HashTable;
    /// #
    /// # struct Pair {
    /// #     key: u64,
    /// #     value: u32,
    /// #     hash: u64,
    /// # }
    /// #
    /// # impl Entry for Pair {
    /// #     type Key = u64;
    /// #     type Value = u32;
    /// #
    /// #     fn hash_of(key: &u64) -> u64 {
    /// #         *key ^ key.wrapping_mul(4347).wrapping_add(17)
    /// #     }
    /// #
    /// #     fn new(key: u64, value: u32, hash: u64) -> Self {
    /// #         Pair { key, value, hash }
    /// #     }
    /// #
    /// #     fn into_pair(self) -> (u64, u32) {
    /// #         (self.key, self.value)
    /// #     }
    /// #
    /// #     fn key(&self) -> &u64 {
    /// #         &self.key
    /// #     }
    /// #
    /// #     fn value(&self) -> &u32 {
    /// #         &self.value
    /// #     }
    /// #
    /// #     fn value_mut(&mut self) -> &mut u32 {
    /// #         &mut self.value
    /// #     }
    /// #
    /// #     fn hash(&self) -> u64 {
    /// #         self.hash
    /// #     }
    /// # }
    /// #
    /// let mut table: HashTable<Pair> = HashTable::new();
    /// table.insert(3, 30);
    ///
    /// assert_eq!(table.find(&3).map(|entry| *entry.value()), Some(30));
    /// assert!(table.find(&4).is_none());
    /// ```
    pub fn find(&self, key: &E::Key) -> Option<&E> {
        self.find_hashed(E::hash_of(key), key)
    }

    /// Looks up the entry for `key` under a precomputed hash.
    pub fn find_hashed(&self, hash: u64, key: &E::Key) -> Option<&E> {
        let index = self.probe(hash, key)?;
        self.slots[index].as_ref()
    }

    /// Looks up the entry for `key` mutably, hashing with [`Entry::hash_of`].
    ///
    /// Only the value may be changed through the returned entry. Replacing
    /// the key or the stored hash puts the entry in a slot its probe
    /// sequence can no longer reach.
    pub fn find_mut(&mut self, key: &E::Key) -> Option<&mut E> {
        self.find_hashed_mut(E::hash_of(key), key)
    }

    /// Mutable variant of [`find_hashed`](HashTable::find_hashed).
    ///
    /// The caveat on [`find_mut`](HashTable::find_mut) applies.
    pub fn find_hashed_mut(&mut self, hash: u64, key: &E::Key) -> Option<&mut E> {
        let index = self.probe(hash, key)?;
        self.slots[index].as_mut()
    }

    /// Forward probe scan.
    ///
    /// Returns the index of the slot holding `key`, or `None` upon reaching
    /// the first empty slot in the probe sequence, which is conclusive
    /// because no live entry sits past an empty slot on its probe path. A
    /// slot matches only when both the stored hash and the key compare
    /// equal; hash equality alone is not sufficient.
    fn probe(&self, hash: u64, key: &E::Key) -> Option<usize> {
        if self.slots.is_empty() {
            return None;
        }
        let capacity = self.slots.len();
        let mut index = hash as usize % capacity;
        loop {
            let entry = self.slots[index].as_ref()?;
            if entry.hash() == hash && entry.key() == key {
                return Some(index);
            }
            index += 1;
            if index == capacity {
                index = 0;
            }
        }
    }

    /// Erases the entry for `key`, hashing it with [`Entry::hash_of`].
    ///
    /// Returns the removed entry, or `None` (with the table untouched) if
    /// the key is absent. Cost is proportional to the length of the occupied
    /// run containing the entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use shift_hash::Entry;
    /// # use shift_hash::HashTable;
    /// #
    /// # struct Pair {
    /// #     key: u64,
    /// #     value: u32,
    /// #     hash: u64,
    /// # }
    /// #
    /// # impl Entry for Pair {
    /// #     type Key = u64;
    /// #     type Value = u32;
    /// #
    /// #     fn hash_of(key: &u64) -> u64 {
    /// #         *key ^ key.wrapping_mul(4347).wrapping_add(17)
    /// #     }
    /// #
    /// #     fn new(key: u64, value: u32, hash: u64) -> Self {
    /// #         Pair { key, value, hash }
    /// #     }
    /// #
    /// #     fn into_pair(self) -> (u64, u32) {
    /// #         (self.key, self.value)
    /// #     }
    /// #
    /// #     fn key(&self) -> &u64 {
    /// #         &self.key
    /// #     }
    /// #
    /// #     fn value(&self) -> &u32 {
    /// #         &self.value
    /// #     }
    /// #
    /// #     fn value_mut(&mut self) -> &mut u32 {
    /// #         &mut self.value
    /// #     }
    /// #
    /// #     fn hash(&self) -> u64 {
    /// #         self.hash
    /// #     }
    /// # }
    /// #
    /// let mut table: HashTable<Pair> = HashTable::new();
    /// table.insert(9, 90);
    ///
    /// let removed = table.erase(&9);
    /// assert_eq!(removed.map(Entry::into_pair), Some((9, 90)));
    /// assert!(table.erase(&9).is_none());
    /// ```
    pub fn erase(&mut self, key: &E::Key) -> Option<E> {
        self.erase_hashed(E::hash_of(key), key)
    }

    /// Erases the entry for `key` under a precomputed hash.
    ///
    /// Removal leaves no tombstone. The hole is repaired by shifting later
    /// members of the surrounding cluster backward, preserving forward
    /// reachability of every remaining entry from its home slot.
    pub fn erase_hashed(&mut self, hash: u64, key: &E::Key) -> Option<E> {
        let index = self.probe(hash, key)?;
        let removed = self.slots[index].take();
        let capacity = self.slots.len();

        // Left boundary of the occupied run containing the vacated slot,
        // plus the count of occupied slots in the run before it.
        let mut lb = index;
        let mut before = 0;
        loop {
            let prev = if lb == 0 { capacity - 1 } else { lb - 1 };
            if self.slots[prev].is_none() {
                break;
            }
            lb = prev;
            before += 1;
        }

        // [lb, ub) is the unwrapped interval of home indices whose probe
        // sequences run through the hole. Entries further along the cluster
        // whose home falls inside it get pulled back into the hole; each
        // move opens a new hole at the entry's old slot, which widens the
        // interval by the slots walked since the previous move.
        let mut ub = lb + before + 1;
        let mut hole = index;
        let mut cursor = index;
        let mut walked = 0;
        loop {
            cursor += 1;
            if cursor == capacity {
                cursor = 0;
            }
            let Some(entry) = self.slots[cursor].as_ref() else {
                break;
            };
            walked += 1;
            let home = entry.hash() as usize % capacity;
            if home_in_interval(home, lb, ub, capacity) {
                self.slots[hole] = self.slots[cursor].take();
                hole = cursor;
                ub += walked;
                walked = 0;
            }
        }

        self.len -= 1;
        removed
    }

    /// Removes every entry, keeping the allocated capacity.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.len = 0;
    }

    /// The raw slot range.
    ///
    /// The slice covers every slot, empty or not, in storage order; callers
    /// iterating the table skip the empty ones themselves.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use shift_hash::Entry;
    /// # use shift_hash::HashTable;
    /// #
    /// # struct Pair {
    /// #     key: u64,
    /// #     value: u32,
    /// #     hash: u64,
    /// # }
    /// #
    /// # impl Entry for Pair {
    /// #     type Key = u64;
    /// #     type Value = u32;
    /// #
    /// #     fn hash_of(key: &u64) -> u64 {
    /// #         *key ^ key.wrapping_mul(4347).wrapping_add(17)
    /// #     }
    /// #
    /// #     fn new(key: u64, value: u32, hash: u64) -> Self {
    /// #         Pair { key, value, hash }
    /// #     }
    /// #
    /// #     fn into_pair(self) -> (u64, u32) {
    /// #         (self.key, self.value)
    /// #     }
    /// #
    /// #     fn key(&self) -> &u64 {
    /// #         &self.key
    /// #     }
    /// #
    /// #     fn value(&self) -> &u32 {
    /// #         &self.value
    /// #     }
    /// #
    /// #     fn value_mut(&mut self) -> &mut u32 {
    /// #         &mut self.value
    /// #     }
    /// #
    /// #     fn hash(&self) -> u64 {
    /// #         self.hash
    /// #     }
    /// # }
    /// #
    /// let mut table: HashTable<Pair> = HashTable::new();
    /// table.insert(1, 10);
    /// table.insert(2, 20);
    ///
    /// assert_eq!(table.slots().len(), table.capacity());
    /// assert_eq!(table.slots().iter().flatten().count(), table.len());
    /// ```
    pub fn slots(&self) -> &[Option<E>] {
        &self.slots
    }
}

impl<E: Entry> Index<&E::Key> for HashTable<E> {
    type Output = E::Value;

    /// Unchecked access to the value for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present. Use [`HashTable::find`] when
    /// presence is uncertain.
    fn index(&self, key: &E::Key) -> &E::Value {
        self.find(key).expect("no entry found for key").value()
    }
}

impl<E: Entry> IndexMut<&E::Key> for HashTable<E> {
    /// Unchecked mutable access to the value for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index_mut(&mut self, key: &E::Key) -> &mut E::Value {
        self.find_mut(key).expect("no entry found for key").value_mut()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;
    use core::hash::Hasher;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;
    use siphasher::sip::SipHasher;

    use super::*;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn hash_key(&self, key: u64) -> u64 {
            let mut h = SipHasher::new_with_keys(self.k0, self.k1);
            h.write_u64(key);
            h.finish()
        }
    }

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Item {
        key: u64,
        value: i32,
        hash: u64,
    }

    impl Entry for Item {
        type Key = u64;
        type Value = i32;

        fn hash_of(key: &u64) -> u64 {
            *key ^ key.wrapping_mul(4347).wrapping_add(17)
        }

        fn new(key: u64, value: i32, hash: u64) -> Self {
            Item { key, value, hash }
        }

        fn into_pair(self) -> (u64, i32) {
            (self.key, self.value)
        }

        fn key(&self) -> &u64 {
            &self.key
        }

        fn value(&self) -> &i32 {
            &self.value
        }

        fn value_mut(&mut self) -> &mut i32 {
            &mut self.value
        }

        fn hash(&self) -> u64 {
            self.hash
        }
    }

    fn stored_key(table: &HashTable<Item>, index: usize) -> Option<u64> {
        table.slots()[index].as_ref().map(|entry| entry.key)
    }

    #[test]
    fn insert_and_find() {
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..32u64 {
            table.insert(k, (k as i32) * 2);
            assert_eq!(
                table.find(&k).map(|entry| entry.value),
                Some((k as i32) * 2),
                "{:#?}",
                table
            );
        }
        assert_eq!(table.len(), 32);
        for k in 0..32u64 {
            assert_eq!(table.find(&k).map(|entry| entry.value), Some((k as i32) * 2));
        }
        assert!(table.find(&999).is_none());
    }

    #[test]
    fn insert_erase_single() {
        let mut table: HashTable<Item> = HashTable::new();
        assert_eq!(table.capacity(), 0);

        table.insert(1, 5);
        assert_eq!(table.len(), 1);
        assert_eq!(table.capacity(), 8);

        table.erase(&1);
        assert_eq!(table.len(), 0);
        assert!(table.find(&1).is_none());
        assert_eq!(table.slots().iter().flatten().count(), 0);
    }

    #[test]
    fn capacity_sequence() {
        let mut table: HashTable<Item> = HashTable::new();
        assert_eq!(table.capacity(), 0);

        let mut observed = Vec::new();
        for k in 0..20u64 {
            table.insert(k, 0);
            if observed.last() != Some(&table.capacity()) {
                observed.push(table.capacity());
            }
        }

        // Doubling points for the default 0.3 load factor: growth happens on
        // inserts 1, 3, 5, 10, and 20.
        assert_eq!(observed, [8, 16, 32, 64, 128]);
        assert!(table.capacity() >= 64);
        for k in 0..20u64 {
            assert!(table.find(&k).is_some());
        }
    }

    #[test]
    fn growth_preserves_contents() {
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..100u64 {
            table.insert(k, k as i32);
            for old in 0..=k {
                assert_eq!(
                    table.find(&old).map(|entry| entry.value),
                    Some(old as i32),
                    "key {old} lost after inserting {k}"
                );
            }
        }
        assert_eq!(table.len(), 100);
        assert_eq!(table.slots().iter().flatten().count(), 100);
    }

    #[test]
    fn erase_subsets_reachability() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..200u64 {
            table.insert_hashed(k, k as i32, state.hash_key(k));
        }

        for k in (0..200u64).step_by(3) {
            let removed = table.erase_hashed(state.hash_key(k), &k);
            assert_eq!(removed.map(|entry| entry.key), Some(k));
        }

        for k in 0..200u64 {
            let found = table.find_hashed(state.hash_key(k), &k);
            if k % 3 == 0 {
                assert!(found.is_none(), "erased key {k} still present");
            } else {
                assert_eq!(found.map(|entry| entry.value), Some(k as i32));
            }
        }

        for k in 0..200u64 {
            table.erase_hashed(state.hash_key(k), &k);
        }
        assert_eq!(table.len(), 0);
        assert_eq!(table.slots().iter().flatten().count(), 0);
    }

    #[test]
    fn erase_absent_is_noop() {
        let mut table: HashTable<Item> = HashTable::new();
        assert!(table.erase(&1).is_none());
        assert_eq!(table.len(), 0);
        assert_eq!(table.capacity(), 0);

        table.insert(1, 5);
        table.insert(2, 6);
        assert!(table.erase(&3).is_none());
        assert_eq!(table.len(), 2);
        assert_eq!(table.find(&1).map(|entry| entry.value), Some(5));
        assert_eq!(table.find(&2).map(|entry| entry.value), Some(6));
    }

    #[test]
    fn erase_middle_of_cluster_shifts_dependents() {
        let mut table: HashTable<Item> = HashTable::new();
        table.set_max_load_factor(0.9);

        // Three hashes sharing home slot 0 at capacity 8; the entries land
        // in slots 0, 1, and 2.
        table.insert_hashed(1, 10, 0);
        table.insert_hashed(2, 20, 8);
        table.insert_hashed(3, 30, 16);
        assert_eq!(table.capacity(), 8);
        assert_eq!(stored_key(&table, 0), Some(1));
        assert_eq!(stored_key(&table, 1), Some(2));
        assert_eq!(stored_key(&table, 2), Some(3));

        let removed = table.erase_hashed(8, &2);
        assert_eq!(removed.map(Entry::into_pair), Some((2, 20)));

        // The dependent entry moved backward into the hole.
        assert_eq!(stored_key(&table, 0), Some(1));
        assert_eq!(stored_key(&table, 1), Some(3));
        assert_eq!(stored_key(&table, 2), None);

        assert_eq!(table.find_hashed(0, &1).map(|entry| entry.value), Some(10));
        assert!(table.find_hashed(8, &2).is_none());
        assert_eq!(table.find_hashed(16, &3).map(|entry| entry.value), Some(30));
    }

    #[test]
    fn erase_in_wrapping_cluster() {
        let mut table: HashTable<Item> = HashTable::new();
        table.set_max_load_factor(0.9);

        // All four hashes share home slot 6 at capacity 8, so the cluster
        // occupies slots 6, 7, 0, and 1.
        for (k, hash) in [(1u64, 6u64), (2, 14), (3, 22), (4, 30)] {
            table.insert_hashed(k, k as i32, hash);
        }
        assert_eq!(table.capacity(), 8);
        assert_eq!(stored_key(&table, 6), Some(1));
        assert_eq!(stored_key(&table, 7), Some(2));
        assert_eq!(stored_key(&table, 0), Some(3));
        assert_eq!(stored_key(&table, 1), Some(4));

        table.erase_hashed(14, &2);

        assert_eq!(stored_key(&table, 6), Some(1));
        assert_eq!(stored_key(&table, 7), Some(3));
        assert_eq!(stored_key(&table, 0), Some(4));
        assert_eq!(stored_key(&table, 1), None);

        for (k, hash) in [(1u64, 6u64), (3, 22), (4, 30)] {
            assert_eq!(
                table.find_hashed(hash, &k).map(|entry| entry.value),
                Some(k as i32),
                "{:#?}",
                table
            );
        }
        assert!(table.find_hashed(14, &2).is_none());
    }

    #[test]
    fn erase_leaves_unrelated_neighbors_alone() {
        let mut table: HashTable<Item> = HashTable::new();
        table.set_max_load_factor(0.9);

        // Slot 7 holds a home-7 entry; slot 0 holds a home-0 entry. They are
        // adjacent in the circular order but belong to different probe
        // sequences.
        table.insert_hashed(1, 10, 7);
        table.insert_hashed(2, 20, 8);
        assert_eq!(stored_key(&table, 7), Some(1));
        assert_eq!(stored_key(&table, 0), Some(2));

        table.erase_hashed(7, &1);

        assert_eq!(stored_key(&table, 7), None);
        assert_eq!(stored_key(&table, 0), Some(2));
        assert_eq!(table.find_hashed(8, &2).map(|entry| entry.value), Some(20));
    }

    #[test]
    fn hash_collision_requires_key_match() {
        let mut table: HashTable<Item> = HashTable::new();
        table.set_max_load_factor(0.9);

        // Two distinct keys stored under the same hash.
        table.insert_hashed(1, 10, 42);
        table.insert_hashed(2, 20, 42);

        assert_eq!(table.find_hashed(42, &1).map(|entry| entry.value), Some(10));
        assert_eq!(table.find_hashed(42, &2).map(|entry| entry.value), Some(20));
        assert!(table.find_hashed(42, &3).is_none());
    }

    #[test]
    fn duplicate_keys_shadow() {
        let mut table: HashTable<Item> = HashTable::new();
        table.insert(5, 1);
        table.insert(5, 2);
        assert_eq!(table.len(), 2);

        // The earliest-inserted duplicate wins lookups.
        assert_eq!(table.find(&5).map(|entry| entry.value), Some(1));

        // Erasing peels duplicates in insertion order.
        assert_eq!(table.erase(&5).map(|entry| entry.value), Some(1));
        assert_eq!(table.len(), 1);
        assert_eq!(table.find(&5).map(|entry| entry.value), Some(2));

        assert_eq!(table.erase(&5).map(|entry| entry.value), Some(2));
        assert!(table.find(&5).is_none());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn churn_matches_model() {
        let state = HashState::default();
        let mut rng = SmallRng::from_os_rng();
        let mut table: HashTable<Item> = HashTable::new();
        let mut model: Vec<u64> = Vec::new();

        for _ in 0..1000 {
            let k = rng.random_range(0..64u64);
            let hash = state.hash_key(k);
            if let Some(pos) = model.iter().position(|&m| m == k) {
                model.swap_remove(pos);
                let removed = table.erase_hashed(hash, &k);
                assert_eq!(removed.map(|entry| entry.key), Some(k));
            } else {
                model.push(k);
                table.insert_hashed(k, (k as i32) * 3, hash);
            }
            assert_eq!(table.len(), model.len());
        }

        assert_eq!(table.slots().iter().flatten().count(), model.len());
        for &k in &model {
            assert_eq!(
                table.find_hashed(state.hash_key(k), &k).map(|entry| entry.value),
                Some((k as i32) * 3)
            );
        }
    }

    #[test]
    fn insert_many() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..10000u64 {
            table.insert_hashed(k, k as i32, state.hash_key(k));
        }
        assert_eq!(table.len(), 10000);
        for k in 0..10000u64 {
            assert_eq!(
                table.find_hashed(state.hash_key(k), &k).map(|entry| entry.value),
                Some(k as i32)
            );
        }
    }

    #[test]
    fn find_mut_updates_value() {
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..5u64 {
            table.insert(k, 1);
        }
        for k in 0..5u64 {
            if let Some(entry) = table.find_mut(&k) {
                *entry.value_mut() += 9;
            }
        }
        for k in 0..5u64 {
            assert_eq!(table.find(&k).map(|entry| entry.value), Some(10));
        }
    }

    #[test]
    fn index_access() {
        let mut table: HashTable<Item> = HashTable::new();
        table.insert(1, 11);
        table.insert(2, 22);

        assert_eq!(table[&1], 11);
        table[&2] += 1;
        assert_eq!(table[&2], 23);
    }

    #[test]
    #[should_panic(expected = "no entry found for key")]
    fn index_panics_on_absent_key() {
        let mut table: HashTable<Item> = HashTable::new();
        table.insert(1, 11);
        let _ = table[&2];
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..20u64 {
            table.insert(k, 0);
        }
        let capacity = table.capacity();

        table.clear();
        assert_eq!(table.len(), 0);
        assert_eq!(table.capacity(), capacity);
        assert!(table.find(&0).is_none());

        table.insert(0, 1);
        assert_eq!(table.find(&0).map(|entry| entry.value), Some(1));
    }

    #[test]
    fn max_load_factor_accessors() {
        let mut table: HashTable<Item> = HashTable::new();
        assert_eq!(table.max_load_factor(), 0.3);

        table.set_max_load_factor(0.9);
        assert_eq!(table.max_load_factor(), 0.9);

        // At 0.9 the first growth covers the first seven inserts.
        for k in 0..7u64 {
            table.insert(k, 0);
        }
        assert_eq!(table.capacity(), 8);
        table.insert(7, 0);
        assert_eq!(table.capacity(), 16);
    }

    #[test]
    fn interval_membership() {
        // No wrap: the run covers slots 0 and 1.
        assert!(home_in_interval(0, 0, 2, 8));
        assert!(home_in_interval(1, 0, 2, 8));
        assert!(!home_in_interval(2, 0, 2, 8));
        assert!(!home_in_interval(7, 0, 2, 8));

        // Wrapped run starting at slot 6: homes 6 and 7 are inside, and a
        // home of 0 counts as slot 8 once lifted.
        assert!(home_in_interval(6, 6, 9, 8));
        assert!(home_in_interval(7, 6, 9, 8));
        assert!(home_in_interval(0, 6, 9, 8));
        assert!(!home_in_interval(1, 6, 9, 8));
        assert!(!home_in_interval(5, 6, 9, 8));
    }

    #[test]
    fn default_is_empty() {
        let table: HashTable<Item> = HashTable::default();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 0);
        assert!(table.find(&1).is_none());
    }
}
