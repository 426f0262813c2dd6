//! ProgressiveHashMap: public map surface over the rehash scheduler.

use crate::builder::{ProgressiveHashMapBuilder, DEFAULT_CAPACITY};
use crate::error::InsertError;
use crate::probe::{self, InsertSlot};
use crate::reentrancy::DebugReentrancy;
use crate::rehash::{MigrationStatus, Tables};
use crate::slot_table::{normalize_capacity, Entry, MAX_CAPACITY};
use crate::spread;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Open-addressing hash map that grows by progressive rehashing.
///
/// When an insert pushes the live count over three quarters of the
/// capacity, a table of twice the size is allocated and the next eight
/// inserts each move one eighth of the old table into it. Lookups and
/// removals consult both tables while a migration is running and never
/// advance it.
///
/// ```
/// use progressive_hashmap::ProgressiveHashMap;
///
/// let mut map = ProgressiveHashMap::new();
/// assert_eq!(map.insert("a".to_string(), 1), Ok(None));
/// assert_eq!(map.insert("a".to_string(), 2), Ok(Some(1)));
/// assert_eq!(map.get("a"), Some(&2));
/// assert_eq!(map.remove("a"), Some(2));
/// assert!(map.is_empty());
/// ```
pub struct ProgressiveHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    tables: Tables<K, V>,
    max_capacity: usize,
    reentrancy: DebugReentrancy,
}

impl<K, V> ProgressiveHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }

    pub fn builder() -> ProgressiveHashMapBuilder<K, V> {
        ProgressiveHashMapBuilder::new()
    }
}

impl<K, V, S> Default for ProgressiveHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> fmt::Debug for ProgressiveHashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressiveHashMap")
            .field("len", &self.tables.len())
            .field("capacity", &self.tables.capacity())
            .field("migration", &self.tables.status())
            .finish()
    }
}

impl<K, V, S> ProgressiveHashMap<K, V, S>
where
    S: BuildHasher,
{
    pub(crate) fn from_parts(hasher: S, capacity: usize, max_capacity: usize) -> Self {
        Self {
            hasher,
            tables: Tables::with_capacity(capacity),
            max_capacity,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    /// Capacity is rounded up to a power of two and clamped to
    /// `[MIN_CAPACITY, MAX_CAPACITY]`.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::from_parts(hasher, normalize_capacity(capacity, MAX_CAPACITY), MAX_CAPACITY)
    }

    /// Live entries across both tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.len() == 0
    }

    /// Slot count of the active table. While migrating this is the table
    /// being drained; see `migration()` for the incoming one.
    pub fn capacity(&self) -> usize {
        self.tables.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn is_migrating(&self) -> bool {
        self.tables.is_migrating()
    }

    pub fn migration(&self) -> Option<MigrationStatus> {
        self.tables.status()
    }

    /// Removes every entry and abandons a running migration. The active
    /// capacity is kept.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.tables.clear();
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self)
    where
        K: Eq,
    {
        self.tables.check_invariants();
    }
}

impl<K, V, S> ProgressiveHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u32
    where
        Q: ?Sized + Hash,
    {
        spread::spread(spread::fold(self.hasher.hash_one(q)))
    }

    /// Inserts `key`, returning the value it replaced.
    ///
    /// While a migration is running this first moves one chunk of the old
    /// table. An existing key is updated in whichever table holds it; a new
    /// key goes to the incoming table. In the stable state a new key that
    /// pushes the live count over the threshold starts a migration.
    ///
    /// Fails with `InsertError::CapacityExceeded`, leaving the map as it
    /// was, when the new key would need a table above the maximum capacity.
    /// That includes the pending migration step: it is not taken.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, InsertError> {
        let _g = self.reentrancy.enter("insert");
        let hash = self.make_hash(&key);
        if let Err(e) = self.tables.check_admission(self.max_capacity) {
            if self.tables.find(hash, &key).is_none() {
                return Err(e);
            }
        }
        self.tables.step();

        let (active, incoming) = self.tables.split_mut();
        if let Some(incoming) = incoming {
            let vacant = match probe::insertion_slot(incoming, hash, &key) {
                InsertSlot::Occupied(index) => return Ok(incoming.replace_value(index, value)),
                InsertSlot::Vacant(index) => index,
                InsertSlot::Saturated => unreachable!("incoming table is saturated"),
            };
            if let Some(index) = probe::locate(active, hash, &key) {
                return Ok(active.replace_value(index, value));
            }
            incoming.place(vacant, Entry::new(hash, key, value));
            return Ok(None);
        }

        let vacant = match probe::insertion_slot(active, hash, &key) {
            InsertSlot::Occupied(index) => return Ok(active.replace_value(index, value)),
            InsertSlot::Vacant(index) => index,
            InsertSlot::Saturated => unreachable!("stable table is saturated"),
        };
        let grow_to = self.tables.plan_growth(self.max_capacity)?;
        let (active, _) = self.tables.split_mut();
        active.place(vacant, Entry::new(hash, key, value));
        if let Some(capacity) = grow_to.or_else(|| self.tables.plan_compaction(self.max_capacity)) {
            self.tables.begin(capacity);
        }
        Ok(None)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get");
        let hash = self.make_hash(q);
        self.tables.find(hash, q).map(|e| &e.value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_key_value");
        let hash = self.make_hash(q);
        self.tables.find(hash, q).map(|e| (&e.key, &e.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_mut");
        let hash = self.make_hash(q);
        self.tables.find_mut(hash, q).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_key");
        let hash = self.make_hash(q);
        self.tables.find(hash, q).is_some()
    }

    /// Removes `q`, leaving a tombstone in its slot. Does not advance a
    /// running migration.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("remove_entry");
        let hash = self.make_hash(q);
        self.tables.take(hash, q).map(|e| (e.key, e.value))
    }
}
