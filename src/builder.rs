//! Builder for `ProgressiveHashMap` configuration.

use crate::progressive_hash_map::ProgressiveHashMap;
use crate::slot_table::{normalize_capacity, normalize_max_capacity, MAX_CAPACITY};
use core::fmt;
use core::hash::BuildHasher;
use core::marker::PhantomData;
use hashbrown::hash_map::DefaultHashBuilder;

/// Capacity a map starts with unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 16;

/// Configures the initial capacity, the maximum capacity and the hasher
/// of a `ProgressiveHashMap`.
///
/// Capacities are rounded to powers of two: the maximum rounds down, the
/// initial capacity rounds up and is then clamped to the maximum.
///
/// ```
/// use progressive_hashmap::ProgressiveHashMap;
///
/// let mut map = ProgressiveHashMap::builder()
///     .initial_capacity(64)
///     .max_capacity(1 << 16)
///     .build();
/// map.insert("k", 1).unwrap();
/// assert_eq!(map.capacity(), 64);
/// ```
pub struct ProgressiveHashMapBuilder<K, V, S = DefaultHashBuilder> {
    initial_capacity: usize,
    max_capacity: usize,
    hasher: S,
    _pd: PhantomData<fn() -> (K, V)>,
}

impl<K, V> ProgressiveHashMapBuilder<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V> Default for ProgressiveHashMapBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for ProgressiveHashMapBuilder<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressiveHashMapBuilder")
            .field("initial_capacity", &self.initial_capacity)
            .field("max_capacity", &self.max_capacity)
            .finish_non_exhaustive()
    }
}

impl<K, V, S> ProgressiveHashMapBuilder<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        ProgressiveHashMapBuilder {
            initial_capacity: DEFAULT_CAPACITY,
            max_capacity: MAX_CAPACITY,
            hasher,
            _pd: PhantomData,
        }
    }

    /// Number of slots the first table gets.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Largest table the map may grow to. Inserting a key that would need
    /// a larger one fails with `InsertError::CapacityExceeded`.
    pub fn max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Replaces the hasher, keeping the other settings.
    pub fn hasher<S2>(self, hasher: S2) -> ProgressiveHashMapBuilder<K, V, S2> {
        ProgressiveHashMapBuilder {
            initial_capacity: self.initial_capacity,
            max_capacity: self.max_capacity,
            hasher,
            _pd: PhantomData,
        }
    }

    pub fn build(self) -> ProgressiveHashMap<K, V, S>
    where
        S: BuildHasher,
    {
        let max = normalize_max_capacity(self.max_capacity);
        let initial = normalize_capacity(self.initial_capacity, max);
        ProgressiveHashMap::from_parts(self.hasher, initial, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot_table::MIN_CAPACITY;
    use std::collections::hash_map::RandomState;

    #[test]
    fn defaults() {
        let m: ProgressiveHashMap<u32, u32> = ProgressiveHashMapBuilder::new().build();
        assert_eq!(m.capacity(), DEFAULT_CAPACITY);
        assert_eq!(m.max_capacity(), MAX_CAPACITY);
    }

    #[test]
    fn capacities_are_normalized() {
        let m: ProgressiveHashMap<u32, u32> = ProgressiveHashMapBuilder::new()
            .initial_capacity(100)
            .max_capacity(1000)
            .build();
        assert_eq!(m.capacity(), 128);
        assert_eq!(m.max_capacity(), 512);

        let m: ProgressiveHashMap<u32, u32> = ProgressiveHashMapBuilder::new()
            .initial_capacity(1 << 20)
            .max_capacity(64)
            .build();
        assert_eq!(m.capacity(), 64);

        let m: ProgressiveHashMap<u32, u32> = ProgressiveHashMapBuilder::new()
            .initial_capacity(0)
            .build();
        assert_eq!(m.capacity(), MIN_CAPACITY);
    }

    #[test]
    fn hasher_swap_keeps_settings() {
        let mut m: ProgressiveHashMap<&str, i32, RandomState> = ProgressiveHashMapBuilder::new()
            .initial_capacity(32)
            .hasher(RandomState::new())
            .build();
        assert_eq!(m.capacity(), 32);
        assert_eq!(m.insert("a", 1), Ok(None));
        assert_eq!(m.get("a"), Some(&1));
    }

    #[test]
    fn debug_lists_capacities() {
        let b: ProgressiveHashMapBuilder<u8, u8> = ProgressiveHashMapBuilder::new().max_capacity(64);
        let s = format!("{b:?}");
        assert!(s.contains("max_capacity: 64"), "{s}");
    }
}
