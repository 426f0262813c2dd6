//! SlotTable: fixed-capacity array of slots, the storage for one
//! generation of the map.

use core::mem;

/// Smallest table ever allocated.
pub const MIN_CAPACITY: usize = 8;
/// Default upper bound on the number of slots in one table.
pub const MAX_CAPACITY: usize = 1 << 30;

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) hash: u32,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(hash: u32, key: K, value: V) -> Self {
        Entry { hash, key, value }
    }
}

#[derive(Debug)]
pub(crate) enum Slot<K, V> {
    Empty,
    // Removed or migrated away; probing continues past it.
    Tombstone,
    Full(Entry<K, V>),
}

/// Power-of-two array of slots plus live/tombstone counters.
#[derive(Debug)]
pub(crate) struct SlotTable<K, V> {
    slots: Box<[Slot<K, V>]>,
    live: usize,
    tombstones: usize,
}

/// Rounds a requested capacity to a power of two within
/// `[MIN_CAPACITY, max]`. `max` must already be normalized.
pub(crate) fn normalize_capacity(requested: usize, max: usize) -> usize {
    requested
        .max(MIN_CAPACITY)
        .checked_next_power_of_two()
        .unwrap_or(max)
        .min(max)
}

/// Rounds a maximum capacity down to a power of two within
/// `[MIN_CAPACITY, MAX_CAPACITY]`.
pub(crate) fn normalize_max_capacity(max: usize) -> usize {
    let max = max.clamp(MIN_CAPACITY, MAX_CAPACITY);
    1 << (usize::BITS - 1 - max.leading_zeros())
}

impl<K, V> SlotTable<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two(), "capacity must be a power of two");
        let slots = (0..capacity).map(|_| Slot::Empty).collect();
        SlotTable {
            slots,
            live: 0,
            tombstones: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    /// Live count above which the table must grow.
    #[inline]
    pub(crate) fn threshold(&self) -> usize {
        self.slots.len() * 3 / 4
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub(crate) fn tombstones(&self) -> usize {
        self.tombstones
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> &Slot<K, V> {
        &self.slots[index]
    }

    pub(crate) fn entry(&self, index: usize) -> Option<&Entry<K, V>> {
        match &self.slots[index] {
            Slot::Full(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> Option<&mut Entry<K, V>> {
        match &mut self.slots[index] {
            Slot::Full(e) => Some(e),
            _ => None,
        }
    }

    /// Stores `entry` in a vacant (empty or tombstoned) slot.
    pub(crate) fn place(&mut self, index: usize, entry: Entry<K, V>) {
        match mem::replace(&mut self.slots[index], Slot::Full(entry)) {
            Slot::Empty => {}
            Slot::Tombstone => self.tombstones -= 1,
            Slot::Full(_) => panic!("slot {index} is already occupied"),
        }
        self.live += 1;
    }

    /// Swaps in a new value for the entry at `index`, returning the old one.
    pub(crate) fn replace_value(&mut self, index: usize, value: V) -> Option<V> {
        self.entry_mut(index)
            .map(|e| mem::replace(&mut e.value, value))
    }

    /// Moves the entry out of `index`, leaving a tombstone behind.
    pub(crate) fn take(&mut self, index: usize) -> Option<Entry<K, V>> {
        if !matches!(self.slots[index], Slot::Full(_)) {
            return None;
        }
        match mem::replace(&mut self.slots[index], Slot::Tombstone) {
            Slot::Full(e) => {
                self.live -= 1;
                self.tombstones += 1;
                Some(e)
            }
            _ => None,
        }
    }

    pub(crate) fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.live = 0;
        self.tombstones = 0;
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> impl Iterator<Item = &Entry<K, V>> {
        self.slots.iter().filter_map(|s| match s {
            Slot::Full(e) => Some(e),
            _ => None,
        })
    }
}
