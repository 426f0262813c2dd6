//! Probe sequencing: the linear probe order shared by every table
//! operation.
//!
//! A probe starts at the home slot `hash & mask` and walks forward one slot
//! at a time, wrapping at the end of the table. It visits each slot at most
//! once, so every scan terminates even when the table has no empty slot.

use crate::slot_table::{Slot, SlotTable};
use core::borrow::Borrow;

#[inline]
pub(crate) fn home_slot(hash: u32, mask: usize) -> usize {
    hash as usize & mask
}

/// Slot indices for one probe, home slot first.
#[derive(Debug, Clone)]
pub(crate) struct ProbeSeq {
    pos: usize,
    mask: usize,
    remaining: usize,
}

impl ProbeSeq {
    pub(crate) fn new(hash: u32, mask: usize) -> Self {
        ProbeSeq {
            pos: home_slot(hash, mask),
            mask,
            remaining: mask + 1,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let pos = self.pos;
        self.pos = (pos + 1) & self.mask;
        self.remaining -= 1;
        Some(pos)
    }
}

/// Outcome of an insertion scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertSlot {
    /// The key is already stored at this index.
    Occupied(usize),
    /// The key is absent; this is the first reusable slot on its chain.
    Vacant(usize),
    /// The key is absent and no slot is free.
    Saturated,
}

/// Finds the slot holding `q`. Tombstones are skipped; an empty slot ends
/// the chain.
pub(crate) fn locate<K, V, Q>(table: &SlotTable<K, V>, hash: u32, q: &Q) -> Option<usize>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    for index in ProbeSeq::new(hash, table.mask()) {
        match table.slot(index) {
            Slot::Empty => return None,
            Slot::Tombstone => {}
            Slot::Full(e) => {
                if e.hash == hash && e.key.borrow() == q {
                    return Some(index);
                }
            }
        }
    }
    None
}

/// Scans for `q` like `locate`, but also reports where a new entry for it
/// would go: the first tombstone on the chain, else the empty slot ending it.
pub(crate) fn insertion_slot<K, V, Q>(table: &SlotTable<K, V>, hash: u32, q: &Q) -> InsertSlot
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    let mut reusable = None;
    for index in ProbeSeq::new(hash, table.mask()) {
        match table.slot(index) {
            Slot::Empty => return InsertSlot::Vacant(reusable.unwrap_or(index)),
            Slot::Tombstone => {
                reusable.get_or_insert(index);
            }
            Slot::Full(e) => {
                if e.hash == hash && e.key.borrow() == q {
                    return InsertSlot::Occupied(index);
                }
            }
        }
    }
    reusable.map_or(InsertSlot::Saturated, InsertSlot::Vacant)
}

/// First empty or tombstoned slot on the chain for `hash`. Used when the
/// caller already knows the key is not in the table, so no `Eq` runs.
pub(crate) fn vacant_slot<K, V>(table: &SlotTable<K, V>, hash: u32) -> Option<usize> {
    ProbeSeq::new(hash, table.mask()).find(|&index| !matches!(table.slot(index), Slot::Full(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot_table::Entry;

    fn table_with(keys: &[(usize, u32, &'static str)]) -> SlotTable<&'static str, i32> {
        let mut t = SlotTable::with_capacity(8);
        for (i, &(index, hash, key)) in keys.iter().enumerate() {
            t.place(index, Entry::new(hash, key, i as i32));
        }
        t
    }

    #[test]
    fn probe_seq_wraps_and_visits_each_slot_once() {
        let seq: Vec<usize> = ProbeSeq::new(6, 7).collect();
        assert_eq!(seq, vec![6, 7, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn locate_follows_chain_and_stops_at_empty() {
        let t = table_with(&[(2, 2, "a"), (3, 2, "b"), (5, 2, "c")]);
        assert_eq!(locate(&t, 2, "a"), Some(2));
        assert_eq!(locate(&t, 2, "b"), Some(3));
        // Slot 4 is empty, so "c" is cut off from home slot 2.
        assert_eq!(locate(&t, 2, "c"), None);
    }

    /// Invariant: a tombstone does not break the chain behind it.
    #[test]
    fn locate_skips_tombstones() {
        let mut t = table_with(&[(2, 2, "a"), (3, 2, "b")]);
        t.take(2).unwrap();
        assert_eq!(locate(&t, 2, "a"), None);
        assert_eq!(locate(&t, 2, "b"), Some(3));
    }

    /// Invariant: equal keys with a different stored hash never match.
    #[test]
    fn locate_compares_hash_before_key() {
        let t = table_with(&[(2, 10, "a")]);
        assert_eq!(locate(&t, 2, "a"), None);
        assert_eq!(locate(&t, 10, "a"), Some(2));
    }

    #[test]
    fn insertion_slot_reuses_first_tombstone_but_finds_later_match() {
        let mut t = table_with(&[(2, 2, "a"), (3, 2, "b"), (4, 2, "c")]);
        t.take(2).unwrap();
        t.take(3).unwrap();
        assert_eq!(insertion_slot(&t, 2, "c"), InsertSlot::Occupied(4));
        assert_eq!(insertion_slot(&t, 2, "z"), InsertSlot::Vacant(2));
        assert_eq!(insertion_slot(&t, 0, "z"), InsertSlot::Vacant(0));
    }

    #[test]
    fn insertion_slot_reports_saturation() {
        let keys = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let mut t: SlotTable<&str, i32> = SlotTable::with_capacity(8);
        for (i, k) in keys.iter().enumerate() {
            t.place(i, Entry::new(0, *k, 0));
        }
        assert_eq!(insertion_slot(&t, 0, "z"), InsertSlot::Saturated);
        assert_eq!(locate(&t, 0, "z"), None);
        assert_eq!(vacant_slot(&t, 0), None);

        t.take(5).unwrap();
        assert_eq!(insertion_slot(&t, 0, "z"), InsertSlot::Vacant(5));
        assert_eq!(vacant_slot(&t, 3), Some(5));
    }
}
