//! Rehash scheduler: owns the active table and, while a migration is in
//! progress, the incoming table it is being moved into.
//!
//! States
//! - Stable: only `active` exists.
//! - Migrating: `active` is the old table, `Migration::incoming` the new
//!   one. Slots of `active` below `cursor` have been moved and hold
//!   tombstones; every live key sits in exactly one of the two tables.
//!
//! Each `step` moves one chunk of `capacity / MIGRATION_STEPS` slots (at
//! least one), so a migration finishes after at most `MIGRATION_STEPS`
//! steps no matter how large the table is. Only the map's `insert` calls
//! `step`; reads and removals never pay for a migration.
//!
//! Entries carry their 32-bit hash, so relocation only re-masks it against
//! the incoming table and never calls into `K: Hash` or `K: Eq`.

use crate::error::InsertError;
use crate::probe;
use crate::slot_table::{Entry, SlotTable};
use core::borrow::Borrow;
use core::mem;

/// Upper bound on the number of steps one migration takes.
pub const MIGRATION_STEPS: usize = 8;

/// Snapshot of an in-progress migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Capacity of the table being drained.
    pub from_capacity: usize,
    /// Capacity of the table receiving entries.
    pub to_capacity: usize,
    /// Next old-table slot to migrate, in `[0, from_capacity]`.
    pub cursor: usize,
}

#[derive(Debug)]
struct Migration<K, V> {
    incoming: SlotTable<K, V>,
    cursor: usize,
    chunk: usize,
}

#[derive(Debug)]
pub(crate) struct Tables<K, V> {
    active: SlotTable<K, V>,
    migration: Option<Migration<K, V>>,
}

impl<K, V> Tables<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Tables {
            active: SlotTable::with_capacity(capacity),
            migration: None,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.active.capacity()
    }

    /// Live entries across both tables.
    pub(crate) fn len(&self) -> usize {
        self.active.len() + self.migration.as_ref().map_or(0, |m| m.incoming.len())
    }

    pub(crate) fn is_migrating(&self) -> bool {
        self.migration.is_some()
    }

    pub(crate) fn status(&self) -> Option<MigrationStatus> {
        self.migration.as_ref().map(|m| MigrationStatus {
            from_capacity: self.active.capacity(),
            to_capacity: m.incoming.capacity(),
            cursor: m.cursor,
        })
    }

    /// Split borrow: the active table and, if migrating, the incoming one.
    pub(crate) fn split_mut(&mut self) -> (&mut SlotTable<K, V>, Option<&mut SlotTable<K, V>>) {
        (
            &mut self.active,
            self.migration.as_mut().map(|m| &mut m.incoming),
        )
    }

    /// Checks, before a new key is placed in the stable table, whether it
    /// pushes the live count over the threshold. Returns the capacity to
    /// grow to, or an error if that exceeds `max_capacity`.
    pub(crate) fn plan_growth(&self, max_capacity: usize) -> Result<Option<usize>, InsertError> {
        debug_assert!(!self.is_migrating());
        if self.active.len() < self.active.threshold() {
            return Ok(None);
        }
        doubled(self.active.capacity(), max_capacity).map(Some)
    }

    /// Decides, before `step` runs, whether a new key can be admitted. The
    /// key is judged against the table it will face after the step: the
    /// stable table, or the incoming one when this step finishes the
    /// migration. While a migration keeps running new keys always fit.
    pub(crate) fn check_admission(&self, max_capacity: usize) -> Result<(), InsertError> {
        let table = match &self.migration {
            None => &self.active,
            Some(m) if m.cursor + m.chunk >= self.active.capacity() => &m.incoming,
            Some(_) => return Ok(()),
        };
        if self.len() < table.threshold() {
            return Ok(());
        }
        doubled(table.capacity(), max_capacity).map(|_| ())
    }

    /// Capacity of a table to rebuild into when tombstones, not live
    /// entries, have filled the stable table. The same capacity is reused
    /// while the live entries plus a full migration's worth of inserts
    /// stay under the threshold.
    pub(crate) fn plan_compaction(&self, max_capacity: usize) -> Option<usize> {
        let live = self.active.len();
        let threshold = self.active.threshold();
        if self.is_migrating() || live + self.active.tombstones() <= threshold {
            return None;
        }
        let capacity = self.active.capacity();
        if live + MIGRATION_STEPS < threshold {
            Some(capacity)
        } else if capacity * 2 <= max_capacity {
            Some(capacity * 2)
        } else {
            None
        }
    }

    /// Stable -> Migrating. Allocates the incoming table; no slot moves
    /// until the next `step`.
    pub(crate) fn begin(&mut self, capacity: usize) {
        debug_assert!(!self.is_migrating(), "a migration is already running");
        debug_assert!(capacity >= self.active.capacity());
        let chunk = (self.active.capacity() / MIGRATION_STEPS).max(1);
        log::debug!(
            "starting migration: {} -> {} slots ({} live, {} tombstones)",
            self.active.capacity(),
            capacity,
            self.active.len(),
            self.active.tombstones()
        );
        self.migration = Some(Migration {
            incoming: SlotTable::with_capacity(capacity),
            cursor: 0,
            chunk,
        });
    }

    /// Moves the next chunk of the old table into the incoming table and
    /// finalizes the swap once the cursor reaches the end. Returns `true`
    /// when this step completed the migration.
    pub(crate) fn step(&mut self) -> bool {
        let Some(m) = self.migration.as_mut() else {
            return false;
        };
        let end = (m.cursor + m.chunk).min(self.active.capacity());
        let mut moved = 0usize;
        for index in m.cursor..end {
            if let Some(entry) = self.active.take(index) {
                let Some(slot) = probe::vacant_slot(&m.incoming, entry.hash) else {
                    unreachable!("incoming table has no vacant slot");
                };
                m.incoming.place(slot, entry);
                moved += 1;
            }
        }
        log::trace!(
            "migrated slots {}..{} of {} ({} entries)",
            m.cursor,
            end,
            self.active.capacity(),
            moved
        );
        m.cursor = end;
        if end < self.active.capacity() {
            return false;
        }
        self.finish();
        true
    }

    /// Migrating -> Stable: the incoming table replaces the drained one.
    fn finish(&mut self) {
        let Some(m) = self.migration.take() else {
            return;
        };
        debug_assert_eq!(self.active.len(), 0, "old table still holds live entries");
        let old = mem::replace(&mut self.active, m.incoming);
        log::debug!(
            "finished migration: {} -> {} slots ({} live)",
            old.capacity(),
            self.active.capacity(),
            self.active.len()
        );
    }

    /// Drops every entry and abandons any migration. Keeps the capacity.
    pub(crate) fn clear(&mut self) {
        self.migration = None;
        self.active.clear();
    }

    /// Looks `q` up in the incoming table first, then the active table.
    pub(crate) fn find<Q>(&self, hash: u32, q: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if let Some(m) = self.migration.as_ref() {
            if let Some(index) = probe::locate(&m.incoming, hash, q) {
                return m.incoming.entry(index);
            }
        }
        let index = probe::locate(&self.active, hash, q)?;
        self.active.entry(index)
    }

    pub(crate) fn find_mut<Q>(&mut self, hash: u32, q: &Q) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if let Some(m) = self.migration.as_mut() {
            if let Some(index) = probe::locate(&m.incoming, hash, q) {
                return m.incoming.entry_mut(index);
            }
        }
        let index = probe::locate(&self.active, hash, q)?;
        self.active.entry_mut(index)
    }

    /// Removes `q` from whichever table holds it, leaving a tombstone.
    pub(crate) fn take<Q>(&mut self, hash: u32, q: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if let Some(m) = self.migration.as_mut() {
            if let Some(index) = probe::locate(&m.incoming, hash, q) {
                return m.incoming.take(index);
            }
        }
        let index = probe::locate(&self.active, hash, q)?;
        self.active.take(index)
    }

    /// Panics if any structural invariant is broken.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self)
    where
        K: Eq,
    {
        let active = &self.active;
        assert!(active.capacity().is_power_of_two());
        assert_eq!(active.mask(), active.capacity() - 1);
        assert_eq!(active.entries().count(), active.len());
        if let Some(m) = &self.migration {
            let incoming = &m.incoming;
            assert!(incoming.capacity().is_power_of_two());
            assert!(incoming.capacity() >= active.capacity());
            assert!(m.cursor <= active.capacity());
            assert_eq!(incoming.entries().count(), incoming.len());
            for e in incoming.entries() {
                assert!(
                    probe::locate(active, e.hash, &e.key).is_none(),
                    "key present in both tables"
                );
            }
            for index in 0..m.cursor {
                assert!(active.entry(index).is_none(), "migrated slot still live");
            }
        }
        for e in active.entries() {
            assert!(probe::locate(active, e.hash, &e.key).is_some(), "unreachable key");
        }
    }
}

fn doubled(capacity: usize, max_capacity: usize) -> Result<usize, InsertError> {
    let requested = capacity.saturating_mul(2);
    if requested > max_capacity {
        return Err(InsertError::CapacityExceeded {
            requested,
            max: max_capacity,
        });
    }
    Ok(requested)
}
