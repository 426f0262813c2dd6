//! progressive-hashmap: a single-threaded, open-addressing hash map that
//! spreads the cost of growing across many inserts instead of rehashing
//! everything at once.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep every insert O(1) in the worst case contributed by
//!   resizing, by migrating the old table into the new one a bounded slice
//!   at a time.
//! - Layers:
//!   - `spread`: folds the hasher's `u64` into a 32-bit hash and mixes high
//!     bits into low bits, since slots are picked by masking.
//!   - `SlotTable`: power-of-two array of `Empty | Tombstone | Full` slots
//!     with live and tombstone counters.
//!   - `probe`: linear probe sequence from the home slot `hash & mask`;
//!     lookup, insertion and vacancy scans.
//!   - `Tables` (rehash scheduler): the active table plus, while migrating,
//!     the incoming table and a cursor. Each step moves one eighth of the
//!     old table.
//!   - `ProgressiveHashMap<K, V, S>`: public API; routes each call to the
//!     right table(s) and drives the scheduler from `insert`.
//!
//! Constraints
//! - Single-threaded: no internal synchronization. The map is `!Sync`
//!   (the reentrancy guard holds a `Cell`) but `Send`, since it owns every
//!   entry and can be moved to another thread as a whole.
//! - A migration starts when an insert pushes the live count over three
//!   quarters of the capacity, and finishes after at most 8 further inserts
//!   regardless of table size.
//! - Only `insert` advances a migration. `get`, `get_mut`, `contains_key`
//!   and `remove` consult the incoming table first, then the old one.
//! - While migrating every live key is in exactly one table: existing keys
//!   are updated where they are, new keys always go to the incoming table.
//! - Removal leaves a tombstone so later keys in the same probe chain stay
//!   reachable. Tombstones are dropped when a table is migrated; a table
//!   clogged with tombstones is rebuilt at the same capacity through the
//!   same stepwise migration.
//! - No shrinking, iteration, or serialization.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its 32-bit hash and relocation re-masks it against
//!   the incoming table; `K: Hash` and `K: Eq` never run during a
//!   migration step.
//! - A debug-only reentrancy guard at the start of each public method
//!   catches user code that re-enters the map from `Hash`/`Eq`, and names
//!   both the nested call and the one it interrupted.
//! - An insert of a new key that would need a table above the maximum is
//!   rejected before the pending migration step runs.
//!
//! Errors
//! - `insert` returns `InsertError::CapacityExceeded` when a new key would
//!   need a table above the configured maximum; the map is unchanged.

mod builder;
mod error;
mod probe;
mod progressive_hash_map;
mod progressive_hash_map_proptest;
mod reentrancy;
mod rehash;
mod slot_table;
pub mod spread;

// Public surface
pub use builder::{ProgressiveHashMapBuilder, DEFAULT_CAPACITY};
pub use error::InsertError;
pub use progressive_hash_map::ProgressiveHashMap;
pub use rehash::{MigrationStatus, MIGRATION_STEPS};
pub use slot_table::{MAX_CAPACITY, MIN_CAPACITY};
