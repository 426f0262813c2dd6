#![cfg(test)]

// Property tests for ProgressiveHashMap kept inside the crate so they can
// check the internal table invariants after every operation.

use crate::progressive_hash_map::ProgressiveHashMap;
use crate::rehash::MIGRATION_STEPS;
use proptest::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{1,4}", 1..=48).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            30 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            8 => idx.clone().prop_map(OpI::Remove),
            8 => idx.clone().prop_map(OpI::Get),
            3 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{1,4}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            // Rare, so that most runs go through several migrations.
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Tracks when the current migration began, in inserts, so the step bound
// can be asserted.
#[derive(Default)]
struct MigrationClock {
    inserts: usize,
    started_at: Option<usize>,
}

impl MigrationClock {
    fn after_insert<S: BuildHasher>(&mut self, sut: &ProgressiveHashMap<Key, i32, S>) -> Result<(), TestCaseError> {
        self.inserts += 1;
        match sut.migration() {
            None => self.started_at = None,
            // A migration that existed before this insert has been stepped
            // past cursor 0, so cursor 0 means it began on this insert.
            Some(s) if s.cursor == 0 => self.started_at = Some(self.inserts),
            Some(_) => {
                let started = self.started_at.expect("migration start observed");
                prop_assert!(
                    self.inserts - started < MIGRATION_STEPS,
                    "migration still running {} inserts after it began",
                    self.inserts - started
                );
            }
        }
        Ok(())
    }
}

fn run_ops<S: BuildHasher>(
    mut sut: ProgressiveHashMap<Key, i32, S>,
    ops: Vec<OpI>,
    pool: &[String],
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut clock = MigrationClock::default();
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let prev = sut.insert(k.clone(), v).expect("below maximum capacity");
                prop_assert_eq!(prev, model.insert(k, v));
                clock.after_insert(&sut)?;
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let cursor_before = sut.migration().map(|s| s.cursor);
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
                prop_assert_eq!(sut.migration().map(|s| s.cursor), cursor_before);
                prop_assert!(sut.get(&k).is_none());
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                clock.started_at = None;
            }
        }

        // Post-conditions after each op
        sut.check_invariants();
        prop_assert!(sut.capacity().is_power_of_two());
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - insert returns the previous value and get observes the last write.
// - remove returns the model's value, never advances a migration, and the
//   key is absent afterwards.
// - At every step: each live key is in exactly one table and reachable,
//   migrated old-table slots are empty of live entries, capacity is a power
//   of two, and len/is_empty match the model.
// - A migration finishes within MIGRATION_STEPS inserts of starting.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: ProgressiveHashMap<Key, i32> = ProgressiveHashMap::with_capacity(8);
        run_ops(sut, ops, &pool)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Low-entropy hasher: only the first byte of the key matters, so many keys
// share chains without all of them colliding.
#[derive(Clone, Default)]
struct FirstByteBuildHasher;
#[derive(Default)]
struct FirstByteHasher(Option<u8>);
impl BuildHasher for FirstByteBuildHasher {
    type Hasher = FirstByteHasher;
    fn build_hasher(&self) -> Self::Hasher {
        FirstByteHasher::default()
    }
}
impl Hasher for FirstByteHasher {
    fn write(&mut self, bytes: &[u8]) {
        if self.0.is_none() {
            self.0 = bytes.first().copied();
        }
    }
    fn finish(&self) -> u64 {
        self.0.map_or(0, u64::from)
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (constant hasher). Every key shares one probe chain,
// so tombstones and migration ordering are exercised on long chains.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: ProgressiveHashMap<Key, i32, ConstBuildHasher> =
            ProgressiveHashMap::with_capacity_and_hasher(8, ConstBuildHasher);
        run_ops(sut, ops, &pool)?;
    }

    #[test]
    fn prop_state_machine_with_clustered_hashes((pool, ops) in arb_scenario()) {
        let sut: ProgressiveHashMap<Key, i32, FirstByteBuildHasher> =
            ProgressiveHashMap::with_capacity_and_hasher(8, FirstByteBuildHasher);
        run_ops(sut, ops, &pool)?;
    }
}

// Hasher that passes a written u64 through unchanged.
#[derive(Clone, Default)]
struct IdentityBuildHasher;
#[derive(Default)]
struct IdentityHasher(u64);
impl BuildHasher for IdentityBuildHasher {
    type Hasher = IdentityHasher;
    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher::default()
    }
}
impl Hasher for IdentityHasher {
    fn write(&mut self, _bytes: &[u8]) {
        unreachable!("only u64 keys are hashed");
    }
    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

// Key whose hash value is chosen by the test; the index keeps keys distinct.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Hashed(u64, usize);
impl Hash for Hashed {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0);
    }
}

// Property: hashes whose entropy sits entirely in the upper 32 bits still
// spread over the table and round-trip through growth.
proptest! {
    #[test]
    fn prop_high_bit_hashes_survive_growth(hashes in proptest::collection::vec(any::<u32>(), 1..300)) {
        let mut sut: ProgressiveHashMap<Hashed, usize, IdentityBuildHasher> =
            ProgressiveHashMap::with_hasher(IdentityBuildHasher);
        let keys: Vec<Hashed> = hashes
            .into_iter()
            .enumerate()
            .map(|(i, h)| Hashed(u64::from(h) << 32, i))
            .collect();
        for (i, k) in keys.iter().enumerate() {
            prop_assert_eq!(sut.insert(k.clone(), i), Ok(None));
        }
        sut.check_invariants();
        for (i, k) in keys.iter().enumerate() {
            prop_assert_eq!(sut.get(k), Some(&i));
        }
    }
}
