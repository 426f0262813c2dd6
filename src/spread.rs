//! Hash spreading: turns a hasher's output into the 32-bit hash stored
//! with every entry.
//!
//! Tables are indexed with `hash & mask`, so only the low bits of the hash
//! pick a home slot. Folding and spreading push entropy from the whole
//! 64-bit hasher output into those low bits.

/// Folds a 64-bit hasher output into 32 bits by XOR-ing its halves.
#[inline]
pub fn fold(h: u64) -> u32 {
    (h ^ (h >> 32)) as u32
}

/// Mixes high bits into low bits with a short sequence of XOR-shifts.
#[inline]
pub fn spread(h: u32) -> u32 {
    let h = h ^ (h >> 20) ^ (h >> 12);
    h ^ (h >> 7) ^ (h >> 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_is_deterministic_and_keeps_zero() {
        assert_eq!(spread(0), 0);
        assert_eq!(spread(0xdead_beef), spread(0xdead_beef));
    }

    /// Invariant: hashes that differ only above the mask still land in
    /// different home slots of a small table after spreading.
    #[test]
    fn high_bits_reach_low_bits() {
        let mask = 15u32;
        let homes: std::collections::BTreeSet<u32> = (0..16u32)
            .map(|i| spread(i << 24) & mask)
            .collect();
        assert!(homes.len() > 1, "all high-bit-only hashes collided");
    }

    #[test]
    fn fold_mixes_both_halves() {
        assert_eq!(fold(0x0000_0001_0000_0000), 1);
        assert_eq!(fold(0x0000_0000_0000_0001), 1);
        assert_eq!(fold(0x0000_0001_0000_0001), 0);
    }
}
