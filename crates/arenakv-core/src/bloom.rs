//! Bloom filter for fast negative membership checks.
//!
//! Five parallel hash functions over a bit array in the bloom region of the
//! arena. Bits are only ever set or wholesale cleared; there is no per-key
//! removal, so a negative answer is always authoritative. Deleted keys
//! leave their bits behind until the next `clear()`.

use arenakv_common::hash_bytes;
use std::ops::Range;

/// Seeds of the five hash functions.
pub const BLOOM_SEEDS: [u32; 5] = [1087, 1697, 2039, 2843, 3041];

/// Five-hash bloom filter over a byte range of the arena.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    region: Range<usize>,
    bits: u32,
}

impl BloomFilter {
    /// Creates a filter over the given arena byte range.
    pub fn new(region: Range<usize>) -> Self {
        let bits = (region.len() * 8) as u32;
        Self { region, bits }
    }

    #[inline]
    fn bit_for(&self, seed: u32, key: &[u8]) -> u32 {
        hash_bytes(seed, key) % self.bits
    }

    /// Sets the five bits for `key`.
    pub fn add(&self, arena: &mut [u8], key: &[u8]) {
        let bytes = &mut arena[self.region.clone()];
        for seed in BLOOM_SEEDS {
            let bit = self.bit_for(seed, key);
            bytes[(bit >> 3) as usize] |= 1 << (bit & 7);
        }
    }

    /// Returns true iff all five bits for `key` are set.
    ///
    /// A false result is authoritative: the key was never added since the
    /// last `clear()`. A true result may be a false positive.
    pub fn has(&self, arena: &[u8], key: &[u8]) -> bool {
        let bytes = &arena[self.region.clone()];
        BLOOM_SEEDS.iter().all(|&seed| {
            let bit = self.bit_for(seed, key);
            bytes[(bit >> 3) as usize] & (1 << (bit & 7)) != 0
        })
    }

    /// Zeroes the filter.
    pub fn clear(&self, arena: &mut [u8]) {
        arena[self.region.clone()].fill(0);
    }
}
