//! Chained hash index mapping keys to record references.
//!
//! Two u32 arrays live in the arena as little-endian words: the hash table
//! of bucket heads and the node array of `(hash, record, next)` triples.
//! Links between nodes are slot IDs handed out by the slot bitmap; `EOC`
//! terminates a chain. Chains are kept ordered by descending hash so a
//! lookup can stop as soon as it walks past where its hash would sit.
//!
//! The index never dereferences a record itself. Key equality on a 32-bit
//! hash match is delegated to a caller-supplied check predicate, which
//! keeps the chain logic independent of the heap's record encoding.

use crate::bitmap::{SlotBitmap, SlotId};
use crate::bloom::BloomFilter;
use crate::heap::RecordRef;
use crate::layout::ArenaLayout;
use arenakv_common::hash_bytes;

/// End-of-chain sentinel in bucket heads and node links.
pub const EOC: u32 = 0xFFFF_FFFF;

/// Seed of the index hash family.
const INDEX_HASH_SEED: u32 = 199;

#[inline]
fn read_word(arena: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([arena[at], arena[at + 1], arena[at + 2], arena[at + 3]])
}

#[inline]
fn write_word(arena: &mut [u8], at: usize, value: u32) {
    arena[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Bucketed hash-chain index over the table and node regions of the arena.
///
/// Owns the slot bitmap and bloom filter; `clear` resets all three.
#[derive(Debug)]
pub struct ChainedIndex {
    table_start: usize,
    nodes_start: usize,
    htable_len: usize,
    nodes_len: usize,
    bitmap: SlotBitmap,
    bloom: BloomFilter,
}

impl ChainedIndex {
    /// Creates the index views for the given layout.
    pub fn new(layout: &ArenaLayout) -> Self {
        Self {
            table_start: layout.table().start,
            nodes_start: layout.nodes().start,
            htable_len: layout.htable_len(),
            nodes_len: layout.nodes_len(),
            bitmap: SlotBitmap::new(layout.bitmap()),
            bloom: BloomFilter::new(layout.bloom()),
        }
    }

    #[inline]
    fn bucket_at(&self, bucket: usize) -> usize {
        self.table_start + 4 * bucket
    }

    #[inline]
    fn node_at(&self, slot: u32) -> usize {
        self.nodes_start + 4 * (3 * slot as usize)
    }

    fn node(&self, arena: &[u8], slot: u32) -> (u32, u32, u32) {
        let at = self.node_at(slot);
        (
            read_word(arena, at),
            read_word(arena, at + 4),
            read_word(arena, at + 8),
        )
    }

    fn write_node(&self, arena: &mut [u8], slot: u32, hash: u32, rref: u32, next: u32) {
        let at = self.node_at(slot);
        write_word(arena, at, hash);
        write_word(arena, at + 4, rref);
        write_word(arena, at + 8, next);
    }

    fn set_next(&self, arena: &mut [u8], slot: u32, next: u32) {
        write_word(arena, self.node_at(slot) + 8, next);
    }

    #[inline]
    fn bucket_of(&self, hash: u32) -> usize {
        hash as usize % self.htable_len
    }

    /// Resets bitmap, bloom filter, and all bucket heads.
    pub fn clear(&self, arena: &mut [u8]) {
        self.bitmap.clear(arena);
        self.bloom.clear(arena);
        for bucket in 0..self.htable_len {
            write_word(arena, self.bucket_at(bucket), EOC);
        }
    }

    /// Looks up `key`, confirming hash matches through `check`.
    pub fn get<F>(&self, arena: &[u8], key: &[u8], check: F) -> Option<RecordRef>
    where
        F: Fn(RecordRef) -> bool,
    {
        if !self.bloom.has(arena, key) {
            return None;
        }
        let hash = hash_bytes(INDEX_HASH_SEED, key);
        let mut current = read_word(arena, self.bucket_at(self.bucket_of(hash)));
        while current != EOC {
            let (node_hash, rref, next) = self.node(arena, current);
            if node_hash == hash && check(RecordRef(rref)) {
                return Some(RecordRef(rref));
            }
            if hash > node_hash {
                // Chain hashes only decrease from here on.
                return None;
            }
            current = next;
        }
        None
    }

    /// Returns true if `key` is present.
    pub fn has<F>(&self, arena: &[u8], key: &[u8], check: F) -> bool
    where
        F: Fn(RecordRef) -> bool,
    {
        self.get(arena, key, check).is_some()
    }

    /// Inserts `key -> rref`, keeping the chain ordered by descending hash.
    ///
    /// Returns false if the key is already present (the caller decides
    /// overwrite policy) or if the slot bitmap is exhausted. On failure no
    /// node is linked and the bloom filter is untouched.
    pub fn set<F>(&self, arena: &mut [u8], rref: RecordRef, key: &[u8], check: F) -> bool
    where
        F: Fn(RecordRef) -> bool,
    {
        let hash = hash_bytes(INDEX_HASH_SEED, key);
        let bucket = self.bucket_of(hash);
        let mut prev = EOC;
        let mut current = read_word(arena, self.bucket_at(bucket));

        loop {
            if current == EOC {
                return self.link_new(arena, hash, rref, EOC, prev, bucket, key);
            }
            let (node_hash, node_rref, next) = self.node(arena, current);
            if node_hash == hash && check(RecordRef(node_rref)) {
                return false;
            }
            if hash > node_hash {
                return self.link_new(arena, hash, rref, current, prev, bucket, key);
            }
            prev = current;
            current = next;
        }
    }

    fn link_new(
        &self,
        arena: &mut [u8],
        hash: u32,
        rref: RecordRef,
        next: u32,
        prev: u32,
        bucket: usize,
        key: &[u8],
    ) -> bool {
        let Some(slot) = self.bitmap.fetch(arena) else {
            return false;
        };
        debug_assert!((slot.0 as usize) < self.nodes_len);
        self.write_node(arena, slot.0, hash, rref.0, next);
        if prev == EOC {
            write_word(arena, self.bucket_at(bucket), slot.0);
        } else {
            self.set_next(arena, prev, slot.0);
        }
        self.bloom.add(arena, key);
        true
    }

    /// Removes `key`, returning the record reference its node carried.
    pub fn delete<F>(&self, arena: &mut [u8], key: &[u8], check: F) -> Option<RecordRef>
    where
        F: Fn(RecordRef) -> bool,
    {
        if !self.bloom.has(arena, key) {
            return None;
        }
        let hash = hash_bytes(INDEX_HASH_SEED, key);
        let bucket = self.bucket_of(hash);
        let mut prev = EOC;
        let mut current = read_word(arena, self.bucket_at(bucket));

        while current != EOC {
            let (node_hash, rref, next) = self.node(arena, current);
            if node_hash == hash && check(RecordRef(rref)) {
                if prev == EOC {
                    write_word(arena, self.bucket_at(bucket), next);
                } else {
                    self.set_next(arena, prev, next);
                }
                self.bitmap.free(arena, SlotId(current));
                return Some(RecordRef(rref));
            }
            if hash > node_hash {
                return None;
            }
            prev = current;
            current = next;
        }
        None
    }

    /// Number of hash-table buckets.
    pub fn htable_len(&self) -> usize {
        self.htable_len
    }

    /// The slot bitmap, for diagnostics.
    pub fn bitmap(&self) -> &SlotBitmap {
        &self.bitmap
    }

    /// Hash sequence along the chain of `bucket`, head first.
    ///
    /// Panics if the chain is longer than the node array, which can only
    /// happen on a corrupted (cyclic) chain.
    pub fn chain_hashes(&self, arena: &[u8], bucket: usize) -> Vec<u32> {
        let mut hashes = Vec::new();
        let mut current = read_word(arena, self.bucket_at(bucket));
        while current != EOC {
            assert!(
                hashes.len() <= self.nodes_len,
                "cycle in chain of bucket {}",
                bucket
            );
            let (node_hash, _, next) = self.node(arena, current);
            hashes.push(node_hash);
            current = next;
        }
        hashes
    }

    /// Slot sequence along the chain of `bucket`, head first.
    pub fn chain_slots(&self, arena: &[u8], bucket: usize) -> Vec<SlotId> {
        let mut slots = Vec::new();
        let mut current = read_word(arena, self.bucket_at(bucket));
        while current != EOC {
            assert!(
                slots.len() <= self.nodes_len,
                "cycle in chain of bucket {}",
                bucket
            );
            slots.push(SlotId(current));
            current = self.node(arena, current).2;
        }
        slots
    }

    /// Total number of nodes reachable from all buckets.
    pub fn node_count(&self, arena: &[u8]) -> usize {
        (0..self.htable_len)
            .map(|b| self.chain_slots(arena, b).len())
            .sum()
    }
}
