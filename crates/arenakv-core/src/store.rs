//! Store facade: composes bitmap, bloom, index, heap, and cache into
//! `has`/`get`/`set`/`delete` over one owned arena.
//!
//! Reads go cache, bloom, index, heap; writes go heap, then index, then
//! cache. `set` is an upsert: the new record is saved first, then any
//! existing record for the key is dropped, then the new one is linked. A
//! failure at any step leaves the prior mapping intact and leaks nothing.
//!
//! All operations run to completion on the calling thread; callers that
//! share a store across threads serialize access with a single lock.

use crate::cache::DirectCache;
use crate::heap::RecordHeap;
use crate::index::ChainedIndex;
use crate::layout::ArenaLayout;
use arenakv_common::{KvError, Result, StoreConfig};

/// Arena-backed key-value store.
pub struct Store {
    arena: Box<[u8]>,
    layout: ArenaLayout,
    heap: RecordHeap,
    index: ChainedIndex,
    cache: DirectCache,
    live: usize,
}

impl Store {
    /// Allocates the arena and initializes all regions.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        if config.cache_slots == 0 {
            return Err(KvError::InvalidParameter {
                name: "cache_slots".to_string(),
                value: "0".to_string(),
            });
        }
        let layout = ArenaLayout::new(config.memory_size, config.index_size)?;
        let arena = vec![0u8; layout.total_bytes()].into_boxed_slice();
        let heap = RecordHeap::new(layout.heap().len());
        let index = ChainedIndex::new(&layout);
        let cache = DirectCache::new(config.cache_slots);

        let mut store = Self {
            arena,
            layout,
            heap,
            index,
            cache,
            live: 0,
        };
        store.clear();
        Ok(store)
    }

    /// Drops every record and resets all regions.
    pub fn clear(&mut self) {
        let (index_bytes, heap_bytes) = self.arena.split_at_mut(self.layout.heap().start);
        self.index.clear(index_bytes);
        self.heap.clear(heap_bytes);
        self.cache.clear();
        self.live = 0;
    }

    /// Returns true if `key` is present.
    pub fn has(&self, key: &[u8]) -> bool {
        if key.is_empty() {
            return false;
        }
        if self.cache.has(key) {
            return true;
        }
        let (index_bytes, heap_bytes) = self.arena.split_at(self.layout.heap().start);
        let heap = &self.heap;
        self.index
            .has(index_bytes, key, |r| heap.key_at(heap_bytes, r) == Some(key))
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        if key.is_empty() {
            return None;
        }
        if let Some(value) = self.cache.get(key) {
            return Some(value.to_vec());
        }
        let (index_bytes, heap_bytes) = self.arena.split_at(self.layout.heap().start);
        let heap = &self.heap;
        let rref = self
            .index
            .get(index_bytes, key, |r| heap.key_at(heap_bytes, r) == Some(key))?;
        heap.value_at(heap_bytes, rref).map(|v| v.to_vec())
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// Returns false when the key is empty or capacity is exhausted (no
    /// fitting heap block, or no free chain slot for a brand-new key); the
    /// store is left exactly as it was.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> bool {
        if key.is_empty() {
            return false;
        }
        let (index_bytes, heap_bytes) = self.arena.split_at_mut(self.layout.heap().start);

        let Some(new_ref) = self.heap.save(heap_bytes, key, value) else {
            return false;
        };

        // Upsert: unlink and free the old record, if any. The new record
        // is not in the index yet, so the check predicate can only match
        // the old one.
        let heap = &self.heap;
        let replaced = {
            let heap_ro: &[u8] = heap_bytes;
            self.index
                .delete(index_bytes, key, |r| heap.key_at(heap_ro, r) == Some(key))
        };
        if let Some(old_ref) = replaced {
            self.heap.delete(heap_bytes, old_ref);
        }

        let linked = {
            let heap_ro: &[u8] = heap_bytes;
            self.index
                .set(index_bytes, new_ref, key, |r| heap.key_at(heap_ro, r) == Some(key))
        };
        if !linked {
            // Only reachable for brand-new keys: replacing a key frees its
            // chain slot, so the relink above cannot run out of slots.
            self.heap.delete(heap_bytes, new_ref);
            return false;
        }

        if replaced.is_none() {
            self.live += 1;
        }
        self.cache.set(key, value);
        true
    }

    /// Removes `key`. Returns true iff a live record was removed.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        if key.is_empty() {
            return false;
        }
        self.cache.remove(key);

        let (index_bytes, heap_bytes) = self.arena.split_at_mut(self.layout.heap().start);
        let heap = &self.heap;
        let removed = {
            let heap_ro: &[u8] = heap_bytes;
            self.index
                .delete(index_bytes, key, |r| heap.key_at(heap_ro, r) == Some(key))
        };
        match removed {
            Some(rref) => {
                let freed = self.heap.delete(heap_bytes, rref);
                if freed {
                    self.live -= 1;
                }
                freed
            }
            None => false,
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The arena layout in effect.
    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    /// Number of busy heap blocks (full heap walk).
    pub fn busy_records(&self) -> usize {
        let heap_bytes = &self.arena[self.layout.heap()];
        self.heap
            .blocks(heap_bytes)
            .filter(|(_, header)| header.busy)
            .count()
    }

    /// Number of allocated chain slots.
    pub fn allocated_slots(&self) -> u32 {
        self.index.bitmap().count(&self.arena)
    }

    /// Verifies the cross-structure invariants.
    ///
    /// - the heap walk lands exactly on the region end,
    /// - chain nodes, busy bitmap slots, busy heap blocks, and the live
    ///   counter all agree,
    /// - every bucket chain is ordered by non-increasing hash.
    pub fn check_invariants(&self) -> Result<()> {
        let (index_bytes, heap_bytes) = self.arena.split_at(self.layout.heap().start);

        let mut busy_blocks = 0usize;
        let mut walked = 0usize;
        for (range, header) in self.heap.blocks(heap_bytes) {
            if range.end > heap_bytes.len() {
                return Err(KvError::CorruptArena(format!(
                    "heap block at {} overruns the region",
                    range.start
                )));
            }
            if header.busy {
                busy_blocks += 1;
            }
            walked = range.end;
        }
        if walked != heap_bytes.len() {
            return Err(KvError::CorruptArena(format!(
                "heap walk ended at {} of {}",
                walked,
                heap_bytes.len()
            )));
        }

        // Every reachable node must sit on a busy slot, and the busy-bit
        // count must match the reachable nodes (no orphaned slots).
        let mut nodes = 0usize;
        for bucket in 0..self.index.htable_len() {
            for slot in self.index.chain_slots(index_bytes, bucket) {
                if !self.index.bitmap().is_set(index_bytes, slot) {
                    return Err(KvError::CorruptArena(format!(
                        "bucket {} chains through freed {}",
                        bucket, slot
                    )));
                }
                nodes += 1;
            }
        }
        let slots = self.index.bitmap().count(index_bytes) as usize;
        if nodes != slots {
            return Err(KvError::CorruptArena(format!(
                "{} chain nodes vs {} busy slots",
                nodes, slots
            )));
        }
        if nodes != self.live || busy_blocks != self.live {
            return Err(KvError::CorruptArena(format!(
                "live={} but {} nodes and {} busy blocks",
                self.live, nodes, busy_blocks
            )));
        }

        for bucket in 0..self.index.htable_len() {
            let hashes = self.index.chain_hashes(index_bytes, bucket);
            if hashes.windows(2).any(|pair| pair[0] < pair[1]) {
                return Err(KvError::CorruptArena(format!(
                    "bucket {} chain out of order",
                    bucket
                )));
            }
        }
        Ok(())
    }

    /// Raw arena image, for snapshots.
    pub(crate) fn arena_bytes(&self) -> &[u8] {
        &self.arena
    }

    /// Mutable arena image, for snapshot restore.
    pub(crate) fn arena_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.arena
    }

    /// Re-derives in-memory state after the arena bytes were replaced.
    ///
    /// The cache may hold pairs the restored index knows nothing about,
    /// and the next-fit cursor may point mid-block, so both are reset; the
    /// live count is recomputed from a heap walk.
    pub(crate) fn after_restore(&mut self) {
        self.cache.clear();
        self.heap.reset_cursor();
        let heap_bytes = &self.arena[self.layout.heap()];
        self.live = self
            .heap
            .blocks(heap_bytes)
            .filter(|(_, header)| header.busy)
            .count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_store() -> Store {
        let config = StoreConfig {
            memory_size: 0x4000,
            index_size: 0x600,
            cache_slots: 16,
        };
        Store::new(&config).unwrap()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = small_store();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_set_get_roundtrip() {
        let mut store = small_store();

        assert!(store.set(b"key1", b"hello"));
        assert_eq!(store.get(b"key1"), Some(b"hello".to_vec()));
        assert!(store.has(b"key1"));
        assert_eq!(store.len(), 1);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_get_absent() {
        let store = small_store();
        assert_eq!(store.get(b"nope"), None);
        assert!(!store.has(b"nope"));
    }

    #[test]
    fn test_overwrite_keeps_single_record() {
        let mut store = small_store();

        assert!(store.set(b"k", b"v1"));
        assert!(store.set(b"k", b"v2"));

        assert_eq!(store.get(b"k"), Some(b"v2".to_vec()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.busy_records(), 1);
        assert_eq!(store.allocated_slots(), 1);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_delete() {
        let mut store = small_store();

        store.set(b"k", b"v");
        assert!(store.delete(b"k"));
        assert!(!store.delete(b"k"));
        assert_eq!(store.get(b"k"), None);
        assert!(store.is_empty());
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_set_after_delete() {
        let mut store = small_store();

        store.set(b"k", b"v1");
        store.delete(b"k");
        assert!(store.set(b"k", b"v2"));
        assert_eq!(store.get(b"k"), Some(b"v2".to_vec()));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut store = small_store();

        assert!(!store.set(b"", b"value"));
        assert!(!store.has(b""));
        assert_eq!(store.get(b""), None);
        assert!(!store.delete(b""));
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_value_allowed() {
        let mut store = small_store();

        assert!(store.set(b"k", b""));
        assert_eq!(store.get(b"k"), Some(Vec::new()));
        assert!(store.has(b"k"));
    }

    #[test]
    fn test_value_with_nul_bytes() {
        let mut store = small_store();

        let value = b"before\0after\0end";
        assert!(store.set(b"k", value));
        assert_eq!(store.get(b"k"), Some(value.to_vec()));
    }

    #[test]
    fn test_clear() {
        let mut store = small_store();

        for i in 0..10 {
            store.set(format!("k{}", i).as_bytes(), b"v");
        }
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.get(b"k0"), None);
        assert_eq!(store.allocated_slots(), 0);
        assert_eq!(store.busy_records(), 0);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_slot_exhaustion_leaves_state_unchanged() {
        let mut store = small_store();

        // 4-byte bitmap: 32 slots.
        let capacity = 32;
        for i in 0..capacity {
            assert!(store.set(format!("k{}", i).as_bytes(), b"v"));
        }
        store.check_invariants().unwrap();

        let busy_before = store.busy_records();
        assert!(!store.set(b"overflow", b"v"));

        // No heap leak, no cache entry, nothing indexed.
        assert_eq!(store.busy_records(), busy_before);
        assert!(!store.has(b"overflow"));
        assert_eq!(store.len(), capacity);
        store.check_invariants().unwrap();

        // Overwriting an existing key still works at full slot capacity.
        assert!(store.set(b"k0", b"updated"));
        assert_eq!(store.get(b"k0"), Some(b"updated".to_vec()));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_heap_exhaustion_leaves_state_unchanged() {
        let mut store = small_store();
        let heap_len = store.layout().heap().len();

        // One record that fills the heap exactly: header + key + NUL +
        // value.
        let value = vec![7u8; heap_len - 5 - 3 - 1];
        assert!(store.set(b"big", &value));
        store.check_invariants().unwrap();

        assert!(!store.set(b"more", b"x"));
        assert!(!store.has(b"more"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(b"big").unwrap(), value);

        // Replacement stores the new record before dropping the old one,
        // so even a same-size overwrite needs room for both copies.
        assert!(!store.set(b"big", &value));
        assert_eq!(store.get(b"big").unwrap(), value);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_cache_collision_falls_through_to_index() {
        let mut store = small_store();

        // "Aa" and "BB" collide in every 31-multiplier hash family, so
        // they share a cache slot; the second write evicts the first from
        // the cache but not from the index.
        assert!(store.set(b"Aa", b"first"));
        assert!(store.set(b"BB", b"second"));

        assert_eq!(store.get(b"Aa"), Some(b"first".to_vec()));
        assert_eq!(store.get(b"BB"), Some(b"second".to_vec()));
        assert!(store.has(b"Aa"));
        assert!(store.has(b"BB"));
    }

    #[test]
    fn test_balanced_insert_delete_returns_to_empty() {
        let mut store = small_store();

        for i in 0..20 {
            assert!(store.set(format!("key{}", i).as_bytes(), format!("val{}", i).as_bytes()));
        }
        for i in 0..20 {
            assert!(store.delete(format!("key{}", i).as_bytes()));
        }

        assert!(store.is_empty());
        assert_eq!(store.allocated_slots(), 0);
        assert_eq!(store.busy_records(), 0);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_zero_cache_slots_rejected() {
        let config = StoreConfig {
            memory_size: 0x4000,
            index_size: 0x600,
            cache_slots: 0,
        };
        assert!(Store::new(&config).is_err());
    }
}
