//! Direct-mapped write-through cache.
//!
//! One slot per `hash(key) % len`; a write unconditionally overwrites the
//! slot, silently evicting any prior tenant. Cells only ever hold pairs
//! that are also present in the index, so a hit never needs validation
//! beyond the key compare.

use arenakv_common::hash_bytes;

/// Seed of the cache hash family.
const CACHE_HASH_SEED: u32 = 731;

/// Fixed-size direct-mapped key/value cache.
#[derive(Debug)]
pub struct DirectCache {
    slots: Vec<Option<(Vec<u8>, Vec<u8>)>>,
}

impl DirectCache {
    /// Creates a cache with `len` slots.
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "cache needs at least one slot");
        Self {
            slots: vec![None; len],
        }
    }

    #[inline]
    fn slot_of(&self, key: &[u8]) -> usize {
        hash_bytes(CACHE_HASH_SEED, key) as usize % self.slots.len()
    }

    /// Returns true if `key` occupies its slot.
    pub fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Returns the cached value for `key`, if its slot holds it.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        match &self.slots[self.slot_of(key)] {
            Some((k, v)) if k == key => Some(v),
            _ => None,
        }
    }

    /// Stores the pair, evicting whatever occupied the slot.
    pub fn set(&mut self, key: &[u8], value: &[u8]) {
        let slot = self.slot_of(key);
        self.slots[slot] = Some((key.to_vec(), value.to_vec()));
    }

    /// Clears the slot, but only if `key` is its current tenant.
    pub fn remove(&mut self, key: &[u8]) {
        let slot = self.slot_of(key);
        if matches!(&self.slots[slot], Some((k, _)) if k == key) {
            self.slots[slot] = None;
        }
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the cache has no slots (never, by construction).
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
