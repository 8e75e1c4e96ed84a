//! Arena layout: carves the single byte arena into disjoint regions.
//!
//! Arena layout:
//! ```text
//! +--------------------+ 0
//! | Slot bitmap        |  bitmap_len bytes
//! +--------------------+
//! | Bloom filter       |  bloom_len bytes
//! +--------------------+
//! | Hash table         |  htable_len u32 buckets
//! +--------------------+
//! | Node array         |  nodes_len (hash, record, next) u32 triples
//! +--------------------+
//! | Record heap        |  everything remaining
//! +--------------------+ memory_size
//! ```
//!
//! All region dimensions derive from a single sizing parameter
//! `index_size`. With `L = index_size >> 3`:
//! - `nodes_len  = (L >> 1) + (L >> 2)`  (75% of L)
//! - `bitmap_len = nodes_len >> 5`
//! - `bloom_len  = L >> 5`
//! - `htable_len = L - nodes_len - bitmap_len - bloom_len`
//!
//! Sizes are fixed for the process lifetime; there is no reallocation.

use crate::heap::RECORD_HEADER_SIZE;
use arenakv_common::{KvError, Result};
use std::ops::Range;

/// Size of a hash-table bucket in bytes (one u32).
const BUCKET_SIZE: usize = 4;

/// Size of a node triple in bytes (three u32 words).
const NODE_SIZE: usize = 12;

/// Byte ranges of the arena regions, plus their derived dimensions.
#[derive(Debug, Clone)]
pub struct ArenaLayout {
    total_bytes: usize,
    bitmap: Range<usize>,
    bloom: Range<usize>,
    table: Range<usize>,
    nodes: Range<usize>,
    heap: Range<usize>,
    nodes_len: usize,
    htable_len: usize,
}

impl ArenaLayout {
    /// Computes the region layout for an arena of `memory_size` bytes with
    /// index sizing parameter `index_size`.
    pub fn new(memory_size: usize, index_size: usize) -> Result<Self> {
        let l = index_size >> 3;
        let nodes_len = (l >> 1) + (l >> 2);
        let bitmap_len = nodes_len >> 5;
        let bloom_len = l >> 5;

        if bitmap_len == 0 || bloom_len == 0 {
            return Err(KvError::ConfigError(format!(
                "index_size {} too small to derive index regions",
                index_size
            )));
        }

        let htable_len = l
            .checked_sub(nodes_len + bitmap_len + bloom_len)
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                KvError::ConfigError(format!(
                    "index_size {} leaves no room for hash buckets",
                    index_size
                ))
            })?;

        let bitmap = 0..bitmap_len;
        let bloom = bitmap.end..bitmap.end + bloom_len;
        let table = bloom.end..bloom.end + htable_len * BUCKET_SIZE;
        let nodes = table.end..table.end + nodes_len * NODE_SIZE;

        // The heap must at least hold its own terminal free header plus
        // one payload byte.
        if nodes.end + RECORD_HEADER_SIZE + 1 > memory_size {
            return Err(KvError::ConfigError(format!(
                "memory_size {} cannot hold index regions ({} bytes) plus a heap",
                memory_size, nodes.end
            )));
        }
        let heap = nodes.end..memory_size;

        Ok(Self {
            total_bytes: memory_size,
            bitmap,
            bloom,
            table,
            nodes,
            heap,
            nodes_len,
            htable_len,
        })
    }

    /// Total arena size in bytes.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Byte range of the slot bitmap.
    pub fn bitmap(&self) -> Range<usize> {
        self.bitmap.clone()
    }

    /// Byte range of the bloom filter.
    pub fn bloom(&self) -> Range<usize> {
        self.bloom.clone()
    }

    /// Byte range of the hash table (bucket heads).
    pub fn table(&self) -> Range<usize> {
        self.table.clone()
    }

    /// Byte range of the node array.
    pub fn nodes(&self) -> Range<usize> {
        self.nodes.clone()
    }

    /// Byte range of the record heap.
    pub fn heap(&self) -> Range<usize> {
        self.heap.clone()
    }

    /// Number of node triples the node array can hold.
    pub fn nodes_len(&self) -> usize {
        self.nodes_len
    }

    /// Number of hash-table buckets.
    pub fn htable_len(&self) -> usize {
        self.htable_len
    }
}
