//! Storage engine for ArenaKV.
//!
//! This crate provides:
//! - Arena layout: carves one byte buffer into bitmap, bloom filter,
//!   hash table, node array, and record heap regions
//! - Slot bitmap for chain-node allocation
//! - Bloom filter for fast negative membership
//! - Record heap for variable-width record storage
//! - Chained hash index mapping keys to record offsets
//! - Direct-mapped write-through cache
//! - Store facade composing the above into has/get/set/delete
//! - Snapshot save/load of the arena image

mod bitmap;
mod bloom;
mod cache;
mod heap;
mod index;
mod layout;
pub mod snapshot;
mod store;

pub use bitmap::{SlotBitmap, SlotId};
pub use bloom::{BloomFilter, BLOOM_SEEDS};
pub use cache::DirectCache;
pub use heap::{RecordHeap, RecordHeader, RecordRef, RECORD_HEADER_SIZE};
pub use index::{ChainedIndex, EOC};
pub use layout::ArenaLayout;
pub use store::Store;
