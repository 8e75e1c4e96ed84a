//! Configuration structures for ArenaKV.

use serde::{Deserialize, Serialize};

/// Default arena size in bytes (16 MB minus one).
pub const DEFAULT_MEMORY_SIZE: usize = 0x00FF_FFFF;

/// Default index sizing parameter in bytes.
pub const DEFAULT_INDEX_SIZE: usize = 0x0000_FFFF;

/// Default number of direct-mapped cache slots.
pub const DEFAULT_CACHE_SLOTS: usize = 500;

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 17878;

/// Storage configuration for the in-memory engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Total arena size in bytes.
    pub memory_size: usize,
    /// Index sizing parameter; the bitmap, bloom filter, hash table, and
    /// node array dimensions are all derived from this value.
    pub index_size: usize,
    /// Number of slots in the direct-mapped cache.
    pub cache_slots: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            index_size: DEFAULT_INDEX_SIZE,
            cache_slots: DEFAULT_CACHE_SLOTS,
        }
    }
}

/// Server configuration for the ArenaKV instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port number to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}
