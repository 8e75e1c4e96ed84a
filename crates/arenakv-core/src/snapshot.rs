//! Snapshot save/load: bulk bytes in and out of the arena.
//!
//! A snapshot is the arena image, byte for byte. No version header, no
//! checksum, no validation on load; the restored arena is trusted to be
//! internally consistent because it was written by a previous save on the
//! same host. Loading is equivalent to warm-restarting the process.

use crate::store::Store;
use arenakv_common::Result;
use std::fs;
use std::path::Path;

/// Writes the entire arena to `path`, replacing any existing file.
pub fn save(store: &Store, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, store.arena_bytes())?;
    Ok(())
}

/// Reads `path` into the arena, truncating or zero-padding the file bytes
/// to the arena's exact length, then resets derived state (cache, cursor,
/// live count).
pub fn load(store: &mut Store, path: impl AsRef<Path>) -> Result<()> {
    let bytes = fs::read(path)?;
    let arena = store.arena_bytes_mut();

    let copied = bytes.len().min(arena.len());
    arena[..copied].copy_from_slice(&bytes[..copied]);
    arena[copied..].fill(0);

    store.after_restore();
    Ok(())
}
