//! Actor handles and the slot table that allocates them.
//!
//! An [`ActorHandle`] is a 64-bit handle that packs a *version* counter in
//! the high 32 bits and a slot *index* in the low 32 bits. The version is
//! bumped every time a slot is recycled, which allows immediate stale-handle
//! detection.
//!
//! The [`ActorTable`] stores one packed handle per slot. A live slot stores a
//! handle whose own index equals its position in the table; a free slot
//! stores the index of the *next* free slot instead, forming an intrusive
//! free list inside the same array.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index value reserved for "no slot": the null handle and the end of a free
/// chain.
pub(crate) const INVALID_INDEX: u32 = u32::MAX;

/// Version value reserved for free-slot markers in set storage. Never
/// assigned to a live handle; the version counter skips it on wraparound.
pub(crate) const FREE_VERSION: u32 = u32::MAX;

// ---------------------------------------------------------------------------
// ActorHandle
// ---------------------------------------------------------------------------

/// A generational actor identifier.
///
/// Layout: `[version: u32 | index: u32]`
///
/// Equality is bitwise on the packed value, so two handles referring to the
/// same slot but different versions never compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorHandle(u64);

impl ActorHandle {
    /// The null handle: no slot, no version.
    pub const NULL: Self = Self::new(INVALID_INDEX, FREE_VERSION);

    /// Construct an `ActorHandle` from an index and version.
    #[inline]
    pub const fn new(index: u32, version: u32) -> Self {
        Self((version as u64) << 32 | index as u64)
    }

    /// The slot index portion (low 32 bits).
    #[inline]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// The version portion (high 32 bits).
    #[inline]
    pub const fn version(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Whether this handle is the null sentinel.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.index() == INVALID_INDEX
    }

    /// Raw `u64` representation.
    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorHandle({}v{})", self.index(), self.version())
    }
}

impl fmt::Display for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.version())
    }
}

/// Next version for a recycled slot. Skips [`FREE_VERSION`], which is
/// reserved for free-slot markers, so the counter wraps to 0 one step early.
#[inline]
pub(crate) fn bump_version(version: u32) -> u32 {
    match version.wrapping_add(1) {
        FREE_VERSION => 0,
        next => next,
    }
}

// ---------------------------------------------------------------------------
// ActorTable
// ---------------------------------------------------------------------------

/// Allocates and recycles [`ActorHandle`]s with generational tracking.
///
/// Free slots form an intrusive singly-linked list: each free slot stores the
/// index of the next free slot in its own index field (and keeps the version
/// it will hand out when reused), so the table needs no side allocation.
#[derive(Debug)]
pub(crate) struct ActorTable {
    /// One packed handle per slot. Live slots are self-referential.
    slots: Vec<ActorHandle>,
    /// Head of the free chain, `INVALID_INDEX` when every slot is live.
    free_head: u32,
    /// Number of slots currently on the free chain.
    free_count: u32,
}

impl ActorTable {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: INVALID_INDEX,
            free_count: 0,
        }
    }

    /// Allocate a handle, reusing the most recently freed slot if one exists.
    ///
    /// A recycled slot keeps the version that was stored when it was freed
    /// (already bumped past the destroyed handle's version); a brand-new slot
    /// starts at version 0.
    pub fn allocate(&mut self) -> ActorHandle {
        if self.free_head != INVALID_INDEX {
            let index = self.free_head;
            let stored = self.slots[index as usize];
            self.free_head = stored.index();
            self.free_count -= 1;
            let handle = ActorHandle::new(index, stored.version());
            self.slots[index as usize] = handle;
            handle
        } else {
            let index = self.slots.len() as u32;
            let handle = ActorHandle::new(index, 0);
            self.slots.push(handle);
            handle
        }
    }

    /// Free a slot, pushing it onto the free chain with its version bumped so
    /// the outstanding handle goes stale.
    ///
    /// Returns `false` (and does nothing) if the handle is not alive.
    pub fn free(&mut self, handle: ActorHandle) -> bool {
        if !self.is_alive(handle) {
            return false;
        }
        let index = handle.index();
        self.slots[index as usize] =
            ActorHandle::new(self.free_head, bump_version(handle.version()));
        self.free_head = index;
        self.free_count += 1;
        true
    }

    /// A handle is alive iff its slot stores exactly that handle: the index
    /// is self-referential and the version matches the current generation.
    pub fn is_alive(&self, handle: ActorHandle) -> bool {
        match self.slots.get(handle.index() as usize) {
            Some(&stored) => stored == handle,
            None => false,
        }
    }

    /// Total slot count, live and free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of currently live actors.
    pub fn alive_count(&self) -> usize {
        self.slots.len() - self.free_count as usize
    }

    pub fn free_count(&self) -> u32 {
        self.free_count
    }

    /// The raw slot array. Free slots hold free-chain bookkeeping and fail
    /// the [`is_alive`](Self::is_alive) check.
    pub fn slots(&self) -> &[ActorHandle] {
        &self.slots
    }
}

impl Default for ActorTable {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_unique_indices() {
        let mut table = ActorTable::new();
        let handles: Vec<ActorHandle> = (0..100).map(|_| table.allocate()).collect();
        let mut indices: Vec<u32> = handles.iter().map(|h| h.index()).collect();
        indices.sort();
        indices.dedup();
        assert_eq!(indices.len(), 100);
    }

    #[test]
    fn version_increments_on_recycle() {
        let mut table = ActorTable::new();
        let a = table.allocate();
        assert_eq!(a.version(), 0);
        assert!(table.free(a));
        let b = table.allocate();
        // Same slot, strictly newer version.
        assert_eq!(b.index(), a.index());
        assert_eq!(b.version(), 1);
    }

    #[test]
    fn recycling_is_lifo() {
        let mut table = ActorTable::new();
        let a = table.allocate();
        let b = table.allocate();
        table.free(a);
        table.free(b);
        // The free chain is pushed at the head, so b's slot comes back first.
        assert_eq!(table.allocate().index(), b.index());
        assert_eq!(table.allocate().index(), a.index());
    }

    #[test]
    fn stale_handle_detection() {
        let mut table = ActorTable::new();
        let a = table.allocate();
        assert!(table.is_alive(a));
        assert!(table.free(a));
        assert!(!table.is_alive(a), "stale handle should not be alive");
        let _b = table.allocate(); // recycles the same slot
        assert!(!table.is_alive(a), "still stale after the slot is recycled");
    }

    #[test]
    fn double_free_returns_false() {
        let mut table = ActorTable::new();
        let a = table.allocate();
        assert!(table.free(a));
        assert!(!table.free(a));
    }

    #[test]
    fn alive_count_tracks_free_count() {
        let mut table = ActorTable::new();
        let a = table.allocate();
        let _b = table.allocate();
        assert_eq!(table.alive_count(), 2);
        table.free(a);
        assert_eq!(table.alive_count(), 1);
        assert_eq!(table.free_count(), 1);
        assert_eq!(table.slot_count(), 2);
    }

    #[test]
    fn null_handle_is_never_alive() {
        let table = ActorTable::new();
        assert!(ActorHandle::NULL.is_null());
        assert!(!table.is_alive(ActorHandle::NULL));
    }

    #[test]
    fn handle_roundtrip() {
        let handle = ActorHandle::new(42, 7);
        assert_eq!(handle.index(), 42);
        assert_eq!(handle.version(), 7);
        assert_eq!(ActorHandle::from_raw(handle.to_raw()), handle);
    }

    #[test]
    fn version_wrap_skips_free_marker() {
        assert_eq!(bump_version(0), 1);
        assert_eq!(bump_version(FREE_VERSION - 1), 0);
    }
}
