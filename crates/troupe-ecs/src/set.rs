//! Actor membership sets and the safe iteration view.
//!
//! A [`FamilyActorSet`] is the incrementally-maintained backing array for one
//! cached [`Family`](crate::family::Family): a compacting array of handles
//! with the same intrusive free-list trick as the actor table. Freed slots
//! store the next free index with the reserved max-version marker, so they
//! can never be mistaken for a live handle.
//!
//! An [`IterableActorSet`] is the read view handed to callers: it walks the
//! slot array in reverse and re-checks liveness per slot, so entries that
//! went stale since the set was last touched are skipped rather than
//! revisited.

use crate::actor::{ActorHandle, ActorTable, FREE_VERSION, INVALID_INDEX};

// ---------------------------------------------------------------------------
// FamilyActorSet
// ---------------------------------------------------------------------------

/// Free-list-backed membership array for one family.
#[derive(Debug, Default)]
pub(crate) struct FamilyActorSet {
    /// Live entries hold actor handles; free entries hold the next free
    /// index with [`FREE_VERSION`] in the version field.
    slots: Vec<ActorHandle>,
    /// Head of the free chain, `INVALID_INDEX` when the array is compact.
    free_head: u32,
    /// Number of free entries.
    free_count: u32,
}

impl FamilyActorSet {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: INVALID_INDEX,
            free_count: 0,
        }
    }

    /// Add an actor, reusing the head free slot if one exists.
    pub fn add(&mut self, actor: ActorHandle) {
        if self.free_head != INVALID_INDEX {
            let index = self.free_head as usize;
            self.free_head = self.slots[index].index();
            self.slots[index] = actor;
            self.free_count -= 1;
        } else {
            self.slots.push(actor);
        }
    }

    /// Remove an actor, freeing its slot. Returns `false` if the actor is
    /// not in the set.
    ///
    /// The freed slot is appended to the *tail* of the free chain, which
    /// costs O(free-list length). Family sets are expected to stay small;
    /// revisit if large families with heavy churn show up in profiles.
    pub fn remove(&mut self, actor: ActorHandle) -> bool {
        let Some(position) = self.slots.iter().position(|&slot| slot == actor) else {
            return false;
        };
        let position = position as u32;
        self.slots[position as usize] = ActorHandle::new(INVALID_INDEX, FREE_VERSION);

        if self.free_head == INVALID_INDEX {
            self.free_head = position;
        } else {
            let mut tail = self.free_head as usize;
            while self.slots[tail].index() != INVALID_INDEX {
                tail = self.slots[tail].index() as usize;
            }
            self.slots[tail] = ActorHandle::new(position, FREE_VERSION);
        }
        self.free_count += 1;
        true
    }

    /// Drop every member, rebuilding the whole array as one contiguous free
    /// chain. Used by bulk destroys.
    pub fn remove_all(&mut self) {
        let len = self.slots.len();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let next = if i + 1 < len {
                (i + 1) as u32
            } else {
                INVALID_INDEX
            };
            *slot = ActorHandle::new(next, FREE_VERSION);
        }
        self.free_head = if len > 0 { 0 } else { INVALID_INDEX };
        self.free_count = len as u32;
    }

    /// Linear-scan membership test.
    pub fn contains(&self, actor: ActorHandle) -> bool {
        self.slots.iter().any(|&slot| slot == actor)
    }

    /// Slot count, live and free.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// The stored handle at a slot index, if in range. Free slots yield
    /// their marker handle, which fails any liveness check.
    pub fn slot(&self, index: usize) -> Option<ActorHandle> {
        self.slots.get(index).copied()
    }

    pub fn free_count(&self) -> u32 {
        self.free_count
    }

    pub fn slots(&self) -> &[ActorHandle] {
        &self.slots
    }
}

// ---------------------------------------------------------------------------
// IterableActorSet
// ---------------------------------------------------------------------------

/// Non-owning read view over a set of actor slots.
///
/// `iter` walks the slots in reverse (highest index first) and skips any
/// entry whose actor is no longer alive, so freed and recycled slots are
/// never yielded as their former occupants. `count` is O(1) via the deleted
/// counter.
///
/// For iteration that structurally mutates the manager mid-pass (destroying
/// the visited actor, adding components), use
/// [`ActorManager::each_actor`](crate::manager::ActorManager::each_actor) or
/// [`each_actor_for`](crate::manager::ActorManager::each_actor_for), which
/// apply the same reverse-walk policy while lending the manager back to the
/// callback.
#[derive(Clone, Copy)]
pub struct IterableActorSet<'a> {
    slots: &'a [ActorHandle],
    table: &'a ActorTable,
    deleted: u32,
}

impl<'a> IterableActorSet<'a> {
    pub(crate) fn new(slots: &'a [ActorHandle], table: &'a ActorTable, deleted: u32) -> Self {
        Self {
            slots,
            table,
            deleted,
        }
    }

    /// Number of live members.
    pub fn count(&self) -> usize {
        self.slots.len() - self.deleted as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Whether the set currently contains this exact (still-alive) handle.
    pub fn contains(&self, actor: ActorHandle) -> bool {
        self.table.is_alive(actor) && self.slots.iter().any(|&slot| slot == actor)
    }

    /// Iterate live members, highest slot index first.
    pub fn iter(&self) -> impl Iterator<Item = ActorHandle> + 'a {
        let slots = self.slots;
        let table = self.table;
        slots
            .iter()
            .rev()
            .copied()
            .filter(move |&handle| table.is_alive(handle))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
