//! The [`ActorManager`] is the top-level container for the ECS. It owns the
//! actor table, the per-slot masks, the component type registry, all
//! component maps, and the cache of family membership sets.
//!
//! Every structural change (component add/remove, actor destroy) immediately
//! re-evaluates family membership for the affected actor, so a cached family
//! set is never out of date between operations.

use std::collections::HashMap;
use std::fmt;

use crate::actor::{ActorHandle, ActorTable};
use crate::component::{Component, ComponentMask, ComponentType, ComponentTypeRegistry};
use crate::family::{Family, FamilyBuilder};
use crate::set::{FamilyActorSet, IterableActorSet};
use crate::storage::{AnyComponentMap, ComponentMap, ComponentMaskSet};
use crate::ActorError;

// ---------------------------------------------------------------------------
// ActorManager
// ---------------------------------------------------------------------------

/// The ECS façade: actor lifecycle, component CRUD, and cached family
/// queries.
///
/// The manager is the sole owner of all per-actor storage; no component or
/// family cache outlives it. All operations are plain synchronous calls on
/// one logical thread.
pub struct ActorManager {
    /// Slot table; doubles as the backing array of the all-actors view.
    actors: ActorTable,
    /// Per-slot component masks, parallel to the table.
    masks: ComponentMaskSet,
    /// Lazily assigns one mask bit per Rust component type.
    registry: ComponentTypeRegistry,
    /// Type-erased component maps, indexed by the type's bit position.
    /// `None` for bits assigned through a family that never stored data.
    maps: Vec<Option<Box<dyn AnyComponentMap>>>,
    /// One membership set per family ever queried, kept for the manager's
    /// lifetime.
    families: HashMap<Family, FamilyActorSet>,
}

impl ActorManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            actors: ActorTable::new(),
            masks: ComponentMaskSet::new(),
            registry: ComponentTypeRegistry::new(),
            maps: Vec::new(),
            families: HashMap::new(),
        }
    }

    /// Read-only access to the component type registry.
    pub fn registry(&self) -> &ComponentTypeRegistry {
        &self.registry
    }

    /// Start building a [`Family`] against this manager's registry.
    pub fn family(&mut self) -> FamilyBuilder<'_> {
        FamilyBuilder::new(&mut self.registry)
    }

    // -- actor lifecycle ----------------------------------------------------

    /// Create a new actor with no components.
    ///
    /// Recycles the most recently freed slot when one exists (the returned
    /// handle carries a strictly newer version than the slot's previous
    /// occupant); otherwise the table grows by one slot.
    pub fn create_actor(&mut self) -> ActorHandle {
        let handle = self.actors.allocate();
        self.masks.ensure_len(self.actors.slot_count());
        // A fresh actor has an empty mask, which families without positive
        // requirements already match.
        for (family, set) in &mut self.families {
            if family.matches(ComponentMask::EMPTY) {
                set.add(handle);
            }
        }
        handle
    }

    /// Whether the handle refers to a currently live actor (index and
    /// version both match the slot's canonical handle).
    pub fn is_actor_alive(&self, actor: ActorHandle) -> bool {
        self.actors.is_alive(actor)
    }

    /// Destroy an actor: drop all of its components, clear its mask, recycle
    /// its slot, and remove it from every cached family set.
    ///
    /// Returns `false` (and does nothing) if the handle is stale or null.
    pub fn destroy_actor(&mut self, actor: ActorHandle) -> bool {
        if !self.actors.is_alive(actor) {
            return false;
        }
        let slot = actor.index();
        let mask = self.masks.mask(slot);
        for ty in mask.iter() {
            if let Some(map) = self.maps.get_mut(ty.bit_index()).and_then(Option::as_mut) {
                map.remove_slot(slot);
            }
        }
        self.masks.clear(slot);
        self.actors.free(actor);
        for set in self.families.values_mut() {
            set.remove(actor);
        }
        true
    }

    /// Destroy every live actor.
    ///
    /// End state is identical to destroying each actor individually; the
    /// family-cache update is batched into one `remove_all` pass per set.
    pub fn destroy_all_actors(&mut self) {
        let destroyed = self.actors.alive_count();
        for index in 0..self.actors.slot_count() {
            let handle = self.actors.slots()[index];
            if handle.index() as usize == index && self.actors.is_alive(handle) {
                self.masks.clear(handle.index());
                self.actors.free(handle);
            }
        }
        for map in self.maps.iter_mut().flatten() {
            map.clear();
        }
        for set in self.families.values_mut() {
            set.remove_all();
        }
        tracing::trace!(destroyed, "destroyed all actors");
    }

    /// Destroy every live actor currently matching `family`.
    pub fn destroy_all_actors_for(&mut self, family: Family) {
        self.ensure_family(family);
        let members: Vec<ActorHandle> = {
            let set = &self.families[&family];
            set.slots()
                .iter()
                .copied()
                .filter(|&handle| self.actors.is_alive(handle))
                .collect()
        };
        let destroyed = members.len();
        for handle in members {
            self.destroy_actor(handle);
        }
        tracing::trace!(destroyed, "destroyed actors for family");
    }

    /// Number of currently live actors.
    pub fn actor_count(&self) -> usize {
        self.actors.alive_count()
    }

    // -- component access ---------------------------------------------------

    /// Attach a component to an actor, replacing any previous value of the
    /// same type, and re-evaluate family membership. Registers the component
    /// type (and backfills its map to the table size) on first use.
    ///
    /// Returns a reference to the stored component.
    ///
    /// # Errors
    ///
    /// [`ActorError::StaleActor`] if the handle is not alive.
    pub fn add_component<T: Component>(
        &mut self,
        actor: ActorHandle,
        value: T,
    ) -> Result<&mut T, ActorError> {
        if !self.actors.is_alive(actor) {
            return Err(ActorError::StaleActor { actor });
        }
        let ty = self.registry.register::<T>();
        let index = ty.bit_index();
        if self.maps.len() <= index {
            self.maps.resize_with(index + 1, || None);
        }
        if self.maps[index].is_none() {
            self.maps[index] = Some(Box::new(ComponentMap::<T>::with_len(
                self.actors.slot_count(),
            )));
        }

        let slot = actor.index();
        let old_mask = self.masks.mask(slot);
        typed_map_mut::<T>(&mut self.maps, ty).insert(slot, value);
        self.masks.add(slot, ty);
        let new_mask = self.masks.mask(slot);
        self.refresh_memberships(actor, old_mask, new_mask);

        Ok(typed_map_mut::<T>(&mut self.maps, ty)
            .get_mut(slot)
            .expect("component was just stored"))
    }

    /// Whether the actor currently has a component of type `T`. O(1) via the
    /// mask; `false` for stale handles and never-registered types.
    pub fn has_component<T: Component>(&self, actor: ActorHandle) -> bool {
        if !self.actors.is_alive(actor) {
            return false;
        }
        match self.registry.lookup::<T>() {
            Some(ty) => self.masks.mask(actor.index()).contains(ty),
            None => false,
        }
    }

    /// Shared access to an actor's component. `None` for stale handles,
    /// never-registered types, and actors without the component; reads never
    /// register storage.
    pub fn get_component<T: Component>(&self, actor: ActorHandle) -> Option<&T> {
        if !self.actors.is_alive(actor) {
            return None;
        }
        let ty = self.registry.lookup::<T>()?;
        self.maps
            .get(ty.bit_index())
            .and_then(Option::as_ref)
            .and_then(|map| map.as_any().downcast_ref::<ComponentMap<T>>())
            .and_then(|map| map.get(actor.index()))
    }

    /// Exclusive access to an actor's component. Same `None` policy as
    /// [`get_component`](Self::get_component).
    pub fn get_component_mut<T: Component>(&mut self, actor: ActorHandle) -> Option<&mut T> {
        if !self.actors.is_alive(actor) {
            return None;
        }
        let ty = self.registry.lookup::<T>()?;
        self.maps
            .get_mut(ty.bit_index())
            .and_then(Option::as_mut)
            .and_then(|map| map.as_any_mut().downcast_mut::<ComponentMap<T>>())
            .and_then(|map| map.get_mut(actor.index()))
    }

    /// Detach a component from an actor and re-evaluate family membership.
    ///
    /// Removing a type the actor does not have -- including one never
    /// registered at all -- is a no-op and does not allocate storage.
    ///
    /// # Errors
    ///
    /// [`ActorError::StaleActor`] if the handle is not alive.
    pub fn remove_component<T: Component>(&mut self, actor: ActorHandle) -> Result<(), ActorError> {
        if !self.actors.is_alive(actor) {
            return Err(ActorError::StaleActor { actor });
        }
        let Some(ty) = self.registry.lookup::<T>() else {
            return Ok(());
        };
        let slot = actor.index();
        let old_mask = self.masks.mask(slot);
        if !old_mask.contains(ty) {
            return Ok(());
        }
        if let Some(map) = self.maps.get_mut(ty.bit_index()).and_then(Option::as_mut) {
            map.remove_slot(slot);
        }
        self.masks.remove(slot, ty);
        let new_mask = self.masks.mask(slot);
        self.refresh_memberships(actor, old_mask, new_mask);
        Ok(())
    }

    /// The actor's current component mask; the empty mask for stale handles.
    pub fn component_mask(&self, actor: ActorHandle) -> ComponentMask {
        if self.actors.is_alive(actor) {
            self.masks.mask(actor.index())
        } else {
            ComponentMask::EMPTY
        }
    }

    // -- queries and iteration ----------------------------------------------

    /// Read view over all live actors. Backed directly by the slot table:
    /// free slots fail the liveness check and the free count keeps `count()`
    /// O(1).
    pub fn actors(&self) -> IterableActorSet<'_> {
        IterableActorSet::new(self.actors.slots(), &self.actors, self.actors.free_count())
    }

    /// Read view over the actors matching `family`. The membership set is
    /// built on first query by scanning live actors and is kept incrementally
    /// up to date afterwards, for the lifetime of the manager.
    pub fn actors_for(&mut self, family: Family) -> IterableActorSet<'_> {
        self.ensure_family(family);
        let set = &self.families[&family];
        IterableActorSet::new(set.slots(), &self.actors, set.free_count())
    }

    /// Visit every live actor, lending the manager to the callback so it can
    /// mutate structure mid-pass.
    ///
    /// The slot range is snapshotted once at call start and walked in
    /// reverse, and liveness is re-checked immediately before each call:
    /// the callback may destroy the visited actor (or any other), add or
    /// remove components, and create new actors. Created actors land on
    /// appended slots beyond the snapshot and are not visited in this pass;
    /// a creation that recycles a freed slot below the cursor is.
    pub fn each_actor<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut ActorManager, ActorHandle),
    {
        let len = self.actors.slot_count();
        for index in (0..len).rev() {
            let handle = self.actors.slots()[index];
            if handle.index() as usize == index && self.actors.is_alive(handle) {
                f(self, handle);
            }
        }
    }

    /// Visit every actor matching `family`, with the same mutation tolerance
    /// as [`each_actor`](Self::each_actor).
    pub fn each_actor_for<F>(&mut self, family: Family, mut f: F)
    where
        F: FnMut(&mut ActorManager, ActorHandle),
    {
        let len = self.ensure_family(family).len();
        for index in (0..len).rev() {
            let Some(handle) = self.families.get(&family).and_then(|set| set.slot(index)) else {
                continue;
            };
            if self.actors.is_alive(handle) {
                f(self, handle);
            }
        }
    }

    // -- internals ----------------------------------------------------------

    /// Build the membership set for `family` if this is its first query.
    fn ensure_family(&mut self, family: Family) -> &mut FamilyActorSet {
        if !self.families.contains_key(&family) {
            let mut set = FamilyActorSet::new();
            for &handle in self.actors.slots() {
                if self.actors.is_alive(handle)
                    && family.matches(self.masks.mask(handle.index()))
                {
                    set.add(handle);
                }
            }
            tracing::debug!(members = set.len(), "materialized family cache");
            self.families.insert(family, set);
        }
        self.families
            .get_mut(&family)
            .expect("family cache was just ensured")
    }

    /// Re-evaluate every cached family for one actor whose mask changed from
    /// `old_mask` to `new_mask`.
    fn refresh_memberships(
        &mut self,
        actor: ActorHandle,
        old_mask: ComponentMask,
        new_mask: ComponentMask,
    ) {
        for (family, set) in &mut self.families {
            let was_member = family.matches(old_mask);
            let is_member = family.matches(new_mask);
            if is_member && !was_member {
                set.add(actor);
            } else if was_member && !is_member {
                set.remove(actor);
            }
        }
    }
}

impl Default for ActorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActorManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorManager")
            .field("actor_count", &self.actors.alive_count())
            .field("component_types", &self.registry.len())
            .field("family_caches", &self.families.len())
            .finish()
    }
}

/// Downcast the erased map for a registered type back to its concrete
/// storage. Free function so callers can keep other `self` borrows live.
fn typed_map_mut<T: Component>(
    maps: &mut [Option<Box<dyn AnyComponentMap>>],
    ty: ComponentType,
) -> &mut ComponentMap<T> {
    maps[ty.bit_index()]
        .as_mut()
        .and_then(|map| map.as_any_mut().downcast_mut::<ComponentMap<T>>())
        .expect("component map exists for a registered type")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
