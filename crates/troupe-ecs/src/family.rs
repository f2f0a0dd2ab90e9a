//! Declarative actor queries.
//!
//! A [`Family`] is an immutable filter over component masks: actors must have
//! every type in the *all* set, at least one type in the *one* set (when it
//! is non-empty), and none of the types in the *exclude* set. Families are
//! cheap value types with `Eq + Hash`, which is what lets the manager key its
//! membership caches by them.
//!
//! Families are built against a specific manager's type registry, so a
//! `Family` is only meaningful for the manager whose builder produced it.

use crate::component::{Component, ComponentMask, ComponentTypeRegistry};

// ---------------------------------------------------------------------------
// Family
// ---------------------------------------------------------------------------

/// An immutable component-mask filter. See the [module docs](self) for the
/// match rule.
///
/// The default family has every mask empty and therefore matches every
/// actor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Family {
    all: ComponentMask,
    one: ComponentMask,
    exclude: ComponentMask,
}

impl Family {
    /// Whether an actor with the given component mask belongs to this
    /// family.
    #[inline]
    pub fn matches(&self, mask: ComponentMask) -> bool {
        mask.bits() & self.all.bits() == self.all.bits()
            && (self.one.is_empty() || mask.bits() & self.one.bits() != 0)
            && mask.bits() & self.exclude.bits() == 0
    }

    /// Types an actor must have, all of them.
    pub fn all(&self) -> ComponentMask {
        self.all
    }

    /// Types an actor must have at least one of (empty = no constraint).
    pub fn one(&self) -> ComponentMask {
        self.one
    }

    /// Types an actor must not have.
    pub fn exclude(&self) -> ComponentMask {
        self.exclude
    }
}

// ---------------------------------------------------------------------------
// FamilyBuilder
// ---------------------------------------------------------------------------

/// Builder for [`Family`] values, obtained from
/// [`ActorManager::family`](crate::manager::ActorManager::family).
///
/// Each constraint method registers the component type if it has never been
/// seen. Calls compose in any order and repeating a type under the same
/// constraint collapses into a single bit.
pub struct FamilyBuilder<'a> {
    registry: &'a mut ComponentTypeRegistry,
    family: Family,
}

impl<'a> FamilyBuilder<'a> {
    pub(crate) fn new(registry: &'a mut ComponentTypeRegistry) -> Self {
        Self {
            registry,
            family: Family::default(),
        }
    }

    /// Require component type `T`.
    pub fn all<T: Component>(mut self) -> Self {
        let ty = self.registry.register::<T>();
        self.family.all = self.family.all.union(ty);
        self
    }

    /// Require at least one of the types passed to `one` calls.
    pub fn one<T: Component>(mut self) -> Self {
        let ty = self.registry.register::<T>();
        self.family.one = self.family.one.union(ty);
        self
    }

    /// Reject actors that have component type `T`.
    pub fn exclude<T: Component>(mut self) -> Self {
        let ty = self.registry.register::<T>();
        self.family.exclude = self.family.exclude.union(ty);
        self
    }

    /// Finish and return the immutable [`Family`] value.
    pub fn build(self) -> Family {
        self.family
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
