//! Troupe ECS -- archetype-free, bitmask-based Entity-Component-Actor system.
//!
//! Actors are generational handles into a slot table; components live in
//! per-type dense maps keyed by slot index; a per-slot bitmask records which
//! types each actor carries. Queries are [`Family`](family::Family) values
//! (all-of / one-of / none-of over component bits) whose membership sets are
//! cached and updated incrementally on every structural change, so
//! per-frame iteration never rescans the world.
//!
//! # Quick Start
//!
//! ```
//! use troupe_ecs::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut manager = ActorManager::new();
//! let actor = manager.create_actor();
//! manager.add_component(actor, Position { x: 0.0, y: 0.0 }).unwrap();
//! manager.add_component(actor, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
//!
//! let movers = manager.family().all::<Position>().all::<Velocity>().build();
//! manager.each_actor_for(movers, |m, actor| {
//!     let vel = *m.get_component::<Velocity>(actor).unwrap();
//!     let pos = m.get_component_mut::<Position>(actor).unwrap();
//!     pos.x += vel.dx;
//!     pos.y += vel.dy;
//! });
//!
//! assert_eq!(
//!     manager.get_component::<Position>(actor),
//!     Some(&Position { x: 1.0, y: 0.0 })
//! );
//! ```

#![deny(unsafe_code)]

pub mod actor;
pub mod component;
pub mod family;
pub mod manager;
pub mod set;
pub mod storage;

use crate::actor::ActorHandle;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by actor/component operations.
///
/// Only conditions a caller can reasonably hit with a stored handle surface
/// here; programmer errors (the 65th component type) panic instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
    /// The handle's slot no longer stores this exact handle (destroyed,
    /// recycled, or never created).
    #[error("actor {actor} is not alive (stale handle or never created)")]
    StaleActor { actor: ActorHandle },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::actor::ActorHandle;
    pub use crate::component::{Component, ComponentMask, ComponentType, MAX_COMPONENT_TYPES};
    pub use crate::family::{Family, FamilyBuilder};
    pub use crate::manager::ActorManager;
    pub use crate::set::IterableActorSet;
    pub use crate::ActorError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
