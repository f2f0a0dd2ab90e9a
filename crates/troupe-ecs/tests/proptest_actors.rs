//! Property tests for actor and family operations.
//!
//! These tests use `proptest` to generate random sequences of operations and
//! verify that the manager's invariants hold after each one: live handles
//! occupy distinct slots, the live count matches external tracking, and
//! every cached family set agrees with a fresh mask evaluation.

use proptest::prelude::*;
use troupe_ecs::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Pos {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Vel {
    dx: f32,
    dy: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Tag(u32);

/// Operations we can perform on the manager.
#[derive(Debug, Clone)]
enum ActorOp {
    Create,
    Destroy(usize),
    AddPos(usize, f32, f32),
    AddVel(usize, f32, f32),
    RemoveVel(usize),
    AddTag(usize, u32),
    RemoveTag(usize),
}

/// Strategy that generates finite (non-NaN, non-Inf) f32 values.
fn finite_f32() -> impl Strategy<Value = f32> {
    (-1_000_000i32..1_000_000i32).prop_map(|v| v as f32 * 0.01)
}

fn actor_op_strategy() -> impl Strategy<Value = ActorOp> {
    prop_oneof![
        Just(ActorOp::Create),
        (0..100usize).prop_map(ActorOp::Destroy),
        (0..100usize, finite_f32(), finite_f32())
            .prop_map(|(i, x, y)| ActorOp::AddPos(i, x, y)),
        (0..100usize, finite_f32(), finite_f32())
            .prop_map(|(i, dx, dy)| ActorOp::AddVel(i, dx, dy)),
        (0..100usize).prop_map(ActorOp::RemoveVel),
        (0..100usize, 0..10u32).prop_map(|(i, t)| ActorOp::AddTag(i, t)),
        (0..100usize).prop_map(ActorOp::RemoveTag),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_500))]

    #[test]
    fn random_ops_preserve_invariants(ops in prop::collection::vec(actor_op_strategy(), 1..60)) {
        let mut manager = ActorManager::new();
        let movers = manager.family().all::<Pos>().all::<Vel>().build();
        let tagged = manager.family().one::<Tag>().exclude::<Vel>().build();
        let families = [movers, tagged];

        let mut alive: Vec<ActorHandle> = Vec::new();

        for op in ops {
            match op {
                ActorOp::Create => {
                    alive.push(manager.create_actor());
                }
                ActorOp::Destroy(idx) => {
                    if !alive.is_empty() {
                        let idx = idx % alive.len();
                        let handle = alive.remove(idx);
                        prop_assert!(manager.destroy_actor(handle));
                    }
                }
                ActorOp::AddPos(idx, x, y) => {
                    if !alive.is_empty() {
                        let idx = idx % alive.len();
                        manager.add_component(alive[idx], Pos { x, y }).unwrap();
                    }
                }
                ActorOp::AddVel(idx, dx, dy) => {
                    if !alive.is_empty() {
                        let idx = idx % alive.len();
                        manager.add_component(alive[idx], Vel { dx, dy }).unwrap();
                    }
                }
                ActorOp::RemoveVel(idx) => {
                    if !alive.is_empty() {
                        let idx = idx % alive.len();
                        manager.remove_component::<Vel>(alive[idx]).unwrap();
                    }
                }
                ActorOp::AddTag(idx, t) => {
                    if !alive.is_empty() {
                        let idx = idx % alive.len();
                        manager.add_component(alive[idx], Tag(t)).unwrap();
                    }
                }
                ActorOp::RemoveTag(idx) => {
                    if !alive.is_empty() {
                        let idx = idx % alive.len();
                        manager.remove_component::<Tag>(alive[idx]).unwrap();
                    }
                }
            }

            // Invariant: the live count matches our tracking, through both
            // the manager and the all-actors view.
            prop_assert_eq!(manager.actor_count(), alive.len());
            prop_assert_eq!(manager.actors().count(), alive.len());

            // Invariant: every tracked handle is alive and slots are
            // pairwise distinct.
            let mut indices: Vec<u32> = Vec::with_capacity(alive.len());
            for &handle in &alive {
                prop_assert!(manager.is_actor_alive(handle));
                indices.push(handle.index());
            }
            indices.sort();
            indices.dedup();
            prop_assert_eq!(indices.len(), alive.len());

            // Invariant: cached family membership equals a fresh evaluation
            // of the actor's mask, for every family ever queried.
            for &family in &families {
                for &handle in &alive {
                    let matches = family.matches(manager.component_mask(handle));
                    prop_assert_eq!(matches, manager.actors_for(family).contains(handle));
                }
            }
        }
    }

    /// Generational handles must catch stale references immediately, even
    /// after their slots are recycled by new creations.
    #[test]
    fn stale_handles_detected_after_destroy_and_recycle(
        create_count in 1..20usize,
        destroy_indices in prop::collection::vec(0..20usize, 1..10),
    ) {
        let mut manager = ActorManager::new();

        let mut handles: Vec<ActorHandle> = Vec::new();
        for i in 0..create_count {
            let handle = manager.create_actor();
            manager.add_component(handle, Pos { x: i as f32, y: 0.0 }).unwrap();
            handles.push(handle);
        }

        let mut stale: Vec<ActorHandle> = Vec::new();
        for &idx in &destroy_indices {
            if !handles.is_empty() {
                let idx = idx % handles.len();
                let handle = handles.remove(idx);
                manager.destroy_actor(handle);
                stale.push(handle);
            }
        }

        // Refill so the freed slots get recycled.
        for _ in 0..stale.len() {
            handles.push(manager.create_actor());
        }

        for &old in &stale {
            prop_assert!(!manager.is_actor_alive(old));
            prop_assert_eq!(manager.get_component::<Pos>(old), None);
            prop_assert!(manager.component_mask(old).is_empty());
        }
        for &handle in &handles {
            prop_assert!(manager.is_actor_alive(handle));
        }
    }

    /// Destroying and recreating on the same slot always moves the version
    /// strictly forward.
    #[test]
    fn recycling_strictly_increases_versions(cycles in 1..30usize) {
        let mut manager = ActorManager::new();
        let mut handle = manager.create_actor();
        for _ in 0..cycles {
            let old = handle;
            manager.destroy_actor(old);
            handle = manager.create_actor();
            prop_assert_eq!(handle.index(), old.index());
            prop_assert!(handle.version() > old.version());
        }
    }
}
