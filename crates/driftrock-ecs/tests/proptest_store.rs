//! Property tests for the entity arena and command buffer.
//!
//! Random sequences of inserts and removals must keep the arena consistent:
//! live handles resolve, removed handles never resolve again (even after
//! their slot is reused), and iteration is always in ascending slot order.

use driftrock_ecs::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum StoreOp {
    Insert(u32),
    Remove(usize),
    RemoveStale(usize),
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        3 => any::<u32>().prop_map(StoreOp::Insert),
        2 => (0..64usize).prop_map(StoreOp::Remove),
        1 => (0..64usize).prop_map(StoreOp::RemoveStale),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn random_ops_preserve_arena_invariants(ops in prop::collection::vec(store_op_strategy(), 1..80)) {
        let mut store = EntityStore::new();
        let mut alive: Vec<(EntityId, u32)> = Vec::new();
        let mut dead: Vec<EntityId> = Vec::new();

        for op in ops {
            match op {
                StoreOp::Insert(value) => {
                    let id = store.insert(value);
                    prop_assert!(!alive.iter().any(|(a, _)| *a == id), "handle reissued while alive");
                    prop_assert!(!dead.contains(&id), "dead handle reissued");
                    alive.push((id, value));
                }
                StoreOp::Remove(i) => {
                    if alive.is_empty() {
                        continue;
                    }
                    let (id, value) = alive.remove(i % alive.len());
                    prop_assert_eq!(store.remove(id), Some(value));
                    dead.push(id);
                }
                StoreOp::RemoveStale(i) => {
                    if dead.is_empty() {
                        continue;
                    }
                    let id = dead[i % dead.len()];
                    prop_assert_eq!(store.remove(id), None);
                    prop_assert!(store.try_get(id).is_err());
                }
            }

            prop_assert_eq!(store.len(), alive.len());
            for (id, value) in &alive {
                prop_assert_eq!(store.get(*id), Some(value));
            }
            for id in &dead {
                prop_assert!(!store.contains(*id));
            }
            let indices: Vec<u32> = store.iter().map(|(id, _)| id.index()).collect();
            prop_assert!(indices.windows(2).all(|w| w[0] < w[1]), "iteration not in slot order");
        }
    }

    #[test]
    fn destroy_intents_apply_once_in_fifo_order(targets in prop::collection::vec(0..8usize, 0..24)) {
        let mut store = EntityStore::new();
        let ids: Vec<EntityId> = (0..8u32).map(|v| store.insert(v)).collect();

        struct Target<'a>(&'a mut EntityStore<u32>);
        impl CommandTarget<u32> for Target<'_> {
            fn spawn(&mut self, value: u32) -> EntityId {
                self.0.insert(value)
            }
            fn destroy(&mut self, entity: EntityId) -> bool {
                self.0.remove(entity).is_some()
            }
        }

        let mut buffer = CommandBuffer::new();
        for &t in &targets {
            buffer.destroy(ids[t], CausalReason::GameRule("prop".to_owned()));
        }
        let applied = buffer.apply(&mut Target(&mut store));

        let mut unique = targets.clone();
        unique.sort_unstable();
        unique.dedup();
        let report = buffer.last_apply_report();
        prop_assert_eq!(report.destroyed, unique.len());
        prop_assert_eq!(report.skipped, targets.len() - unique.len());
        prop_assert_eq!(store.len(), 8 - unique.len());
        prop_assert_eq!(applied.len(), targets.len());
        for (command, &t) in applied.iter().zip(&targets) {
            prop_assert_eq!(command.target, Some(ids[t]));
        }
        prop_assert!(buffer.is_empty());
    }
}
