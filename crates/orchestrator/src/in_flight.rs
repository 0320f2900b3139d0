//! At-most-one active run per instance id.
//!
//! The platform may deliver the same `component-requested` event more than
//! once. Two concurrent runs would race on the same derived repository name,
//! so a second delivery is refused while the first is still running. Once a
//! run ends (either way) its slot is released and a later delivery is
//! admitted again.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use provisioning::{InstanceId, RunId, Timestamp};

#[derive(Debug, Clone, Copy)]
struct ActiveRun {
    run_id: RunId,
    started_at: Timestamp,
}

/// Registry of instance ids with a run in progress. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<DashMap<InstanceId, ActiveRun>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot for `instance`, or returns `None` if a run already
    /// holds it. The slot is released when the returned guard drops.
    pub fn try_admit(&self, instance: &InstanceId) -> Option<InFlightGuard> {
        match self.active.entry(instance.clone()) {
            Entry::Occupied(existing) => {
                tracing::warn!(
                    instance_id = %instance,
                    active_run_id = %existing.get().run_id,
                    active_since = %existing.get().started_at,
                    "Run already in progress for instance"
                );
                None
            }
            Entry::Vacant(slot) => {
                let run_id = RunId::new_random();
                slot.insert(ActiveRun {
                    run_id,
                    started_at: Timestamp::now(),
                });
                Some(InFlightGuard {
                    active: Arc::clone(&self.active),
                    instance: instance.clone(),
                    run_id,
                })
            }
        }
    }

    pub fn is_active(&self, instance: &InstanceId) -> bool {
        self.active.contains_key(instance)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Proof that the holder owns the run slot for one instance.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<DashMap<InstanceId, ActiveRun>>,
    instance: InstanceId,
    run_id: RunId,
}

impl InFlightGuard {
    pub fn instance(&self) -> &InstanceId {
        &self.instance
    }

    /// Id assigned to the admitted run.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active
            .remove_if(&self.instance, |_, run| run.run_id == self.run_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> InstanceId {
        InstanceId::new(value).expect("non-empty")
    }

    #[test]
    fn test_second_admission_is_refused_while_first_is_held() {
        let registry = InFlightRegistry::new();

        let guard = registry.try_admit(&id("i1")).expect("first admission");
        assert!(registry.try_admit(&id("i1")).is_none());
        assert!(registry.is_active(&id("i1")));

        drop(guard);
        assert!(!registry.is_active(&id("i1")));
        assert!(registry.try_admit(&id("i1")).is_some());
    }

    #[test]
    fn test_distinct_instances_do_not_block_each_other() {
        let registry = InFlightRegistry::new();

        let a = registry.try_admit(&id("a")).expect("a");
        let b = registry.try_admit(&id("b")).expect("b");

        assert_eq!(registry.len(), 2);
        assert_ne!(a.run_id(), b.run_id());
    }
}
