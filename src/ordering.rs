use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::database::DatabaseManager;
use crate::error::ProjectsError;

/// One member of a sibling set as seen by the planner: its identity and the
/// position currently stored for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked {
    pub uuid: Uuid,
    pub position: Option<i32>,
}

/// A position write the planner decided is necessary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub uuid: Uuid,
    pub position: i32,
}

/// Relocates `target` within its sibling set and renumbers the whole set into
/// a dense zero-based sequence.
///
/// The target is removed from the ordered sibling list (it may be absent, as
/// with a freshly inserted row that has no position yet), the requested index
/// is clamped to the remaining length, and the target is splice-inserted
/// there. Every member is then assigned its list index as position; only
/// members whose stored position differs are returned, so repeating the same
/// call yields an empty plan.
pub fn plan_reorder(siblings: Vec<Ranked>, target: Ranked, new_index: usize) -> Vec<Placement> {
    let mut ordered: Vec<Ranked> = siblings
        .into_iter()
        .filter(|item| item.uuid != target.uuid)
        .collect();

    let index = new_index.min(ordered.len());
    ordered.insert(index, target);

    assign(ordered)
}

/// Renumbers the sibling set in its current order without relocating anyone.
/// Used after a removal to close the gap; also heals any stored
/// inconsistency, since every member is reassigned from scratch.
pub fn plan_compact(siblings: Vec<Ranked>) -> Vec<Placement> {
    assign(siblings)
}

fn assign(ordered: Vec<Ranked>) -> Vec<Placement> {
    ordered
        .into_iter()
        .enumerate()
        .filter(|(index, item)| item.position != Some(*index as i32))
        .map(|(index, item)| Placement {
            uuid: item.uuid,
            position: index as i32,
        })
        .collect()
}

/// Applies reorder plans against the store. Reorders for the same parent are
/// serialized through a per-parent mutex so two concurrent calls cannot
/// interleave their fetch and write phases; all position writes of one plan
/// are awaited together and any failure fails the whole reorder.
pub struct OrderingEngine {
    database: Arc<DatabaseManager>,
    parent_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl OrderingEngine {
    pub fn new(database: Arc<DatabaseManager>) -> Self {
        Self {
            database,
            parent_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn parent_lock(&self, parent: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.parent_locks.lock().await;
        locks.entry(parent).or_default().clone()
    }

    pub async fn reorder_experiment(
        &self,
        project_id: Uuid,
        experiment_id: Uuid,
        new_index: usize,
    ) -> Result<(), ProjectsError> {
        let lock = self.parent_lock(project_id).await;
        let _guard = lock.lock().await;

        let siblings: Vec<Ranked> = self
            .database
            .list_positioned_experiments(project_id)
            .await?
            .into_iter()
            .map(|row| Ranked {
                uuid: row.uuid,
                position: row.position,
            })
            .collect();

        let target = siblings
            .iter()
            .find(|item| item.uuid == experiment_id)
            .cloned()
            .unwrap_or(Ranked {
                uuid: experiment_id,
                position: None,
            });

        let plan = plan_reorder(siblings, target, new_index);
        info!(
            "Reordering experiment {} in project {} to index {}: {} positions to write",
            experiment_id,
            project_id,
            new_index,
            plan.len()
        );

        self.persist(plan).await
    }

    pub async fn compact_experiments(&self, project_id: Uuid) -> Result<(), ProjectsError> {
        let lock = self.parent_lock(project_id).await;
        let _guard = lock.lock().await;

        let siblings: Vec<Ranked> = self
            .database
            .list_positioned_experiments(project_id)
            .await?
            .into_iter()
            .map(|row| Ranked {
                uuid: row.uuid,
                position: row.position,
            })
            .collect();

        let plan = plan_compact(siblings);
        info!(
            "Compacting experiment positions in project {}: {} positions to write",
            project_id,
            plan.len()
        );

        self.persist(plan).await
    }

    async fn persist(&self, plan: Vec<Placement>) -> Result<(), ProjectsError> {
        let writes = plan.iter().map(|placement| {
            self.database
                .set_experiment_position(placement.uuid, placement.position)
        });
        futures::future::try_join_all(writes).await?;
        Ok(())
    }
}
