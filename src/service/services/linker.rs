use std::sync::Arc;

use objtracker_core::{
    models::{Migration, MigrationState, Vmi},
    Persistence, StoreError, StoreResult,
};

/// What the auto-linker did after a vmi upsert.
#[derive(Debug)]
pub enum LinkOutcome {
    /// The vmi carries no migration state naming a migration.
    NoMigrationState,

    /// The migration named by the vmi has not been stored yet.
    AwaitingMigration { migration_uuid: String },

    /// The stored migration was refreshed from the vmi.
    Linked { migration_uuid: String },

    /// Synchronization failed. The vmi itself was stored.
    Swallowed(StoreError),
}

/// Refreshes `existing` from a vmi's migration state. Identity, phase, the vmi
/// reference and the raw content stay as stored; progress fields come from `state`.
pub fn link_migration(existing: &Migration, state: &MigrationState) -> Migration {
    Migration {
        name: existing.name.clone(),
        namespace: existing.namespace.clone(),
        uuid: state.migration_uid.clone(),
        phase: existing.phase.clone(),
        vmi_name: existing.vmi_name.clone(),
        target_pod: state.target_pod.clone(),
        creation_time: state.start_timestamp.unwrap_or(existing.creation_time),
        end_timestamp: state.end_timestamp,
        source_node: state.source_node.clone(),
        target_node: state.target_node.clone(),
        completed: state.completed,
        failed: state.failed,
        content: existing.content.clone(),
    }
}

pub struct MigrationLinker {
    pub persistence: Arc<dyn Persistence<Migration>>,
}

impl MigrationLinker {
    #[tracing::instrument(name = "service::linker::sync", skip_all, fields(vmi = %vmi.uuid))]
    pub async fn sync(&self, vmi: &Vmi) -> StoreResult<LinkOutcome> {
        let state = match vmi.active_migration_state() {
            Some(state) => state,
            None => return Ok(LinkOutcome::NoMigrationState),
        };

        let migration_uuid = state.migration_uid.clone();

        let existing = match self.persistence.get_by_id(&migration_uuid).await? {
            Some(existing) => existing,
            None => {
                tracing::debug!(%migration_uuid, "migration not stored yet, nothing to link");
                return Ok(LinkOutcome::AwaitingMigration { migration_uuid });
            }
        };

        let linked = link_migration(&existing, state);
        self.persistence.upsert(&linked).await?;

        tracing::info!(%migration_uuid, "migration linked from vmi state");

        Ok(LinkOutcome::Linked { migration_uuid })
    }
}
