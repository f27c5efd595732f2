use std::sync::Arc;

use objtracker_core::{
    models::{Migration, Pod, Vmi},
    Persistence, PodPersistence, StoreError, StoreResult, VmiPersistence,
};

use super::linker::{LinkOutcome, MigrationLinker};

/// Entry point for the watcher. Every upsert is keyed by UUID and replaces
/// the stored row.
pub struct IngestService {
    pub pod_persistence: Arc<dyn PodPersistence>,
    pub vmi_persistence: Arc<dyn VmiPersistence>,
    pub migration_persistence: Arc<dyn Persistence<Migration>>,

    pub linker: MigrationLinker,
}

impl IngestService {
    #[tracing::instrument(name = "service::ingest::upsert_pod", skip_all, fields(uuid = %pod.uuid))]
    pub async fn upsert_pod(&self, pod: &Pod) -> StoreResult<u64> {
        self.pod_persistence.upsert(pod).await
    }

    /// Stores the vmi, then runs the auto-linker as a separate step. A linker
    /// failure is logged and reported in the outcome; it never fails the upsert.
    #[tracing::instrument(name = "service::ingest::upsert_vmi", skip_all, fields(uuid = %vmi.uuid))]
    pub async fn upsert_vmi(&self, vmi: &Vmi) -> StoreResult<LinkOutcome> {
        self.vmi_persistence.upsert(vmi).await?;

        let outcome = match self.linker.sync(vmi).await {
            Ok(outcome) => outcome,
            Err(error) => {
                let migration_uuid = vmi
                    .active_migration_state()
                    .map(|state| state.migration_uid.clone())
                    .unwrap_or_default();

                let error = StoreError::SyncSwallowed {
                    migration_uuid,
                    source: Box::new(error),
                };

                tracing::warn!(%error, "migration sync skipped");

                LinkOutcome::Swallowed(error)
            }
        };

        Ok(outcome)
    }

    #[tracing::instrument(
        name = "service::ingest::upsert_migration",
        skip_all,
        fields(uuid = %migration.uuid)
    )]
    pub async fn upsert_migration(&self, migration: &Migration) -> StoreResult<u64> {
        self.migration_persistence.upsert(migration).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use objtracker_core::test::{
        get_migration_fixture, get_migration_state_fixture, get_pod_fixture, get_vmi_fixture,
    };
    use objtracker_memory_store::MemoryStore;

    use super::*;

    struct UnreachableMigrations;

    #[async_trait]
    impl Persistence<Migration> for UnreachableMigrations {
        async fn upsert(&self, _: &Migration) -> StoreResult<u64> {
            Err(StoreError::Connectivity("connection refused".to_string()))
        }

        async fn get_by_id(&self, _: &str) -> StoreResult<Option<Migration>> {
            Err(StoreError::Connectivity("connection refused".to_string()))
        }
    }

    fn ingest_service(
        store: &MemoryStore,
        migrations: Arc<dyn Persistence<Migration>>,
    ) -> IngestService {
        IngestService {
            pod_persistence: Arc::new(store.pods()),
            vmi_persistence: Arc::new(store.vmis()),
            migration_persistence: Arc::clone(&migrations),
            linker: MigrationLinker {
                persistence: migrations,
            },
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_latest_payload() {
        let store = MemoryStore::default();
        let ingest_service = ingest_service(&store, Arc::new(store.migrations()));

        let mut pod = get_pod_fixture(None);
        ingest_service.upsert_pod(&pod).await.unwrap();

        pod.content = serde_json::json!({ "revision": 2 });
        ingest_service.upsert_pod(&pod).await.unwrap();

        let fetched_pod = store.pods().get_by_id(&pod.uuid).await.unwrap().unwrap();
        assert_eq!(fetched_pod.content, serde_json::json!({ "revision": 2 }));
        assert_eq!(store.pods().list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_vmi_upsert_links_existing_migration() {
        let store = MemoryStore::default();
        let ingest_service = ingest_service(&store, Arc::new(store.migrations()));

        let mut migration = get_migration_fixture(Some("m1"));
        migration.uuid = "X".to_string();
        ingest_service.upsert_migration(&migration).await.unwrap();

        let mut state = get_migration_state_fixture("X");
        state.target_pod = "p2".to_string();
        let mut vmi = get_vmi_fixture(None);
        vmi.migration_state = Some(state);

        let outcome = ingest_service.upsert_vmi(&vmi).await.unwrap();
        assert!(matches!(outcome, LinkOutcome::Linked { .. }));

        let linked = store.migrations().get_by_id("X").await.unwrap().unwrap();
        assert_eq!(linked.name, "m1");
        assert_eq!(linked.phase, "Running");
        assert_eq!(linked.target_pod, "p2");
        assert!(linked.completed);
    }

    #[tokio::test]
    async fn test_sync_failure_does_not_fail_vmi_upsert() {
        let store = MemoryStore::default();
        let ingest_service = ingest_service(&store, Arc::new(UnreachableMigrations));

        let mut vmi = get_vmi_fixture(None);
        vmi.migration_state = Some(get_migration_state_fixture("X"));

        let outcome = ingest_service.upsert_vmi(&vmi).await.unwrap();

        match outcome {
            LinkOutcome::Swallowed(StoreError::SyncSwallowed {
                migration_uuid,
                source,
            }) => {
                assert_eq!(migration_uuid, "X");
                assert!(matches!(*source, StoreError::Connectivity(_)));
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        assert!(store.vmis().get_by_id(&vmi.uuid).await.unwrap().is_some());
    }
}
