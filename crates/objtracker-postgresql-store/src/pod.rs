use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use objtracker_core::{
    models::Pod, timestamp, with_deadline, CreationWindow, Persistence, PodPersistence,
    StoreResult,
};

use crate::error::map_sqlx_error;

const POD_COLUMNS: &str = "uuid, key_id, kind, name, namespace, phase, active_containers, \
     total_containers, node_name, creation_time, content, created_by";

#[derive(Debug, sqlx::FromRow)]
struct PodRow {
    uuid: String,
    key_id: String,
    kind: String,
    name: String,
    namespace: String,
    phase: String,
    active_containers: i32,
    total_containers: i32,
    node_name: String,
    creation_time: DateTime<Utc>,
    content: serde_json::Value,
    created_by: String,
}

impl From<PodRow> for Pod {
    fn from(row: PodRow) -> Self {
        Self {
            key: row.key_id,
            kind: row.kind,
            name: row.name,
            namespace: row.namespace,
            uuid: row.uuid,
            phase: row.phase,
            active_containers: row.active_containers,
            total_containers: row.total_containers,
            node_name: row.node_name,
            creation_time: row.creation_time,
            content: row.content,
            created_by: row.created_by,
        }
    }
}

/// `LIKE` pattern matching names that start with `prefix` literally.
fn prefix_pattern(prefix: &str) -> String {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("{escaped}%")
}

#[derive(Debug)]
pub struct PodRelationalPersistence {
    pub(crate) db: Arc<PgPool>,
    pub(crate) deadline: Duration,
}

#[async_trait]
impl Persistence<Pod> for PodRelationalPersistence {
    #[tracing::instrument(name = "relational::pod::upsert", skip_all, fields(uuid = %pod.uuid))]
    async fn upsert(&self, pod: &Pod) -> StoreResult<u64> {
        with_deadline("relational::pod::upsert", self.deadline, async {
            let result = sqlx::query(
                r#"
                INSERT INTO pods
                   (uuid, key_id, kind, name, namespace, phase, active_containers,
                    total_containers, node_name, creation_time, content, created_by)
                VALUES
                   ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (uuid) DO UPDATE SET
                   key_id = EXCLUDED.key_id,
                   kind = EXCLUDED.kind,
                   name = EXCLUDED.name,
                   namespace = EXCLUDED.namespace,
                   phase = EXCLUDED.phase,
                   active_containers = EXCLUDED.active_containers,
                   total_containers = EXCLUDED.total_containers,
                   node_name = EXCLUDED.node_name,
                   creation_time = EXCLUDED.creation_time,
                   content = EXCLUDED.content,
                   created_by = EXCLUDED.created_by
                "#,
            )
            .bind(&pod.uuid)
            .bind(&pod.key)
            .bind(&pod.kind)
            .bind(&pod.name)
            .bind(&pod.namespace)
            .bind(&pod.phase)
            .bind(pod.active_containers)
            .bind(pod.total_containers)
            .bind(&pod.node_name)
            .bind(timestamp::truncate(pod.creation_time))
            .bind(&pod.content)
            .bind(&pod.created_by)
            .execute(&*self.db)
            .await
            .map_err(map_sqlx_error)?;

            Ok(result.rows_affected())
        })
        .await
    }

    #[tracing::instrument(name = "relational::pod::get_by_id", skip_all)]
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Pod>> {
        with_deadline("relational::pod::get_by_id", self.deadline, async {
            let row = sqlx::query_as::<_, PodRow>(&format!(
                "SELECT {POD_COLUMNS} FROM pods WHERE uuid = $1"
            ))
            .bind(id)
            .fetch_optional(&*self.db)
            .await
            .map_err(map_sqlx_error)?;

            Ok(row.map(Pod::from))
        })
        .await
    }
}

#[async_trait]
impl PodPersistence for PodRelationalPersistence {
    #[tracing::instrument(name = "relational::pod::get_by_name", skip_all)]
    async fn get_by_name(&self, name: &str, namespace: &str) -> StoreResult<Option<Pod>> {
        with_deadline("relational::pod::get_by_name", self.deadline, async {
            let row = sqlx::query_as::<_, PodRow>(&format!(
                "SELECT {POD_COLUMNS} FROM pods WHERE name = $1 AND namespace = $2 \
                 ORDER BY uuid LIMIT 1"
            ))
            .bind(name)
            .bind(namespace)
            .fetch_optional(&*self.db)
            .await
            .map_err(map_sqlx_error)?;

            Ok(row.map(Pod::from))
        })
        .await
    }

    #[tracing::instrument(name = "relational::pod::get_earliest_created_by", skip_all)]
    async fn get_earliest_created_by(
        &self,
        created_by: &str,
        node_name: &str,
        window: Option<CreationWindow>,
    ) -> StoreResult<Option<Pod>> {
        with_deadline(
            "relational::pod::get_earliest_created_by",
            self.deadline,
            async {
                let row = match window {
                    Some(window) => {
                        sqlx::query_as::<_, PodRow>(&format!(
                            "SELECT {POD_COLUMNS} FROM pods \
                             WHERE created_by = $1 AND node_name = $2 \
                             AND creation_time BETWEEN $3 AND $4 \
                             ORDER BY creation_time ASC, uuid ASC LIMIT 1"
                        ))
                        .bind(created_by)
                        .bind(node_name)
                        .bind(timestamp::truncate(window.start))
                        .bind(timestamp::truncate(window.end))
                        .fetch_optional(&*self.db)
                        .await
                    }
                    None => {
                        sqlx::query_as::<_, PodRow>(&format!(
                            "SELECT {POD_COLUMNS} FROM pods \
                             WHERE created_by = $1 AND node_name = $2 \
                             ORDER BY creation_time ASC, uuid ASC LIMIT 1"
                        ))
                        .bind(created_by)
                        .bind(node_name)
                        .fetch_optional(&*self.db)
                        .await
                    }
                }
                .map_err(map_sqlx_error)?;

                Ok(row.map(Pod::from))
            },
        )
        .await
    }

    #[tracing::instrument(name = "relational::pod::get_by_name_prefix_on_node", skip_all)]
    async fn get_by_name_prefix_on_node(
        &self,
        node_name: &str,
        name_prefix: &str,
    ) -> StoreResult<Option<Pod>> {
        with_deadline(
            "relational::pod::get_by_name_prefix_on_node",
            self.deadline,
            async {
                let row = sqlx::query_as::<_, PodRow>(&format!(
                    "SELECT {POD_COLUMNS} FROM pods WHERE node_name = $1 AND name LIKE $2 \
                     ORDER BY name ASC, uuid ASC LIMIT 1"
                ))
                .bind(node_name)
                .bind(prefix_pattern(name_prefix))
                .fetch_optional(&*self.db)
                .await
                .map_err(map_sqlx_error)?;

                Ok(row.map(Pod::from))
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_pattern_escapes_wildcards() {
        assert_eq!(prefix_pattern("virt-handler"), "virt-handler%");
        assert_eq!(prefix_pattern("agent_%"), "agent\\_\\%%");
    }

    #[cfg(feature = "pg-tests")]
    #[tokio::test]
    async fn test_upsert_get_by_name() {
        use objtracker_core::test::get_pod_fixture;

        let store = crate::postgresql::tests::ensure_store().await;
        let pod_persistence = store.pods();

        let mut pod = get_pod_fixture(Some(&format!("pod-{}", uuid::Uuid::new_v4())));
        pod_persistence.upsert(&pod).await.unwrap();

        pod.phase = "Succeeded".to_string();
        let affected = pod_persistence.upsert(&pod).await.unwrap();
        assert_eq!(affected, 1);

        let fetched_pod = pod_persistence
            .get_by_name(&pod.name, &pod.namespace)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched_pod.uuid, pod.uuid);
        assert_eq!(fetched_pod.phase, "Succeeded");
        assert_eq!(fetched_pod.creation_time, pod.creation_time);
    }

    #[cfg(feature = "pg-tests")]
    #[tokio::test]
    async fn test_earliest_created_by_respects_window_and_ties() {
        use objtracker_core::test::{fixture_time, get_pod_fixture};

        let store = crate::postgresql::tests::ensure_store().await;
        let pod_persistence = store.pods();

        let run = uuid::Uuid::new_v4();
        let created_by = format!("vmi-{run}");
        let node_name = format!("node-{run}");

        let launcher = |suffix: &str, seconds: i64| {
            let mut pod = get_pod_fixture(Some(&format!("launcher-{run}-{suffix}")));
            pod.created_by = created_by.clone();
            pod.node_name = node_name.clone();
            pod.creation_time = fixture_time(seconds);
            pod
        };

        let before = launcher("before", -5);
        let at_end = launcher("at-end", 10);
        let after = launcher("after", 11);

        for pod in [&before, &at_end, &after] {
            pod_persistence.upsert(pod).await.unwrap();
        }

        let window = CreationWindow {
            start: fixture_time(0),
            end: fixture_time(10),
        };

        let found = pod_persistence
            .get_earliest_created_by(&created_by, &node_name, Some(window))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.uuid, at_end.uuid);

        let tied_b = launcher("tied-b", 5);
        let tied_a = launcher("tied-a", 5);
        pod_persistence.upsert(&tied_b).await.unwrap();
        pod_persistence.upsert(&tied_a).await.unwrap();

        let found = pod_persistence
            .get_earliest_created_by(&created_by, &node_name, Some(window))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.uuid, tied_a.uuid);

        let unbounded = pod_persistence
            .get_earliest_created_by(&created_by, &node_name, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unbounded.uuid, before.uuid);
    }

    #[cfg(feature = "pg-tests")]
    #[tokio::test]
    async fn test_name_prefix_picks_lowest_name() {
        use objtracker_core::test::get_node_agent_fixture;

        let store = crate::postgresql::tests::ensure_store().await;
        let pod_persistence = store.pods();

        let node_name = format!("node-{}", uuid::Uuid::new_v4());

        let agent = |name: &str| {
            let mut pod = get_node_agent_fixture(&node_name);
            pod.name = name.to_string();
            pod.uuid = format!("{node_name}-{name}");
            pod
        };

        for name in ["virt-handler-b", "virt-handler-a", "virt_handler-x"] {
            pod_persistence.upsert(&agent(name)).await.unwrap();
        }

        let found = pod_persistence
            .get_by_name_prefix_on_node(&node_name, "virt-handler")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "virt-handler-a");

        // `_` is literal, so only the underscored agent matches.
        let found = pod_persistence
            .get_by_name_prefix_on_node(&node_name, "virt_handler")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "virt_handler-x");

        let missing = pod_persistence
            .get_by_name_prefix_on_node(&node_name, "virt-controller")
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
