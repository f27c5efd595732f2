use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use objtracker_core::{models::Migration, with_deadline, Persistence, StoreResult};

use crate::error::map_sqlx_error;

#[derive(Debug, sqlx::FromRow)]
struct MigrationRow {
    uuid: String,
    name: String,
    namespace: String,
    phase: String,
    vmi_name: String,
    target_pod: String,
    creation_time: DateTime<Utc>,
    end_timestamp: Option<DateTime<Utc>>,
    source_node: String,
    target_node: String,
    completed: bool,
    failed: bool,
    content: serde_json::Value,
}

impl From<MigrationRow> for Migration {
    fn from(row: MigrationRow) -> Self {
        Self {
            name: row.name,
            namespace: row.namespace,
            uuid: row.uuid,
            phase: row.phase,
            vmi_name: row.vmi_name,
            target_pod: row.target_pod,
            creation_time: row.creation_time,
            end_timestamp: row.end_timestamp,
            source_node: row.source_node,
            target_node: row.target_node,
            completed: row.completed,
            failed: row.failed,
            content: row.content,
        }
    }
}

#[derive(Debug)]
pub struct MigrationRelationalPersistence {
    pub(crate) db: Arc<PgPool>,
    pub(crate) deadline: Duration,
}

#[async_trait]
impl Persistence<Migration> for MigrationRelationalPersistence {
    #[tracing::instrument(
        name = "relational::migration::upsert",
        skip_all,
        fields(uuid = %migration.uuid)
    )]
    async fn upsert(&self, migration: &Migration) -> StoreResult<u64> {
        let migration = migration.clone().with_canonical_timestamps();

        with_deadline("relational::migration::upsert", self.deadline, async {
            let result = sqlx::query(
                r#"
                INSERT INTO vmimigrations
                   (uuid, name, namespace, phase, vmi_name, target_pod, creation_time,
                    end_timestamp, source_node, target_node, completed, failed, content)
                VALUES
                   ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                ON CONFLICT (uuid) DO UPDATE SET
                   name = EXCLUDED.name,
                   namespace = EXCLUDED.namespace,
                   phase = EXCLUDED.phase,
                   vmi_name = EXCLUDED.vmi_name,
                   target_pod = EXCLUDED.target_pod,
                   creation_time = EXCLUDED.creation_time,
                   end_timestamp = EXCLUDED.end_timestamp,
                   source_node = EXCLUDED.source_node,
                   target_node = EXCLUDED.target_node,
                   completed = EXCLUDED.completed,
                   failed = EXCLUDED.failed,
                   content = EXCLUDED.content
                "#,
            )
            .bind(&migration.uuid)
            .bind(&migration.name)
            .bind(&migration.namespace)
            .bind(&migration.phase)
            .bind(&migration.vmi_name)
            .bind(&migration.target_pod)
            .bind(migration.creation_time)
            .bind(migration.end_timestamp)
            .bind(&migration.source_node)
            .bind(&migration.target_node)
            .bind(migration.completed)
            .bind(migration.failed)
            .bind(&migration.content)
            .execute(&*self.db)
            .await
            .map_err(map_sqlx_error)?;

            Ok(result.rows_affected())
        })
        .await
    }

    #[tracing::instrument(name = "relational::migration::get_by_id", skip_all)]
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Migration>> {
        with_deadline("relational::migration::get_by_id", self.deadline, async {
            let row = sqlx::query_as::<_, MigrationRow>(
                r#"
                SELECT uuid, name, namespace, phase, vmi_name, target_pod, creation_time,
                       end_timestamp, source_node, target_node, completed, failed, content
                  FROM vmimigrations
                 WHERE uuid = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&*self.db)
            .await
            .map_err(map_sqlx_error)?;

            Ok(row.map(Migration::from))
        })
        .await
    }
}

#[cfg(all(test, feature = "pg-tests"))]
mod tests {
    use objtracker_core::test::get_migration_fixture;

    use super::*;

    #[tokio::test]
    async fn test_upsert_overwrites_row() {
        let store = crate::postgresql::tests::ensure_store().await;
        let migration_persistence = store.migrations();

        let mut migration =
            get_migration_fixture(Some(&format!("migration-{}", uuid::Uuid::new_v4())));
        migration_persistence.upsert(&migration).await.unwrap();

        migration.phase = "Succeeded".to_string();
        migration.completed = true;
        migration_persistence.upsert(&migration).await.unwrap();

        let fetched_migration = migration_persistence
            .get_by_id(&migration.uuid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched_migration, migration);
    }
}
