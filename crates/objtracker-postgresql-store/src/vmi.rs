use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use objtracker_core::{
    models::{MigrationState, Vmi},
    with_deadline, Persistence, StoreResult, VmiPersistence,
};

use crate::error::map_sqlx_error;

const VMI_COLUMNS: &str =
    "uuid, name, namespace, reason, phase, node_name, creation_time, migration_state, content";

#[derive(Debug, sqlx::FromRow)]
struct VmiRow {
    uuid: String,
    name: String,
    namespace: String,
    reason: String,
    phase: String,
    node_name: String,
    creation_time: DateTime<Utc>,
    migration_state: Option<Json<MigrationState>>,
    content: serde_json::Value,
}

impl From<VmiRow> for Vmi {
    fn from(row: VmiRow) -> Self {
        Self {
            name: row.name,
            namespace: row.namespace,
            uuid: row.uuid,
            reason: row.reason,
            phase: row.phase,
            node_name: row.node_name,
            creation_time: row.creation_time,
            migration_state: row.migration_state.map(|state| state.0),
            content: row.content,
        }
    }
}

#[derive(Debug)]
pub struct VmiRelationalPersistence {
    pub(crate) db: Arc<PgPool>,
    pub(crate) deadline: Duration,
}

#[async_trait]
impl Persistence<Vmi> for VmiRelationalPersistence {
    #[tracing::instrument(name = "relational::vmi::upsert", skip_all, fields(uuid = %vmi.uuid))]
    async fn upsert(&self, vmi: &Vmi) -> StoreResult<u64> {
        let vmi = vmi.clone().with_canonical_timestamps();

        with_deadline("relational::vmi::upsert", self.deadline, async {
            let result = sqlx::query(
                r#"
                INSERT INTO vmis
                   (uuid, name, namespace, reason, phase, node_name, creation_time,
                    migration_state, content)
                VALUES
                   ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (uuid) DO UPDATE SET
                   name = EXCLUDED.name,
                   namespace = EXCLUDED.namespace,
                   reason = EXCLUDED.reason,
                   phase = EXCLUDED.phase,
                   node_name = EXCLUDED.node_name,
                   creation_time = EXCLUDED.creation_time,
                   migration_state = EXCLUDED.migration_state,
                   content = EXCLUDED.content
                "#,
            )
            .bind(&vmi.uuid)
            .bind(&vmi.name)
            .bind(&vmi.namespace)
            .bind(&vmi.reason)
            .bind(&vmi.phase)
            .bind(&vmi.node_name)
            .bind(vmi.creation_time)
            .bind(vmi.migration_state.as_ref().map(Json))
            .bind(&vmi.content)
            .execute(&*self.db)
            .await
            .map_err(map_sqlx_error)?;

            Ok(result.rows_affected())
        })
        .await
    }

    #[tracing::instrument(name = "relational::vmi::get_by_id", skip_all)]
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Vmi>> {
        with_deadline("relational::vmi::get_by_id", self.deadline, async {
            let row = sqlx::query_as::<_, VmiRow>(&format!(
                "SELECT {VMI_COLUMNS} FROM vmis WHERE uuid = $1"
            ))
            .bind(id)
            .fetch_optional(&*self.db)
            .await
            .map_err(map_sqlx_error)?;

            Ok(row.map(Vmi::from))
        })
        .await
    }
}

#[async_trait]
impl VmiPersistence for VmiRelationalPersistence {
    #[tracing::instrument(name = "relational::vmi::get_by_name", skip_all)]
    async fn get_by_name(&self, name: &str, namespace: &str) -> StoreResult<Option<Vmi>> {
        with_deadline("relational::vmi::get_by_name", self.deadline, async {
            let row = sqlx::query_as::<_, VmiRow>(&format!(
                "SELECT {VMI_COLUMNS} FROM vmis WHERE name = $1 AND namespace = $2 \
                 ORDER BY uuid LIMIT 1"
            ))
            .bind(name)
            .bind(namespace)
            .fetch_optional(&*self.db)
            .await
            .map_err(map_sqlx_error)?;

            Ok(row.map(Vmi::from))
        })
        .await
    }
}
