use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use objtracker_core::{with_deadline, StoreResult};

use crate::error::{map_migrate_error, map_sqlx_error};
use crate::{
    MigrationRelationalPersistence, PodRelationalPersistence, RelationalTabularSource,
    VmiRelationalPersistence,
};

#[derive(Clone, Debug)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,

    /// Upper bound for every store call.
    pub deadline: Duration,
}

/// Owns the connection pool. Persistence handles created from it share the
/// pool and stop working once [`PostgresStore::shutdown`] has run.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    db: Arc<PgPool>,
    deadline: Duration,
}

impl PostgresStore {
    #[tracing::instrument(name = "postgresql::connect", skip_all)]
    pub async fn connect(config: &PostgresConfig) -> StoreResult<Self> {
        let db = with_deadline("postgresql::connect", config.deadline, async {
            PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.deadline)
                .connect(&config.database_url)
                .await
                .map_err(map_sqlx_error)
        })
        .await?;

        tracing::info!(max_connections = config.max_connections, "connected to store");

        Ok(Self {
            db: Arc::new(db),
            deadline: config.deadline,
        })
    }

    /// Creates the pods, vmis and vmimigrations relations if they are missing.
    #[tracing::instrument(name = "postgresql::init_tables", skip_all)]
    pub async fn init_tables(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&*self.db)
            .await
            .map_err(map_migrate_error)
    }

    #[tracing::instrument(name = "postgresql::drop_tables", skip_all)]
    pub async fn drop_tables(&self) -> StoreResult<()> {
        with_deadline("postgresql::drop_tables", self.deadline, async {
            sqlx::query(
                r#"
                DROP TABLE IF EXISTS pods, vmis, vmimigrations, _sqlx_migrations
                "#,
            )
            .execute(&*self.db)
            .await
            .map_err(map_sqlx_error)?;

            Ok(())
        })
        .await
    }

    #[tracing::instrument(name = "postgresql::shutdown", skip_all)]
    pub async fn shutdown(&self) {
        self.db.close().await;
        tracing::info!("store connections closed");
    }

    pub fn pods(&self) -> PodRelationalPersistence {
        PodRelationalPersistence {
            db: Arc::clone(&self.db),
            deadline: self.deadline,
        }
    }

    pub fn vmis(&self) -> VmiRelationalPersistence {
        VmiRelationalPersistence {
            db: Arc::clone(&self.db),
            deadline: self.deadline,
        }
    }

    pub fn migrations(&self) -> MigrationRelationalPersistence {
        MigrationRelationalPersistence {
            db: Arc::clone(&self.db),
            deadline: self.deadline,
        }
    }

    pub fn tabular(&self) -> RelationalTabularSource {
        RelationalTabularSource {
            db: Arc::clone(&self.db),
            deadline: self.deadline,
        }
    }
}
