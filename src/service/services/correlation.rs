//! Reconstructs which pods served a vmi across a migration.
//!
//! Pods carry no reference to the migration that caused them and migrations
//! reference their vmi by name, so the source pod is identified from node
//! placement and creation time alone. Lookups run one after another without
//! isolation: a concurrent auto-linker write can be observed half way through.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use objtracker_core::{
    models::{Migration, Pod},
    CreationWindow, Persistence, PodPersistence, StoreError, StoreResult, VmiPersistence,
};

/// Name prefix of the per-node virtualization agent pods.
pub const DEFAULT_NODE_AGENT_PREFIX: &str = "virt-handler";

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
    pub namespace: String,
    pub source_pod_uuid: String,
    pub target_pod_uuid: String,
    pub vmi_uuid: String,
    pub migration_uuid: String,
    pub source_pod_name: String,
    pub target_pod_name: String,
    pub start_timestamp: Option<DateTime<Utc>>,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub source_handler_pod_name: String,
    pub target_handler_pod_name: String,
}

/// A lookup failed. `partial` holds everything resolved before it.
#[derive(Debug, thiserror::Error)]
#[error("correlation incomplete: {error}")]
pub struct ResolveFailure {
    pub partial: Correlation,
    #[source]
    pub error: StoreError,
}

pub struct CorrelationService {
    pub pod_persistence: Arc<dyn PodPersistence>,
    pub vmi_persistence: Arc<dyn VmiPersistence>,
    pub migration_persistence: Arc<dyn Persistence<Migration>>,

    pub node_agent_prefix: String,
}

impl CorrelationService {
    #[tracing::instrument(name = "service::correlation::resolve_migration", skip(self))]
    pub async fn resolve_migration(
        &self,
        migration_uuid: &str,
    ) -> Result<Correlation, ResolveFailure> {
        let mut correlation = Correlation::default();

        match self
            .resolve_migration_into(migration_uuid, &mut correlation)
            .await
        {
            Ok(()) => Ok(correlation),
            Err(error) => {
                tracing::info!(%error, "migration correlation incomplete");
                Err(ResolveFailure {
                    partial: correlation,
                    error,
                })
            }
        }
    }

    /// Like [`CorrelationService::resolve_migration`] without migration
    /// context: the vmi's pod on `node_name` and that node's agent.
    #[tracing::instrument(name = "service::correlation::resolve_vmi", skip(self))]
    pub async fn resolve_vmi(
        &self,
        vmi_uuid: &str,
        node_name: &str,
    ) -> Result<Correlation, ResolveFailure> {
        let mut correlation = Correlation {
            vmi_uuid: vmi_uuid.to_string(),
            ..Default::default()
        };

        match self
            .resolve_vmi_into(vmi_uuid, node_name, &mut correlation)
            .await
        {
            Ok(()) => Ok(correlation),
            Err(error) => {
                tracing::info!(%error, "vmi correlation incomplete");
                Err(ResolveFailure {
                    partial: correlation,
                    error,
                })
            }
        }
    }

    async fn resolve_migration_into(
        &self,
        migration_uuid: &str,
        correlation: &mut Correlation,
    ) -> StoreResult<()> {
        let migration = self
            .migration_persistence
            .get_by_id(migration_uuid)
            .await?
            .ok_or_else(|| StoreError::not_found("migration", migration_uuid))?;

        correlation.namespace = migration.namespace.clone();
        correlation.migration_uuid = migration.uuid.clone();
        correlation.target_pod_name = migration.target_pod.clone();
        correlation.start_timestamp = Some(migration.creation_time);
        correlation.end_timestamp = migration.end_timestamp;

        // Bound by name only. A vmi recreated under the same name is ambiguous;
        // the lowest UUID wins.
        let vmi = self
            .vmi_persistence
            .get_by_name(&migration.vmi_name, &migration.namespace)
            .await?
            .ok_or_else(|| {
                StoreError::not_found(
                    "vmi",
                    format!("{}/{}", migration.namespace, migration.vmi_name),
                )
            })?;

        correlation.vmi_uuid = vmi.uuid.clone();

        let target_pod = self
            .pod_persistence
            .get_by_name(&migration.target_pod, &migration.namespace)
            .await?
            .ok_or_else(|| {
                StoreError::not_found(
                    "target pod",
                    format!("{}/{}", migration.namespace, migration.target_pod),
                )
            })?;

        correlation.target_pod_uuid = target_pod.uuid;

        let window = CreationWindow {
            start: vmi.creation_time,
            end: migration.creation_time,
        };
        let source_pod = self
            .pod_persistence
            .get_earliest_created_by(&vmi.uuid, &migration.source_node, Some(window))
            .await?
            .ok_or_else(|| {
                StoreError::not_found(
                    "source pod",
                    format!("created by {} on {}", vmi.uuid, migration.source_node),
                )
            })?;

        correlation.source_pod_uuid = source_pod.uuid;
        correlation.source_pod_name = source_pod.name;

        correlation.source_handler_pod_name = self.node_agent(&migration.source_node).await?.name;
        correlation.target_handler_pod_name = self.node_agent(&migration.target_node).await?.name;

        Ok(())
    }

    async fn resolve_vmi_into(
        &self,
        vmi_uuid: &str,
        node_name: &str,
        correlation: &mut Correlation,
    ) -> StoreResult<()> {
        let pod = self
            .pod_persistence
            .get_earliest_created_by(vmi_uuid, node_name, None)
            .await?
            .ok_or_else(|| {
                StoreError::not_found("pod", format!("created by {vmi_uuid} on {node_name}"))
            })?;

        correlation.namespace = pod.namespace;
        correlation.source_pod_uuid = pod.uuid;
        correlation.source_pod_name = pod.name;
        correlation.start_timestamp = Some(pod.creation_time);

        correlation.source_handler_pod_name = self.node_agent(node_name).await?.name;

        Ok(())
    }

    async fn node_agent(&self, node_name: &str) -> StoreResult<Pod> {
        self.pod_persistence
            .get_by_name_prefix_on_node(node_name, &self.node_agent_prefix)
            .await?
            .ok_or_else(|| StoreError::not_found("node agent", node_name))
    }
}
