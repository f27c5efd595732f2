mod correlation;
mod ingest;
mod linker;
mod query;

pub use correlation::{Correlation, CorrelationService, ResolveFailure, DEFAULT_NODE_AGENT_PREFIX};
pub use ingest::IngestService;
pub use linker::{link_migration, LinkOutcome, MigrationLinker};
pub use query::{Paging, QueryService, VmiReference, NO_PAGING};

use std::sync::Arc;

use objtracker_core::{
    models::Migration, Persistence, PodPersistence, TabularSource, VmiPersistence,
};
use objtracker_postgresql_store::PostgresStore;

/// The ingestion, list and detail services over one store.
pub struct Services {
    pub ingest: IngestService,
    pub query: QueryService,
    pub correlation: CorrelationService,
}

impl Services {
    pub fn new(
        pod_persistence: Arc<dyn PodPersistence>,
        vmi_persistence: Arc<dyn VmiPersistence>,
        migration_persistence: Arc<dyn Persistence<Migration>>,
        source: Arc<dyn TabularSource>,
        node_agent_prefix: &str,
    ) -> Self {
        let ingest = IngestService {
            pod_persistence: Arc::clone(&pod_persistence),
            vmi_persistence: Arc::clone(&vmi_persistence),
            migration_persistence: Arc::clone(&migration_persistence),

            linker: MigrationLinker {
                persistence: Arc::clone(&migration_persistence),
            },
        };

        let correlation = CorrelationService {
            pod_persistence,
            vmi_persistence,
            migration_persistence,

            node_agent_prefix: node_agent_prefix.to_string(),
        };

        Self {
            ingest,
            query: QueryService { source },
            correlation,
        }
    }

    pub fn relational(store: &PostgresStore, node_agent_prefix: &str) -> Self {
        Self::new(
            Arc::new(store.pods()),
            Arc::new(store.vmis()),
            Arc::new(store.migrations()),
            Arc::new(store.tabular()),
            node_agent_prefix,
        )
    }
}
