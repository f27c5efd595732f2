//! Stored relations and their columns, shared by every backend.

pub mod pods {
    use crate::query::{Column, Table};

    pub const TABLE: Table = Table::Pods;

    pub const KEY_ID: Column = Column::new("key_id", "keyid");
    pub const KIND: Column = Column::new("kind", "kind");
    pub const NAME: Column = Column::new("name", "name");
    pub const NAMESPACE: Column = Column::new("namespace", "namespace");
    pub const UUID: Column = Column::new("uuid", "uuid");
    pub const PHASE: Column = Column::new("phase", "phase");
    pub const ACTIVE_CONTAINERS: Column = Column::new("active_containers", "activeContainers");
    pub const TOTAL_CONTAINERS: Column = Column::new("total_containers", "totalContainers");
    pub const NODE_NAME: Column = Column::new("node_name", "nodeName");
    pub const CREATION_TIME: Column = Column::new("creation_time", "creationTime");
    pub const CONTENT: Column = Column::new("content", "content");
    pub const CREATED_BY: Column = Column::new("created_by", "createdBy");

    pub const LIST_COLUMNS: [Column; 8] = [
        UUID,
        NAME,
        NAMESPACE,
        PHASE,
        ACTIVE_CONTAINERS,
        TOTAL_CONTAINERS,
        CREATION_TIME,
        CREATED_BY,
    ];
}

pub mod vmis {
    use crate::query::{Column, Table};

    pub const TABLE: Table = Table::Vmis;

    pub const NAME: Column = Column::new("name", "name");
    pub const NAMESPACE: Column = Column::new("namespace", "namespace");
    pub const UUID: Column = Column::new("uuid", "uuid");
    pub const REASON: Column = Column::new("reason", "reason");
    pub const PHASE: Column = Column::new("phase", "phase");
    pub const NODE_NAME: Column = Column::new("node_name", "nodeName");
    pub const CREATION_TIME: Column = Column::new("creation_time", "creationTime");
    pub const MIGRATION_STATE: Column = Column::new("migration_state", "migrationState");
    pub const CONTENT: Column = Column::new("content", "content");

    pub const LIST_COLUMNS: [Column; 7] =
        [UUID, NAME, NAMESPACE, PHASE, REASON, NODE_NAME, CREATION_TIME];
}

pub mod migrations {
    use crate::query::{Column, Table};

    pub const TABLE: Table = Table::Migrations;

    pub const NAME: Column = Column::new("name", "name");
    pub const NAMESPACE: Column = Column::new("namespace", "namespace");
    pub const UUID: Column = Column::new("uuid", "uuid");
    pub const PHASE: Column = Column::new("phase", "phase");
    pub const VMI_NAME: Column = Column::new("vmi_name", "vmiName");
    pub const TARGET_POD: Column = Column::new("target_pod", "targetPod");
    pub const CREATION_TIME: Column = Column::new("creation_time", "creationTime");
    pub const END_TIMESTAMP: Column = Column::new("end_timestamp", "endTimestamp");
    pub const SOURCE_NODE: Column = Column::new("source_node", "sourceNode");
    pub const TARGET_NODE: Column = Column::new("target_node", "targetNode");
    pub const COMPLETED: Column = Column::new("completed", "completed");
    pub const FAILED: Column = Column::new("failed", "failed");
    pub const CONTENT: Column = Column::new("content", "content");

    pub const LIST_COLUMNS: [Column; 12] = [
        NAME,
        NAMESPACE,
        UUID,
        PHASE,
        VMI_NAME,
        TARGET_POD,
        CREATION_TIME,
        END_TIMESTAMP,
        SOURCE_NODE,
        TARGET_NODE,
        COMPLETED,
        FAILED,
    ];
}
