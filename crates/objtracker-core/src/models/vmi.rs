use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tabular;
use crate::persistence::PersistableModel;
use crate::query::{Column, Value};
use crate::schema::vmis;
use crate::timestamp;

/// Migration progress as reported inside a vmi's status.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationState {
    pub migration_uid: String,
    #[serde(default)]
    pub target_pod: String,
    #[serde(default)]
    pub start_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_node: String,
    #[serde(default)]
    pub target_node: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub failed: bool,
}

impl MigrationState {
    pub fn is_empty(&self) -> bool {
        self.migration_uid.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vmi {
    pub name: String,
    pub namespace: String,
    pub uuid: String,
    pub reason: String,
    pub phase: String,
    pub node_name: String,
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub migration_state: Option<MigrationState>,
    pub content: serde_json::Value,
}

impl Vmi {
    /// The embedded migration state, if it names a migration.
    pub fn active_migration_state(&self) -> Option<&MigrationState> {
        self.migration_state
            .as_ref()
            .filter(|state| !state.is_empty())
    }

    pub fn with_canonical_timestamps(mut self) -> Self {
        self.creation_time = timestamp::truncate(self.creation_time);
        if let Some(state) = self.migration_state.as_mut() {
            state.start_timestamp = state.start_timestamp.map(timestamp::truncate);
            state.end_timestamp = state.end_timestamp.map(timestamp::truncate);
        }
        self
    }
}

impl PersistableModel for Vmi {
    fn get_id(&self) -> String {
        self.uuid.clone()
    }
}

impl Tabular for Vmi {
    fn column_value(&self, column: &Column) -> Value {
        match *column {
            vmis::NAME => Value::from(self.name.as_str()),
            vmis::NAMESPACE => Value::from(self.namespace.as_str()),
            vmis::UUID => Value::from(self.uuid.as_str()),
            vmis::REASON => Value::from(self.reason.as_str()),
            vmis::PHASE => Value::from(self.phase.as_str()),
            vmis::NODE_NAME => Value::from(self.node_name.as_str()),
            vmis::CREATION_TIME => Value::Text(timestamp::canonical(&self.creation_time)),
            vmis::MIGRATION_STATE => match &self.migration_state {
                Some(state) => serde_json::to_string(state)
                    .map(Value::Text)
                    .unwrap_or(Value::Null),
                None => Value::Null,
            },
            vmis::CONTENT => Value::Text(self.content.to_string()),
            _ => Value::Null,
        }
    }
}
