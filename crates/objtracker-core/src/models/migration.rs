use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tabular;
use crate::persistence::PersistableModel;
use crate::query::{Column, Value};
use crate::schema::migrations;
use crate::timestamp;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Migration {
    pub name: String,
    pub namespace: String,
    pub uuid: String,
    pub phase: String,

    /// Name of the migrating vmi, resolved together with `namespace`.
    pub vmi_name: String,
    pub target_pod: String,
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub end_timestamp: Option<DateTime<Utc>>,
    pub source_node: String,
    pub target_node: String,
    pub completed: bool,
    pub failed: bool,
    pub content: serde_json::Value,
}

impl Migration {
    pub fn with_canonical_timestamps(mut self) -> Self {
        self.creation_time = timestamp::truncate(self.creation_time);
        self.end_timestamp = self.end_timestamp.map(timestamp::truncate);
        self
    }
}

impl PersistableModel for Migration {
    fn get_id(&self) -> String {
        self.uuid.clone()
    }
}

impl Tabular for Migration {
    fn column_value(&self, column: &Column) -> Value {
        match *column {
            migrations::NAME => Value::from(self.name.as_str()),
            migrations::NAMESPACE => Value::from(self.namespace.as_str()),
            migrations::UUID => Value::from(self.uuid.as_str()),
            migrations::PHASE => Value::from(self.phase.as_str()),
            migrations::VMI_NAME => Value::from(self.vmi_name.as_str()),
            migrations::TARGET_POD => Value::from(self.target_pod.as_str()),
            migrations::CREATION_TIME => Value::Text(timestamp::canonical(&self.creation_time)),
            migrations::END_TIMESTAMP => {
                Value::from(self.end_timestamp.as_ref().map(timestamp::canonical))
            }
            migrations::SOURCE_NODE => Value::from(self.source_node.as_str()),
            migrations::TARGET_NODE => Value::from(self.target_node.as_str()),
            migrations::COMPLETED => Value::Bool(self.completed),
            migrations::FAILED => Value::Bool(self.failed),
            migrations::CONTENT => Value::Text(self.content.to_string()),
            _ => Value::Null,
        }
    }
}
