use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Tabular;
use crate::persistence::PersistableModel;
use crate::query::{Column, Value};
use crate::schema::pods;
use crate::timestamp;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    #[serde(rename = "keyid")]
    pub key: String,
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub uuid: String,
    pub phase: String,
    pub active_containers: i32,
    pub total_containers: i32,
    pub node_name: String,
    pub creation_time: DateTime<Utc>,
    pub content: serde_json::Value,

    /// UUID of the owning vmi. Not enforced: the vmi may not be stored (yet).
    pub created_by: String,
}

impl Pod {
    pub fn with_canonical_timestamps(mut self) -> Self {
        self.creation_time = timestamp::truncate(self.creation_time);
        self
    }
}

impl PersistableModel for Pod {
    fn get_id(&self) -> String {
        self.uuid.clone()
    }
}

impl Tabular for Pod {
    fn column_value(&self, column: &Column) -> Value {
        match *column {
            pods::KEY_ID => Value::from(self.key.as_str()),
            pods::KIND => Value::from(self.kind.as_str()),
            pods::NAME => Value::from(self.name.as_str()),
            pods::NAMESPACE => Value::from(self.namespace.as_str()),
            pods::UUID => Value::from(self.uuid.as_str()),
            pods::PHASE => Value::from(self.phase.as_str()),
            pods::ACTIVE_CONTAINERS => Value::from(self.active_containers),
            pods::TOTAL_CONTAINERS => Value::from(self.total_containers),
            pods::NODE_NAME => Value::from(self.node_name.as_str()),
            pods::CREATION_TIME => Value::Text(timestamp::canonical(&self.creation_time)),
            pods::CONTENT => Value::Text(self.content.to_string()),
            pods::CREATED_BY => Value::from(self.created_by.as_str()),
            _ => Value::Null,
        }
    }
}
