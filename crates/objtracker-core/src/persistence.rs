use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Pod, Vmi};
use crate::query::{Projection, Record, Window};
use crate::StoreResult;

pub trait PersistableModel {
    fn get_id(&self) -> String;
}

/// Upsert-by-UUID storage for one entity kind. A re-upsert replaces the whole row.
#[async_trait]
pub trait Persistence<Model>: Send + Sync {
    async fn upsert(&self, model: &Model) -> StoreResult<u64>;
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Model>>;
}

/// Inclusive creation-time bounds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CreationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CreationWindow {
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        self.start <= *timestamp && *timestamp <= self.end
    }
}

#[async_trait]
pub trait PodPersistence: Persistence<Pod> {
    async fn get_by_name(&self, name: &str, namespace: &str) -> StoreResult<Option<Pod>>;

    /// Earliest-created pod owned by `created_by` on `node_name`, optionally
    /// restricted to `window`. Creation-time ties go to the lowest UUID.
    async fn get_earliest_created_by(
        &self,
        created_by: &str,
        node_name: &str,
        window: Option<CreationWindow>,
    ) -> StoreResult<Option<Pod>>;

    /// First pod on `node_name` whose name starts with `name_prefix`, by name
    /// then UUID.
    async fn get_by_name_prefix_on_node(
        &self,
        node_name: &str,
        name_prefix: &str,
    ) -> StoreResult<Option<Pod>>;
}

#[async_trait]
pub trait VmiPersistence: Persistence<Vmi> {
    async fn get_by_name(&self, name: &str, namespace: &str) -> StoreResult<Option<Vmi>>;
}

/// Executes projections for the paging engine.
#[async_trait]
pub trait TabularSource: Send + Sync {
    async fn count(&self, projection: &Projection) -> StoreResult<u64>;

    async fn fetch(
        &self,
        projection: &Projection,
        window: Option<Window>,
    ) -> StoreResult<Vec<Record>>;
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn test_creation_window_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2022, 11, 2, 10, 0, 0).unwrap();
        let end = start + Duration::seconds(10);
        let window = CreationWindow { start, end };

        assert!(window.contains(&start));
        assert!(window.contains(&end));
        assert!(!window.contains(&(end + Duration::microseconds(1))));
        assert!(!window.contains(&(start - Duration::microseconds(1))));
    }
}
