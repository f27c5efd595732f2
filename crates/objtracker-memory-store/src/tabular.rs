use async_trait::async_trait;

use objtracker_core::{
    models::{Migration, Pod, Tabular, Vmi},
    query::{Projection, Record, Table, Window},
    StoreResult, TabularSource,
};

use crate::MemoryPersistence;

/// In-process stand-in for the relational store: one persistence per entity
/// kind plus projection execution over their rows.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    pods: MemoryPersistence<Pod>,
    vmis: MemoryPersistence<Vmi>,
    migrations: MemoryPersistence<Migration>,
}

impl MemoryStore {
    pub fn pods(&self) -> MemoryPersistence<Pod> {
        self.pods.clone()
    }

    pub fn vmis(&self) -> MemoryPersistence<Vmi> {
        self.vmis.clone()
    }

    pub fn migrations(&self) -> MemoryPersistence<Migration> {
        self.migrations.clone()
    }

    fn select(&self, projection: &Projection) -> StoreResult<Vec<Record>> {
        match projection.table {
            Table::Pods => select_from(self.pods.list()?, projection),
            Table::Vmis => select_from(self.vmis.list()?, projection),
            Table::Migrations => select_from(self.migrations.list()?, projection),
        }
    }
}

fn select_from<Model: Tabular>(
    models: Vec<Model>,
    projection: &Projection,
) -> StoreResult<Vec<Record>> {
    let mut selected: Vec<Model> = models
        .into_iter()
        .filter(|model| {
            projection
                .filters
                .iter()
                .all(|filter| model.column_value(&filter.column) == filter.value)
        })
        .collect();

    selected.sort_by(|a, b| {
        projection
            .order_by
            .iter()
            .map(|column| a.column_value(column).sort_cmp(&b.column_value(column)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(selected
        .iter()
        .map(|model| model.to_record(&projection.columns))
        .collect())
}

#[async_trait]
impl TabularSource for MemoryStore {
    async fn count(&self, projection: &Projection) -> StoreResult<u64> {
        Ok(self.select(projection)?.len() as u64)
    }

    async fn fetch(
        &self,
        projection: &Projection,
        window: Option<Window>,
    ) -> StoreResult<Vec<Record>> {
        let records = self.select(projection)?;

        Ok(match window {
            Some(window) => records
                .into_iter()
                .skip(window.offset.max(0) as usize)
                .take(window.limit.max(0) as usize)
                .collect(),
            None => records,
        })
    }
}
