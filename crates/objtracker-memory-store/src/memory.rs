use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use objtracker_core::{
    models::{Migration, Pod, Vmi},
    CreationWindow, PersistableModel, Persistence, PodPersistence, StoreError, StoreResult,
    VmiPersistence,
};

/// Canonicalizes a model before it is stored, as the relational store does.
pub trait Canonicalize {
    fn canonicalize(self) -> Self;
}

impl Canonicalize for Pod {
    fn canonicalize(self) -> Self {
        self.with_canonical_timestamps()
    }
}

impl Canonicalize for Vmi {
    fn canonicalize(self) -> Self {
        self.with_canonical_timestamps()
    }
}

impl Canonicalize for Migration {
    fn canonicalize(self) -> Self {
        self.with_canonical_timestamps()
    }
}

/// Clones share the same underlying rows.
#[derive(Clone, Debug)]
pub struct MemoryPersistence<Model> {
    models: Arc<Mutex<HashMap<String, Model>>>,
}

impl<Model> Default for MemoryPersistence<Model> {
    fn default() -> Self {
        Self {
            models: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<Model> MemoryPersistence<Model>
where
    Model: Clone,
{
    fn get_models_locked(&self) -> StoreResult<MutexGuard<HashMap<String, Model>>> {
        match self.models.lock() {
            Ok(locked_models) => Ok(locked_models),
            Err(_) => Err(StoreError::Backend("failed to acquire lock".to_string())),
        }
    }

    pub fn list(&self) -> StoreResult<Vec<Model>> {
        let locked_models = self.get_models_locked()?;

        Ok(locked_models.values().cloned().collect())
    }

    fn find_first<P, K>(&self, predicate: P, sort_key: K) -> StoreResult<Option<Model>>
    where
        P: Fn(&Model) -> bool,
        K: Fn(&Model, &Model) -> std::cmp::Ordering,
    {
        let locked_models = self.get_models_locked()?;

        Ok(locked_models
            .values()
            .filter(|model| predicate(*model))
            .min_by(|a, b| sort_key(a, b))
            .cloned())
    }
}

#[async_trait]
impl<Model> Persistence<Model> for MemoryPersistence<Model>
where
    Model: PersistableModel + Canonicalize + Clone + Send + Sync,
{
    async fn upsert(&self, model: &Model) -> StoreResult<u64> {
        let mut locked_models = self.get_models_locked()?;

        locked_models.insert(model.get_id(), model.clone().canonicalize());

        Ok(1)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Model>> {
        let locked_models = self.get_models_locked()?;

        Ok(locked_models.get(id).cloned())
    }
}

#[async_trait]
impl PodPersistence for MemoryPersistence<Pod> {
    async fn get_by_name(&self, name: &str, namespace: &str) -> StoreResult<Option<Pod>> {
        self.find_first(
            |pod| pod.name == name && pod.namespace == namespace,
            |a, b| a.uuid.cmp(&b.uuid),
        )
    }

    async fn get_earliest_created_by(
        &self,
        created_by: &str,
        node_name: &str,
        window: Option<CreationWindow>,
    ) -> StoreResult<Option<Pod>> {
        self.find_first(
            |pod| {
                pod.created_by == created_by
                    && pod.node_name == node_name
                    && window.map_or(true, |window| window.contains(&pod.creation_time))
            },
            |a, b| {
                a.creation_time
                    .cmp(&b.creation_time)
                    .then_with(|| a.uuid.cmp(&b.uuid))
            },
        )
    }

    async fn get_by_name_prefix_on_node(
        &self,
        node_name: &str,
        name_prefix: &str,
    ) -> StoreResult<Option<Pod>> {
        self.find_first(
            |pod| pod.node_name == node_name && pod.name.starts_with(name_prefix),
            |a, b| a.name.cmp(&b.name).then_with(|| a.uuid.cmp(&b.uuid)),
        )
    }
}

#[async_trait]
impl VmiPersistence for MemoryPersistence<Vmi> {
    async fn get_by_name(&self, name: &str, namespace: &str) -> StoreResult<Option<Vmi>> {
        self.find_first(
            |vmi| vmi.name == name && vmi.namespace == namespace,
            |a, b| a.uuid.cmp(&b.uuid),
        )
    }
}
