use crate::event::{FeatureId, ObjectChange};
use crate::state::entity::{Entity, EntityChange};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// In-memory entity table, keyed by feature id.
///
/// Only the owner can write (every mutator takes `&mut self`); renderers get
/// an [`EntityTableReader`] and/or a change subscription.
pub struct EntityTable {
    /// Lock-free concurrent map so readers on other tasks never block
    entities: Arc<DashMap<FeatureId, Entity>>,

    /// Broadcast channel for entity changes
    change_tx: broadcast::Sender<EntityChange>,
}

impl EntityTable {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(1000);
        Self {
            entities: Arc::new(DashMap::new()),
            change_tx,
        }
    }

    /// Create or update the entity named by `change`.
    ///
    /// An unknown id inserts a new entity; a known id has its position,
    /// timestamp, attributes and color replaced in place.
    pub fn upsert(&mut self, change: &ObjectChange) -> EntityChange {
        let (entity, created) = match self.entities.entry(change.object_id.clone()) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().apply(change);
                (occupied.get().clone(), false)
            }
            Entry::Vacant(vacant) => {
                let entity = Entity::from_change(change);
                vacant.insert(entity.clone());
                (entity, true)
            }
        };

        debug!(entity_id = %entity.id, created = created, "Entity upserted");

        let update = EntityChange { entity, created };
        // No subscribers is fine
        let _ = self.change_tx.send(update.clone());
        update
    }

    /// Get entity by ID
    pub fn get(&self, id: &FeatureId) -> Option<Entity> {
        self.entities.get(id).map(|e| e.clone())
    }

    pub fn contains(&self, id: &FeatureId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Copy of the whole table
    pub fn snapshot(&self) -> HashMap<FeatureId, Entity> {
        snapshot(&self.entities)
    }

    /// Read-only handle for renderers
    pub fn reader(&self) -> EntityTableReader {
        EntityTableReader {
            entities: Arc::clone(&self.entities),
        }
    }

    /// Subscribe to entity changes
    pub fn subscribe(&self) -> broadcast::Receiver<EntityChange> {
        self.change_tx.subscribe()
    }
}

impl Default for EntityTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of an [`EntityTable`]
#[derive(Clone)]
pub struct EntityTableReader {
    entities: Arc<DashMap<FeatureId, Entity>>,
}

impl EntityTableReader {
    pub fn get(&self, id: &FeatureId) -> Option<Entity> {
        self.entities.get(id).map(|e| e.clone())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> Vec<FeatureId> {
        self.entities.iter().map(|e| e.key().clone()).collect()
    }

    pub fn snapshot(&self) -> HashMap<FeatureId, Entity> {
        snapshot(&self.entities)
    }
}

fn snapshot(entities: &DashMap<FeatureId, Entity>) -> HashMap<FeatureId, Entity> {
    entities
        .iter()
        .map(|e| (e.key().clone(), e.value().clone()))
        .collect()
}
