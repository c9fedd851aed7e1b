// ── Entity store ──
//
// Run-scoped cache of every loaded object, partitioned by content type.
// Only the single control thread mutates it, so there is no locking.
// Entities live until the process exits; nothing is evicted.

mod partition;

use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use crate::model::{ContentSelector, ContentType, Entity, ObjectId};
use partition::Partition;

/// Lookup of an object id that is not cached in any partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("object {id} is not cached")]
pub struct NotFoundError {
    pub id: ObjectId,
}

/// Cache of groups, devices and sensors with dirty tracking.
#[derive(Debug, Default)]
pub struct EntityStore {
    groups: Partition,
    devices: Partition,
    sensors: Partition,
    /// Which partition holds each id.
    index: HashMap<ObjectId, ContentType>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Insert or replace an entity within its content-type partition.
    ///
    /// `mark_dirty == false` is a fresh load and clears any earlier dirty
    /// flag for the id; `true` records the entity as changed. Returns
    /// `true` if the id was not cached before.
    pub fn put(&mut self, mut entity: Entity, mark_dirty: bool) -> bool {
        entity.dirty = mark_dirty;
        let id = entity.id;
        let content_type = entity.content_type;

        match self.index.insert(id, content_type) {
            Some(previous) if previous != content_type => {
                self.partition_mut(previous).remove(id);
            }
            Some(_) => {
                if let Some(existing) = self.partition(content_type).get(id) {
                    if existing.parent_id != entity.parent_id {
                        warn!(
                            id,
                            old_parent = ?existing.parent_id,
                            new_parent = ?entity.parent_id,
                            "object re-parented within one run"
                        );
                    }
                }
            }
            None => {}
        }

        self.partition_mut(content_type).upsert(entity)
    }

    /// Put a batch of entities with the same dirty mode.
    pub fn put_all(&mut self, entities: impl IntoIterator<Item = Entity>, mark_dirty: bool) -> usize {
        let mut count = 0;
        for entity in entities {
            self.put(entity, mark_dirty);
            count += 1;
        }
        count
    }

    /// Flag an already cached entity as changed.
    pub fn mark_dirty(&mut self, id: ObjectId) -> Result<(), NotFoundError> {
        self.get_by_id_mut(id)?.dirty = true;
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Look up an entity in any partition.
    pub fn get_by_id(&self, id: ObjectId) -> Result<&Entity, NotFoundError> {
        self.index
            .get(&id)
            .and_then(|ct| self.partition(*ct).get(id))
            .ok_or(NotFoundError { id })
    }

    pub(crate) fn get_by_id_mut(&mut self, id: ObjectId) -> Result<&mut Entity, NotFoundError> {
        let ct = *self.index.get(&id).ok_or(NotFoundError { id })?;
        self.partition_mut(ct).get_mut(id).ok_or(NotFoundError { id })
    }

    /// All cached entities of a content type, in insertion order.
    pub fn get_by_content_type(&self, content_type: ContentType) -> Vec<&Entity> {
        self.partition(content_type).iter().collect()
    }

    /// Cached entities of a content type that reconciliation changed.
    pub fn get_changed_by_content_type(&self, content_type: ContentType) -> Vec<&Entity> {
        self.partition(content_type).iter().filter(|e| e.dirty).collect()
    }

    /// Entities of every selected content type, root level first.
    pub fn get_selected(&self, selector: ContentSelector) -> Vec<&Entity> {
        selector
            .content_types()
            .iter()
            .flat_map(|ct| self.partition(*ct).iter())
            .collect()
    }

    /// Changed entities of every selected content type, root level first.
    pub fn get_changed_selected(&self, selector: ContentSelector) -> Vec<&Entity> {
        selector
            .content_types()
            .iter()
            .flat_map(|ct| self.partition(*ct).iter().filter(|e| e.dirty))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn count(&self, content_type: ContentType) -> usize {
        self.partition(content_type).len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn partition(&self, content_type: ContentType) -> &Partition {
        match content_type {
            ContentType::Group => &self.groups,
            ContentType::Device => &self.devices,
            ContentType::Sensor => &self.sensors,
        }
    }

    fn partition_mut(&mut self, content_type: ContentType) -> &mut Partition {
        match content_type {
            ContentType::Group => &mut self.groups,
            ContentType::Device => &mut self.devices,
            ContentType::Sensor => &mut self.sensors,
        }
    }
}
