// ── Insertion-ordered entity partition ──
//
// One partition per content type. Lookups are O(1) by object id and
// iteration follows first-insertion order, which keeps change sets and
// reports deterministic for a given input.

use indexmap::IndexMap;

use crate::model::{Entity, ObjectId};

/// Entities of a single content type, keyed by object id.
#[derive(Debug, Default)]
pub(crate) struct Partition {
    by_id: IndexMap<ObjectId, Entity>,
}

impl Partition {
    /// Insert or replace an entity. Returns `true` if the id was new.
    ///
    /// A replaced entity keeps its original position.
    pub(crate) fn upsert(&mut self, entity: Entity) -> bool {
        self.by_id.insert(entity.id, entity).is_none()
    }

    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<Entity> {
        self.by_id.shift_remove(&id)
    }

    pub(crate) fn get(&self, id: ObjectId) -> Option<&Entity> {
        self.by_id.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut Entity> {
        self.by_id.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.by_id.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::ContentType;

    #[test]
    fn upsert_returns_true_for_new_id() {
        let mut p = Partition::default();
        assert!(p.upsert(Entity::new(1, ContentType::Device, "a")));
    }

    #[test]
    fn upsert_returns_false_for_existing_id() {
        let mut p = Partition::default();
        p.upsert(Entity::new(1, ContentType::Device, "a"));
        assert!(!p.upsert(Entity::new(1, ContentType::Device, "b")));
        assert_eq!(p.get(1).unwrap().name, "b");
    }

    #[test]
    fn replace_keeps_insertion_position() {
        let mut p = Partition::default();
        p.upsert(Entity::new(3, ContentType::Device, "c"));
        p.upsert(Entity::new(1, ContentType::Device, "a"));
        p.upsert(Entity::new(3, ContentType::Device, "c2"));
        let ids: Vec<ObjectId> = p.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(p.get(3).unwrap().name, "c2");
    }

    #[test]
    fn remove_drops_entity() {
        let mut p = Partition::default();
        p.upsert(Entity::new(1, ContentType::Device, "a"));
        assert!(p.remove(1).is_some());
        assert!(p.get(1).is_none());
        assert_eq!(p.len(), 0);
    }
}
