use crate::entity::{ArchetypeId, EntityId};
use crate::error::{Result, StoreError};
use crate::signature::Signature;
use crate::HashMap;

/// Where an entity currently lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct EntityRecord {
    pub signature: Signature,
    pub archetype: ArchetypeId,
    /// Index of the entity in its archetype's member list.
    pub row: usize,
}

/// Maps entity identifiers to their current record and hands out new identifiers.
pub(crate) struct EntityDirectory {
    records: HashMap<EntityId, EntityRecord>,
    next_id: u64,
    max_entities: u64,
}

impl EntityDirectory {
    pub fn new(max_entities: u64) -> Self {
        EntityDirectory {
            records: Default::default(),
            next_id: 1,
            max_entities,
        }
    }

    /// Returns the identifier the next [`allocate`](Self::allocate) will hand out.
    pub fn peek_next(&self) -> Result<EntityId> {
        if self.next_id > self.max_entities {
            log::warn!("entity capacity of {} reached", self.max_entities);
            return Err(StoreError::EntityLimit(self.max_entities));
        }
        Ok(EntityId(self.next_id))
    }

    /// Consumes a fresh identifier. Identifiers are never handed out twice.
    pub fn allocate(&mut self) -> Result<EntityId> {
        let id = self.peek_next()?;
        self.next_id += 1;
        Ok(id)
    }

    /// Inserts or replaces the record of `entity`.
    pub fn set(&mut self, entity: EntityId, record: EntityRecord) {
        self.records.insert(entity, record);
    }

    pub fn get(&self, entity: EntityId) -> Option<&EntityRecord> {
        self.records.get(&entity)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut EntityRecord> {
        self.records.get_mut(&entity)
    }

    /// Returns the record of `entity`, failing if it does not exist.
    pub fn require(&self, entity: EntityId) -> Result<&EntityRecord> {
        self.get(entity).ok_or(StoreError::UnknownEntity(entity))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_bounded() {
        let mut dir = EntityDirectory::new(2);
        assert_eq!(dir.allocate(), Ok(EntityId(1)));
        assert_eq!(dir.allocate(), Ok(EntityId(2)));
        assert_eq!(dir.allocate(), Err(StoreError::EntityLimit(2)));
    }

    #[test]
    fn set_upserts() {
        let mut dir = EntityDirectory::new(10);
        let e = dir.allocate().unwrap();
        assert_eq!(dir.require(e), Err(StoreError::UnknownEntity(e)));

        let record = EntityRecord {
            signature: Signature::EMPTY,
            archetype: ArchetypeId(0),
            row: 0,
        };
        dir.set(e, record);
        dir.set(e, EntityRecord { row: 3, ..record });

        assert_eq!(dir.len(), 1);
        assert_eq!(dir.get(e).unwrap().row, 3);
    }
}
