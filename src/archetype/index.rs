use crate::archetype::{Archetype, ArchetypeKey};
use crate::entity::{ArchetypeId, EntityId};
use crate::error::{Result, StoreError};
use crate::signature::Signature;
use crate::HashMap;
use std::collections::hash_map;

/// Maps signatures to archetypes. Archetypes are created on first use and never removed.
pub(crate) struct ArchetypeIndex {
    archetypes: Vec<Archetype>,
    archetypes_by_signature: HashMap<ArchetypeKey, ArchetypeId>,
    capacity: usize,
}

impl ArchetypeIndex {
    pub fn new(capacity: usize) -> Self {
        ArchetypeIndex {
            archetypes: Vec::new(),
            archetypes_by_signature: Default::default(),
            capacity,
        }
    }

    /// Returns the archetype with exactly `signature`, if one exists.
    pub fn find(&self, signature: &Signature) -> Option<ArchetypeId> {
        self.archetypes_by_signature
            .get(&ArchetypeKey::new(*signature))
            .copied()
    }

    /// Returns the archetype with exactly `signature`, creating it if needed.
    pub fn find_or_create(&mut self, signature: &Signature) -> Result<ArchetypeId> {
        match self.archetypes_by_signature.entry(ArchetypeKey::new(*signature)) {
            hash_map::Entry::Occupied(e) => Ok(*e.get()),
            hash_map::Entry::Vacant(e) => {
                if self.archetypes.len() >= self.capacity {
                    log::warn!("archetype capacity of {} reached", self.capacity);
                    return Err(StoreError::ArchetypeLimit(self.capacity));
                }
                let id = ArchetypeId(self.archetypes.len() as u32);
                self.archetypes.push(Archetype::new(*signature));
                e.insert(id);

                log::debug!("created archetype {} with {:?}", id.0, signature);
                Ok(id)
            }
        }
    }

    /// Replaces the contents of `out` with every archetype implementing at least `signature`.
    pub fn find_supersets(&self, signature: &Signature, out: &mut Vec<ArchetypeId>) {
        out.clear();
        out.extend(
            self.archetypes
                .iter()
                .enumerate()
                .filter(|(_, arch)| arch.signature().contains(signature))
                .map(|(i, _)| ArchetypeId(i as u32)),
        );
    }

    /// Adds `entity` to the archetype and returns its row.
    pub fn add_member(&mut self, id: ArchetypeId, entity: EntityId) -> usize {
        self.archetypes[id.index()].entities.push(entity)
    }

    /// Removes the member at `row`. Returns the entity moved into `row`, if any.
    pub fn remove_member(&mut self, id: ArchetypeId, row: usize) -> Option<EntityId> {
        self.archetypes[id.index()].entities.swap_remove(row)
    }

    pub fn get(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArchetypeId, &Archetype)> {
        self.archetypes
            .iter()
            .enumerate()
            .map(|(i, arch)| (ArchetypeId(i as u32), arch))
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ComponentId;

    fn sig(ids: &[u16]) -> Signature {
        ids.iter().map(|id| ComponentId(*id)).collect()
    }

    #[test]
    fn find_or_create_is_stable() {
        let mut index = ArchetypeIndex::new(16);
        let a = index.find_or_create(&sig(&[1, 2])).unwrap();
        let b = index.find_or_create(&sig(&[3])).unwrap();
        assert_ne!(a, b);
        assert_eq!(index.find_or_create(&sig(&[2, 1])).unwrap(), a);
        assert_eq!(index.find(&sig(&[3])), Some(b));
        assert_eq!(index.find(&sig(&[4])), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn supersets_include_richer_signatures() {
        let mut index = ArchetypeIndex::new(16);
        let ab = index.find_or_create(&sig(&[1, 2])).unwrap();
        let abc = index.find_or_create(&sig(&[1, 2, 3])).unwrap();
        let c = index.find_or_create(&sig(&[3])).unwrap();
        let empty = index.find_or_create(&sig(&[])).unwrap();

        let mut out = vec![c];
        index.find_supersets(&sig(&[1, 2]), &mut out);
        assert_eq!(out, vec![ab, abc]);

        index.find_supersets(&sig(&[3]), &mut out);
        assert_eq!(out, vec![abc, c]);

        index.find_supersets(&sig(&[]), &mut out);
        assert_eq!(out, vec![ab, abc, c, empty]);
    }

    #[test]
    fn respects_capacity() {
        let mut index = ArchetypeIndex::new(1);
        let a = index.find_or_create(&sig(&[1])).unwrap();
        assert_eq!(
            index.find_or_create(&sig(&[2])),
            Err(StoreError::ArchetypeLimit(1))
        );
        assert_eq!(index.find_or_create(&sig(&[1])), Ok(a));
    }

    #[test]
    fn members_move_by_row() {
        let mut index = ArchetypeIndex::new(4);
        let a = index.find_or_create(&sig(&[1])).unwrap();
        assert_eq!(index.add_member(a, EntityId(1)), 0);
        assert_eq!(index.add_member(a, EntityId(2)), 1);

        assert_eq!(index.remove_member(a, 0), Some(EntityId(2)));
        assert_eq!(index.get(a).unwrap().entities(), &[EntityId(2)]);
    }
}
