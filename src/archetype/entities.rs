use crate::entity::EntityId;
use std::slice;

/// Member list of an archetype.
///
/// Order is not preserved: removing a member moves the last member into its row.
#[derive(Default, Clone)]
pub struct ArchetypeEntities {
    ids: Vec<EntityId>,
}

impl ArchetypeEntities {
    /// Appends `entity` and returns its row.
    pub(crate) fn push(&mut self, entity: EntityId) -> usize {
        debug_assert!(!self.contains(entity));
        self.ids.push(entity);
        self.ids.len() - 1
    }

    /// Removes the member at `row`.
    /// Returns the member that was moved into `row`, if any.
    pub(crate) fn swap_remove(&mut self, row: usize) -> Option<EntityId> {
        self.ids.swap_remove(row);
        self.ids.get(row).copied()
    }

    /// Returns the member at `row`.
    pub fn get(&self, row: usize) -> Option<EntityId> {
        self.ids.get(row).copied()
    }

    /// Returns `true` if `entity` is a member. This is a linear scan.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.ids.contains(&entity)
    }

    pub fn iter(&self) -> EntitiesIter<'_> {
        EntitiesIter(self.ids.iter())
    }

    pub fn as_slice(&self) -> &[EntityId] {
        &self.ids
    }

    /// Returns the number of members.
    pub fn count(&self) -> usize {
        self.ids.len()
    }
}

#[derive(Clone)]
pub struct EntitiesIter<'a>(slice::Iter<'a, EntityId>);

impl Iterator for EntitiesIter<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for EntitiesIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_remove_reports_moved_member() {
        let mut members = ArchetypeEntities::default();
        for raw in 1..=3 {
            members.push(EntityId(raw));
        }

        assert_eq!(members.swap_remove(0), Some(EntityId(3)));
        assert_eq!(members.as_slice(), &[EntityId(3), EntityId(2)]);

        assert_eq!(members.swap_remove(1), None);
        assert_eq!(members.as_slice(), &[EntityId(3)]);
        assert_eq!(members.count(), 1);
    }
}
