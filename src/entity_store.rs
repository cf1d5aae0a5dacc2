use crate::archetype::index::ArchetypeIndex;
use crate::archetype::Archetype;
use crate::component::column::Column;
use crate::component::{Component, ComponentInfo, ComponentRegistry};
use crate::directory::{EntityDirectory, EntityRecord};
use crate::entity::{ArchetypeId, ComponentId, EntityId};
use crate::entry::{Entry, EntryMut};
use crate::error::Result;
use crate::query::Query;
use crate::signature::Signature;
use crate::StoreConfig;
use std::ptr::NonNull;

/// Largest alignment assumed for components registered by size only.
const MAX_NATURAL_ALIGN: usize = 16;

/// The alignment of a component registered by size only: the largest power of two
/// dividing `size`, capped at [`MAX_NATURAL_ALIGN`].
fn natural_align(size: usize) -> usize {
    if size == 0 {
        1
    } else {
        (1usize << size.trailing_zeros()).min(MAX_NATURAL_ALIGN)
    }
}

/// A container of entities and their components.
///
/// The store keeps four indices in step: the component columns, the archetype index,
/// the entity directory and the per-archetype member lists. Every operation either
/// updates all of them or, if it fails, none.
pub struct EntityStore {
    config: StoreConfig,
    components: ComponentRegistry,
    archetypes: ArchetypeIndex,
    entities: EntityDirectory,
}

impl EntityStore {
    /// Creates an empty store with the default configuration.
    pub fn new() -> EntityStore {
        Self::build(StoreConfig::default())
    }

    /// Creates an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Result<EntityStore> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> EntityStore {
        EntityStore {
            components: ComponentRegistry::new(&config),
            archetypes: ArchetypeIndex::new(config.archetype_capacity),
            entities: EntityDirectory::new(config.max_entities),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Registers a component type of `size` bytes and returns its identifier.
    ///
    /// The alignment is the largest power of two dividing `size`, up to 16.
    pub fn register_component(&mut self, size: usize) -> Result<ComponentId> {
        self.components.register(size, natural_align(size))
    }

    /// Registers a component type with an explicit layout and returns its identifier.
    pub fn register_component_with_align(
        &mut self,
        size: usize,
        align: usize,
    ) -> Result<ComponentId> {
        self.components.register(size, align)
    }

    /// Registers a component type under a caller-chosen identifier.
    ///
    /// Registering the same identifier again with the same size does nothing. A different
    /// size is accepted only while no entity holds the component.
    pub fn register_component_at(&mut self, id: ComponentId, size: usize) -> Result<()> {
        self.components.register_at(id, size, natural_align(size))
    }

    /// Registers the Rust type `C` as a component, or returns its identifier if it is
    /// already registered.
    pub fn register<C: Component>(&mut self) -> Result<ComponentId> {
        self.components.register_type::<C>()
    }

    /// Returns the identifier `C` was registered under.
    pub fn component_id<C: Component>(&self) -> Option<ComponentId> {
        self.components.id_of::<C>()
    }

    pub fn component_info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.components.info(id)
    }

    /// Returns the storage column of a component type.
    pub fn column(&self, id: ComponentId) -> Option<&Column> {
        self.components.column(id)
    }

    /// Returns the number of registered component types.
    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// Makes sure every column of `signature` can take one more instance.
    fn reserve(&mut self, signature: &Signature) -> Result<()> {
        for id in signature {
            if let Some(column) = self.components.column_mut(id) {
                column.reserve_one()?;
            }
        }
        Ok(())
    }

    /// Creates a new entity holding the components `ids` (zero-initialised) and returns
    /// its identifier.
    pub fn create(&mut self, ids: &[ComponentId]) -> Result<EntityId> {
        let signature = self.components.signature_of(ids)?;
        self.entities.peek_next()?;
        self.reserve(&signature)?;
        let arch_id = self.archetypes.find_or_create(&signature)?;

        let entity = self.entities.allocate()?;
        let row = self.archetypes.add_member(arch_id, entity);
        self.entities.set(
            entity,
            EntityRecord {
                signature,
                archetype: arch_id,
                row,
            },
        );
        for id in &signature {
            if let Some(column) = self.components.column_mut(id) {
                column.attach(entity)?;
            }
        }

        log::trace!("created entity {} with {:?}", entity, signature);
        Ok(entity)
    }

    /// Moves `entity` from its current archetype to `arch_id`.
    fn migrate(
        &mut self,
        entity: EntityId,
        old: EntityRecord,
        signature: Signature,
        arch_id: ArchetypeId,
    ) {
        if let Some(moved) = self.archetypes.remove_member(old.archetype, old.row) {
            if let Some(record) = self.entities.get_mut(moved) {
                record.row = old.row;
            }
        }
        let row = self.archetypes.add_member(arch_id, entity);
        self.entities.set(
            entity,
            EntityRecord {
                signature,
                archetype: arch_id,
                row,
            },
        );

        log::trace!(
            "moved entity {} from archetype {} to {}",
            entity,
            old.archetype.0,
            arch_id.0
        );
    }

    /// Adds the components `ids` to `entity`. Components the entity already holds keep
    /// their data; new ones start zeroed.
    ///
    /// Returns the archetype the entity belongs to afterwards.
    pub fn add(&mut self, entity: EntityId, ids: &[ComponentId]) -> Result<ArchetypeId> {
        let requested = self.components.signature_of(ids)?;
        let old = *self.entities.require(entity)?;

        let mut signature = old.signature;
        signature.union(&requested);
        if signature == old.signature {
            return Ok(old.archetype);
        }

        let mut added = signature;
        added.subtract(&old.signature);
        self.reserve(&added)?;
        let arch_id = self.archetypes.find_or_create(&signature)?;

        self.migrate(entity, old, signature, arch_id);
        for id in &added {
            if let Some(column) = self.components.column_mut(id) {
                column.attach(entity)?;
            }
        }
        Ok(arch_id)
    }

    /// Removes the components `ids` from `entity`, releasing their data. Components the
    /// entity does not hold are ignored.
    ///
    /// Returns the archetype the entity belongs to afterwards.
    pub fn remove(&mut self, entity: EntityId, ids: &[ComponentId]) -> Result<ArchetypeId> {
        let requested = self.components.signature_of(ids)?;
        let old = *self.entities.require(entity)?;

        let mut signature = old.signature;
        signature.subtract(&requested);
        if signature == old.signature {
            return Ok(old.archetype);
        }

        let mut removed = old.signature;
        removed.subtract(&signature);
        let arch_id = self.archetypes.find_or_create(&signature)?;

        self.migrate(entity, old, signature, arch_id);
        for id in &removed {
            if let Some(column) = self.components.column_mut(id) {
                column.detach(entity);
            }
        }
        Ok(arch_id)
    }

    /// Copies `data` into the component `id` of `entity`.
    ///
    /// Returns `false` if the entity does not hold the component.
    pub fn set(&mut self, entity: EntityId, id: ComponentId, data: &[u8]) -> Result<bool> {
        self.components.check(id)?;
        self.entities.require(entity)?;
        match self.components.column_mut(id) {
            Some(column) => column.set(entity, data),
            None => Ok(false),
        }
    }

    /// Fills the components `ids` of `entity` with zeros.
    ///
    /// Returns `true` if at least one component was zeroed.
    pub fn zero(&mut self, entity: EntityId, ids: &[ComponentId]) -> Result<bool> {
        self.components.signature_of(ids)?;
        self.entities.require(entity)?;

        let mut changed = false;
        for &id in ids {
            if let Some(column) = self.components.column_mut(id) {
                changed |= column.zero(entity);
            }
        }
        Ok(changed)
    }

    /// Writes `value` into the component `C` of `entity`.
    ///
    /// Returns `false` if the entity does not hold the component.
    pub fn set_component<C: Component>(&mut self, entity: EntityId, value: C) -> Result<bool> {
        let id = self.components.require::<C>()?;
        self.set(entity, id, bytemuck::bytes_of(&value))
    }

    /// Adds the component `C` to `entity` and writes `value` into it.
    pub fn insert<C: Component>(&mut self, entity: EntityId, value: C) -> Result<ArchetypeId> {
        let id = self.components.require::<C>()?;
        let arch_id = self.add(entity, &[id])?;
        self.set(entity, id, bytemuck::bytes_of(&value))?;
        Ok(arch_id)
    }

    /// Returns a read/write pointer to the component `id` of `entity`.
    ///
    /// The pointer stays valid until the next operation taking `&mut self`.
    pub fn get_ptr(&self, entity: EntityId, id: ComponentId) -> Option<NonNull<u8>> {
        self.components.column(id)?.data_ptr(entity)
    }

    /// Returns the bytes of the component `id` of `entity`.
    pub fn get_bytes(&self, entity: EntityId, id: ComponentId) -> Option<&[u8]> {
        self.components.column(id)?.bytes(entity)
    }

    /// Returns the bytes of the component `id` of `entity` for in-place modification.
    pub fn get_bytes_mut(&mut self, entity: EntityId, id: ComponentId) -> Option<&mut [u8]> {
        self.components.column_mut(id)?.bytes_mut(entity)
    }

    /// Returns a reference to the component `C` of `entity`.
    pub fn get<C: Component>(&self, entity: EntityId) -> Option<&C> {
        let id = self.components.id_of::<C>()?;
        bytemuck::try_from_bytes(self.get_bytes(entity, id)?).ok()
    }

    /// Returns a mutable reference to the component `C` of `entity`.
    pub fn get_mut<C: Component>(&mut self, entity: EntityId) -> Option<&mut C> {
        let id = self.components.id_of::<C>()?;
        bytemuck::try_from_bytes_mut(self.get_bytes_mut(entity, id)?).ok()
    }

    /// Fills `query` with every entity holding at least the components `ids` and returns
    /// how many there are.
    ///
    /// Entities with more components than requested match as well. An empty `ids` matches
    /// every entity.
    pub fn query(&self, query: &mut Query, ids: &[ComponentId]) -> Result<usize> {
        let signature = self.components.signature_of(ids)?;
        Ok(query.execute(&self.archetypes, signature))
    }

    /// Creates a query session sized by this store's configuration.
    pub fn new_query(&self) -> Query {
        Query::with_buckets(self.config.result_buckets)
    }

    /// Returns `true` if the storage contains the specified entity.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.get(entity).is_some()
    }

    /// Returns the components `entity` currently holds.
    pub fn signature(&self, entity: EntityId) -> Option<&Signature> {
        self.entities.get(entity).map(|r| &r.signature)
    }

    /// Returns `true` if `entity` holds the component `id`.
    pub fn has_component(&self, entity: EntityId, id: ComponentId) -> bool {
        self.components.check(id).is_ok()
            && self.signature(entity).map_or(false, |sig| sig.has(id))
    }

    /// Returns the archetype `entity` belongs to.
    pub fn archetype_of(&self, entity: EntityId) -> Option<ArchetypeId> {
        self.entities.get(entity).map(|r| r.archetype)
    }

    /// Returns the archetype with exactly the given components, if it exists.
    pub fn find_archetype(&self, signature: &Signature) -> Option<ArchetypeId> {
        self.archetypes.find(signature)
    }

    pub fn archetype(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id)
    }

    /// Returns an iterator over all archetypes.
    pub fn archetypes(&self) -> impl Iterator<Item = (ArchetypeId, &Archetype)> {
        self.archetypes.iter()
    }

    /// Returns the number of archetypes.
    pub fn n_archetypes(&self) -> usize {
        self.archetypes.len()
    }

    /// Returns the number of entities in the storage.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.len() == 0
    }

    /// Returns an immutable entry of `entity`.
    pub fn entry(&self, entity: EntityId) -> Option<Entry<'_>> {
        if !self.contains(entity) {
            return None;
        }
        Some(Entry {
            store: self,
            entity,
        })
    }

    /// Returns a mutable entry of `entity`.
    pub fn entry_mut(&mut self, entity: EntityId) -> Option<EntryMut<'_>> {
        if !self.contains(entity) {
            return None;
        }
        Some(EntryMut {
            store: self,
            entity,
        })
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_alignment() {
        assert_eq!(natural_align(0), 1);
        assert_eq!(natural_align(3), 1);
        assert_eq!(natural_align(4), 4);
        assert_eq!(natural_align(12), 4);
        assert_eq!(natural_align(64), 16);
    }
}
