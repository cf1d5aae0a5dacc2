use crate::entity::{ArchetypeId, ComponentId, EntityId};
use crate::error::Result;
use crate::signature::Signature;
use crate::{Component, EntityStore};

/// An immutable entry of an existing entity in an [`EntityStore`].
/// Provides convenient access to entity components.
pub struct Entry<'a> {
    pub(crate) store: &'a EntityStore,
    pub(crate) entity: EntityId,
}

impl<'a> Entry<'a> {
    /// Returns underlying entity.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Returns the components the entity holds.
    pub fn signature(&self) -> &'a Signature {
        self.store
            .signature(self.entity)
            .unwrap_or(&Signature::EMPTY)
    }

    pub fn has(&self, id: ComponentId) -> bool {
        self.store.has_component(self.entity, id)
    }

    /// Returns a reference to the component `C` of the entity.
    pub fn get<C: Component>(&self) -> Option<&'a C> {
        self.store.get(self.entity)
    }

    /// Returns the bytes of the component `id` of the entity.
    pub fn bytes(&self, id: ComponentId) -> Option<&'a [u8]> {
        self.store.get_bytes(self.entity, id)
    }
}

/// A mutable entry of an existing entity in an [`EntityStore`].
pub struct EntryMut<'a> {
    pub(crate) store: &'a mut EntityStore,
    pub(crate) entity: EntityId,
}

impl EntryMut<'_> {
    /// Returns underlying entity.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn signature(&self) -> &Signature {
        self.store
            .signature(self.entity)
            .unwrap_or(&Signature::EMPTY)
    }

    pub fn has(&self, id: ComponentId) -> bool {
        self.store.has_component(self.entity, id)
    }

    /// Returns a reference to the component `C` of the entity.
    pub fn get<C: Component>(&self) -> Option<&C> {
        self.store.get(self.entity)
    }

    /// Returns a mutable reference to the component `C` of the entity.
    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.store.get_mut(self.entity)
    }

    pub fn bytes_mut(&mut self, id: ComponentId) -> Option<&mut [u8]> {
        self.store.get_bytes_mut(self.entity, id)
    }

    pub fn set(&mut self, id: ComponentId, data: &[u8]) -> Result<bool> {
        self.store.set(self.entity, id, data)
    }

    /// Adds `value` as the component `C`, replacing any previous value.
    pub fn insert<C: Component>(&mut self, value: C) -> Result<ArchetypeId> {
        self.store.insert(self.entity, value)
    }

    pub fn add(&mut self, ids: &[ComponentId]) -> Result<ArchetypeId> {
        self.store.add(self.entity, ids)
    }

    pub fn remove(&mut self, ids: &[ComponentId]) -> Result<ArchetypeId> {
        self.store.remove(self.entity, ids)
    }
}
