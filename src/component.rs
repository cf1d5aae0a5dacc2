pub mod column;

use crate::entity::ComponentId;
use crate::error::{Result, StoreError};
use crate::signature::Signature;
use crate::{HashMap, StoreConfig};
use column::Column;
use std::any::{self, TypeId};
use std::mem;

/// A statically typed component.
///
/// Any plain-old-data type can be stored: component memory is zero-initialised and
/// copied bytewise, so every bit pattern (including all zeros) must be a valid value.
pub trait Component: bytemuck::Pod + Send + Sync {}

impl<T> Component for T where T: bytemuck::Pod + Send + Sync {}

/// Layout and identity of a registered component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    pub id: ComponentId,
    pub size: usize,
    pub align: usize,
    /// Rust type the component was registered for, if registered through [`Component`].
    pub type_id: Option<TypeId>,
    pub type_name: Option<&'static str>,
}

impl ComponentInfo {
    fn raw(id: ComponentId, size: usize, align: usize) -> Self {
        ComponentInfo {
            id,
            size,
            align,
            type_id: None,
            type_name: None,
        }
    }

    fn of<C: Component>(id: ComponentId) -> Self {
        ComponentInfo {
            id,
            size: mem::size_of::<C>(),
            align: mem::align_of::<C>(),
            type_id: Some(TypeId::of::<C>()),
            type_name: Some(any::type_name::<C>()),
        }
    }

    /// Returns `true` if values of `C` can be read from and written to this component.
    pub fn fits<C: Component>(&self) -> bool {
        self.size == mem::size_of::<C>() && self.align >= mem::align_of::<C>()
    }
}

fn check_layout(size: usize, align: usize) -> Result<()> {
    if align.is_power_of_two() && size % align == 0 {
        Ok(())
    } else {
        Err(StoreError::InvalidLayout { size, align })
    }
}

struct Registered {
    info: ComponentInfo,
    column: Column,
}

/// All registered component types and their columns, indexed by [`ComponentId`].
pub(crate) struct ComponentRegistry {
    components: Vec<Option<Registered>>,
    by_type: HashMap<TypeId, ComponentId>,
    next_id: usize,
    max_components: usize,
    component_capacity: usize,
    min_column_capacity: usize,
}

impl ComponentRegistry {
    pub fn new(config: &StoreConfig) -> Self {
        ComponentRegistry {
            components: Vec::new(),
            by_type: Default::default(),
            next_id: 1,
            max_components: config.max_components,
            component_capacity: config.component_capacity,
            min_column_capacity: config.min_column_capacity,
        }
    }

    /// Registers a component type under the next free identifier.
    pub fn register(&mut self, size: usize, align: usize) -> Result<ComponentId> {
        check_layout(size, align)?;
        let id = self.next_free_id()?;
        self.insert(ComponentInfo::raw(id, size, align));
        Ok(id)
    }

    /// Registers `C`, or returns its identifier if it is already registered.
    pub fn register_type<C: Component>(&mut self) -> Result<ComponentId> {
        if let Some(id) = self.by_type.get(&TypeId::of::<C>()) {
            return Ok(*id);
        }
        let id = self.next_free_id()?;
        self.insert(ComponentInfo::of::<C>(id));
        Ok(id)
    }

    /// Registers a component type under an explicit identifier.
    ///
    /// Registering an identifier again replaces its layout, which is only allowed
    /// while no entity holds the component.
    pub fn register_at(&mut self, id: ComponentId, size: usize, align: usize) -> Result<()> {
        self.check_range(id)?;
        check_layout(size, align)?;

        if let Some(existing) = self.get(id) {
            let same_layout = existing.info.size == size && existing.info.align == align;
            if same_layout {
                return Ok(());
            }
            if !existing.column.is_empty() {
                return Err(StoreError::LayoutConflict(id));
            }
        }
        self.insert(ComponentInfo::raw(id, size, align));
        Ok(())
    }

    fn next_free_id(&mut self) -> Result<ComponentId> {
        while self.next_id < self.max_components {
            let id = ComponentId(self.next_id as u16);
            self.next_id += 1;
            if self.get(id).is_none() {
                return Ok(id);
            }
        }
        Err(StoreError::ComponentLimit {
            id: ComponentId(self.max_components as u16),
            max: self.max_components,
        })
    }

    fn insert(&mut self, info: ComponentInfo) {
        let index = info.id.index();
        if index >= self.components.len() {
            self.components.resize_with(index + 1, || None);
        }

        if let Some(old) = self.components[index].take() {
            if let Some(type_id) = old.info.type_id {
                self.by_type.remove(&type_id);
            }
        }
        if let Some(type_id) = info.type_id {
            self.by_type.insert(type_id, info.id);
        }

        log::debug!(
            "registered {} ({} bytes, align {}{})",
            info.id,
            info.size,
            info.align,
            info.type_name.map(|n| format!(", `{n}`")).unwrap_or_default()
        );

        let column = Column::new(
            info.id,
            info.size,
            info.align,
            self.component_capacity,
            self.min_column_capacity,
        );
        self.components[index] = Some(Registered { info, column });
    }

    fn check_range(&self, id: ComponentId) -> Result<()> {
        if id == ComponentId::INVALID {
            return Err(StoreError::InvalidComponent(id));
        }
        if id.index() >= self.max_components {
            return Err(StoreError::ComponentLimit {
                id,
                max: self.max_components,
            });
        }
        Ok(())
    }

    /// Fails unless `id` is a registered component.
    pub fn check(&self, id: ComponentId) -> Result<()> {
        self.check_range(id)?;
        match self.get(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::UnregisteredComponent(id)),
        }
    }

    /// Builds the signature of `ids`, validating each of them.
    pub fn signature_of(&self, ids: &[ComponentId]) -> Result<Signature> {
        let mut sig = Signature::EMPTY;
        for &id in ids {
            self.check(id)?;
            sig.insert(id);
        }
        Ok(sig)
    }

    fn get(&self, id: ComponentId) -> Option<&Registered> {
        self.components.get(id.index())?.as_ref()
    }

    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.get(id).map(|r| &r.info)
    }

    pub fn id_of<C: Component>(&self) -> Option<ComponentId> {
        self.by_type.get(&TypeId::of::<C>()).copied()
    }

    /// Returns the identifier `C` is registered under, failing if it is not.
    pub fn require<C: Component>(&self) -> Result<ComponentId> {
        self.id_of::<C>()
            .ok_or(StoreError::UnregisteredType(any::type_name::<C>()))
    }

    pub fn column(&self, id: ComponentId) -> Option<&Column> {
        self.get(id).map(|r| &r.column)
    }

    pub fn column_mut(&mut self, id: ComponentId) -> Option<&mut Column> {
        self.components
            .get_mut(id.index())?
            .as_mut()
            .map(|r| &mut r.column)
    }

    /// Returns the number of registered component types.
    pub fn len(&self) -> usize {
        self.components.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ComponentRegistry {
        ComponentRegistry::new(&StoreConfig::default().with_max_components(8))
    }

    #[test]
    fn assigns_sequential_ids_from_one() {
        let mut reg = registry();
        assert_eq!(reg.register(8, 4), Ok(ComponentId(1)));
        assert_eq!(reg.register(4, 4), Ok(ComponentId(2)));
        assert_eq!(reg.info(ComponentId(2)).unwrap().size, 4);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn sequential_ids_skip_explicit_registrations() {
        let mut reg = registry();
        reg.register_at(ComponentId(1), 4, 4).unwrap();
        reg.register_at(ComponentId(2), 4, 4).unwrap();
        assert_eq!(reg.register(4, 4), Ok(ComponentId(3)));
    }

    #[test]
    fn rejects_invalid_ids() {
        let mut reg = registry();
        assert_eq!(
            reg.register_at(ComponentId::INVALID, 4, 4),
            Err(StoreError::InvalidComponent(ComponentId::INVALID))
        );
        assert_eq!(
            reg.register_at(ComponentId(8), 4, 4),
            Err(StoreError::ComponentLimit {
                id: ComponentId(8),
                max: 8
            })
        );
        assert_eq!(
            reg.check(ComponentId(5)),
            Err(StoreError::UnregisteredComponent(ComponentId(5)))
        );
    }

    #[test]
    fn runs_out_of_ids() {
        let mut reg = registry();
        for _ in 1..8 {
            reg.register(1, 1).unwrap();
        }
        assert!(matches!(
            reg.register(1, 1),
            Err(StoreError::ComponentLimit { max: 8, .. })
        ));
    }

    #[test]
    fn re_registration_respects_live_instances() {
        let mut reg = registry();
        let id = ComponentId(4);
        reg.register_at(id, 4, 4).unwrap();
        reg.register_at(id, 4, 4).unwrap();
        reg.register_at(id, 8, 4).unwrap();
        assert_eq!(reg.info(id).unwrap().size, 8);

        reg.column_mut(id).unwrap().attach(crate::EntityId(1)).unwrap();
        assert_eq!(reg.register_at(id, 16, 4), Err(StoreError::LayoutConflict(id)));
    }

    #[test]
    fn rejects_bad_layouts() {
        let mut reg = registry();
        assert_eq!(
            reg.register(4, 3),
            Err(StoreError::InvalidLayout { size: 4, align: 3 })
        );
        assert_eq!(
            reg.register(6, 4),
            Err(StoreError::InvalidLayout { size: 6, align: 4 })
        );
    }

    #[test]
    fn typed_registration_is_idempotent() {
        let mut reg = registry();
        let a = reg.register_type::<[f32; 2]>().unwrap();
        let b = reg.register_type::<[f32; 2]>().unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.id_of::<[f32; 2]>(), Some(a));
        assert!(reg.info(a).unwrap().fits::<[f32; 2]>());
        assert!(reg.require::<u64>().is_err());
    }
}
