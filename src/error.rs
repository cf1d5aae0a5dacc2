use crate::{ComponentId, EntityId};

/// Errors reported by [`EntityStore`](crate::EntityStore) operations.
///
/// Every failing operation leaves the store exactly as it was before the call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} is the reserved invalid component id")]
    InvalidComponent(ComponentId),

    #[error("{id} exceeds the component limit ({max})")]
    ComponentLimit { id: ComponentId, max: usize },

    #[error("{0} is not registered")]
    UnregisteredComponent(ComponentId),

    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),

    #[error("out of entity ids, a maximum of {0} entities is reached")]
    EntityLimit(u64),

    #[error("out of archetypes, a maximum of {0} archetypes is reached")]
    ArchetypeLimit(usize),

    #[error("{id} is full ({capacity} instances)")]
    ComponentCapacity { id: ComponentId, capacity: usize },

    #[error("{id} holds {expected} bytes per instance, got {actual}")]
    SizeMismatch {
        id: ComponentId,
        expected: usize,
        actual: usize,
    },

    #[error("a component of size {size} and alignment {align} cannot be laid out")]
    InvalidLayout { size: usize, align: usize },

    #[error("type `{0}` is not registered as a component")]
    UnregisteredType(&'static str),

    #[error("{0} was registered with a different layout than the requested type")]
    TypeMismatch(ComponentId),

    #[error("{0} has live instances and cannot change its layout")]
    LayoutConflict(ComponentId),

    #[error("failed to allocate {bytes} bytes of component storage")]
    OutOfMemory { bytes: usize },

    #[error("invalid store configuration: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, StoreError>;
