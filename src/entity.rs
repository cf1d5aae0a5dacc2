use std::fmt;

/// An entity identifier.
///
/// Identifiers are handed out sequentially starting at 1 and are never reused.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct EntityId(pub(crate) u64);

impl EntityId {
    /// The reserved "absent" entity. Also marks the end of a query cursor.
    pub const NULL: Self = EntityId(0);

    /// Constructs an entity identifier from its raw value.
    pub const fn from_raw(raw: u64) -> EntityId {
        EntityId(raw)
    }

    /// Returns the raw value of the identifier.
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is [`EntityId::NULL`].
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        EntityId::NULL
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A component type identifier.
///
/// Identifiers are small integers below the configured component limit; `0` is reserved.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ComponentId(pub(crate) u16);

impl ComponentId {
    pub const INVALID: Self = ComponentId(0);

    /// Constructs a component identifier from its raw value.
    /// The value is not checked until the identifier is handed to a store.
    pub const fn from_raw(raw: u16) -> ComponentId {
        ComponentId(raw)
    }

    pub const fn to_raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component {}", self.0)
    }
}

/// An archetype identifier. Indexes into the archetype list of a store.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ArchetypeId(pub(crate) u32);

impl ArchetypeId {
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}
