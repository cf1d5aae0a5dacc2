pub mod entities;
pub mod index;

use crate::entity::EntityId;
use crate::signature::Signature;
use entities::{ArchetypeEntities, EntitiesIter};
use std::hash::{BuildHasher, Hash, Hasher};

/// Hash key of an archetype: its signature with the hash computed once up front.
#[derive(Clone, Eq)]
pub(crate) struct ArchetypeKey {
    signature: Signature,
    hash_val: u64,
}

impl ArchetypeKey {
    pub fn new(signature: Signature) -> ArchetypeKey {
        // Fixed seeds keep bucketing deterministic across runs.
        let state = ahash::RandomState::with_seeds(
            0x243f_6a88_85a3_08d3,
            0x1319_8a2e_0370_7344,
            0xa409_3822_299f_31d0,
            0x082e_fa98_ec4e_6c89,
        );
        let mut hasher = state.build_hasher();
        signature.words().hash(&mut hasher);
        let hash_val = hasher.finish();

        ArchetypeKey {
            signature,
            hash_val,
        }
    }
}

impl PartialEq for ArchetypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash_val == other.hash_val && self.signature == other.signature
    }
}

impl Hash for ArchetypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_val.hash(state);
    }
}

/// The set of entities sharing one exact signature.
pub struct Archetype {
    signature: Signature,
    pub(crate) entities: ArchetypeEntities,
}

impl Archetype {
    pub(crate) fn new(signature: Signature) -> Self {
        Archetype {
            signature,
            entities: Default::default(),
        }
    }

    /// Returns the components every member implements.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns an iterator over the members.
    pub fn iter_entities(&self) -> EntitiesIter<'_> {
        self.entities.iter()
    }

    /// Returns the members.
    pub fn entities(&self) -> &[EntityId] {
        self.entities.as_slice()
    }

    /// Returns `true` if `entity` is a member.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(entity)
    }

    /// Returns the number of members.
    pub fn count_entities(&self) -> usize {
        self.entities.count()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.count() == 0
    }
}
