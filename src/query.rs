//! Superset queries over archetypes.

use crate::archetype::index::ArchetypeIndex;
use crate::entity::{ArchetypeId, EntityId};
use crate::signature::Signature;
use crate::StoreConfig;
use smallvec::SmallVec;
use std::iter::FusedIterator;
use std::slice;

/// A bucket holding a single entity keeps it inline; more spill to the heap.
type Bucket = SmallVec<[EntityId; 1]>;

/// A deduplicated set of entities, hashed into a fixed number of buckets.
///
/// Clearing keeps every bucket's allocation for the next query.
struct ResultSet {
    buckets: Vec<Bucket>,
    /// Indices of non-empty buckets, sorted once the set is filled.
    occupied: Vec<usize>,
    len: usize,
}

impl ResultSet {
    fn new(n_buckets: usize) -> Self {
        let mut buckets = Vec::with_capacity(n_buckets);
        buckets.resize_with(n_buckets.max(1), Bucket::new);
        ResultSet {
            buckets,
            occupied: Vec::new(),
            len: 0,
        }
    }

    #[inline]
    fn bucket_of(&self, entity: EntityId) -> usize {
        (entity.0 % self.buckets.len() as u64) as usize
    }

    fn clear(&mut self) {
        for i in self.occupied.drain(..) {
            self.buckets[i].clear();
        }
        self.len = 0;
    }

    /// Returns `false` if `entity` was already present.
    fn insert(&mut self, entity: EntityId) -> bool {
        let i = self.bucket_of(entity);
        let bucket = &mut self.buckets[i];

        if bucket.contains(&entity) {
            return false;
        }
        if bucket.is_empty() {
            self.occupied.push(i);
        }
        bucket.push(entity);
        self.len += 1;
        true
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.buckets[self.bucket_of(entity)].contains(&entity)
    }

    fn finish(&mut self) {
        self.occupied.sort_unstable();
    }
}

/// A reusable query session.
///
/// A session owns the buffers a query fills, so running queries does not allocate once the
/// buffers have grown to fit. Results stay available until the next
/// [`EntityStore::query`](crate::EntityStore::query) on the same session; the borrow checker
/// rejects re-running a session while one of its iterators is alive. Independent sessions
/// can be used side by side.
///
/// # Examples
/// ```
/// use archetype_store::{EntityStore, Query};
///
/// let mut store = EntityStore::new();
/// let health = store.register_component(4).unwrap();
/// let alive = store.register_component(0).unwrap();
///
/// let e = store.create(&[health, alive]).unwrap();
/// store.set(e, health, &30i32.to_ne_bytes()).unwrap();
///
/// let mut query = Query::new();
/// for _ in 0..3 {
///     store.query(&mut query, &[alive, health]).unwrap();
///     for entity in &query {
///         let hp = store.get_bytes_mut(entity, health).unwrap();
///         let left = i32::from_ne_bytes(hp[..4].try_into().unwrap()) - 10;
///         hp.copy_from_slice(&left.to_ne_bytes());
///         if left <= 0 {
///             store.remove(entity, &[alive]).unwrap();
///         }
///     }
/// }
///
/// assert_eq!(store.query(&mut query, &[alive]).unwrap(), 0);
/// ```
pub struct Query {
    signature: Signature,
    result: ResultSet,
    archetypes: Vec<ArchetypeId>,
}

impl Query {
    /// Creates a session with the default number of result buckets.
    pub fn new() -> Self {
        Self::with_buckets(StoreConfig::DEFAULT_RESULT_BUCKETS)
    }

    /// Creates a session whose result set uses `n_buckets` buckets.
    pub fn with_buckets(n_buckets: usize) -> Self {
        Query {
            signature: Signature::EMPTY,
            result: ResultSet::new(n_buckets),
            archetypes: Vec::new(),
        }
    }

    /// Refills the session with every member of every archetype implementing `signature`.
    pub(crate) fn execute(&mut self, index: &ArchetypeIndex, signature: Signature) -> usize {
        self.signature = signature;
        self.result.clear();

        index.find_supersets(&signature, &mut self.archetypes);

        for &arch_id in &self.archetypes {
            if let Some(arch) = index.get(arch_id) {
                for entity in arch.iter_entities() {
                    self.result.insert(entity);
                }
            }
        }
        self.result.finish();

        self.result.len
    }

    /// Returns the signature of the last query.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the archetypes the last query matched.
    pub fn archetypes(&self) -> &[ArchetypeId] {
        &self.archetypes
    }

    /// Returns the number of entities the last query matched.
    pub fn len(&self) -> usize {
        self.result.len
    }

    pub fn is_empty(&self) -> bool {
        self.result.len == 0
    }

    /// Returns `true` if the last query matched `entity`.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.result.contains(entity)
    }

    pub fn bucket_count(&self) -> usize {
        self.result.buckets.len()
    }

    /// Returns an iterator over the matched entities, bucket by bucket.
    pub fn iter(&self) -> QueryIter<'_> {
        QueryIter {
            buckets: &self.result.buckets,
            occupied: self.result.occupied.iter(),
            current: [].iter(),
            remaining: self.result.len,
        }
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = EntityId;
    type IntoIter = QueryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entities matched by a [`Query`].
#[derive(Clone)]
pub struct QueryIter<'a> {
    buckets: &'a [Bucket],
    occupied: slice::Iter<'a, usize>,
    current: slice::Iter<'a, EntityId>,
    remaining: usize,
}

impl QueryIter<'_> {
    /// Cursor-style access: returns the next entity, or [`EntityId::NULL`] at the end.
    pub fn next_entity(&mut self) -> EntityId {
        self.next().unwrap_or(EntityId::NULL)
    }
}

impl Iterator for QueryIter<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entity) = self.current.next() {
                self.remaining -= 1;
                return Some(*entity);
            }
            let bucket = *self.occupied.next()?;
            self.current = self.buckets[bucket].iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for QueryIter<'_> {}

impl FusedIterator for QueryIter<'_> {}
