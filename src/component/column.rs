use crate::entity::{ComponentId, EntityId};
use crate::error::{Result, StoreError};
use crate::HashMap;
use index_pool::IndexPool;
use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};
use std::slice;

/// A zero-initialised, manually managed byte buffer holding `capacity` instances of one
/// component layout.
struct ColumnBuffer {
    ptr: NonNull<u8>,
    capacity: usize,
    item_size: usize,
    item_align: usize,
}

// The buffer only owns plain bytes.
unsafe impl Send for ColumnBuffer {}
unsafe impl Sync for ColumnBuffer {}

impl ColumnBuffer {
    fn new(item_size: usize, item_align: usize) -> Self {
        ColumnBuffer {
            ptr: Self::dangling(item_align),
            capacity: 0,
            item_size,
            item_align,
        }
    }

    /// An aligned, non-null pointer used while nothing is allocated.
    fn dangling(align: usize) -> NonNull<u8> {
        NonNull::new(align as *mut u8).unwrap_or(NonNull::dangling())
    }

    fn is_allocated(&self) -> bool {
        self.item_size != 0 && self.capacity != 0
    }

    fn grow_to(&mut self, new_capacity: usize) -> Result<()> {
        if new_capacity <= self.capacity {
            return Ok(());
        }
        if self.item_size == 0 {
            self.capacity = new_capacity;
            return Ok(());
        }

        let bytes = self
            .item_size
            .checked_mul(new_capacity)
            .ok_or(StoreError::OutOfMemory { bytes: usize::MAX })?;
        let new_layout = Layout::from_size_align(bytes, self.item_align)
            .map_err(|_| StoreError::OutOfMemory { bytes })?;

        // Safety: `new_layout` has a non-zero size.
        let new_ptr = unsafe { alloc::alloc_zeroed(new_layout) };
        let new_ptr = NonNull::new(new_ptr).ok_or(StoreError::OutOfMemory { bytes })?;

        if self.is_allocated() {
            // Safety: the old allocation is `item_size * capacity` bytes long,
            // the new one is strictly larger, and the two do not overlap.
            unsafe {
                let old_bytes = self.item_size * self.capacity;
                ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), old_bytes);
                alloc::dealloc(
                    self.ptr.as_ptr(),
                    Layout::from_size_align_unchecked(old_bytes, self.item_align),
                );
            }
        }

        self.ptr = new_ptr;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Returns a pointer to the start of `slot`. `slot` must be below `capacity`.
    #[inline]
    fn slot_ptr(&self, slot: usize) -> NonNull<u8> {
        debug_assert!(slot < self.capacity);
        // Safety: `slot < capacity`, so the offset stays inside the allocation
        // (or is zero for zero-sized items).
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(slot * self.item_size)) }
    }
}

impl Drop for ColumnBuffer {
    fn drop(&mut self) {
        if self.is_allocated() {
            // Safety: the layout is the one the buffer was allocated with.
            unsafe {
                alloc::dealloc(
                    self.ptr.as_ptr(),
                    Layout::from_size_align_unchecked(
                        self.item_size * self.capacity,
                        self.item_align,
                    ),
                );
            }
        }
    }
}

/// Dense storage of all instances of one component type.
///
/// Every entity holding the component owns exactly one slot. Slots vacated by
/// [`detach`](Column::detach) go back into a pool and are handed out again before the
/// buffer grows; other entities' slots never move.
pub struct Column {
    id: ComponentId,
    buffer: ColumnBuffer,
    slots: HashMap<EntityId, usize>,
    free_slots: IndexPool,
    high_water: usize,
    capacity_limit: usize,
    min_capacity: usize,
}

impl Column {
    pub(crate) fn new(
        id: ComponentId,
        size: usize,
        align: usize,
        capacity_limit: usize,
        min_capacity: usize,
    ) -> Self {
        Column {
            id,
            buffer: ColumnBuffer::new(size, align),
            slots: Default::default(),
            free_slots: IndexPool::new(),
            high_water: 0,
            capacity_limit,
            min_capacity,
        }
    }

    /// Size in bytes of one instance.
    pub fn item_size(&self) -> usize {
        self.buffer.item_size
    }

    /// Alignment in bytes of one instance.
    pub fn item_align(&self) -> usize {
        self.buffer.item_align
    }

    /// Returns the number of live instances.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the number of slots ever handed out, live or free.
    pub fn slot_count(&self) -> usize {
        self.high_water
    }

    /// Returns the number of vacated slots waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.high_water - self.slots.len()
    }

    /// Returns the number of instances the buffer can hold without growing.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity
    }

    /// Returns the slot of `entity`, if it holds this component.
    pub fn slot(&self, entity: EntityId) -> Option<usize> {
        self.slots.get(&entity).copied()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.slots.contains_key(&entity)
    }

    /// Makes sure the next [`attach`](Self::attach) cannot fail.
    pub(crate) fn reserve_one(&mut self) -> Result<()> {
        if self.free_count() > 0 || self.high_water < self.buffer.capacity {
            return Ok(());
        }
        if self.high_water >= self.capacity_limit {
            log::warn!(
                "{} reached its capacity of {} instances",
                self.id,
                self.capacity_limit
            );
            return Err(StoreError::ComponentCapacity {
                id: self.id,
                capacity: self.capacity_limit,
            });
        }

        let new_capacity = (self.buffer.capacity * 2)
            .max(self.min_capacity)
            .min(self.capacity_limit);
        self.buffer.grow_to(new_capacity)?;

        log::trace!("{} grew to {} instances", self.id, new_capacity);
        Ok(())
    }

    /// Allocates a zeroed slot for `entity`. Returns `false` if the entity already had one.
    pub(crate) fn attach(&mut self, entity: EntityId) -> Result<bool> {
        if self.slots.contains_key(&entity) {
            return Ok(false);
        }
        self.reserve_one()?;

        let slot = self.free_slots.new_id();
        debug_assert!(slot < self.buffer.capacity);

        if slot >= self.high_water {
            self.high_water = slot + 1;
        } else {
            self.zero_slot(slot);
        }
        self.slots.insert(entity, slot);

        Ok(true)
    }

    /// Releases the slot of `entity`. Returns `false` if the entity had none.
    pub(crate) fn detach(&mut self, entity: EntityId) -> bool {
        let Some(slot) = self.slots.remove(&entity) else {
            return false;
        };
        let returned = self.free_slots.return_id(slot);
        debug_assert!(returned.is_ok(), "slot {slot} was freed twice");
        true
    }

    /// Returns a read/write pointer to the instance held by `entity`.
    ///
    /// The pointer is valid until the column grows, which can only happen through
    /// a mutable store operation.
    pub fn data_ptr(&self, entity: EntityId) -> Option<NonNull<u8>> {
        self.slot(entity).map(|slot| self.buffer.slot_ptr(slot))
    }

    /// Returns the bytes of the instance held by `entity`.
    pub fn bytes(&self, entity: EntityId) -> Option<&[u8]> {
        let ptr = self.data_ptr(entity)?;
        // Safety: the slot is live and spans `item_size` bytes inside the buffer.
        unsafe { Some(slice::from_raw_parts(ptr.as_ptr(), self.buffer.item_size)) }
    }

    /// Returns the bytes of the instance held by `entity` for writing.
    pub fn bytes_mut(&mut self, entity: EntityId) -> Option<&mut [u8]> {
        let ptr = self.data_ptr(entity)?;
        // Safety: as in `bytes`, and `&mut self` guarantees uniqueness.
        unsafe { Some(slice::from_raw_parts_mut(ptr.as_ptr(), self.buffer.item_size)) }
    }

    /// Overwrites the instance held by `entity`.
    /// Returns `false` if the entity does not hold this component.
    pub(crate) fn set(&mut self, entity: EntityId, data: &[u8]) -> Result<bool> {
        if data.len() != self.buffer.item_size {
            return Err(StoreError::SizeMismatch {
                id: self.id,
                expected: self.buffer.item_size,
                actual: data.len(),
            });
        }
        match self.bytes_mut(entity) {
            Some(dst) => {
                dst.copy_from_slice(data);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Fills the instance held by `entity` with zeros.
    /// Returns `false` if the entity does not hold this component.
    pub(crate) fn zero(&mut self, entity: EntityId) -> bool {
        match self.slot(entity) {
            Some(slot) => {
                self.zero_slot(slot);
                true
            }
            None => false,
        }
    }

    fn zero_slot(&mut self, slot: usize) {
        let ptr = self.buffer.slot_ptr(slot);
        // Safety: the slot lies inside the buffer.
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, self.buffer.item_size) };
    }

    /// Returns an iterator over the entities holding this component and their slots.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, usize)> + '_ {
        self.slots.iter().map(|(entity, slot)| (*entity, *slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(size: usize, align: usize) -> Column {
        Column::new(ComponentId(1), size, align, 1 << 16, 4)
    }

    #[test]
    fn attach_detach_round_trip() {
        let mut col = column(8, 4);
        let e = EntityId(1);

        assert!(col.attach(e).unwrap());
        assert!(col.data_ptr(e).is_some());
        assert_eq!(col.bytes(e).unwrap(), &[0u8; 8]);

        assert!(col.detach(e));
        assert!(col.data_ptr(e).is_none());
        assert!(!col.detach(e));
    }

    #[test]
    fn attach_is_idempotent() {
        let mut col = column(4, 4);
        let e = EntityId(7);

        assert!(col.attach(e).unwrap());
        col.set(e, &[1, 2, 3, 4]).unwrap();
        assert!(!col.attach(e).unwrap());

        assert_eq!(col.len(), 1);
        assert_eq!(col.slot_count(), 1);
        assert_eq!(col.bytes(e).unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn reuses_free_slots_before_growing() {
        let mut col = column(4, 4);
        for raw in 1..=4 {
            col.attach(EntityId(raw)).unwrap();
        }
        assert_eq!(col.capacity(), 4);
        let freed = col.slot(EntityId(2)).unwrap();

        col.set(EntityId(2), &[9; 4]).unwrap();
        col.detach(EntityId(2));
        assert_eq!(col.free_count(), 1);

        col.attach(EntityId(5)).unwrap();
        assert_eq!(col.slot(EntityId(5)), Some(freed));
        assert_eq!(col.slot_count(), 4);
        assert_eq!(col.capacity(), 4);
        // Reused slots start out zeroed.
        assert_eq!(col.bytes(EntityId(5)).unwrap(), &[0; 4]);

        col.attach(EntityId(6)).unwrap();
        assert_eq!(col.capacity(), 8);
        assert_eq!(col.slot_count(), 5);
    }

    #[test]
    fn growth_preserves_data() {
        let mut col = column(8, 8);
        for raw in 1..=100u64 {
            let e = EntityId(raw);
            col.attach(e).unwrap();
            col.set(e, &raw.to_ne_bytes()).unwrap();
        }
        for raw in 1..=100u64 {
            assert_eq!(col.bytes(EntityId(raw)).unwrap(), &raw.to_ne_bytes());
            let ptr = col.data_ptr(EntityId(raw)).unwrap();
            assert_eq!(ptr.as_ptr() as usize % 8, 0);
        }
    }

    #[test]
    fn detach_moves_no_other_slot() {
        let mut col = column(2, 1);
        for raw in 1..=3 {
            col.attach(EntityId(raw)).unwrap();
        }
        let before = col.slot(EntityId(3));
        col.detach(EntityId(1));
        assert_eq!(col.slot(EntityId(3)), before);
    }

    #[test]
    fn enforces_capacity_limit() {
        let mut col = Column::new(ComponentId(3), 4, 4, 2, 1);
        col.attach(EntityId(1)).unwrap();
        col.attach(EntityId(2)).unwrap();
        assert_eq!(
            col.attach(EntityId(3)),
            Err(StoreError::ComponentCapacity {
                id: ComponentId(3),
                capacity: 2
            })
        );
        assert!(!col.contains(EntityId(3)));

        col.detach(EntityId(1));
        assert!(col.attach(EntityId(3)).unwrap());
    }

    #[test]
    fn zero_sized_instances_still_take_slots() {
        let mut col = column(0, 1);
        assert!(col.attach(EntityId(1)).unwrap());
        assert!(col.attach(EntityId(2)).unwrap());
        assert_eq!(col.len(), 2);
        assert_eq!(col.bytes(EntityId(1)).unwrap(), &[] as &[u8]);
        assert!(col.zero(EntityId(2)));
    }

    #[test]
    fn set_checks_length_and_presence() {
        let mut col = column(4, 4);
        col.attach(EntityId(1)).unwrap();

        assert!(matches!(
            col.set(EntityId(1), &[0; 3]),
            Err(StoreError::SizeMismatch { expected: 4, actual: 3, .. })
        ));
        assert_eq!(col.set(EntityId(2), &[0; 4]), Ok(false));
        assert!(!col.zero(EntityId(2)));
    }
}
