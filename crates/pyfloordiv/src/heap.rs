use std::{
    collections::BTreeMap,
    marker::PhantomData,
    mem::{ManuallyDrop, size_of},
    rc::Rc,
};

use crate::{
    resource::{ResourceError, ResourceTracker},
    types::{LongInt, TypeObject},
    value::Value,
};

/// Point-in-time view of the heap, used for leak checks.
///
/// `objects_by_type` is a `BTreeMap` so snapshots compare and print in a
/// stable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    pub live_objects: usize,
    /// Released slots waiting on the free list.
    pub free_slots: usize,
    /// Slots ever created, live or free.
    pub total_slots: usize,
    /// Live objects keyed by [`HeapData`] variant (`"Long"`, `"Instance"`).
    pub objects_by_type: BTreeMap<&'static str, usize>,
    /// Allocations counted by a limiting tracker.
    pub tracker_allocations: Option<usize>,
    /// Bytes accounted by a limiting tracker.
    pub tracker_memory_bytes: Option<usize>,
}

/// Index of an object in the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct HeapId(usize);

impl HeapId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Object of a user-defined type.
///
/// When the type derives from a builtin number type, `payload` holds the
/// number the instance stands for; otherwise it is `Value::None`.
#[derive(Debug)]
pub struct Instance {
    class: Rc<TypeObject>,
    payload: Value,
}

impl Instance {
    #[must_use]
    pub fn new(class: Rc<TypeObject>, payload: Value) -> Self {
        Self { class, payload }
    }

    #[must_use]
    pub fn class(&self) -> &Rc<TypeObject> {
        &self.class
    }

    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// What a heap slot can hold.
#[derive(Debug)]
pub enum HeapData {
    Long(LongInt),
    Instance(Instance),
}

impl HeapData {
    fn variant_name(&self) -> &'static str {
        match self {
            Self::Long(_) => "Long",
            Self::Instance(_) => "Instance",
        }
    }

    /// Bytes charged against the memory limit.
    fn estimate_size(&self) -> usize {
        match self {
            Self::Long(li) => li.estimate_size(),
            Self::Instance(_) => size_of::<Instance>(),
        }
    }

    /// The heap reference this object owns, if any.
    fn child(&self) -> Option<HeapId> {
        match self {
            Self::Instance(inst) => inst.payload.ref_id(),
            Self::Long(_) => None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    refcount: usize,
    data: HeapData,
}

/// Arena of reference-counted objects.
///
/// Released slots go on a free list and are handed out again by the next
/// allocation, so a `HeapId` is only meaningful while its object is alive.
#[derive(Debug)]
pub struct Heap<T: ResourceTracker> {
    slots: Vec<Option<Slot>>,
    free_list: Vec<HeapId>,
    tracker: T,
}

impl<T: ResourceTracker> Heap<T> {
    pub fn new(capacity: usize, tracker: T) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            tracker,
        }
    }

    /// Stores `data` with a reference count of one.
    ///
    /// The tracker is consulted first; a refused allocation leaves the heap untouched.
    pub fn allocate(&mut self, data: HeapData) -> Result<HeapId, ResourceError> {
        self.tracker.on_allocate(|| data.estimate_size())?;
        let slot = Some(Slot { refcount: 1, data });
        Ok(match self.free_list.pop() {
            Some(id) => {
                self.slots[id.index()] = slot;
                id
            }
            None => {
                self.slots.push(slot);
                HeapId(self.slots.len() - 1)
            }
        })
    }

    /// # Panics
    /// Panics if `id` does not name a live object.
    pub fn inc_ref(&mut self, id: HeapId) {
        self.live_mut(id, "inc_ref").refcount += 1;
    }

    /// Drops one reference, freeing the object and releasing what it owns at zero.
    ///
    /// # Panics
    /// Panics if `id` does not name a live object.
    pub fn dec_ref(&mut self, id: HeapId) {
        let mut next = Some(id);
        while let Some(id) = next.take() {
            let slot = self.live_mut(id, "dec_ref");
            slot.refcount -= 1;
            if slot.refcount > 0 {
                return;
            }
            let Some(freed) = self.slots[id.index()].take() else {
                unreachable!("slot checked live above");
            };
            self.free_list.push(id);
            self.tracker.on_free(|| freed.data.estimate_size());
            next = freed.data.child();
        }
    }

    /// # Panics
    /// Panics if `id` does not name a live object.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        &self.live(id, "get").data
    }

    /// # Panics
    /// Panics if `id` does not name a live object.
    #[must_use]
    pub fn get_refcount(&self, id: HeapId) -> usize {
        self.live(id, "get_refcount").refcount
    }

    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let mut objects_by_type = BTreeMap::new();
        for slot in self.slots.iter().flatten() {
            *objects_by_type.entry(slot.data.variant_name()).or_insert(0) += 1;
        }
        HeapStats {
            live_objects: objects_by_type.values().sum(),
            free_slots: self.free_list.len(),
            total_slots: self.slots.len(),
            objects_by_type,
            tracker_allocations: self.tracker.allocation_count(),
            tracker_memory_bytes: self.tracker.current_memory_bytes(),
        }
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    fn live(&self, id: HeapId, op: &str) -> &Slot {
        match self.slots.get(id.index()) {
            Some(Some(slot)) => slot,
            _ => panic!("Heap::{op}: {id:?} is not a live object"),
        }
    }

    fn live_mut(&mut self, id: HeapId, op: &str) -> &mut Slot {
        match self.slots.get_mut(id.index()) {
            Some(Some(slot)) => slot,
            _ => panic!("Heap::{op}: {id:?} is not a live object"),
        }
    }
}

/// Anything that owns a [`Heap`] and can lend it to a [`HeapGuard`].
pub(crate) trait ContainsHeap<T: ResourceTracker> {
    fn heap_mut(&mut self) -> &mut Heap<T>;
}

impl<T: ResourceTracker> ContainsHeap<T> for Heap<T> {
    #[inline]
    fn heap_mut(&mut self) -> &mut Self {
        self
    }
}

/// Explicit release for values holding heap references.
///
/// `Drop` cannot reach the heap, so every owner must call this on every path.
/// Use [`defer_drop!`] to have a guard do it.
pub(crate) trait DropWithHeap<T: ResourceTracker> {
    fn drop_with_heap(self, heap: &mut Heap<T>);
}

impl<T: ResourceTracker> DropWithHeap<T> for Value {
    #[inline]
    fn drop_with_heap(self, heap: &mut Heap<T>) {
        Self::drop_with_heap(self, heap);
    }
}

/// A coerced operand pair.
impl<T: ResourceTracker> DropWithHeap<T> for (Value, Value) {
    fn drop_with_heap(self, heap: &mut Heap<T>) {
        self.0.drop_with_heap(heap);
        self.1.drop_with_heap(heap);
    }
}

/// Scope guard that releases its value when dropped, including on `?` and early returns.
///
/// Build it through [`defer_drop!`].
pub(crate) struct HeapGuard<'a, T: ResourceTracker, H: ContainsHeap<T>, V: DropWithHeap<T>> {
    // taken out by move in Drop
    value: ManuallyDrop<V>,
    heap: &'a mut H,
    _tracker: PhantomData<T>,
}

impl<'a, T: ResourceTracker, H: ContainsHeap<T>, V: DropWithHeap<T>> HeapGuard<'a, T, H, V> {
    #[inline]
    pub fn new(value: V, heap: &'a mut H) -> Self {
        Self {
            value: ManuallyDrop::new(value),
            heap,
            _tracker: PhantomData,
        }
    }

    /// Lends the guarded value and the heap owner for the rest of the scope.
    #[inline]
    pub fn as_parts(&mut self) -> (&V, &mut H) {
        (&self.value, self.heap)
    }
}

impl<T: ResourceTracker, H: ContainsHeap<T>, V: DropWithHeap<T>> Drop for HeapGuard<'_, T, H, V> {
    fn drop(&mut self) {
        // SAFETY: `value` is only taken here, and Drop runs once.
        unsafe { ManuallyDrop::take(&mut self.value) }.drop_with_heap(self.heap.heap_mut());
    }
}

/// Moves `$value` into a [`HeapGuard`] and rebinds `$value` as `&V` and `$heap`
/// as `&mut H` until the end of the scope.
///
/// `$heap` must be a plain binding, not `self`.
macro_rules! defer_drop {
    ($value:ident, $heap:ident) => {
        let mut _guard = $crate::heap::HeapGuard::new($value, $heap);
        #[allow(
            clippy::allow_attributes,
            reason = "either rebinding may go unused at a given call site"
        )]
        #[allow(unused_variables)]
        let ($value, $heap) = _guard.as_parts();
    };
}

pub(crate) use defer_drop;

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::*;
    use crate::resource::{LimitedTracker, NoLimitTracker, ResourceLimits};

    fn long(i: i64) -> HeapData {
        HeapData::Long(LongInt::new(BigInt::from(i)))
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut heap = Heap::new(4, NoLimitTracker::new());
        let a = heap.allocate(long(1)).unwrap();
        let b = heap.allocate(long(2)).unwrap();
        heap.dec_ref(a);
        assert_eq!(heap.stats().free_slots, 1);
        let c = heap.allocate(long(3)).unwrap();
        assert_eq!(c, a, "freed slot should be recycled");
        assert_eq!(heap.stats().live_objects, 2);
        heap.dec_ref(b);
        heap.dec_ref(c);
        assert_eq!(heap.stats().live_objects, 0);
    }

    #[test]
    fn inc_ref_keeps_object_alive() {
        let mut heap = Heap::new(1, NoLimitTracker::new());
        let id = heap.allocate(long(10)).unwrap();
        heap.inc_ref(id);
        assert_eq!(heap.get_refcount(id), 2);
        heap.dec_ref(id);
        assert!(matches!(heap.get(id), HeapData::Long(_)));
        heap.dec_ref(id);
        assert_eq!(heap.stats().live_objects, 0);
    }

    #[test]
    fn freeing_an_instance_releases_its_payload() {
        let mut heap = Heap::new(2, NoLimitTracker::new());
        let payload = heap.allocate(long(5)).unwrap();
        let class = crate::types::TypeBuilder::new("Sub").build();
        let inst = heap
            .allocate(HeapData::Instance(Instance::new(class, Value::Ref(payload))))
            .unwrap();
        assert_eq!(heap.stats().objects_by_type.get("Long"), Some(&1));
        heap.dec_ref(inst);
        assert_eq!(heap.stats().live_objects, 0);
        assert_eq!(heap.stats().free_slots, 2);
    }

    #[test]
    fn allocation_limit_is_enforced() {
        let mut heap = Heap::new(1, LimitedTracker::new(ResourceLimits::new().max_allocations(1)));
        heap.allocate(long(1)).unwrap();
        let err = heap.allocate(long(2)).unwrap_err();
        assert!(matches!(err, ResourceError::Allocation { limit: 1, .. }));
        assert_eq!(heap.stats().tracker_allocations, Some(1));
    }

    #[test]
    #[should_panic(expected = "is not a live object")]
    fn released_id_panics() {
        let mut heap = Heap::new(1, NoLimitTracker::new());
        let id = heap.allocate(long(1)).unwrap();
        heap.dec_ref(id);
        let _ = heap.get(id);
    }

    #[test]
    fn guard_releases_on_early_exit() {
        fn consume(value: Value, heap: &mut Heap<NoLimitTracker>, fail: bool) -> Result<(), ()> {
            defer_drop!(value, heap);
            if fail {
                return Err(());
            }
            assert!(matches!(value, Value::Ref(_)));
            Ok(())
        }

        let mut heap = Heap::new(1, NoLimitTracker::new());
        let id = heap.allocate(long(7)).unwrap();
        assert!(consume(Value::Ref(id), &mut heap, true).is_err());
        assert_eq!(heap.stats().live_objects, 0);
    }
}
