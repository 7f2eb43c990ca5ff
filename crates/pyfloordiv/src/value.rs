use crate::{
    heap::{Heap, HeapId},
    resource::ResourceTracker,
};

/// An operand or result of floor division.
///
/// Everything except `Ref` is stored inline. A `Ref` owns one reference to a
/// heap object, so `Value` is not `Clone`: copies go through
/// [`Value::clone_with_heap`] and every owned value is given back with
/// [`Value::drop_with_heap`].
#[derive(Debug)]
pub enum Value {
    None,
    /// The sentinel a slot returns to decline an operand pair.
    NotImplemented,
    Bool(bool),
    /// Native integer. The legacy `int` type, or a small modern `int`.
    Int(i64),
    Float(f64),
    Ref(HeapId),
}

impl Value {
    /// New reference to the same value.
    #[must_use]
    pub fn clone_with_heap(&self, heap: &mut Heap<impl ResourceTracker>) -> Self {
        match *self {
            Self::None => Self::None,
            Self::NotImplemented => Self::NotImplemented,
            Self::Bool(b) => Self::Bool(b),
            Self::Int(i) => Self::Int(i),
            Self::Float(f) => Self::Float(f),
            Self::Ref(id) => {
                heap.inc_ref(id);
                Self::Ref(id)
            }
        }
    }

    #[inline]
    pub fn drop_with_heap(self, heap: &mut Heap<impl ResourceTracker>) {
        if let Self::Ref(id) = self {
            heap.dec_ref(id);
        }
    }

    #[inline]
    #[must_use]
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented)
    }

    #[inline]
    #[must_use]
    pub fn ref_id(&self) -> Option<HeapId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }
}
