//! LongInt wrapper for the arbitrary-precision integer type.
//!
//! Under the legacy level this is Python's `long`, a type distinct from the
//! native `int`. Under the modern level it is simply `int`, and values that fit
//! an `i64` are kept immediate.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::{
    heap::{Heap, HeapData},
    level::Level,
    resource::{ResourceError, ResourceTracker},
    value::Value,
};

/// Wrapper around `num_bigint::BigInt` for arbitrary precision integers.
///
/// The inner `BigInt` is accessible via `.0` for arithmetic operations that need direct
/// access to the underlying type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct LongInt(pub BigInt);

impl LongInt {
    /// Creates a new `LongInt` from a `BigInt`.
    pub fn new(bi: BigInt) -> Self {
        Self(bi)
    }

    /// Converts to a `Value`.
    ///
    /// Under the modern level values that fit an i64 are demoted to `Value::Int`,
    /// which is the same Python type. Under the legacy level the result must stay
    /// a `long` and is always heap allocated.
    pub fn into_value(self, level: Level, heap: &mut Heap<impl ResourceTracker>) -> Result<Value, ResourceError> {
        if level == Level::Modern
            && let Some(i) = self.0.to_i64()
        {
            return Ok(Value::Int(i));
        }
        let heap_id = heap.allocate(HeapData::Long(self))?;
        Ok(Value::Ref(heap_id))
    }

    /// Estimates memory size in bytes.
    ///
    /// Rounds up bits to bytes to avoid underestimating.
    pub fn estimate_size(&self) -> usize {
        let bits = self.0.bits();
        let bit_bytes = usize::try_from(bits).unwrap_or(usize::MAX).saturating_add(7) / 8;
        bit_bytes + std::mem::size_of::<BigInt>()
    }

    /// Returns a reference to the inner `BigInt`.
    pub fn inner(&self) -> &BigInt {
        &self.0
    }
}

impl From<BigInt> for LongInt {
    fn from(bi: BigInt) -> Self {
        Self(bi)
    }
}
