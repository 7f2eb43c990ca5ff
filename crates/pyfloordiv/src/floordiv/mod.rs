//! The floor-division operator `a // b`.
//!
//! Every entry point is generic over the language level and the static shape
//! of both operands. The shape decides how much runtime type checking is
//! needed before a native kernel can run; whatever the kernels cannot take
//! goes through the generic slot protocol in [`dispatch`], and from there,
//! under the legacy level only, through the coercion fallback in [`coerce`].
//!
//! [`specialized`] instantiates the generic functions once per shape pair.

mod coerce;
mod dispatch;
pub mod kernel;
mod message;
mod projection;
pub mod shape;
pub mod specialized;

pub use projection::{NBool, floordiv_to_bool, try_floordiv_to_bool};
pub use shape::{BuiltinKind, FloatShape, IntShape, LongShape, ObjectShape, OperandShape};
pub use specialized::{legacy, modern};

use crate::{
    exception::{RunError, RunResult},
    level::{LanguageLevel, Level},
    runtime::Runtime,
    value::Value,
};
use kernel::FastResult;

/// Computes `lhs // rhs`, returning a new reference.
///
/// `lhs` and `rhs` are borrowed; operands with a known shape must be exactly
/// of that builtin type.
pub fn floordiv_to_object<L, A, B>(rt: &mut Runtime, lhs: &Value, rhs: &Value) -> RunResult<Value>
where
    L: LanguageLevel,
    A: OperandShape<L>,
    B: OperandShape<L>,
{
    run::<L, A, B, _>(rt, lhs, rhs, FastResult::into_value, |_, value| Ok(value))
}

/// Shared driver of the object and bool variants.
///
/// `fast` receives a kernel result, `slow` the owned result of slot dispatch.
fn run<L, A, B, R>(
    rt: &mut Runtime,
    lhs: &Value,
    rhs: &Value,
    fast: impl FnOnce(FastResult, &mut Runtime) -> RunResult<R>,
    slow: impl FnOnce(&mut Runtime, Value) -> RunResult<R>,
) -> RunResult<R>
where
    L: LanguageLevel,
    A: OperandShape<L>,
    B: OperandShape<L>,
{
    if rt.level() != L::LEVEL {
        return Err(level_mismatch(L::LEVEL, rt.level()));
    }
    let depth = rt.enter_dispatch()?;
    rt.tracer_mut().on_dispatch(A::NAME, B::NAME, depth);
    let result = match fast_kind::<L, A, B>(rt, lhs, rhs) {
        Some(kind) => kernel::run(rt, kind, lhs, rhs).and_then(|r| fast(r, rt)),
        None => dispatch::via_slots::<L, A, B>(rt, lhs, rhs).and_then(|value| slow(rt, value)),
    };
    rt.leave_dispatch();
    result
}

/// Picks the native kernel for this operand pair, if any.
///
/// A known shape is trusted; an unknown one qualifies only when its runtime
/// type is exactly the other side's builtin. Two unknown operands are only
/// inlined for the legacy native `int`.
fn fast_kind<L, A, B>(rt: &Runtime, lhs: &Value, rhs: &Value) -> Option<BuiltinKind>
where
    L: LanguageLevel,
    A: OperandShape<L>,
    B: OperandShape<L>,
{
    match (A::KIND, B::KIND) {
        (Some(k1), Some(k2)) => (k1 == k2).then_some(k1),
        (Some(k), None) => rt.is_exact(rhs, k).then_some(k),
        (None, Some(k)) => rt.is_exact(lhs, k).then_some(k),
        (None, None) => (L::LEVEL == Level::Legacy
            && rt.is_exact(lhs, BuiltinKind::Int)
            && rt.is_exact(rhs, BuiltinKind::Int))
        .then_some(BuiltinKind::Int),
    }
}

fn level_mismatch(expected: Level, actual: Level) -> RunError {
    RunError::internal(format!(
        "floor division instantiated for the {expected} level called on a {actual} runtime"
    ))
}
