//! Legacy numeric coercion.
//!
//! When neither slot takes the operand pair and one of the types predates the
//! new-style number protocol, each type's `coerce` slot may convert both
//! operands to a common type whose `floor_divide` then computes the result.

use std::rc::Rc;

use crate::{
    exception::RunResult,
    heap::defer_drop,
    runtime::Runtime,
    tracer::SlotSide,
    types::{Coercion, TypeObject},
    value::Value,
};

pub(super) enum CoerceOutcome {
    Computed(Value),
    /// No coercion produced a result; dispatch reports the operand types.
    Unsupported,
}

/// Tries the left type's coercion, then the right's.
pub(super) fn try_coerce(
    rt: &mut Runtime,
    lhs: &Value,
    rhs: &Value,
    type1: &Rc<TypeObject>,
    type2: &Rc<TypeObject>,
) -> RunResult<CoerceOutcome> {
    if let Some(c1) = type1.coerce().cloned() {
        let coerced = c1.coerce(rt, lhs, rhs)?;
        if let Some(outcome) = finish(rt, SlotSide::Left, coerced)? {
            return Ok(outcome);
        }
    }
    if let Some(c2) = type2.coerce().cloned() {
        // called with its own operand first; swap the pair back into place
        let coerced = match c2.coerce(rt, rhs, lhs)? {
            Coercion::Coerced(own, other) => Coercion::Coerced(other, own),
            Coercion::Declined => Coercion::Declined,
        };
        if let Some(outcome) = finish(rt, SlotSide::Right, coerced)? {
            return Ok(outcome);
        }
    }
    Ok(CoerceOutcome::Unsupported)
}

/// Runs the coerced pair through its left type's slot.
///
/// `None` lets the caller try the next coercion. A slot that still declines
/// the coerced pair ends dispatch.
fn finish(rt: &mut Runtime, side: SlotSide, coerced: Coercion) -> RunResult<Option<CoerceOutcome>> {
    let Coercion::Coerced(lhs, rhs) = coerced else {
        rt.tracer_mut().on_coerce(side, false);
        return Ok(None);
    };
    rt.tracer_mut().on_coerce(side, true);
    let pair = (lhs, rhs);
    defer_drop!(pair, rt);

    let Some(slot) = rt.type_of(&pair.0).floor_divide().cloned() else {
        return Ok(None);
    };
    let result = slot.floor_divide(rt, &pair.0, &pair.1)?;
    if result.is_not_implemented() {
        rt.drop_value(result);
        return Ok(Some(CoerceOutcome::Unsupported));
    }
    Ok(Some(CoerceOutcome::Computed(result)))
}
