//! Generic slot dispatch.
//!
//! Mirrors the host number protocol: each operand type may provide a
//! `floor_divide` slot; the right operand's slot goes first when its type is a
//! proper subtype of the left's, a `NotImplemented` result moves on to the
//! next candidate, and an error ends dispatch.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::{
    exception::{RunError, RunResult},
    floordiv::{
        coerce::{self, CoerceOutcome},
        message,
        shape::OperandShape,
    },
    level::LanguageLevel,
    runtime::Runtime,
    tracer::SlotSide,
    types::{FloorDivideSlot, TypeObject},
    value::Value,
};

type Candidates = SmallVec<[(SlotSide, Rc<dyn FloorDivideSlot>); 2]>;

/// Computes `lhs // rhs` through the operand types' slots.
pub(super) fn via_slots<L, A, B>(rt: &mut Runtime, lhs: &Value, rhs: &Value) -> RunResult<Value>
where
    L: LanguageLevel,
    A: OperandShape<L>,
    B: OperandShape<L>,
{
    let type1 = operand_type::<L, A>(rt, lhs)?;
    let type2 = operand_type::<L, B>(rt, rhs)?;
    let both_static = A::KIND.is_some() && B::KIND.is_some();

    for (side, slot) in candidates::<L, A, B>(rt, &type1, &type2, both_static) {
        rt.tracer_mut().on_slot_call(side);
        let result = slot.floor_divide(rt, lhs, rhs)?;
        if !result.is_not_implemented() {
            return Ok(result);
        }
        rt.tracer_mut().on_slot_declined(side);
        rt.drop_value(result);
    }

    if L::LEVEL.has_coercion()
        && !both_static
        && (!rt.is_new_style_number(&type1) || !rt.is_new_style_number(&type2))
        && let CoerceOutcome::Computed(result) = coerce::try_coerce(rt, lhs, rhs, &type1, &type2)?
    {
        return Ok(result);
    }

    Err(message::unsupported::<L, A, B>(rt, &type1, &type2))
}

/// Type descriptor of an operand: the builtin for a known shape, else its runtime type.
fn operand_type<L, S>(rt: &Runtime, value: &Value) -> RunResult<Rc<TypeObject>>
where
    L: LanguageLevel,
    S: OperandShape<L>,
{
    match S::KIND {
        Some(kind) => rt
            .builtins()
            .kind_type(kind)
            .cloned()
            .ok_or_else(|| RunError::internal(format!("no {kind} type under the {} level", L::LEVEL))),
        None => Ok(rt.type_of(value)),
    }
}

/// Slots to try, in order.
///
/// A known shape's slot is taken without the new-style check. The right slot
/// is dropped when both types are the same or share the left slot.
fn candidates<L, A, B>(rt: &Runtime, type1: &Rc<TypeObject>, type2: &Rc<TypeObject>, both_static: bool) -> Candidates
where
    L: LanguageLevel,
    A: OperandShape<L>,
    B: OperandShape<L>,
{
    let slot1 = if A::KIND.is_some() || rt.is_new_style_number(type1) {
        type1.floor_divide().cloned()
    } else {
        None
    };
    let slot2 = if !Rc::ptr_eq(type1, type2) && (B::KIND.is_some() || rt.is_new_style_number(type2)) {
        type2
            .floor_divide()
            .filter(|s2| !slot1.as_ref().is_some_and(|s1| Rc::ptr_eq(s1, s2)))
            .cloned()
    } else {
        None
    };

    let mut out = Candidates::new();
    match (slot1, slot2) {
        (Some(s1), Some(s2)) if !both_static && type2.is_subtype_of(type1) => {
            out.push((SlotSide::Right, s2));
            out.push((SlotSide::Left, s1));
        }
        (s1, s2) => {
            out.extend(s1.map(|s| (SlotSide::Left, s)));
            out.extend(s2.map(|s| (SlotSide::Right, s)));
        }
    }
    out
}
