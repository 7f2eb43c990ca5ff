use crate::{
    exception::{ExcType, RunError},
    floordiv::shape::OperandShape,
    level::LanguageLevel,
    runtime::Runtime,
    types::TypeObject,
};

/// The TypeError raised once every slot and coercion has declined.
///
/// Known shapes are named statically, so a legacy `long` reads as `'long'`
/// even where the live type would say otherwise.
pub(super) fn unsupported<L, A, B>(rt: &mut Runtime, type1: &TypeObject, type2: &TypeObject) -> RunError
where
    L: LanguageLevel,
    A: OperandShape<L>,
    B: OperandShape<L>,
{
    let lhs = A::KIND.map_or(type1.name(), |kind| kind.type_name(L::LEVEL));
    let rhs = B::KIND.map_or(type2.name(), |kind| kind.type_name(L::LEVEL));
    rt.tracer_mut().on_unsupported(lhs, rhs);
    ExcType::binary_type_error("//", lhs, rhs)
}
