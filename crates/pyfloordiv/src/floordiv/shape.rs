//! Static operand shapes.
//!
//! A shape is what the compiler knows about an operand's type at the call site:
//! exactly one of the builtin fast-path types, or nothing ([`ObjectShape`]).
//! The shapes are zero-sized markers; [`OperandShape`] is implemented per
//! language level so the native-int shape cannot be named under `Modern`.

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::level::{LanguageLevel, Legacy, Level};

/// Builtin types with a native floor-division kernel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BuiltinKind {
    /// Native fixed-width `int` (legacy only).
    Int,
    /// Arbitrary-precision integer.
    Long,
    Float,
}

impl BuiltinKind {
    /// Name used in error messages when the type is statically known.
    #[must_use]
    pub fn type_name(self, level: Level) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Long => level.long_type_name(),
            Self::Float => "float",
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Compile-time knowledge about one operand.
pub trait OperandShape<L: LanguageLevel>: sealed::Sealed {
    /// The statically known builtin type, or `None` for an arbitrary object.
    const KIND: Option<BuiltinKind>;
    /// Short name used in traces.
    const NAME: &'static str;
}

/// Operand statically known to be an exact native `int`.
#[derive(Debug, Clone, Copy)]
pub struct IntShape;

/// Operand statically known to be an exact arbitrary-precision integer.
#[derive(Debug, Clone, Copy)]
pub struct LongShape;

/// Operand statically known to be an exact `float`.
#[derive(Debug, Clone, Copy)]
pub struct FloatShape;

/// Operand of unknown type.
#[derive(Debug, Clone, Copy)]
pub struct ObjectShape;

impl sealed::Sealed for IntShape {}
impl sealed::Sealed for LongShape {}
impl sealed::Sealed for FloatShape {}
impl sealed::Sealed for ObjectShape {}

impl OperandShape<Legacy> for IntShape {
    const KIND: Option<BuiltinKind> = Some(BuiltinKind::Int);
    const NAME: &'static str = "int";
}

impl<L: LanguageLevel> OperandShape<L> for LongShape {
    const KIND: Option<BuiltinKind> = Some(BuiltinKind::Long);
    const NAME: &'static str = "long";
}

impl<L: LanguageLevel> OperandShape<L> for FloatShape {
    const KIND: Option<BuiltinKind> = Some(BuiltinKind::Float);
    const NAME: &'static str = "float";
}

impl<L: LanguageLevel> OperandShape<L> for ObjectShape {
    const KIND: Option<BuiltinKind> = None;
    const NAME: &'static str = "object";
}
