//! Builtin type descriptors and their number slots.
//!
//! These are the host implementations the generic dispatch falls back to: they
//! accept the operand representations CPython's own `int`, `long` and `float`
//! accept, and decline (return `NotImplemented`) for anything else.

use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::Zero;

use crate::{
    exception::{ExcType, RunResult},
    floordiv::{BuiltinKind, kernel},
    heap::HeapData,
    level::Level,
    runtime::Runtime,
    types::{Coercion, TypeBuilder, TypeObject},
    value::Value,
};

/// Builtin types of one language level.
#[derive(Debug, Clone)]
pub struct Builtins {
    pub object: Rc<TypeObject>,
    pub none_type: Rc<TypeObject>,
    pub not_implemented_type: Rc<TypeObject>,
    /// The native `int`; absent under the modern level.
    pub int: Option<Rc<TypeObject>>,
    /// The arbitrary-precision integer: `long` (legacy) or `int` (modern).
    pub long: Rc<TypeObject>,
    pub float: Rc<TypeObject>,
    pub bool: Rc<TypeObject>,
}

impl Builtins {
    #[must_use]
    pub fn new(level: Level) -> Self {
        let object = TypeBuilder::new("object").classic().build();
        let none_type = TypeBuilder::new("NoneType")
            .base(&object)
            .classic()
            .truth(|_, _| Ok(false))
            .build();
        let not_implemented_type = TypeBuilder::new("NotImplementedType").base(&object).classic().build();

        let int = level.has_native_int().then(|| {
            with_coerce(TypeBuilder::new("int"), level, int_coerce)
                .base(&object)
                .floor_divide(int_floor_divide)
                .truth(numeric_truth)
                .build()
        });
        let long = with_coerce(TypeBuilder::new(level.long_type_name()), level, long_coerce)
            .base(&object)
            .floor_divide(long_floor_divide)
            .truth(numeric_truth)
            .build();
        let float = with_coerce(TypeBuilder::new("float"), level, float_coerce)
            .base(&object)
            .floor_divide(float_floor_divide)
            .truth(numeric_truth)
            .build();
        let bool = TypeBuilder::new("bool").base(int.as_ref().unwrap_or(&long)).build();

        Self {
            object,
            none_type,
            not_implemented_type,
            int,
            long,
            float,
            bool,
        }
    }

    /// Type descriptor of a fast-path kind. `None` for `Int` under the modern level.
    #[must_use]
    pub fn kind_type(&self, kind: BuiltinKind) -> Option<&Rc<TypeObject>> {
        match kind {
            BuiltinKind::Int => self.int.as_ref(),
            BuiltinKind::Long => Some(&self.long),
            BuiltinKind::Float => Some(&self.float),
        }
    }
}

fn with_coerce(
    builder: TypeBuilder,
    level: Level,
    slot: fn(&mut Runtime, &Value, &Value) -> RunResult<Coercion>,
) -> TypeBuilder {
    if level.has_coercion() { builder.coerce(slot) } else { builder }
}

/// Numeric view of an operand as the builtin slots see it.
///
/// Subclass instances are viewed through their payload.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Num<'a> {
    /// Native integer, including `bool`.
    Int(i64),
    Long(&'a BigInt),
    Float(f64),
}

impl Num<'_> {
    fn to_bigint(self) -> Option<BigInt> {
        match self {
            Self::Int(i) => Some(BigInt::from(i)),
            Self::Long(bi) => Some(bi.clone()),
            Self::Float(_) => None,
        }
    }
}

pub(crate) fn num_of<'a>(rt: &'a Runtime, value: &'a Value) -> Option<Num<'a>> {
    match value {
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        Value::Ref(id) => match rt.heap().get(*id) {
            HeapData::Long(li) => Some(Num::Long(li.inner())),
            HeapData::Instance(inst) => num_of(rt, inst.payload()),
        },
        Value::None | Value::NotImplemented => None,
    }
}

fn int_floor_divide(rt: &mut Runtime, lhs: &Value, rhs: &Value) -> RunResult<Value> {
    let (Some(Num::Int(a)), Some(Num::Int(b))) = (num_of(rt, lhs), num_of(rt, rhs)) else {
        return Ok(Value::NotImplemented);
    };
    match kernel::int_floordiv(a, b) {
        Ok(Some(q)) => Ok(Value::Int(q)),
        Ok(None) => rt.new_long(kernel::int_floordiv_wide(a, b)),
        Err(_) => Err(ExcType::integer_division_by_zero().into()),
    }
}

fn long_floor_divide(rt: &mut Runtime, lhs: &Value, rhs: &Value) -> RunResult<Value> {
    let quotient = {
        let (Some(a), Some(b)) = (
            num_of(rt, lhs).and_then(Num::to_bigint),
            num_of(rt, rhs).and_then(Num::to_bigint),
        ) else {
            return Ok(Value::NotImplemented);
        };
        kernel::long_floordiv(&a, &b).map_err(|_| ExcType::long_division_by_zero(rt.level()))?
    };
    rt.new_long(quotient)
}

/// Converts an operand to a double as `float`'s slots do.
///
/// `Ok(None)` means the operand is not a number.
fn to_double(rt: &Runtime, value: &Value) -> RunResult<Option<f64>> {
    match num_of(rt, value) {
        Some(Num::Float(f)) => Ok(Some(f)),
        Some(Num::Int(i)) => Ok(Some(i as f64)),
        Some(Num::Long(bi)) => match kernel::bigint_to_f64(bi) {
            Some(f) => Ok(Some(f)),
            None => Err(ExcType::int_too_large_for_float(rt.level()).into()),
        },
        None => Ok(None),
    }
}

fn float_floor_divide(rt: &mut Runtime, lhs: &Value, rhs: &Value) -> RunResult<Value> {
    let Some(a) = to_double(rt, lhs)? else {
        return Ok(Value::NotImplemented);
    };
    let Some(b) = to_double(rt, rhs)? else {
        return Ok(Value::NotImplemented);
    };
    match kernel::float_floordiv(a, b) {
        Ok(f) => Ok(Value::Float(f)),
        Err(_) => Err(ExcType::float_division_by_zero(rt.level()).into()),
    }
}

fn numeric_truth(rt: &mut Runtime, value: &Value) -> RunResult<bool> {
    Ok(match num_of(rt, value) {
        Some(Num::Int(i)) => i != 0,
        Some(Num::Long(bi)) => !bi.is_zero(),
        Some(Num::Float(f)) => f != 0.0,
        None => true,
    })
}

// ============================================================================
// Legacy coercion slots
// ============================================================================

fn int_coerce(rt: &mut Runtime, own: &Value, other: &Value) -> RunResult<Coercion> {
    if !matches!(num_of(rt, other), Some(Num::Int(_))) {
        return Ok(Coercion::Declined);
    }
    Ok(Coercion::Coerced(rt.clone_value(own), rt.clone_value(other)))
}

fn long_coerce(rt: &mut Runtime, own: &Value, other: &Value) -> RunResult<Coercion> {
    let widened = match num_of(rt, other) {
        Some(Num::Int(i)) => Some(BigInt::from(i)),
        Some(Num::Long(_)) => None,
        _ => return Ok(Coercion::Declined),
    };
    let other = match widened {
        Some(bi) => rt.new_long(bi)?,
        None => rt.clone_value(other),
    };
    Ok(Coercion::Coerced(rt.clone_value(own), other))
}

fn float_coerce(rt: &mut Runtime, own: &Value, other: &Value) -> RunResult<Coercion> {
    let already_float = match num_of(rt, other) {
        Some(Num::Float(_)) => true,
        Some(Num::Int(_) | Num::Long(_)) => false,
        None => return Ok(Coercion::Declined),
    };
    let other = if already_float {
        rt.clone_value(other)
    } else {
        match to_double(rt, other)? {
            Some(f) => Value::Float(f),
            None => return Ok(Coercion::Declined),
        }
    };
    Ok(Coercion::Coerced(rt.clone_value(own), other))
}
