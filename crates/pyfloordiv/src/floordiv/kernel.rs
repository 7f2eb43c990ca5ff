//! Native floor-division kernels.
//!
//! The pure functions here are shared by the fast paths and the builtin slots.
//! [`run`] applies a kernel to two operands whose exact type is already known.

use std::borrow::Cow;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

use crate::{
    exception::{ExcType, RunError, RunResult},
    floordiv::BuiltinKind,
    heap::HeapData,
    level::Level,
    runtime::Runtime,
    value::Value,
};

/// The divisor was zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivisionByZero;

/// Floor division of native integers.
///
/// Returns `Ok(None)` for the single overflowing case `i64::MIN // -1`, whose
/// result only fits an arbitrary-precision integer.
pub fn int_floordiv(a: i64, b: i64) -> Result<Option<i64>, DivisionByZero> {
    if b == 0 {
        return Err(DivisionByZero);
    }
    if b == -1 && a == i64::MIN {
        return Ok(None);
    }
    let mut q = a / b;
    let r = a - q * b;
    // truncation rounded toward zero; step down when the remainder's sign disagrees with the divisor
    if r != 0 && ((r < 0) != (b < 0)) {
        q -= 1;
    }
    Ok(Some(q))
}

/// Floor division of native integers computed in 128 bits.
///
/// Never overflows; `b` must be non-zero.
#[must_use]
pub fn int_floordiv_wide(a: i64, b: i64) -> BigInt {
    debug_assert!(b != 0, "int_floordiv_wide called with zero divisor");
    BigInt::from(Integer::div_floor(&i128::from(a), &i128::from(b)))
}

/// Floor division of arbitrary-precision integers.
pub fn long_floordiv(a: &BigInt, b: &BigInt) -> Result<BigInt, DivisionByZero> {
    if b.is_zero() {
        Err(DivisionByZero)
    } else {
        Ok(a.div_floor(b))
    }
}

/// Floor division of doubles with CPython's rounding and signed-zero rules.
pub fn float_floordiv(a: f64, b: f64) -> Result<f64, DivisionByZero> {
    if b == 0.0 {
        return Err(DivisionByZero);
    }
    // `%` on f64 is C's fmod: the remainder carries the dividend's sign
    let rem = a % b;
    let mut div = (a - rem) / b;
    if rem != 0.0 && ((b < 0.0) != (rem < 0.0)) {
        div -= 1.0;
    }
    let floordiv = if div == 0.0 {
        0.0f64.copysign(a / b)
    } else {
        let mut floor = div.floor();
        if div - floor > 0.5 {
            floor += 1.0;
        }
        floor
    };
    Ok(floordiv)
}

/// Converts an arbitrary-precision integer to a finite double.
///
/// `None` when the value is beyond the double range.
#[must_use]
pub fn bigint_to_f64(bi: &BigInt) -> Option<f64> {
    bi.to_f64().filter(|f| f.is_finite())
}

/// Native result of a fast path, kept unboxed until the caller picks a representation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FastResult {
    Int(i64),
    Long(BigInt),
    Float(f64),
}

impl FastResult {
    pub fn is_true(&self) -> bool {
        match self {
            Self::Int(i) => *i != 0,
            Self::Long(bi) => !bi.is_zero(),
            Self::Float(f) => *f != 0.0,
        }
    }

    pub fn into_value(self, rt: &mut Runtime) -> RunResult<Value> {
        match self {
            Self::Int(i) => Ok(rt.new_int(i)),
            Self::Long(bi) => rt.new_long(bi),
            Self::Float(f) => Ok(Value::Float(f)),
        }
    }
}

/// Runs the kernel for `kind` on two operands of that exact type.
pub(crate) fn run(rt: &mut Runtime, kind: BuiltinKind, lhs: &Value, rhs: &Value) -> RunResult<FastResult> {
    debug_assert!(rt.is_exact(lhs, kind) && rt.is_exact(rhs, kind), "{kind} fast path on other types");
    rt.tracer_mut().on_fast_path(kind);
    match kind {
        BuiltinKind::Int => {
            let (&Value::Int(a), &Value::Int(b)) = (lhs, rhs) else {
                return Err(operand_mismatch(kind));
            };
            run_int(rt, a, b)
        }
        BuiltinKind::Long => {
            // small modern ints are immediates of the same type
            if rt.level() == Level::Modern
                && let (&Value::Int(a), &Value::Int(b)) = (lhs, rhs)
            {
                return run_int(rt, a, b);
            }
            let (Some(a), Some(b)) = (long_operand(rt, lhs), long_operand(rt, rhs)) else {
                return Err(operand_mismatch(kind));
            };
            match long_floordiv(&a, &b) {
                Ok(q) => Ok(FastResult::Long(q)),
                Err(DivisionByZero) => Err(ExcType::long_division_by_zero(rt.level()).into()),
            }
        }
        BuiltinKind::Float => {
            let (&Value::Float(a), &Value::Float(b)) = (lhs, rhs) else {
                return Err(operand_mismatch(kind));
            };
            float_floordiv(a, b)
                .map(FastResult::Float)
                .map_err(|DivisionByZero| ExcType::integer_division_by_zero().into())
        }
    }
}

fn run_int(rt: &mut Runtime, a: i64, b: i64) -> RunResult<FastResult> {
    match int_floordiv(a, b) {
        Ok(Some(q)) => Ok(FastResult::Int(q)),
        Ok(None) => {
            rt.tracer_mut().on_escalate();
            Ok(FastResult::Long(int_floordiv_wide(a, b)))
        }
        Err(DivisionByZero) => Err(ExcType::integer_division_by_zero().into()),
    }
}

fn long_operand<'a>(rt: &'a Runtime, value: &'a Value) -> Option<Cow<'a, BigInt>> {
    match value {
        Value::Int(i) => Some(Cow::Owned(BigInt::from(*i))),
        Value::Ref(id) => match rt.heap().get(*id) {
            HeapData::Long(li) => Some(Cow::Borrowed(li.inner())),
            HeapData::Instance(_) => None,
        },
        _ => None,
    }
}

fn operand_mismatch(kind: BuiltinKind) -> RunError {
    RunError::internal(format!("{kind} fast path reached with an operand of another type"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_floordiv_rounds_down() {
        assert_eq!(int_floordiv(-7, 2), Ok(Some(-4)));
        assert_eq!(int_floordiv(7, -2), Ok(Some(-4)));
        assert_eq!(int_floordiv(-7, -2), Ok(Some(3)));
        assert_eq!(int_floordiv(7, 2), Ok(Some(3)));
        assert_eq!(int_floordiv(-8, 2), Ok(Some(-4)));
    }

    #[test]
    fn int_min_by_minus_one_escalates() {
        assert_eq!(int_floordiv(i64::MIN, -1), Ok(None));
        assert_eq!(
            int_floordiv_wide(i64::MIN, -1).to_string(),
            "9223372036854775808"
        );
        assert_eq!(int_floordiv(i64::MIN, 1), Ok(Some(i64::MIN)));
        assert_eq!(int_floordiv_wide(-7, 2), BigInt::from(-4));
        assert_eq!(int_floordiv_wide(7, -2), BigInt::from(-4));
    }

    #[test]
    fn zero_divisor_is_rejected_by_every_kernel() {
        assert_eq!(int_floordiv(1, 0), Err(DivisionByZero));
        assert_eq!(long_floordiv(&BigInt::from(1), &BigInt::zero()), Err(DivisionByZero));
        assert_eq!(float_floordiv(1.0, 0.0), Err(DivisionByZero));
        assert_eq!(float_floordiv(1.0, -0.0), Err(DivisionByZero));
    }

    #[test]
    fn float_floordiv_signs() {
        assert_eq!(float_floordiv(-7.0, 2.0), Ok(-4.0));
        assert_eq!(float_floordiv(7.0, -2.0), Ok(-4.0));
        assert_eq!(float_floordiv(7.5, 2.0), Ok(3.0));
        assert_eq!(float_floordiv(-1.0, f64::INFINITY), Ok(-1.0));
        assert_eq!(float_floordiv(1.0, f64::INFINITY), Ok(0.0));
    }

    #[test]
    fn float_floordiv_preserves_signed_zero() {
        let r = float_floordiv(0.0, -1.0).unwrap();
        assert!(r == 0.0 && r.is_sign_negative(), "0.0 // -1.0 should be -0.0, got {r}");
        let r = float_floordiv(-0.0, 1.0).unwrap();
        assert!(r == 0.0 && r.is_sign_negative(), "-0.0 // 1.0 should be -0.0, got {r}");
        let r = float_floordiv(0.5, 2.0).unwrap();
        assert!(r == 0.0 && r.is_sign_positive(), "0.5 // 2.0 should be 0.0, got {r}");
    }

    #[test]
    fn float_floordiv_non_finite() {
        assert!(float_floordiv(f64::INFINITY, 1.0).unwrap().is_nan());
        assert!(float_floordiv(f64::NAN, 3.0).unwrap().is_nan());
    }

    #[test]
    fn bigint_to_f64_overflows_beyond_double_range() {
        assert_eq!(bigint_to_f64(&BigInt::from(1u64 << 53)), Some(9_007_199_254_740_992.0));
        assert_eq!(bigint_to_f64(&(BigInt::from(1) << 1100usize)), None);
    }

    #[test]
    fn fast_result_truth() {
        assert!(!FastResult::Int(0).is_true());
        assert!(FastResult::Long(BigInt::from(-1)).is_true());
        assert!(!FastResult::Float(-0.0).is_true());
        assert!(FastResult::Float(f64::NAN).is_true());
    }
}
