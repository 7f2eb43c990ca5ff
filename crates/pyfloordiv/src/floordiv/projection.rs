//! Three-state boolean results.
//!
//! Callers that only branch on `a // b` skip boxing where they can: a native
//! `int` or `float` kernel result is truth-tested in place. Arbitrary-precision
//! results are boxed first, so heap limits fail both variants alike. A slot
//! result is truth-tested and released.

use crate::{
    exception::RunResult,
    floordiv::{kernel::FastResult, run, shape::OperandShape},
    heap::defer_drop,
    level::LanguageLevel,
    runtime::Runtime,
    value::Value,
};

/// Truth value of a result, or a failure left pending on the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NBool {
    True,
    False,
    /// The failure is available from [`Runtime::take_pending`].
    Exception,
}

impl NBool {
    #[must_use]
    pub fn is_exception(self) -> bool {
        self == Self::Exception
    }

    /// `None` when a failure is pending.
    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Exception => None,
        }
    }
}

impl From<bool> for NBool {
    fn from(b: bool) -> Self {
        if b { Self::True } else { Self::False }
    }
}

/// Computes `bool(lhs // rhs)`.
pub fn try_floordiv_to_bool<L, A, B>(rt: &mut Runtime, lhs: &Value, rhs: &Value) -> RunResult<bool>
where
    L: LanguageLevel,
    A: OperandShape<L>,
    B: OperandShape<L>,
{
    run::<L, A, B, _>(rt, lhs, rhs, truth_of_native, truth_of_result)
}

/// Computes `bool(lhs // rhs)`, recording any failure with [`Runtime::set_pending`].
pub fn floordiv_to_bool<L, A, B>(rt: &mut Runtime, lhs: &Value, rhs: &Value) -> NBool
where
    L: LanguageLevel,
    A: OperandShape<L>,
    B: OperandShape<L>,
{
    match try_floordiv_to_bool::<L, A, B>(rt, lhs, rhs) {
        Ok(b) => b.into(),
        Err(err) => {
            rt.set_pending(err);
            NBool::Exception
        }
    }
}

/// `long` results go through the heap like the object variant's do.
fn truth_of_native(result: FastResult, rt: &mut Runtime) -> RunResult<bool> {
    match result {
        FastResult::Long(_) => {
            let value = result.into_value(rt)?;
            truth_of_result(rt, value)
        }
        native => Ok(native.is_true()),
    }
}

fn truth_of_result(rt: &mut Runtime, value: Value) -> RunResult<bool> {
    defer_drop!(value, rt);
    rt.is_true(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nbool_from_bool() {
        assert_eq!(NBool::from(true), NBool::True);
        assert_eq!(NBool::from(false).as_bool(), Some(false));
        assert!(NBool::Exception.is_exception());
        assert_eq!(NBool::Exception.as_bool(), None);
    }
}
