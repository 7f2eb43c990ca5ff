use std::fmt::{self, Write};

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::level::Level;

/// A Python value owned outside the runtime.
///
/// `Object` is the public, heap-independent mirror of [`Value`](crate::Value):
/// use [`Runtime::alloc`](crate::Runtime::alloc) to bring one into a runtime and
/// [`Runtime::to_object`](crate::Runtime::to_object) to read a result back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    None,
    NotImplemented,
    Bool(bool),
    /// Native integer: the legacy `int`, or a modern `int` that fits 64 bits.
    Int(i64),
    /// Arbitrary-precision integer: the legacy `long`, or any modern `int`.
    Long(BigInt),
    Float(f64),
    /// Instance of a user-defined type. Only the type name survives conversion.
    Instance { type_name: String },
}

impl Object {
    /// Python `repr()` of the object under the given language level.
    ///
    /// Legacy longs carry the `L` suffix.
    #[must_use]
    pub fn repr(&self, level: Level) -> String {
        let mut s = String::new();
        self.repr_fmt(level, &mut s).expect("writing to a String cannot fail");
        s
    }

    fn repr_fmt(&self, level: Level, f: &mut impl Write) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::NotImplemented => f.write_str("NotImplemented"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Long(bi) => match level {
                Level::Legacy => write!(f, "{bi}L"),
                Level::Modern => write!(f, "{bi}"),
            },
            Self::Float(v) => f.write_str(&float_repr(*v)),
            Self::Instance { type_name } => write!(f, "<{type_name} object>"),
        }
    }

    /// Python truthiness for the immediate kinds. Instances are truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::NotImplemented | Self::Instance { .. } => true,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Long(bi) => bi.sign() != num_bigint::Sign::NoSign,
            Self::Float(v) => *v != 0.0,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.repr_fmt(Level::Modern, f)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<BigInt> for Object {
    fn from(bi: BigInt) -> Self {
        Self::Long(bi)
    }
}

/// Formats a float the way CPython's `repr` does.
fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f.is_sign_negative() {
            "-inf".to_string()
        } else {
            "inf".to_string()
        };
    }

    // ryu gives the shortest round-tripping digits
    let mut buffer = ryu::Buffer::new();
    fix_ryu_exponent(buffer.format(f))
}

/// Rewrites ryu's exponent format to CPython's.
///
/// ryu produces "1e20" and "1e-7" where CPython prints "1e+20" and "1e-07".
/// Also ensures ".0" suffix for numbers like "3" -> "3.0".
fn fix_ryu_exponent(s: &str) -> String {
    if let Some(e_pos) = s.find('e') {
        let (mantissa, exp_part) = s.split_at(e_pos);
        let exp = &exp_part[1..];
        let (sign, digits) = match exp.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exp),
        };
        let mantissa = mantissa.strip_suffix(".0").unwrap_or(mantissa);
        return format!("{mantissa}e{sign}{digits:0>2}");
    }

    if !s.contains('.') {
        return format!("{s}.0");
    }

    s.to_string()
}
