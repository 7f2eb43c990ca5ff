use std::{borrow::Cow, fmt};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::level::Level;

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Python exception types that floor division can surface.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `TypeError` -> "TypeError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ExcType {
    /// Root of the exception hierarchy.
    BaseException,
    /// Base class for all non-exit exceptions.
    Exception,
    /// Base class for arithmetic errors.
    ArithmeticError,
    /// Division or modulo by zero.
    ZeroDivisionError,
    /// A number too large to be represented in the target type.
    OverflowError,
    /// Operand types the operator cannot handle.
    TypeError,
    /// Argument of the right type but an inappropriate value.
    ValueError,
    /// Allocation or memory limit exhausted.
    MemoryError,
    /// Base class for errors that don't fit anywhere else.
    RuntimeError,
    /// Maximum recursion depth exceeded.
    RecursionError,
}

impl ExcType {
    /// Checks if `self` would be caught by an `except handler_type:` clause.
    #[must_use]
    pub fn is_subclass_of(self, handler_type: Self) -> bool {
        if self == handler_type {
            return true;
        }
        match handler_type {
            Self::BaseException => true,
            Self::Exception => self != Self::BaseException,
            // ArithmeticError catches ZeroDivisionError and OverflowError
            Self::ArithmeticError => matches!(self, Self::ZeroDivisionError | Self::OverflowError),
            // RecursionError is a RuntimeError
            Self::RuntimeError => self == Self::RecursionError,
            _ => false,
        }
    }

    /// ZeroDivisionError raised by the native integer and float fast paths.
    ///
    /// The float fast path uses the same text.
    #[must_use]
    pub fn integer_division_by_zero() -> SimpleException {
        SimpleException::new_msg(Self::ZeroDivisionError, "integer division or modulo by zero")
    }

    /// ZeroDivisionError raised by the arbitrary-precision integer slot.
    #[must_use]
    pub fn long_division_by_zero(level: Level) -> SimpleException {
        let msg = match level {
            Level::Legacy => "long division or modulo by zero",
            Level::Modern => "integer division or modulo by zero",
        };
        SimpleException::new_msg(Self::ZeroDivisionError, msg)
    }

    /// ZeroDivisionError raised by the float slot when reached through slot dispatch.
    #[must_use]
    pub fn float_division_by_zero(level: Level) -> SimpleException {
        let msg = match level {
            Level::Legacy => "float divmod()",
            Level::Modern => "float floor division by zero",
        };
        SimpleException::new_msg(Self::ZeroDivisionError, msg)
    }

    /// OverflowError for an integer that does not fit a double.
    #[must_use]
    pub fn int_too_large_for_float(level: Level) -> SimpleException {
        let msg = match level {
            Level::Legacy => "long int too large to convert to float",
            Level::Modern => "int too large to convert to float",
        };
        SimpleException::new_msg(Self::OverflowError, msg)
    }

    /// Creates a TypeError for unsupported binary operations.
    ///
    /// Uses CPython's format: `unsupported operand type(s) for {op}: '{lhs}' and '{rhs}'`
    #[must_use]
    pub fn binary_type_error(op: &str, lhs_type: &str, rhs_type: &str) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("unsupported operand type(s) for {op}: '{lhs_type}' and '{rhs_type}'"),
        )
        .into()
    }
}

/// A raised exception: its type plus an optional message argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleException {
    exc_type: ExcType,
    arg: Option<String>,
}

impl SimpleException {
    /// Creates a new exception with the given type and optional argument message.
    #[must_use]
    pub fn new(exc_type: ExcType, arg: Option<String>) -> Self {
        Self { exc_type, arg }
    }

    /// Creates a new exception with the given type and argument message.
    #[must_use]
    pub fn new_msg(exc_type: ExcType, arg: impl fmt::Display) -> Self {
        Self {
            exc_type,
            arg: Some(arg.to_string()),
        }
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    #[must_use]
    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }
}

impl fmt::Display for SimpleException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}: {arg}", self.exc_type),
            None => write!(f, "{}", self.exc_type),
        }
    }
}

/// Runtime error types that can occur during floor division.
///
/// Three variants:
/// - `Internal`: Bug in the runtime implementation (static message)
/// - `Exc`: Python exception that user code may catch
/// - `UncatchableExc`: Python exception from resource limits that must not be swallowed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunError {
    /// Internal runtime error - indicates a bug, not a problem with the operands.
    Internal(Cow<'static, str>),
    /// Catchable Python exception (e.g., ZeroDivisionError, TypeError).
    Exc(Box<SimpleException>),
    /// Uncatchable Python exception from resource limits (MemoryError).
    UncatchableExc(Box<SimpleException>),
}

impl RunError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the exception carried by this error, if any.
    #[must_use]
    pub fn exception(&self) -> Option<&SimpleException> {
        match self {
            Self::Internal(_) => None,
            Self::Exc(exc) | Self::UncatchableExc(exc) => Some(exc),
        }
    }

    /// Returns the Python exception type, treating internal errors as `RuntimeError`.
    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exception().map_or(ExcType::RuntimeError, SimpleException::exc_type)
    }

    /// Returns the exception message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Internal(msg) => Some(msg),
            Self::Exc(exc) | Self::UncatchableExc(exc) => exc.arg(),
        }
    }

    /// Whether an `except` clause for `handler_type` would catch this error.
    #[must_use]
    pub fn is_catchable_as(&self, handler_type: ExcType) -> bool {
        match self {
            Self::Exc(exc) => exc.exc_type().is_subclass_of(handler_type),
            Self::Internal(_) | Self::UncatchableExc(_) => false,
        }
    }
}

impl From<SimpleException> for RunError {
    fn from(exc: SimpleException) -> Self {
        Self::Exc(Box::new(exc))
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(msg) => write!(f, "RuntimeError: internal error: {msg}"),
            Self::Exc(exc) | Self::UncatchableExc(exc) => write!(f, "{exc}"),
        }
    }
}

impl std::error::Error for RunError {}
