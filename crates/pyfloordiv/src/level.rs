//! Language-level switch.
//!
//! The runtime emulates one of two Python eras. `Legacy` has the separate
//! native `int` type next to `long` and the coercion-based number protocol;
//! `Modern` has a single arbitrary-precision `int` and no coercion.
//!
//! The choice exists twice: [`Level`] is the runtime value (stored in
//! [`RuntimeConfig`](crate::RuntimeConfig)), and [`LanguageLevel`] is the
//! compile-time marker the specialised floor-division entry points are
//! generic over.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Python language era emulated by a runtime.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Separate `int`/`long` types with legacy coercion.
    Legacy,
    /// Unified arbitrary-precision `int`.
    #[default]
    Modern,
}

impl Level {
    /// Display name of the arbitrary-precision integer type.
    #[must_use]
    pub fn long_type_name(self) -> &'static str {
        match self {
            Self::Legacy => "long",
            Self::Modern => "int",
        }
    }

    /// Whether the native fixed-width `int` type exists.
    #[must_use]
    pub fn has_native_int(self) -> bool {
        self == Self::Legacy
    }

    /// Whether the legacy coercion fallback participates in dispatch.
    #[must_use]
    pub fn has_coercion(self) -> bool {
        self == Self::Legacy
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Compile-time language level.
///
/// Sealed: the only implementors are [`Legacy`] and [`Modern`].
pub trait LanguageLevel: sealed::Sealed + 'static {
    const LEVEL: Level;
}

/// Marker for [`Level::Legacy`].
#[derive(Debug, Clone, Copy)]
pub struct Legacy;

/// Marker for [`Level::Modern`].
#[derive(Debug, Clone, Copy)]
pub struct Modern;

impl sealed::Sealed for Legacy {}
impl sealed::Sealed for Modern {}

impl LanguageLevel for Legacy {
    const LEVEL: Level = Level::Legacy;
}

impl LanguageLevel for Modern {
    const LEVEL: Level = Level::Modern;
}
